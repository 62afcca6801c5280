//! Hull-White (extended Vasicek) model.
//!
//! ```text
//! r(t) = x(t) + φ(t)
//! dx   = −a·x dt + σ dW,   x(0) = 0
//! ```
//!
//! The shift `φ` fits the initial curve exactly:
//!
//! ```text
//! φ(t) = f(0,t) + σ²/(2a²)·(1 − e^{−at})²
//! ```
//!
//! Discount bond, with `B(τ) = (1 − e^{−aτ})/a` and `V` the variance of
//! `∫x ds` over the horizon:
//!
//! ```text
//! P(t,T | x) = P(0,T)/P(0,t) · exp(½[V(T−t) − V(T) + V(t)] − B(T−t)·x)
//! ```

use crate::parameter::{Parameter, PositiveConstraint};
use crate::short_rate_model::{ModelKind, OneFactorModel};
use bermudan_core::errors::{Error, Result};
use bermudan_core::{DiscountFactor, Rate, Real, Time};
use bermudan_processes::ornstein_uhlenbeck_process::decay_integral;
use bermudan_processes::OrnsteinUhlenbeckProcess;
use bermudan_termstructures::YieldTermStructure;
use std::sync::Arc;

/// Hull-White one-factor model.
#[derive(Debug, Clone)]
pub struct HullWhite {
    a: Parameter,
    sigma: Parameter,
    process: OrnsteinUhlenbeckProcess,
    term_structure: Arc<dyn YieldTermStructure>,
}

impl HullWhite {
    /// Create a new Hull-White model with positive `a` and `σ`.
    pub fn new(term_structure: Arc<dyn YieldTermStructure>, a: Real, sigma: Real) -> Result<Self> {
        let a = Parameter::new("a", a, &PositiveConstraint)?;
        let sigma = Parameter::new("sigma", sigma, &PositiveConstraint)?;
        let process = OrnsteinUhlenbeckProcess::new(a.value(), sigma.value())?;
        Ok(Self {
            a,
            sigma,
            process,
            term_structure,
        })
    }

    /// Mean-reversion speed.
    pub fn a(&self) -> Real {
        self.a.value()
    }

    /// Short-rate volatility.
    pub fn sigma(&self) -> Real {
        self.sigma.value()
    }

    /// `B(t,T) = (1 − e^{−a(T−t)})/a`
    pub fn b_function(&self, t: Time, maturity: Time) -> Real {
        decay_integral(self.a(), maturity - t)
    }

    /// Variance of `∫ₜ^{t+τ} x(s) ds` given `x(t)`.
    fn v_function(&self, tau: Time) -> Real {
        let (a, sigma) = (self.a(), self.sigma());
        sigma * sigma / (a * a)
            * (tau - 2.0 * decay_integral(a, tau) + decay_integral(2.0 * a, tau))
    }
}

impl OneFactorModel for HullWhite {
    fn kind(&self) -> ModelKind {
        ModelKind::HullWhite
    }

    fn term_structure(&self) -> &Arc<dyn YieldTermStructure> {
        &self.term_structure
    }

    fn factor_process(&self) -> &OrnsteinUhlenbeckProcess {
        &self.process
    }

    fn short_rate(&self, x: Real, shift: Real) -> Rate {
        x + shift
    }

    fn shift(&self, t: Time) -> Result<Real> {
        let f = self.term_structure.instantaneous_forward(t)?;
        let k = decay_integral(self.a(), t);
        Ok(f + 0.5 * self.sigma() * self.sigma() * k * k)
    }

    fn discount_bond(&self, t: Time, maturity: Time, x: Real) -> Result<DiscountFactor> {
        if maturity < t {
            return Err(Error::InvalidArgument(format!(
                "bond maturity {maturity} precedes observation time {t}"
            )));
        }
        let ts = &self.term_structure;
        let ratio = ts.discount(maturity)? / ts.discount(t)?;
        let convexity =
            0.5 * (self.v_function(maturity - t) - self.v_function(maturity) + self.v_function(t));
        Ok(ratio * (convexity - self.b_function(t, maturity) * x).exp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;
    use bermudan_processes::StochasticProcess1D;
    use bermudan_termstructures::FlatForward;
    use bermudan_time::Date;

    fn flat_ts(rate: Real) -> Arc<dyn YieldTermStructure> {
        let ref_date = Date::from_ymd(2025, 7, 17).unwrap();
        Arc::new(FlatForward::continuous(ref_date, rate).unwrap())
    }

    #[test]
    fn hw_discount_bond_reproduces_curve_at_origin() {
        let hw = HullWhite::new(flat_ts(0.035), 0.1, 0.01).unwrap();
        for maturity in [0.0, 0.5, 1.0, 5.0, 10.0] {
            assert_abs_diff_eq!(
                hw.discount_bond(0.0, maturity, 0.0).unwrap(),
                (-0.035 * maturity).exp(),
                epsilon = 1e-14
            );
        }
    }

    #[test]
    fn hw_discount_bond_at_its_own_maturity() {
        let hw = HullWhite::new(flat_ts(0.05), 0.1, 0.01).unwrap();
        assert_abs_diff_eq!(hw.discount_bond(2.0, 2.0, 0.03).unwrap(), 1.0, epsilon = 1e-14);
    }

    #[test]
    fn hw_discount_bond_decreases_in_factor() {
        let hw = HullWhite::new(flat_ts(0.05), 0.1, 0.01).unwrap();
        let low = hw.discount_bond(1.0, 5.0, -0.01).unwrap();
        let high = hw.discount_bond(1.0, 5.0, 0.01).unwrap();
        assert!(high < low);
        assert!(high > 0.0 && low < 1.0);
    }

    #[test]
    fn hw_expected_deflated_bond_matches_curve() {
        // Under the t-forward measure x(t) is Gaussian with mean
        // −σ²/a·[(1−e^{−at})/a − (1−e^{−2at})/(2a)] and
        // E^t[P(t,T|x)] = P(0,T)/P(0,t).
        let (a, sigma, t, maturity) = (0.1, 0.01, 2.0, 7.0);
        let hw = HullWhite::new(flat_ts(0.04), a, sigma).unwrap();
        let var = hw.factor_process().variance(0.0, 0.0, t);
        let mean = -sigma * sigma / a * (decay_integral(a, t) - decay_integral(2.0 * a, t));
        let sd = var.sqrt();
        let n = 2000;
        let (lo, hi) = (mean - 8.0 * sd, mean + 8.0 * sd);
        let h = (hi - lo) / n as f64;
        let mut acc = 0.0;
        for i in 0..=n {
            let x = lo + i as f64 * h;
            let w = if i == 0 || i == n { 0.5 } else { 1.0 };
            let density =
                (-(x - mean).powi(2) / (2.0 * var)).exp() / (2.0 * std::f64::consts::PI * var).sqrt();
            acc += w * density * hw.discount_bond(t, maturity, x).unwrap();
        }
        assert_abs_diff_eq!(acc * h, (-0.04 * (maturity - t)).exp(), epsilon = 1e-9);
    }

    #[test]
    fn hw_shift_for_flat_curve() {
        let hw = HullWhite::new(flat_ts(0.03), 0.1, 0.01).unwrap();
        assert_abs_diff_eq!(hw.shift(0.0).unwrap(), 0.03, epsilon = 1e-12);
        let k = (1.0 - (-0.5_f64).exp()) / 0.1;
        assert_abs_diff_eq!(hw.shift(5.0).unwrap(), 0.03 + 0.5 * 1e-4 * k * k, epsilon = 1e-12);
        assert_abs_diff_eq!(hw.short_rate(0.002, 0.03), 0.032, epsilon = 1e-15);
    }

    #[test]
    fn hw_b_function() {
        let hw = HullWhite::new(flat_ts(0.05), 0.1, 0.01).unwrap();
        let expected = (1.0 - (-1.0_f64).exp()) / 0.1;
        assert_abs_diff_eq!(hw.b_function(0.0, 10.0), expected, epsilon = 1e-12);
    }

    #[test]
    fn hw_rejects_bad_coefficients_and_reversed_bonds() {
        assert!(HullWhite::new(flat_ts(0.05), 0.0, 0.01).is_err());
        assert!(HullWhite::new(flat_ts(0.05), 0.1, -0.01).is_err());
        let hw = HullWhite::new(flat_ts(0.05), 0.1, 0.01).unwrap();
        assert!(hw.discount_bond(3.0, 2.0, 0.0).is_err());
    }

    proptest! {
        #[test]
        fn hw_bonds_are_positive_and_fall_with_the_factor(
            t in 0.0f64..5.0,
            tau in 0.01f64..10.0,
            x in -0.05f64..0.05,
        ) {
            let hw = HullWhite::new(flat_ts(0.035), 0.1, 0.01).unwrap();
            let p = hw.discount_bond(t, t + tau, x).unwrap();
            prop_assert!(p.is_finite() && p > 0.0);
            prop_assert!(hw.discount_bond(t, t + tau, x + 0.01).unwrap() < p);
        }
    }
}
