//! G2++ two-factor Gaussian short-rate model.
//!
//! ```text
//! r(t) = x(t) + y(t) + φ(t)
//! dx = −a·x dt + σ dW₁
//! dy = −b·y dt + η dW₂
//! dW₁·dW₂ = ρ dt
//! ```
//!
//! The state is carried in the decorrelated coordinates `(x, w)` of
//! [`G2Process`], `y = w + c·x`, so `r = (1 + c)·x + w + φ(t)`.
//!
//! ```text
//! φ(t) = f(0,t) + σ²/(2a²)(1−e^{−at})² + η²/(2b²)(1−e^{−bt})²
//!        + ρση/(ab)(1−e^{−at})(1−e^{−bt})
//!
//! P(t,T | x,y) = P(0,T)/P(0,t) · exp(½[V(T−t) − V(T) + V(t)] − B_a(T−t)·x − B_b(T−t)·y)
//! ```

use crate::parameter::{BoundaryConstraint, Parameter, PositiveConstraint};
use bermudan_core::errors::{Error, Result};
use bermudan_core::{DiscountFactor, Rate, Real, Time};
use bermudan_processes::ornstein_uhlenbeck_process::decay_integral;
use bermudan_processes::G2Process;
use bermudan_termstructures::YieldTermStructure;
use std::sync::Arc;

/// G2++ two-factor model.
#[derive(Debug, Clone)]
pub struct G2Model {
    a: Parameter,
    sigma: Parameter,
    b: Parameter,
    eta: Parameter,
    rho: Parameter,
    process: G2Process,
    term_structure: Arc<dyn YieldTermStructure>,
}

impl G2Model {
    /// Create a new G2++ model. Speeds and volatilities must be positive,
    /// `ρ ∈ [−1, 1]`.
    pub fn new(
        term_structure: Arc<dyn YieldTermStructure>,
        a: Real,
        sigma: Real,
        b: Real,
        eta: Real,
        rho: Real,
    ) -> Result<Self> {
        let correlation = BoundaryConstraint {
            lower: -1.0,
            upper: 1.0,
        };
        let a = Parameter::new("a", a, &PositiveConstraint)?;
        let sigma = Parameter::new("sigma", sigma, &PositiveConstraint)?;
        let b = Parameter::new("b", b, &PositiveConstraint)?;
        let eta = Parameter::new("eta", eta, &PositiveConstraint)?;
        let rho = Parameter::new("rho", rho, &correlation)?;
        let process = G2Process::new(a.value(), sigma.value(), b.value(), eta.value(), rho.value())?;
        Ok(Self {
            a,
            sigma,
            b,
            eta,
            rho,
            process,
            term_structure,
        })
    }

    /// Speed of the first factor.
    pub fn a(&self) -> Real {
        self.a.value()
    }

    /// Volatility of the first factor.
    pub fn sigma(&self) -> Real {
        self.sigma.value()
    }

    /// Speed of the second factor.
    pub fn b(&self) -> Real {
        self.b.value()
    }

    /// Volatility of the second factor.
    pub fn eta(&self) -> Real {
        self.eta.value()
    }

    /// Factor correlation.
    pub fn rho(&self) -> Real {
        self.rho.value()
    }

    /// The factor dynamics in `(x, w)` coordinates.
    pub fn process(&self) -> &G2Process {
        &self.process
    }

    /// The curve the model is fitted to.
    pub fn term_structure(&self) -> &Arc<dyn YieldTermStructure> {
        &self.term_structure
    }

    /// Short rate at state `(x, w)` given the shift.
    pub fn short_rate(&self, x: Real, w: Real, shift: Real) -> Rate {
        x + self.process.y(x, w) + shift
    }

    /// The shift `φ(t)` that fits the initial curve.
    pub fn shift(&self, t: Time) -> Result<Real> {
        let f = self.term_structure.instantaneous_forward(t)?;
        let (sigma, eta) = (self.sigma(), self.eta());
        let ka = decay_integral(self.a(), t);
        let kb = decay_integral(self.b(), t);
        Ok(f + 0.5 * sigma * sigma * ka * ka
            + 0.5 * eta * eta * kb * kb
            + self.rho() * sigma * eta * ka * kb)
    }

    /// Zero-coupon bond `P(t, maturity | x, w)`.
    pub fn discount_bond(&self, t: Time, maturity: Time, x: Real, w: Real) -> Result<DiscountFactor> {
        if maturity < t {
            return Err(Error::InvalidArgument(format!(
                "bond maturity {maturity} precedes observation time {t}"
            )));
        }
        let ts = &self.term_structure;
        let ratio = ts.discount(maturity)? / ts.discount(t)?;
        let tau = maturity - t;
        let convexity =
            0.5 * (self.v_function(tau) - self.v_function(maturity) + self.v_function(t));
        let y = self.process.y(x, w);
        let exponent =
            convexity - decay_integral(self.a(), tau) * x - decay_integral(self.b(), tau) * y;
        Ok(ratio * exponent.exp())
    }

    /// Variance of `∫ₜ^{t+τ} (x + y) ds` given the state at `t`.
    fn v_function(&self, tau: Time) -> Real {
        let (a, b) = (self.a(), self.b());
        let (sigma, eta, rho) = (self.sigma(), self.eta(), self.rho());
        let term1 = sigma * sigma / (a * a)
            * (tau - 2.0 * decay_integral(a, tau) + decay_integral(2.0 * a, tau));
        let term2 = eta * eta / (b * b)
            * (tau - 2.0 * decay_integral(b, tau) + decay_integral(2.0 * b, tau));
        let term3 = 2.0 * rho * sigma * eta / (a * b)
            * (tau - decay_integral(a, tau) - decay_integral(b, tau) + decay_integral(a + b, tau));
        term1 + term2 + term3
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hull_white_model::HullWhite;
    use crate::short_rate_model::{ModelKind, OneFactorModel};
    use approx::assert_abs_diff_eq;
    use bermudan_termstructures::FlatForward;
    use bermudan_time::Date;

    fn flat_ts(rate: Real) -> Arc<dyn YieldTermStructure> {
        let ref_date = Date::from_ymd(2025, 7, 17).unwrap();
        Arc::new(FlatForward::continuous(ref_date, rate).unwrap())
    }

    fn default_g2(rate: Real) -> G2Model {
        G2Model::new(flat_ts(rate), 0.1, 0.01, 0.1, 0.01, -0.75).unwrap()
    }

    #[test]
    fn g2_discount_bond_reproduces_curve_at_origin() {
        let g = default_g2(0.035);
        for maturity in [0.0, 1.0, 6.5] {
            assert_abs_diff_eq!(
                g.discount_bond(0.0, maturity, 0.0, 0.0).unwrap(),
                (-0.035 * maturity).exp(),
                epsilon = 1e-14
            );
        }
        assert_abs_diff_eq!(g.discount_bond(3.0, 3.0, 0.01, -0.02).unwrap(), 1.0, epsilon = 1e-14);
    }

    #[test]
    fn g2_without_second_factor_is_hull_white() {
        let ts = flat_ts(0.03);
        let g = G2Model::new(Arc::clone(&ts), 0.1, 0.01, 0.2, 1e-9, 0.0).unwrap();
        let hw = HullWhite::new(ts, 0.1, 0.01).unwrap();
        for x in [-0.02, 0.0, 0.015] {
            assert_abs_diff_eq!(
                g.discount_bond(1.5, 4.0, x, 0.0).unwrap(),
                hw.discount_bond(1.5, 4.0, x).unwrap(),
                epsilon = 1e-12
            );
        }
        assert_abs_diff_eq!(g.shift(2.0).unwrap(), hw.shift(2.0).unwrap(), epsilon = 1e-12);
    }

    #[test]
    fn g2_short_rate_uses_the_original_factors() {
        let g = default_g2(0.03);
        let (x, y) = (0.004, -0.001);
        let w = y - g.process().coupling() * x;
        assert_abs_diff_eq!(g.short_rate(x, w, 0.03), x + y + 0.03, epsilon = 1e-16);
        assert_abs_diff_eq!(g.shift(0.0).unwrap(), 0.03, epsilon = 1e-12);
    }

    #[test]
    fn g2_correlation_is_bounded() {
        assert!(G2Model::new(flat_ts(0.03), 0.1, 0.01, 0.1, 0.01, -1.01).is_err());
        assert!(G2Model::new(flat_ts(0.03), 0.1, 0.01, 0.1, 0.01, 1.0).is_ok());
        assert!(G2Model::new(flat_ts(0.03), 0.1, 0.01, 0.0, 0.01, 0.0).is_err());
        assert_eq!(ModelKind::G2.factors(), 2);
    }
}
