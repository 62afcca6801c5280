//! Black-Karasinski short-rate model.
//!
//! ```text
//! r(t) = exp(x(t) + φ(t))
//! dx   = −a·x dt + σ dW,   x(0) = 0
//! ```
//!
//! The log short rate is Gaussian and mean-reverting, so rates stay positive.
//! Neither the fitting shift `φ` nor bond prices have a closed form: both
//! are answered with [`Error::UnsupportedModel`] and obtained numerically on
//! the lattice or grid that prices the option.
//!
//! A positive short rate can only reproduce curves whose forward rates are
//! positive; other curves are rejected on construction.

use crate::parameter::{Parameter, PositiveConstraint};
use crate::short_rate_model::{ModelKind, OneFactorModel};
use bermudan_core::errors::{Error, Result};
use bermudan_core::{DiscountFactor, Rate, Real, Time};
use bermudan_processes::{OrnsteinUhlenbeckProcess, StochasticProcess1D};
use bermudan_termstructures::YieldTermStructure;
use std::sync::Arc;

/// Forward rates below this floor are clamped before taking logarithms.
const MIN_FORWARD: Rate = 1.0e-8;

/// Curve times at which forward rates are checked on construction.
const FORWARD_CHECKS: [Time; 6] = [0.0, 1.0, 2.0, 5.0, 10.0, 30.0];

/// Black-Karasinski short-rate model.
#[derive(Debug, Clone)]
pub struct BlackKarasinski {
    a: Parameter,
    sigma: Parameter,
    process: OrnsteinUhlenbeckProcess,
    term_structure: Arc<dyn YieldTermStructure>,
}

impl BlackKarasinski {
    /// Create a new Black-Karasinski model with positive `a` and `σ`.
    ///
    /// Fails with [`Error::InvalidCurve`] when the curve has a forward rate
    /// that is not positive.
    pub fn new(term_structure: Arc<dyn YieldTermStructure>, a: Real, sigma: Real) -> Result<Self> {
        for t in FORWARD_CHECKS {
            let f = term_structure.instantaneous_forward(t)?;
            if !(f.is_finite() && f > 0.0) {
                return Err(Error::InvalidCurve(format!(
                    "a log-normal short rate cannot fit the forward rate {f} at t = {t}; \
                     the curve needs positive forwards"
                )));
            }
        }
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

    /// Volatility of `ln r`.
    pub fn sigma(&self) -> Real {
        self.sigma.value()
    }
}

impl OneFactorModel for BlackKarasinski {
    fn kind(&self) -> ModelKind {
        ModelKind::BlackKarasinski
    }

    fn term_structure(&self) -> &Arc<dyn YieldTermStructure> {
        &self.term_structure
    }

    fn factor_process(&self) -> &OrnsteinUhlenbeckProcess {
        &self.process
    }

    fn short_rate(&self, x: Real, shift: Real) -> Rate {
        (x + shift).exp()
    }

    fn shift(&self, _t: Time) -> Result<Real> {
        Err(Error::unsupported(ModelKind::BlackKarasinski.tag(), "analytic curve-fitting shift"))
    }

    /// Lognormal moment match: `E[exp(x(t) + φ)] = f(0,t)`.
    fn shift_guess(&self, t: Time) -> Result<Real> {
        let f = self.term_structure.instantaneous_forward(t)?.max(MIN_FORWARD);
        Ok(f.ln() - 0.5 * self.process.variance(0.0, 0.0, t))
    }

    fn discount_bond(&self, _t: Time, _maturity: Time, _x: Real) -> Result<DiscountFactor> {
        Err(Error::unsupported(ModelKind::BlackKarasinski.tag(), "analytic discount bond"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use bermudan_termstructures::FlatForward;
    use bermudan_time::Date;

    fn flat_ts(rate: Real) -> Arc<dyn YieldTermStructure> {
        let ref_date = Date::from_ymd(2025, 7, 17).unwrap();
        Arc::new(FlatForward::continuous(ref_date, rate).unwrap())
    }

    #[test]
    fn bk_rates_are_lognormal_in_the_factor() {
        let bk = BlackKarasinski::new(flat_ts(0.05), 0.1, 0.15).unwrap();
        assert_abs_diff_eq!(bk.short_rate(0.0, 0.05_f64.ln()), 0.05, epsilon = 1e-15);
        assert!(bk.short_rate(-10.0, 0.05_f64.ln()) > 0.0);
        assert_abs_diff_eq!(bk.factor_process().diffusion(0.0, 1.0), 0.15, epsilon = 1e-15);
    }

    #[test]
    fn bk_analytic_operations_are_unsupported() {
        let bk = BlackKarasinski::new(flat_ts(0.05), 0.1, 0.1).unwrap();
        let err = bk.discount_bond(0.0, 1.0, 0.0).unwrap_err();
        assert!(err.is_unsupported());
        assert_eq!(err.to_string(), "model `bk` does not support analytic discount bond");
        assert!(bk.shift(1.0).unwrap_err().is_unsupported());
    }

    #[test]
    fn bk_shift_guess_matches_the_forward_in_mean() {
        let bk = BlackKarasinski::new(flat_ts(0.04), 0.1, 0.1).unwrap();
        assert_abs_diff_eq!(bk.shift_guess(0.0).unwrap(), 0.04_f64.ln(), epsilon = 1e-12);
        let t = 3.0;
        let var = bk.factor_process().variance(0.0, 0.0, t);
        let mean_rate = (bk.shift_guess(t).unwrap() + 0.5 * var).exp();
        assert_abs_diff_eq!(mean_rate, 0.04, epsilon = 1e-12);
    }

    #[test]
    fn bk_rejects_a_zero_curve() {
        let err = BlackKarasinski::new(flat_ts(0.0), 0.1, 0.1).unwrap_err();
        assert!(matches!(err, Error::InvalidCurve(_)));
        assert_eq!(err.category(), bermudan_core::ErrorCategory::InvalidInput);
        assert!(err.to_string().contains("log-normal"));
        assert!(BlackKarasinski::new(flat_ts(1e-4), 0.1, 0.1).is_ok());
    }
}
