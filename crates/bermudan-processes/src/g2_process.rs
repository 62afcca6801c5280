//! G2++ two-factor Gaussian process in decorrelated coordinates.
//!
//! The G2++ factors are
//!
//! ```text
//! dx = −a·x dt + σ dW₁
//! dy = −b·y dt + η dW₂,     dW₁·dW₂ = ρ dt
//! ```
//!
//! Lattices and grids work with `(x, w)` where `w = y − c·x`, `c = ρη/σ`:
//!
//! ```text
//! dw = (−b·w + (a − b)·c·x) dt + η·√(1 − ρ²) dW₃,   dW₁·dW₃ = 0
//! ```
//!
//! The two driving noises are independent, so one-step transition
//! probabilities factor into nonnegative marginals and the pricing PDE has
//! no mixed derivative. Over a finite step the residual covariance
//! `ρση·[k(a+b) − k(2a)]` vanishes when `a = b` and is second order in the
//! step otherwise.

use crate::ornstein_uhlenbeck_process::{decay_integral, OrnsteinUhlenbeckProcess};
use bermudan_core::errors::{Error, Result};
use bermudan_core::{Real, Time};

/// G2++ two-factor Gaussian process with state `(x, w)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct G2Process {
    a: Real,
    sigma: Real,
    b: Real,
    eta: Real,
    rho: Real,
}

impl G2Process {
    /// Create a new G2++ process. Speeds must be non-negative, volatilities
    /// positive, and `ρ ∈ [−1, 1]`.
    pub fn new(a: Real, sigma: Real, b: Real, eta: Real, rho: Real) -> Result<Self> {
        if !(sigma.is_finite() && sigma > 0.0 && eta.is_finite() && eta > 0.0) {
            return Err(Error::InvalidArgument(format!(
                "G2 volatilities must be positive, got sigma = {sigma}, eta = {eta}"
            )));
        }
        if !(a.is_finite() && a >= 0.0 && b.is_finite() && b >= 0.0) {
            return Err(Error::InvalidArgument(format!(
                "G2 mean-reversion speeds must be non-negative, got a = {a}, b = {b}"
            )));
        }
        if !(-1.0..=1.0).contains(&rho) {
            return Err(Error::InvalidArgument(format!(
                "correlation must be in [-1, 1], got {rho}"
            )));
        }
        Ok(Self {
            a,
            sigma,
            b,
            eta,
            rho,
        })
    }

    /// Coupling `c = ρη/σ` in `y = w + c·x`.
    pub fn coupling(&self) -> Real {
        self.rho * self.eta / self.sigma
    }

    /// The first factor `x` on its own.
    pub fn x_process(&self) -> OrnsteinUhlenbeckProcess {
        OrnsteinUhlenbeckProcess {
            speed: self.a,
            volatility: self.sigma,
        }
    }

    /// Drift of `w` at state `(x, w)`.
    pub fn w_drift(&self, x: Real, w: Real) -> Real {
        -self.b * w + (self.a - self.b) * self.coupling() * x
    }

    /// Diffusion coefficient of `w`, `η·√(1 − ρ²)`.
    pub fn w_diffusion(&self) -> Real {
        self.eta * (1.0 - self.rho * self.rho).max(0.0).sqrt()
    }

    /// Exact `E[w(t+Δt) | x(t) = x, w(t) = w]`.
    pub fn w_expectation(&self, x: Real, w: Real, dt: Time) -> Real {
        let c = self.coupling();
        (w + c * x) * (-self.b * dt).exp() - c * x * (-self.a * dt).exp()
    }

    /// Exact variance of `w(t+Δt)` given the state at `t`; with `Δt = t` it
    /// is also the variance of `w(t)` seen from time 0.
    pub fn w_variance(&self, dt: Time) -> Real {
        let (eta2, rho2) = (self.eta * self.eta, self.rho * self.rho);
        let v = eta2 * decay_integral(2.0 * self.b, dt)
            + rho2 * eta2 * decay_integral(2.0 * self.a, dt)
            - 2.0 * rho2 * eta2 * decay_integral(self.a + self.b, dt);
        v.max(0.0)
    }

    /// Recover the original second factor `y = w + c·x`.
    pub fn y(&self, x: Real, w: Real) -> Real {
        w + self.coupling() * x
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stochastic_process::StochasticProcess1D;
    use approx::assert_abs_diff_eq;

    #[test]
    fn equal_speeds_give_independent_diffusion() {
        let p = G2Process::new(0.1, 0.01, 0.1, 0.01, -0.75).unwrap();
        let dt = 0.25;
        let k = (1.0 - (-0.2_f64 * dt).exp()) / 0.2;
        assert_abs_diff_eq!(p.w_variance(dt), 1e-4 * (1.0 - 0.5625) * k, epsilon = 1e-16);
        // a = b: w reverts on its own.
        assert_abs_diff_eq!(p.w_drift(0.3, 0.2), -0.02, epsilon = 1e-15);
        assert_abs_diff_eq!(p.w_diffusion(), 0.01 * (1.0 - 0.5625f64).sqrt(), epsilon = 1e-15);
    }

    #[test]
    fn w_expectation_matches_factor_expectations() {
        let p = G2Process::new(0.1, 0.01, 0.3, 0.02, 0.4).unwrap();
        let (x, y, dt) = (0.004, -0.002, 0.5);
        let c = p.coupling();
        let w = y - c * x;
        let ex = p.x_process().expectation(0.0, x, dt);
        let ey = y * (-0.3 * dt).exp();
        assert_abs_diff_eq!(p.w_expectation(x, w, dt), ey - c * ex, epsilon = 1e-16);
        assert_abs_diff_eq!(p.y(x, w), y, epsilon = 1e-16);
    }

    #[test]
    fn w_variance_is_consistent_with_factor_covariance() {
        let (a, sigma, b, eta, rho) = (0.1, 0.01, 0.3, 0.02, 0.4);
        let p = G2Process::new(a, sigma, b, eta, rho).unwrap();
        let dt = 1.0;
        let c = p.coupling();
        let vx = sigma * sigma * (1.0 - (-2.0 * a * dt).exp()) / (2.0 * a);
        let vy = eta * eta * (1.0 - (-2.0 * b * dt).exp()) / (2.0 * b);
        let cov = rho * sigma * eta * (1.0 - (-(a + b) * dt).exp()) / (a + b);
        assert_abs_diff_eq!(p.w_variance(dt), vy + c * c * vx - 2.0 * c * cov, epsilon = 1e-18);
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        assert!(G2Process::new(0.1, 0.01, 0.1, 0.01, -1.5).is_err());
        assert!(G2Process::new(0.1, 0.0, 0.1, 0.01, 0.0).is_err());
        assert!(G2Process::new(-0.1, 0.01, 0.1, 0.01, 0.0).is_err());
    }
}
