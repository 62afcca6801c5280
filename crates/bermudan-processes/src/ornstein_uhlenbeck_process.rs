//! Ornstein–Uhlenbeck mean-reverting process.
//!
//! ```text
//! dX = −a·X dt + σ dW,   X(0) = 0
//! ```
//!
//! The zero-mean factor of the Hull–White and Black–Karasinski models, and
//! the first factor of G2++.

use crate::stochastic_process::StochasticProcess1D;
use bermudan_core::errors::{Error, Result};
use bermudan_core::{Real, Time};

/// Below this speed the process is treated as a Brownian motion.
const MIN_SPEED: Real = 1e-15;

/// A zero-mean Ornstein–Uhlenbeck process.
///
/// Closed-form moments:
/// ```text
/// E[X(t+dt) | X(t)]   = X(t) · exp(−a·dt)
/// Var[X(t+dt) | X(t)] = σ² · (1 − exp(−2a·dt)) / (2a)
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrnsteinUhlenbeckProcess {
    pub(crate) speed: Real,
    pub(crate) volatility: Real,
}

impl OrnsteinUhlenbeckProcess {
    /// Create a process with mean-reversion `speed` and `volatility`, both
    /// finite and non-negative.
    pub fn new(speed: Real, volatility: Real) -> Result<Self> {
        if !(speed.is_finite() && speed >= 0.0) {
            return Err(Error::InvalidArgument(format!(
                "mean-reversion speed must be non-negative, got {speed}"
            )));
        }
        if !(volatility.is_finite() && volatility >= 0.0) {
            return Err(Error::InvalidArgument(format!(
                "volatility must be non-negative, got {volatility}"
            )));
        }
        Ok(Self { speed, volatility })
    }

    /// Speed of mean reversion `a`.
    pub fn speed(&self) -> Real {
        self.speed
    }

    /// Volatility `σ`.
    pub fn volatility(&self) -> Real {
        self.volatility
    }

    /// Variance of `X(t)` started from a known value `t` years earlier; the
    /// same as the one-step variance.
    pub fn variance_over(&self, t: Time) -> Real {
        self.volatility * self.volatility * decay_integral(2.0 * self.speed, t)
    }
}

impl StochasticProcess1D for OrnsteinUhlenbeckProcess {
    fn x0(&self) -> Real {
        0.0
    }

    fn drift(&self, _t: Time, x: Real) -> Real {
        -self.speed * x
    }

    fn diffusion(&self, _t: Time, _x: Real) -> Real {
        self.volatility
    }

    fn expectation(&self, _t: Time, x: Real, dt: Time) -> Real {
        x * (-self.speed * dt).exp()
    }

    fn variance(&self, _t: Time, _x: Real, dt: Time) -> Real {
        self.variance_over(dt)
    }
}

/// `∫₀ᵗ e^{−k·s} ds = (1 − e^{−k·t}) / k`, with the `k → 0` limit `t`.
pub fn decay_integral(k: Real, t: Time) -> Real {
    if k.abs() < MIN_SPEED {
        t
    } else {
        -(-k * t).exp_m1() / k
    }
}
