//! `StochasticProcess1D` — a scalar diffusion `dX = μ(t,X) dt + σ(t,X) dW`.

use bermudan_core::{Real, Time};

/// A 1-dimensional stochastic process `dX = μ(t,X) dt + σ(t,X) dW`.
///
/// `drift` and `diffusion` feed PDE coefficients; `expectation` and
/// `variance` describe one discrete step and feed lattice branching.
pub trait StochasticProcess1D: std::fmt::Debug + Send + Sync {
    /// Initial value of the process.
    fn x0(&self) -> Real;

    /// Drift `μ(t, x)`.
    fn drift(&self, t: Time, x: Real) -> Real;

    /// Diffusion `σ(t, x)`.
    fn diffusion(&self, t: Time, x: Real) -> Real;

    /// Expected value `E[x(t+Δt) | x(t) = x]`.
    ///
    /// Default: first-order Euler `x + μ(t,x)·Δt`.
    fn expectation(&self, t: Time, x: Real, dt: Time) -> Real {
        x + self.drift(t, x) * dt
    }

    /// Variance of `x(t+Δt)` given `x(t) = x`.
    ///
    /// Default: first-order Euler `σ(t,x)²·Δt`.
    fn variance(&self, t: Time, x: Real, dt: Time) -> Real {
        let s = self.diffusion(t, x);
        s * s * dt
    }

    /// Standard deviation of `x(t+Δt)` given `x(t) = x`.
    fn std_deviation(&self, t: Time, x: Real, dt: Time) -> Real {
        self.variance(t, x, dt).sqrt()
    }
}
