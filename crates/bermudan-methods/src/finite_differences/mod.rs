//! Finite difference methods for short-rate PDEs.
//!
//! The pricing PDE of a short-rate factor model,
//!
//! ```text
//! ∂V/∂t + μ(x)·∂V/∂x + ½σ²·∂²V/∂x² − r(x, t)·V = 0,
//! ```
//!
//! is discretized on uniform meshes with central differences and stepped
//! backward in time.
//!
//! # Overview
//!
//! * [`TridiagonalOperator`] — banded operator with a Thomas-algorithm solver
//! * [`Uniform1dMesher`] / [`Grid2d`] — uniform meshes in one and two factors
//! * [`ThetaScheme`] — explicit, implicit or Crank–Nicolson steps in 1-D
//! * [`DouglasScheme`] — Douglas ADI splitting in 2-D

pub mod douglas_scheme;
pub mod mesher;
pub mod theta_scheme;
pub mod tridiagonal_operator;

pub use douglas_scheme::{DouglasScheme, Grid2d};
pub use mesher::Uniform1dMesher;
pub use theta_scheme::ThetaScheme;
pub use tridiagonal_operator::TridiagonalOperator;

use bermudan_core::Real;

// ─── FDM scheme selection ─────────────────────────────────────────────────────

/// Finite difference time-stepping scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FdmScheme {
    /// Explicit: `V^{n} = (I + Δt·L)·V^{n+1}`, conditionally stable.
    Explicit,
    /// Fully implicit: `(I − Δt·L)·V^{n} = V^{n+1}`, unconditionally stable.
    Implicit,
    /// Crank–Nicolson: θ = ½ average of explicit and implicit, second-order
    /// in time.
    #[default]
    CrankNicolson,
}

impl FdmScheme {
    /// The implicitness weight θ of the scheme.
    pub fn theta(self) -> Real {
        match self {
            FdmScheme::Explicit => 0.0,
            FdmScheme::Implicit => 1.0,
            FdmScheme::CrankNicolson => 0.5,
        }
    }
}

// ─── Boundary conditions ──────────────────────────────────────────────────────

/// Condition imposed on the first and last mesh points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BoundaryCondition {
    /// `∂²V/∂x² = 0`: values extrapolate linearly; the first derivative is
    /// taken one-sided towards the interior.
    #[default]
    ZeroSecondDerivative,
    /// `∂V/∂x = 0`: a reflecting (Neumann) edge.
    ZeroFirstDerivative,
}
