//! # bermudan-methods
//!
//! Numerical methods for short-rate option pricing: recombining trinomial
//! lattices in one and two factors, and finite-difference grids with theta
//! and ADI time stepping.
//!
//! # Modules
//!
//! * [`lattice`] — time grids, the 1-D trinomial tree with curve fitting,
//!   and the 2-D product lattice
//! * [`finite_differences`] — tridiagonal operators, uniform meshers,
//!   theta and Douglas schemes

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// Lattice methods: time grids, trinomial trees, backward induction.
pub mod lattice;

/// Finite difference methods: operators, meshers, time-stepping schemes.
pub mod finite_differences;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use finite_differences::{
    BoundaryCondition, DouglasScheme, FdmScheme, Grid2d, ThetaScheme, TridiagonalOperator,
    Uniform1dMesher,
};
pub use lattice::{TimeGrid, TrinomialTree, TwoFactorTree, DEFAULT_SPACING};
