//! # bermudan-math
//!
//! Numerical utilities shared by the models and engines: the normal
//! distribution (via statrs), Brent root finding, and float comparison.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// Floating-point comparison utilities.
pub mod comparison;

/// The standard normal distribution.
pub mod normal;

/// 1D root-finding solvers.
pub mod solvers1d;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use comparison::{close, close_enough};
pub use normal::{normal_cdf, normal_pdf};
pub use solvers1d::{brent, brent_bracketing};
