//! # bermudan-models
//!
//! Short-rate models fitted to an initial yield curve.
//!
//! Every model writes the short rate as a deterministic shift applied to
//! zero-mean Gaussian factors:
//!
//! ```text
//! Hull–White         r = x + φ(t)
//! Black–Karasinski   r = exp(x + φ(t))
//! G2++               r = x + y + φ(t)
//! ```
//!
//! The Gaussian models answer the shift `φ` and zero-coupon bonds
//! `P(t, T | state)` in closed form. Black–Karasinski answers both with
//! [`Error::UnsupportedModel`](bermudan_core::Error::UnsupportedModel) and
//! leaves them to the lattice or grid that prices the option.
//!
//! ## Dispatch
//!
//! ```text
//! ShortRateModel (closed enum)
//! ├── HullWhite         ─┐
//! ├── BlackKarasinski   ─┴─ OneFactorModel
//! └── G2                ── G2Model
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Infrastructure ───────────────────────────────────────────────────────
pub mod parameter;
pub mod short_rate_model;

// ── One-factor short-rate models ─────────────────────────────────────────
pub mod black_karasinski;
pub mod hull_white_model;

// ── Two-factor short-rate models ─────────────────────────────────────────
pub mod g2_model;

// ── Re-exports ───────────────────────────────────────────────────────────
pub use black_karasinski::BlackKarasinski;
pub use g2_model::G2Model;
pub use hull_white_model::HullWhite;
pub use parameter::{BoundaryConstraint, Constraint, Parameter, PositiveConstraint};
pub use short_rate_model::{ModelKind, ModelParameters, OneFactorModel, ShortRateModel};
