//! # bermudan-termstructures
//!
//! Yield curves: the term-structure traits and the flat continuously
//! compounded curve the pricing core is driven by.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// `TermStructure` — base trait for all term structures.
pub mod term_structure;

/// `YieldTermStructure` — yield / interest-rate term structures.
pub mod yield_term_structure;

/// `FlatForward` — constant forward-rate yield curve.
pub mod flat_forward;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use flat_forward::FlatForward;
pub use term_structure::TermStructure;
pub use yield_term_structure::YieldTermStructure;
