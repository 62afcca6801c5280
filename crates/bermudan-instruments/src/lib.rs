//! # bermudan-instruments
//!
//! The underlying fixed-for-floating swap, its exercise schedule, and the
//! Bermudan swaption built on both.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

pub mod coupon;
pub mod exercise;
pub mod instrument;
pub mod make_vanilla_swap;
pub mod swap;
pub mod swaption;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use coupon::{FixedRateCoupon, FloatingRateCoupon};
pub use exercise::{Exercise, ExerciseType};
pub use instrument::{Instrument, PricingEngine, PricingResults};
pub use make_vanilla_swap::MakeVanillaSwap;
pub use swap::{SwapArguments, SwapType, VanillaSwap};
pub use swaption::{BermudanSwaption, SwaptionArguments, SwaptionCashFlow, SwaptionEngine};
