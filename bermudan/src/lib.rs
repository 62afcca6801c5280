//! # bermudan
//!
//! Bermudan swaption pricing under short-rate models.
//!
//! This crate is the **façade** over the workspace crates. It re-exports
//! them under short module names and adds the valuation orchestrator that
//! turns a [`PricingRequest`] into a [`PricingResult`]:
//!
//! 1. settle the valuation date on the TARGET calendar,
//! 2. build a flat continuously compounded curve at settlement,
//! 3. build the standard 1Y-into-5Y swap and its ATM rate,
//! 4. strike it at `ATM × strike_multiplier`, exercisable on every fixed
//!    coupon start,
//! 5. price it with the requested model (`g2`, `hw`, `bk`) and engine
//!    (`tree`, `fdm`).
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use bermudan::{PricingRequest, Valuation};
//!
//! let request: PricingRequest = serde_json::from_str(
//!     r#"{"date": "2025-07-15", "flat_rate": 0.035, "model": "hw",
//!         "engine": "tree", "strike_multiplier": 1.0}"#,
//! )
//! .unwrap();
//! let result = Valuation::default().price(&request).unwrap();
//! println!("{}", serde_json::to_string(&result.response()).unwrap());
//! ```
//!
//! Failures are [`ValuationError`]s naming the component that failed;
//! [`ValuationError::category`] tells bad input from a numerical method
//! that could not produce a stable result.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Workspace crates ─────────────────────────────────────────────────────────

/// Core types, aliases, and error definitions.
pub use bermudan_core as core;

/// Dates, calendars, day counters, and schedules.
pub use bermudan_time as time;

/// Normal distribution, root finding, float comparison.
pub use bermudan_math as math;

/// Yield term structures.
pub use bermudan_termstructures as termstructures;

/// Ornstein–Uhlenbeck factor processes.
pub use bermudan_processes as processes;

/// Short-rate models.
pub use bermudan_models as models;

/// Lattices and finite-difference schemes.
pub use bermudan_methods as methods;

/// Swaps, exercises, and Bermudan swaptions.
pub use bermudan_instruments as instruments;

/// Pricing engines.
pub use bermudan_pricingengines as pricingengines;

// ── Orchestration ────────────────────────────────────────────────────────────

pub mod config;
pub mod valuation;

pub use config::{ConfigError, PricingConfig};
pub use valuation::{
    Component, EngineKind, NpvResponse, PricingRequest, PricingResult, Valuation, ValuationError,
};
