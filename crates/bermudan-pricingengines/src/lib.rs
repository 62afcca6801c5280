//! # bermudan-pricingengines
//!
//! Pricing engines for swaps and Bermudan swaptions.
//!
//! ## Engines
//!
//! - [`DiscountingSwapEngine`] — discounted cash flows of a vanilla swap,
//!   per-leg NPV and BPS, fair fixed rate
//! - [`TreeSwaptionEngine`] — backward induction on a trinomial short-rate
//!   lattice (two-factor product lattice for G2++)
//! - [`FdSwaptionEngine`] — backward induction on a finite-difference grid,
//!   theta schemes in one factor and Douglas ADI in two
//! - [`JamshidianSwaptionEngine`] — closed-form European swaption under
//!   Hull–White
//!
//! The tree and grid engines share one backward-induction driver and take
//! the model as a [`ShortRateModel`](bermudan_models::ShortRateModel),
//! dispatching once per call on its family.
//!
//! ## Features
//!
//! - `parallel` — rayon over the nodes of two-factor lattice slices
//! - `serde` — (de)serializable engine settings

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod discretized_swaption;

pub mod discounting_swap_engine;
pub mod fd_swaption_engine;
pub mod jamshidian_swaption_engine;
pub mod tree_swaption_engine;

pub use discounting_swap_engine::{annuity, DiscountingSwapEngine};
pub use fd_swaption_engine::{FdSwaptionEngine, FdmSettings};
pub use jamshidian_swaption_engine::JamshidianSwaptionEngine;
pub use tree_swaption_engine::{TreeSettings, TreeSwaptionEngine};
