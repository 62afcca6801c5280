//! `Instrument` and `PricingEngine` traits.
//!
//! Instruments hold their contractual terms and hand engines a flat
//! argument struct; engines return [`PricingResults`].

use bermudan_core::{errors::Result, Real};
use bermudan_time::Date;
use std::collections::HashMap;

/// Results of pricing an instrument.
///
/// Contains the NPV and optionally additional named results
/// (e.g. "fair_rate", "fixed_leg_bps").
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PricingResults {
    /// Net present value.
    pub npv: Real,
    /// Additional named results.
    pub additional_results: HashMap<String, Real>,
}

impl PricingResults {
    /// Create pricing results with just an NPV.
    pub fn from_npv(npv: Real) -> Self {
        Self {
            npv,
            additional_results: HashMap::new(),
        }
    }

    /// Add a named result.
    pub fn with_result(mut self, key: impl Into<String>, value: Real) -> Self {
        self.additional_results.insert(key.into(), value);
        self
    }

    /// A named result, if the engine produced it.
    pub fn result(&self, key: &str) -> Option<Real> {
        self.additional_results.get(key).copied()
    }
}

/// Base trait for all pricing engines.
///
/// A pricing engine computes `PricingResults` for a specific instrument type.
pub trait PricingEngine<Args>: std::fmt::Debug + Send + Sync {
    /// Price the instrument described by `args`.
    fn calculate(&self, args: &Args) -> Result<PricingResults>;
}

/// Base trait for all financial instruments.
pub trait Instrument: std::fmt::Debug + Send + Sync {
    /// The last relevant date.
    fn maturity_date(&self) -> Date;

    /// Whether the instrument has expired as of `reference`.
    fn is_expired(&self, reference: Date) -> bool {
        self.maturity_date() <= reference
    }
}
