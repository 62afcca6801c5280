//! Pricing configuration.
//!
//! Everything a request does not carry: market conventions, model
//! coefficients, engine discretization, and the log level. Loaded from
//! TOML; every section and field is optional and falls back to its
//! default.
//!
//! ```toml
//! [market]
//! settlement_days = 2
//! day_counter = "actual365_fixed"
//! nominal = 1.0
//! side = "payer"
//!
//! [models.hw]
//! a = 0.1
//! sigma = 0.01
//!
//! [tree]
//! time_steps = 50
//!
//! [fdm]
//! scheme = "crank_nicolson"
//! damping_steps = 2
//!
//! [logging]
//! level = "info"
//! ```

use bermudan_core::Real;
use bermudan_instruments::SwapType;
use bermudan_models::{ModelKind, ModelParameters};
use bermudan_pricingengines::{FdmSettings, TreeSettings};
use bermudan_time::{Actual360, Actual365Fixed, DayCounter, Thirty360};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read configuration file {path}: {source}")]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },

    /// The file is not valid TOML for this schema.
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("invalid configuration value: {0}")]
    Invalid(String),
}

/// Day counter of the curve's time axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayCounterKind {
    /// Actual/365 (Fixed).
    #[default]
    Actual365Fixed,
    /// Actual/360.
    Actual360,
    /// 30/360 (European).
    Thirty360,
}

impl DayCounterKind {
    /// The day counter itself.
    pub fn day_counter(self) -> Arc<dyn DayCounter> {
        match self {
            DayCounterKind::Actual365Fixed => Arc::new(Actual365Fixed),
            DayCounterKind::Actual360 => Arc::new(Actual360),
            DayCounterKind::Thirty360 => Arc::new(Thirty360::european()),
        }
    }
}

/// Side of the underlying swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Pay fixed.
    #[default]
    Payer,
    /// Receive fixed.
    Receiver,
}

impl From<Side> for SwapType {
    fn from(side: Side) -> Self {
        match side {
            Side::Payer => SwapType::Payer,
            Side::Receiver => SwapType::Receiver,
        }
    }
}

/// `[market]`: conventions of the curve and the underlying swap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    /// TARGET business days from valuation to settlement.
    pub settlement_days: u32,
    /// Day counter of the curve.
    pub day_counter: DayCounterKind,
    /// Notional of the underlying swap.
    pub nominal: Real,
    /// Payer or receiver swaption.
    pub side: Side,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            settlement_days: 2,
            day_counter: DayCounterKind::default(),
            nominal: 1.0,
            side: Side::default(),
        }
    }
}

/// Speed and volatility of a one-factor model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OneFactorCoefficients {
    /// Mean-reversion speed.
    pub a: Real,
    /// Volatility.
    pub sigma: Real,
}

/// Coefficients of the G2++ model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct G2Coefficients {
    /// Speed of the first factor.
    pub a: Real,
    /// Volatility of the first factor.
    pub sigma: Real,
    /// Speed of the second factor.
    pub b: Real,
    /// Volatility of the second factor.
    pub eta: Real,
    /// Factor correlation.
    pub rho: Real,
}

/// `[models]`: coefficients of every family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Hull–White.
    pub hw: OneFactorCoefficients,
    /// Black–Karasinski.
    pub bk: OneFactorCoefficients,
    /// G2++.
    pub g2: G2Coefficients,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            hw: OneFactorCoefficients { a: 0.1, sigma: 0.01 },
            bk: OneFactorCoefficients { a: 0.1, sigma: 0.1 },
            g2: G2Coefficients {
                a: 0.1,
                sigma: 0.01,
                b: 0.1,
                eta: 0.01,
                rho: -0.75,
            },
        }
    }
}

impl ModelsConfig {
    /// Coefficients of the family `kind`.
    pub fn parameters(&self, kind: ModelKind) -> ModelParameters {
        match kind {
            ModelKind::HullWhite => ModelParameters::HullWhite {
                a: self.hw.a,
                sigma: self.hw.sigma,
            },
            ModelKind::BlackKarasinski => ModelParameters::BlackKarasinski {
                a: self.bk.a,
                sigma: self.bk.sigma,
            },
            ModelKind::G2 => ModelParameters::G2 {
                a: self.g2.a,
                sigma: self.g2.sigma,
                b: self.g2.b,
                eta: self.g2.eta,
                rho: self.g2.rho,
            },
        }
    }
}

/// `[logging]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Full pricing configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// Market conventions.
    pub market: MarketConfig,
    /// Model coefficients.
    pub models: ModelsConfig,
    /// Tree engine settings.
    pub tree: TreeSettings,
    /// Finite-difference engine settings.
    pub fdm: FdmSettings,
    /// Logging.
    pub logging: LoggingConfig,
}

impl PricingConfig {
    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate a configuration.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no valuation can run with. Model coefficients are
    /// checked when the model is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let nominal = self.market.nominal;
        if !(nominal.is_finite() && nominal > 0.0) {
            return Err(ConfigError::Invalid(format!("nominal must be positive, got {nominal}")));
        }
        self.tree
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("[tree] {e}")))?;
        self.fdm
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("[fdm] {e}")))?;
        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::Invalid(format!(
                "log level must be one of {}, got `{}`",
                LOG_LEVELS.join(", "),
                self.logging.level
            )));
        }
        Ok(())
    }
}
