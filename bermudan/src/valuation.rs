//! The valuation orchestrator: one request in, one NPV out.
//!
//! Every stage runs under a `valuation` tracing span. A failing stage is
//! reported as a [`ValuationError`] naming the [`Component`] it came from
//! and the request's model and engine; nothing is retried or defaulted.

use crate::config::PricingConfig;
use bermudan_core::errors::{Error, Result as CoreResult};
use bermudan_core::{ErrorCategory, Rate, Real};
use bermudan_instruments::{BermudanSwaption, MakeVanillaSwap, PricingEngine, SwaptionArguments};
use bermudan_models::{ModelKind, ShortRateModel};
use bermudan_pricingengines::{DiscountingSwapEngine, FdSwaptionEngine, TreeSwaptionEngine};
use bermudan_termstructures::{FlatForward, YieldTermStructure};
use bermudan_time::{BusinessDayConvention, Calendar, Date, Period, Target, TimeUnit};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error as ThisError;

// ── Request / response ───────────────────────────────────────────────────

/// Numerical method used to price the swaption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// `"tree"`: recombining short-rate lattice.
    Tree,
    /// `"fdm"`: finite-difference grid.
    Fdm,
}

impl EngineKind {
    /// Every engine.
    pub const ALL: [EngineKind; 2] = [EngineKind::Tree, EngineKind::Fdm];

    /// The request tag of this engine.
    pub fn tag(self) -> &'static str {
        match self {
            EngineKind::Tree => "tree",
            EngineKind::Fdm => "fdm",
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for EngineKind {
    type Err = Error;

    fn from_str(s: &str) -> CoreResult<Self> {
        EngineKind::ALL
            .into_iter()
            .find(|kind| kind.tag() == s)
            .ok_or_else(|| Error::InvalidArgument(format!("unknown engine `{s}`, expected tree or fdm")))
    }
}

/// A valuation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingRequest {
    /// Valuation date.
    pub date: NaiveDate,
    /// Continuously compounded flat rate, in `[0, 1)`.
    pub flat_rate: Rate,
    /// Model family.
    pub model: ModelKind,
    /// Numerical method.
    pub engine: EngineKind,
    /// Strike as a multiple of the ATM rate; finite and positive.
    pub strike_multiplier: Real,
}

/// Outcome of a valuation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingResult {
    /// Present value of the swaption.
    pub npv: Real,
    /// Model family used.
    pub model: ModelKind,
    /// Numerical method used.
    pub engine: EngineKind,
    /// Valuation date of the request.
    pub valuation_date: NaiveDate,
    /// Curve reference date.
    pub settlement_date: NaiveDate,
    /// Fair fixed rate of the underlying.
    pub atm_rate: Rate,
    /// Fixed rate the swaption is struck at.
    pub strike: Rate,
}

/// The minimal response, `{ "npv": … }`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NpvResponse {
    /// Present value of the swaption.
    pub npv: Real,
}

impl PricingResult {
    /// The minimal response.
    pub fn response(&self) -> NpvResponse {
        NpvResponse { npv: self.npv }
    }
}

// ── Errors ───────────────────────────────────────────────────────────────

/// Stage of a valuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    /// Request validation.
    Request,
    /// Settlement and swap schedules.
    Schedule,
    /// Yield curve.
    Curve,
    /// Short-rate model.
    Model,
    /// Swap and swaption construction, ATM rate.
    Instrument,
    /// Tree or grid pricing.
    Engine,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Component::Request => "request",
            Component::Schedule => "schedule",
            Component::Curve => "curve",
            Component::Model => "model",
            Component::Instrument => "instrument",
            Component::Engine => "engine",
        })
    }
}

/// A failed valuation.
#[derive(Debug, Clone, PartialEq, ThisError)]
#[error("{component} failed (model `{model}`, engine `{engine}`): {source}")]
pub struct ValuationError {
    /// Stage that failed.
    pub component: Component,
    /// Model of the request.
    pub model: ModelKind,
    /// Engine of the request.
    pub engine: EngineKind,
    /// Underlying failure.
    pub source: Error,
}

impl ValuationError {
    /// Bad input or numerical failure.
    pub fn category(&self) -> ErrorCategory {
        self.source.category()
    }
}

// ── Orchestrator ─────────────────────────────────────────────────────────

/// Prices requests under a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct Valuation {
    config: PricingConfig,
}

impl Valuation {
    /// A valuation service for `config`.
    pub fn new(config: PricingConfig) -> Self {
        Self { config }
    }

    /// The configuration in use.
    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    /// Price one request.
    pub fn price(&self, request: &PricingRequest) -> Result<PricingResult, ValuationError> {
        let span = tracing::info_span!(
            "valuation",
            model = %request.model,
            engine = %request.engine,
            date = %request.date,
        );
        let _guard = span.enter();

        let result = self.run(request);
        match &result {
            Ok(priced) => tracing::info!(npv = priced.npv, strike = priced.strike, "valuation done"),
            Err(e) => tracing::warn!(component = %e.component, category = ?e.category(), error = %e.source, "valuation rejected"),
        }
        result
    }

    fn run(&self, request: &PricingRequest) -> Result<PricingResult, ValuationError> {
        let fail = |component: Component| {
            move |source: Error| ValuationError {
                component,
                model: request.model,
                engine: request.engine,
                source,
            }
        };
        let market = &self.config.market;

        check_request(request).map_err(fail(Component::Request))?;
        let valuation_date = to_date(request.date).map_err(fail(Component::Request))?;

        let settlement = Target
            .advance(
                valuation_date,
                Period::new(market.settlement_days as i32, TimeUnit::Days),
                BusinessDayConvention::Following,
                false,
            )
            .map_err(fail(Component::Schedule))?;
        let curve: Arc<dyn YieldTermStructure> = Arc::new(
            FlatForward::new(settlement, request.flat_rate, market.day_counter.day_counter())
                .map_err(fail(Component::Curve))?,
        );
        let swap = MakeVanillaSwap::new(settlement)
            .with_type(market.side.into())
            .with_nominal(market.nominal)
            .build()
            .map_err(fail(Component::Schedule))?;
        tracing::debug!(%settlement, start = %swap.start_date(), "schedule built");

        let atm_rate = DiscountingSwapEngine::new(Arc::clone(&curve))
            .fair_rate(&swap)
            .map_err(fail(Component::Instrument))?;
        let strike = atm_rate * request.strike_multiplier;
        let swaption = BermudanSwaption::on_fixed_resets(swap.with_fixed_rate(strike))
            .map_err(fail(Component::Instrument))?;
        let args = swaption
            .arguments(curve.as_ref())
            .map_err(fail(Component::Instrument))?;

        let params = self.config.models.parameters(request.model);
        let model = Arc::new(ShortRateModel::new(&params, curve).map_err(fail(Component::Model))?);
        let npv = self
            .engine(request.engine, model)
            .and_then(|engine| engine.calculate(&args))
            .map_err(fail(Component::Engine))?
            .npv;

        Ok(PricingResult {
            npv,
            model: request.model,
            engine: request.engine,
            valuation_date: request.date,
            settlement_date: to_naive(settlement).map_err(fail(Component::Schedule))?,
            atm_rate,
            strike,
        })
    }

    fn engine(
        &self,
        kind: EngineKind,
        model: Arc<ShortRateModel>,
    ) -> CoreResult<Box<dyn PricingEngine<SwaptionArguments>>> {
        Ok(match kind {
            EngineKind::Tree => Box::new(TreeSwaptionEngine::new(model, self.config.tree)?),
            EngineKind::Fdm => Box::new(FdSwaptionEngine::new(model, self.config.fdm)?),
        })
    }
}

fn check_request(request: &PricingRequest) -> CoreResult<()> {
    let m = request.strike_multiplier;
    if !(m.is_finite() && m > 0.0) {
        return Err(Error::InvalidArgument(format!(
            "strike multiplier must be finite and positive, got {m}"
        )));
    }
    Ok(())
}

fn to_date(date: NaiveDate) -> CoreResult<Date> {
    let year = u16::try_from(date.year())
        .map_err(|_| Error::Date(format!("year {} is out of range", date.year())))?;
    Date::from_ymd(year, date.month() as u8, date.day() as u8)
}

fn to_naive(date: Date) -> CoreResult<NaiveDate> {
    NaiveDate::from_ymd_opt(
        i32::from(date.year()),
        u32::from(date.month()),
        u32::from(date.day_of_month()),
    )
    .ok_or_else(|| Error::Date(format!("{date} has no calendar equivalent")))
}
