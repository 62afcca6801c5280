//! Short-rate model interfaces and the closed set of model families.
//!
//! * [`OneFactorModel`] — the common surface of Hull–White and
//!   Black–Karasinski, consumed generically by the engines.
//! * [`ShortRateModel`] — the tagged variant the orchestrator builds and the
//!   engines match on once per pricing call.
//! * [`ModelKind`] / [`ModelParameters`] — the stable `"g2" | "hw" | "bk"`
//!   tags and the coefficients owned by each family.

use crate::black_karasinski::BlackKarasinski;
use crate::g2_model::G2Model;
use crate::hull_white_model::HullWhite;
use bermudan_core::errors::{Error, Result};
use bermudan_core::{DiscountFactor, Rate, Real, Time};
use bermudan_processes::OrnsteinUhlenbeckProcess;
use bermudan_termstructures::YieldTermStructure;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

// ── Model tags ───────────────────────────────────────────────────────────

/// The model families, identified by their request tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ModelKind {
    /// `"g2"` — two-factor Gaussian (G2++).
    #[cfg_attr(feature = "serde", serde(rename = "g2"))]
    G2,
    /// `"hw"` — one-factor mean-reverting Gaussian (Hull–White).
    #[cfg_attr(feature = "serde", serde(rename = "hw"))]
    HullWhite,
    /// `"bk"` — one-factor log-normal (Black–Karasinski).
    #[cfg_attr(feature = "serde", serde(rename = "bk"))]
    BlackKarasinski,
}

impl ModelKind {
    /// Every model family.
    pub const ALL: [ModelKind; 3] = [ModelKind::G2, ModelKind::HullWhite, ModelKind::BlackKarasinski];

    /// The request tag of this family.
    pub fn tag(self) -> &'static str {
        match self {
            ModelKind::G2 => "g2",
            ModelKind::HullWhite => "hw",
            ModelKind::BlackKarasinski => "bk",
        }
    }

    /// Number of stochastic factors.
    pub fn factors(self) -> usize {
        match self {
            ModelKind::G2 => 2,
            ModelKind::HullWhite | ModelKind::BlackKarasinski => 1,
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for ModelKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ModelKind::ALL
            .into_iter()
            .find(|kind| kind.tag() == s)
            .ok_or_else(|| {
                Error::InvalidArgument(format!("unknown model `{s}`, expected one of g2, hw, bk"))
            })
    }
}

// ── Coefficients ─────────────────────────────────────────────────────────

/// Coefficients of one model family. Values are checked when the model is
/// built, not here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ModelParameters {
    /// Hull–White speed `a` and volatility `σ`.
    HullWhite {
        /// Mean-reversion speed.
        a: Real,
        /// Volatility of the short rate.
        sigma: Real,
    },
    /// Black–Karasinski speed `a` and volatility `σ` of `ln r`.
    BlackKarasinski {
        /// Mean-reversion speed.
        a: Real,
        /// Volatility of the log short rate.
        sigma: Real,
    },
    /// G2++ coefficients.
    G2 {
        /// Speed of the first factor.
        a: Real,
        /// Volatility of the first factor.
        sigma: Real,
        /// Speed of the second factor.
        b: Real,
        /// Volatility of the second factor.
        eta: Real,
        /// Instantaneous correlation of the factors.
        rho: Real,
    },
}

impl ModelParameters {
    /// Default coefficients for a family.
    pub fn default_for(kind: ModelKind) -> Self {
        match kind {
            ModelKind::HullWhite => ModelParameters::HullWhite { a: 0.1, sigma: 0.01 },
            ModelKind::BlackKarasinski => ModelParameters::BlackKarasinski { a: 0.1, sigma: 0.1 },
            ModelKind::G2 => ModelParameters::G2 {
                a: 0.1,
                sigma: 0.01,
                b: 0.1,
                eta: 0.01,
                rho: -0.75,
            },
        }
    }

    /// Family these coefficients belong to.
    pub fn kind(&self) -> ModelKind {
        match self {
            ModelParameters::HullWhite { .. } => ModelKind::HullWhite,
            ModelParameters::BlackKarasinski { .. } => ModelKind::BlackKarasinski,
            ModelParameters::G2 { .. } => ModelKind::G2,
        }
    }
}

// ── One-factor interface ─────────────────────────────────────────────────

/// A one-factor model `r = R(x(t) + …)` driven by a zero-mean
/// Ornstein–Uhlenbeck factor `x`.
///
/// The factor process supplies the lattice transition moments and the PDE
/// drift/diffusion; the model maps factor values to short rates and, when
/// its family allows, answers bond prices in closed form.
pub trait OneFactorModel: fmt::Debug + Send + Sync {
    /// Family tag.
    fn kind(&self) -> ModelKind;

    /// The curve the model is fitted to.
    fn term_structure(&self) -> &Arc<dyn YieldTermStructure>;

    /// The zero-mean driving factor.
    fn factor_process(&self) -> &OrnsteinUhlenbeckProcess;

    /// Short rate at factor value `x` given the deterministic shift.
    fn short_rate(&self, x: Real, shift: Real) -> Rate;

    /// The shift `φ(t)` that fits the model to the initial curve in
    /// continuous time.
    fn shift(&self, t: Time) -> Result<Real>;

    /// Starting point for a numerical fit of the shift at `t`.
    ///
    /// Defaults to the analytic shift.
    fn shift_guess(&self, t: Time) -> Result<Real> {
        self.shift(t)
    }

    /// Zero-coupon bond `P(t, maturity | x(t) = x)`.
    fn discount_bond(&self, t: Time, maturity: Time, x: Real) -> Result<DiscountFactor>;
}

// ── Closed model set ─────────────────────────────────────────────────────

/// A fitted short-rate model of one of the supported families.
#[derive(Debug, Clone)]
pub enum ShortRateModel {
    /// One-factor Gaussian.
    HullWhite(HullWhite),
    /// One-factor log-normal.
    BlackKarasinski(BlackKarasinski),
    /// Two-factor Gaussian.
    G2(G2Model),
}

impl ShortRateModel {
    /// Build the model described by `params`, fitted to `term_structure`.
    pub fn new(params: &ModelParameters, term_structure: Arc<dyn YieldTermStructure>) -> Result<Self> {
        let model = match *params {
            ModelParameters::HullWhite { a, sigma } => {
                ShortRateModel::HullWhite(HullWhite::new(term_structure, a, sigma)?)
            }
            ModelParameters::BlackKarasinski { a, sigma } => {
                ShortRateModel::BlackKarasinski(BlackKarasinski::new(term_structure, a, sigma)?)
            }
            ModelParameters::G2 {
                a,
                sigma,
                b,
                eta,
                rho,
            } => ShortRateModel::G2(G2Model::new(term_structure, a, sigma, b, eta, rho)?),
        };
        tracing::debug!(model = %model.kind(), ?params, "short-rate model built");
        Ok(model)
    }

    /// Family tag.
    pub fn kind(&self) -> ModelKind {
        match self {
            ShortRateModel::HullWhite(_) => ModelKind::HullWhite,
            ShortRateModel::BlackKarasinski(_) => ModelKind::BlackKarasinski,
            ShortRateModel::G2(_) => ModelKind::G2,
        }
    }

    /// The curve the model is fitted to.
    pub fn term_structure(&self) -> &Arc<dyn YieldTermStructure> {
        match self {
            ShortRateModel::HullWhite(m) => m.term_structure(),
            ShortRateModel::BlackKarasinski(m) => m.term_structure(),
            ShortRateModel::G2(m) => m.term_structure(),
        }
    }
}
