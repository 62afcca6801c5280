//! Lattice pricing of Bermudan swaptions.
//!
//! The short rate is discretized on a recombining trinomial tree (a
//! product of two trees for G2++) whose shift is fitted slice by slice to
//! the curve's discount factors. Values are rolled back with the one-step
//! discount `exp(−r·dt)` at each node; cash flows enter at their reset
//! slices and the option is projected on the underlying at exercise
//! slices.
//!
//! The tree never refines itself. Any slice that cannot be built or fitted
//! fails the request with [`Error::LatticeConstruction`].

use crate::discretized_swaption::{
    check_arguments, has_analytic_bonds, induce, Induction, Rollback, SwaptionEvents,
};
use bermudan_core::errors::{Error, Result};
use bermudan_core::{DiscountFactor, Real, Size, Time};
use bermudan_instruments::{PricingEngine, PricingResults, SwaptionArguments, SwaptionEngine};
use bermudan_methods::{TimeGrid, TrinomialTree, TwoFactorTree, DEFAULT_SPACING};
use bermudan_models::{G2Model, OneFactorModel, ShortRateModel};
use bermudan_termstructures::YieldTermStructure;
use std::sync::Arc;

/// Discretization of the tree engine.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TreeSettings {
    /// Target number of time steps up to the last event.
    pub time_steps: Size,
    /// Node spacing factor `λ` in `dx = λ·√Var`.
    pub spacing: Real,
    /// The holder exercises only when the underlying beats continuation by
    /// at least this much.
    pub exercise_tolerance: Real,
}

impl Default for TreeSettings {
    fn default() -> Self {
        Self {
            time_steps: 50,
            spacing: DEFAULT_SPACING,
            exercise_tolerance: 1.0e-10,
        }
    }
}

impl TreeSettings {
    /// Settings with a different number of time steps.
    pub fn with_time_steps(mut self, time_steps: Size) -> Self {
        self.time_steps = time_steps;
        self
    }

    /// Reject settings no tree can be built with.
    pub fn validate(&self) -> Result<()> {
        if self.time_steps == 0 {
            return Err(Error::InvalidArgument("tree needs at least one time step".into()));
        }
        if !(self.spacing.is_finite() && self.spacing > 0.0) {
            return Err(Error::InvalidArgument(format!(
                "tree spacing factor must be positive, got {}",
                self.spacing
            )));
        }
        if !(self.exercise_tolerance.is_finite() && self.exercise_tolerance >= 0.0) {
            return Err(Error::InvalidArgument(format!(
                "exercise tolerance must be non-negative, got {}",
                self.exercise_tolerance
            )));
        }
        Ok(())
    }
}

/// Bermudan swaption engine on a short-rate lattice.
#[derive(Debug, Clone)]
pub struct TreeSwaptionEngine {
    model: Arc<ShortRateModel>,
    settings: TreeSettings,
}

impl TreeSwaptionEngine {
    /// Create an engine for `model`.
    pub fn new(model: Arc<ShortRateModel>, settings: TreeSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self { model, settings })
    }

    /// Create an engine with default settings.
    pub fn with_defaults(model: Arc<ShortRateModel>) -> Self {
        Self {
            model,
            settings: TreeSettings::default(),
        }
    }

    /// The model the lattice discretizes.
    pub fn model(&self) -> &Arc<ShortRateModel> {
        &self.model
    }

    /// Discretization settings.
    pub fn settings(&self) -> &TreeSettings {
        &self.settings
    }

    fn one_factor<M: OneFactorModel>(&self, model: &M, args: &SwaptionArguments) -> Result<Priced> {
        let analytic = has_analytic_bonds(model)?;
        let grid = time_grid(args, analytic, self.settings.time_steps)?;
        let events = SwaptionEvents::locate(args, &grid, analytic)?;
        let tree = TrinomialTree::new(model.factor_process(), &grid, self.settings.spacing)?;
        let curve = model.term_structure();
        let shifts = tree.fit_shifts(
            |t| curve.discount(t),
            |x, shift| model.short_rate(x, shift),
            |t| model.shift_guess(t),
        )?;
        tracing::debug!(
            model = %model.kind(),
            steps = grid.steps(),
            nodes = tree.size(grid.steps()),
            analytic,
            "one-factor lattice built"
        );
        let lattice = OneFactorLattice {
            model,
            tree: &tree,
            grid: &grid,
            shifts,
        };
        let induction = induce(&lattice, &grid, args, &events, analytic, self.settings.exercise_tolerance)?;
        Ok(Priced::new(induction, grid.steps()))
    }

    fn two_factor(&self, model: &G2Model, args: &SwaptionArguments) -> Result<Priced> {
        let grid = time_grid(args, true, self.settings.time_steps)?;
        let events = SwaptionEvents::locate(args, &grid, true)?;
        let tree = TwoFactorTree::new(model.process(), &grid, self.settings.spacing)?;
        let curve = model.term_structure();
        let shifts = tree.fit_shifts(|t| curve.discount(t), |x, w| model.short_rate(x, w, 0.0))?;
        tracing::debug!(
            model = "g2",
            steps = grid.steps(),
            nodes = tree.size(grid.steps()),
            "two-factor lattice built"
        );
        let lattice = TwoFactorLattice {
            model,
            tree: &tree,
            grid: &grid,
            shifts,
        };
        let induction = induce(&lattice, &grid, args, &events, true, self.settings.exercise_tolerance)?;
        Ok(Priced::new(induction, grid.steps()))
    }
}

impl PricingEngine<SwaptionArguments> for TreeSwaptionEngine {
    fn calculate(&self, args: &SwaptionArguments) -> Result<PricingResults> {
        check_arguments(args)?;
        let span = tracing::debug_span!("tree_engine", model = %self.model.kind());
        let _guard = span.enter();

        let priced = match self.model.as_ref() {
            ShortRateModel::HullWhite(m) => self.one_factor(m, args)?,
            ShortRateModel::BlackKarasinski(m) => self.one_factor(m, args)?,
            ShortRateModel::G2(m) => self.two_factor(m, args)?,
        };
        if !priced.npv.is_finite() {
            return Err(Error::LatticeConstruction {
                step: 0,
                time: 0.0,
                reason: format!("backward induction produced {}", priced.npv),
            });
        }
        Ok(PricingResults::from_npv(priced.npv)
            .with_result("time_steps", priced.steps as Real)
            .with_result("horizon_discount", priced.bond))
    }
}

impl SwaptionEngine for TreeSwaptionEngine {
    fn term_structure(&self) -> &Arc<dyn YieldTermStructure> {
        self.model.term_structure()
    }
}

/// Root values of a backward induction.
struct Priced {
    npv: Real,
    bond: DiscountFactor,
    steps: usize,
}

impl Priced {
    fn new(induction: Induction, steps: usize) -> Self {
        Self {
            npv: induction.option[0],
            bond: induction.bond[0],
            steps,
        }
    }
}

fn time_grid(args: &SwaptionArguments, analytic: bool, steps: Size) -> Result<TimeGrid> {
    TimeGrid::with_mandatory_times(&SwaptionEvents::mandatory_times(args, analytic), steps)
}

// ── One factor ───────────────────────────────────────────────────────────

struct OneFactorLattice<'a, M> {
    model: &'a M,
    tree: &'a TrinomialTree,
    grid: &'a TimeGrid,
    shifts: Vec<Real>,
}

impl<M: OneFactorModel> Rollback for OneFactorLattice<'_, M> {
    type Step = Vec<DiscountFactor>;

    fn size(&self, i: usize) -> usize {
        self.tree.size(i)
    }

    fn prepare(&self, i: usize) -> Result<Self::Step> {
        let (dt, shift) = (self.grid.dt(i), self.shifts[i]);
        Ok(self
            .tree
            .layer(i)
            .into_iter()
            .map(|x| (-self.model.short_rate(x, shift) * dt).exp())
            .collect())
    }

    fn rollback(&self, step: &Self::Step, i: usize, values: &[Real]) -> Result<Vec<Real>> {
        Ok(self.tree.rollback(i, values, step))
    }

    fn discount_bonds(&self, i: usize, payment: Time) -> Result<Vec<Real>> {
        let t = self.grid.time(i);
        self.tree
            .layer(i)
            .into_iter()
            .map(|x| self.model.discount_bond(t, payment, x))
            .collect()
    }
}

// ── Two factors ──────────────────────────────────────────────────────────

struct TwoFactorLattice<'a> {
    model: &'a G2Model,
    tree: &'a TwoFactorTree,
    grid: &'a TimeGrid,
    shifts: Vec<Real>,
}

impl Rollback for TwoFactorLattice<'_> {
    type Step = Vec<DiscountFactor>;

    fn size(&self, i: usize) -> usize {
        self.tree.size(i)
    }

    fn prepare(&self, i: usize) -> Result<Self::Step> {
        let (dt, shift) = (self.grid.dt(i), self.shifts[i]);
        Ok(self
            .tree
            .states(i)
            .into_iter()
            .map(|(x, w)| (-self.model.short_rate(x, w, shift) * dt).exp())
            .collect())
    }

    fn rollback(&self, step: &Self::Step, i: usize, values: &[Real]) -> Result<Vec<Real>> {
        Ok(self.tree.rollback(i, values, step))
    }

    fn discount_bonds(&self, i: usize, payment: Time) -> Result<Vec<Real>> {
        let t = self.grid.time(i);
        self.tree
            .states(i)
            .into_iter()
            .map(|(x, w)| self.model.discount_bond(t, payment, x, w))
            .collect()
    }
}
