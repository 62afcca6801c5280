//! Finite-difference pricing of Bermudan swaptions.
//!
//! The backward pricing PDE of the model's factors is solved on a uniform
//! mesh spanning a number of standard deviations of the factors at the
//! horizon. One-factor models use a theta scheme; G2++ uses the Douglas ADI
//! splitting in the decorrelated coordinates `(x, w)`, where the PDE has no
//! mixed derivative.
//!
//! The curve shift is fitted step by step with the discrete adjoint of the
//! rollback, so the grid reprices the curve's discount factors in exactly
//! the scheme used for the option. The continuous-time shift of the Gaussian
//! models, which misses the curve by the discretization error, only seeds
//! the fit.
//!
//! A few fully implicit steps follow every exercise date (in backward time)
//! to damp the oscillations Crank–Nicolson produces around the kink of the
//! payoff. After the solve the engine checks that a zero-coupon bond rolled
//! back on the same grid matches the curve, and that the result is finite,
//! not materially negative and no larger than the discounted absolute cash
//! flows; failures raise [`Error::GridInstability`].

use crate::discretized_swaption::{
    check_arguments, has_analytic_bonds, induce, Induction, Rollback, SwaptionEvents,
};
use bermudan_core::errors::{Error, Result};
use bermudan_core::{DiscountFactor, Real, Size, Time};
use bermudan_instruments::{PricingEngine, PricingResults, SwaptionArguments, SwaptionEngine};
use bermudan_math::brent_bracketing;
use bermudan_methods::{
    BoundaryCondition, DouglasScheme, FdmScheme, Grid2d, ThetaScheme, TimeGrid,
    TridiagonalOperator, Uniform1dMesher,
};
use bermudan_models::{G2Model, OneFactorModel, ShortRateModel};
use bermudan_processes::{OrnsteinUhlenbeckProcess, StochasticProcess1D};
use bermudan_termstructures::YieldTermStructure;
use std::sync::Arc;

/// Largest relative miss of the horizon discount factor.
const BOND_TOLERANCE: Real = 1.0e-3;

/// Option values below `−NEGATIVE_TOLERANCE · nominal` are unstable.
const NEGATIVE_TOLERANCE: Real = 1.0e-6;

const SHIFT_STEP: Real = 0.01;
const SHIFT_ACCURACY: Real = 1.0e-12;

/// Discretization of the finite-difference engine.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FdmSettings {
    /// Target number of time steps up to the last event.
    pub time_steps: Size,
    /// Mesh points of one-factor models. Rounded up to an odd number.
    pub grid_points: Size,
    /// Mesh points per axis for G2++. Rounded up to an odd number.
    pub two_factor_grid_points: Size,
    /// Half-width of the mesh in standard deviations of the factor at the
    /// horizon.
    pub std_devs: Real,
    /// Time-stepping scheme away from exercise dates.
    pub scheme: FdmScheme,
    /// Fully implicit steps taken right after each exercise date, going
    /// backward.
    pub damping_steps: Size,
    /// Condition at the edges of the mesh.
    pub boundary: BoundaryCondition,
    /// The holder exercises only when the underlying beats continuation by
    /// at least this much.
    pub exercise_tolerance: Real,
}

impl Default for FdmSettings {
    fn default() -> Self {
        Self {
            time_steps: 100,
            grid_points: 100,
            two_factor_grid_points: 50,
            std_devs: 5.0,
            scheme: FdmScheme::CrankNicolson,
            damping_steps: 2,
            boundary: BoundaryCondition::ZeroSecondDerivative,
            exercise_tolerance: 1.0e-10,
        }
    }
}

impl FdmSettings {
    /// Settings with a different time-stepping scheme.
    pub fn with_scheme(mut self, scheme: FdmScheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Settings with a finer or coarser one-factor discretization.
    pub fn with_resolution(mut self, time_steps: Size, grid_points: Size) -> Self {
        self.time_steps = time_steps;
        self.grid_points = grid_points;
        self
    }

    /// Reject settings no grid can be built with.
    pub fn validate(&self) -> Result<()> {
        if self.time_steps == 0 {
            return Err(Error::InvalidArgument("grid needs at least one time step".into()));
        }
        if self.grid_points < 3 || self.two_factor_grid_points < 3 {
            return Err(Error::InvalidArgument(format!(
                "grid needs at least 3 points per axis, got {} and {}",
                self.grid_points, self.two_factor_grid_points
            )));
        }
        if !(self.std_devs.is_finite() && self.std_devs > 0.0) {
            return Err(Error::InvalidArgument(format!(
                "grid width must be a positive number of standard deviations, got {}",
                self.std_devs
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

/// Bermudan swaption engine on a finite-difference grid.
#[derive(Debug, Clone)]
pub struct FdSwaptionEngine {
    model: Arc<ShortRateModel>,
    settings: FdmSettings,
}

impl FdSwaptionEngine {
    /// Create an engine for `model`.
    pub fn new(model: Arc<ShortRateModel>, settings: FdmSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self { model, settings })
    }

    /// Create an engine with default settings.
    pub fn with_defaults(model: Arc<ShortRateModel>) -> Self {
        Self {
            model,
            settings: FdmSettings::default(),
        }
    }

    /// The model whose PDE is solved.
    pub fn model(&self) -> &Arc<ShortRateModel> {
        &self.model
    }

    /// Discretization settings.
    pub fn settings(&self) -> &FdmSettings {
        &self.settings
    }

    /// Scheme of every step: implicit right after exercise dates.
    fn step_schemes(&self, grid: &TimeGrid, events: &SwaptionEvents) -> Vec<FdmScheme> {
        let mut schemes = vec![self.settings.scheme; grid.steps()];
        for e in events.exercise_slices() {
            for scheme in &mut schemes[e.saturating_sub(self.settings.damping_steps)..e] {
                *scheme = FdmScheme::Implicit;
            }
        }
        schemes
    }

    fn one_factor<M: OneFactorModel>(&self, model: &M, args: &SwaptionArguments) -> Result<Solved> {
        let analytic = has_analytic_bonds(model)?;
        let grid = TimeGrid::with_mandatory_times(
            &SwaptionEvents::mandatory_times(args, analytic),
            self.settings.time_steps,
        )?;
        let events = SwaptionEvents::locate(args, &grid, analytic)?;
        let process = model.factor_process();
        let half_width = self.settings.std_devs * process.variance_over(grid.end()).sqrt();
        let mesher = Uniform1dMesher::symmetric(half_width, self.settings.grid_points)?;
        let schemes: Vec<ThetaScheme> = self
            .step_schemes(&grid, &events)
            .into_iter()
            .map(ThetaScheme::for_scheme)
            .collect();

        let mut fd = Fd1d {
            model,
            mesher: &mesher,
            grid: &grid,
            schemes,
            boundary: self.settings.boundary,
            shifts: Vec::new(),
        };
        fd.shifts = fd.fit_shifts()?;
        tracing::debug!(
            model = %model.kind(),
            steps = grid.steps(),
            points = mesher.size(),
            half_width,
            analytic,
            "one-factor grid built"
        );

        let induction = induce(&fd, &grid, args, &events, analytic, self.settings.exercise_tolerance)?;
        Ok(Solved::new(induction, mesher.center_index(), &grid, mesher.size()))
    }

    fn two_factor(&self, model: &G2Model, args: &SwaptionArguments) -> Result<Solved> {
        let grid = TimeGrid::with_mandatory_times(
            &SwaptionEvents::mandatory_times(args, true),
            self.settings.time_steps,
        )?;
        let events = SwaptionEvents::locate(args, &grid, true)?;
        let process = model.process();
        let x_process = process.x_process();
        let (points, width) = (self.settings.two_factor_grid_points, self.settings.std_devs);
        let mesh = Grid2d::new(
            Uniform1dMesher::symmetric(width * x_process.variance_over(grid.end()).sqrt(), points)?,
            Uniform1dMesher::symmetric(width * process.w_variance(grid.end()).sqrt(), points)?,
        );
        let schemes = self
            .step_schemes(&grid, &events)
            .into_iter()
            .map(DouglasScheme::for_scheme)
            .collect();
        tracing::debug!(
            model = "g2",
            steps = grid.steps(),
            nx = mesh.nx(),
            ny = mesh.ny(),
            "two-factor grid built"
        );

        let mut fd = Fd2d {
            model,
            x_process,
            mesh: &mesh,
            grid: &grid,
            schemes,
            boundary: self.settings.boundary,
            shifts: Vec::new(),
        };
        fd.shifts = fd.fit_shifts()?;
        let induction = induce(&fd, &grid, args, &events, true, self.settings.exercise_tolerance)?;
        Ok(Solved::new(induction, mesh.center(), &grid, mesh.size()))
    }
}

impl PricingEngine<SwaptionArguments> for FdSwaptionEngine {
    fn calculate(&self, args: &SwaptionArguments) -> Result<PricingResults> {
        check_arguments(args)?;
        let span = tracing::debug_span!(
            "fd_engine",
            model = %self.model.kind(),
            scheme = ?self.settings.scheme
        );
        let _guard = span.enter();

        let solved = match self.model.as_ref() {
            ShortRateModel::HullWhite(m) => self.one_factor(m, args)?,
            ShortRateModel::BlackKarasinski(m) => self.one_factor(m, args)?,
            ShortRateModel::G2(m) => self.two_factor(m, args)?,
        };
        solved.check(self.model.term_structure().as_ref(), args)?;
        Ok(PricingResults::from_npv(solved.npv)
            .with_result("time_steps", solved.steps as Real)
            .with_result("grid_points", solved.points as Real)
            .with_result("horizon_discount", solved.bond))
    }
}

impl SwaptionEngine for FdSwaptionEngine {
    fn term_structure(&self) -> &Arc<dyn YieldTermStructure> {
        self.model.term_structure()
    }
}

/// Values at the origin of the factors after the solve.
struct Solved {
    npv: Real,
    bond: DiscountFactor,
    horizon: Time,
    steps: usize,
    points: usize,
}

impl Solved {
    fn new(induction: Induction, center: usize, grid: &TimeGrid, points: usize) -> Self {
        Self {
            npv: induction.option[center],
            bond: induction.bond[center],
            horizon: grid.end(),
            steps: grid.steps(),
            points,
        }
    }

    fn check(&self, curve: &dyn YieldTermStructure, args: &SwaptionArguments) -> Result<()> {
        let expected = curve.discount(self.horizon)?;
        let miss = (self.bond - expected).abs() / expected;
        if !(miss <= BOND_TOLERANCE) {
            return Err(Error::GridInstability(format!(
                "zero-coupon bond to t = {:.4} is {:e} on the grid, curve gives {expected:.8}",
                self.horizon, self.bond
            )));
        }
        if !self.npv.is_finite() {
            return Err(Error::GridInstability(format!("solution is {}", self.npv)));
        }
        if self.npv < -NEGATIVE_TOLERANCE * args.nominal {
            return Err(Error::GridInstability(format!(
                "negative option value {:e}",
                self.npv
            )));
        }
        // the option is worth at most the absolute value of its cash flows
        let mut bound = 0.0;
        for cf in &args.cash_flows {
            bound += cf.amount.abs() * curve.discount(cf.payment_time)?;
        }
        if self.npv > bound {
            return Err(Error::GridInstability(format!(
                "option value {:e} exceeds the value {bound:.6} of its cash flows",
                self.npv
            )));
        }
        Ok(())
    }
}

/// Fit one shift per step so that state prices carried forward with the
/// adjoint of each step reprice the curve at the end of the step.
///
/// `forward(i, shift, density)` applies the adjoint of step `i` built with
/// `shift`; `guess` seeds the root search at the middle of each step.
fn fit_shifts<G, F>(
    grid: &TimeGrid,
    curve: &dyn YieldTermStructure,
    mut density: Vec<Real>,
    guess: G,
    forward: F,
) -> Result<Vec<Real>>
where
    G: Fn(Time) -> Result<Real>,
    F: Fn(usize, Real, &[Real]) -> Result<Vec<Real>>,
{
    let mut shifts = Vec::with_capacity(grid.steps());
    for i in 0..grid.steps() {
        let (t, dt) = (grid.time(i), grid.dt(i));
        let target = curve.discount(grid.time(i + 1))?;
        let objective = |shift: Real| {
            forward(i, shift, &density)
                .map(|q| q.iter().sum::<Real>() - target)
                .unwrap_or(Real::NAN)
        };
        let shift = brent_bracketing(objective, guess(t + 0.5 * dt)?, SHIFT_STEP, SHIFT_ACCURACY)
            .map_err(|e| {
                Error::GridInstability(format!("cannot fit the short-rate shift at t = {t:.4}: {e}"))
            })?;
        density = forward(i, shift, &density)?;
        shifts.push(shift);
    }
    tracing::debug!(
        steps = shifts.len(),
        first = ?shifts.first(),
        last = ?shifts.last(),
        "grid shifts fitted"
    );
    Ok(shifts)
}

// ── One factor ───────────────────────────────────────────────────────────

struct Fd1d<'a, M> {
    model: &'a M,
    mesher: &'a Uniform1dMesher,
    grid: &'a TimeGrid,
    schemes: Vec<ThetaScheme>,
    boundary: BoundaryCondition,
    shifts: Vec<Real>,
}

impl<M: OneFactorModel> Fd1d<'_, M> {
    fn operator(&self, i: usize, shift: Real) -> TridiagonalOperator {
        let t = self.grid.time(i);
        let process = self.model.factor_process();
        let xs = self.mesher.locations();
        let drift: Vec<Real> = xs.iter().map(|&x| process.drift(t, x)).collect();
        let rate: Vec<Real> = xs.iter().map(|&x| self.model.short_rate(x, shift)).collect();
        let sigma = process.diffusion(t, 0.0);
        TridiagonalOperator::convection_diffusion(self.mesher, &drift, sigma * sigma, &rate, self.boundary)
    }

    fn fit_shifts(&self) -> Result<Vec<Real>> {
        let mut density = vec![0.0; self.mesher.size()];
        density[self.mesher.center_index()] = 1.0;
        fit_shifts(
            self.grid,
            self.model.term_structure().as_ref(),
            density,
            |t| self.model.shift_guess(t),
            |i, shift, q| self.schemes[i].step_adjoint(&self.operator(i, shift), q, self.grid.dt(i)),
        )
    }
}

impl<M: OneFactorModel> Rollback for Fd1d<'_, M> {
    type Step = TridiagonalOperator;

    fn size(&self, _i: usize) -> usize {
        self.mesher.size()
    }

    fn prepare(&self, i: usize) -> Result<Self::Step> {
        Ok(self.operator(i, self.shifts[i]))
    }

    fn rollback(&self, step: &Self::Step, i: usize, values: &[Real]) -> Result<Vec<Real>> {
        self.schemes[i].step(step, values, self.grid.dt(i))
    }

    fn discount_bonds(&self, i: usize, payment: Time) -> Result<Vec<Real>> {
        let t = self.grid.time(i);
        self.mesher
            .locations()
            .iter()
            .map(|&x| self.model.discount_bond(t, payment, x))
            .collect()
    }
}

// ── Two factors ──────────────────────────────────────────────────────────

struct Fd2d<'a> {
    model: &'a G2Model,
    x_process: OrnsteinUhlenbeckProcess,
    mesh: &'a Grid2d,
    grid: &'a TimeGrid,
    schemes: Vec<DouglasScheme>,
    boundary: BoundaryCondition,
    shifts: Vec<Real>,
}

/// Operators along each axis of one step; the short rate is split evenly
/// between them.
struct Split {
    first: Vec<TridiagonalOperator>,
    second: Vec<TridiagonalOperator>,
}

impl Fd2d<'_> {
    fn split(&self, i: usize, shift: Real) -> Split {
        let t = self.grid.time(i);
        let process = self.model.process();
        let (xs, ws) = (self.mesh.first().locations(), self.mesh.second().locations());
        let half_rate = |x: Real, w: Real| 0.5 * self.model.short_rate(x, w, shift);

        let x_drift: Vec<Real> = xs.iter().map(|&x| self.x_process.drift(t, x)).collect();
        let x_variance = self.x_process.diffusion(t, 0.0).powi(2);
        let first = ws
            .iter()
            .map(|&w| {
                let rate: Vec<Real> = xs.iter().map(|&x| half_rate(x, w)).collect();
                TridiagonalOperator::convection_diffusion(
                    self.mesh.first(),
                    &x_drift,
                    x_variance,
                    &rate,
                    self.boundary,
                )
            })
            .collect();

        let w_variance = process.w_diffusion().powi(2);
        let second = xs
            .iter()
            .map(|&x| {
                let drift: Vec<Real> = ws.iter().map(|&w| process.w_drift(x, w)).collect();
                let rate: Vec<Real> = ws.iter().map(|&w| half_rate(x, w)).collect();
                TridiagonalOperator::convection_diffusion(
                    self.mesh.second(),
                    &drift,
                    w_variance,
                    &rate,
                    self.boundary,
                )
            })
            .collect();
        Split { first, second }
    }

    fn fit_shifts(&self) -> Result<Vec<Real>> {
        let mut density = vec![0.0; self.mesh.size()];
        density[self.mesh.center()] = 1.0;
        fit_shifts(
            self.grid,
            self.model.term_structure().as_ref(),
            density,
            |t| self.model.shift(t),
            |i, shift, q| {
                let step = self.split(i, shift);
                self.schemes[i].step_adjoint(self.mesh, &step.first, &step.second, q, self.grid.dt(i))
            },
        )
    }
}

impl Rollback for Fd2d<'_> {
    type Step = Split;

    fn size(&self, _i: usize) -> usize {
        self.mesh.size()
    }

    fn prepare(&self, i: usize) -> Result<Self::Step> {
        Ok(self.split(i, self.shifts[i]))
    }

    fn rollback(&self, step: &Self::Step, i: usize, values: &[Real]) -> Result<Vec<Real>> {
        self.schemes[i].step(self.mesh, &step.first, &step.second, values, self.grid.dt(i))
    }

    fn discount_bonds(&self, i: usize, payment: Time) -> Result<Vec<Real>> {
        let t = self.grid.time(i);
        (0..self.mesh.size())
            .map(|k| {
                let (x, w) = self.mesh.point(k);
                self.model.discount_bond(t, payment, x, w)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use bermudan_instruments::{SwapType, SwaptionCashFlow};
    use bermudan_models::{ModelKind, ModelParameters};
    use bermudan_termstructures::FlatForward;
    use bermudan_time::Date;

    fn flat_ts(rate: Real) -> Arc<dyn YieldTermStructure> {
        let ref_date = Date::from_ymd(2025, 7, 17).unwrap();
        Arc::new(FlatForward::continuous(ref_date, rate).unwrap())
    }

    fn model_at(kind: ModelKind, rate: Real) -> Arc<ShortRateModel> {
        Arc::new(ShortRateModel::new(&ModelParameters::default_for(kind), flat_ts(rate)).unwrap())
    }

    fn model(kind: ModelKind) -> Arc<ShortRateModel> {
        model_at(kind, 0.03)
    }

    fn one_period(strike: Real) -> SwaptionArguments {
        SwaptionArguments {
            swap_type: SwapType::Payer,
            nominal: 1.0,
            fixed_rate: strike,
            exercise_times: vec![1.0],
            cash_flows: vec![
                SwaptionCashFlow { reset_time: 1.0, payment_time: 1.0, amount: 1.0 },
                SwaptionCashFlow { reset_time: 1.0, payment_time: 2.0, amount: -1.0 - strike },
            ],
        }
    }

    #[test]
    fn grid_reprices_the_curve_to_the_horizon() {
        for kind in ModelKind::ALL {
            let engine = FdSwaptionEngine::with_defaults(model(kind));
            let results = engine.calculate(&one_period(0.03)).unwrap();
            let horizon: Real = if kind == ModelKind::BlackKarasinski { 2.0 } else { 1.0 };
            assert_abs_diff_eq!(
                results.result("horizon_discount").unwrap(),
                (-0.03 * horizon).exp(),
                epsilon = 1e-9
            );
            assert!(results.npv > 0.0, "{kind}: {}", results.npv);
        }
    }

    #[test]
    fn high_rate_gaussian_grids_reprice_the_curve() {
        // annual Bermudan into a swap ending at 6y, struck near the money
        let strike = 0.65;
        let args = SwaptionArguments {
            exercise_times: vec![1.0, 2.0, 3.0, 4.0, 5.0],
            cash_flows: (1..=5)
                .flat_map(|j| {
                    let t = j as Real;
                    [
                        SwaptionCashFlow { reset_time: t, payment_time: t, amount: 1.0 },
                        SwaptionCashFlow { reset_time: t, payment_time: t + 1.0, amount: -1.0 - strike },
                    ]
                })
                .collect(),
            ..one_period(strike)
        };
        for kind in [ModelKind::HullWhite, ModelKind::G2] {
            let engine = FdSwaptionEngine::with_defaults(model_at(kind, 0.5));
            let results = engine.calculate(&args).unwrap();
            assert_abs_diff_eq!(
                results.result("horizon_discount").unwrap(),
                (-0.5_f64 * 5.0).exp(),
                epsilon = 1e-9
            );
            assert!(results.npv.is_finite() && results.npv > 0.0, "{kind}: {}", results.npv);
        }
    }

    #[test]
    fn damping_covers_the_steps_after_each_exercise() {
        let engine = FdSwaptionEngine::with_defaults(model(ModelKind::HullWhite));
        let args = SwaptionArguments {
            exercise_times: vec![0.5, 1.0],
            ..one_period(0.03)
        };
        let grid = TimeGrid::with_mandatory_times(&SwaptionEvents::mandatory_times(&args, true), 10)
            .unwrap();
        let events = SwaptionEvents::locate(&args, &grid, true).unwrap();
        let schemes = engine.step_schemes(&grid, &events);
        let implicit: Vec<usize> = schemes
            .iter()
            .enumerate()
            .filter_map(|(i, s)| (*s == FdmScheme::Implicit).then_some(i))
            .collect();
        assert_eq!(implicit, vec![3, 4, 8, 9]);
    }

    #[test]
    fn unstable_explicit_scheme_is_a_grid_failure() {
        // σ²·dt/dx² is far above the explicit stability limit of 1.
        let settings = FdmSettings::default()
            .with_scheme(FdmScheme::Explicit)
            .with_resolution(20, 400);
        let engine = FdSwaptionEngine::new(model(ModelKind::HullWhite), settings).unwrap();
        let args = SwaptionArguments {
            exercise_times: vec![1.0],
            cash_flows: vec![
                SwaptionCashFlow { reset_time: 1.0, payment_time: 1.0, amount: 1.0 },
                SwaptionCashFlow { reset_time: 1.0, payment_time: 6.0, amount: -1.0 },
            ],
            ..one_period(0.0)
        };
        let err = engine.calculate(&args).unwrap_err();
        assert!(matches!(err, Error::GridInstability(_)), "{err}");
        assert_eq!(err.category(), bermudan_core::ErrorCategory::NumericalMethod);
    }

    #[test]
    fn settings_are_validated() {
        let m = model(ModelKind::HullWhite);
        let bad = FdmSettings {
            grid_points: 2,
            ..FdmSettings::default()
        };
        assert!(FdSwaptionEngine::new(Arc::clone(&m), bad).is_err());
        let bad = FdmSettings {
            std_devs: 0.0,
            ..FdmSettings::default()
        };
        assert!(FdSwaptionEngine::new(m, bad).is_err());
    }
}
