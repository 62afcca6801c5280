//! Backward induction of a swaption over a discretized factor space.
//!
//! Trees and finite-difference grids differ only in how values move from one
//! time slice to the previous one; [`Rollback`] captures that step and
//! [`induce`] runs the swaption on top of it. Three vectors travel together:
//!
//! * the option value,
//! * the value of the underlying coupons that reset on or after the current
//!   time,
//! * a unit zero-coupon bond maturing at the horizon, for consistency
//!   checks.
//!
//! Coupons are added at their reset time, worth `amount · P(reset, payment)`.
//! Models with analytic bonds evaluate that directly; otherwise the coupon's
//! amount is placed on the slice of its payment time and rolled back on its
//! own until the reset.

use bermudan_core::errors::{Error, Result};
use bermudan_core::{Real, Time};
use bermudan_instruments::SwaptionArguments;
use bermudan_methods::TimeGrid;
use bermudan_models::OneFactorModel;

/// A discretization that can carry values back one time slice.
pub(crate) trait Rollback {
    /// Data shared by every vector rolled over the same step.
    type Step;

    /// Number of nodes in slice `i`.
    fn size(&self, i: usize) -> usize;

    /// Prepare the step from slice `i + 1` back to slice `i`.
    fn prepare(&self, i: usize) -> Result<Self::Step>;

    /// Roll values from slice `i + 1` back to slice `i`.
    fn rollback(&self, step: &Self::Step, i: usize, values: &[Real]) -> Result<Vec<Real>>;

    /// `P(t_i, payment | state)` for every node of slice `i`.
    fn discount_bonds(&self, i: usize, payment: Time) -> Result<Vec<Real>>;
}

/// Slices on which the swaption's events happen.
#[derive(Debug, Clone)]
pub(crate) struct SwaptionEvents {
    /// Whether slice `i` is an exercise time.
    pub exercise: Vec<bool>,
    /// Cash flows (indices into the arguments) resetting on slice `i`.
    pub resets: Vec<Vec<usize>>,
    /// Cash flows paid on slice `i`; empty with analytic bonds.
    pub payments: Vec<Vec<usize>>,
}

impl SwaptionEvents {
    /// Times the grid must hit.
    pub fn mandatory_times(args: &SwaptionArguments, analytic: bool) -> Vec<Time> {
        let mut times = args.exercise_times.clone();
        times.extend(args.cash_flows.iter().map(|cf| cf.reset_time));
        if !analytic {
            times.extend(args.cash_flows.iter().map(|cf| cf.payment_time));
        }
        times
    }

    /// Map every event onto a slice of `grid`.
    pub fn locate(args: &SwaptionArguments, grid: &TimeGrid, analytic: bool) -> Result<Self> {
        let slices = grid.size();
        let slice_of = |t: Time| {
            grid.index(t)
                .ok_or_else(|| Error::Runtime(format!("time {t} is not on the time grid")))
        };
        let mut exercise = vec![false; slices];
        for &t in &args.exercise_times {
            exercise[slice_of(t)?] = true;
        }
        let mut resets = vec![Vec::new(); slices];
        let mut payments = vec![Vec::new(); slices];
        for (k, cf) in args.cash_flows.iter().enumerate() {
            resets[slice_of(cf.reset_time)?].push(k);
            if !analytic {
                payments[slice_of(cf.payment_time)?].push(k);
            }
        }
        Ok(Self {
            exercise,
            resets,
            payments,
        })
    }

    /// Slices of exercise times.
    pub fn exercise_slices(&self) -> impl Iterator<Item = usize> + '_ {
        self.exercise
            .iter()
            .enumerate()
            .filter_map(|(i, &e)| e.then_some(i))
    }
}

/// Values at the first slice after backward induction.
#[derive(Debug, Clone)]
pub(crate) struct Induction {
    /// Option values.
    pub option: Vec<Real>,
    /// Unit zero-coupon bond maturing at the last slice.
    pub bond: Vec<Real>,
}

/// Reject arguments no engine can price.
pub(crate) fn check_arguments(args: &SwaptionArguments) -> Result<()> {
    if args.exercise_times.is_empty() {
        return Err(Error::InvalidSchedule("no exercise times".into()));
    }
    if args.exercise_times.iter().any(|t| !t.is_finite() || *t < 0.0) {
        return Err(Error::InvalidSchedule(format!(
            "exercise times must be non-negative, got {:?}",
            args.exercise_times
        )));
    }
    if args.exercise_times.windows(2).any(|w| w[1] <= w[0]) {
        return Err(Error::InvalidSchedule(
            "exercise times must be strictly increasing".into(),
        ));
    }
    if args.cash_flows.is_empty() {
        return Err(Error::InvalidSchedule("the swaption enters no cash flows".into()));
    }
    if args
        .cash_flows
        .iter()
        .any(|cf| !(cf.reset_time.is_finite() && cf.payment_time >= cf.reset_time))
    {
        return Err(Error::InvalidSchedule(
            "cash flows must be paid on or after their reset".into(),
        ));
    }
    Ok(())
}

/// Whether the model prices bonds analytically. Unsupported models fall back
/// to bonds rolled back on the discretization.
pub(crate) fn has_analytic_bonds<M: OneFactorModel + ?Sized>(model: &M) -> Result<bool> {
    match model.discount_bond(0.0, 0.0, 0.0) {
        Ok(_) => Ok(true),
        Err(e) if e.is_unsupported() => {
            tracing::debug!(model = %model.kind(), reason = %e, "using numerically rolled-back bonds");
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

/// Early-exercise projection. The holder exercises only where the
/// underlying beats continuation by at least `tolerance`.
pub(crate) fn apply_exercise(option: &mut [Real], underlying: &[Real], tolerance: Real) {
    for (v, &u) in option.iter_mut().zip(underlying) {
        if u - *v >= tolerance {
            *v = u;
        }
    }
}

/// Run the swaption backward from the last slice of `grid` to the first.
pub(crate) fn induce<R: Rollback>(
    lattice: &R,
    grid: &TimeGrid,
    args: &SwaptionArguments,
    events: &SwaptionEvents,
    analytic: bool,
    tolerance: Real,
) -> Result<Induction> {
    let n = grid.steps();
    let size = lattice.size(n);
    let mut option = vec![0.0; size];
    let mut underlying = vec![0.0; size];
    let mut bond = vec![1.0; size];
    let mut pending: Vec<(usize, Vec<Real>)> = Vec::new();

    for i in (0..=n).rev() {
        if i < n {
            let step = lattice.prepare(i)?;
            option = lattice.rollback(&step, i, &option)?;
            underlying = lattice.rollback(&step, i, &underlying)?;
            bond = lattice.rollback(&step, i, &bond)?;
            for (_, values) in pending.iter_mut() {
                *values = lattice.rollback(&step, i, values)?;
            }
        }
        let size = lattice.size(i);
        for &k in &events.payments[i] {
            pending.push((k, vec![args.cash_flows[k].amount; size]));
        }
        for &k in &events.resets[i] {
            let cf = &args.cash_flows[k];
            let value = if analytic {
                let bonds = lattice.discount_bonds(i, cf.payment_time)?;
                bonds.into_iter().map(|p| cf.amount * p).collect()
            } else {
                let position = pending.iter().position(|(j, _)| *j == k).ok_or_else(|| {
                    Error::Runtime(format!("cash flow {k} reset before it was paid"))
                })?;
                pending.swap_remove(position).1
            };
            for (u, v) in underlying.iter_mut().zip(value) {
                *u += v;
            }
        }
        if events.exercise[i] {
            apply_exercise(&mut option, &underlying, tolerance);
        }
    }
    Ok(Induction { option, bond })
}
