//! Lattice methods for short-rate pricing.
//!
//! # Overview
//!
//! * [`TimeGrid`] — time points hitting every exercise and cash-flow time
//! * [`TrinomialTree`] — recombining 1-D trinomial tree over a zero-mean
//!   Ornstein–Uhlenbeck factor, with Arrow–Debreu curve fitting
//! * [`TwoFactorTree`] — product lattice over the decorrelated G2++ factors
//!
//! Branch probabilities match the exact conditional mean and variance of
//! the factor over each step. With node spacing `dx = λ·√Var` they are
//! nonnegative for every node as long as `λ ∈ [√(4/3), 2]`; outside that
//! band construction fails with `LatticeConstruction` instead of refining.

pub mod trinomial_tree;
pub mod two_factor_tree;

pub use trinomial_tree::TrinomialTree;
pub use two_factor_tree::TwoFactorTree;

use bermudan_core::errors::{Error, Result};
use bermudan_core::{Real, Time};

/// Default node spacing factor, `λ = √3`.
pub const DEFAULT_SPACING: Real = 1.732_050_807_568_877_2;

/// Times closer than this are the same grid point.
const TIME_TOLERANCE: Time = 1.0e-10;

// ─── TimeGrid ─────────────────────────────────────────────────────────────────

/// A grid of time points used by lattice and grid methods.
///
/// Built from mandatory times (exercise dates, coupon resets) and a target
/// number of steps: each interval between consecutive mandatory times is
/// split into `max(1, round(interval / dt_max))` equal steps, with
/// `dt_max = end / steps`.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeGrid {
    times: Vec<Time>,
    dts: Vec<Time>,
}

impl TimeGrid {
    /// Create a uniform time grid from 0 to `end` with `steps` intervals.
    pub fn uniform(end: Time, steps: usize) -> Result<Self> {
        Self::with_mandatory_times(&[end], steps)
    }

    /// Create a grid from 0 through every mandatory time.
    pub fn with_mandatory_times(mandatory: &[Time], steps: usize) -> Result<Self> {
        if steps == 0 {
            return Err(Error::InvalidArgument("time grid needs at least one step".into()));
        }
        if let Some(bad) = mandatory.iter().find(|t| !t.is_finite() || **t < 0.0) {
            return Err(Error::InvalidArgument(format!(
                "time grid points must be finite and non-negative, got {bad}"
            )));
        }
        let mut points: Vec<Time> = Vec::with_capacity(mandatory.len() + 1);
        points.push(0.0);
        points.extend_from_slice(mandatory);
        points.sort_by(|a, b| a.total_cmp(b));
        points.dedup_by(|a, b| (*a - *b).abs() < TIME_TOLERANCE);

        let end = points[points.len() - 1];
        if end <= 0.0 {
            return Err(Error::InvalidArgument(
                "time grid needs a mandatory time after 0".into(),
            ));
        }
        let dt_max = end / steps as Real;

        let mut times = vec![0.0];
        for pair in points.windows(2) {
            let (begin, finish) = (pair[0], pair[1]);
            let n = (((finish - begin) / dt_max).round() as usize).max(1);
            let dt = (finish - begin) / n as Real;
            for k in 1..n {
                times.push(begin + k as Real * dt);
            }
            times.push(finish);
        }
        let dts = times.windows(2).map(|w| w[1] - w[0]).collect();
        Ok(Self { times, dts })
    }

    /// Number of time points (= steps + 1).
    pub fn size(&self) -> usize {
        self.times.len()
    }

    /// Number of steps (= time points − 1).
    pub fn steps(&self) -> usize {
        self.dts.len()
    }

    /// Time at index `i`.
    pub fn time(&self, i: usize) -> Time {
        self.times[i]
    }

    /// Time step between index `i` and `i+1`.
    pub fn dt(&self, i: usize) -> Time {
        self.dts[i]
    }

    /// Final time.
    pub fn end(&self) -> Time {
        self.times[self.times.len() - 1]
    }

    /// All time points.
    pub fn times(&self) -> &[Time] {
        &self.times
    }

    /// Index of the grid point at `t`, if `t` is on the grid.
    pub fn index(&self, t: Time) -> Option<usize> {
        let i = self.closest_index(t);
        ((self.times[i] - t).abs() < TIME_TOLERANCE).then_some(i)
    }

    /// Index of the grid point closest to `t`.
    pub fn closest_index(&self, t: Time) -> usize {
        match self.times.binary_search_by(|x| x.total_cmp(&t)) {
            Ok(i) => i,
            Err(0) => 0,
            Err(i) if i >= self.times.len() => self.times.len() - 1,
            Err(i) => {
                if t - self.times[i - 1] <= self.times[i] - t {
                    i - 1
                } else {
                    i
                }
            }
        }
    }
}

// ─── Shared branching ─────────────────────────────────────────────────────────

/// Trinomial branching for one node: target index `k` of the middle child
/// and the probabilities `[down, middle, up]`.
///
/// The children sit at `(k−1, k, k+1)·dx`. The probabilities match the
/// conditional mean `expectation` and variance `variance`.
pub(crate) fn branch(expectation: Real, variance: Real, dx: Real) -> (i64, [Real; 3]) {
    let k = (expectation / dx).round();
    let u = (expectation - k * dx) / dx;
    let v = variance / (dx * dx);
    let p_up = 0.5 * (v + u * u + u);
    let p_down = 0.5 * (v + u * u - u);
    let p_mid = 1.0 - v - u * u;
    (k as i64, [p_down, p_mid, p_up])
}

/// `true` when every probability is finite and nonnegative.
pub(crate) fn valid_probabilities(p: &[Real; 3]) -> bool {
    p.iter().all(|q| q.is_finite() && *q >= 0.0)
}

/// Node spacing for a step with the given variance, or the reason it
/// cannot be used.
pub(crate) fn spacing_for(variance: Real, factor: Real) -> std::result::Result<Real, String> {
    if !(variance.is_finite() && variance > 0.0) {
        return Err(format!("degenerate one-step variance {variance:e}"));
    }
    Ok(factor * variance.sqrt())
}

/// Check a node spacing factor.
pub(crate) fn check_spacing_factor(factor: Real) -> Result<()> {
    if !(factor.is_finite() && factor > 0.0) {
        return Err(Error::InvalidArgument(format!(
            "lattice spacing factor must be positive, got {factor}"
        )));
    }
    Ok(())
}

// ─── Tests ────────────────────────────────────────────────────────────────────
