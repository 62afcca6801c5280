//! Recombining trinomial tree over a one-dimensional factor.
//!
//! The factor's variance must be independent of its value (additive
//! noise), as it is for the Ornstein–Uhlenbeck factors of the short-rate
//! models. Layer `i + 1` has a uniform spacing `dx = λ·√Var(step i)`; each
//! node branches to the three nodes around its conditional mean.
//!
//! [`TrinomialTree::fit_shifts`] turns the factor tree into a short-rate
//! tree: it solves, slice by slice, for the deterministic shift that makes
//! Arrow–Debreu prices reproduce the curve's discount factors.

use super::{branch, check_spacing_factor, spacing_for, valid_probabilities, TimeGrid};
use bermudan_core::errors::{Error, Result};
use bermudan_core::{DiscountFactor, Rate, Real, Time};
use bermudan_math::brent_bracketing;
use bermudan_processes::StochasticProcess1D;

/// Accuracy of the fitted shift.
const SHIFT_ACCURACY: Real = 1.0e-12;

/// Initial half-width of the bracket searched around the shift guess.
const SHIFT_STEP: Real = 0.01;

/// Branching data for a single time step of the trinomial tree.
#[derive(Debug, Clone)]
struct Branching {
    /// Middle-child offset for each node.
    k: Vec<i64>,
    /// `[down, middle, up]` probabilities for each node.
    probs: Vec<[Real; 3]>,
    /// Offset range of the next layer.
    j_min: i64,
    j_max: i64,
}

impl Branching {
    fn new() -> Self {
        Self {
            k: Vec::new(),
            probs: Vec::new(),
            j_min: i64::MAX,
            j_max: i64::MIN,
        }
    }

    fn add(&mut self, k: i64, probs: [Real; 3]) {
        self.k.push(k);
        self.probs.push(probs);
        self.j_min = self.j_min.min(k - 1);
        self.j_max = self.j_max.max(k + 1);
    }

    /// Number of nodes in the next layer.
    fn size(&self) -> usize {
        (self.j_max - self.j_min + 1) as usize
    }

    fn descendant(&self, index: usize, branch: usize) -> usize {
        (self.k[index] - self.j_min - 1 + branch as i64) as usize
    }
}

/// A recombining trinomial tree approximating a zero-mean 1-D factor.
///
/// Nodes are stored per layer as a contiguous index range; node `index` of
/// layer `i` sits at `x = (j_min(i) + index)·dx(i)`.
#[derive(Debug, Clone)]
pub struct TrinomialTree {
    /// Spacing per layer (`dx[0] = 0` for the root).
    dx: Vec<Real>,
    /// Lowest offset per layer.
    j_min: Vec<i64>,
    branchings: Vec<Branching>,
    time_grid: TimeGrid,
}

impl TrinomialTree {
    /// Build a tree for `process` on `grid` with spacing factor `λ`.
    ///
    /// Fails with [`Error::LatticeConstruction`] naming the first slice
    /// whose variance is degenerate or whose branching has a negative or
    /// non-finite probability.
    pub fn new(process: &dyn StochasticProcess1D, grid: &TimeGrid, spacing: Real) -> Result<Self> {
        check_spacing_factor(spacing)?;
        let n = grid.steps();
        let mut dx = vec![0.0];
        let mut j_min = vec![0i64];
        let mut branchings: Vec<Branching> = Vec::with_capacity(n);
        let (mut lo, mut hi) = (0i64, 0i64);

        for i in 0..n {
            let (t, dt) = (grid.time(i), grid.dt(i));
            let variance = process.variance(t, 0.0, dt);
            let dx_next =
                spacing_for(variance, spacing).map_err(|reason| Error::LatticeConstruction {
                    step: i,
                    time: t,
                    reason,
                })?;

            let mut branching = Branching::new();
            for j in lo..=hi {
                let x = j as Real * dx[i];
                let (k, probs) = branch(process.expectation(t, x, dt), variance, dx_next);
                if !valid_probabilities(&probs) {
                    return Err(Error::LatticeConstruction {
                        step: i,
                        time: t,
                        reason: format!(
                            "invalid transition probabilities {probs:?} at x = {x:.6} \
                             with spacing factor {spacing}"
                        ),
                    });
                }
                branching.add(k, probs);
            }
            lo = branching.j_min;
            hi = branching.j_max;
            dx.push(dx_next);
            j_min.push(lo);
            branchings.push(branching);
        }

        tracing::debug!(
            steps = n,
            spacing,
            widest = branchings.iter().map(Branching::size).max().unwrap_or(1),
            "trinomial tree built"
        );
        Ok(Self {
            dx,
            j_min,
            branchings,
            time_grid: grid.clone(),
        })
    }

    /// The time grid the tree was built on.
    pub fn time_grid(&self) -> &TimeGrid {
        &self.time_grid
    }

    /// Number of time steps.
    pub fn steps(&self) -> usize {
        self.time_grid.steps()
    }

    /// Number of nodes at time step `i`.
    pub fn size(&self, i: usize) -> usize {
        if i == 0 {
            1
        } else {
            self.branchings[i - 1].size()
        }
    }

    /// Factor value at node `(i, index)`.
    pub fn underlying(&self, i: usize, index: usize) -> Real {
        (self.j_min[i] + index as i64) as Real * self.dx[i]
    }

    /// Factor values of layer `i`.
    pub fn layer(&self, i: usize) -> Vec<Real> {
        (0..self.size(i)).map(|index| self.underlying(i, index)).collect()
    }

    /// Descendant index at step `i` for node `index` and `branch` (0..3).
    pub fn descendant(&self, i: usize, index: usize, branch: usize) -> usize {
        self.branchings[i].descendant(index, branch)
    }

    /// Transition probability at step `i`, node `index`, branch `branch`.
    pub fn probability(&self, i: usize, index: usize, branch: usize) -> Real {
        self.branchings[i].probs[index][branch]
    }

    /// Discounted expectation of layer `i + 1` values seen from layer `i`.
    ///
    /// `discounts[index]` is the one-step discount factor at node
    /// `(i, index)`.
    pub fn rollback(&self, i: usize, next: &[Real], discounts: &[DiscountFactor]) -> Vec<Real> {
        let branching = &self.branchings[i];
        (0..self.size(i))
            .map(|index| {
                let expected: Real = (0..3)
                    .map(|b| branching.probs[index][b] * next[branching.descendant(index, b)])
                    .sum();
                discounts[index] * expected
            })
            .collect()
    }

    /// Fit the per-step shift `α_i` of the short rate `rate(x, α_i)` so the
    /// tree reprices the curve's discount factors at every grid time.
    ///
    /// `guess(t)` seeds the root search. Returns one shift per step.
    pub fn fit_shifts<D, R, G>(&self, discount: D, rate: R, guess: G) -> Result<Vec<Real>>
    where
        D: Fn(Time) -> Result<DiscountFactor>,
        R: Fn(Real, Real) -> Rate,
        G: Fn(Time) -> Result<Real>,
    {
        let n = self.steps();
        let mut shifts = Vec::with_capacity(n);
        let mut arrow_debreu = vec![1.0];

        for i in 0..n {
            let (t, dt) = (self.time_grid.time(i), self.time_grid.dt(i));
            let target = discount(self.time_grid.time(i + 1))?;
            let xs = self.layer(i);
            let objective = |alpha: Real| -> Real {
                xs.iter()
                    .zip(&arrow_debreu)
                    .map(|(&x, &q)| q * (-rate(x, alpha) * dt).exp())
                    .sum::<Real>()
                    - target
            };
            let alpha = brent_bracketing(objective, guess(t)?, SHIFT_STEP, SHIFT_ACCURACY)
                .map_err(|e| Error::LatticeConstruction {
                    step: i,
                    time: t,
                    reason: format!("cannot fit the curve shift: {e}"),
                })?;

            let branching = &self.branchings[i];
            let mut next = vec![0.0; self.size(i + 1)];
            for (index, (&x, &q)) in xs.iter().zip(&arrow_debreu).enumerate() {
                let df = (-rate(x, alpha) * dt).exp();
                for b in 0..3 {
                    next[branching.descendant(index, b)] += q * branching.probs[index][b] * df;
                }
            }
            arrow_debreu = next;
            shifts.push(alpha);
        }
        tracing::debug!(
            steps = n,
            first = ?shifts.first(),
            last = ?shifts.last(),
            "lattice shifts fitted"
        );
        Ok(shifts)
    }
}
