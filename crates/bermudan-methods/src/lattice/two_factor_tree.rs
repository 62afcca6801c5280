//! Two-dimensional trinomial lattice for the G2++ factors.
//!
//! The lattice lives in the decorrelated coordinates `(x, w)` of
//! [`G2Process`]. Their driving noises are independent, so each node's nine
//! transition probabilities are the product of an `x` branching (which
//! depends on `x` only) and a `w` branching (which depends on both
//! coordinates through the drift of `w`). Both marginals are moment-matched
//! exactly, so every product probability is nonnegative whenever the
//! marginals are.
//!
//! Each slice is an arena: node `(ix, iw)` of layer `i` is stored at
//! `ix · nw(i) + iw`, and descendants are plain indices into the next
//! slice.

use super::{branch, check_spacing_factor, spacing_for, valid_probabilities, TimeGrid};
use bermudan_core::errors::{Error, Result};
use bermudan_core::{DiscountFactor, Rate, Real, Time};
use bermudan_processes::{G2Process, StochasticProcess1D};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Offsets and spacing of one coordinate in one layer.
#[derive(Debug, Clone, Copy)]
struct Axis {
    j_min: i64,
    size: usize,
    dx: Real,
}

impl Axis {
    fn value(&self, index: usize) -> Real {
        (self.j_min + index as i64) as Real * self.dx
    }
}

/// Branching from layer `i` to layer `i + 1`.
#[derive(Debug, Clone)]
struct Step {
    /// Middle-child `x` offset and probabilities, per `ix`.
    kx: Vec<i64>,
    px: Vec<[Real; 3]>,
    /// Middle-child `w` offset and probabilities, per node.
    kw: Vec<i64>,
    pw: Vec<[Real; 3]>,
}

/// A recombining product lattice over the two G2++ factors.
#[derive(Debug, Clone)]
pub struct TwoFactorTree {
    x_axes: Vec<Axis>,
    w_axes: Vec<Axis>,
    steps: Vec<Step>,
    time_grid: TimeGrid,
}

impl TwoFactorTree {
    /// Build the lattice for `process` on `grid` with spacing factor `λ`
    /// in both coordinates.
    ///
    /// Fails with [`Error::LatticeConstruction`] at the first slice with a
    /// degenerate variance or an invalid marginal probability.
    pub fn new(process: &G2Process, grid: &TimeGrid, spacing: Real) -> Result<Self> {
        check_spacing_factor(spacing)?;
        let x_process = process.x_process();
        let n = grid.steps();
        let root = Axis {
            j_min: 0,
            size: 1,
            dx: 0.0,
        };
        let mut x_axes = vec![root];
        let mut w_axes = vec![root];
        let mut steps = Vec::with_capacity(n);

        for i in 0..n {
            let (t, dt) = (grid.time(i), grid.dt(i));
            let lattice_error = |reason: String| Error::LatticeConstruction {
                step: i,
                time: t,
                reason,
            };
            let vx = x_process.variance(t, 0.0, dt);
            let vw = process.w_variance(dt);
            let dx = spacing_for(vx, spacing).map_err(|r| lattice_error(format!("x: {r}")))?;
            let dw = spacing_for(vw, spacing).map_err(|r| lattice_error(format!("w: {r}")))?;
            let (ax, aw) = (x_axes[i], w_axes[i]);

            let mut step = Step {
                kx: Vec::with_capacity(ax.size),
                px: Vec::with_capacity(ax.size),
                kw: Vec::with_capacity(ax.size * aw.size),
                pw: Vec::with_capacity(ax.size * aw.size),
            };
            let (mut x_lo, mut x_hi) = (i64::MAX, i64::MIN);
            let (mut w_lo, mut w_hi) = (i64::MAX, i64::MIN);
            for ix in 0..ax.size {
                let x = ax.value(ix);
                let (k, p) = branch(x_process.expectation(t, x, dt), vx, dx);
                if !valid_probabilities(&p) {
                    return Err(lattice_error(format!(
                        "invalid x transition probabilities {p:?} at x = {x:.6} \
                         with spacing factor {spacing}"
                    )));
                }
                x_lo = x_lo.min(k - 1);
                x_hi = x_hi.max(k + 1);
                step.kx.push(k);
                step.px.push(p);

                for iw in 0..aw.size {
                    let w = aw.value(iw);
                    let (k, p) = branch(process.w_expectation(x, w, dt), vw, dw);
                    if !valid_probabilities(&p) {
                        return Err(lattice_error(format!(
                            "invalid w transition probabilities {p:?} at (x, w) = \
                             ({x:.6}, {w:.6}) with spacing factor {spacing}"
                        )));
                    }
                    w_lo = w_lo.min(k - 1);
                    w_hi = w_hi.max(k + 1);
                    step.kw.push(k);
                    step.pw.push(p);
                }
            }
            x_axes.push(Axis {
                j_min: x_lo,
                size: (x_hi - x_lo + 1) as usize,
                dx,
            });
            w_axes.push(Axis {
                j_min: w_lo,
                size: (w_hi - w_lo + 1) as usize,
                dx: dw,
            });
            steps.push(step);
        }

        tracing::debug!(
            steps = n,
            spacing,
            nodes = x_axes[n].size * w_axes[n].size,
            "two-factor lattice built"
        );
        Ok(Self {
            x_axes,
            w_axes,
            steps,
            time_grid: grid.clone(),
        })
    }

    /// The time grid the lattice was built on.
    pub fn time_grid(&self) -> &TimeGrid {
        &self.time_grid
    }

    /// Number of time steps.
    pub fn steps(&self) -> usize {
        self.time_grid.steps()
    }

    /// `(nx, nw)` of layer `i`.
    pub fn shape(&self, i: usize) -> (usize, usize) {
        (self.x_axes[i].size, self.w_axes[i].size)
    }

    /// Number of nodes in layer `i`.
    pub fn size(&self, i: usize) -> usize {
        self.x_axes[i].size * self.w_axes[i].size
    }

    /// `(x, w)` at `node` of layer `i`.
    pub fn state(&self, i: usize, node: usize) -> (Real, Real) {
        let nw = self.w_axes[i].size;
        (self.x_axes[i].value(node / nw), self.w_axes[i].value(node % nw))
    }

    /// All states of layer `i`, in arena order.
    pub fn states(&self, i: usize) -> Vec<(Real, Real)> {
        (0..self.size(i)).map(|node| self.state(i, node)).collect()
    }

    /// Descendant of `node` (layer `i`) along branches `(bx, bw)`.
    pub fn descendant(&self, i: usize, node: usize, bx: usize, bw: usize) -> usize {
        let nw = self.w_axes[i].size;
        let step = &self.steps[i];
        let (next_x, next_w) = (self.x_axes[i + 1], self.w_axes[i + 1]);
        let jx = (step.kx[node / nw] - next_x.j_min - 1 + bx as i64) as usize;
        let jw = (step.kw[node] - next_w.j_min - 1 + bw as i64) as usize;
        jx * next_w.size + jw
    }

    /// Joint transition probability of `node` (layer `i`) along `(bx, bw)`.
    pub fn probability(&self, i: usize, node: usize, bx: usize, bw: usize) -> Real {
        let nw = self.w_axes[i].size;
        let step = &self.steps[i];
        step.px[node / nw][bx] * step.pw[node][bw]
    }

    fn expected(&self, i: usize, node: usize, next: &[Real]) -> Real {
        let mut acc = 0.0;
        for bx in 0..3 {
            for bw in 0..3 {
                acc += self.probability(i, node, bx, bw) * next[self.descendant(i, node, bx, bw)];
            }
        }
        acc
    }

    /// Discounted expectation of layer `i + 1` values seen from layer `i`.
    pub fn rollback(&self, i: usize, next: &[Real], discounts: &[DiscountFactor]) -> Vec<Real> {
        let node_value = |node: usize| discounts[node] * self.expected(i, node, next);
        #[cfg(feature = "parallel")]
        {
            (0..self.size(i)).into_par_iter().map(node_value).collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            (0..self.size(i)).map(node_value).collect()
        }
    }

    /// Fit the per-step shift `α_i` of a short rate `base(x, w) + α_i` so
    /// the lattice reprices the curve's discount factors at every grid time.
    ///
    /// The rate is affine in the shift, so each step is solved in closed
    /// form from the Arrow–Debreu prices.
    pub fn fit_shifts<D, B>(&self, discount: D, base: B) -> Result<Vec<Real>>
    where
        D: Fn(Time) -> Result<DiscountFactor>,
        B: Fn(Real, Real) -> Rate,
    {
        let n = self.steps();
        let mut shifts = Vec::with_capacity(n);
        let mut arrow_debreu = vec![1.0];

        for i in 0..n {
            let (t, dt) = (self.time_grid.time(i), self.time_grid.dt(i));
            let target = discount(self.time_grid.time(i + 1))?;
            let unshifted: Vec<Real> = self
                .states(i)
                .into_iter()
                .map(|(x, w)| (-base(x, w) * dt).exp())
                .collect();
            let total: Real = unshifted.iter().zip(&arrow_debreu).map(|(d, q)| d * q).sum();
            let alpha = (total / target).ln() / dt;
            if !alpha.is_finite() {
                return Err(Error::LatticeConstruction {
                    step: i,
                    time: t,
                    reason: format!("cannot fit the curve shift (state price {total:e})"),
                });
            }

            let scale = (-alpha * dt).exp();
            let mut next = vec![0.0; self.size(i + 1)];
            for (node, (&d, &q)) in unshifted.iter().zip(&arrow_debreu).enumerate() {
                let weight = q * d * scale;
                for bx in 0..3 {
                    for bw in 0..3 {
                        next[self.descendant(i, node, bx, bw)] +=
                            weight * self.probability(i, node, bx, bw);
                    }
                }
            }
            arrow_debreu = next;
            shifts.push(alpha);
        }
        Ok(shifts)
    }
}
