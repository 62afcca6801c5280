//! Two-dimensional grids and Douglas ADI time stepping.
//!
//! With `L = L₁ + L₂` split by direction, one backward step is
//!
//! ```text
//! Y₀ = V + Δt·(L₁ + L₂)·V
//! (I − θΔt·L₁)·Y₁ = Y₀ − θΔt·L₁·V
//! (I − θΔt·L₂)·Y₂ = Y₁ − θΔt·L₂·V
//! ```
//!
//! and `Y₂` is the new value. Each implicit sweep is a set of independent
//! tridiagonal solves along grid lines.

use super::theta_scheme::implicit_matrix;
use super::{FdmScheme, TridiagonalOperator, Uniform1dMesher};
use bermudan_core::errors::{Error, Result};
use bermudan_core::{Real, Time};

// ─── Grid2d ───────────────────────────────────────────────────────────────────

/// Tensor product of two uniform meshes.
///
/// Values are stored row-major: the point `(i, j)` lives at `i·ny + j`,
/// so lines of constant first coordinate are contiguous.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid2d {
    first: Uniform1dMesher,
    second: Uniform1dMesher,
}

impl Grid2d {
    /// Grid over `first × second`.
    pub fn new(first: Uniform1dMesher, second: Uniform1dMesher) -> Self {
        Self { first, second }
    }

    /// Mesh along the first coordinate.
    pub fn first(&self) -> &Uniform1dMesher {
        &self.first
    }

    /// Mesh along the second coordinate.
    pub fn second(&self) -> &Uniform1dMesher {
        &self.second
    }

    /// Points along the first coordinate.
    pub fn nx(&self) -> usize {
        self.first.size()
    }

    /// Points along the second coordinate.
    pub fn ny(&self) -> usize {
        self.second.size()
    }

    /// Total number of grid points.
    pub fn size(&self) -> usize {
        self.nx() * self.ny()
    }

    /// Flat index of `(i, j)`.
    pub fn index(&self, i: usize, j: usize) -> usize {
        i * self.ny() + j
    }

    /// Coordinates of the point at flat index `k`.
    pub fn point(&self, k: usize) -> (Real, Real) {
        let (i, j) = (k / self.ny(), k % self.ny());
        (self.first.location(i), self.second.location(j))
    }

    /// Flat index of the centre point.
    pub fn center(&self) -> usize {
        self.index(self.first.center_index(), self.second.center_index())
    }

    /// Apply `f` to every line of constant second index, `ops[j]` on line `j`.
    fn along_first<F>(&self, ops: &[TridiagonalOperator], values: &[Real], f: F) -> Result<Vec<Real>>
    where
        F: Fn(&TridiagonalOperator, &[Real]) -> Result<Vec<Real>>,
    {
        let mut out = vec![0.0; self.size()];
        for (j, op) in ops.iter().enumerate() {
            let line: Vec<Real> = (0..self.nx()).map(|i| values[self.index(i, j)]).collect();
            for (i, v) in f(op, &line)?.into_iter().enumerate() {
                out[self.index(i, j)] = v;
            }
        }
        Ok(out)
    }

    /// Apply `f` to every line of constant first index, `ops[i]` on line `i`.
    fn along_second<F>(&self, ops: &[TridiagonalOperator], values: &[Real], f: F) -> Result<Vec<Real>>
    where
        F: Fn(&TridiagonalOperator, &[Real]) -> Result<Vec<Real>>,
    {
        let ny = self.ny();
        let mut out = vec![0.0; self.size()];
        for (i, op) in ops.iter().enumerate() {
            let line = i * ny..(i + 1) * ny;
            out[line.clone()].copy_from_slice(&f(op, &values[line])?);
        }
        Ok(out)
    }
}

fn apply(op: &TridiagonalOperator, line: &[Real]) -> Result<Vec<Real>> {
    Ok(op.apply(line))
}

// ─── DouglasScheme ────────────────────────────────────────────────────────────

/// Douglas alternating-direction-implicit stepper.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DouglasScheme {
    theta: Real,
}

impl DouglasScheme {
    /// A stepper with the given implicitness weight.
    pub fn new(theta: Real) -> Self {
        Self { theta }
    }

    /// The stepper for a named scheme.
    pub fn for_scheme(scheme: FdmScheme) -> Self {
        Self::new(scheme.theta())
    }

    /// The implicitness weight.
    pub fn theta(&self) -> Real {
        self.theta
    }

    /// Step values backward in time by `dt`.
    ///
    /// `first_ops[j]` acts along the first coordinate on the line with second
    /// index `j`; `second_ops[i]` acts along the second coordinate on the
    /// line with first index `i`.
    pub fn step(
        &self,
        grid: &Grid2d,
        first_ops: &[TridiagonalOperator],
        second_ops: &[TridiagonalOperator],
        values: &[Real],
        dt: Time,
    ) -> Result<Vec<Real>> {
        check_split(grid, first_ops, second_ops, values)?;
        let l1v = grid.along_first(first_ops, values, apply)?;
        let l2v = grid.along_second(second_ops, values, apply)?;
        let y0: Vec<Real> = (0..grid.size())
            .map(|k| values[k] + dt * (l1v[k] + l2v[k]))
            .collect();
        if self.theta == 0.0 {
            return Ok(y0);
        }
        let weight = self.theta * dt;
        let solve = |op: &TridiagonalOperator, rhs: &[Real]| implicit_matrix(op, weight).solve(rhs);

        let rhs: Vec<Real> = (0..grid.size()).map(|k| y0[k] - weight * l1v[k]).collect();
        let y1 = grid.along_first(first_ops, &rhs, solve)?;
        let rhs: Vec<Real> = (0..grid.size()).map(|k| y1[k] - weight * l2v[k]).collect();
        grid.along_second(second_ops, &rhs, solve)
    }

    /// Step a density forward in time by `dt` with the adjoint of
    /// [`step`](Self::step).
    ///
    /// Writing one step as `S = M₂⁻¹·(M₁⁻¹·(I + (Δt − w)·L₁ + Δt·L₂) − w·L₂)`
    /// with `w = θΔt` and `Mₖ = I − w·Lₖ`, this applies `Sᵀ`, so that
    /// `⟨Sᵀq, V⟩ = ⟨q, S·V⟩` for any values `V`.
    pub fn step_adjoint(
        &self,
        grid: &Grid2d,
        first_ops: &[TridiagonalOperator],
        second_ops: &[TridiagonalOperator],
        density: &[Real],
        dt: Time,
    ) -> Result<Vec<Real>> {
        check_split(grid, first_ops, second_ops, density)?;
        let first_t: Vec<TridiagonalOperator> =
            first_ops.iter().map(TridiagonalOperator::transpose).collect();
        let second_t: Vec<TridiagonalOperator> =
            second_ops.iter().map(TridiagonalOperator::transpose).collect();
        let weight = self.theta * dt;

        let (z, u) = if self.theta == 0.0 {
            (density.to_vec(), density.to_vec())
        } else {
            let solve = |op: &TridiagonalOperator, rhs: &[Real]| implicit_matrix(op, weight).solve(rhs);
            let z = grid.along_second(&second_t, density, solve)?;
            let u = grid.along_first(&first_t, &z, solve)?;
            (z, u)
        };
        let l1u = grid.along_first(&first_t, &u, apply)?;
        let l2u = grid.along_second(&second_t, &u, apply)?;
        let l2z = grid.along_second(&second_t, &z, apply)?;
        Ok((0..grid.size())
            .map(|k| u[k] + (dt - weight) * l1u[k] + dt * l2u[k] - weight * l2z[k])
            .collect())
    }
}

fn check_split(
    grid: &Grid2d,
    first_ops: &[TridiagonalOperator],
    second_ops: &[TridiagonalOperator],
    values: &[Real],
) -> Result<()> {
    let (nx, ny) = (grid.nx(), grid.ny());
    if first_ops.len() != ny || second_ops.len() != nx || values.len() != grid.size() {
        return Err(Error::InvalidArgument(format!(
            "operator split does not match a {nx}×{ny} grid"
        )));
    }
    Ok(())
}
