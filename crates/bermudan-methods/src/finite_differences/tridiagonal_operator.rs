//! Tridiagonal operators and the one-dimensional convection–diffusion
//! discretization.

use super::{BoundaryCondition, Uniform1dMesher};
use bermudan_core::errors::{Error, Result};
use bermudan_core::Real;

/// Pivots smaller than this in magnitude make the system singular.
const MIN_PIVOT: Real = 1.0e-300;

/// A tridiagonal matrix operator.
///
/// Stores the lower, diagonal, and upper bands. `lower[0]` and
/// `upper[n − 1]` are unused.
#[derive(Debug, Clone, PartialEq)]
pub struct TridiagonalOperator {
    /// Lower diagonal (index 0 unused, starts from row 1).
    pub lower: Vec<Real>,
    /// Main diagonal.
    pub diag: Vec<Real>,
    /// Upper diagonal (last index unused, ends at row n−2).
    pub upper: Vec<Real>,
}

impl TridiagonalOperator {
    /// Create a zero tridiagonal operator of size `n`.
    pub fn new(n: usize) -> Self {
        Self {
            lower: vec![0.0; n],
            diag: vec![0.0; n],
            upper: vec![0.0; n],
        }
    }

    /// The identity of size `n`.
    pub fn identity(n: usize) -> Self {
        let mut op = Self::new(n);
        op.add_identity(1.0);
        op
    }

    /// Discretize `μ·∂/∂x + ½σ²·∂²/∂x² − r` on a uniform mesh.
    ///
    /// `drift` and `rate` hold one value per mesh point; `variance` is `σ²`.
    pub fn convection_diffusion(
        mesher: &Uniform1dMesher,
        drift: &[Real],
        variance: Real,
        rate: &[Real],
        boundary: BoundaryCondition,
    ) -> Self {
        let n = mesher.size();
        let dx = mesher.dx();
        let half_diffusion = 0.5 * variance / (dx * dx);
        let mut op = Self::new(n);
        for i in 1..n - 1 {
            let convection = drift[i] / (2.0 * dx);
            op.lower[i] = half_diffusion - convection;
            op.diag[i] = -2.0 * half_diffusion - rate[i];
            op.upper[i] = half_diffusion + convection;
        }
        let last = n - 1;
        match boundary {
            BoundaryCondition::ZeroSecondDerivative => {
                op.diag[0] = -drift[0] / dx - rate[0];
                op.upper[0] = drift[0] / dx;
                op.lower[last] = -drift[last] / dx;
                op.diag[last] = drift[last] / dx - rate[last];
            }
            BoundaryCondition::ZeroFirstDerivative => {
                op.diag[0] = -2.0 * half_diffusion - rate[0];
                op.upper[0] = 2.0 * half_diffusion;
                op.lower[last] = 2.0 * half_diffusion;
                op.diag[last] = -2.0 * half_diffusion - rate[last];
            }
        }
        op
    }

    /// Size (number of rows/columns).
    pub fn size(&self) -> usize {
        self.diag.len()
    }

    /// Apply the operator: `y = A · x`.
    pub fn apply(&self, x: &[Real]) -> Vec<Real> {
        let n = self.size();
        debug_assert_eq!(x.len(), n);
        if n == 1 {
            return vec![self.diag[0] * x[0]];
        }
        let mut y = vec![0.0; n];
        y[0] = self.diag[0] * x[0] + self.upper[0] * x[1];
        for i in 1..n - 1 {
            y[i] = self.lower[i] * x[i - 1] + self.diag[i] * x[i] + self.upper[i] * x[i + 1];
        }
        y[n - 1] = self.lower[n - 1] * x[n - 2] + self.diag[n - 1] * x[n - 1];
        y
    }

    /// Solve `A · x = rhs` using the Thomas algorithm (LU decomposition
    /// for tridiagonal systems).
    ///
    /// A vanishing or non-finite pivot is reported as
    /// [`Error::GridInstability`].
    pub fn solve(&self, rhs: &[Real]) -> Result<Vec<Real>> {
        let n = self.size();
        debug_assert_eq!(rhs.len(), n);

        // Forward sweep
        let mut c_prime = vec![0.0; n];
        let mut d_prime = vec![0.0; n];

        let mut pivot = self.diag[0];
        for i in 0..n {
            if i > 0 {
                pivot = self.diag[i] - self.lower[i] * c_prime[i - 1];
            }
            if !pivot.is_finite() || pivot.abs() < MIN_PIVOT {
                return Err(Error::GridInstability(format!(
                    "singular tridiagonal system: pivot {pivot:e} at row {i}"
                )));
            }
            if i < n - 1 {
                c_prime[i] = self.upper[i] / pivot;
            }
            let carried = if i > 0 { self.lower[i] * d_prime[i - 1] } else { 0.0 };
            d_prime[i] = (rhs[i] - carried) / pivot;
        }

        // Back substitution
        let mut x = vec![0.0; n];
        x[n - 1] = d_prime[n - 1];
        for i in (0..n - 1).rev() {
            x[i] = d_prime[i] - c_prime[i] * x[i + 1];
        }
        Ok(x)
    }

    /// The transposed operator.
    pub fn transpose(&self) -> Self {
        let n = self.size();
        let mut t = Self::new(n);
        t.diag.clone_from(&self.diag);
        for i in 1..n {
            t.lower[i] = self.upper[i - 1];
            t.upper[i - 1] = self.lower[i];
        }
        t
    }

    /// Scale all entries by a scalar.
    pub fn scale(&mut self, factor: Real) {
        for v in self
            .lower
            .iter_mut()
            .chain(self.diag.iter_mut())
            .chain(self.upper.iter_mut())
        {
            *v *= factor;
        }
    }

    /// Add the identity matrix scaled by `factor`: `A ← A + factor · I`.
    pub fn add_identity(&mut self, factor: Real) {
        for d in &mut self.diag {
            *d += factor;
        }
    }
}
