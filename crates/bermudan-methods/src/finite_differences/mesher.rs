//! Uniform spatial meshes.

use bermudan_core::errors::{Error, Result};
use bermudan_core::Real;

/// Equally spaced mesh points on `[lower, upper]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Uniform1dMesher {
    locations: Vec<Real>,
    dx: Real,
}

impl Uniform1dMesher {
    /// A mesh with `size ≥ 3` points from `lower` to `upper`.
    pub fn new(lower: Real, upper: Real, size: usize) -> Result<Self> {
        if size < 3 {
            return Err(Error::InvalidArgument(format!(
                "mesher needs at least 3 points, got {size}"
            )));
        }
        if !(lower.is_finite() && upper.is_finite() && upper > lower) {
            return Err(Error::InvalidArgument(format!(
                "invalid mesher bounds [{lower}, {upper}]"
            )));
        }
        let dx = (upper - lower) / (size - 1) as Real;
        let locations = (0..size).map(|i| lower + i as Real * dx).collect();
        Ok(Self { locations, dx })
    }

    /// A mesh on `[−half_width, half_width]` with the origin as a mesh
    /// point. Even sizes are rounded up to the next odd number.
    pub fn symmetric(half_width: Real, size: usize) -> Result<Self> {
        let mut mesher = Self::new(-half_width, half_width, size | 1)?;
        let center = mesher.center_index();
        mesher.locations[center] = 0.0;
        Ok(mesher)
    }

    /// Number of mesh points.
    pub fn size(&self) -> usize {
        self.locations.len()
    }

    /// Mesh spacing.
    pub fn dx(&self) -> Real {
        self.dx
    }

    /// All mesh points, ascending.
    pub fn locations(&self) -> &[Real] {
        &self.locations
    }

    /// Mesh point `i`.
    pub fn location(&self, i: usize) -> Real {
        self.locations[i]
    }

    /// Index of the middle point.
    pub fn center_index(&self) -> usize {
        self.size() / 2
    }

    /// Linear interpolation of mesh values at `x`, clamped to the mesh.
    pub fn interpolate(&self, values: &[Real], x: Real) -> Real {
        let n = self.size();
        let position = ((x - self.locations[0]) / self.dx).clamp(0.0, (n - 1) as Real);
        let i = (position.floor() as usize).min(n - 2);
        let w = position - i as Real;
        (1.0 - w) * values[i] + w * values[i + 1]
    }
}
