//! θ-scheme time stepping for one-dimensional operators.
//!
//! One backward step from `t_{n+1}` to `t_n`:
//!
//! ```text
//! (I − θ·Δt·L)·V^n = (I + (1 − θ)·Δt·L)·V^{n+1}
//! ```
//!
//! θ = 0 is explicit, θ = 1 fully implicit, θ = ½ Crank–Nicolson.

use super::{FdmScheme, TridiagonalOperator};
use bermudan_core::errors::Result;
use bermudan_core::{Real, Time};

/// A θ-weighted time stepper.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThetaScheme {
    theta: Real,
}

impl ThetaScheme {
    /// A stepper with the given implicitness weight.
    pub fn new(theta: Real) -> Self {
        Self { theta }
    }

    /// The stepper for a named scheme.
    pub fn for_scheme(scheme: FdmScheme) -> Self {
        Self::new(scheme.theta())
    }

    /// Fully implicit stepper, used for damping steps.
    pub fn implicit() -> Self {
        Self::new(1.0)
    }

    /// The implicitness weight.
    pub fn theta(&self) -> Real {
        self.theta
    }

    /// Step values backward in time by `dt`.
    pub fn step(&self, op: &TridiagonalOperator, values: &[Real], dt: Time) -> Result<Vec<Real>> {
        let explicit_weight = (1.0 - self.theta) * dt;
        let rhs: Vec<Real> = if explicit_weight == 0.0 {
            values.to_vec()
        } else {
            let lv = op.apply(values);
            values.iter().zip(&lv).map(|(v, l)| v + explicit_weight * l).collect()
        };
        if self.theta == 0.0 {
            return Ok(rhs);
        }
        implicit_matrix(op, self.theta * dt).solve(&rhs)
    }

    /// Step a density forward in time by `dt` with the adjoint of
    /// [`step`](Self::step): `q^{n+1} = Bᵀ·A^{−T}·q^n`.
    ///
    /// For any values `V`, `⟨q^{n+1}, V^{n+1}⟩ = ⟨q^n, V^n⟩`.
    pub fn step_adjoint(
        &self,
        op: &TridiagonalOperator,
        density: &[Real],
        dt: Time,
    ) -> Result<Vec<Real>> {
        let transposed = op.transpose();
        let y = if self.theta == 0.0 {
            density.to_vec()
        } else {
            implicit_matrix(&transposed, self.theta * dt).solve(density)?
        };
        let explicit_weight = (1.0 - self.theta) * dt;
        if explicit_weight == 0.0 {
            return Ok(y);
        }
        let ly = transposed.apply(&y);
        Ok(y.iter().zip(&ly).map(|(v, l)| v + explicit_weight * l).collect())
    }
}

/// `I − weight·L`
pub(crate) fn implicit_matrix(op: &TridiagonalOperator, weight: Real) -> TridiagonalOperator {
    let mut lhs = op.clone();
    lhs.scale(-weight);
    lhs.add_identity(1.0);
    lhs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finite_differences::{BoundaryCondition, Uniform1dMesher};
    use approx::assert_abs_diff_eq;

    fn ou_operator(rate: Real) -> (Uniform1dMesher, TridiagonalOperator) {
        let mesher = Uniform1dMesher::symmetric(0.1, 81).unwrap();
        let drift: Vec<Real> = mesher.locations().iter().map(|x| -0.1 * x).collect();
        let rates: Vec<Real> = mesher.locations().iter().map(|x| rate + x).collect();
        let op = TridiagonalOperator::convection_diffusion(
            &mesher,
            &drift,
            1e-4,
            &rates,
            BoundaryCondition::ZeroSecondDerivative,
        );
        (mesher, op)
    }

    #[test]
    fn constant_discounting_matches_exponential() {
        let mesher = Uniform1dMesher::symmetric(1.0, 21).unwrap();
        let n = mesher.size();
        let op = TridiagonalOperator::convection_diffusion(
            &mesher,
            &vec![0.0; n],
            0.0,
            &vec![0.05; n],
            BoundaryCondition::ZeroFirstDerivative,
        );
        for scheme in [FdmScheme::Implicit, FdmScheme::CrankNicolson, FdmScheme::Explicit] {
            let stepper = ThetaScheme::for_scheme(scheme);
            let mut v = vec![1.0; n];
            for _ in 0..200 {
                v = stepper.step(&op, &v, 0.01).unwrap();
            }
            assert_abs_diff_eq!(v[10], (-0.1_f64).exp(), epsilon = 1e-4);
        }
    }

    #[test]
    fn adjoint_step_preserves_the_pairing() {
        let (mesher, op) = ou_operator(0.03);
        let n = mesher.size();
        let stepper = ThetaScheme::for_scheme(FdmScheme::CrankNicolson);
        let values: Vec<Real> = mesher.locations().iter().map(|x| (1.0 + 3.0 * x).max(0.0)).collect();
        let mut density = vec![0.0; n];
        density[mesher.center_index()] = 1.0;
        let earlier = stepper.step(&op, &values, 0.25).unwrap();
        let later = stepper.step_adjoint(&op, &density, 0.25).unwrap();
        let lhs: Real = density.iter().zip(&earlier).map(|(q, v)| q * v).sum();
        let rhs: Real = later.iter().zip(&values).map(|(q, v)| q * v).sum();
        assert_abs_diff_eq!(lhs, rhs, epsilon = 1e-12);
    }

    #[test]
    fn implicit_stepper_reports_theta() {
        assert_eq!(ThetaScheme::implicit().theta(), 1.0);
        assert_eq!(ThetaScheme::for_scheme(FdmScheme::default()).theta(), 0.5);
    }
}
