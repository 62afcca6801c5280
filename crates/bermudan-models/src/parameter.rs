//! Validated model coefficients.
//!
//! A [`Parameter`] is a named scalar checked against a [`Constraint`] once,
//! when the model is built. Models are immutable afterwards, so a parameter
//! that exists is known to be valid.

use bermudan_core::errors::{Error, Result};
use bermudan_core::Real;
use std::fmt;

// ────────────────────────────────────────────────────────────────────────────
// Constraints
// ────────────────────────────────────────────────────────────────────────────

/// A constraint on a parameter value.
pub trait Constraint: fmt::Debug {
    /// Whether `value` satisfies this constraint.
    fn test(&self, value: Real) -> bool;

    /// Human-readable statement of the constraint, for error messages.
    fn describe(&self) -> String;
}

/// Strictly positive values.
#[derive(Debug, Clone, Copy)]
pub struct PositiveConstraint;

impl Constraint for PositiveConstraint {
    fn test(&self, value: Real) -> bool {
        value > 0.0
    }

    fn describe(&self) -> String {
        "must be positive".into()
    }
}

/// A closed interval `[lower, upper]`.
#[derive(Debug, Clone, Copy)]
pub struct BoundaryConstraint {
    /// Lower bound (inclusive).
    pub lower: Real,
    /// Upper bound (inclusive).
    pub upper: Real,
}

impl Constraint for BoundaryConstraint {
    fn test(&self, value: Real) -> bool {
        value >= self.lower && value <= self.upper
    }

    fn describe(&self) -> String {
        format!("must lie in [{}, {}]", self.lower, self.upper)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Parameter
// ────────────────────────────────────────────────────────────────────────────

/// A named, validated model coefficient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Parameter {
    name: &'static str,
    value: Real,
}

impl Parameter {
    /// Check `value` against `constraint`.
    ///
    /// Non-finite values and constraint violations are reported as
    /// [`Error::InvalidArgument`] naming the parameter.
    pub fn new(name: &'static str, value: Real, constraint: &dyn Constraint) -> Result<Self> {
        if !value.is_finite() || !constraint.test(value) {
            return Err(Error::InvalidArgument(format!(
                "model parameter {name} = {value} {}",
                constraint.describe()
            )));
        }
        Ok(Self { name, value })
    }

    /// Parameter name, as used in error messages.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Current value.
    pub fn value(&self) -> Real {
        self.value
    }
}
