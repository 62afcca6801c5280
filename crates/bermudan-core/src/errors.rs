//! Error types for bermudan-rs.
//!
//! Every component reports failures through the single `thiserror`-derived
//! [`Error`] enum below. The variants fall into two families that callers
//! must be able to tell apart: bad input (schedule, curve, arguments) and
//! numerical methods that could not produce a stable result (lattice, grid).
//! [`Error::category`] makes that distinction explicit.
//!
//! The `ensure!` and `fail!` macros are the shorthand used throughout the
//! workspace for precondition checks and generic runtime failures.

use thiserror::Error;

/// The top-level error type used throughout bermudan-rs.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// A date schedule came out empty, unordered, or outside the
    /// instrument's lifetime.
    #[error("invalid schedule: {0}")]
    InvalidSchedule(String),

    /// A term structure was built or queried outside its domain.
    #[error("invalid curve: {0}")]
    InvalidCurve(String),

    /// The model family has no analytic answer for the requested operation.
    #[error("model `{model}` does not support {operation}")]
    UnsupportedModel {
        /// Tag of the model that refused the request.
        model: String,
        /// What was asked of it.
        operation: String,
    },

    /// A lattice slice could not be built (negative probabilities,
    /// degenerate variance, or a drift shift that cannot be fitted).
    #[error("lattice construction failed at step {step} (t = {time:.6}): {reason}")]
    LatticeConstruction {
        /// Index of the offending time slice.
        step: usize,
        /// Time of the offending slice, in years.
        time: f64,
        /// Human-readable cause.
        reason: String,
    },

    /// A finite-difference solve failed its post-solve sanity checks.
    #[error("grid instability: {0}")]
    GridInstability(String),

    /// Precondition violated (raised by `ensure!`).
    #[error("precondition not satisfied: {0}")]
    Precondition(String),

    /// Date-related error.
    #[error("date error: {0}")]
    Date(String),

    /// Invalid argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// General runtime error (raised by `fail!`).
    #[error("{0}")]
    Runtime(String),
}

/// Coarse classification of an [`Error`] for callers deciding what to do
/// next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The request itself is wrong; adjust the inputs.
    InvalidInput,
    /// The numerical method failed; adjust the discretization settings.
    NumericalMethod,
    /// A failure that neither the inputs nor the settings explain.
    Internal,
}

impl Error {
    /// Classify this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidSchedule(_)
            | Error::InvalidCurve(_)
            | Error::Precondition(_)
            | Error::Date(_)
            | Error::InvalidArgument(_) => ErrorCategory::InvalidInput,
            Error::LatticeConstruction { .. } | Error::GridInstability(_) => {
                ErrorCategory::NumericalMethod
            }
            Error::UnsupportedModel { .. } | Error::Runtime(_) => ErrorCategory::Internal,
        }
    }

    /// Shorthand for an [`Error::UnsupportedModel`].
    pub fn unsupported(model: impl Into<String>, operation: impl Into<String>) -> Self {
        Error::UnsupportedModel {
            model: model.into(),
            operation: operation.into(),
        }
    }

    /// `true` for [`Error::UnsupportedModel`], the signal engines use to fall
    /// back to numerical evaluation.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Error::UnsupportedModel { .. })
    }
}

/// Shorthand `Result` type used throughout bermudan-rs.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Returns `Err(Error::Precondition(...))` if `$cond` is false.
///
/// # Example
/// ```
/// use bermudan_core::{ensure, errors::Error};
/// fn positive(x: f64) -> bermudan_core::errors::Result<f64> {
///     ensure!(x > 0.0, "x must be positive, got {x}");
///     Ok(x)
/// }
/// assert!(positive(1.0).is_ok());
/// assert!(positive(-1.0).is_err());
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $($msg:tt)*) => {
        if !$cond {
            return Err($crate::errors::Error::Precondition(
                format!($($msg)*)
            ));
        }
    };
}

/// Returns `Err(Error::Runtime(...))` immediately.
///
/// # Example
/// ```
/// use bermudan_core::{fail, errors::Error};
/// fn always_err() -> bermudan_core::errors::Result<()> {
///     fail!("something went wrong");
/// }
/// assert!(always_err().is_err());
/// ```
#[macro_export]
macro_rules! fail {
    ($($msg:tt)*) => {
        return Err($crate::errors::Error::Runtime(format!($($msg)*)))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_separate_input_from_numerics() {
        assert_eq!(
            Error::InvalidSchedule("empty".into()).category(),
            ErrorCategory::InvalidInput
        );
        assert_eq!(
            Error::InvalidCurve("rate".into()).category(),
            ErrorCategory::InvalidInput
        );
        assert_eq!(
            Error::LatticeConstruction {
                step: 3,
                time: 0.3,
                reason: "negative probability".into()
            }
            .category(),
            ErrorCategory::NumericalMethod
        );
        assert_eq!(
            Error::GridInstability("nan".into()).category(),
            ErrorCategory::NumericalMethod
        );
        assert_eq!(
            Error::unsupported("bk", "discount bond").category(),
            ErrorCategory::Internal
        );
    }

    #[test]
    fn unsupported_message_names_model_and_operation() {
        let e = Error::unsupported("bk", "analytic discount bond");
        assert!(e.is_unsupported());
        assert_eq!(
            e.to_string(),
            "model `bk` does not support analytic discount bond"
        );
    }

    #[test]
    fn lattice_message_names_the_slice() {
        let e = Error::LatticeConstruction {
            step: 7,
            time: 1.25,
            reason: "negative probability".into(),
        };
        assert_eq!(
            e.to_string(),
            "lattice construction failed at step 7 (t = 1.250000): negative probability"
        );
    }

    fn checked_sqrt(x: f64) -> Result<f64> {
        ensure!(x >= 0.0, "negative input {x}");
        Ok(x.sqrt())
    }

    #[test]
    fn ensure_macro_returns_precondition() {
        assert_eq!(checked_sqrt(4.0), Ok(2.0));
        assert!(matches!(checked_sqrt(-1.0), Err(Error::Precondition(_))));
    }
}
