//! Option exercise schedules.
//!
//! An `Exercise` defines *when* an option can be exercised.

use bermudan_core::errors::{Error, Result};
use bermudan_time::Date;
use std::fmt;

/// Type of exercise right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExerciseType {
    /// Can only be exercised at expiry.
    European,
    /// Can be exercised on specific dates.
    Bermudan,
}

/// Exercise specification for an option.
///
/// Dates are non-empty, sorted, and distinct.
#[derive(Debug, Clone, PartialEq)]
pub struct Exercise {
    exercise_type: ExerciseType,
    dates: Vec<Date>,
}

impl Exercise {
    /// Create a European exercise (single expiry date).
    pub fn european(expiry: Date) -> Self {
        Self {
            exercise_type: ExerciseType::European,
            dates: vec![expiry],
        }
    }

    /// Create a Bermudan exercise from a set of exercise dates.
    ///
    /// Dates are sorted and duplicates dropped; an empty set is an
    /// [`Error::InvalidSchedule`].
    pub fn bermudan(mut dates: Vec<Date>) -> Result<Self> {
        if dates.is_empty() {
            return Err(Error::InvalidSchedule(
                "a Bermudan exercise needs at least one date".into(),
            ));
        }
        dates.sort();
        dates.dedup();
        Ok(Self {
            exercise_type: ExerciseType::Bermudan,
            dates,
        })
    }

    /// The first exercise date.
    pub fn first_date(&self) -> Date {
        self.dates[0]
    }

    /// The last possible exercise date.
    pub fn last_date(&self) -> Date {
        self.dates[self.dates.len() - 1]
    }

    /// All exercise dates.
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// The type of exercise.
    pub fn exercise_type(&self) -> ExerciseType {
        self.exercise_type
    }
}

impl fmt::Display for Exercise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.exercise_type {
            ExerciseType::European => write!(f, "European({})", self.dates[0]),
            ExerciseType::Bermudan => {
                write!(f, "Bermudan({} dates)", self.dates.len())
            }
        }
    }
}
