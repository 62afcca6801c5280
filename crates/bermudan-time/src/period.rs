//! `Period` — a time span expressed in a [`TimeUnit`].

use crate::frequency::Frequency;
use bermudan_core::errors::{Error, Result};

/// A unit of calendar time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    /// Calendar days.
    Days,
    /// Calendar weeks (7 days).
    Weeks,
    /// Calendar months.
    Months,
    /// Calendar years (12 months).
    Years,
}

/// A time span made up of an integer length and a [`TimeUnit`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Period {
    /// Number of units.
    pub length: i32,
    /// The unit of time.
    pub unit: TimeUnit,
}

impl Period {
    /// Create a new period.
    pub fn new(length: i32, unit: TimeUnit) -> Self {
        Self { length, unit }
    }

    /// `n` years.
    pub fn years(n: i32) -> Self {
        Self::new(n, TimeUnit::Years)
    }

    /// `n` months.
    pub fn months(n: i32) -> Self {
        Self::new(n, TimeUnit::Months)
    }

    /// The tenor between two events of the given frequency.
    pub fn from_frequency(freq: Frequency) -> Result<Self> {
        match freq {
            Frequency::Once => Err(Error::InvalidArgument(format!(
                "cannot convert {freq} to a Period"
            ))),
            Frequency::Annual => Ok(Period::years(1)),
            Frequency::Semiannual => Ok(Period::months(6)),
            Frequency::Quarterly => Ok(Period::months(3)),
            Frequency::Monthly => Ok(Period::months(1)),
        }
    }

    /// `true` if the period moves dates forward.
    pub fn is_positive(&self) -> bool {
        self.length > 0
    }
}

impl std::ops::Mul<i32> for Period {
    type Output = Self;
    fn mul(self, rhs: i32) -> Self {
        Period::new(self.length * rhs, self.unit)
    }
}

impl std::ops::Neg for Period {
    type Output = Self;
    fn neg(self) -> Self {
        Period::new(-self.length, self.unit)
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let abbr = match self.unit {
            TimeUnit::Days => "D",
            TimeUnit::Weeks => "W",
            TimeUnit::Months => "M",
            TimeUnit::Years => "Y",
        };
        write!(f, "{}{abbr}", self.length)
    }
}

impl std::fmt::Debug for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Period({self})")
    }
}
