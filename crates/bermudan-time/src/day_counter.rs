//! `DayCounter` trait and the day-count conventions used by swaps and curves.
//!
//! A day counter computes the fraction of a year between two dates, used
//! when discounting or accruing interest.

use crate::date::Date;
use bermudan_core::{Real, Time};

/// A convention for counting the fraction of a year between two dates.
pub trait DayCounter: std::fmt::Debug + Send + Sync {
    /// Human-readable name of this convention (e.g. `"Actual/365 (Fixed)"`).
    fn name(&self) -> &str;

    /// Number of days between `d1` and `d2` according to this convention.
    fn day_count(&self, d1: Date, d2: Date) -> i64;

    /// Fraction of a year between `d1` and `d2`.
    fn year_fraction(&self, d1: Date, d2: Date) -> Time;
}

/// Actual/365 (Fixed): `actual_days / 365`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Actual365Fixed;

impl DayCounter for Actual365Fixed {
    fn name(&self) -> &str {
        "Actual/365 (Fixed)"
    }

    fn day_count(&self, d1: Date, d2: Date) -> i64 {
        (d2 - d1) as i64
    }

    fn year_fraction(&self, d1: Date, d2: Date) -> Time {
        self.day_count(d1, d2) as Real / 365.0
    }
}

/// Actual/360: `actual_days / 360`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Actual360;

impl DayCounter for Actual360 {
    fn name(&self) -> &str {
        "Actual/360"
    }

    fn day_count(&self, d1: Date, d2: Date) -> i64 {
        (d2 - d1) as i64
    }

    fn year_fraction(&self, d1: Date, d2: Date) -> Time {
        self.day_count(d1, d2) as Real / 360.0
    }
}

/// End-of-month rule variants of 30/360.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Thirty360Convention {
    /// 30E/360 (Eurobond basis): a 31st becomes the 30th on both ends.
    #[default]
    European,
    /// 30/360 Bond Basis: a 31st end date is moved only when the start date
    /// is on the 30th or 31st.
    BondBasis,
}

/// 30/360: `[360(Y2−Y1) + 30(M2−M1) + (D2−D1)] / 360`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Thirty360 {
    convention: Thirty360Convention,
}

impl Thirty360 {
    /// A 30/360 counter with the given end-of-month rule.
    pub fn new(convention: Thirty360Convention) -> Self {
        Self { convention }
    }

    /// 30E/360.
    pub fn european() -> Self {
        Self::new(Thirty360Convention::European)
    }
}

impl DayCounter for Thirty360 {
    fn name(&self) -> &str {
        match self.convention {
            Thirty360Convention::European => "30E/360 (Eurobond Basis)",
            Thirty360Convention::BondBasis => "30/360 (Bond Basis)",
        }
    }

    fn day_count(&self, d1: Date, d2: Date) -> i64 {
        let (y1, m1) = (d1.year() as i64, d1.month() as i64);
        let (y2, m2) = (d2.year() as i64, d2.month() as i64);
        let mut dd1 = d1.day_of_month() as i64;
        let mut dd2 = d2.day_of_month() as i64;
        match self.convention {
            Thirty360Convention::European => {
                dd1 = dd1.min(30);
                dd2 = dd2.min(30);
            }
            Thirty360Convention::BondBasis => {
                dd1 = dd1.min(30);
                if dd2 == 31 && dd1 == 30 {
                    dd2 = 30;
                }
            }
        }
        360 * (y2 - y1) + 30 * (m2 - m1) + (dd2 - dd1)
    }

    fn year_fraction(&self, d1: Date, d2: Date) -> Time {
        self.day_count(d1, d2) as Real / 360.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn date(y: u16, m: u8, d: u8) -> Date {
        Date::from_ymd(y, m, d).unwrap()
    }

    #[test]
    fn actual_counters() {
        let (d1, d2) = (date(2025, 7, 17), date(2026, 1, 19));
        assert_eq!(Actual360.day_count(d1, d2), 186);
        assert_abs_diff_eq!(Actual360.year_fraction(d1, d2), 186.0 / 360.0);
        assert_abs_diff_eq!(Actual365Fixed.year_fraction(d1, d2), 186.0 / 365.0);
    }

    #[test]
    fn thirty_360_full_year_is_one() {
        let dc = Thirty360::european();
        assert_abs_diff_eq!(dc.year_fraction(date(2026, 7, 17), date(2027, 7, 17)), 1.0);
    }

    #[test]
    fn thirty_360_end_of_month_rules() {
        let (d1, d2) = (date(2025, 1, 15), date(2025, 3, 31));
        // European caps the 31st; bond basis keeps it because d1 < 30.
        assert_eq!(Thirty360::european().day_count(d1, d2), 75);
        assert_eq!(
            Thirty360::new(Thirty360Convention::BondBasis).day_count(d1, d2),
            76
        );
        let (d1, d2) = (date(2025, 1, 31), date(2025, 3, 31));
        assert_eq!(Thirty360::european().day_count(d1, d2), 60);
        assert_eq!(
            Thirty360::new(Thirty360Convention::BondBasis).day_count(d1, d2),
            60
        );
    }
}
