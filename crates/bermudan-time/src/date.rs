//! `Date` and `Weekday`.
//!
//! Dates are stored as a serial number of days, serial 1 being
//! January 1, 1900. The valid range is 1900-01-01 to 2199-12-31.

use crate::period::{Period, TimeUnit};
use bermudan_core::errors::{Error, Result};

/// Day of the week, numbered 1 (Monday) to 7 (Sunday).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Weekday {
    /// Monday (1).
    Monday = 1,
    /// Tuesday (2).
    Tuesday = 2,
    /// Wednesday (3).
    Wednesday = 3,
    /// Thursday (4).
    Thursday = 4,
    /// Friday (5).
    Friday = 5,
    /// Saturday (6).
    Saturday = 6,
    /// Sunday (7).
    Sunday = 7,
}

impl Weekday {
    /// Return `true` if this is Saturday or Sunday.
    pub fn is_weekend(&self) -> bool {
        matches!(self, Weekday::Saturday | Weekday::Sunday)
    }
}

/// A calendar date represented as a serial number.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Date(i32);

impl Date {
    /// Minimum valid date: January 1, 1900.
    pub const MIN: Date = Date(1);

    /// Maximum valid date: December 31, 2199.
    pub const MAX: Date = Date(109_573);

    // ── Constructors ─────────────────────────────────────────────────────────

    /// Create a date from year, month (1–12), and day-of-month (1–31).
    pub fn from_ymd(year: u16, month: u8, day: u8) -> Result<Self> {
        if !(1900..=2199).contains(&year) {
            return Err(Error::Date(format!(
                "year {year} out of range [1900, 2199]"
            )));
        }
        if !(1..=12).contains(&month) {
            return Err(Error::Date(format!("month {month} out of range [1, 12]")));
        }
        let days_in = days_in_month(year, month);
        if day == 0 || day > days_in {
            return Err(Error::Date(format!(
                "day {day} out of range [1, {days_in}] for {year}-{month:02}"
            )));
        }
        Ok(Date(serial_from_ymd(year, month, day)))
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    /// Return the serial number.
    pub fn serial(&self) -> i32 {
        self.0
    }

    /// Return the year (1900–2199).
    pub fn year(&self) -> u16 {
        ymd_from_serial(self.0).0
    }

    /// Return the month (1–12).
    pub fn month(&self) -> u8 {
        ymd_from_serial(self.0).1
    }

    /// Return the day of the month (1–31).
    pub fn day_of_month(&self) -> u8 {
        ymd_from_serial(self.0).2
    }

    /// Return the day of the year (1–366).
    pub fn day_of_year(&self) -> u16 {
        let (y, m, d) = ymd_from_serial(self.0);
        let mut doy = d as u16;
        for mon in 1..m {
            doy += days_in_month(y, mon) as u16;
        }
        doy
    }

    /// Return the weekday. Serial 1 (1900-01-01) is a Monday.
    pub fn weekday(&self) -> Weekday {
        match (self.0 - 1).rem_euclid(7) {
            0 => Weekday::Monday,
            1 => Weekday::Tuesday,
            2 => Weekday::Wednesday,
            3 => Weekday::Thursday,
            4 => Weekday::Friday,
            5 => Weekday::Saturday,
            _ => Weekday::Sunday,
        }
    }

    // ── Arithmetic ────────────────────────────────────────────────────────────

    /// Advance by `n` calendar days.
    pub fn add_days(self, n: i32) -> Result<Self> {
        let serial = self.0 + n;
        if serial < Self::MIN.0 || serial > Self::MAX.0 {
            return Err(Error::Date(format!(
                "{self} + {n} days is outside the supported date range"
            )));
        }
        Ok(Date(serial))
    }

    /// Advance by `n` units, clamping to the end of month where needed
    /// (Jan 31 + 1M = Feb 28).
    pub fn advance(self, n: i32, unit: TimeUnit) -> Result<Self> {
        match unit {
            TimeUnit::Days => self.add_days(n),
            TimeUnit::Weeks => self.add_days(n * 7),
            TimeUnit::Months => {
                let (y, m, d) = ymd_from_serial(self.0);
                let total = y as i32 * 12 + (m as i32 - 1) + n;
                let new_y = total.div_euclid(12);
                let new_m = (total.rem_euclid(12) + 1) as u8;
                if !(1900..=2199).contains(&new_y) {
                    return Err(Error::Date(format!(
                        "{self} advanced by {n} months leaves the supported range"
                    )));
                }
                let new_y = new_y as u16;
                let new_d = d.min(days_in_month(new_y, new_m));
                Ok(Date(serial_from_ymd(new_y, new_m, new_d)))
            }
            TimeUnit::Years => self.advance(n * 12, TimeUnit::Months),
        }
    }

    /// Advance by a [`Period`].
    pub fn advance_by(self, period: Period) -> Result<Self> {
        self.advance(period.length, period.unit)
    }

    /// Return the number of calendar days from `self` to `other`.
    pub fn days_between(self, other: Date) -> i32 {
        other.0 - self.0
    }

    /// Return the last day of the month containing this date.
    pub fn end_of_month(self) -> Self {
        let (y, m, _) = ymd_from_serial(self.0);
        Date(serial_from_ymd(y, m, days_in_month(y, m)))
    }

    /// Return `true` if this is the last calendar day of its month.
    pub fn is_end_of_month(self) -> bool {
        self == self.end_of_month()
    }
}

impl std::ops::Sub<Date> for Date {
    type Output = i32;
    fn sub(self, rhs: Date) -> i32 {
        self.0 - rhs.0
    }
}

// ── Display ───────────────────────────────────────────────────────────────────

impl std::fmt::Display for Date {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (y, m, d) = ymd_from_serial(self.0);
        write!(f, "{y:04}-{m:02}-{d:02}")
    }
}

impl std::fmt::Debug for Date {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Date({self})")
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Whether a given year is a leap year.
pub fn is_leap_year(year: u16) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Number of days in a given month/year.
pub fn days_in_month(year: u16, month: u8) -> u8 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        _ if is_leap_year(year) => 29,
        _ => 28,
    }
}

/// Cumulative day-of-year offset at the start of each month (non-leap).
const MONTH_OFFSET: [i32; 12] = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334];

fn serial_from_ymd(year: u16, month: u8, day: u8) -> i32 {
    let y = year as i32;
    // Leap years in [1900, year); 1900 itself is not one.
    let leaps = (y - 1901) / 4 - (y - 1901) / 100 + (y - 1601) / 400;
    let mut serial = (y - 1900) * 365 + leaps + MONTH_OFFSET[month as usize - 1];
    if month > 2 && is_leap_year(year) {
        serial += 1;
    }
    serial + day as i32
}

fn ymd_from_serial(serial: i32) -> (u16, u8, u8) {
    let mut y = (serial / 365 + 1900) as u16;
    while serial < serial_from_ymd(y, 1, 1) {
        y -= 1;
    }
    while y < 2199 && serial >= serial_from_ymd(y + 1, 1, 1) {
        y += 1;
    }
    let mut remaining = serial - serial_from_ymd(y, 1, 1) + 1;
    let mut m = 1u8;
    while m < 12 && remaining > days_in_month(y, m) as i32 {
        remaining -= days_in_month(y, m) as i32;
        m += 1;
    }
    (y, m, remaining as u8)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn epoch_is_serial_one() {
        let d = Date::from_ymd(1900, 1, 1).unwrap();
        assert_eq!(d.serial(), 1);
        assert_eq!(d.weekday(), Weekday::Monday);
    }

    #[test]
    fn weekday_of_known_dates() {
        assert_eq!(Date::from_ymd(2024, 1, 1).unwrap().weekday(), Weekday::Monday);
        assert_eq!(Date::from_ymd(2025, 7, 15).unwrap().weekday(), Weekday::Tuesday);
        assert_eq!(Date::from_ymd(2027, 7, 17).unwrap().weekday(), Weekday::Saturday);
    }

    #[test]
    fn advance_months_clamps_to_month_end() {
        let d = Date::from_ymd(2023, 1, 31).unwrap();
        let next = d.advance(1, TimeUnit::Months).unwrap();
        assert_eq!(next, Date::from_ymd(2023, 2, 28).unwrap());
        let back = d.advance(-2, TimeUnit::Months).unwrap();
        assert_eq!(back, Date::from_ymd(2022, 11, 30).unwrap());
    }

    #[test]
    fn advance_years_from_leap_day() {
        let d = Date::from_ymd(2024, 2, 29).unwrap();
        assert_eq!(
            d.advance(1, TimeUnit::Years).unwrap(),
            Date::from_ymd(2025, 2, 28).unwrap()
        );
    }

    #[test]
    fn out_of_range_is_a_date_error() {
        assert!(matches!(Date::from_ymd(2023, 2, 29), Err(Error::Date(_))));
        assert!(Date::MAX.add_days(1).is_err());
        assert!(Date::MAX.advance(1, TimeUnit::Years).is_err());
    }

    #[test]
    fn display_is_iso() {
        let d = Date::from_ymd(2025, 7, 5).unwrap();
        assert_eq!(d.to_string(), "2025-07-05");
    }

    proptest! {
        #[test]
        fn ymd_round_trip(serial in 1i32..=109_573) {
            let d = Date(serial);
            let back = Date::from_ymd(d.year(), d.month(), d.day_of_month()).unwrap();
            prop_assert_eq!(back, d);
        }
    }
}
