//! TARGET (Trans-European Automated Real-time Gross Settlement) calendar.

use crate::calendar::Calendar;
use crate::date::{days_in_month, Date};

/// TARGET calendar, used to settle euro swaps.
///
/// Weekends and the following holidays are observed:
/// * New Year's Day (Jan 1)
/// * Good Friday and Easter Monday (from 2000)
/// * Labour Day (May 1, from 2000)
/// * Christmas Day and Boxing Day (Dec 25–26)
/// * December 31 in 1998, 1999 and 2001
#[derive(Debug, Clone, Copy, Default)]
pub struct Target;

impl Calendar for Target {
    fn name(&self) -> &str {
        "TARGET"
    }

    fn is_business_day(&self, date: Date) -> bool {
        if date.weekday().is_weekend() {
            return false;
        }
        let (y, m, d) = (date.year(), date.month(), date.day_of_month());
        let doy = date.day_of_year();
        let easter_monday = easter_monday(y);
        let holiday = (d == 1 && m == 1)
            || (y >= 2000 && (doy == easter_monday - 3 || doy == easter_monday))
            || (y >= 2000 && d == 1 && m == 5)
            || (m == 12 && (d == 25 || d == 26))
            || (m == 12 && d == 31 && matches!(y, 1998 | 1999 | 2001));
        !holiday
    }
}

/// Day of the year (1-based) of Easter Monday, by the anonymous Gregorian
/// computus.
fn easter_monday(year: u16) -> u16 {
    let y = year as i32;
    let a = y % 19;
    let b = y / 100;
    let c = y % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = ((h + l - 7 * m + 114) / 31) as u8;
    let day = ((h + l - 7 * m + 114) % 31 + 1) as u16;
    let before: u16 = (1..month).map(|mm| days_in_month(year, mm) as u16).sum();
    before + day + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: u16, m: u8, d: u8) -> Date {
        Date::from_ymd(y, m, d).unwrap()
    }

    #[test]
    fn fixed_holidays() {
        let cal = Target;
        assert!(!cal.is_business_day(date(2026, 1, 1)));
        assert!(!cal.is_business_day(date(2025, 5, 1)));
        assert!(!cal.is_business_day(date(2025, 12, 25)));
        assert!(!cal.is_business_day(date(2025, 12, 26)));
        assert!(cal.is_business_day(date(2025, 12, 24)));
    }

    #[test]
    fn easter_holidays() {
        let cal = Target;
        // Easter Sunday 2025 is April 20, 2024 is March 31.
        assert!(!cal.is_business_day(date(2025, 4, 18)));
        assert!(!cal.is_business_day(date(2025, 4, 21)));
        assert!(cal.is_business_day(date(2025, 4, 22)));
        assert!(!cal.is_business_day(date(2024, 3, 29)));
        assert!(!cal.is_business_day(date(2024, 4, 1)));
    }

    #[test]
    fn weekend_is_closed() {
        assert!(!Target.is_business_day(date(2025, 7, 19)));
        assert!(Target.is_business_day(date(2025, 7, 17)));
    }
}
