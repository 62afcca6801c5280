//! `Schedule` — the ordered accrual dates of a swap leg.
//!
//! A schedule is generated from an effective date, a termination date and a
//! tenor, then adjusted to business days on a calendar.

use crate::business_day_convention::BusinessDayConvention;
use crate::calendar::Calendar;
use crate::date::Date;
use crate::day_counter::DayCounter;
use crate::period::Period;
use bermudan_core::errors::{Error, Result};
use bermudan_core::Time;

/// Date generation rule for schedules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateGeneration {
    /// Dates generated backward from the termination date; any stub is at
    /// the front.
    Backward,
    /// Dates generated forward from the effective date; any stub is at the
    /// back.
    Forward,
}

/// An ordered, strictly increasing sequence of accrual dates.
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    dates: Vec<Date>,
}

impl Schedule {
    /// Build a schedule from an explicit list of dates.
    ///
    /// Fails with [`Error::InvalidSchedule`] unless there are at least two
    /// strictly increasing dates.
    pub fn from_dates(dates: Vec<Date>) -> Result<Self> {
        if dates.len() < 2 {
            return Err(Error::InvalidSchedule(format!(
                "a schedule needs at least two dates, got {}",
                dates.len()
            )));
        }
        if let Some(w) = dates.windows(2).find(|w| w[0] >= w[1]) {
            return Err(Error::InvalidSchedule(format!(
                "dates are not strictly increasing: {} then {}",
                w[0], w[1]
            )));
        }
        Ok(Self { dates })
    }

    /// Return all dates in the schedule.
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// Number of dates.
    pub fn size(&self) -> usize {
        self.dates.len()
    }

    /// Return the `i`-th date.
    pub fn date(&self, i: usize) -> Date {
        self.dates[i]
    }

    /// Return the start (effective) date.
    pub fn start_date(&self) -> Date {
        self.dates[0]
    }

    /// Return the end (termination) date.
    pub fn end_date(&self) -> Date {
        self.dates[self.dates.len() - 1]
    }

    /// Consecutive `(start, end)` accrual periods.
    pub fn periods(&self) -> impl Iterator<Item = (Date, Date)> + '_ {
        self.dates.windows(2).map(|w| (w[0], w[1]))
    }

    /// Year-fraction offsets of every date from `reference`.
    ///
    /// Fails with [`Error::InvalidSchedule`] if any date precedes
    /// `reference`.
    pub fn times(&self, reference: Date, day_counter: &dyn DayCounter) -> Result<Vec<Time>> {
        if self.start_date() < reference {
            return Err(Error::InvalidSchedule(format!(
                "schedule starts on {} before the reference date {reference}",
                self.start_date()
            )));
        }
        Ok(self
            .dates
            .iter()
            .map(|&d| day_counter.year_fraction(reference, d))
            .collect())
    }
}

/// Builder for [`Schedule`].
#[derive(Debug)]
pub struct ScheduleBuilder<'a> {
    effective_date: Date,
    termination_date: Date,
    tenor: Period,
    calendar: &'a dyn Calendar,
    convention: BusinessDayConvention,
    termination_convention: BusinessDayConvention,
    rule: DateGeneration,
    end_of_month: bool,
}

impl<'a> ScheduleBuilder<'a> {
    /// Begin building a schedule.
    pub fn new(
        effective_date: Date,
        termination_date: Date,
        tenor: Period,
        calendar: &'a dyn Calendar,
    ) -> Self {
        Self {
            effective_date,
            termination_date,
            tenor,
            calendar,
            convention: BusinessDayConvention::ModifiedFollowing,
            termination_convention: BusinessDayConvention::ModifiedFollowing,
            rule: DateGeneration::Backward,
            end_of_month: false,
        }
    }

    /// Set the business-day convention for the effective and intermediate
    /// dates.
    pub fn with_convention(mut self, c: BusinessDayConvention) -> Self {
        self.convention = c;
        self
    }

    /// Set the business-day convention for the termination date.
    pub fn with_termination_convention(mut self, c: BusinessDayConvention) -> Self {
        self.termination_convention = c;
        self
    }

    /// Set the date-generation rule.
    pub fn with_rule(mut self, rule: DateGeneration) -> Self {
        self.rule = rule;
        self
    }

    /// Whether dates generated from a month-end seed stay on month ends.
    pub fn end_of_month(mut self, flag: bool) -> Self {
        self.end_of_month = flag;
        self
    }

    /// Build the `Schedule`.
    pub fn build(self) -> Result<Schedule> {
        let start = self.effective_date;
        let end = self.termination_date;
        if start >= end {
            return Err(Error::InvalidSchedule(format!(
                "effective date {start} must be before termination date {end}"
            )));
        }
        if !self.tenor.is_positive() {
            return Err(Error::InvalidSchedule(format!(
                "tenor must be positive, got {}",
                self.tenor
            )));
        }

        let mut unadjusted = Vec::new();
        match self.rule {
            DateGeneration::Forward => {
                unadjusted.push(start);
                for n in 1.. {
                    let next = self.roll_from(start, n)?;
                    if next >= end {
                        break;
                    }
                    unadjusted.push(next);
                }
                unadjusted.push(end);
            }
            DateGeneration::Backward => {
                unadjusted.push(end);
                for n in 1.. {
                    let prev = self.roll_from(end, -n)?;
                    if prev <= start {
                        break;
                    }
                    unadjusted.push(prev);
                }
                unadjusted.push(start);
                unadjusted.reverse();
            }
        }

        let last = unadjusted.len() - 1;
        let mut dates = Vec::with_capacity(unadjusted.len());
        for (i, &d) in unadjusted.iter().enumerate() {
            let convention = if i == last {
                self.termination_convention
            } else {
                self.convention
            };
            dates.push(self.calendar.adjust(d, convention)?);
        }
        // Adjustment may collapse a short stub onto its neighbour.
        dates.dedup();
        Schedule::from_dates(dates)
    }

    fn roll_from(&self, seed: Date, n: i32) -> Result<Date> {
        let d = seed.advance_by(self.tenor * n)?;
        if self.end_of_month && seed.is_end_of_month() {
            Ok(d.end_of_month())
        } else {
            Ok(d)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::WeekendsOnly;

    fn date(y: u16, m: u8, d: u8) -> Date {
        Date::from_ymd(y, m, d).unwrap()
    }

    #[test]
    fn annual_backward_schedule() {
        let cal = WeekendsOnly;
        let sched = ScheduleBuilder::new(
            date(2020, 1, 1),
            date(2023, 1, 1),
            Period::years(1),
            &cal,
        )
        .with_convention(BusinessDayConvention::Unadjusted)
        .with_termination_convention(BusinessDayConvention::Unadjusted)
        .build()
        .unwrap();
        assert_eq!(sched.size(), 4);
        assert_eq!(sched.start_date(), date(2020, 1, 1));
        assert_eq!(sched.end_date(), date(2023, 1, 1));
    }

    #[test]
    fn reversed_dates_are_invalid() {
        let cal = WeekendsOnly;
        let err = ScheduleBuilder::new(date(2023, 1, 1), date(2020, 1, 1), Period::years(1), &cal)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidSchedule(_)));
    }

    #[test]
    fn zero_tenor_is_invalid() {
        let cal = WeekendsOnly;
        let err = ScheduleBuilder::new(date(2020, 1, 1), date(2023, 1, 1), Period::years(0), &cal)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidSchedule(_)));
    }

    #[test]
    fn explicit_dates_must_increase() {
        assert!(Schedule::from_dates(vec![date(2020, 1, 1)]).is_err());
        assert!(Schedule::from_dates(vec![date(2021, 1, 1), date(2020, 1, 1)]).is_err());
        assert!(Schedule::from_dates(vec![date(2020, 1, 1), date(2021, 1, 1)]).is_ok());
    }

    #[test]
    fn times_reject_dates_before_reference() {
        let sched = Schedule::from_dates(vec![date(2020, 1, 1), date(2021, 1, 1)]).unwrap();
        let dc = crate::day_counter::Actual365Fixed;
        assert!(matches!(
            sched.times(date(2020, 6, 1), &dc),
            Err(Error::InvalidSchedule(_))
        ));
        let t = sched.times(date(2020, 1, 1), &dc).unwrap();
        assert_eq!(t[0], 0.0);
        assert!((t[1] - 366.0 / 365.0).abs() < 1e-15);
    }
}
