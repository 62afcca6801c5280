//! `Calendar` trait and the generic calendars.
//!
//! A calendar knows which dates are business days and can adjust and
//! advance dates according to a [`BusinessDayConvention`].

use crate::business_day_convention::BusinessDayConvention;
use crate::date::Date;
use crate::period::{Period, TimeUnit};
use bermudan_core::errors::Result;

/// A financial calendar.
pub trait Calendar: std::fmt::Debug + Send + Sync {
    /// Human-readable name (e.g. `"TARGET"`).
    fn name(&self) -> &str;

    /// Return `true` if `date` is a business day in this calendar.
    fn is_business_day(&self, date: Date) -> bool;

    /// Return `true` if `date` is a holiday (non-business) day.
    fn is_holiday(&self, date: Date) -> bool {
        !self.is_business_day(date)
    }

    /// Return `true` if `date` is the last business day of its month.
    fn is_end_of_month(&self, date: Date) -> Result<bool> {
        let next = self.adjust(date.add_days(1)?, BusinessDayConvention::Following)?;
        Ok(date.month() != next.month())
    }

    /// Return the last business day of the month containing `date`.
    fn end_of_month(&self, date: Date) -> Result<Date> {
        self.adjust(date.end_of_month(), BusinessDayConvention::Preceding)
    }

    /// Adjust `date` according to the given business-day convention.
    fn adjust(&self, date: Date, convention: BusinessDayConvention) -> Result<Date> {
        match convention {
            BusinessDayConvention::Unadjusted => Ok(date),
            BusinessDayConvention::Following => roll(self, date, 1),
            BusinessDayConvention::Preceding => roll(self, date, -1),
            BusinessDayConvention::ModifiedFollowing => {
                let adjusted = roll(self, date, 1)?;
                if adjusted.month() != date.month() {
                    roll(self, date, -1)
                } else {
                    Ok(adjusted)
                }
            }
            BusinessDayConvention::ModifiedPreceding => {
                let adjusted = roll(self, date, -1)?;
                if adjusted.month() != date.month() {
                    roll(self, date, 1)
                } else {
                    Ok(adjusted)
                }
            }
        }
    }

    /// Advance `date` by `period`.
    ///
    /// Day periods count business days; longer periods move on the calendar
    /// and then adjust with `convention`. With `end_of_month`, a date on the
    /// last business day of its month stays on the last business day.
    fn advance(
        &self,
        date: Date,
        period: Period,
        convention: BusinessDayConvention,
        end_of_month: bool,
    ) -> Result<Date> {
        match period.unit {
            TimeUnit::Days => self.advance_business_days(date, period.length),
            _ => {
                let moved = date.advance_by(period)?;
                if end_of_month && self.is_end_of_month(date)? {
                    self.end_of_month(moved)
                } else {
                    self.adjust(moved, convention)
                }
            }
        }
    }

    /// Advance `date` by `n` business days.
    fn advance_business_days(&self, date: Date, n: i32) -> Result<Date> {
        let step: i32 = if n >= 0 { 1 } else { -1 };
        let mut remaining = n.abs();
        let mut d = date;
        if remaining == 0 {
            return self.adjust(d, BusinessDayConvention::Following);
        }
        while remaining > 0 {
            d = d.add_days(step)?;
            if self.is_business_day(d) {
                remaining -= 1;
            }
        }
        Ok(d)
    }
}

fn roll<C: Calendar + ?Sized>(calendar: &C, mut date: Date, step: i32) -> Result<Date> {
    while calendar.is_holiday(date) {
        date = date.add_days(step)?;
    }
    Ok(date)
}

/// A null calendar: treats every day as a business day.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCalendar;

impl Calendar for NullCalendar {
    fn name(&self) -> &str {
        "Null"
    }

    fn is_business_day(&self, _date: Date) -> bool {
        true
    }
}

/// A calendar that treats only Saturdays and Sundays as non-business days.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeekendsOnly;

impl Calendar for WeekendsOnly {
    fn name(&self) -> &str {
        "Weekends Only"
    }

    fn is_business_day(&self, date: Date) -> bool {
        !date.weekday().is_weekend()
    }
}
