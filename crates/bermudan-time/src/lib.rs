//! # bermudan-time
//!
//! Date, calendar, day counter, schedule, and business-day-convention types.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// Business-day adjustment conventions.
pub mod business_day_convention;

/// Calendar trait and the generic calendars.
pub mod calendar;

/// Concrete settlement calendars.
pub mod calendars;

/// `Date` and `Weekday`.
pub mod date;

/// `DayCounter` trait and built-in day-count conventions.
pub mod day_counter;

/// Coupon frequency.
pub mod frequency;

/// `Period` and `TimeUnit`.
pub mod period;

/// `Schedule` — an ordered sequence of accrual dates.
pub mod schedule;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use business_day_convention::BusinessDayConvention;
pub use calendar::{Calendar, NullCalendar, WeekendsOnly};
pub use calendars::Target;
pub use date::{Date, Weekday};
pub use day_counter::{Actual360, Actual365Fixed, DayCounter, Thirty360, Thirty360Convention};
pub use frequency::Frequency;
pub use period::{Period, TimeUnit};
pub use schedule::{DateGeneration, Schedule, ScheduleBuilder};
