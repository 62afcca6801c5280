//! Concrete settlement calendars.

/// TARGET, the euro settlement calendar.
pub mod target;

pub use target::Target;
