//! Fixed and floating coupons of the underlying swap.

use bermudan_core::errors::Result;
use bermudan_core::{Rate, Real, Time};
use bermudan_termstructures::YieldTermStructure;
use bermudan_time::{Date, DayCounter, Schedule};

/// A coupon paying a fixed simple rate over its accrual period.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedRateCoupon {
    nominal: Real,
    rate: Rate,
    accrual_start: Date,
    accrual_end: Date,
    payment_date: Date,
    accrual_period: Time,
}

impl FixedRateCoupon {
    /// Create a coupon paid at the end of its accrual period.
    pub fn new(
        nominal: Real,
        rate: Rate,
        accrual_start: Date,
        accrual_end: Date,
        day_counter: &dyn DayCounter,
    ) -> Self {
        Self {
            nominal,
            rate,
            accrual_start,
            accrual_end,
            payment_date: accrual_end,
            accrual_period: day_counter.year_fraction(accrual_start, accrual_end),
        }
    }

    /// One coupon per schedule period.
    pub fn leg(
        schedule: &Schedule,
        nominal: Real,
        rate: Rate,
        day_counter: &dyn DayCounter,
    ) -> Vec<Self> {
        schedule
            .periods()
            .map(|(start, end)| Self::new(nominal, rate, start, end, day_counter))
            .collect()
    }

    /// The same coupon at another rate.
    pub fn with_rate(&self, rate: Rate) -> Self {
        Self { rate, ..self.clone() }
    }

    /// Coupon amount `N · K · τ`.
    pub fn amount(&self) -> Real {
        self.nominal * self.rate * self.accrual_period
    }

    /// Notional.
    pub fn nominal(&self) -> Real {
        self.nominal
    }

    /// Fixed rate.
    pub fn rate(&self) -> Rate {
        self.rate
    }

    /// Accrual start date.
    pub fn accrual_start(&self) -> Date {
        self.accrual_start
    }

    /// Accrual end date.
    pub fn accrual_end(&self) -> Date {
        self.accrual_end
    }

    /// Payment date.
    pub fn payment_date(&self) -> Date {
        self.payment_date
    }

    /// Accrual period as a year fraction.
    pub fn accrual_period(&self) -> Time {
        self.accrual_period
    }
}

/// A coupon paying the simple forward rate over its accrual period plus a
/// spread. The index fixes at the accrual start.
#[derive(Debug, Clone, PartialEq)]
pub struct FloatingRateCoupon {
    nominal: Real,
    spread: Rate,
    accrual_start: Date,
    accrual_end: Date,
    payment_date: Date,
    accrual_period: Time,
}

impl FloatingRateCoupon {
    /// Create a coupon paid at the end of its accrual period.
    pub fn new(
        nominal: Real,
        spread: Rate,
        accrual_start: Date,
        accrual_end: Date,
        day_counter: &dyn DayCounter,
    ) -> Self {
        Self {
            nominal,
            spread,
            accrual_start,
            accrual_end,
            payment_date: accrual_end,
            accrual_period: day_counter.year_fraction(accrual_start, accrual_end),
        }
    }

    /// One coupon per schedule period.
    pub fn leg(
        schedule: &Schedule,
        nominal: Real,
        spread: Rate,
        day_counter: &dyn DayCounter,
    ) -> Vec<Self> {
        schedule
            .periods()
            .map(|(start, end)| Self::new(nominal, spread, start, end, day_counter))
            .collect()
    }

    /// The fixing date (the accrual start).
    pub fn fixing_date(&self) -> Date {
        self.accrual_start
    }

    /// Simple forward rate over the accrual period implied by `curve`.
    pub fn forward_rate(&self, curve: &dyn YieldTermStructure) -> Result<Rate> {
        let start = curve.discount_at(self.accrual_start)?;
        let end = curve.discount_at(self.accrual_end)?;
        Ok((start / end - 1.0) / self.accrual_period)
    }

    /// Projected coupon amount `N · (F + s) · τ`.
    pub fn amount(&self, curve: &dyn YieldTermStructure) -> Result<Real> {
        Ok(self.nominal * (self.forward_rate(curve)? + self.spread) * self.accrual_period)
    }

    /// Notional.
    pub fn nominal(&self) -> Real {
        self.nominal
    }

    /// Spread over the index.
    pub fn spread(&self) -> Rate {
        self.spread
    }

    /// Accrual start date.
    pub fn accrual_start(&self) -> Date {
        self.accrual_start
    }

    /// Accrual end date.
    pub fn accrual_end(&self) -> Date {
        self.accrual_end
    }

    /// Payment date.
    pub fn payment_date(&self) -> Date {
        self.payment_date
    }

    /// Accrual period as a year fraction.
    pub fn accrual_period(&self) -> Time {
        self.accrual_period
    }
}
