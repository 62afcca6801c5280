//! Bermudan swaptions.
//!
//! The holder may enter the underlying swap on any exercise date. Exercising
//! on date `e` enters every coupon whose accrual starts on or after `e`; a
//! coupon starting at most [`SNAP_DAYS`] days before an exercise date is
//! treated as starting on it.
//!
//! Engines see the swaption as [`SwaptionArguments`]: exercise times and
//! signed cash flows in curve time. Each flow is known at its reset time
//! and paid at its payment time, so at reset it is worth
//! `amount · P(reset, payment)`. Floating coupons enter through the par
//! decomposition `N·P(s, s) − N·P(s, e)`, plus the spread paid at `e`.

use crate::exercise::{Exercise, ExerciseType};
use crate::instrument::{Instrument, PricingEngine, PricingResults};
use crate::swap::{SwapType, VanillaSwap};
use bermudan_core::errors::{Error, Result};
use bermudan_core::{Rate, Real, Time};
use bermudan_termstructures::YieldTermStructure;
use bermudan_time::Date;
use std::sync::Arc;

/// Coupons starting at most this many days before an exercise date are
/// attached to it.
pub const SNAP_DAYS: i32 = 7;

/// A cash flow of the underlying swap, signed from the option holder's
/// side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwaptionCashFlow {
    /// Time at which the amount becomes known.
    pub reset_time: Time,
    /// Time at which it is paid.
    pub payment_time: Time,
    /// Signed amount.
    pub amount: Real,
}

/// Engine view of a swaption, in curve time.
#[derive(Debug, Clone, PartialEq)]
pub struct SwaptionArguments {
    /// Side of the underlying swap entered on exercise.
    pub swap_type: SwapType,
    /// Notional.
    pub nominal: Real,
    /// Strike of the underlying.
    pub fixed_rate: Rate,
    /// Exercise times, strictly increasing.
    pub exercise_times: Vec<Time>,
    /// Cash flows entered by at least one exercise, sorted by reset time.
    pub cash_flows: Vec<SwaptionCashFlow>,
}

impl SwaptionArguments {
    /// Distinct reset times, ascending.
    pub fn reset_times(&self) -> Vec<Time> {
        let mut times: Vec<Time> = self.cash_flows.iter().map(|cf| cf.reset_time).collect();
        times.dedup();
        times
    }

    /// Latest reset time.
    pub fn last_reset_time(&self) -> Time {
        self.cash_flows.iter().map(|cf| cf.reset_time).fold(0.0, Real::max)
    }

    /// Latest payment time.
    pub fn last_payment_time(&self) -> Time {
        self.cash_flows.iter().map(|cf| cf.payment_time).fold(0.0, Real::max)
    }
}

/// A pricing engine for swaptions bound to a discount curve.
pub trait SwaptionEngine: PricingEngine<SwaptionArguments> {
    /// Curve that maps the swaption's dates to times.
    fn term_structure(&self) -> &Arc<dyn YieldTermStructure>;
}

/// An option to enter a vanilla swap on one of several dates.
#[derive(Debug, Clone, PartialEq)]
pub struct BermudanSwaption {
    swap: VanillaSwap,
    exercise: Exercise,
}

impl BermudanSwaption {
    /// Create a swaption on `swap`.
    ///
    /// Every exercise date must precede the swap's maturity and enter at
    /// least one fixed coupon; otherwise [`Error::InvalidSchedule`]. A date
    /// entering only a trailing fixed stub is accepted.
    pub fn new(swap: VanillaSwap, exercise: Exercise) -> Result<Self> {
        let dates = exercise.dates();
        let maturity = swap.maturity_date();
        for &date in dates {
            if date >= maturity {
                return Err(Error::InvalidSchedule(format!(
                    "exercise date {date} is not before the swap maturity {maturity}"
                )));
            }
            let enters_fixed = swap
                .fixed_leg()
                .iter()
                .any(|c| snap(c.accrual_start(), dates) >= date);
            if !enters_fixed {
                return Err(Error::InvalidSchedule(format!(
                    "exercise date {date} is after the last coupon start"
                )));
            }
        }
        Ok(Self { swap, exercise })
    }

    /// Exercisable on every fixed coupon start date up to the last
    /// floating coupon start. A short final fixed stub is not an exercise
    /// date.
    pub fn on_fixed_resets(swap: VanillaSwap) -> Result<Self> {
        let last_floating = swap
            .floating_leg()
            .last()
            .map(|c| c.accrual_start())
            .ok_or_else(|| Error::InvalidSchedule("swap has no floating coupons".into()))?;
        let dates = swap
            .fixed_leg()
            .iter()
            .map(|c| c.accrual_start())
            .filter(|start| *start <= last_floating)
            .collect();
        let exercise = Exercise::bermudan(dates)?;
        Self::new(swap, exercise)
    }

    /// The underlying swap.
    pub fn swap(&self) -> &VanillaSwap {
        &self.swap
    }

    /// The exercise schedule.
    pub fn exercise(&self) -> &Exercise {
        &self.exercise
    }

    /// `true` when there is a single exercise date.
    pub fn is_european(&self) -> bool {
        self.exercise.exercise_type() == ExerciseType::European || self.exercise.dates().len() == 1
    }

    /// Engine arguments in the time of `curve`.
    pub fn arguments(&self, curve: &dyn YieldTermStructure) -> Result<SwaptionArguments> {
        let reference = curve.reference_date();
        let dates = self.exercise.dates();
        if let Some(early) = dates.iter().find(|d| **d < reference) {
            return Err(Error::InvalidSchedule(format!(
                "exercise date {early} precedes the curve reference date {reference}"
            )));
        }
        let exercise_times: Vec<Time> = dates.iter().map(|d| curve.time_from_reference(*d)).collect();

        let first = self.exercise.first_date();
        let sign = self.swap.swap_type().sign();
        let mut cash_flows = Vec::new();
        for c in self.swap.fixed_leg() {
            let reset = snap(c.accrual_start(), dates);
            if reset < first {
                continue;
            }
            cash_flows.push(SwaptionCashFlow {
                reset_time: curve.time_from_reference(reset),
                payment_time: curve.time_from_reference(c.payment_date().max(reset)),
                amount: -sign * c.amount(),
            });
        }
        for c in self.swap.floating_leg() {
            let reset = snap(c.accrual_start(), dates);
            if reset < first {
                continue;
            }
            let reset_time = curve.time_from_reference(reset);
            cash_flows.push(SwaptionCashFlow {
                reset_time,
                payment_time: reset_time,
                amount: sign * c.nominal(),
            });
            cash_flows.push(SwaptionCashFlow {
                reset_time,
                payment_time: curve.time_from_reference(c.payment_date().max(reset)),
                amount: sign * c.nominal() * (c.spread() * c.accrual_period() - 1.0),
            });
        }
        cash_flows.sort_by(|a, b| {
            a.reset_time
                .total_cmp(&b.reset_time)
                .then(a.payment_time.total_cmp(&b.payment_time))
        });

        Ok(SwaptionArguments {
            swap_type: self.swap.swap_type(),
            nominal: self.swap.nominal(),
            fixed_rate: self.swap.fixed_rate(),
            exercise_times,
            cash_flows,
        })
    }

    /// Price with a swaption engine.
    pub fn price<E: SwaptionEngine + ?Sized>(&self, engine: &E) -> Result<PricingResults> {
        let args = self.arguments(engine.term_structure().as_ref())?;
        tracing::debug!(
            exercise = %self.exercise,
            cash_flows = args.cash_flows.len(),
            "pricing swaption"
        );
        engine.calculate(&args)
    }
}

impl Instrument for BermudanSwaption {
    fn maturity_date(&self) -> Date {
        self.swap.maturity_date()
    }
}

/// The exercise date a coupon starting on `start` is attached to.
fn snap(start: Date, exercise_dates: &[Date]) -> Date {
    exercise_dates
        .iter()
        .find(|e| **e >= start)
        .filter(|e| **e - start <= SNAP_DAYS)
        .copied()
        .unwrap_or(start)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: u16, m: u8, day: u8) -> Date {
        Date::from_ymd(y, m, day).unwrap()
    }

    #[test]
    fn coupons_shortly_before_exercise_snap_to_it() {
        let exercise = [d(2027, 7, 20), d(2028, 7, 17)];
        assert_eq!(snap(d(2027, 7, 17), &exercise), d(2027, 7, 20));
        assert_eq!(snap(d(2027, 7, 13), &exercise), d(2027, 7, 20));
        assert_eq!(snap(d(2027, 7, 12), &exercise), d(2027, 7, 12));
        assert_eq!(snap(d(2027, 7, 21), &exercise), d(2027, 7, 21));
        assert_eq!(snap(d(2028, 7, 17), &exercise), d(2028, 7, 17));
        assert_eq!(snap(d(2029, 1, 17), &exercise), d(2029, 1, 17));
    }
}
