//! Builder for the standard forward-starting vanilla swap.
//!
//! Defaults: start one year after settlement, five-year tenor, payer, unit
//! notional. Fixed leg annual, unadjusted, 30/360 (European); floating leg
//! semiannual, Modified Following, Actual/360; TARGET calendar. Both legs
//! are generated forward from the start, so a maturity rolled off a weekend
//! leaves a short final stub on the unadjusted fixed leg.

use crate::swap::{SwapType, VanillaSwap};
use bermudan_core::errors::{Error, Result};
use bermudan_core::{Rate, Real};
use bermudan_time::{
    Actual360, BusinessDayConvention, Calendar, Date, DateGeneration, DayCounter, Period,
    ScheduleBuilder, Target, Thirty360,
};
use std::sync::Arc;

/// Builder for a [`VanillaSwap`] starting a forward period after settlement.
#[derive(Debug, Clone)]
pub struct MakeVanillaSwap {
    settlement: Date,
    forward_start: Period,
    tenor: Period,
    swap_type: SwapType,
    nominal: Real,
    fixed_rate: Rate,
    spread: Rate,
    calendar: Arc<dyn Calendar>,
    fixed_tenor: Period,
    floating_tenor: Period,
    fixed_convention: BusinessDayConvention,
    floating_convention: BusinessDayConvention,
    fixed_day_counter: Arc<dyn DayCounter>,
    floating_day_counter: Arc<dyn DayCounter>,
}

impl MakeVanillaSwap {
    /// Begin building a swap from `settlement`.
    pub fn new(settlement: Date) -> Self {
        Self {
            settlement,
            forward_start: Period::years(1),
            tenor: Period::years(5),
            swap_type: SwapType::Payer,
            nominal: 1.0,
            fixed_rate: 0.0,
            spread: 0.0,
            calendar: Arc::new(Target),
            fixed_tenor: Period::years(1),
            floating_tenor: Period::months(6),
            fixed_convention: BusinessDayConvention::Unadjusted,
            floating_convention: BusinessDayConvention::ModifiedFollowing,
            fixed_day_counter: Arc::new(Thirty360::european()),
            floating_day_counter: Arc::new(Actual360),
        }
    }

    /// Delay between settlement and the swap start.
    pub fn with_forward_start(mut self, forward_start: Period) -> Self {
        self.forward_start = forward_start;
        self
    }

    /// Length of the swap from its start.
    pub fn with_tenor(mut self, tenor: Period) -> Self {
        self.tenor = tenor;
        self
    }

    /// Payer or receiver.
    pub fn with_type(mut self, swap_type: SwapType) -> Self {
        self.swap_type = swap_type;
        self
    }

    /// Notional of both legs.
    pub fn with_nominal(mut self, nominal: Real) -> Self {
        self.nominal = nominal;
        self
    }

    /// Fixed coupon rate.
    pub fn with_fixed_rate(mut self, fixed_rate: Rate) -> Self {
        self.fixed_rate = fixed_rate;
        self
    }

    /// Spread over the floating index.
    pub fn with_spread(mut self, spread: Rate) -> Self {
        self.spread = spread;
        self
    }

    /// Calendar for the start date and both schedules.
    pub fn with_calendar(mut self, calendar: Arc<dyn Calendar>) -> Self {
        self.calendar = calendar;
        self
    }

    /// Coupon tenor of the fixed leg.
    pub fn with_fixed_leg_tenor(mut self, tenor: Period) -> Self {
        self.fixed_tenor = tenor;
        self
    }

    /// Coupon tenor of the floating leg.
    pub fn with_floating_leg_tenor(mut self, tenor: Period) -> Self {
        self.floating_tenor = tenor;
        self
    }

    /// Accrual day counter of the fixed leg.
    pub fn with_fixed_day_counter(mut self, day_counter: Arc<dyn DayCounter>) -> Self {
        self.fixed_day_counter = day_counter;
        self
    }

    /// Accrual day counter of the floating leg.
    pub fn with_floating_day_counter(mut self, day_counter: Arc<dyn DayCounter>) -> Self {
        self.floating_day_counter = day_counter;
        self
    }

    /// Swap start: settlement advanced by the forward period.
    pub fn effective_date(&self) -> Result<Date> {
        self.calendar.advance(
            self.settlement,
            self.forward_start,
            BusinessDayConvention::ModifiedFollowing,
            false,
        )
    }

    /// Swap end: the start advanced by the tenor.
    pub fn termination_date(&self) -> Result<Date> {
        self.calendar.advance(
            self.effective_date()?,
            self.tenor,
            BusinessDayConvention::ModifiedFollowing,
            false,
        )
    }

    /// Build the swap.
    pub fn build(self) -> Result<VanillaSwap> {
        if !(self.nominal.is_finite() && self.nominal > 0.0) {
            return Err(Error::InvalidArgument(format!(
                "swap notional must be positive, got {}",
                self.nominal
            )));
        }
        let start = self.effective_date()?;
        let end = self.termination_date()?;
        let fixed_schedule = ScheduleBuilder::new(start, end, self.fixed_tenor, &*self.calendar)
            .with_convention(self.fixed_convention)
            .with_termination_convention(self.fixed_convention)
            .with_rule(DateGeneration::Forward)
            .build()?;
        let floating_schedule =
            ScheduleBuilder::new(start, end, self.floating_tenor, &*self.calendar)
                .with_convention(self.floating_convention)
                .with_termination_convention(self.floating_convention)
                .with_rule(DateGeneration::Forward)
                .build()?;
        tracing::debug!(
            %start,
            %end,
            fixed_coupons = fixed_schedule.size() - 1,
            floating_coupons = floating_schedule.size() - 1,
            "built vanilla swap schedules"
        );
        Ok(VanillaSwap::new(
            self.swap_type,
            self.nominal,
            &fixed_schedule,
            self.fixed_rate,
            &*self.fixed_day_counter,
            &floating_schedule,
            self.spread,
            &*self.floating_day_counter,
        ))
    }
}
