//! Fixed-for-floating interest-rate swaps.

use crate::coupon::{FixedRateCoupon, FloatingRateCoupon};
use crate::instrument::{Instrument, PricingEngine, PricingResults};
use bermudan_core::{errors::Result, Rate, Real};
use bermudan_time::{Date, DayCounter, Schedule};
use std::fmt;

/// Swap type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SwapType {
    /// Payer (pay fixed, receive floating).
    #[default]
    Payer,
    /// Receiver (receive fixed, pay floating).
    Receiver,
}

impl SwapType {
    /// +1 for Payer, −1 for Receiver.
    pub fn sign(self) -> Real {
        match self {
            SwapType::Payer => 1.0,
            SwapType::Receiver => -1.0,
        }
    }
}

impl fmt::Display for SwapType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwapType::Payer => f.write_str("payer"),
            SwapType::Receiver => f.write_str("receiver"),
        }
    }
}

/// Arguments for pricing a swap.
#[derive(Debug, Clone)]
pub struct SwapArguments {
    /// Swap type (payer/receiver).
    pub swap_type: SwapType,
    /// Fixed leg coupons.
    pub fixed_leg: Vec<FixedRateCoupon>,
    /// Floating leg coupons.
    pub floating_leg: Vec<FloatingRateCoupon>,
}

/// A standard fixed-for-floating interest rate swap.
#[derive(Debug, Clone, PartialEq)]
pub struct VanillaSwap {
    swap_type: SwapType,
    nominal: Real,
    fixed_rate: Rate,
    spread: Rate,
    fixed_leg: Vec<FixedRateCoupon>,
    floating_leg: Vec<FloatingRateCoupon>,
}

impl VanillaSwap {
    /// Create a new vanilla swap.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        swap_type: SwapType,
        nominal: Real,
        fixed_schedule: &Schedule,
        fixed_rate: Rate,
        fixed_day_counter: &dyn DayCounter,
        float_schedule: &Schedule,
        spread: Rate,
        float_day_counter: &dyn DayCounter,
    ) -> Self {
        Self {
            swap_type,
            nominal,
            fixed_rate,
            spread,
            fixed_leg: FixedRateCoupon::leg(fixed_schedule, nominal, fixed_rate, fixed_day_counter),
            floating_leg: FloatingRateCoupon::leg(float_schedule, nominal, spread, float_day_counter),
        }
    }

    /// The same swap with another fixed rate.
    pub fn with_fixed_rate(&self, fixed_rate: Rate) -> Self {
        Self {
            fixed_rate,
            fixed_leg: self.fixed_leg.iter().map(|c| c.with_rate(fixed_rate)).collect(),
            ..self.clone()
        }
    }

    /// The same swap on the other side.
    pub fn with_type(&self, swap_type: SwapType) -> Self {
        Self {
            swap_type,
            ..self.clone()
        }
    }

    /// Swap type (payer = pay fixed).
    pub fn swap_type(&self) -> SwapType {
        self.swap_type
    }

    /// Notional amount.
    pub fn nominal(&self) -> Real {
        self.nominal
    }

    /// Fixed leg coupon rate.
    pub fn fixed_rate(&self) -> Rate {
        self.fixed_rate
    }

    /// Floating leg spread.
    pub fn spread(&self) -> Rate {
        self.spread
    }

    /// The fixed leg coupons.
    pub fn fixed_leg(&self) -> &[FixedRateCoupon] {
        &self.fixed_leg
    }

    /// The floating leg coupons.
    pub fn floating_leg(&self) -> &[FloatingRateCoupon] {
        &self.floating_leg
    }

    /// First accrual start across both legs.
    pub fn start_date(&self) -> Date {
        let fixed = self.fixed_leg.iter().map(FixedRateCoupon::accrual_start);
        let floating = self.floating_leg.iter().map(FloatingRateCoupon::accrual_start);
        fixed.chain(floating).min().unwrap_or(Date::MIN)
    }

    /// Get engine arguments.
    pub fn arguments(&self) -> SwapArguments {
        SwapArguments {
            swap_type: self.swap_type,
            fixed_leg: self.fixed_leg.clone(),
            floating_leg: self.floating_leg.clone(),
        }
    }

    /// Price with a pricing engine.
    pub fn price(&self, engine: &dyn PricingEngine<SwapArguments>) -> Result<PricingResults> {
        engine.calculate(&self.arguments())
    }
}

impl Instrument for VanillaSwap {
    fn maturity_date(&self) -> Date {
        let fixed = self.fixed_leg.iter().map(FixedRateCoupon::payment_date);
        let floating = self.floating_leg.iter().map(FloatingRateCoupon::payment_date);
        fixed.chain(floating).max().unwrap_or(Date::MIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bermudan_time::{
        Actual360, BusinessDayConvention, NullCalendar, Period, ScheduleBuilder, Thirty360,
    };

    fn swap(start: Date, end: Date) -> VanillaSwap {
        let cal = NullCalendar;
        let fixed_schedule = ScheduleBuilder::new(start, end, Period::years(1), &cal)
            .with_convention(BusinessDayConvention::Unadjusted)
            .build()
            .unwrap();
        let float_schedule = ScheduleBuilder::new(start, end, Period::months(6), &cal)
            .build()
            .unwrap();
        VanillaSwap::new(
            SwapType::Payer,
            1_000_000.0,
            &fixed_schedule,
            0.03,
            &Thirty360::european(),
            &float_schedule,
            0.0,
            &Actual360,
        )
    }

    #[test]
    fn vanilla_swap_construction() {
        let start = Date::from_ymd(2025, 1, 15).unwrap();
        let end = Date::from_ymd(2030, 1, 15).unwrap();
        let swap = swap(start, end);
        assert_eq!(swap.fixed_leg().len(), 5); // 5 annual coupons
        assert_eq!(swap.floating_leg().len(), 10); // 10 semiannual coupons
        assert!((swap.nominal() - 1_000_000.0).abs() < 1e-15);
        assert_eq!(swap.start_date(), start);
        assert_eq!(swap.maturity_date(), end);
        assert!(swap.is_expired(end));
        assert!(!swap.is_expired(start));
    }

    #[test]
    fn fixed_rate_can_be_replaced() {
        let start = Date::from_ymd(2025, 1, 15).unwrap();
        let end = Date::from_ymd(2027, 1, 15).unwrap();
        let swap = swap(start, end).with_fixed_rate(0.05);
        assert_eq!(swap.fixed_rate(), 0.05);
        assert!(swap.fixed_leg().iter().all(|c| c.rate() == 0.05));
        assert_eq!(swap.with_type(SwapType::Receiver).swap_type(), SwapType::Receiver);
    }

    #[test]
    fn swap_type_sign() {
        assert!((SwapType::Payer.sign() - 1.0).abs() < 1e-15);
        assert!((SwapType::Receiver.sign() - (-1.0)).abs() < 1e-15);
        assert_eq!(SwapType::default().to_string(), "payer");
    }
}
