//! `FlatForward` — a yield term structure with a constant forward rate.
//!
//! The single continuously-compounded rate `r` applies for all maturities:
//! `P(t) = exp(-r·t)`. Rates are restricted to `[0, 1)`.

use crate::term_structure::TermStructure;
use crate::yield_term_structure::YieldTermStructure;
use bermudan_core::errors::{Error, Result};
use bermudan_core::{DiscountFactor, Rate, Time};
use bermudan_time::{Actual365Fixed, Date, DayCounter};
use std::sync::Arc;

/// A flat (constant) forward-rate yield term structure.
#[derive(Debug, Clone)]
pub struct FlatForward {
    reference_date: Date,
    day_counter: Arc<dyn DayCounter>,
    rate: Rate,
}

impl FlatForward {
    /// Create a flat curve with the given continuously-compounded rate.
    ///
    /// Fails with [`Error::InvalidCurve`] if `rate` is not in `[0, 1)`.
    pub fn new(reference_date: Date, rate: Rate, day_counter: Arc<dyn DayCounter>) -> Result<Self> {
        if !rate.is_finite() || !(0.0..1.0).contains(&rate) {
            return Err(Error::InvalidCurve(format!(
                "flat rate must lie in [0, 1), got {rate}"
            )));
        }
        Ok(Self {
            reference_date,
            day_counter,
            rate,
        })
    }

    /// Create a flat curve measuring time in Actual/365 (Fixed).
    pub fn continuous(reference_date: Date, rate: Rate) -> Result<Self> {
        Self::new(reference_date, rate, Arc::new(Actual365Fixed))
    }

    /// The continuously-compounded flat rate.
    pub fn rate(&self) -> Rate {
        self.rate
    }
}

impl TermStructure for FlatForward {
    fn reference_date(&self) -> Date {
        self.reference_date
    }

    fn day_counter(&self) -> &dyn DayCounter {
        &*self.day_counter
    }
}

impl YieldTermStructure for FlatForward {
    fn discount_impl(&self, t: Time) -> DiscountFactor {
        (-self.rate * t).exp()
    }

    fn forward_rate_impl(&self, _t: Time) -> Rate {
        self.rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    fn ref_date() -> Date {
        Date::from_ymd(2025, 7, 17).unwrap()
    }

    #[test]
    fn flat_forward_discount() {
        let curve = FlatForward::continuous(ref_date(), 0.05).unwrap();
        assert_eq!(curve.discount(0.0).unwrap(), 1.0);
        assert_abs_diff_eq!(curve.discount(1.0).unwrap(), (-0.05_f64).exp(), epsilon = 1e-15);
        assert_abs_diff_eq!(curve.discount(10.0).unwrap(), (-0.5_f64).exp(), epsilon = 1e-15);
    }

    #[test]
    fn one_year_discount_matches_rate() {
        let curve = FlatForward::continuous(ref_date(), 0.035).unwrap();
        let one_year = Date::from_ymd(2026, 7, 17).unwrap();
        assert_abs_diff_eq!(
            curve.discount_at(one_year).unwrap(),
            (-0.035_f64).exp(),
            epsilon = 1e-3
        );
    }

    #[test]
    fn rates_are_flat() {
        let curve = FlatForward::continuous(ref_date(), 0.04).unwrap();
        assert_abs_diff_eq!(curve.zero_rate(0.0).unwrap(), 0.04, epsilon = 1e-15);
        assert_abs_diff_eq!(curve.zero_rate(5.0).unwrap(), 0.04, epsilon = 1e-15);
        assert_abs_diff_eq!(curve.forward_rate(1.0, 3.0).unwrap(), 0.04, epsilon = 1e-14);
        assert_abs_diff_eq!(curve.instantaneous_forward(2.0).unwrap(), 0.04, epsilon = 1e-15);
    }

    #[test]
    fn rate_outside_unit_interval_is_invalid() {
        for r in [-0.01, 1.0, 1.5, f64::NAN, f64::INFINITY] {
            assert!(
                matches!(FlatForward::continuous(ref_date(), r), Err(Error::InvalidCurve(_))),
                "rate {r} should be rejected"
            );
        }
        assert!(FlatForward::continuous(ref_date(), 0.0).is_ok());
    }

    #[test]
    fn negative_time_is_invalid() {
        let curve = FlatForward::continuous(ref_date(), 0.03).unwrap();
        assert!(matches!(curve.discount(-0.1), Err(Error::InvalidCurve(_))));
        assert!(matches!(curve.forward_rate(2.0, 1.0), Err(Error::InvalidCurve(_))));
        let before = Date::from_ymd(2025, 7, 1).unwrap();
        assert!(matches!(curve.discount_at(before), Err(Error::InvalidCurve(_))));
    }

    proptest! {
        #[test]
        fn discount_at_zero_is_exactly_one(r in 0.0f64..0.999) {
            let curve = FlatForward::continuous(ref_date(), r).unwrap();
            prop_assert_eq!(curve.discount(0.0).unwrap(), 1.0);
        }

        #[test]
        fn discount_is_non_increasing(r in 0.0f64..0.5, t in 0.0f64..30.0, dt in 0.0f64..5.0) {
            let curve = FlatForward::continuous(ref_date(), r).unwrap();
            prop_assert!(curve.discount(t + dt).unwrap() <= curve.discount(t).unwrap());
        }
    }
}
