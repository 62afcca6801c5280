//! Discounting swap pricing engine.
//!
//! Prices interest-rate swaps by discounting all cash flows on each leg.

use std::sync::Arc;

use bermudan_core::errors::{Error, Result};
use bermudan_core::{Rate, Real};
use bermudan_instruments::{PricingEngine, PricingResults, SwapArguments, VanillaSwap};
use bermudan_termstructures::YieldTermStructure;

/// Discounting swap pricing engine.
///
/// The NPV of a vanilla swap is:
///
/// $$\text{NPV} = \phi \left(\sum_j c_j^{\text{flt}} d(t_j) -
///   \sum_i c_i^{\text{fix}} d(t_i)\right)$$
///
/// where $\phi = +1$ for a payer swap and $-1$ for a receiver. Floating
/// coupons are projected off the same curve. Cash flows paid on or before
/// the curve's reference date are ignored.
#[derive(Debug)]
pub struct DiscountingSwapEngine {
    discount_curve: Arc<dyn YieldTermStructure>,
}

impl DiscountingSwapEngine {
    /// Create a new engine with the given discount curve.
    pub fn new(discount_curve: Arc<dyn YieldTermStructure>) -> Self {
        Self { discount_curve }
    }

    /// The fixed rate that sets the swap's NPV to zero.
    pub fn fair_rate(&self, swap: &VanillaSwap) -> Result<Rate> {
        let results = swap.price(self)?;
        results
            .result("fair_rate")
            .ok_or_else(|| Error::Runtime("fair rate not computed".into()))
    }
}

impl PricingEngine<SwapArguments> for DiscountingSwapEngine {
    fn calculate(&self, args: &SwapArguments) -> Result<PricingResults> {
        let curve = self.discount_curve.as_ref();
        let reference = curve.reference_date();

        let mut fixed_npv = 0.0;
        let mut annuity = 0.0;
        for c in args.fixed_leg.iter().filter(|c| c.payment_date() > reference) {
            let df = curve.discount_at(c.payment_date())?;
            fixed_npv += c.amount() * df;
            annuity += c.nominal() * c.accrual_period() * df;
        }
        let mut floating_npv = 0.0;
        for c in args.floating_leg.iter().filter(|c| c.payment_date() > reference) {
            floating_npv += c.amount(curve)? * curve.discount_at(c.payment_date())?;
        }

        let npv = args.swap_type.sign() * (floating_npv - fixed_npv);
        let mut results = PricingResults::from_npv(npv)
            .with_result("fixed_leg_npv", fixed_npv)
            .with_result("floating_leg_npv", floating_npv)
            .with_result("fixed_leg_bps", annuity * 1.0e-4);
        if annuity > 0.0 {
            results = results.with_result("fair_rate", floating_npv / annuity);
        }
        Ok(results)
    }
}

/// Annuity-weighted fixed leg NPV per unit of rate.
pub fn annuity(results: &PricingResults) -> Option<Real> {
    results.result("fixed_leg_bps").map(|bps| bps * 1.0e4)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use bermudan_instruments::{MakeVanillaSwap, SwapType};
    use bermudan_termstructures::FlatForward;
    use bermudan_time::Date;

    fn flat_ts(rate: Real) -> Arc<dyn YieldTermStructure> {
        let ref_date = Date::from_ymd(2025, 7, 17).unwrap();
        Arc::new(FlatForward::continuous(ref_date, rate).unwrap())
    }

    fn swap(rate: Rate) -> VanillaSwap {
        MakeVanillaSwap::new(Date::from_ymd(2025, 7, 17).unwrap())
            .with_fixed_rate(rate)
            .build()
            .unwrap()
    }

    #[test]
    fn fair_rate_zeroes_the_npv() {
        let engine = DiscountingSwapEngine::new(flat_ts(0.035));
        let fair = engine.fair_rate(&swap(0.0)).unwrap();
        assert!(fair > 0.03 && fair < 0.04, "fair = {fair}");
        let at_par = swap(fair).price(&engine).unwrap();
        assert_abs_diff_eq!(at_par.npv, 0.0, epsilon = 1e-14);
    }

    #[test]
    fn payer_gains_when_floating_exceeds_fixed() {
        let engine = DiscountingSwapEngine::new(flat_ts(0.05));
        let payer = swap(0.03).price(&engine).unwrap();
        assert!(payer.npv > 0.0, "npv = {}", payer.npv);
        let receiver = swap(0.03).with_type(SwapType::Receiver).price(&engine).unwrap();
        assert_abs_diff_eq!(payer.npv + receiver.npv, 0.0, epsilon = 1e-14);
    }

    #[test]
    fn floating_leg_telescopes_to_start_and_end_discounts() {
        let curve = flat_ts(0.03);
        let engine = DiscountingSwapEngine::new(Arc::clone(&curve));
        let s = swap(0.02);
        let results = s.price(&engine).unwrap();
        let start = curve.discount_at(Date::from_ymd(2026, 7, 17).unwrap()).unwrap();
        let end = curve.discount_at(Date::from_ymd(2031, 7, 17).unwrap()).unwrap();
        assert_abs_diff_eq!(results.result("floating_leg_npv").unwrap(), start - end, epsilon = 1e-14);
        let a = annuity(&results).unwrap();
        assert_abs_diff_eq!(results.result("fixed_leg_npv").unwrap(), 0.02 * a, epsilon = 1e-14);
    }
}
