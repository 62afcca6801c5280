//! Jamshidian's decomposition for European swaptions under Hull–White.
//!
//! At expiry `t` the underlying is a coupon bond in the single factor `x`:
//!
//! ```text
//! U(x) = c₀ + Σᵢ cᵢ·P(t, Tᵢ | x)
//! ```
//!
//! with every `cᵢ` of the same sign and `c₀` of the other. `U` is
//! monotone in `x`, so with `x*` its root and `Xᵢ = P(t, Tᵢ | x*)`,
//! `max(U, 0) = Σᵢ |cᵢ|·max(±(Pᵢ − Xᵢ), 0)`: a portfolio of zero-coupon
//! bond options, each priced in closed form.

use crate::discretized_swaption::check_arguments;
use bermudan_core::errors::{Error, Result};
use bermudan_core::{DiscountFactor, Real, Time};
use bermudan_instruments::{PricingEngine, PricingResults, SwaptionArguments, SwaptionEngine};
use bermudan_math::{brent_bracketing, normal_cdf};
use bermudan_models::{HullWhite, OneFactorModel};
use bermudan_termstructures::YieldTermStructure;
use std::sync::Arc;

/// Payment times closer than this are merged.
const TIME_TOLERANCE: Time = 1.0e-10;

/// Aggregated amounts smaller than this are dropped.
const AMOUNT_TOLERANCE: Real = 1.0e-14;

/// Closed-form European swaption engine for the Hull–White model.
#[derive(Debug, Clone)]
pub struct JamshidianSwaptionEngine {
    model: Arc<HullWhite>,
}

impl JamshidianSwaptionEngine {
    /// Create an engine for `model`.
    pub fn new(model: Arc<HullWhite>) -> Self {
        Self { model }
    }

    /// `ZBC(t, T, X)` (call) or `ZBP(t, T, X)` (put): an option expiring
    /// at `t` on the zero-coupon bond maturing at `maturity`.
    pub fn bond_option(&self, call: bool, strike: Real, expiry: Time, maturity: Time) -> Result<Real> {
        let curve = self.model.term_structure();
        let (p_t, p_big_t) = (curve.discount(expiry)?, curve.discount(maturity)?);
        let sigma_p = self.model.factor_process().variance_over(expiry).sqrt()
            * self.model.b_function(expiry, maturity);
        if sigma_p <= 0.0 {
            let forward = p_big_t - strike * p_t;
            return Ok(if call { forward.max(0.0) } else { (-forward).max(0.0) });
        }
        let h = (p_big_t / (p_t * strike)).ln() / sigma_p + 0.5 * sigma_p;
        Ok(if call {
            p_big_t * normal_cdf(h) - strike * p_t * normal_cdf(h - sigma_p)
        } else {
            strike * p_t * normal_cdf(-h + sigma_p) - p_big_t * normal_cdf(-h)
        })
    }
}

impl PricingEngine<SwaptionArguments> for JamshidianSwaptionEngine {
    fn calculate(&self, args: &SwaptionArguments) -> Result<PricingResults> {
        check_arguments(args)?;
        let &[expiry] = args.exercise_times.as_slice() else {
            return Err(Error::InvalidArgument(format!(
                "Jamshidian decomposition needs a single exercise time, got {}",
                args.exercise_times.len()
            )));
        };

        let (c0, flows) = aggregate(args, expiry);
        let sign = flows.first().map_or(0.0, |f| f.1.signum());
        if flows.is_empty() || flows.iter().any(|f| f.1.signum() != sign) || c0 * sign >= 0.0 {
            return Err(Error::Precondition(
                "underlying is not a coupon bond with a strike at expiry".into(),
            ));
        }

        // P(t, T | x) = A·exp(−B·x)
        let bonds: Vec<(DiscountFactor, Real)> = flows
            .iter()
            .map(|&(maturity, _)| {
                Ok((
                    self.model.discount_bond(expiry, maturity, 0.0)?,
                    self.model.b_function(expiry, maturity),
                ))
            })
            .collect::<Result<_>>()?;
        let underlying = |x: Real| -> Real {
            c0 + flows
                .iter()
                .zip(&bonds)
                .map(|(&(_, c), &(a, b))| c * a * (-b * x).exp())
                .sum::<Real>()
        };
        let critical = brent_bracketing(underlying, 0.0, 0.01, 1.0e-14)?;

        let mut npv = 0.0;
        for (&(maturity, c), &(a, b)) in flows.iter().zip(&bonds) {
            let strike = a * (-b * critical).exp();
            npv += c.abs() * self.bond_option(c > 0.0, strike, expiry, maturity)?;
        }
        tracing::debug!(expiry, critical, bonds = flows.len(), npv, "jamshidian decomposition");
        Ok(PricingResults::from_npv(npv).with_result("critical_factor", critical))
    }
}

impl SwaptionEngine for JamshidianSwaptionEngine {
    fn term_structure(&self) -> &Arc<dyn YieldTermStructure> {
        self.model.term_structure()
    }
}

/// The amount paid at expiry and the net amounts paid afterwards, by
/// payment time.
fn aggregate(args: &SwaptionArguments, expiry: Time) -> (Real, Vec<(Time, Real)>) {
    let mut c0 = 0.0;
    let mut flows: Vec<(Time, Real)> = Vec::new();
    for cf in &args.cash_flows {
        if cf.payment_time <= expiry + TIME_TOLERANCE {
            c0 += cf.amount;
        } else if let Some(f) = flows
            .iter_mut()
            .find(|f| (f.0 - cf.payment_time).abs() < TIME_TOLERANCE)
        {
            f.1 += cf.amount;
        } else {
            flows.push((cf.payment_time, cf.amount));
        }
    }
    flows.retain(|f| f.1.abs() > AMOUNT_TOLERANCE);
    flows.sort_by(|a, b| a.0.total_cmp(&b.0));
    (c0, flows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use bermudan_instruments::{SwapType, SwaptionCashFlow};
    use bermudan_termstructures::FlatForward;
    use bermudan_time::Date;

    fn flat_ts(rate: Real) -> Arc<dyn YieldTermStructure> {
        let ref_date = Date::from_ymd(2025, 7, 17).unwrap();
        Arc::new(FlatForward::continuous(ref_date, rate).unwrap())
    }

    fn engine() -> JamshidianSwaptionEngine {
        JamshidianSwaptionEngine::new(Arc::new(HullWhite::new(flat_ts(0.03), 0.1, 0.01).unwrap()))
    }

    fn swaption(swap_type: SwapType, strike: Real) -> SwaptionArguments {
        let sign = swap_type.sign();
        let mut cash_flows = vec![SwaptionCashFlow { reset_time: 1.0, payment_time: 1.0, amount: sign }];
        for k in 1..=3 {
            let t = 1.0 + k as Real;
            cash_flows.push(SwaptionCashFlow { reset_time: 1.0, payment_time: t, amount: -sign * strike });
        }
        cash_flows.push(SwaptionCashFlow { reset_time: 1.0, payment_time: 4.0, amount: -sign });
        SwaptionArguments {
            swap_type,
            nominal: 1.0,
            fixed_rate: strike,
            exercise_times: vec![1.0],
            cash_flows,
        }
    }

    #[test]
    fn bond_options_satisfy_put_call_parity() {
        let e = engine();
        let (t, maturity, strike) = (1.0, 4.0, 0.92);
        let call = e.bond_option(true, strike, t, maturity).unwrap();
        let put = e.bond_option(false, strike, t, maturity).unwrap();
        let forward = (-0.03_f64 * maturity).exp() - strike * (-0.03_f64 * t).exp();
        assert_abs_diff_eq!(call - put, forward, epsilon = 1e-14);
        assert!(call > 0.0 && put > 0.0);
    }

    #[test]
    fn payer_receiver_parity() {
        let e = engine();
        let strike = 0.031;
        let payer = e.calculate(&swaption(SwapType::Payer, strike)).unwrap().npv;
        let receiver = e.calculate(&swaption(SwapType::Receiver, strike)).unwrap().npv;
        let annuity: Real = (2..=4).map(|k| (-0.03 * k as Real).exp()).sum();
        let forward_swap = (-0.03_f64).exp() - (-0.12_f64).exp() - strike * annuity;
        assert_abs_diff_eq!(payer - receiver, forward_swap, epsilon = 1e-12);
    }

    #[test]
    fn critical_factor_zeroes_the_underlying() {
        let e = engine();
        let args = swaption(SwapType::Payer, 0.03);
        let x = e.calculate(&args).unwrap().result("critical_factor").unwrap();
        let value: Real = args
            .cash_flows
            .iter()
            .map(|cf| cf.amount * e.model.discount_bond(1.0, cf.payment_time, x).unwrap())
            .sum();
        assert_abs_diff_eq!(value, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn bermudan_exercise_is_rejected() {
        let mut args = swaption(SwapType::Payer, 0.03);
        args.exercise_times.push(2.0);
        assert!(matches!(engine().calculate(&args), Err(Error::InvalidArgument(_))));
    }
}
