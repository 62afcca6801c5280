//! `YieldTermStructure` — yield / interest-rate term structures.
//!
//! Implementors provide the unchecked discount function; the trait layers
//! the checked public queries on top of it:
//!
//! * **discount factor** — `P(0,t)`
//! * **zero rate** — the continuously-compounded zero rate for maturity *t*
//! * **forward rate** — the continuously-compounded forward rate between two
//!   times, or the instantaneous forward rate at one time
//!
//! Every public query rejects negative or non-finite times with
//! [`Error::InvalidCurve`].

use crate::term_structure::TermStructure;
use bermudan_core::errors::{Error, Result};
use bermudan_core::{DiscountFactor, Rate, Time};
use bermudan_time::Date;

/// Small time step used for instantaneous forward rate computations.
const DT: Time = 1.0e-4;

/// A yield (interest-rate) term structure.
pub trait YieldTermStructure: TermStructure {
    // ── Low-level impl hooks ─────────────────────────────────────────────

    /// Return the discount factor for a time `t ≥ 0`.
    fn discount_impl(&self, t: Time) -> DiscountFactor;

    /// Return the instantaneous forward rate at time `t ≥ 0`.
    ///
    /// Default: central difference of `-ln P` around `t`.
    fn forward_rate_impl(&self, t: Time) -> Rate {
        let t1 = (t - DT / 2.0).max(0.0);
        let t2 = t1 + DT;
        (self.discount_impl(t1).ln() - self.discount_impl(t2).ln()) / DT
    }

    // ── Public interface ─────────────────────────────────────────────────

    /// Discount factor for a time.
    fn discount(&self, t: Time) -> Result<DiscountFactor> {
        check_time(t)?;
        Ok(self.discount_impl(t))
    }

    /// Discount factor for a date on or after the reference date.
    fn discount_at(&self, date: Date) -> Result<DiscountFactor> {
        let t = self.time_from_reference(date);
        if t < 0.0 {
            return Err(Error::InvalidCurve(format!(
                "{date} is before the reference date {}",
                self.reference_date()
            )));
        }
        Ok(self.discount_impl(t))
    }

    /// Continuously-compounded zero rate for maturity `t`. At `t = 0` this
    /// is the instantaneous forward rate.
    fn zero_rate(&self, t: Time) -> Result<Rate> {
        check_time(t)?;
        if t == 0.0 {
            return Ok(self.forward_rate_impl(0.0));
        }
        Ok(-self.discount_impl(t).ln() / t)
    }

    /// Continuously-compounded forward rate between `t1` and `t2`, derived
    /// from discount factors. Equal times give the instantaneous forward.
    fn forward_rate(&self, t1: Time, t2: Time) -> Result<Rate> {
        check_time(t1)?;
        check_time(t2)?;
        if t2 < t1 {
            return Err(Error::InvalidCurve(format!(
                "forward period is reversed: t1 = {t1} > t2 = {t2}"
            )));
        }
        if t2 == t1 {
            return Ok(self.forward_rate_impl(t1));
        }
        Ok((self.discount_impl(t1) / self.discount_impl(t2)).ln() / (t2 - t1))
    }

    /// Instantaneous forward rate `f(0, t)`.
    fn instantaneous_forward(&self, t: Time) -> Result<Rate> {
        check_time(t)?;
        Ok(self.forward_rate_impl(t))
    }
}

fn check_time(t: Time) -> Result<()> {
    if !t.is_finite() || t < 0.0 {
        return Err(Error::InvalidCurve(format!(
            "time must be finite and non-negative, got {t}"
        )));
    }
    Ok(())
}
