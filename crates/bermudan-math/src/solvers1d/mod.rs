//! 1D root-finding solvers.

use bermudan_core::{
    errors::{Error, Result},
    Real,
};

const MAX_ITERATIONS: u32 = 100;
const MAX_BRACKET_EXPANSIONS: u32 = 50;
const GROWTH_FACTOR: Real = 1.6;
const DEFAULT_ACCURACY: Real = 1.0e-11;

// ── Brent ─────────────────────────────────────────────────────────────────────

/// Brent's method for finding a root of `f(x)` in `[x_min, x_max]`.
///
/// Combines bisection, secant, and inverse quadratic interpolation. The
/// endpoints must bracket a root.
pub fn brent<F>(f: F, x_min: Real, x_max: Real, accuracy: Real) -> Result<Real>
where
    F: Fn(Real) -> Real,
{
    let fa = f(x_min);
    let fb = f(x_max);
    if !(fa.is_finite() && fb.is_finite()) {
        return Err(Error::Runtime(format!(
            "Brent: objective is not finite at the bracket [{x_min}, {x_max}]"
        )));
    }
    if fa * fb > 0.0 {
        return Err(Error::Precondition(format!(
            "Brent: f({x_min}) and f({x_max}) must have opposite signs"
        )));
    }
    solve_bracketed(&f, x_min, fa, x_max, fb, accuracy)
}

/// Brent's method starting from a guess: the bracket `[guess - step,
/// guess + step]` is widened geometrically until it contains a sign change.
pub fn brent_bracketing<F>(f: F, guess: Real, step: Real, accuracy: Real) -> Result<Real>
where
    F: Fn(Real) -> Real,
{
    let (mut lo, mut hi) = (guess - step, guess + step);
    let (mut f_lo, mut f_hi) = (f(lo), f(hi));
    for _ in 0..MAX_BRACKET_EXPANSIONS {
        if !(f_lo.is_finite() && f_hi.is_finite()) {
            break;
        }
        if f_lo * f_hi <= 0.0 {
            return solve_bracketed(&f, lo, f_lo, hi, f_hi, accuracy);
        }
        // Expand on the side whose value is smaller in magnitude.
        if f_lo.abs() < f_hi.abs() {
            lo -= GROWTH_FACTOR * (hi - lo);
            f_lo = f(lo);
        } else {
            hi += GROWTH_FACTOR * (hi - lo);
            f_hi = f(hi);
        }
    }
    Err(Error::Runtime(format!(
        "Brent: unable to bracket a root around {guess}, last bracket [{lo}, {hi}]"
    )))
}

fn solve_bracketed<F>(
    f: &F,
    x_min: Real,
    f_min: Real,
    x_max: Real,
    f_max: Real,
    accuracy: Real,
) -> Result<Real>
where
    F: Fn(Real) -> Real,
{
    let acc = if accuracy > 0.0 {
        accuracy
    } else {
        DEFAULT_ACCURACY
    };
    let (mut a, mut b) = (x_min, x_max);
    let (mut fa, mut fb) = (f_min, f_max);
    if fa == 0.0 {
        return Ok(a);
    }
    if fb == 0.0 {
        return Ok(b);
    }

    let mut c = b;
    let mut fc = fb;
    let mut d = b - a;
    let mut e = d;

    for _ in 0..MAX_ITERATIONS {
        if fb * fc > 0.0 {
            c = a;
            fc = fa;
            d = b - a;
            e = d;
        }
        if fc.abs() < fb.abs() {
            a = b;
            b = c;
            c = a;
            fa = fb;
            fb = fc;
            fc = fa;
        }
        let tol = 2.0 * f64::EPSILON * b.abs() + 0.5 * acc;
        let xm = 0.5 * (c - b);
        if xm.abs() <= tol || fb == 0.0 {
            return Ok(b);
        }
        if e.abs() >= tol && fa.abs() > fb.abs() {
            let s = fb / fa;
            let (p, q) = if a == c {
                (2.0 * xm * s, 1.0 - s)
            } else {
                let q = fa / fc;
                let r = fb / fc;
                (
                    s * (2.0 * xm * q * (q - r) - (b - a) * (r - 1.0)),
                    (q - 1.0) * (r - 1.0) * (s - 1.0),
                )
            };
            let (p, q) = if p > 0.0 { (p, -q) } else { (-p, q) };
            if 2.0 * p < (3.0 * xm * q - (tol * q).abs()) && 2.0 * p < (e * q).abs() {
                e = d;
                d = p / q;
            } else {
                d = xm;
                e = d;
            }
        } else {
            d = xm;
            e = d;
        }
        a = b;
        fa = fb;
        b += if d.abs() > tol {
            d
        } else if xm > 0.0 {
            tol
        } else {
            -tol
        };
        fb = f(b);
    }
    Err(Error::Runtime(
        "Brent solver: maximum iterations reached".into(),
    ))
}
