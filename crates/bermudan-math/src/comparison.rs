//! Comparison utilities.

use bermudan_core::Real;

/// Return `true` if `|a - b| <= epsilon`.
#[inline]
pub fn close(a: Real, b: Real, epsilon: Real) -> bool {
    (a - b).abs() <= epsilon
}

/// Return `true` if `a` and `b` agree within `n` units of relative machine
/// precision.
#[inline]
pub fn close_enough(a: Real, b: Real, n: u32) -> bool {
    if a == b {
        return true;
    }
    let eps = a.abs().max(b.abs()) * f64::EPSILON * n as f64;
    (a - b).abs() <= eps
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_basic() {
        assert!(close(1.0, 1.0 + 1e-11, 1e-10));
        assert!(!close(1.0, 1.0 + 1e-9, 1e-10));
    }

    #[test]
    fn close_enough_basic() {
        assert!(close_enough(1.0, 1.0, 10));
        assert!(close_enough(0.1 + 0.2, 0.3, 4));
        assert!(!close_enough(1.0, 1.0 + 1e-12, 10));
    }
}
