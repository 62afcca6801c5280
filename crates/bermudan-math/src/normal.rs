//! Standard normal distribution.
//!
//! The cumulative distribution delegates to statrs' complementary error
//! function, which keeps full double precision in the tails.

use bermudan_core::Real;
use statrs::function::erf::erfc;
use std::f64::consts::{FRAC_1_SQRT_2, PI};

/// The standard normal probability density function.
///
/// `φ(x) = exp(-x²/2) / √(2π)`
#[inline]
pub fn normal_pdf(x: Real) -> Real {
    (-0.5 * x * x).exp() / (2.0 * PI).sqrt()
}

/// The standard normal cumulative distribution function
/// `Φ(x) = erfc(−x/√2) / 2`.
#[inline]
pub fn normal_cdf(x: Real) -> Real {
    0.5 * erfc(-x * FRAC_1_SQRT_2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    #[test]
    fn known_values() {
        assert_abs_diff_eq!(normal_cdf(0.0), 0.5, epsilon = 1e-15);
        assert_abs_diff_eq!(normal_cdf(1.959_963_984_540_054), 0.975, epsilon = 1e-11);
        assert_abs_diff_eq!(normal_cdf(-1.0), 0.158_655_253_931_457_05, epsilon = 1e-12);
        assert_abs_diff_eq!(normal_pdf(0.0), 0.398_942_280_401_432_7, epsilon = 1e-15);
    }

    proptest! {
        #[test]
        fn symmetric(x in -8.0f64..8.0) {
            prop_assert!((normal_cdf(x) + normal_cdf(-x) - 1.0).abs() < 1e-14);
        }
    }
}
