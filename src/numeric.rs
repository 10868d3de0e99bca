//! Numerically-stable summation and big-integer diagnostics.

use num_bigint::BigUint;
use num_traits::{Float, ToPrimitive};

/// Kahan-compensated sum of a sequence of floats.
///
/// Keeps a running compensation term so that the error of the total stays
/// bounded independently of the sequence length. Used when normalising
/// score vectors, where thousands of small probabilities are summed.
pub fn kahan_sum<F: Float>(values: impl IntoIterator<Item = F>) -> F {
    let mut sum = F::zero();
    let mut compensation = F::zero();
    for value in values {
        let y = value - compensation;
        let t = sum + y;
        compensation = (t - sum) - y;
        sum = t;
    }
    sum
}

/// Base-2 logarithm of an arbitrary-precision rank.
///
/// Ranks against real key sizes exceed what `f64` can hold, but reporting
/// them in bits only needs the leading digits: the result is computed from
/// the top 53 bits and is exact to double precision. Returns negative
/// infinity for zero.
pub fn approx_log2(value: &BigUint) -> f64 {
    let bits = value.bits();
    if bits == 0 {
        return f64::NEG_INFINITY;
    }
    let shift = bits.saturating_sub(u64::from(f64::MANTISSA_DIGITS));
    let top = (value >> shift).to_f64().unwrap_or(0.0);
    top.log2() + shift as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::One;

    #[test]
    fn test_kahan_sum_exact() {
        let values = [1.0f64, 2.0, 3.0, 4.0];
        assert_eq!(kahan_sum(values), 10.0);
    }

    #[test]
    fn test_kahan_sum_compensates() {
        // naive summation loses the small terms entirely
        let values = [1.0f64, 1e-16, 1e-16, 1e-16, 1e-16, 1e-16];
        let naive: f64 = values.iter().sum();
        let stable = kahan_sum(values.iter().copied());
        assert_eq!(naive, 1.0);
        assert!((stable - (1.0 + 5e-16)).abs() < 1e-16);
    }

    #[test]
    fn test_approx_log2_small() {
        assert_eq!(approx_log2(&BigUint::from(1u32)), 0.0);
        assert_eq!(approx_log2(&BigUint::from(2u32)), 1.0);
        assert_eq!(approx_log2(&BigUint::from(1024u32)), 10.0);
    }

    #[test]
    fn test_approx_log2_large() {
        let value = BigUint::one() << 200;
        assert_eq!(approx_log2(&value), 200.0);
        let value = (BigUint::one() << 200) + (BigUint::one() << 199);
        let expected = 200.0 + 1.5f64.log2();
        assert!((approx_log2(&value) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_approx_log2_zero() {
        assert_eq!(approx_log2(&BigUint::from(0u32)), f64::NEG_INFINITY);
    }
}
