// crates/ballast-core/src/fixed.rs
//
// 18-decimal unsigned fixed-point arithmetic over u128.
//
// Every rate in the protocol (exchange rate, draft rate, reward ratio,
// withdrawal leak) is a `Fix`: an integer scaled by 10^18. Products are
// computed through 256-bit intermediates so that a full-range u128 times
// a full-range u128 can never silently wrap. Rounding direction is always
// explicit at the call site; callers pick the direction that favors the
// protocol.

use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::BallastError;

/// The fixed-point scale: 1.0 == 10^18.
pub const FIX_ONE: u128 = 1_000_000_000_000_000_000;

fn narrow(value: U256, what: &str) -> Result<u128, BallastError> {
    if value > U256::from(u128::MAX) {
        return Err(BallastError::Arithmetic(format!("u128 overflow in {}", what)));
    }
    Ok(value.as_u128())
}

/// `floor(a * b / den)` with a 256-bit intermediate.
///
/// # Errors
/// Returns `BallastError::Arithmetic` on a zero denominator or if the
/// quotient does not fit in u128.
pub fn mul_div_floor(a: u128, b: u128, den: u128) -> Result<u128, BallastError> {
    if den == 0 {
        return Err(BallastError::Arithmetic("division by zero".to_string()));
    }
    let num = U256::from(a) * U256::from(b);
    narrow(num / U256::from(den), "mul_div_floor")
}

/// `ceil(a * b / den)` with a 256-bit intermediate.
///
/// # Errors
/// Returns `BallastError::Arithmetic` on a zero denominator or if the
/// quotient does not fit in u128.
pub fn mul_div_ceil(a: u128, b: u128, den: u128) -> Result<u128, BallastError> {
    if den == 0 {
        return Err(BallastError::Arithmetic("division by zero".to_string()));
    }
    let num = U256::from(a) * U256::from(b);
    let den = U256::from(den);
    let mut q = num / den;
    if num % den != U256::zero() {
        q = q + U256::from(1u8);
    }
    narrow(q, "mul_div_ceil")
}

/// An unsigned 18-decimal fixed-point value.
///
/// `Fix(10^18)` is 1.0. The representation is transparent for serde, so
/// rates persist as plain integers.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Fix(u128);

impl Fix {
    /// 0.0
    pub const ZERO: Fix = Fix(0);
    /// 1.0
    pub const ONE: Fix = Fix(FIX_ONE);
    /// The largest representable value, used to saturate rate views.
    pub const MAX: Fix = Fix(u128::MAX);

    /// Wrap a raw 10^18-scaled integer.
    pub const fn from_raw(raw: u128) -> Fix {
        Fix(raw)
    }

    /// The raw 10^18-scaled integer.
    pub const fn raw(self) -> u128 {
        self.0
    }

    /// `floor(num / den)` as a fixed-point value.
    ///
    /// # Errors
    /// Returns `BallastError::Arithmetic` on a zero denominator or overflow.
    pub fn from_ratio(num: u128, den: u128) -> Result<Fix, BallastError> {
        Ok(Fix(mul_div_floor(num, FIX_ONE, den)?))
    }

    /// `floor(num / den)` clamped to `Fix::MAX`; a zero denominator also
    /// saturates. For read-only rate views that must not fail.
    pub fn from_ratio_saturating(num: u128, den: u128) -> Fix {
        if den == 0 {
            return Fix::MAX;
        }
        let q = (U256::from(num) * U256::from(FIX_ONE)) / U256::from(den);
        if q > U256::from(u128::MAX) {
            Fix::MAX
        } else {
            Fix(q.as_u128())
        }
    }

    /// Checked fixed-point subtraction.
    pub fn checked_sub(self, rhs: Fix) -> Option<Fix> {
        self.0.checked_sub(rhs.0).map(Fix)
    }

    /// `ceil(self * rhs)`, rounding toward positive infinity.
    ///
    /// # Errors
    /// Returns `BallastError::Arithmetic` if the product exceeds `Fix::MAX`.
    pub fn mul_up(self, rhs: Fix) -> Result<Fix, BallastError> {
        Ok(Fix(mul_div_ceil(self.0, rhs.0, FIX_ONE)?))
    }

    /// `self^exp` by exponentiation-by-squaring, rounding up at every
    /// multiplication: at most `2*floor(log2(exp)) + 1` multiplications,
    /// never a per-period loop.
    ///
    /// Error bound, for bases <= 1.0: each multiplication rounds up by
    /// less than one ULP of the 10^18 representation, and an earlier
    /// deviation can at worst double at each subsequent squaring, so the
    /// result exceeds the true value by less than `2*exp` ULP. Even at
    /// `exp = 10^6` that is a relative error below 2*10^-12 near 1.0.
    ///
    /// # Errors
    /// Returns `BallastError::Arithmetic` if an intermediate square exceeds
    /// `Fix::MAX` (only possible for bases above 1.0).
    pub fn powu_up(self, mut exp: u64) -> Result<Fix, BallastError> {
        let mut base = self;
        let mut acc = Fix::ONE;
        loop {
            if exp & 1 == 1 {
                acc = acc.mul_up(base)?;
            }
            exp >>= 1;
            if exp == 0 {
                break;
            }
            base = base.mul_up(base)?;
        }
        Ok(acc)
    }

    /// `floor(amount * self)`: scale an integer amount down by this rate.
    ///
    /// # Errors
    /// Returns `BallastError::Arithmetic` on overflow.
    pub fn mul_grain_floor(self, amount: u128) -> Result<u128, BallastError> {
        mul_div_floor(amount, self.0, FIX_ONE)
    }

    /// `ceil(amount * self)`: scale an integer amount up by this rate.
    ///
    /// # Errors
    /// Returns `BallastError::Arithmetic` on overflow.
    pub fn mul_grain_ceil(self, amount: u128) -> Result<u128, BallastError> {
        mul_div_ceil(amount, self.0, FIX_ONE)
    }
}

impl fmt::Display for Fix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / FIX_ONE;
        let frac = self.0 % FIX_ONE;
        if frac == 0 {
            write!(f, "{}", whole)
        } else {
            let frac_str = format!("{:018}", frac);
            write!(f, "{}.{}", whole, frac_str.trim_end_matches('0'))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_mul_div_floor_exact() {
        assert_eq!(mul_div_floor(10, 20, 5).unwrap(), 40);
        assert_eq!(mul_div_floor(7, 3, 2).unwrap(), 10); // 21/2 floored
    }

    #[test]
    fn test_mul_div_ceil_rounds_up() {
        assert_eq!(mul_div_ceil(7, 3, 2).unwrap(), 11); // 21/2 ceiled
        assert_eq!(mul_div_ceil(10, 20, 5).unwrap(), 40); // exact stays exact
    }

    #[test]
    fn test_mul_div_zero_denominator() {
        assert!(mul_div_floor(1, 1, 0).is_err());
        assert!(mul_div_ceil(1, 1, 0).is_err());
    }

    #[test]
    fn test_mul_div_wide_intermediate() {
        // a * b overflows u128 but the quotient fits
        let a = u128::MAX / 2;
        assert_eq!(mul_div_floor(a, 4, 2).unwrap(), a * 2);
    }

    #[test]
    fn test_mul_div_overflowing_quotient() {
        assert!(mul_div_floor(u128::MAX, 3, 1).is_err());
    }

    #[test]
    fn test_from_ratio() {
        assert_eq!(Fix::from_ratio(1, 2).unwrap(), Fix::from_raw(FIX_ONE / 2));
        assert_eq!(Fix::from_ratio(3, 3).unwrap(), Fix::ONE);
        assert!(Fix::from_ratio(1, 0).is_err());
    }

    #[test]
    fn test_from_ratio_saturating() {
        assert_eq!(Fix::from_ratio_saturating(1, 0), Fix::MAX);
        assert_eq!(Fix::from_ratio_saturating(u128::MAX, 1), Fix::MAX);
        assert_eq!(Fix::from_ratio_saturating(1, 2), Fix::from_raw(FIX_ONE / 2));
    }

    #[test]
    fn test_powu_identities() {
        let half = Fix::from_raw(FIX_ONE / 2);
        assert_eq!(half.powu_up(0).unwrap(), Fix::ONE);
        assert_eq!(half.powu_up(1).unwrap(), half);
        assert_eq!(Fix::ONE.powu_up(1_000_000).unwrap(), Fix::ONE);
        // 0.5^2 == 0.25 exactly at this scale
        assert_eq!(half.powu_up(2).unwrap(), Fix::from_raw(FIX_ONE / 4));
    }

    #[test]
    fn test_powu_large_exponent_is_cheap_and_bounded() {
        // (1 - 10^-9)^10^6; must terminate immediately and stay below 1.0
        let base = Fix::from_raw(FIX_ONE - 1_000_000_000);
        let out = base.powu_up(1_000_000).unwrap();
        assert!(out < Fix::ONE);
        assert!(out > Fix::from_raw(FIX_ONE / 2));
    }

    #[test]
    fn test_mul_grain_rounding_directions() {
        let third = Fix::from_ratio(1, 3).unwrap();
        let down = third.mul_grain_floor(100).unwrap();
        let up = third.mul_grain_ceil(100).unwrap();
        assert_eq!(down, 33);
        assert_eq!(up, 34);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Fix::ONE), "1");
        assert_eq!(format!("{}", Fix::from_raw(FIX_ONE + FIX_ONE / 2)), "1.5");
        assert_eq!(format!("{}", Fix::from_raw(1)), "0.000000000000000001");
    }

    /// Floor-rounded counterpart of `powu_up`, used to bracket the true value.
    fn powu_down(base: Fix, mut exp: u64) -> Fix {
        let mut b = base;
        let mut acc = Fix::ONE;
        loop {
            if exp & 1 == 1 {
                acc = Fix::from_raw(mul_div_floor(acc.raw(), b.raw(), FIX_ONE).unwrap());
            }
            exp >>= 1;
            if exp == 0 {
                break;
            }
            b = Fix::from_raw(mul_div_floor(b.raw(), b.raw(), FIX_ONE).unwrap());
        }
        acc
    }

    proptest! {
        #[test]
        fn powu_up_brackets_true_value(raw in 0u128..=FIX_ONE, exp in 0u64..64) {
            let base = Fix::from_raw(raw);
            let up = base.powu_up(exp).unwrap();
            let down = powu_down(base, exp);
            // the true value lies between the floor- and ceil-rounded chains,
            // and each chain deviates by less than 2*exp ULP
            prop_assert!(up >= down);
            prop_assert!(up.raw() - down.raw() <= 4 * exp as u128 + 2);
        }

        #[test]
        fn powu_up_monotone_in_exponent(raw in 0u128..=FIX_ONE, exp in 0u64..1000) {
            // for bases <= 1, raising the exponent cannot increase the result
            // beyond the rounding slack of the two chains
            let base = Fix::from_raw(raw);
            let a = base.powu_up(exp).unwrap();
            let b = base.powu_up(exp + 1).unwrap();
            prop_assert!(b <= a || b.raw() - a.raw() <= 4 * (exp as u128 + 1) + 2);
        }

        #[test]
        fn mul_div_floor_le_ceil(a in any::<u128>(), b in any::<u128>(), den in 1u128..=u128::MAX) {
            if let (Ok(f), Ok(c)) = (mul_div_floor(a, b, den), mul_div_ceil(a, b, den)) {
                prop_assert!(f <= c);
                prop_assert!(c - f <= 1);
            }
        }
    }
}
