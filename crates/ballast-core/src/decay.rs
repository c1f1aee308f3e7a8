// crates/ballast-core/src/decay.rs
//
// Compounding decay primitive shared by the staking vault's reward payout
// and the external revenue melter.
//
// `decay(amount, ratio, periods)` answers: after `periods` accrual periods
// in which a `ratio` fraction is handed out each period, how much of
// `amount` is still retained? The retained side always rounds UP, so the
// released side (`amount - decay(..)`) rounds down: rounding error accrues
// to the protocol, never to the recipient.

use crate::error::BallastError;
use crate::fixed::Fix;
use crate::token::Grain;

/// `amount * (1 - ratio)^periods`, rounded up.
///
/// Cost is O(log2 periods) fixed-point multiplications regardless of
/// `periods` (exponentiation by squaring), so period counts up to ~10^6
/// and beyond are fine. The retention factor exceeds its true value by
/// less than `2*periods` ULP of the 10^18 representation (see
/// `Fix::powu_up`), so the retained amount is high -- and the released
/// amount low -- by at most `amount * 2*periods / 10^18` grain plus one
/// grain for the final ceiling: a relative error below 2*10^-12 even at
/// a million periods.
///
/// # Arguments
/// - `amount` — The quantity subject to decay, in grain.
/// - `ratio` — Fraction handed out per period; must lie in `[0, 1]`.
/// - `periods` — Number of whole periods elapsed.
///
/// # Errors
/// Returns `BallastError::InvalidArgument` if `ratio` exceeds 1.0.
pub fn decay(amount: Grain, ratio: Fix, periods: u64) -> Result<Grain, BallastError> {
    if ratio > Fix::ONE {
        return Err(BallastError::InvalidArgument(format!(
            "decay ratio {} exceeds 1.0",
            ratio
        )));
    }
    if periods == 0 || amount == 0 {
        return Ok(amount);
    }
    // ratio <= ONE was checked above, so the subtraction cannot fail
    let retention = Fix::ONE
        .checked_sub(ratio)
        .ok_or_else(|| BallastError::Arithmetic("retention underflow".to_string()))?;
    let factor = retention.powu_up(periods)?;
    factor.mul_grain_ceil(amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::FIX_ONE;
    use crate::token::GRAIN_PER_BLST;
    use proptest::prelude::*;

    #[test]
    fn test_zero_periods_is_identity() {
        let ratio = Fix::from_ratio(1, 100).unwrap();
        assert_eq!(decay(12345, ratio, 0).unwrap(), 12345);
    }

    #[test]
    fn test_zero_ratio_retains_everything() {
        assert_eq!(decay(12345, Fix::ZERO, 1000).unwrap(), 12345);
    }

    #[test]
    fn test_full_ratio_retains_nothing() {
        assert_eq!(decay(12345, Fix::ONE, 1).unwrap(), 0);
    }

    #[test]
    fn test_ratio_above_one_rejected() {
        let ratio = Fix::from_raw(FIX_ONE + 1);
        assert!(decay(1, ratio, 1).is_err());
    }

    #[test]
    fn test_one_percent_single_period() {
        // 10 BLST decayed by 1% for one period retains exactly 9.9 BLST
        let amount = 10 * GRAIN_PER_BLST;
        let ratio = Fix::from_ratio(1, 100).unwrap();
        let retained = decay(amount, ratio, 1).unwrap();
        assert_eq!(retained, 9_900_000_000_000_000_000);
        // the released side is the exact complement
        assert_eq!(amount - retained, 100_000_000_000_000_000);
    }

    #[test]
    fn test_half_ratio_compounds() {
        // 50% per period over 3 periods: 1000 -> 125
        let ratio = Fix::from_ratio(1, 2).unwrap();
        assert_eq!(decay(1000, ratio, 3).unwrap(), 125);
    }

    #[test]
    fn test_million_periods_is_cheap() {
        let amount = 1_000_000 * GRAIN_PER_BLST;
        let ratio = Fix::from_raw(1_000_000_000); // 10^-9 per period
        let retained = decay(amount, ratio, 1_000_000).unwrap();
        assert!(retained <= amount);
        assert!(retained > amount / 2);
    }

    proptest! {
        #[test]
        fn decay_never_exceeds_amount(
            amount in 0u128..=u128::MAX / (FIX_ONE * 2),
            raw in 0u128..=FIX_ONE,
            periods in 0u64..10_000,
        ) {
            let retained = decay(amount, Fix::from_raw(raw), periods).unwrap();
            prop_assert!(retained <= amount);
        }

        #[test]
        fn decay_monotone_nonincreasing_in_periods(
            amount in 0u128..=u128::MAX / (FIX_ONE * 2),
            raw in 0u128..=FIX_ONE,
            periods in 0u64..1000,
        ) {
            let ratio = Fix::from_raw(raw);
            let a = decay(amount, ratio, periods).unwrap();
            let b = decay(amount, ratio, periods + 1).unwrap();
            // slack: both results carry up to ~2*periods ULP of factor
            // error, scaled by the amount
            let slack = (4 * periods as u128 + 4) * (amount / FIX_ONE + 1);
            prop_assert!(b <= a || b - a <= slack);
        }
    }
}
