// crates/ballast-vault/src/seizure.rs
//
// Seizure planning: how a requested grain amount is carved out of the
// vault's custody.
//
// Unallocated revenue is taken first (it has no claimant). Any remainder
// splits across the stake and draft pools in proportion to their backing,
// with the stake side floored and the residual assigned to the draft side
// so rounding dust can neither leak nor drive a pool negative.

use serde::{Deserialize, Serialize};

use ballast_core::{mul_div_floor, BallastError, Grain, Result};

/// How a seizure is split across the vault's three sources of grain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeizurePlan {
    /// Taken from undistributed revenue.
    pub from_unallocated: Grain,
    /// Taken from the stake pool's backing.
    pub from_stake: Grain,
    /// Taken from the current draft era's backing.
    pub from_drafts: Grain,
}

impl SeizurePlan {
    /// The full seized amount.
    pub fn total(&self) -> Grain {
        self.from_unallocated + self.from_stake + self.from_drafts
    }
}

/// Split `amount` across unallocated revenue and the two pools.
///
/// # Errors
/// Returns `InvalidArgument` for a zero amount or one exceeding the sum of
/// the three sources.
pub fn plan_seizure(
    amount: Grain,
    unallocated: Grain,
    stake_backing: Grain,
    draft_backing: Grain,
) -> Result<SeizurePlan> {
    if amount == 0 {
        return Err(BallastError::InvalidArgument(
            "cannot seize zero".to_string(),
        ));
    }
    let available = unallocated
        .checked_add(stake_backing)
        .and_then(|v| v.checked_add(draft_backing))
        .ok_or_else(|| BallastError::Arithmetic("custody overflow".to_string()))?;
    if amount > available {
        return Err(BallastError::InvalidArgument(format!(
            "seizure of {} grain exceeds the {} grain held",
            amount, available
        )));
    }

    let from_unallocated = amount.min(unallocated);
    let remainder = amount - from_unallocated;
    if remainder == 0 {
        return Ok(SeizurePlan {
            from_unallocated,
            from_stake: 0,
            from_drafts: 0,
        });
    }

    // remainder <= stake_backing + draft_backing, so the denominator is
    // nonzero here
    let pools = stake_backing + draft_backing;
    let mut from_stake = mul_div_floor(remainder, stake_backing, pools)?;
    let mut from_drafts = remainder - from_stake;
    if from_drafts > draft_backing {
        from_stake += from_drafts - draft_backing;
        from_drafts = draft_backing;
    }

    Ok(SeizurePlan {
        from_unallocated,
        from_stake,
        from_drafts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ballast_core::GRAIN_PER_BLST;
    use proptest::prelude::*;

    #[test]
    fn test_zero_amount_rejected() {
        assert!(plan_seizure(0, 10, 10, 10).is_err());
    }

    #[test]
    fn test_amount_above_custody_rejected() {
        assert!(plan_seizure(31, 10, 10, 10).is_err());
        assert!(plan_seizure(30, 10, 10, 10).is_ok());
    }

    #[test]
    fn test_unallocated_absorbs_first() {
        let plan = plan_seizure(8, 10, 100, 100).unwrap();
        assert_eq!(plan.from_unallocated, 8);
        assert_eq!(plan.from_stake, 0);
        assert_eq!(plan.from_drafts, 0);
    }

    #[test]
    fn test_remainder_splits_proportionally() {
        // stake:draft backing = 3:1, remainder 40 after unallocated
        let plan = plan_seizure(50, 10, 300, 100).unwrap();
        assert_eq!(plan.from_unallocated, 10);
        assert_eq!(plan.from_stake, 30);
        assert_eq!(plan.from_drafts, 10);
    }

    #[test]
    fn test_full_depletion() {
        let stake = 1000 * GRAIN_PER_BLST;
        let drafts = 250 * GRAIN_PER_BLST;
        let plan = plan_seizure(stake + drafts, 0, stake, drafts).unwrap();
        assert_eq!(plan.from_stake, stake);
        assert_eq!(plan.from_drafts, drafts);
    }

    #[test]
    fn test_empty_draft_pool_goes_all_to_stake() {
        let plan = plan_seizure(70, 20, 100, 0).unwrap();
        assert_eq!(plan.from_unallocated, 20);
        assert_eq!(plan.from_stake, 50);
        assert_eq!(plan.from_drafts, 0);
    }

    proptest! {
        #[test]
        fn plan_conserves_and_clamps(
            unallocated in 0u128..=u128::MAX / 4,
            stake in 0u128..=u128::MAX / 4,
            drafts in 0u128..=u128::MAX / 4,
            seed in any::<u128>(),
        ) {
            let available = unallocated + stake + drafts;
            prop_assume!(available > 0);
            let amount = seed % available + 1;
            let plan = plan_seizure(amount, unallocated, stake, drafts).unwrap();
            prop_assert_eq!(plan.total(), amount);
            prop_assert!(plan.from_unallocated <= unallocated);
            prop_assert!(plan.from_stake <= stake);
            prop_assert!(plan.from_drafts <= drafts);
            // unallocated is drawn down before either pool is touched
            if plan.from_stake > 0 || plan.from_drafts > 0 {
                prop_assert_eq!(plan.from_unallocated, unallocated);
            }
        }
    }
}
