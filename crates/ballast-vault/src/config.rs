// crates/ballast-vault/src/config.rs
//
// Vault configuration and its governance bounds.
//
// Each governance-settable parameter is independently bounded so that no
// single proposal can disable exits or drain the reward pot in one period:
//   - unstaking delay: at least MIN_UNSTAKING_DELAY_PERIODS reward periods
//     (so at least one payout lands while a draft matures), at most a year
//   - reward ratio: at most 10% of the unallocated pot per period
//   - withdrawal leak: at most 30% of live capital between forced refreshes

use serde::{Deserialize, Serialize};

use ballast_core::{AccountId, BallastError, Fix, Result, FIX_ONE};

/// Minimum unstaking delay, expressed in reward periods.
pub const MIN_UNSTAKING_DELAY_PERIODS: u64 = 2;

/// Maximum unstaking delay: one year of seconds.
pub const MAX_UNSTAKING_DELAY: u64 = 31_536_000;

/// Maximum per-period reward ratio: 10%.
pub const MAX_REWARD_RATIO: Fix = Fix::from_raw(FIX_ONE / 10);

/// Maximum withdrawal leak: 30% of live capital may exit between forced
/// basket refreshes.
pub const MAX_WITHDRAWAL_LEAK: Fix = Fix::from_raw(3 * FIX_ONE / 10);

/// Default lower edge of the safe exchange-rate band: 10^-6.
pub const DEFAULT_MIN_SAFE_RATE: Fix = Fix::from_raw(FIX_ONE / 1_000_000);

/// Default upper edge of the safe exchange-rate band: 10^6.
pub const DEFAULT_MAX_SAFE_RATE: Fix = Fix::from_raw(1_000_000 * FIX_ONE);

/// Static configuration of a vault instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultConfig {
    /// The vault's own account in the host environment. Receipt transfers
    /// to this address are rejected.
    pub vault_address: AccountId,
    /// The governance account: parameter changes and the safety valve.
    pub governance: AccountId,
    /// The sole account allowed to seize staked capital.
    pub risk_manager: AccountId,
    /// Seconds between a draft's creation and its availability.
    pub unstaking_delay: u64,
    /// Seconds per reward-accrual period.
    pub reward_period: u64,
    /// Fraction of the unallocated pot paid out per period.
    pub reward_ratio: Fix,
    /// Cumulative withdrawal fraction below which the basket refresh is
    /// skipped.
    pub withdrawal_leak: Fix,
    /// Lower edge of the safe exchange-rate band.
    pub min_safe_rate: Fix,
    /// Upper edge of the safe exchange-rate band.
    pub max_safe_rate: Fix,
}

impl VaultConfig {
    /// Validate every parameter against its governance bound.
    ///
    /// # Errors
    /// Returns `BallastError::InvalidArgument` naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if self.vault_address.is_zero() {
            return Err(BallastError::InvalidArgument(
                "vault address must be nonzero".to_string(),
            ));
        }
        if self.governance.is_zero() {
            return Err(BallastError::InvalidArgument(
                "governance address must be nonzero".to_string(),
            ));
        }
        if self.risk_manager.is_zero() {
            return Err(BallastError::InvalidArgument(
                "risk manager address must be nonzero".to_string(),
            ));
        }
        if self.reward_period == 0 {
            return Err(BallastError::InvalidArgument(
                "reward period must be nonzero".to_string(),
            ));
        }
        check_unstaking_delay(self.unstaking_delay, self.reward_period)?;
        check_reward_ratio(self.reward_ratio)?;
        check_withdrawal_leak(self.withdrawal_leak)?;
        if self.min_safe_rate >= self.max_safe_rate {
            return Err(BallastError::InvalidArgument(
                "safe rate band is empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Bounds check for the unstaking delay against the reward period.
pub fn check_unstaking_delay(delay: u64, reward_period: u64) -> Result<()> {
    let min = MIN_UNSTAKING_DELAY_PERIODS.saturating_mul(reward_period);
    if delay < min {
        return Err(BallastError::InvalidArgument(format!(
            "unstaking delay {}s is below {} reward periods ({}s)",
            delay, MIN_UNSTAKING_DELAY_PERIODS, min
        )));
    }
    if delay > MAX_UNSTAKING_DELAY {
        return Err(BallastError::InvalidArgument(format!(
            "unstaking delay {}s exceeds the maximum of {}s",
            delay, MAX_UNSTAKING_DELAY
        )));
    }
    Ok(())
}

/// Bounds check for the per-period reward ratio.
pub fn check_reward_ratio(ratio: Fix) -> Result<()> {
    if ratio > MAX_REWARD_RATIO {
        return Err(BallastError::InvalidArgument(format!(
            "reward ratio {} exceeds the maximum of {}",
            ratio, MAX_REWARD_RATIO
        )));
    }
    Ok(())
}

/// Bounds check for the withdrawal leak.
pub fn check_withdrawal_leak(leak: Fix) -> Result<()> {
    if leak > MAX_WITHDRAWAL_LEAK {
        return Err(BallastError::InvalidArgument(format!(
            "withdrawal leak {} exceeds the maximum of {}",
            leak, MAX_WITHDRAWAL_LEAK
        )));
    }
    Ok(())
}
