// crates/ballast-vault/src/events.rs
//
// Events emitted by the vault for off-chain observers. The vault buffers
// them in order; the host drains the buffer after each call.

use serde::{Deserialize, Serialize};

use ballast_core::{AccountId, Fix, Grain, Shares};

use crate::pool::Era;

/// Which pool an `ExchangeRateSet` event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoolKind {
    Stake,
    Draft,
}

/// An observable state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// BLST entered the stake pool and shares were minted.
    Staked {
        account: AccountId,
        grain: Grain,
        shares: Shares,
    },
    /// Shares were burned and a draft was queued.
    UnstakingStarted {
        index: u64,
        era: Era,
        account: AccountId,
        grain: Grain,
        shares: Shares,
        available_at: u64,
    },
    /// A prefix of an account's draft queue was paid out.
    UnstakingCompleted {
        start_id: u64,
        end_id: u64,
        era: Era,
        account: AccountId,
        grain: Grain,
    },
    /// A single draft was reversed back into the stake pool.
    UnstakingCancelled {
        index: u64,
        era: Era,
        account: AccountId,
        grain: Grain,
        shares: Shares,
    },
    /// A pool's rate moved.
    ExchangeRateSet { pool: PoolKind, old: Fix, new: Fix },
    /// Revenue was paid into the stake pool.
    RewardsPaid { grain: Grain },
    /// The governance safety valve zeroed the stake pool.
    AllBalancesReset { era: Era },
    /// Governance changed the per-period reward ratio.
    RatioSet { old: Fix, new: Fix },
    /// Governance changed the unstaking delay.
    UnstakingDelaySet { old: u64, new: u64 },
    /// Governance changed the withdrawal leak.
    WithdrawalLeakSet { old: Fix, new: Fix },
    /// Receipt shares moved between accounts (zero address = mint/burn).
    Transfer {
        from: AccountId,
        to: AccountId,
        shares: Shares,
    },
    /// An allowance was set.
    Approval {
        owner: AccountId,
        spender: AccountId,
        shares: Shares,
    },
}
