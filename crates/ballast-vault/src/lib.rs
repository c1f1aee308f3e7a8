// crates/ballast-vault/src/lib.rs
//
// ballast-vault: the $BLST staking/slashing vault for the Ballast Protocol.
//
// Stakers deposit BLST and receive stake shares whose value floats with an
// exchange rate; protocol revenue accrues to the rate through a compounding
// payout schedule, and the risk manager can seize staked capital to cover
// shortfalls elsewhere in the protocol. Exits pass through an era-versioned,
// time-delayed draft queue. All state lives in the single `Vault` aggregate;
// every mutation happens through `&mut Vault` under one reentrancy guard.

pub mod config;
pub mod drafts;
pub mod events;
pub mod ledger;
pub mod pool;
pub mod seizure;
pub mod vault;

// Re-export key types for ergonomic access from downstream crates.
// Usage: `use ballast_vault::Vault;`

// Vault aggregate
pub use vault::Vault;

// Configuration
pub use config::{
    VaultConfig, MAX_REWARD_RATIO, MAX_UNSTAKING_DELAY, MAX_WITHDRAWAL_LEAK,
    MIN_UNSTAKING_DELAY_PERIODS,
};

// Pools and eras
pub use pool::{DraftPool, Era, StakePool};

// Draft queues
pub use drafts::{DraftEntry, DraftEraState, DraftQueue};

// Ledger
pub use ledger::{ReceiptLedger, ALLOWANCE_MAX};

// Seizure planning
pub use seizure::{plan_seizure, SeizurePlan};

// Events
pub use events::{Event, PoolKind};
