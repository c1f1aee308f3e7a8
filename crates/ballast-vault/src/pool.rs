// crates/ballast-vault/src/pool.rs
//
// Stake and draft pool counters.
//
// Each pool pairs a token-side total with the grain backing it; the ratio
// of the two is the pool's rate. Pools are versioned by era: a pool whose
// backing is fully depleted while its token-side total is nonzero is
// frozen and a fresh pool opens under the next era id.

use serde::{Deserialize, Serialize};

use ballast_core::{Fix, Grain, Shares};

/// A pool generation. A fresh era starts at the identity rate; a closed
/// era's counters are never mutated again except to settle claims created
/// before it closed.
pub type Era = u32;

/// The stake pool: receipt shares outstanding and the grain backing them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakePool {
    /// Receipt shares outstanding in this era.
    pub total_staked: Shares,
    /// Grain backing those shares.
    pub backing: Grain,
}

impl StakePool {
    /// The exchange rate: grain per share, identity for an empty pool.
    pub fn rate(&self) -> Fix {
        if self.total_staked == 0 {
            Fix::ONE
        } else {
            Fix::from_ratio_saturating(self.backing, self.total_staked)
        }
    }
}

/// The draft pool for one era: draft units outstanding and their backing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftPool {
    /// Draft units outstanding in this era.
    pub total_drafts: u128,
    /// Grain backing those drafts.
    pub backing: Grain,
}

impl DraftPool {
    /// Grain per draft unit, identity for an empty pool.
    pub fn rate(&self) -> Fix {
        if self.total_drafts == 0 {
            Fix::ONE
        } else {
            Fix::from_ratio_saturating(self.backing, self.total_drafts)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ballast_core::GRAIN_PER_BLST;

    #[test]
    fn test_empty_pool_has_identity_rate() {
        assert_eq!(StakePool::default().rate(), Fix::ONE);
        assert_eq!(DraftPool::default().rate(), Fix::ONE);
    }

    #[test]
    fn test_rate_tracks_backing() {
        let pool = StakePool {
            total_staked: 100 * GRAIN_PER_BLST,
            backing: 150 * GRAIN_PER_BLST,
        };
        assert_eq!(pool.rate(), Fix::from_ratio(3, 2).unwrap());
    }

    #[test]
    fn test_depleted_pool_rate_is_zero() {
        let pool = StakePool {
            total_staked: 100 * GRAIN_PER_BLST,
            backing: 0,
        };
        assert_eq!(pool.rate(), Fix::ZERO);
    }
}
