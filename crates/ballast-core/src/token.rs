// crates/ballast-core/src/token.rs
//
// $BLST (Ballast) token units and supply conventions.
//
// The smallest unit of $BLST is the "grain". 1 BLST = 10^18 grain. All
// internal accounting uses integer grain to avoid floating-point precision
// issues in economic calculations; at 18 decimals an f64 cannot even
// represent most balances exactly, so no float constructors are provided.
//
// Receipt-token balances (shares of the stake pool) use the same integer
// width but are a distinct unit: shares convert to grain only through a
// pool's exchange rate.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// Number of grain in one BLST. 1 BLST = 10^18 grain.
pub const GRAIN_PER_BLST: u128 = 1_000_000_000_000_000_000;

/// Type alias for grain — the smallest unit of $BLST.
pub type Grain = u128;

/// Type alias for stake-pool receipt shares.
///
/// Shares are not grain: they convert to grain only through the stake
/// pool's exchange rate.
pub type Shares = u128;

/// A $BLST (Ballast) token amount.
///
/// Wraps an amount in grain (the smallest denomination). Arithmetic is
/// performed in integer grain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Blst {
    /// Amount in grain (1 BLST = 10^18 grain).
    pub grain: Grain,
}

impl Blst {
    /// Create a Blst amount from a whole number of BLST.
    pub fn from_whole(amount: u64) -> Self {
        Self {
            grain: amount as u128 * GRAIN_PER_BLST,
        }
    }

    /// Create a Blst amount from a grain value.
    pub fn from_grain(grain: Grain) -> Self {
        Self { grain }
    }

    /// Returns zero BLST.
    pub fn zero() -> Self {
        Self { grain: 0 }
    }
}

impl Add for Blst {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            grain: self.grain + rhs.grain,
        }
    }
}

impl Sub for Blst {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            grain: self.grain.saturating_sub(rhs.grain),
        }
    }
}

impl fmt::Display for Blst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.grain / GRAIN_PER_BLST;
        let frac = self.grain % GRAIN_PER_BLST;
        if frac == 0 {
            write!(f, "{} BLST", whole)
        } else {
            // Display up to 18 decimal places, trimming trailing zeros
            let frac_str = format!("{:018}", frac);
            let trimmed = frac_str.trim_end_matches('0');
            write!(f, "{}.{} BLST", whole, trimmed)
        }
    }
}
