// crates/ballast-core/src/lib.rs
//
// ballast-core: Core types, fixed-point math, and collaborator traits for
// the Ballast Protocol.
//
// This is the leaf crate that all other crates in the workspace depend on.
// It defines the monetary unit types, the protocol-wide error enum, the
// 18-decimal fixed-point representation used by every rate in the system,
// the compounding decay primitive shared by the staking vault and the
// revenue melter, and the trait interfaces to external collaborators.

pub mod decay;
pub mod error;
pub mod fixed;
pub mod identity;
pub mod token;
pub mod traits;

// Re-export key types for ergonomic access from downstream crates.
// Usage: `use ballast_core::Fix;`

// Monetary units
pub use token::{Blst, Grain, Shares, GRAIN_PER_BLST};

// Fixed-point math
pub use fixed::{mul_div_ceil, mul_div_floor, Fix, FIX_ONE};

// Decay primitive
pub use decay::decay;

// Identity
pub use identity::AccountId;

// Error type
pub use error::BallastError;

/// Convenience result alias used across the workspace.
pub type Result<T> = std::result::Result<T, BallastError>;

// Collaborator traits
pub use traits::{ProtocolEnv, StaticEnv};
