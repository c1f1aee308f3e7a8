use thiserror::Error;

/// Protocol-wide error types for the Ballast Protocol.
///
/// Every failure aborts the whole call: there is no internal retry and no
/// partial commit. A caller that receives an error must resubmit the entire
/// operation.
#[derive(Debug, Error)]
pub enum BallastError {
    /// Malformed input: zero amount, zero/self address, out-of-bounds index,
    /// or a configuration value outside its governance bounds.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Caller is not the governance account or the designated risk manager.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The operation is gated off by protocol state: frozen, trading paused,
    /// basket not ready, withdrawal not yet available, or the stake rate on
    /// the wrong side of the safety band.
    #[error("State gate: {0}")]
    StateGate(String),

    /// Balance or allowance shortfall.
    #[error("Insufficient balance or allowance: {0}")]
    InsufficientBalance(String),

    /// A guarded entry point was re-entered while a mutation was pending.
    #[error("Reentrant call blocked")]
    ReentrancyBlocked,

    /// Checked-arithmetic overflow, underflow, or division by zero.
    #[error("Arithmetic error: {0}")]
    Arithmetic(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for BallastError {
    fn from(e: serde_json::Error) -> Self {
        BallastError::Serialization(e.to_string())
    }
}
