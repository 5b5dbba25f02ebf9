//! Error types shared across the launch and snipe pipeline
//!
//! Each component boundary gets its own enum so callers can match on the
//! failure class they actually care about. Everything converts into
//! `anyhow::Error` at the binary edge.

use thiserror::Error;

/// Failures of the pure trade-sizing computation.
///
/// These are precondition violations, never transient conditions: retrying
/// with the same inputs cannot succeed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SizeError {
    /// The configured spend amount is zero after conversion to lamports
    #[error("spend amount must be greater than zero")]
    ZeroSpend,

    /// Slippage must be a non-negative fraction
    #[error("slippage must be a non-negative fraction, got {0}")]
    NegativeSlippage(f64),

    /// A curve reserve is zero, the price ratio is undefined
    #[error("bonding curve reserve is zero (sol={sol_reserves}, token={token_reserves})")]
    EmptyReserves {
        sol_reserves: u64,
        token_reserves: u64,
    },

    /// The computed output does not fit in 64 bits
    #[error("sized amount overflows u64: {0}")]
    Overflow(String),
}

/// Failures of transaction assembly or submission. The standalone
/// confirmation poll reports a plain `bool` instead: "never confirmed" is an
/// expected outcome there, not an error.
#[derive(Error, Debug, Clone)]
pub enum SubmitError {
    /// Could not fetch a recent blockhash to anchor the transaction
    #[error("blockhash unavailable: {0}")]
    Blockhash(String),

    /// The RPC rejected the submission, or the transaction failed on chain
    #[error("submission failed: {0}")]
    Submission(String),
}

impl SubmitError {
    pub fn blockhash(reason: impl Into<String>) -> Self {
        Self::Blockhash(reason.into())
    }

    pub fn submission(reason: impl Into<String>) -> Self {
        Self::Submission(reason.into())
    }
}

/// Failures of the launch orchestrator, from metadata validation through the
/// create-transaction submission.
#[derive(Error, Debug)]
pub enum LaunchError {
    /// A metadata field violates the platform's limits
    #[error("invalid token metadata: {0}")]
    Validation(String),

    /// Metadata upload to the storage API failed
    #[error("metadata upload failed: {0}")]
    Upload(String),

    /// The configured vanity key could not be decoded
    #[error("invalid vanity key: {0}")]
    VanityKey(String),

    /// Sizing the dev buy failed
    #[error(transparent)]
    Size(#[from] SizeError),

    /// The create transaction could not be submitted
    #[error(transparent)]
    Submit(#[from] SubmitError),

    /// Wrapped error from external crates
    #[error("launch error: {0}")]
    External(#[from] anyhow::Error),
}

impl LaunchError {
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation(reason.into())
    }

    pub fn upload(reason: impl Into<String>) -> Self {
        Self::Upload(reason.into())
    }
}
