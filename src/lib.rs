//! pumpsnipe - bonding-curve token launcher with coordinated multi-wallet snipe
//!
//! This library exposes core modules for testing and integration purposes.
//! The pipeline: the launcher creates the mint, the coordinator polls until
//! the market is live and then fans out one slippage-bounded buy per
//! configured sniper wallet, all against the same market snapshot.

pub mod config;
pub mod constants;
pub mod coordinator;
pub mod encoder;
pub mod errors;
pub mod launcher;
pub mod market;
pub mod sizer;
pub mod submitter;
pub mod wallet;

// Re-export commonly used types
pub use solana_sdk::{pubkey::Pubkey, signature::Signature};
