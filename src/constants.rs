//! Protocol addresses and ABI constants for the pump.fun bonding-curve program.
//!
//! Everything the on-chain protocol pins is gathered here and resolved once at
//! startup into a [`ProtocolAddresses`] value that gets injected into the
//! encoder and launcher. Components never read ambient globals.

use anyhow::{Context, Result};
use solana_sdk::pubkey;
use solana_sdk::pubkey::Pubkey;
use spl_associated_token_account::get_associated_token_address;
use std::str::FromStr;

/// 8-byte discriminator of the program's `buy` instruction (little-endian).
pub const BUY_DISCRIMINATOR: u64 = 16_927_863_322_537_952_870;

/// 8-byte discriminator of the program's `create` instruction.
pub const CREATE_DISCRIMINATOR: [u8; 8] = [0x18, 0x1e, 0xc8, 0x28, 0x05, 0x1c, 0x07, 0x77];

/// PDA seed for a token's bonding-curve account.
pub const BONDING_CURVE_SEED: &[u8] = b"bonding-curve";

/// PDA seed for the Metaplex metadata account.
pub const METADATA_SEED: &[u8] = b"metadata";

/// Virtual SOL reserves every curve starts with (lamports).
pub const INITIAL_VIRTUAL_SOL_RESERVES: u64 = 30_000_000_000;

/// Virtual token reserves every curve starts with (smallest unit).
pub const INITIAL_VIRTUAL_TOKEN_RESERVES: u64 = 1_073_000_000_000_000;

const PUMP_FUN_PROGRAM: Pubkey = pubkey!("6EF8rrecthR5Dkzon8Nwu78hRvfCKubJ14M5uBEwF6P");
const GLOBAL: Pubkey = pubkey!("4wTV1YmiEkRvAtNtsSGPtUrqRYQMe5SKy2uB4Jjaxnjf");
const FEE_RECIPIENT: Pubkey = pubkey!("CebN5WGQ4jvEPvsVU4EoHEpgzq1VV7AbicfhtW4xC9iM");
const EVENT_AUTHORITY: Pubkey = pubkey!("Ce6TQqeHC9p8KetsN6JsjHK7UTZk7nasjjnr7XxXp9F1");
const MINT_AUTHORITY: Pubkey = pubkey!("TSLvdd1pWpHVjahSpsvCXUbgwsL3JAcvokwaKt1eokM");
const MPL_TOKEN_METADATA: Pubkey = pubkey!("metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s");

/// Pinned accounts of the launch platform.
///
/// Defaults target mainnet; individual entries can be overridden from the
/// `[addresses]` config section so a program redeploy does not force a rebuild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolAddresses {
    /// The bonding-curve program itself.
    pub program: Pubkey,
    /// Global configuration account.
    pub global: Pubkey,
    /// Protocol fee recipient.
    pub fee_recipient: Pubkey,
    /// Event-authority account passed at the tail of every instruction.
    pub event_authority: Pubkey,
    /// Authority allowed to initialize new mints.
    pub mint_authority: Pubkey,
    /// Metaplex token-metadata program.
    pub metadata_program: Pubkey,
}

impl Default for ProtocolAddresses {
    fn default() -> Self {
        Self {
            program: PUMP_FUN_PROGRAM,
            global: GLOBAL,
            fee_recipient: FEE_RECIPIENT,
            event_authority: EVENT_AUTHORITY,
            mint_authority: MINT_AUTHORITY,
            metadata_program: MPL_TOKEN_METADATA,
        }
    }
}

impl ProtocolAddresses {
    /// Build the address set from optional base58 overrides, falling back to
    /// the pinned mainnet values for anything left unset.
    pub fn resolve(overrides: &AddressOverrides) -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            program: parse_override(&overrides.program, defaults.program, "addresses.program")?,
            global: parse_override(&overrides.global, defaults.global, "addresses.global")?,
            fee_recipient: parse_override(
                &overrides.fee_recipient,
                defaults.fee_recipient,
                "addresses.fee_recipient",
            )?,
            event_authority: parse_override(
                &overrides.event_authority,
                defaults.event_authority,
                "addresses.event_authority",
            )?,
            mint_authority: parse_override(
                &overrides.mint_authority,
                defaults.mint_authority,
                "addresses.mint_authority",
            )?,
            metadata_program: parse_override(
                &overrides.metadata_program,
                defaults.metadata_program,
                "addresses.metadata_program",
            )?,
        })
    }

    /// Derive the bonding-curve PDA for a mint.
    pub fn bonding_curve(&self, mint: &Pubkey) -> Pubkey {
        Pubkey::find_program_address(&[BONDING_CURVE_SEED, mint.as_ref()], &self.program).0
    }

    /// Derive the curve's token vault (its associated token account).
    pub fn associated_bonding_curve(&self, mint: &Pubkey) -> Pubkey {
        get_associated_token_address(&self.bonding_curve(mint), mint)
    }

    /// Derive the Metaplex metadata PDA for a mint.
    pub fn metadata_account(&self, mint: &Pubkey) -> Pubkey {
        Pubkey::find_program_address(
            &[
                METADATA_SEED,
                self.metadata_program.as_ref(),
                mint.as_ref(),
            ],
            &self.metadata_program,
        )
        .0
    }
}

/// Base58 override strings as they appear in the `[addresses]` config section.
#[derive(Debug, Clone, Default, serde::Deserialize, serde::Serialize)]
pub struct AddressOverrides {
    pub program: Option<String>,
    pub global: Option<String>,
    pub fee_recipient: Option<String>,
    pub event_authority: Option<String>,
    pub mint_authority: Option<String>,
    pub metadata_program: Option<String>,
}

fn parse_override(value: &Option<String>, default: Pubkey, field: &str) -> Result<Pubkey> {
    match value {
        Some(s) => Pubkey::from_str(s).with_context(|| format!("invalid pubkey in {}", field)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buy_discriminator_bytes() {
        // First byte of the LE encoding, as seen on the wire
        assert_eq!(BUY_DISCRIMINATOR.to_le_bytes()[0], 0x66);
        assert_eq!(BUY_DISCRIMINATOR.to_le_bytes().len(), 8);
    }

    #[test]
    fn resolve_defaults_when_no_overrides() {
        let resolved = ProtocolAddresses::resolve(&AddressOverrides::default()).unwrap();
        assert_eq!(resolved, ProtocolAddresses::default());
    }

    #[test]
    fn resolve_applies_override() {
        let overrides = AddressOverrides {
            fee_recipient: Some("11111111111111111111111111111111".to_string()),
            ..Default::default()
        };
        let resolved = ProtocolAddresses::resolve(&overrides).unwrap();
        assert_eq!(
            resolved.fee_recipient,
            Pubkey::from_str("11111111111111111111111111111111").unwrap()
        );
        assert_eq!(resolved.program, ProtocolAddresses::default().program);
    }

    #[test]
    fn resolve_rejects_garbage() {
        let overrides = AddressOverrides {
            program: Some("not-a-pubkey".to_string()),
            ..Default::default()
        };
        assert!(ProtocolAddresses::resolve(&overrides).is_err());
    }

    #[test]
    fn bonding_curve_derivation_is_deterministic() {
        let addrs = ProtocolAddresses::default();
        let mint = Pubkey::new_unique();
        assert_eq!(addrs.bonding_curve(&mint), addrs.bonding_curve(&mint));
        assert_ne!(addrs.bonding_curve(&mint), addrs.bonding_curve(&Pubkey::new_unique()));
    }
}
