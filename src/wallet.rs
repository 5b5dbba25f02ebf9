//! Wallet key loading.
//!
//! The payer comes from a base58-encoded secret key (env or config) or a JSON
//! byte-array keypair file; sniper keys are base58 strings in config. Decoded
//! secret buffers are zeroized before they are dropped.

use anyhow::{bail, Context, Result};
use solana_sdk::signature::Keypair;
use std::sync::Arc;
use zeroize::Zeroize;

use crate::config::{SniperEntry, WalletSettings};
use crate::coordinator::Sniper;

/// Decode a base58-encoded 64-byte secret key.
pub fn keypair_from_base58(encoded: &str) -> Result<Keypair> {
    let mut bytes = bs58::decode(encoded.trim())
        .into_vec()
        .context("private key is not valid base58")?;
    let keypair = keypair_from_bytes(&bytes);
    bytes.zeroize();
    keypair
}

/// Load a keypair from a JSON byte-array file (the standard CLI id.json shape).
pub fn keypair_from_json_file(path: &str) -> Result<Keypair> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read keypair file: {}", path))?;
    let mut bytes: Vec<u8> =
        serde_json::from_str(&content).context("keypair file is not a JSON byte array")?;
    let keypair = keypair_from_bytes(&bytes);
    bytes.zeroize();
    keypair
}

fn keypair_from_bytes(bytes: &[u8]) -> Result<Keypair> {
    if bytes.len() != 64 {
        bail!("expected a 64-byte secret key, got {} bytes", bytes.len());
    }
    if bytes.iter().all(|&b| b == 0) {
        bail!("invalid keypair: all-zero key rejected");
    }
    Keypair::try_from(bytes).context("invalid secret key bytes")
}

/// Resolve the payer credential: inline base58 key first (which the env
/// overlay may have set), keypair file second.
pub fn load_payer(settings: &WalletSettings) -> Result<Keypair> {
    if let Some(key) = &settings.payer_key {
        return keypair_from_base58(key).context("invalid payer key");
    }
    if let Some(path) = &settings.keypair_path {
        return keypair_from_json_file(path);
    }
    bail!("no payer credential configured: set wallet.payer_key (or PAYER_KEY) or wallet.keypair_path")
}

/// Decode every configured sniper entry into a ready-to-sign wallet.
pub fn load_snipers(entries: &[SniperEntry]) -> Result<Vec<Sniper>> {
    entries
        .iter()
        .map(|entry| {
            let keypair = keypair_from_base58(&entry.private_key)
                .with_context(|| format!("invalid key for sniper '{}'", entry.name_tag))?;
            Ok(Sniper {
                name_tag: entry.name_tag.clone(),
                keypair: Arc::new(keypair),
                buy_amount_sol: entry.buy_amount,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::signer::Signer;
    use std::io::Write;

    fn encoded(keypair: &Keypair) -> String {
        bs58::encode(keypair.to_bytes()).into_string()
    }

    #[test]
    fn base58_round_trip() {
        let original = Keypair::new();
        let decoded = keypair_from_base58(&encoded(&original)).unwrap();
        assert_eq!(decoded.pubkey(), original.pubkey());
    }

    #[test]
    fn base58_rejects_all_zero_key() {
        let zeros = bs58::encode([0u8; 64]).into_string();
        let err = keypair_from_base58(&zeros).unwrap_err();
        assert!(err.to_string().contains("all-zero"));
    }

    #[test]
    fn base58_rejects_wrong_length() {
        let short = bs58::encode([1u8; 32]).into_string();
        assert!(keypair_from_base58(&short).is_err());
    }

    #[test]
    fn base58_rejects_garbage() {
        assert!(keypair_from_base58("not base58 at all!!!").is_err());
    }

    #[test]
    fn json_file_round_trip() {
        let original = Keypair::new();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", serde_json::to_string(&original.to_bytes().to_vec()).unwrap()).unwrap();

        let decoded = keypair_from_json_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(decoded.pubkey(), original.pubkey());
    }

    #[test]
    fn load_payer_prefers_inline_key() {
        let keypair = Keypair::new();
        let settings = WalletSettings {
            payer_key: Some(encoded(&keypair)),
            keypair_path: Some("/does/not/exist.json".to_string()),
        };
        assert_eq!(load_payer(&settings).unwrap().pubkey(), keypair.pubkey());
    }

    #[test]
    fn load_payer_requires_some_credential() {
        let settings = WalletSettings::default();
        assert!(load_payer(&settings).is_err());
    }

    #[test]
    fn load_snipers_decodes_entries() {
        let a = Keypair::new();
        let b = Keypair::new();
        let entries = vec![
            SniperEntry {
                name_tag: "alpha".to_string(),
                private_key: encoded(&a),
                buy_amount: 0.5,
            },
            SniperEntry {
                name_tag: "bravo".to_string(),
                private_key: encoded(&b),
                buy_amount: 1.0,
            },
        ];
        let snipers = load_snipers(&entries).unwrap();
        assert_eq!(snipers.len(), 2);
        assert_eq!(snipers[0].keypair.pubkey(), a.pubkey());
        assert_eq!(snipers[1].name_tag, "bravo");
    }

    #[test]
    fn load_snipers_names_the_bad_entry() {
        let entries = vec![SniperEntry {
            name_tag: "broken".to_string(),
            private_key: "garbage".to_string(),
            buy_amount: 0.5,
        }];
        let err = load_snipers(&entries).unwrap_err();
        assert!(err.to_string().contains("broken"));
    }
}
