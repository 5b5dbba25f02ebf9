//! Configuration loading.
//!
//! Everything comes from a single TOML file; `from_file_with_env` additionally
//! overlays `RPC_URL` and `PAYER_KEY` from the environment (loaded via a
//! `.env` file when present) so secrets stay out of the config file.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::constants::AddressOverrides;
use crate::coordinator::SnipeParams;
use crate::market::DEFAULT_COIN_DATA_URL;

pub const DEFAULT_IPFS_URL: &str = "https://pump.fun/api/ipfs";

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Chain RPC settings
    pub rpc: RpcSettings,

    /// Read-API endpoints
    #[serde(default)]
    pub api: ApiSettings,

    /// Payer credential sources
    #[serde(default)]
    pub wallet: WalletSettings,

    /// Launch-phase settings (token metadata and create transaction)
    #[serde(default)]
    pub launch: LaunchSettings,

    /// Snipe-phase settings
    #[serde(default)]
    pub snipe: SnipeSettings,

    /// Sniper wallet entries
    #[serde(default)]
    pub snipers: Vec<SniperEntry>,

    /// Protocol address overrides (defaults target mainnet)
    #[serde(default)]
    pub addresses: AddressOverrides,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcSettings {
    /// RPC endpoint URL
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Coin-data endpoint polled for bonding-curve state
    #[serde(default = "default_coin_data_url")]
    pub coin_data_url: String,

    /// Metadata upload endpoint
    #[serde(default = "default_ipfs_url")]
    pub ipfs_url: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            coin_data_url: default_coin_data_url(),
            ipfs_url: default_ipfs_url(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WalletSettings {
    /// Base58-encoded 64-byte secret key (overridable via PAYER_KEY)
    pub payer_key: Option<String>,

    /// Path to a JSON byte-array keypair file
    pub keypair_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchSettings {
    /// Prompt for metadata fields interactively instead of reading them here
    #[serde(default)]
    pub use_cli: bool,

    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub ticker: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_path: String,
    #[serde(default)]
    pub twitter: String,
    #[serde(default)]
    pub telegram: String,
    #[serde(default)]
    pub website: String,

    /// Dev wallet buy inside the create transaction, in SOL (0 = none)
    #[serde(default)]
    pub dev_buy_sol: f64,

    /// Use the first configured vanity key as the mint instead of a fresh one
    #[serde(default)]
    pub use_vanity: bool,

    /// Base58-encoded vanity mint keys, first entry wins
    #[serde(default)]
    pub vanity_keys: Vec<String>,

    /// Compute-unit price for the create transaction (micro-lamports)
    #[serde(default = "default_launch_cu_price")]
    pub compute_unit_price: u64,

    /// Compute-unit limit for the create transaction
    #[serde(default = "default_launch_cu_limit")]
    pub compute_unit_limit: u32,

    /// Optional tip transfer inside the create transaction
    pub tip: Option<TipSettings>,
}

impl Default for LaunchSettings {
    fn default() -> Self {
        Self {
            use_cli: false,
            name: String::new(),
            ticker: String::new(),
            description: String::new(),
            image_path: String::new(),
            twitter: String::new(),
            telegram: String::new(),
            website: String::new(),
            dev_buy_sol: 0.0,
            use_vanity: false,
            vanity_keys: Vec::new(),
            compute_unit_price: default_launch_cu_price(),
            compute_unit_limit: default_launch_cu_limit(),
            tip: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TipSettings {
    /// Tip recipient, base58
    pub account: String,
    /// Tip size in lamports
    pub lamports: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnipeSettings {
    /// Delay between poll attempts in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Slippage fraction for sniper buys
    #[serde(default = "default_snipe_slippage")]
    pub slippage: f64,

    /// Compute-unit price for buy transactions (micro-lamports)
    #[serde(default = "default_snipe_cu_price")]
    pub compute_unit_price: u64,

    /// Compute-unit limit for buy transactions
    #[serde(default = "default_snipe_cu_limit")]
    pub compute_unit_limit: u32,

    /// Optional cap on poll attempts; unset polls until cancelled
    pub max_poll_attempts: Option<u64>,
}

impl Default for SnipeSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            slippage: default_snipe_slippage(),
            compute_unit_price: default_snipe_cu_price(),
            compute_unit_limit: default_snipe_cu_limit(),
            max_poll_attempts: None,
        }
    }
}

impl SnipeSettings {
    pub fn to_params(&self) -> SnipeParams {
        SnipeParams {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            slippage: self.slippage,
            compute_unit_price: self.compute_unit_price,
            compute_unit_limit: self.compute_unit_limit,
            max_poll_attempts: self.max_poll_attempts,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SniperEntry {
    pub name_tag: String,
    pub private_key: String,
    /// Spend per buy, in SOL
    pub buy_amount: f64,
}

// Default value functions
fn default_coin_data_url() -> String {
    DEFAULT_COIN_DATA_URL.to_string()
}
fn default_ipfs_url() -> String {
    DEFAULT_IPFS_URL.to_string()
}
fn default_launch_cu_price() -> u64 {
    9_999_999
}
fn default_launch_cu_limit() -> u32 {
    900_000
}
fn default_poll_interval_ms() -> u64 {
    850
}
fn default_snipe_slippage() -> f64 {
    0.8
}
fn default_snipe_cu_price() -> u64 {
    9_333_333
}
fn default_snipe_cu_limit() -> u32 {
    69_900
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides. Env values win
    /// over the file so secrets never need to live in the config.
    pub fn from_file_with_env(path: &str) -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let mut config = Self::from_file(path)?;
        if let Ok(url) = std::env::var("RPC_URL") {
            config.rpc.url = url;
        }
        if let Ok(key) = std::env::var("PAYER_KEY") {
            config.wallet.payer_key = Some(key);
        }
        Ok(config)
    }

    /// Reject configurations that would make the run meaningless or unsafe.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.rpc.url.is_empty() {
            anyhow::bail!("rpc.url must not be empty");
        }
        if self.snipe.slippage < 0.0 {
            anyhow::bail!("snipe.slippage must be non-negative");
        }
        if self.launch.dev_buy_sol < 0.0 {
            anyhow::bail!("launch.dev_buy_sol must be non-negative");
        }
        for sniper in &self.snipers {
            if sniper.name_tag.is_empty() {
                anyhow::bail!("every sniper entry needs a name_tag");
            }
            if sniper.buy_amount <= 0.0 {
                anyhow::bail!(
                    "sniper '{}' has non-positive buy_amount {}",
                    sniper.name_tag,
                    sniper.buy_amount
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn minimal_config_gets_defaults() {
        let file = write_config(
            r#"
            [rpc]
            url = "https://api.mainnet-beta.solana.com"
            "#,
        );
        let config = Config::from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.snipe.poll_interval_ms, 850);
        assert_eq!(config.snipe.slippage, 0.8);
        assert_eq!(config.snipe.compute_unit_price, 9_333_333);
        assert_eq!(config.snipe.compute_unit_limit, 69_900);
        assert_eq!(config.launch.compute_unit_price, 9_999_999);
        assert_eq!(config.launch.compute_unit_limit, 900_000);
        assert_eq!(config.api.coin_data_url, DEFAULT_COIN_DATA_URL);
        assert!(config.snipers.is_empty());
        assert!(config.launch.tip.is_none());
        config.validate().unwrap();
    }

    #[test]
    fn full_config_round_trip() {
        let file = write_config(
            r#"
            [rpc]
            url = "https://rpc.example"

            [api]
            coin_data_url = "https://coins.example"

            [launch]
            name = "My Coin"
            ticker = "COIN"
            description = "a coin"
            image_path = "coin.png"
            dev_buy_sol = 0.25

            [launch.tip]
            account = "HWEoBxYs7ssKuudEjzjmpfJVX7Dvi7wescFsVx2L5yoY"
            lamports = 4000000

            [snipe]
            poll_interval_ms = 500
            slippage = 0.5
            max_poll_attempts = 100

            [[snipers]]
            name_tag = "alpha"
            private_key = "abc"
            buy_amount = 0.5

            [[snipers]]
            name_tag = "bravo"
            private_key = "def"
            buy_amount = 1.5
            "#,
        );
        let config = Config::from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.launch.name, "My Coin");
        assert_eq!(config.launch.tip.as_ref().unwrap().lamports, 4_000_000);
        assert_eq!(config.snipe.max_poll_attempts, Some(100));
        assert_eq!(config.snipers.len(), 2);
        assert_eq!(config.snipers[1].buy_amount, 1.5);

        let params = config.snipe.to_params();
        assert_eq!(params.poll_interval, Duration::from_millis(500));
        assert_eq!(params.max_poll_attempts, Some(100));
        config.validate().unwrap();
    }

    #[test]
    fn validate_rejects_zero_buy_amount() {
        let file = write_config(
            r#"
            [rpc]
            url = "https://rpc.example"

            [[snipers]]
            name_tag = "alpha"
            private_key = "abc"
            buy_amount = 0.0
            "#,
        );
        let config = Config::from_file(file.path().to_str().unwrap()).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("alpha"));
    }

    #[test]
    fn validate_rejects_negative_slippage() {
        let file = write_config(
            r#"
            [rpc]
            url = "https://rpc.example"

            [snipe]
            slippage = -0.1
            "#,
        );
        let config = Config::from_file(file.path().to_str().unwrap()).unwrap();
        assert!(config.validate().is_err());
    }
}
