//! Market data fetcher for bonding-curve state.
//!
//! One HTTP GET per call against the platform's coin-data endpoint. Every
//! failure mode (request error, non-success status, malformed body) collapses
//! into `None`, which the coordinator's poll loop reads as "market not yet
//! live" and retries. Nothing here escalates.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ORIGIN, REFERER, USER_AGENT};
use serde::Deserialize;
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;
use tracing::debug;

/// Read API the original campaign tool polls.
pub const DEFAULT_COIN_DATA_URL: &str = "https://client-api-2-74b1891ee9f9.herokuapp.com";

/// Immutable snapshot of a bonding curve at fetch time. Superseded by the
/// next fetch, never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketState {
    pub mint: Pubkey,
    pub bonding_curve: Pubkey,
    pub associated_bonding_curve: Pubkey,
    /// Virtual SOL reserves in lamports.
    pub virtual_sol_reserves: u64,
    /// Virtual token reserves in the token's smallest unit.
    pub virtual_token_reserves: u64,
}

/// Seam between the coordinator and the upstream read API.
#[async_trait]
pub trait MarketSource: Send + Sync {
    /// `None` means "not yet live" in every case; callers retry by polling.
    async fn fetch(&self, mint: &Pubkey) -> Option<MarketState>;
}

/// Wire shape of the coin-data endpoint. Extra fields are ignored; reserves
/// are u64 on chain and parsed as such.
#[derive(Debug, Deserialize)]
struct CoinData {
    mint: String,
    bonding_curve: String,
    associated_bonding_curve: String,
    virtual_sol_reserves: u64,
    virtual_token_reserves: u64,
}

impl CoinData {
    fn into_state(self) -> Option<MarketState> {
        Some(MarketState {
            mint: Pubkey::from_str(&self.mint).ok()?,
            bonding_curve: Pubkey::from_str(&self.bonding_curve).ok()?,
            associated_bonding_curve: Pubkey::from_str(&self.associated_bonding_curve).ok()?,
            virtual_sol_reserves: self.virtual_sol_reserves,
            virtual_token_reserves: self.virtual_token_reserves,
        })
    }
}

/// HTTP client for the coin-data endpoint.
#[derive(Debug, Clone)]
pub struct MarketDataFetcher {
    http: reqwest::Client,
    base_url: String,
}

impl MarketDataFetcher {
    pub fn new(base_url: impl Into<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .default_headers(browser_headers())
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

// The upstream rejects requests that don't look like they came from the site.
fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static(
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
        ),
    );
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    headers.insert(REFERER, HeaderValue::from_static("https://www.pump.fun/"));
    headers.insert(ORIGIN, HeaderValue::from_static("https://www.pump.fun"));
    headers
}

#[async_trait]
impl MarketSource for MarketDataFetcher {
    async fn fetch(&self, mint: &Pubkey) -> Option<MarketState> {
        let url = format!("{}/coins/{}", self.base_url, mint);
        let response = match self.http.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                debug!(%mint, error = %e, "coin data request failed");
                return None;
            }
        };
        if !response.status().is_success() {
            debug!(%mint, status = %response.status(), "market not yet live");
            return None;
        }
        match response.json::<CoinData>().await {
            Ok(data) => data.into_state(),
            Err(e) => {
                debug!(%mint, error = %e, "coin data body malformed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coin_body(mint: &Pubkey) -> String {
        format!(
            r#"{{
                "mint": "{}",
                "name": "test coin",
                "bonding_curve": "{}",
                "associated_bonding_curve": "{}",
                "virtual_sol_reserves": 30000000000,
                "virtual_token_reserves": 1073000000000000,
                "complete": false
            }}"#,
            mint,
            Pubkey::new_unique(),
            Pubkey::new_unique(),
        )
    }

    #[tokio::test]
    async fn fetch_parses_live_market() {
        let mut server = mockito::Server::new_async().await;
        let mint = Pubkey::new_unique();
        let mock = server
            .mock("GET", format!("/coins/{}", mint).as_str())
            .with_status(200)
            .with_body(coin_body(&mint))
            .create_async()
            .await;

        let fetcher = MarketDataFetcher::new(server.url()).unwrap();
        let state = fetcher.fetch(&mint).await.expect("market should parse");
        assert_eq!(state.mint, mint);
        assert_eq!(state.virtual_sol_reserves, 30_000_000_000);
        assert_eq!(state.virtual_token_reserves, 1_073_000_000_000_000);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn not_found_reads_as_not_yet_live() {
        let mut server = mockito::Server::new_async().await;
        let mint = Pubkey::new_unique();
        server
            .mock("GET", format!("/coins/{}", mint).as_str())
            .with_status(404)
            .create_async()
            .await;

        let fetcher = MarketDataFetcher::new(server.url()).unwrap();
        assert!(fetcher.fetch(&mint).await.is_none());
    }

    #[tokio::test]
    async fn malformed_body_reads_as_not_yet_live() {
        let mut server = mockito::Server::new_async().await;
        let mint = Pubkey::new_unique();
        server
            .mock("GET", format!("/coins/{}", mint).as_str())
            .with_status(200)
            .with_body(r#"{"mint": 42}"#)
            .create_async()
            .await;

        let fetcher = MarketDataFetcher::new(server.url()).unwrap();
        assert!(fetcher.fetch(&mint).await.is_none());
    }

    #[tokio::test]
    async fn unparseable_pubkey_reads_as_not_yet_live() {
        let mut server = mockito::Server::new_async().await;
        let mint = Pubkey::new_unique();
        server
            .mock("GET", format!("/coins/{}", mint).as_str())
            .with_status(200)
            .with_body(
                r#"{
                    "mint": "definitely-not-base58!",
                    "bonding_curve": "also-bad",
                    "associated_bonding_curve": "same",
                    "virtual_sol_reserves": 1,
                    "virtual_token_reserves": 1
                }"#,
            )
            .create_async()
            .await;

        let fetcher = MarketDataFetcher::new(server.url()).unwrap();
        assert!(fetcher.fetch(&mint).await.is_none());
    }

    #[tokio::test]
    async fn connection_failure_reads_as_not_yet_live() {
        // Nothing listens on this port
        let fetcher = MarketDataFetcher::new("http://127.0.0.1:1").unwrap();
        assert!(fetcher.fetch(&Pubkey::new_unique()).await.is_none());
    }
}
