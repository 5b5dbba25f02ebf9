//! Launch orchestrator.
//!
//! Validates the token metadata, uploads it, assembles the mint-creation
//! transaction, and hands the snipe coordinator the new mint address. The
//! coordinator is spawned *before* the create transaction is submitted so the
//! snipers start racing the moment the market can possibly exist.

use solana_sdk::native_token::sol_to_lamports;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature};
use solana_sdk::signer::Signer;
use solana_sdk::system_instruction;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::constants::{INITIAL_VIRTUAL_SOL_RESERVES, INITIAL_VIRTUAL_TOKEN_RESERVES};
use crate::coordinator::{SnipeCoordinator, SnipeReport};
use crate::encoder::{compute_budget_pair, InstructionEncoder};
use crate::errors::LaunchError;
use crate::market::MarketState;
use crate::sizer;
use crate::submitter::TxSubmitter;
use crate::wallet;

const MAX_NAME_LEN: usize = 32;
const MAX_TICKER_LEN: usize = 10;
const MAX_DESCRIPTION_LEN: usize = 2_000;
// 4.3 MB, the platform's upload cap
const MAX_IMAGE_BYTES: u64 = 4_508_876;

/// Per-run token metadata. Social links may be empty strings; the upload
/// endpoint accepts them blank.
#[derive(Debug, Clone, Default)]
pub struct TokenMetadata {
    pub name: String,
    pub ticker: String,
    pub description: String,
    pub image_path: String,
    pub twitter: String,
    pub telegram: String,
    pub website: String,
}

impl TokenMetadata {
    /// Enforce the platform's field limits before spending anything.
    pub fn validate(&self) -> Result<(), LaunchError> {
        if self.name.is_empty() {
            return Err(LaunchError::validation("no name provided"));
        }
        if self.name.chars().count() > MAX_NAME_LEN {
            return Err(LaunchError::validation(format!(
                "name too long: must be at most {} characters",
                MAX_NAME_LEN
            )));
        }
        if self.ticker.is_empty() {
            return Err(LaunchError::validation("no ticker provided"));
        }
        if self.ticker.chars().count() > MAX_TICKER_LEN {
            return Err(LaunchError::validation(format!(
                "ticker too long: must be at most {} characters",
                MAX_TICKER_LEN
            )));
        }
        if self.description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(LaunchError::validation("description too long"));
        }
        let meta = std::fs::metadata(&self.image_path)
            .map_err(|_| LaunchError::validation("image file does not exist"))?;
        if meta.len() > MAX_IMAGE_BYTES {
            return Err(LaunchError::validation(
                "image too large: must be less than 4.3 megabytes",
            ));
        }
        Ok(())
    }
}

/// Tip transfer placed inside the create transaction.
#[derive(Debug, Clone)]
pub struct Tip {
    pub account: Pubkey,
    pub lamports: u64,
}

/// Tunables of the launch phase.
#[derive(Debug, Clone)]
pub struct LaunchParams {
    /// Dev wallet buy inside the create transaction, in SOL (0 = none).
    pub dev_buy_sol: f64,
    /// Slippage fraction for the dev buy.
    pub dev_buy_slippage: f64,
    /// Compute-unit price for the create transaction, micro-lamports.
    pub compute_unit_price: u64,
    /// Compute-unit limit for the create transaction.
    pub compute_unit_limit: u32,
    /// Optional tip transfer.
    pub tip: Option<Tip>,
    /// Use the head of `vanity_keys` as the mint keypair.
    pub use_vanity: bool,
    /// Base58-encoded vanity mint keys.
    pub vanity_keys: Vec<String>,
}

impl Default for LaunchParams {
    fn default() -> Self {
        Self {
            dev_buy_sol: 0.0,
            dev_buy_slippage: 0.5,
            compute_unit_price: 9_999_999,
            compute_unit_limit: 900_000,
            tip: None,
            use_vanity: false,
            vanity_keys: Vec::new(),
        }
    }
}

/// What one launch run produced.
#[derive(Debug, Clone)]
pub struct LaunchOutcome {
    pub mint: Pubkey,
    pub create_signature: Signature,
    /// Whether the create transaction was seen confirmed within the budget.
    pub confirmed: bool,
    pub snipe: SnipeReport,
}

/// Upload token metadata as a multipart form; returns the hosted metadata URI.
pub async fn upload_metadata(
    http: &reqwest::Client,
    ipfs_url: &str,
    metadata: &TokenMetadata,
) -> Result<String, LaunchError> {
    let image = tokio::fs::read(&metadata.image_path)
        .await
        .map_err(|e| LaunchError::upload(format!("cannot read image {}: {}", metadata.image_path, e)))?;
    let file_name = Path::new(&metadata.image_path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());

    let form = reqwest::multipart::Form::new()
        .part("file", reqwest::multipart::Part::bytes(image).file_name(file_name))
        .text("name", metadata.name.clone())
        .text("symbol", metadata.ticker.clone())
        .text("description", metadata.description.clone())
        .text("twitter", metadata.twitter.clone())
        .text("telegram", metadata.telegram.clone())
        .text("website", metadata.website.clone());

    let response = http
        .post(ipfs_url)
        .multipart(form)
        .send()
        .await
        .map_err(|e| LaunchError::upload(e.to_string()))?;
    if !response.status().is_success() {
        return Err(LaunchError::upload(format!(
            "upload rejected with status {}",
            response.status()
        )));
    }

    #[derive(serde::Deserialize)]
    struct UploadResponse {
        #[serde(rename = "metadataUri")]
        metadata_uri: String,
    }
    let body: UploadResponse = response
        .json()
        .await
        .map_err(|e| LaunchError::upload(format!("malformed upload response: {}", e)))?;
    Ok(body.metadata_uri)
}

pub struct Launcher {
    encoder: InstructionEncoder,
    submitter: Arc<dyn TxSubmitter>,
    http: reqwest::Client,
    ipfs_url: String,
    payer: Arc<Keypair>,
    params: LaunchParams,
}

impl Launcher {
    pub fn new(
        encoder: InstructionEncoder,
        submitter: Arc<dyn TxSubmitter>,
        ipfs_url: impl Into<String>,
        payer: Arc<Keypair>,
        params: LaunchParams,
    ) -> Self {
        Self {
            encoder,
            submitter,
            http: reqwest::Client::new(),
            ipfs_url: ipfs_url.into(),
            payer,
            params,
        }
    }

    /// Create the token and snipe it. Returns once both the create
    /// transaction's confirmation wait and the snipe dispatch have settled.
    pub async fn launch(
        &self,
        metadata: &TokenMetadata,
        coordinator: SnipeCoordinator,
        cancel: watch::Receiver<bool>,
    ) -> Result<LaunchOutcome, LaunchError> {
        metadata.validate()?;

        info!("uploading token metadata");
        let metadata_uri = upload_metadata(&self.http, &self.ipfs_url, metadata).await?;
        info!(uri = %metadata_uri, "metadata uploaded");

        let mint_keypair = self.mint_keypair()?;
        let mint = mint_keypair.pubkey();
        info!(%mint, "token address");

        let instructions = self.create_instructions(&mint, metadata, &metadata_uri)?;

        // Start polling before the create transaction is even on the wire
        let snipe_handle = tokio::spawn(async move { coordinator.run(mint, cancel).await });

        let signers = [Arc::clone(&self.payer), Arc::new(mint_keypair)];
        let create_signature = self.submitter.submit(instructions, &signers).await?;
        info!(%create_signature, "create transaction submitted");

        let confirmed = self.submitter.confirm(&create_signature).await;
        if !confirmed {
            warn!(%create_signature, "create transaction not confirmed within budget");
        }

        let snipe = snipe_handle
            .await
            .map_err(|e| LaunchError::External(anyhow::anyhow!("snipe task aborted: {}", e)))?;

        Ok(LaunchOutcome {
            mint,
            create_signature,
            confirmed,
            snipe,
        })
    }

    fn mint_keypair(&self) -> Result<Keypair, LaunchError> {
        if self.params.use_vanity {
            let head = self
                .params
                .vanity_keys
                .first()
                .ok_or_else(|| LaunchError::VanityKey("vanity list is empty".to_string()))?;
            return wallet::keypair_from_base58(head)
                .map_err(|e| LaunchError::VanityKey(e.to_string()));
        }
        Ok(Keypair::new())
    }

    // Instruction order matters to the program: compute price, optional tip,
    // compute limit, create, then the dev-buy pair.
    fn create_instructions(
        &self,
        mint: &Pubkey,
        metadata: &TokenMetadata,
        metadata_uri: &str,
    ) -> Result<Vec<solana_sdk::instruction::Instruction>, LaunchError> {
        let payer = self.payer.pubkey();
        let [cu_price, cu_limit] =
            compute_budget_pair(self.params.compute_unit_price, self.params.compute_unit_limit);

        let mut instructions = vec![cu_price];
        if let Some(tip) = &self.params.tip {
            instructions.push(system_instruction::transfer(&payer, &tip.account, tip.lamports));
        }
        instructions.push(cu_limit);
        instructions.push(self.encoder.create_instruction(
            mint,
            &payer,
            &metadata.name,
            &metadata.ticker,
            metadata_uri,
        ));

        if self.params.dev_buy_sol > 0.0 {
            // The curve does not exist yet; the dev buy is sized against the
            // reserves every curve is initialized with
            let order = sizer::size(
                sol_to_lamports(self.params.dev_buy_sol),
                self.params.dev_buy_slippage,
                INITIAL_VIRTUAL_SOL_RESERVES,
                INITIAL_VIRTUAL_TOKEN_RESERVES,
            )?;
            let market = MarketState {
                mint: *mint,
                bonding_curve: self.encoder.addresses().bonding_curve(mint),
                associated_bonding_curve: self.encoder.addresses().associated_bonding_curve(mint),
                virtual_sol_reserves: INITIAL_VIRTUAL_SOL_RESERVES,
                virtual_token_reserves: INITIAL_VIRTUAL_TOKEN_RESERVES,
            };
            instructions.extend(self.encoder.buy(&order, &market, &payer));
            info!(spend_sol = self.params.dev_buy_sol, "added dev buy instruction");
        }

        Ok(instructions)
    }
}
