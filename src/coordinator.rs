//! Snipe coordinator: `POLLING -> FOUND -> DISPATCHING -> DONE`.
//!
//! Polls the market source at a fixed interval until the target mint's curve
//! is live, then fans out one buy per configured wallet. All wallets size
//! their orders from the single snapshot that ended the poll phase; reserves
//! will have moved by the time later transactions land, and that staleness is
//! accepted in exchange for speed. Each wallet's task is fully independent:
//! its failure never cancels, delays, or alters a sibling's attempt.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use solana_sdk::native_token::sol_to_lamports;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature};
use solana_sdk::signer::Signer;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::encoder::{compute_budget_pair, InstructionEncoder};
use crate::market::{MarketSource, MarketState};
use crate::sizer;
use crate::submitter::TxSubmitter;

/// Tunables of the poll and dispatch phases.
#[derive(Debug, Clone)]
pub struct SnipeParams {
    /// Delay between unsuccessful poll attempts.
    pub poll_interval: Duration,
    /// Slippage fraction applied to every sniper's buy.
    pub slippage: f64,
    /// Compute-unit price for buy transactions, in micro-lamports.
    pub compute_unit_price: u64,
    /// Compute-unit limit for buy transactions.
    pub compute_unit_limit: u32,
    /// Optional cap on poll attempts. `None` polls until the market appears
    /// or the caller cancels.
    pub max_poll_attempts: Option<u64>,
}

impl Default for SnipeParams {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(850),
            slippage: 0.8,
            compute_unit_price: 9_333_333,
            compute_unit_limit: 69_900,
            max_poll_attempts: None,
        }
    }
}

/// One configured sniper wallet. Loaded once at startup, read-only afterwards;
/// the keypair is shared into exactly one buy task per snipe.
#[derive(Clone)]
pub struct Sniper {
    pub name_tag: String,
    pub keypair: Arc<Keypair>,
    pub buy_amount_sol: f64,
}

/// How the snipe as a whole ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnipeStatus {
    /// Dispatch ran and every wallet task settled (success or failure each).
    Completed,
    /// The caller cancelled during the poll phase; nothing was dispatched.
    Cancelled,
    /// The poll attempt cap ran out before the market appeared.
    AttemptsExhausted,
}

/// Outcome of a single wallet's buy attempt.
#[derive(Debug, Clone)]
pub struct WalletOutcome {
    pub name_tag: String,
    pub wallet: Pubkey,
    pub result: Result<Signature, String>,
}

/// Structured result of one snipe run, returned to the caller instead of
/// being logged and swallowed.
#[derive(Debug, Clone)]
pub struct SnipeReport {
    pub mint: Pubkey,
    pub status: SnipeStatus,
    pub poll_attempts: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcomes: Vec<WalletOutcome>,
}

impl SnipeReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}

/// Build the cancellation pair for [`SnipeCoordinator::run`]. Sending `true`
/// stops the poll phase; dropping the sender without sending leaves the
/// original run-forever behavior in place.
pub fn cancel_channel() -> (watch::Sender<bool>, watch::Receiver<bool>) {
    watch::channel(false)
}

// Resolves only once cancellation is requested.
async fn cancelled(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow() {
            return;
        }
        if rx.changed().await.is_err() {
            // Sender dropped without cancelling: nobody can cancel anymore
            std::future::pending::<()>().await;
        }
    }
}

pub struct SnipeCoordinator {
    market: Arc<dyn MarketSource>,
    submitter: Arc<dyn TxSubmitter>,
    encoder: InstructionEncoder,
    params: SnipeParams,
    snipers: Vec<Sniper>,
}

impl SnipeCoordinator {
    pub fn new(
        market: Arc<dyn MarketSource>,
        submitter: Arc<dyn TxSubmitter>,
        encoder: InstructionEncoder,
        params: SnipeParams,
        snipers: Vec<Sniper>,
    ) -> Self {
        Self {
            market,
            submitter,
            encoder,
            params,
            snipers,
        }
    }

    /// Poll until the mint's market is live, then dispatch every sniper
    /// concurrently and wait for all of them to settle.
    pub async fn run(&self, mint: Pubkey, mut cancel: watch::Receiver<bool>) -> SnipeReport {
        let started_at = Utc::now();
        let mut attempts: u64 = 0;

        if *cancel.borrow() {
            return self.report(mint, SnipeStatus::Cancelled, attempts, started_at, vec![]);
        }

        let snapshot = loop {
            attempts += 1;
            if let Some(state) = self.market.fetch(&mint).await {
                break state;
            }
            debug!(%mint, attempts, "market not yet live");

            if let Some(cap) = self.params.max_poll_attempts {
                if attempts >= cap {
                    warn!(%mint, attempts, "poll attempt cap reached, giving up");
                    return self.report(
                        mint,
                        SnipeStatus::AttemptsExhausted,
                        attempts,
                        started_at,
                        vec![],
                    );
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.params.poll_interval) => {}
                _ = cancelled(&mut cancel) => {
                    info!(%mint, attempts, "snipe cancelled while polling");
                    return self.report(mint, SnipeStatus::Cancelled, attempts, started_at, vec![]);
                }
            }
        };

        info!(
            %mint,
            attempts,
            sol_reserves = snapshot.virtual_sol_reserves,
            token_reserves = snapshot.virtual_token_reserves,
            wallets = self.snipers.len(),
            "market live, dispatching snipers"
        );

        // One task per wallet, all reading the same snapshot. No task waits
        // on another; join only at the end.
        let handles: Vec<_> = self
            .snipers
            .iter()
            .cloned()
            .map(|sniper| {
                let submitter = Arc::clone(&self.submitter);
                let encoder = self.encoder.clone();
                let params = self.params.clone();
                tokio::spawn(buy_task(sniper, snapshot, encoder, submitter, params))
            })
            .collect();

        let mut outcomes = Vec::with_capacity(handles.len());
        for (joined, sniper) in join_all(handles).await.into_iter().zip(&self.snipers) {
            outcomes.push(match joined {
                Ok(outcome) => outcome,
                // A panicked buy task must not take down the process or its
                // siblings; it becomes a reported failure like any other
                Err(e) => WalletOutcome {
                    name_tag: sniper.name_tag.clone(),
                    wallet: sniper.keypair.pubkey(),
                    result: Err(format!("buy task aborted: {e}")),
                },
            });
        }

        let report = self.report(mint, SnipeStatus::Completed, attempts, started_at, outcomes);
        info!(
            %mint,
            succeeded = report.succeeded(),
            failed = report.failed(),
            "snipe dispatch settled"
        );
        report
    }

    fn report(
        &self,
        mint: Pubkey,
        status: SnipeStatus,
        poll_attempts: u64,
        started_at: DateTime<Utc>,
        outcomes: Vec<WalletOutcome>,
    ) -> SnipeReport {
        SnipeReport {
            mint,
            status,
            poll_attempts,
            started_at,
            finished_at: Utc::now(),
            outcomes,
        }
    }
}

async fn buy_task(
    sniper: Sniper,
    snapshot: MarketState,
    encoder: InstructionEncoder,
    submitter: Arc<dyn TxSubmitter>,
    params: SnipeParams,
) -> WalletOutcome {
    let wallet = sniper.keypair.pubkey();
    let result = buy_once(&sniper, &snapshot, &encoder, submitter.as_ref(), &params).await;
    match &result {
        Ok(signature) => {
            info!(sniper = %sniper.name_tag, %wallet, %signature, "sniper bought token")
        }
        Err(reason) => {
            warn!(sniper = %sniper.name_tag, %wallet, reason = %reason, "sniper buy failed")
        }
    }
    WalletOutcome {
        name_tag: sniper.name_tag,
        wallet,
        result,
    }
}

async fn buy_once(
    sniper: &Sniper,
    snapshot: &MarketState,
    encoder: &InstructionEncoder,
    submitter: &dyn TxSubmitter,
    params: &SnipeParams,
) -> Result<Signature, String> {
    let spend_lamports = sol_to_lamports(sniper.buy_amount_sol);
    let order = sizer::size(
        spend_lamports,
        params.slippage,
        snapshot.virtual_sol_reserves,
        snapshot.virtual_token_reserves,
    )
    .map_err(|e| e.to_string())?;

    let wallet = sniper.keypair.pubkey();
    let mut instructions =
        compute_budget_pair(params.compute_unit_price, params.compute_unit_limit).to_vec();
    instructions.extend(encoder.buy(&order, snapshot, &wallet));

    submitter
        .submit(instructions, &[Arc::clone(&sniper.keypair)])
        .await
        .map_err(|e| e.to_string())
}
