//! Transaction signing, submission, and confirmation.
//!
//! Submission skips preflight simulation by design: in a snipe the
//! milliseconds matter more than a local pre-check, so failures surface only
//! from final confirmation status. The submitter makes a single blocking
//! confirmation wait per submission and never retries; retry policy belongs
//! to callers (and the callers here deliberately have none).

use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::RpcSendTransactionConfig;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::instruction::Instruction;
use solana_sdk::signature::{Keypair, Signature};
use solana_sdk::signer::Signer;
use solana_sdk::transaction::Transaction;
use std::sync::Arc;
use std::time::Duration;
use tokio_retry::strategy::FixedInterval;
use tokio_retry::Retry;
use tracing::debug;

use crate::errors::SubmitError;

/// Attempt budget of the standalone confirmation poll ([`TxSubmitter::confirm`]).
pub const CONFIRM_ATTEMPTS: usize = 10;
/// Delay between confirmation poll attempts, in milliseconds.
pub const CONFIRM_RETRY_MS: u64 = 2_000;

/// Seam between the trade pipeline and the chain RPC.
#[async_trait]
pub trait TxSubmitter: Send + Sync {
    /// Assemble, sign with `signers` (first signer pays fees), submit with
    /// preflight skipped, and wait once for confirmed commitment.
    async fn submit(
        &self,
        instructions: Vec<Instruction>,
        signers: &[Arc<Keypair>],
    ) -> Result<Signature, SubmitError>;

    /// Poll a signature's status at confirmed commitment under a fixed
    /// attempt budget. `true` only on a clean confirmed status; a recorded
    /// on-chain error or an exhausted budget both read as `false`.
    async fn confirm(&self, signature: &Signature) -> bool;
}

/// [`TxSubmitter`] backed by a shared nonblocking RPC client. The client is
/// used stateless request/response only, so one handle serves all concurrent
/// buy tasks without locking.
pub struct RpcSubmitter {
    client: Arc<RpcClient>,
    confirm_interval: Duration,
}

impl RpcSubmitter {
    pub fn new(rpc_url: impl Into<String>) -> Self {
        Self::from_client(Arc::new(RpcClient::new_with_commitment(
            rpc_url.into(),
            CommitmentConfig::confirmed(),
        )))
    }

    pub fn from_client(client: Arc<RpcClient>) -> Self {
        Self {
            client,
            confirm_interval: Duration::from_millis(CONFIRM_RETRY_MS),
        }
    }

    #[cfg(test)]
    fn with_confirm_interval(mut self, interval: Duration) -> Self {
        self.confirm_interval = interval;
        self
    }
}

#[async_trait]
impl TxSubmitter for RpcSubmitter {
    async fn submit(
        &self,
        instructions: Vec<Instruction>,
        signers: &[Arc<Keypair>],
    ) -> Result<Signature, SubmitError> {
        let payer = signers
            .first()
            .ok_or_else(|| SubmitError::submission("no signers provided"))?
            .pubkey();

        let blockhash = self
            .client
            .get_latest_blockhash()
            .await
            .map_err(|e| SubmitError::blockhash(e.to_string()))?;

        let signing_keys: Vec<&Keypair> = signers.iter().map(|k| k.as_ref()).collect();
        let tx = Transaction::new_signed_with_payer(
            &instructions,
            Some(&payer),
            &signing_keys,
            blockhash,
        );

        self.client
            .send_and_confirm_transaction_with_spinner_and_config(
                &tx,
                CommitmentConfig::confirmed(),
                RpcSendTransactionConfig {
                    skip_preflight: true,
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| SubmitError::submission(e.to_string()))
    }

    async fn confirm(&self, signature: &Signature) -> bool {
        let strategy = FixedInterval::new(self.confirm_interval).take(CONFIRM_ATTEMPTS - 1);
        let outcome = Retry::spawn(strategy, || async {
            match self
                .client
                .get_signature_status_with_commitment(signature, CommitmentConfig::confirmed())
                .await
            {
                Ok(Some(Ok(()))) => Ok(true),
                Ok(Some(Err(e))) => {
                    // Recorded on-chain failure is terminal, stop polling
                    debug!(%signature, error = %e, "transaction failed on chain");
                    Ok(false)
                }
                Ok(None) => Err(()),
                Err(e) => {
                    debug!(%signature, error = %e, "status query failed, will retry");
                    Err(())
                }
            }
        })
        .await;
        outcome.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_response(value: &str) -> String {
        format!(
            r#"{{"jsonrpc":"2.0","result":{{"context":{{"slot":123}},"value":[{}]}},"id":1}}"#,
            value
        )
    }

    #[tokio::test]
    async fn confirm_reports_true_on_clean_confirmed_status() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_body(status_response(
                r#"{"slot":123,"confirmations":1,"err":null,"status":{"Ok":null},"confirmationStatus":"confirmed"}"#,
            ))
            .expect(1)
            .create_async()
            .await;

        let submitter = RpcSubmitter::new(server.url());
        assert!(submitter.confirm(&Signature::new_unique()).await);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn confirm_stops_polling_on_recorded_on_chain_error() {
        let mut server = mockito::Server::new_async().await;
        let failed = r#"{"slot":123,"confirmations":1,"err":{"InstructionError":[0,{"Custom":6002}]},"status":{"Err":{"InstructionError":[0,{"Custom":6002}]}},"confirmationStatus":"confirmed"}"#;
        let mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_body(status_response(failed))
            .expect(1)
            .create_async()
            .await;

        let submitter = RpcSubmitter::new(server.url());
        // Terminal on the first status, no further polls
        assert!(!submitter.confirm(&Signature::new_unique()).await);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn confirm_gives_up_after_exhausting_its_budget() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_body(status_response("null"))
            .expect(CONFIRM_ATTEMPTS)
            .create_async()
            .await;

        let submitter =
            RpcSubmitter::new(server.url()).with_confirm_interval(Duration::from_millis(1));
        assert!(!submitter.confirm(&Signature::new_unique()).await);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn submit_without_signers_is_rejected() {
        let submitter = RpcSubmitter::new("http://127.0.0.1:1");
        let err = submitter.submit(vec![], &[]).await.unwrap_err();
        assert!(matches!(err, SubmitError::Submission(_)));
    }

    #[tokio::test]
    async fn submit_surfaces_blockhash_failure() {
        // Nothing listens on this port, the blockhash fetch fails first
        let submitter = RpcSubmitter::new("http://127.0.0.1:1");
        let signer = Arc::new(Keypair::new());
        let err = submitter.submit(vec![], &[signer]).await.unwrap_err();
        assert!(matches!(err, SubmitError::Blockhash(_)));
    }
}
