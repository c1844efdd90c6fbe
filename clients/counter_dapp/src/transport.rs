//! # Transport Module
//!
//! The RPC seam. Everything the client asks of the cluster goes through
//! [`Transport`], so the app can run against a live RPC node or an
//! in-memory double.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use solana_client::{nonblocking::rpc_client::RpcClient, rpc_config::RpcSendTransactionConfig};
use solana_sdk::{
    commitment_config::CommitmentConfig,
    hash::Hash,
    pubkey::Pubkey,
    signature::Signature,
    transaction::{Result as TransactionResult, Transaction},
};
use tracing::{debug, info};

use crate::{
    config::ClientConfig,
    errors::{DappError, Result},
};

const STATUS_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Per-submission options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SendOptions {
    /// Submit without running the preflight simulation
    pub skip_preflight: bool,
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Lamports held by `address`
    async fn get_balance(&self, address: &Pubkey) -> Result<u64>;

    /// Raw data of the account at `address`, `None` if it does not exist
    async fn get_account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>>;

    async fn latest_blockhash(&self) -> Result<Hash>;

    /// Submit a signed transaction and wait until it is confirmed
    async fn send_and_confirm(&self, transaction: &Transaction, options: SendOptions)
        -> Result<Signature>;
}

/// [`Transport`] over Solana JSON-RPC
pub struct RpcTransport {
    client: RpcClient,
    commitment: CommitmentConfig,
    confirm_timeout: Duration,
}

impl RpcTransport {
    pub fn new(config: &ClientConfig) -> Self {
        let commitment = config.commitment_config();
        info!(endpoint = config.rpc_endpoint(), ?commitment, "creating rpc transport");
        Self {
            client: RpcClient::new_with_commitment(config.rpc_endpoint().to_string(), commitment),
            commitment,
            confirm_timeout: Duration::from_secs(config.confirm_timeout_secs),
        }
    }

    async fn confirm(&self, signature: &Signature) -> Result<()> {
        let started = Instant::now();
        loop {
            let status = self
                .client
                .get_signature_status_with_commitment(signature, self.commitment)
                .await
                .map_err(DappError::transport)?;

            match settle(signature, status, started.elapsed(), self.confirm_timeout) {
                Some(outcome) => return outcome,
                None => tokio::time::sleep(STATUS_POLL_INTERVAL).await,
            }
        }
    }
}

/// Decide a confirmation poll. `None` means the transaction has not reached
/// the commitment yet and the deadline has not passed.
fn settle(
    signature: &Signature,
    status: Option<TransactionResult<()>>,
    elapsed: Duration,
    timeout: Duration,
) -> Option<Result<()>> {
    match status {
        Some(Ok(())) => Some(Ok(())),
        Some(Err(err)) => Some(Err(DappError::TransactionFailed {
            signature: signature.to_string(),
            reason: err.to_string(),
        })),
        None if elapsed >= timeout => Some(Err(DappError::ConfirmationTimeout {
            signature: signature.to_string(),
            timeout_secs: timeout.as_secs(),
        })),
        None => None,
    }
}

#[async_trait]
impl Transport for RpcTransport {
    async fn get_balance(&self, address: &Pubkey) -> Result<u64> {
        self.client
            .get_balance_with_commitment(address, self.commitment)
            .await
            .map(|response| response.value)
            .map_err(DappError::transport)
    }

    async fn get_account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>> {
        let response = self
            .client
            .get_account_with_commitment(address, self.commitment)
            .await
            .map_err(DappError::transport)?;
        Ok(response.value.map(|account| account.data))
    }

    async fn latest_blockhash(&self) -> Result<Hash> {
        self.client
            .get_latest_blockhash()
            .await
            .map_err(DappError::transport)
    }

    async fn send_and_confirm(
        &self,
        transaction: &Transaction,
        options: SendOptions,
    ) -> Result<Signature> {
        let config = RpcSendTransactionConfig {
            skip_preflight: options.skip_preflight,
            preflight_commitment: Some(self.commitment.commitment),
            ..RpcSendTransactionConfig::default()
        };
        let signature = self
            .client
            .send_transaction_with_config(transaction, config)
            .await
            .map_err(DappError::transport)?;
        debug!(%signature, skip_preflight = options.skip_preflight, "transaction sent");

        self.confirm(&signature).await?;
        info!(%signature, "transaction confirmed");
        Ok(signature)
    }
}
