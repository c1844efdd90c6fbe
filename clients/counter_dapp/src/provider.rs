//! Request-signing context: the transport paired with the connected wallet.

use std::sync::Arc;

use solana_sdk::{instruction::Instruction, signature::Signature, transaction::Transaction};
use tracing::debug;

use crate::{
    errors::{DappError, Result},
    transport::{SendOptions, Transport},
    wallet::Wallet,
};

pub struct Provider<T, W> {
    transport: Arc<T>,
    wallet: Arc<W>,
}

impl<T, W> Clone for Provider<T, W> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            wallet: Arc::clone(&self.wallet),
        }
    }
}

impl<T: Transport, W: Wallet> Provider<T, W> {
    pub fn new(transport: Arc<T>, wallet: Arc<W>) -> Self {
        Self { transport, wallet }
    }

    /// Sign `instructions` with the wallet as fee payer, submit and confirm
    pub async fn send(
        &self,
        instructions: &[Instruction],
        options: SendOptions,
    ) -> Result<Signature> {
        let payer = self.wallet.public_key().ok_or(DappError::WalletNotConnected)?;
        let blockhash = self.transport.latest_blockhash().await?;

        let mut transaction = Transaction::new_with_payer(instructions, Some(&payer));
        self.wallet.sign_transaction(&mut transaction, blockhash).await?;
        debug!(%payer, %blockhash, "transaction signed");

        self.transport.send_and_confirm(&transaction, options).await
    }
}
