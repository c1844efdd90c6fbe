//! # Wallet Module
//!
//! The wallet collaborator: it connects, exposes the public key of the
//! connected account, signs transactions and disconnects. Key management
//! stays behind the [`Wallet`] trait.

use std::{
    path::PathBuf,
    sync::{PoisonError, RwLock},
};

use async_trait::async_trait;
use solana_sdk::{
    hash::Hash,
    pubkey::Pubkey,
    signature::{read_keypair_file, Keypair},
    signer::Signer,
    transaction::Transaction,
};
use tracing::info;

use crate::errors::{DappError, Result};

/// The live wallet connection of the current user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub public_key: Pubkey,
    pub connected: bool,
}

impl Session {
    pub fn new(public_key: Pubkey) -> Self {
        Self {
            public_key,
            connected: true,
        }
    }
}

#[async_trait]
pub trait Wallet: Send + Sync {
    /// Connect and return the public key of the connected account
    async fn connect(&self) -> Result<Pubkey>;

    async fn disconnect(&self) -> Result<()>;

    /// Public key of the connected account, `None` while disconnected
    fn public_key(&self) -> Option<Pubkey>;

    /// Sign `transaction` with the connected account against `blockhash`
    async fn sign_transaction(&self, transaction: &mut Transaction, blockhash: Hash) -> Result<()>;
}

/// [`Wallet`] backed by a Solana CLI keypair file
///
/// The file is read on every connect and the key is dropped on disconnect.
pub struct KeypairWallet {
    path: PathBuf,
    keypair: RwLock<Option<Keypair>>,
}

impl KeypairWallet {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            keypair: RwLock::new(None),
        }
    }

    /// Wallet that is already holding `keypair`
    pub fn from_keypair(keypair: Keypair) -> Self {
        Self {
            path: PathBuf::new(),
            keypair: RwLock::new(Some(keypair)),
        }
    }
}

fn poisoned<T>(_: PoisonError<T>) -> DappError {
    DappError::Wallet("keypair lock poisoned".to_string())
}

#[async_trait]
impl Wallet for KeypairWallet {
    async fn connect(&self) -> Result<Pubkey> {
        let mut slot = self.keypair.write().map_err(poisoned)?;
        if let Some(keypair) = slot.as_ref() {
            return Ok(keypair.pubkey());
        }

        let keypair = read_keypair_file(&self.path).map_err(|err| {
            DappError::Wallet(format!(
                "failed to read keypair {}: {err}",
                self.path.display()
            ))
        })?;
        let public_key = keypair.pubkey();
        info!(%public_key, path = %self.path.display(), "wallet connected");
        *slot = Some(keypair);
        Ok(public_key)
    }

    async fn disconnect(&self) -> Result<()> {
        let mut slot = self.keypair.write().map_err(poisoned)?;
        if slot.take().is_none() {
            return Err(DappError::WalletNotConnected);
        }
        info!("wallet disconnected");
        Ok(())
    }

    fn public_key(&self) -> Option<Pubkey> {
        self.keypair
            .read()
            .ok()
            .and_then(|slot| slot.as_ref().map(Signer::pubkey))
    }

    async fn sign_transaction(&self, transaction: &mut Transaction, blockhash: Hash) -> Result<()> {
        let slot = self.keypair.read().map_err(poisoned)?;
        let keypair = slot.as_ref().ok_or(DappError::WalletNotConnected)?;
        transaction
            .try_sign(&[keypair], blockhash)
            .map_err(DappError::wallet)
    }
}

#[cfg(test)]
mod tests {
    use solana_sdk::{
        instruction::{AccountMeta, Instruction},
        signature::write_keypair_file,
    };

    use super::*;

    fn instruction_signed_by(payer: Pubkey) -> Instruction {
        Instruction::new_with_bytes(Pubkey::new_unique(), b"hi", vec![AccountMeta::new(payer, true)])
    }

    #[tokio::test]
    async fn connects_from_keypair_file_and_forgets_on_disconnect() {
        let dir = std::env::temp_dir().join(format!("counter_dapp_wallet_{}", Pubkey::new_unique()));
        std::fs::create_dir_all(&dir).expect("temp dir");
        let path = dir.join("id.json");
        let keypair = Keypair::new();
        write_keypair_file(&keypair, &path).expect("write keypair");

        let wallet = KeypairWallet::new(&path);
        assert_eq!(wallet.public_key(), None);

        assert_eq!(wallet.connect().await.unwrap(), keypair.pubkey());
        assert_eq!(wallet.public_key(), Some(keypair.pubkey()));

        wallet.disconnect().await.unwrap();
        assert_eq!(wallet.public_key(), None);
        assert!(matches!(
            wallet.disconnect().await,
            Err(DappError::WalletNotConnected)
        ));

        std::fs::remove_dir_all(dir).expect("cleanup");
    }

    #[tokio::test]
    async fn connect_fails_for_missing_file() {
        let wallet = KeypairWallet::new("/nonexistent/counter-dapp/id.json");
        assert!(matches!(wallet.connect().await, Err(DappError::Wallet(_))));
    }

    #[tokio::test]
    async fn signs_as_fee_payer() {
        let keypair = Keypair::new();
        let payer = keypair.pubkey();
        let wallet = KeypairWallet::from_keypair(keypair);

        let ix = instruction_signed_by(payer);
        let mut tx = Transaction::new_with_payer(&[ix], Some(&payer));
        wallet
            .sign_transaction(&mut tx, Hash::new_unique())
            .await
            .unwrap();

        assert!(tx.is_signed());
    }

    #[tokio::test]
    async fn refuses_to_sign_while_disconnected() {
        let wallet = KeypairWallet::from_keypair(Keypair::new());
        wallet.disconnect().await.unwrap();

        let payer = Pubkey::new_unique();
        let ix = instruction_signed_by(payer);
        let mut tx = Transaction::new_with_payer(&[ix], Some(&payer));
        assert!(matches!(
            wallet.sign_transaction(&mut tx, Hash::new_unique()).await,
            Err(DappError::WalletNotConnected)
        ));
    }
}
