//! In-memory collaborators for the integration tests.
//!
//! `MockTransport` keeps balances and account data in maps and executes
//! counter instructions the way the deployed program does: the counter is
//! created on first use, increases add the step, decreases below zero fail.

#![allow(dead_code)]

use std::{
    collections::{HashMap, VecDeque},
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;
use counter_dapp::{
    idl::{COUNTER_ACCOUNT, DECREASE_COUNTER, INCREASE_COUNTER},
    CounterAccount, DappError, ProgramInterface, Result, SendOptions, Transport, Wallet,
};
use solana_sdk::{
    hash::Hash, pubkey::Pubkey, signature::Keypair, signature::Signature, signer::Signer,
    transaction::Transaction,
};
use tokio::sync::oneshot;

pub const ONE_SOL: u64 = 1_000_000_000;

/// Holds one `get_balance` call until released
pub struct BalanceGate {
    pub entered: oneshot::Receiver<()>,
    pub release: oneshot::Sender<()>,
}

struct PendingGate {
    entered: oneshot::Sender<()>,
    release: oneshot::Receiver<()>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentTransaction {
    pub signature: Signature,
    pub skip_preflight: bool,
}

pub struct MockTransport {
    program_id: Pubkey,
    increase: [u8; 8],
    decrease: [u8; 8],
    account: [u8; 8],
    balances: Mutex<HashMap<Pubkey, u64>>,
    accounts: Mutex<HashMap<Pubkey, Vec<u8>>>,
    sent: Mutex<Vec<SentTransaction>>,
    gates: Mutex<VecDeque<PendingGate>>,
    pub fail_balance: AtomicBool,
    pub fail_account: AtomicBool,
    pub fail_send: AtomicBool,
}

impl MockTransport {
    pub fn new(interface: &ProgramInterface) -> Self {
        Self {
            program_id: interface.program_id(),
            increase: interface.instruction_discriminator(INCREASE_COUNTER).unwrap(),
            decrease: interface.instruction_discriminator(DECREASE_COUNTER).unwrap(),
            account: interface.account_discriminator(COUNTER_ACCOUNT).unwrap(),
            balances: Mutex::new(HashMap::new()),
            accounts: Mutex::new(HashMap::new()),
            sent: Mutex::new(Vec::new()),
            gates: Mutex::new(VecDeque::new()),
            fail_balance: AtomicBool::new(false),
            fail_account: AtomicBool::new(false),
            fail_send: AtomicBool::new(false),
        }
    }

    pub fn set_balance(&self, owner: Pubkey, lamports: u64) {
        self.balances.lock().unwrap().insert(owner, lamports);
    }

    pub fn set_account_data(&self, address: Pubkey, data: Vec<u8>) {
        self.accounts.lock().unwrap().insert(address, data);
    }

    pub fn set_counter(&self, address: Pubkey, authority: Pubkey, count: u64) {
        let data = CounterAccount { authority, count }
            .encode(&self.account)
            .unwrap();
        self.set_account_data(address, data);
    }

    pub fn counter(&self, address: &Pubkey) -> Option<u64> {
        self.accounts
            .lock()
            .unwrap()
            .get(address)
            .map(|data| CounterAccount::decode(data, &self.account).unwrap().count)
    }

    pub fn sent(&self) -> Vec<SentTransaction> {
        self.sent.lock().unwrap().clone()
    }

    /// Make the next `get_balance` call wait for the returned gate
    pub fn pause_next_balance(&self) -> BalanceGate {
        let (entered_tx, entered_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        self.gates.lock().unwrap().push_back(PendingGate {
            entered: entered_tx,
            release: release_rx,
        });
        BalanceGate {
            entered: entered_rx,
            release: release_tx,
        }
    }

    fn execute(&self, transaction: &Transaction) -> Result<()> {
        let keys = &transaction.message.account_keys;
        let mut accounts = self.accounts.lock().unwrap();

        for ix in &transaction.message.instructions {
            if keys[ix.program_id_index as usize] != self.program_id {
                return Err(DappError::Transport("unknown program".to_string()));
            }
            let counter = keys[ix.accounts[0] as usize];
            let authority = keys[ix.accounts[1] as usize];
            let step = u64::from_le_bytes(ix.data[8..16].try_into().unwrap());

            let mut state = match accounts.get(&counter) {
                Some(data) => CounterAccount::decode(data, &self.account)?,
                None => CounterAccount { authority, count: 0 },
            };

            let discriminator: [u8; 8] = ix.data[..8].try_into().unwrap();
            state.count = if discriminator == self.increase {
                state.count.checked_add(step).ok_or_else(|| failed(transaction))?
            } else if discriminator == self.decrease {
                state.count.checked_sub(step).ok_or_else(|| failed(transaction))?
            } else {
                return Err(DappError::Transport("unknown instruction".to_string()));
            };

            accounts.insert(counter, state.encode(&self.account)?);
        }
        Ok(())
    }
}

fn failed(transaction: &Transaction) -> DappError {
    DappError::TransactionFailed {
        signature: transaction.signatures[0].to_string(),
        reason: "Error processing Instruction 0: invalid program argument".to_string(),
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get_balance(&self, address: &Pubkey) -> Result<u64> {
        let gate = self.gates.lock().unwrap().pop_front();
        if let Some(gate) = gate {
            let _ = gate.entered.send(());
            let _ = gate.release.await;
        }
        if self.fail_balance.load(Ordering::SeqCst) {
            return Err(DappError::Transport("balance unavailable".to_string()));
        }
        Ok(self.balances.lock().unwrap().get(address).copied().unwrap_or(0))
    }

    async fn get_account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>> {
        if self.fail_account.load(Ordering::SeqCst) {
            return Err(DappError::Transport("account unavailable".to_string()));
        }
        Ok(self.accounts.lock().unwrap().get(address).cloned())
    }

    async fn latest_blockhash(&self) -> Result<Hash> {
        Ok(Hash::new_unique())
    }

    async fn send_and_confirm(
        &self,
        transaction: &Transaction,
        options: SendOptions,
    ) -> Result<Signature> {
        if self.fail_send.load(Ordering::SeqCst) {
            return Err(DappError::Transport("connection reset".to_string()));
        }
        assert!(transaction.is_signed(), "transaction must be signed");

        let signature = transaction.signatures[0];
        self.sent.lock().unwrap().push(SentTransaction {
            signature,
            skip_preflight: options.skip_preflight,
        });
        self.execute(transaction)?;
        Ok(signature)
    }
}

/// Wallet that keeps its key across disconnects, like a browser extension
pub struct MockWallet {
    keypair: Keypair,
    connected: AtomicBool,
    pub fail_connect: AtomicBool,
    pub fail_disconnect: AtomicBool,
}

impl MockWallet {
    pub fn new() -> Self {
        Self {
            keypair: Keypair::new(),
            connected: AtomicBool::new(false),
            fail_connect: AtomicBool::new(false),
            fail_disconnect: AtomicBool::new(false),
        }
    }

    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }
}

#[async_trait]
impl Wallet for MockWallet {
    async fn connect(&self) -> Result<Pubkey> {
        if self.fail_connect.load(Ordering::SeqCst) {
            return Err(DappError::Wallet("user rejected the request".to_string()));
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(self.keypair.pubkey())
    }

    async fn disconnect(&self) -> Result<()> {
        if self.fail_disconnect.load(Ordering::SeqCst) {
            return Err(DappError::Wallet("wallet busy".to_string()));
        }
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn public_key(&self) -> Option<Pubkey> {
        self.connected
            .load(Ordering::SeqCst)
            .then(|| self.keypair.pubkey())
    }

    async fn sign_transaction(&self, transaction: &mut Transaction, blockhash: Hash) -> Result<()> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(DappError::WalletNotConnected);
        }
        transaction
            .try_sign(&[&self.keypair], blockhash)
            .map_err(DappError::wallet)
    }
}
