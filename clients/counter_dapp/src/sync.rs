//! # Synchronizer Module
//!
//! Keeps [`ViewState`] in line with the cluster. Every connect starts a new
//! generation; a fetch applies its results only if its generation is still
//! the current one, so a slow fetch from an earlier session can never
//! overwrite the view of a later one.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use futures::future;
use solana_sdk::pubkey::Pubkey;
use tokio::sync::RwLock;
use tracing::{debug, error};

use crate::{
    errors::{Operation, Result},
    idl::{ProgramInterface, COUNTER_ACCOUNT},
    state::{counter_address, Balance, CounterAccount},
    transport::Transport,
    view::ViewState,
};

/// Ticket identifying one connect transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Generation(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Results were written to the view
    Applied,
    /// A newer generation started while fetching; results were dropped
    Stale,
}

pub struct Synchronizer<T> {
    transport: Arc<T>,
    interface: Arc<ProgramInterface>,
    view: Arc<RwLock<ViewState>>,
    generation: Arc<AtomicU64>,
}

impl<T> Clone for Synchronizer<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            interface: Arc::clone(&self.interface),
            view: Arc::clone(&self.view),
            generation: Arc::clone(&self.generation),
        }
    }
}

impl<T: Transport> Synchronizer<T> {
    pub fn new(transport: Arc<T>, interface: Arc<ProgramInterface>) -> Self {
        Self {
            transport,
            interface,
            view: Arc::new(RwLock::new(ViewState::default())),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn view(&self) -> &Arc<RwLock<ViewState>> {
        &self.view
    }

    pub async fn snapshot(&self) -> ViewState {
        self.view.read().await.clone()
    }

    pub fn current(&self) -> Generation {
        Generation(self.generation.load(Ordering::SeqCst))
    }

    /// Start a new generation for a connect transition. The view drops back
    /// to its unset state and any fetch still in flight becomes stale.
    pub async fn begin(&self) -> Generation {
        let mut view = self.view.write().await;
        let generation = Generation(self.generation.fetch_add(1, Ordering::SeqCst) + 1);
        *view = ViewState::default();
        debug!(generation = generation.0, "synchronizer generation started");
        generation
    }

    /// Invalidate in-flight fetches and clear the view, e.g. on disconnect
    pub async fn reset(&self) {
        self.begin().await;
    }

    /// Fetch balance and counter for `owner` concurrently and apply both
    pub async fn synchronize(&self, generation: Generation, owner: Pubkey) -> SyncOutcome {
        let (counter, _) = counter_address(&self.interface.program_id(), &owner);
        let (balance, count) = future::join(
            self.transport.get_balance(&owner),
            self.fetch_counter(&counter),
        )
        .await;

        let mut view = self.view.write().await;
        if !self.is_current(generation) {
            debug!(generation = generation.0, "discarding stale synchronization");
            return SyncOutcome::Stale;
        }

        match balance {
            Ok(lamports) => {
                view.balance = Some(Balance { lamports });
                view.clear_error(Operation::Balance);
            }
            Err(err) => {
                error!(%err, %owner, "error fetching balance");
                view.record_error(Operation::Balance, err.to_string());
            }
        }
        apply_counter(&mut view, count);
        SyncOutcome::Applied
    }

    /// Re-read only the counter, as done after a mutating command
    pub async fn refresh_counter(&self, generation: Generation, owner: Pubkey) -> SyncOutcome {
        let (counter, _) = counter_address(&self.interface.program_id(), &owner);
        let count = self.fetch_counter(&counter).await;

        let mut view = self.view.write().await;
        if !self.is_current(generation) {
            debug!(generation = generation.0, "discarding stale counter refresh");
            return SyncOutcome::Stale;
        }
        apply_counter(&mut view, count);
        SyncOutcome::Applied
    }

    fn is_current(&self, generation: Generation) -> bool {
        self.current() == generation
    }

    /// Counter value stored at `address`; an account that does not exist yet
    /// counts as zero.
    async fn fetch_counter(&self, address: &Pubkey) -> Result<u64> {
        let discriminator = self.interface.account_discriminator(COUNTER_ACCOUNT)?;
        match self.transport.get_account_data(address).await? {
            None => {
                debug!(%address, "counter account not created yet");
                Ok(0)
            }
            Some(data) => Ok(CounterAccount::decode(&data, &discriminator)?.count),
        }
    }
}

fn apply_counter(view: &mut ViewState, count: Result<u64>) {
    match count {
        Ok(count) => {
            view.counter = Some(count);
            view.clear_error(Operation::Counter);
        }
        Err(err) => {
            error!(%err, "error fetching counter value");
            view.counter = Some(0);
            view.record_error(Operation::Counter, err.to_string());
        }
    }
}
