//! # Dispatch Module
//!
//! User-triggered mutating commands. Each one builds the instruction for
//! the connected wallet's counter, submits it through the provider with the
//! configured preflight choice, and reports the signature or the error.

use std::{fmt, sync::Arc};

use solana_sdk::{pubkey::Pubkey, signature::Signature};
use tracing::{debug, info};

use crate::{
    config::PreflightPolicy,
    errors::{Operation, Result},
    idl::ProgramInterface,
    instructions::{counter_instruction, CounterMethod},
    provider::Provider,
    state::counter_address,
    transport::{SendOptions, Transport},
    wallet::Wallet,
};

/// Step used when a command does not name one
pub const DEFAULT_STEP: u64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Increment(u64),
    Decrement(u64),
}

impl Command {
    pub fn method(self) -> CounterMethod {
        match self {
            Command::Increment(_) => CounterMethod::Increase,
            Command::Decrement(_) => CounterMethod::Decrease,
        }
    }

    pub fn step(self) -> u64 {
        match self {
            Command::Increment(step) | Command::Decrement(step) => step,
        }
    }

    /// The operation failures of this command are recorded under
    pub fn operation(self) -> Operation {
        match self {
            Command::Increment(_) => Operation::Increment,
            Command::Decrement(_) => Operation::Decrement,
        }
    }

    pub fn skip_preflight(self, policy: &PreflightPolicy) -> bool {
        match self {
            Command::Increment(_) => policy.increment_skip_preflight,
            Command::Decrement(_) => policy.decrement_skip_preflight,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.method(), self.step())
    }
}

pub struct Dispatcher<T, W> {
    provider: Provider<T, W>,
    interface: Arc<ProgramInterface>,
    preflight: PreflightPolicy,
}

impl<T: Transport, W: Wallet> Dispatcher<T, W> {
    pub fn new(
        provider: Provider<T, W>,
        interface: Arc<ProgramInterface>,
        preflight: PreflightPolicy,
    ) -> Self {
        Self {
            provider,
            interface,
            preflight,
        }
    }

    /// Submit `command` for the counter owned by `authority`
    ///
    /// # Returns
    /// * `Result<Signature>` - The confirmed transaction signature
    pub async fn dispatch(&self, command: Command, authority: &Pubkey) -> Result<Signature> {
        let instruction =
            counter_instruction(&self.interface, command.method(), authority, command.step())?;
        let skip_preflight = command.skip_preflight(&self.preflight);

        debug!(
            counter = %counter_address(&self.interface.program_id(), authority).0,
            %authority,
            program = %instruction.program_id,
            skip_preflight,
            "submitting {command}"
        );

        let signature = self
            .provider
            .send(&[instruction], SendOptions { skip_preflight })
            .await?;
        info!(%signature, "{command} confirmed");
        Ok(signature)
    }
}
