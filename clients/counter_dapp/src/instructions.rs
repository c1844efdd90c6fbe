//! # Instructions Module
//!
//! Builds the two mutating requests of the counter program from the
//! program interface descriptor.

use std::{fmt, str::FromStr};

use anchor_lang::prelude::AnchorSerialize;
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
};

use crate::{
    errors::{DappError, Result},
    idl::{ProgramInterface, DECREASE_COUNTER, INCREASE_COUNTER},
    state::counter_address,
};

/// The program's two mutating operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CounterMethod {
    Increase,
    Decrease,
}

impl CounterMethod {
    /// Instruction name in the descriptor
    pub fn instruction_name(self) -> &'static str {
        match self {
            CounterMethod::Increase => INCREASE_COUNTER,
            CounterMethod::Decrease => DECREASE_COUNTER,
        }
    }
}

impl fmt::Display for CounterMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.instruction_name())
    }
}

/// Build `increase_counter(step)` or `decrease_counter(step)` for the
/// counter owned by `authority`.
///
/// # Arguments
/// * `interface` - The program interface descriptor
/// * `method` - Which operation to build
/// * `authority` - The connected wallet; signer and fee payer
/// * `step` - Amount to add or subtract
///
/// # Returns
/// * `Result<Instruction>` - The instruction, or an error if the descriptor
///   names an account this client cannot resolve
pub fn counter_instruction(
    interface: &ProgramInterface,
    method: CounterMethod,
    authority: &Pubkey,
    step: u64,
) -> Result<Instruction> {
    let program_id = interface.program_id();
    let name = method.instruction_name();
    let ix = interface.instruction(name)?;
    let (counter, _) = counter_address(&program_id, authority);

    let accounts = ix
        .accounts
        .iter()
        .map(|account| {
            let pubkey = match (account.address.as_deref(), account.name.as_str()) {
                (Some(address), _) => Pubkey::from_str(address).map_err(|err| {
                    DappError::Idl(format!("invalid address for `{}`: {err}", account.name))
                })?,
                (None, "counter") => counter,
                (None, "authority") => *authority,
                (None, other) => return Err(DappError::UnresolvedAccount(other.to_string())),
            };
            Ok(if account.writable {
                AccountMeta::new(pubkey, account.signer)
            } else {
                AccountMeta::new_readonly(pubkey, account.signer)
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut data = interface.instruction_discriminator(name)?.to_vec();
    step.serialize(&mut data)?;

    Ok(Instruction {
        program_id,
        accounts,
        data,
    })
}
