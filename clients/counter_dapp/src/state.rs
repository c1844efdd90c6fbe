//! # State Module
//!
//! Account shapes the client reads from the cluster, and the derivation of
//! the per-user counter address.

use std::fmt;

use anchor_lang::prelude::{borsh, AnchorDeserialize, AnchorSerialize};
use solana_sdk::{native_token::LAMPORTS_PER_SOL, pubkey::Pubkey};

use crate::errors::{DappError, Result};

/// Fixed label the counter address is derived from
pub const COUNTER_SEED: &[u8] = b"counter";

const DISCRIMINATOR_LEN: usize = 8;

/// Derive the counter account owned by `authority`.
///
/// Pure computation, no lookup: the account may not exist yet.
pub fn counter_address(program_id: &Pubkey, authority: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[COUNTER_SEED, authority.as_ref()], program_id)
}

/// The counter account as stored by the program
#[derive(Debug, Clone, Copy, PartialEq, Eq, AnchorSerialize, AnchorDeserialize)]
pub struct CounterAccount {
    /// The wallet that created and pays for this counter
    pub authority: Pubkey,
    /// The current count value
    pub count: u64,
}

impl CounterAccount {
    /// Decode raw account data, checking the leading discriminator
    pub fn decode(data: &[u8], discriminator: &[u8; 8]) -> Result<Self> {
        if data.len() < DISCRIMINATOR_LEN {
            return Err(DappError::Decode(format!(
                "account data too short: {} bytes",
                data.len()
            )));
        }
        let (head, mut body) = data.split_at(DISCRIMINATOR_LEN);
        if head != discriminator {
            return Err(DappError::Decode(
                "account discriminator does not match Counter".to_string(),
            ));
        }
        Self::deserialize(&mut body).map_err(|err| DappError::Decode(err.to_string()))
    }

    /// Encode as account data, discriminator first
    pub fn encode(&self, discriminator: &[u8; 8]) -> Result<Vec<u8>> {
        let mut data = discriminator.to_vec();
        self.serialize(&mut data)?;
        Ok(data)
    }
}

/// Wallet holdings, displayed in SOL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Balance {
    pub lamports: u64,
}

impl Balance {
    pub fn sol(&self) -> f64 {
        self.lamports as f64 / LAMPORTS_PER_SOL as f64
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} SOL", self.sol())
    }
}
