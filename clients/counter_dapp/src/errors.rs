//! # Error Module
//!
//! This module contains the error type shared by every layer of the client.
//! Errors are values: each failing operation hands one back to its caller,
//! and the app records it in the view under the [`Operation`] that failed.

use std::fmt;

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T, E = DappError> = std::result::Result<T, E>;

/// Custom error type for the counter client
#[derive(Debug, Error)]
pub enum DappError {
    /// The wallet has no connected session
    #[error("Wallet not connected: connect a wallet before performing this action")]
    WalletNotConnected,

    /// The wallet failed to connect, disconnect or sign
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// An RPC query or submission failed
    #[error("Transport error: {0}")]
    Transport(String),

    /// A submitted transaction was rejected by the cluster
    #[error("Transaction {signature} failed: {reason}")]
    TransactionFailed { signature: String, reason: String },

    /// The transaction was not confirmed before the deadline
    #[error("Transaction {signature} not confirmed within {timeout_secs}s")]
    ConfirmationTimeout { signature: String, timeout_secs: u64 },

    /// Account data could not be decoded into the expected shape
    #[error("Decode error: {0}")]
    Decode(String),

    /// The program interface descriptor is unreadable or does not match
    /// the counter program
    #[error("Invalid program interface: {0}")]
    Idl(String),

    /// An instruction account named by the descriptor cannot be resolved
    #[error("Unresolved instruction account: {0}")]
    UnresolvedAccount(String),

    /// A line typed into the interactive prompt is not a known command
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Client configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DappError {
    pub fn transport(err: impl fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }

    pub fn wallet(err: impl fmt::Display) -> Self {
        Self::Wallet(err.to_string())
    }
}

/// The user-visible operations whose failures are tracked separately in the view
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Operation {
    Connect,
    Disconnect,
    Balance,
    Counter,
    Increment,
    Decrement,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Connect => "connect",
            Operation::Disconnect => "disconnect",
            Operation::Balance => "balance",
            Operation::Counter => "counter",
            Operation::Increment => "increment",
            Operation::Decrement => "decrement",
        };
        f.write_str(name)
    }
}
