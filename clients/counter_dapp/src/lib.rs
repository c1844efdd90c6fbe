//! # Counter DApp Client
//!
//! A terminal client for the counter program. It connects a wallet, shows
//! the wallet's SOL balance and the value of its counter account, and
//! submits `increase_counter` / `decrease_counter` transactions.
//!
//! ## Layout
//! - [`config`]: explicit client configuration (cluster, commitment, preflight)
//! - [`idl`]: the program interface descriptor
//! - [`state`]: account shapes and the derived counter address
//! - [`transport`] and [`wallet`]: the RPC and wallet collaborators, as traits
//! - [`sync`], [`dispatch`], [`app`]: the connect/fetch/mutate flow
//!
//! Signing, transaction serialization and RPC transport are delegated to the
//! Solana SDK; nothing here reimplements them.

pub mod app;
pub mod config;
pub mod dispatch;
pub mod errors;
pub mod events;
pub mod idl;
pub mod instructions;
pub mod provider;
pub mod state;
pub mod sync;
pub mod transport;
pub mod view;
pub mod wallet;

pub use app::App;
pub use config::{ClientConfig, Cluster, Commitment, PreflightPolicy};
pub use dispatch::{Command, Dispatcher, DEFAULT_STEP};
pub use errors::{DappError, Operation, Result};
pub use events::UiEvent;
pub use idl::ProgramInterface;
pub use state::{counter_address, Balance, CounterAccount, COUNTER_SEED};
pub use sync::{Generation, SyncOutcome, Synchronizer};
pub use transport::{RpcTransport, SendOptions, Transport};
pub use view::ViewState;
pub use wallet::{KeypairWallet, Session, Wallet};
