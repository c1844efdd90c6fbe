//! # Config Module
//!
//! Client configuration is one explicitly constructed value handed to the
//! app, transport and dispatcher. Sources are layered in this order, later
//! ones winning: built-in defaults, an optional TOML file, `COUNTER_DAPP_*`
//! environment variables, and finally command-line flags (applied by the
//! binary).

use std::{
    fs,
    path::{Path, PathBuf},
};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use solana_sdk::commitment_config::CommitmentConfig;
use tracing::warn;

use crate::errors::{DappError, Result};

pub const ENV_CLUSTER: &str = "COUNTER_DAPP_CLUSTER";
pub const ENV_RPC_URL: &str = "COUNTER_DAPP_RPC_URL";
pub const ENV_COMMITMENT: &str = "COUNTER_DAPP_COMMITMENT";
pub const ENV_KEYPAIR: &str = "COUNTER_DAPP_KEYPAIR";
pub const ENV_IDL: &str = "COUNTER_DAPP_IDL";

/// Solana cluster the client talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Cluster {
    #[default]
    Devnet,
    Testnet,
    MainnetBeta,
    Localnet,
}

impl Cluster {
    /// Public RPC endpoint of the cluster
    pub fn url(self) -> &'static str {
        match self {
            Cluster::Devnet => "https://api.devnet.solana.com",
            Cluster::Testnet => "https://api.testnet.solana.com",
            Cluster::MainnetBeta => "https://api.mainnet-beta.solana.com",
            Cluster::Localnet => "http://127.0.0.1:8899",
        }
    }
}

/// Commitment level used for queries, preflight and confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    #[default]
    Processed,
    Confirmed,
    Finalized,
}

impl From<Commitment> for CommitmentConfig {
    fn from(value: Commitment) -> Self {
        match value {
            Commitment::Processed => CommitmentConfig::processed(),
            Commitment::Confirmed => CommitmentConfig::confirmed(),
            Commitment::Finalized => CommitmentConfig::finalized(),
        }
    }
}

/// Whether each mutating command skips the preflight simulation
///
/// The defaults reproduce the deployed front-end: increments are submitted
/// without preflight, decrements with it. Nothing in the program requires
/// this split, so both are plain switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreflightPolicy {
    pub increment_skip_preflight: bool,
    pub decrement_skip_preflight: bool,
}

impl Default for PreflightPolicy {
    fn default() -> Self {
        Self {
            increment_skip_preflight: true,
            decrement_skip_preflight: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub cluster: Cluster,
    /// Overrides the cluster endpoint when set
    pub rpc_url: Option<String>,
    pub commitment: Commitment,
    pub preflight: PreflightPolicy,
    pub keypair_path: PathBuf,
    /// Program interface descriptor; the embedded one is used when unset
    pub idl_path: Option<PathBuf>,
    pub auto_connect: bool,
    pub confirm_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            cluster: Cluster::default(),
            rpc_url: None,
            commitment: Commitment::default(),
            preflight: PreflightPolicy::default(),
            keypair_path: default_keypair_path(),
            idl_path: None,
            auto_connect: true,
            confirm_timeout_secs: 60,
        }
    }
}

impl ClientConfig {
    /// Load defaults, then the TOML file at `path` if given, then the
    /// process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|err| {
            DappError::Config(format!("failed to read {}: {err}", path.display()))
        })?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|err| DappError::Config(err.to_string()))
    }

    /// Apply `COUNTER_DAPP_*` overrides read through `lookup`.
    /// Unparseable values are ignored with a warning.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(ENV_CLUSTER) {
            match Cluster::from_str(&v, true) {
                Ok(cluster) => self.cluster = cluster,
                Err(_) => warn!(value = %v, "ignoring invalid {ENV_CLUSTER}"),
            }
        }
        if let Some(v) = lookup(ENV_RPC_URL) {
            if !v.trim().is_empty() {
                self.rpc_url = Some(v.trim().to_string());
            }
        }
        if let Some(v) = lookup(ENV_COMMITMENT) {
            match Commitment::from_str(&v, true) {
                Ok(commitment) => self.commitment = commitment,
                Err(_) => warn!(value = %v, "ignoring invalid {ENV_COMMITMENT}"),
            }
        }
        if let Some(v) = lookup(ENV_KEYPAIR) {
            self.keypair_path = PathBuf::from(v);
        }
        if let Some(v) = lookup(ENV_IDL) {
            self.idl_path = Some(PathBuf::from(v));
        }
    }

    /// The RPC URL actually used: the explicit override or the cluster default
    pub fn rpc_endpoint(&self) -> &str {
        self.rpc_url.as_deref().unwrap_or(self.cluster.url())
    }

    pub fn commitment_config(&self) -> CommitmentConfig {
        self.commitment.into()
    }
}

fn default_keypair_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    Path::new(&home).join(".config/solana/id.json")
}
