//! # Program Interface Module
//!
//! The counter program is described by its Anchor IDL: program address,
//! instruction names with their accounts and arguments, and the account
//! schema. The client treats it as fixed configuration loaded once at
//! startup, either from the copy embedded in this crate or from a file.

use std::{fs, path::Path, str::FromStr};

use serde::Deserialize;
use sha2::{Digest, Sha256};
use solana_sdk::pubkey::Pubkey;

use crate::errors::{DappError, Result};

pub const INCREASE_COUNTER: &str = "increase_counter";
pub const DECREASE_COUNTER: &str = "decrease_counter";
pub const COUNTER_ACCOUNT: &str = "Counter";

const EMBEDDED_IDL: &str = include_str!("../idl/counter.json");

/// Anchor discriminator: first 8 bytes of `sha256("<namespace>:<name>")`
pub fn sighash(namespace: &str, name: &str) -> [u8; 8] {
    let digest = Sha256::digest(format!("{namespace}:{name}").as_bytes());
    let mut discriminator = [0u8; 8];
    discriminator.copy_from_slice(&digest[..8]);
    discriminator
}

#[derive(Debug, Clone, Deserialize)]
pub struct Idl {
    pub address: String,
    #[serde(default)]
    pub metadata: IdlMetadata,
    pub instructions: Vec<IdlInstruction>,
    #[serde(default)]
    pub accounts: Vec<IdlAccount>,
    #[serde(default)]
    pub types: Vec<IdlTypeDef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdlMetadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdlInstruction {
    pub name: String,
    #[serde(default)]
    pub discriminator: Option<Vec<u8>>,
    #[serde(default)]
    pub accounts: Vec<IdlInstructionAccount>,
    #[serde(default)]
    pub args: Vec<IdlField>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdlInstructionAccount {
    pub name: String,
    #[serde(default)]
    pub writable: bool,
    #[serde(default)]
    pub signer: bool,
    /// Fixed address, e.g. the system program
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdlAccount {
    pub name: String,
    #[serde(default)]
    pub discriminator: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IdlField {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: IdlType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdlPrimitive {
    Bool,
    U8,
    U16,
    U32,
    U64,
    U128,
    I8,
    I16,
    I32,
    I64,
    I128,
    Pubkey,
    String,
    Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum IdlType {
    Primitive(IdlPrimitive),
    /// `{"defined": ..}`, `{"vec": ..}`, `{"option": ..}` and friends
    Composite(serde_json::Value),
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdlTypeDef {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: IdlTypeDefTy,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum IdlTypeDefTy {
    Struct {
        #[serde(default)]
        fields: Vec<IdlField>,
    },
    Enum {
        #[serde(default)]
        variants: Vec<serde_json::Value>,
    },
    Type {
        alias: serde_json::Value,
    },
}

/// Parsed descriptor plus the resolved program address
#[derive(Debug, Clone)]
pub struct ProgramInterface {
    idl: Idl,
    program_id: Pubkey,
}

impl ProgramInterface {
    /// The descriptor shipped with this crate
    pub fn embedded() -> Result<Self> {
        Self::from_json(EMBEDDED_IDL)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| DappError::Idl(format!("failed to read {}: {err}", path.display())))?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let idl: Idl = serde_json::from_str(raw).map_err(|err| DappError::Idl(err.to_string()))?;
        let program_id = Pubkey::from_str(&idl.address)
            .map_err(|err| DappError::Idl(format!("invalid program address {}: {err}", idl.address)))?;
        Ok(Self { idl, program_id })
    }

    pub fn program_id(&self) -> Pubkey {
        self.program_id
    }

    pub fn name(&self) -> &str {
        &self.idl.metadata.name
    }

    pub fn instruction(&self, name: &str) -> Result<&IdlInstruction> {
        self.idl
            .instructions
            .iter()
            .find(|ix| ix.name == name)
            .ok_or_else(|| DappError::Idl(format!("instruction `{name}` not found")))
    }

    pub fn instruction_discriminator(&self, name: &str) -> Result<[u8; 8]> {
        let ix = self.instruction(name)?;
        discriminator_or_sighash(ix.discriminator.as_deref(), "global", &ix.name)
    }

    pub fn account_discriminator(&self, name: &str) -> Result<[u8; 8]> {
        let account = self
            .idl
            .accounts
            .iter()
            .find(|account| account.name == name)
            .ok_or_else(|| DappError::Idl(format!("account `{name}` not found")))?;
        discriminator_or_sighash(account.discriminator.as_deref(), "account", &account.name)
    }

    /// Check that the descriptor really describes the counter program this
    /// client speaks to.
    pub fn validate(&self) -> Result<()> {
        let step = [IdlField {
            name: "step".to_string(),
            ty: IdlType::Primitive(IdlPrimitive::U64),
        }];
        for name in [INCREASE_COUNTER, DECREASE_COUNTER] {
            let ix = self.instruction(name)?;
            if ix.args != step {
                return Err(DappError::Idl(format!(
                    "instruction `{name}` must take a single u64 `step` argument"
                )));
            }
            self.instruction_discriminator(name)?;
        }

        self.account_discriminator(COUNTER_ACCOUNT)?;

        let layout = self
            .idl
            .types
            .iter()
            .find(|def| def.name == COUNTER_ACCOUNT)
            .ok_or_else(|| DappError::Idl(format!("type `{COUNTER_ACCOUNT}` not found")))?;
        let expected = [
            IdlField {
                name: "authority".to_string(),
                ty: IdlType::Primitive(IdlPrimitive::Pubkey),
            },
            IdlField {
                name: "count".to_string(),
                ty: IdlType::Primitive(IdlPrimitive::U64),
            },
        ];
        match &layout.ty {
            IdlTypeDefTy::Struct { fields } if fields[..] == expected[..] => Ok(()),
            _ => Err(DappError::Idl(format!(
                "type `{COUNTER_ACCOUNT}` must be {{ authority: pubkey, count: u64 }}"
            ))),
        }
    }
}

fn discriminator_or_sighash(given: Option<&[u8]>, namespace: &str, name: &str) -> Result<[u8; 8]> {
    match given {
        Some(bytes) => bytes.try_into().map_err(|_| {
            DappError::Idl(format!(
                "discriminator of `{name}` must be 8 bytes, got {}",
                bytes.len()
            ))
        }),
        None => Ok(sighash(namespace, name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "address": "HK6pq31qYDZPQAu2yYAa29njYRMngVDPDKBgEdA9NZJn",
        "instructions": [
            { "name": "increase_counter", "accounts": [], "args": [{ "name": "step", "type": "u64" }] },
            { "name": "decrease_counter", "accounts": [], "args": [{ "name": "step", "type": "u64" }] }
        ],
        "accounts": [{ "name": "Counter" }],
        "types": [
            { "name": "Counter", "type": { "kind": "struct", "fields": [
                { "name": "authority", "type": "pubkey" },
                { "name": "count", "type": "u64" }
            ] } }
        ]
    }"#;

    #[test]
    fn embedded_descriptor_is_valid() {
        let interface = ProgramInterface::embedded().expect("embedded idl");
        interface.validate().expect("valid");
        assert_eq!(interface.name(), "counter");
        assert_eq!(
            interface.program_id().to_string(),
            "HK6pq31qYDZPQAu2yYAa29njYRMngVDPDKBgEdA9NZJn"
        );
    }

    #[test]
    fn embedded_discriminators_match_anchor_sighash() {
        let interface = ProgramInterface::embedded().unwrap();
        assert_eq!(
            interface.instruction_discriminator(INCREASE_COUNTER).unwrap(),
            sighash("global", INCREASE_COUNTER)
        );
        assert_eq!(
            interface.instruction_discriminator(DECREASE_COUNTER).unwrap(),
            sighash("global", DECREASE_COUNTER)
        );
        assert_eq!(
            interface.account_discriminator(COUNTER_ACCOUNT).unwrap(),
            [255, 176, 4, 245, 188, 253, 124, 25]
        );
    }

    #[test]
    fn missing_discriminators_are_derived() {
        let interface = ProgramInterface::from_json(MINIMAL).unwrap();
        interface.validate().unwrap();
        assert_eq!(
            interface.instruction_discriminator(INCREASE_COUNTER).unwrap(),
            [169, 230, 168, 4, 38, 49, 103, 217]
        );
        assert_eq!(
            interface.account_discriminator(COUNTER_ACCOUNT).unwrap(),
            sighash("account", COUNTER_ACCOUNT)
        );
    }

    #[test]
    fn rejects_wrong_account_layout() {
        let raw = MINIMAL.replace(r#""name": "count", "type": "u64""#, r#""name": "count", "type": "u32""#);
        let interface = ProgramInterface::from_json(&raw).unwrap();
        assert!(matches!(interface.validate(), Err(DappError::Idl(_))));
    }

    #[test]
    fn rejects_missing_instruction() {
        let raw = MINIMAL.replace("decrease_counter", "reset_counter");
        let interface = ProgramInterface::from_json(&raw).unwrap();
        let err = interface.validate().unwrap_err();
        assert!(err.to_string().contains("decrease_counter"));
    }

    #[test]
    fn rejects_short_discriminator() {
        let raw = MINIMAL.replace(r#"{ "name": "Counter" }"#, r#"{ "name": "Counter", "discriminator": [1, 2, 3] }"#);
        let interface = ProgramInterface::from_json(&raw).unwrap();
        assert!(interface.account_discriminator(COUNTER_ACCOUNT).is_err());
    }

    #[test]
    fn rejects_bad_program_address() {
        let raw = MINIMAL.replace("HK6pq31qYDZPQAu2yYAa29njYRMngVDPDKBgEdA9NZJn", "not-a-key");
        assert!(matches!(ProgramInterface::from_json(&raw), Err(DappError::Idl(_))));
    }

    #[test]
    fn parses_composite_argument_types() {
        let mut interface = ProgramInterface::from_json(MINIMAL).unwrap();
        interface.idl.instructions.push(
            serde_json::from_str(
                r#"{ "name": "configure", "args": [{ "name": "labels", "type": { "vec": "string" } }] }"#,
            )
            .unwrap(),
        );
        let ix = interface.instruction("configure").unwrap();
        assert!(matches!(ix.args[0].ty, IdlType::Composite(_)));
        interface.validate().unwrap();
    }
}
