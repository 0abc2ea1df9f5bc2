//! Anchor IDL adapter
//!
//! Reads an Anchor JSON IDL (the 0.30+ layout, with the legacy pre-0.30
//! field names accepted as aliases) and converts it into a [`ProgramSpec`].
//!
//! ## Conversion rules
//! - `address` on an account → [`DefaultRule::ConstantAddress`]
//! - `pda` on an account → [`DefaultRule::Derived`]
//!   - `const` seeds → raw literal bytes; legacy typed constants are encoded
//!     by their declared type (a `publicKey` becomes its 32 key bytes)
//!   - `account` seeds → [`SeedSpec::AccountRef`]
//!   - `arg` seeds → [`SeedSpec::ArgumentRef`] encoded the way Anchor feeds
//!     them to `find_program_address` (strings and bytes without a length prefix)
//!   - `pda.program` given as `const` bytes → [`ProgramRef::Address`]
//!   - `pda.program` given as an `account` → [`ProgramRef::Account`], resolved
//!     alongside the other accounts of the instruction
//! - Neither → well-known defaults (`payer`, `systemProgram`, sysvars, ...)
//!
//! Seeds that read fields of account data (`path` containing a `.`) need an
//! RPC fetch; those accounts are left without a default rule so the caller
//! can supply them.
//!
//! ## Usage
//! ```ignore
//! use account_resolver::idl::anchor::AnchorIdl;
//!
//! let idl = AnchorIdl::load("target/idl/vault.json")?;
//! let program = idl.into_program_spec(&Default::default())?;
//! ```

use super::codec;
use super::types::{ArgumentValue, NumberFormat, TypeDescriptor};
use super::{
    AccountSpec, ArgumentSpec, DefaultRule, InstructionSpec, ProgramRef, ProgramSpec, SeedSpec,
};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

/// Addresses a Codama import fills in for conventionally named accounts
const WELL_KNOWN_ACCOUNTS: &[(&[&str], &str)] = &[
    (&["systemProgram", "system_program"], "11111111111111111111111111111111"),
    (
        &["tokenProgram", "token_program"],
        "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA",
    ),
    (
        &["associatedTokenProgram", "associated_token_program"],
        "ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL",
    ),
    (&["rent"], "SysvarRent111111111111111111111111111111111"),
    (&["clock"], "SysvarC1ock11111111111111111111111111111111"),
];

/// Loader settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoaderConfig {
    /// Account names that default to the caller's address
    pub caller_accounts: Vec<String>,
    /// Fill in system program, token programs and sysvars by name
    pub well_known_programs: bool,
    /// Program address to use when the IDL carries none
    pub program_address: Option<String>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            caller_accounts: vec!["payer".to_string()],
            well_known_programs: true,
            program_address: None,
        }
    }
}

impl LoaderConfig {
    /// Set caller account names. Returns self for method chaining.
    pub fn with_caller_accounts(mut self, names: &[&str]) -> Self {
        self.caller_accounts = names.iter().map(|n| n.to_string()).collect();
        self
    }

    /// Toggle well-known program defaults. Returns self for method chaining.
    pub fn with_well_known_programs(mut self, enabled: bool) -> Self {
        self.well_known_programs = enabled;
        self
    }

    /// Override the program address. Returns self for method chaining.
    pub fn with_program_address(mut self, address: &str) -> Self {
        self.program_address = Some(address.to_string());
        self
    }
}

/// Anchor IDL document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnchorIdl {
    /// Program address (0.30+)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Program name (legacy)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Program metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<AnchorMetadata>,
    /// Instructions
    #[serde(default)]
    pub instructions: Vec<AnchorInstruction>,
}

/// IDL metadata block
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnchorMetadata {
    /// Program name (0.30+)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Program version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Deployed address (legacy)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Instruction definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnchorInstruction {
    /// Instruction name
    pub name: String,
    /// Accounts, possibly grouped
    #[serde(default)]
    pub accounts: Vec<AnchorAccountItem>,
    /// Arguments
    #[serde(default)]
    pub args: Vec<AnchorField>,
    /// Discriminator bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<Vec<u8>>,
}

/// Either a single account or a named group of accounts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnchorAccountItem {
    /// Nested account group (flattened on conversion)
    Composite(AnchorAccountGroup),
    /// Plain account
    Single(AnchorAccount),
}

/// Named group of accounts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnchorAccountGroup {
    /// Group name
    pub name: String,
    /// Group members
    pub accounts: Vec<AnchorAccountItem>,
}

/// Instruction account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnchorAccount {
    /// Account name
    pub name: String,
    /// Writable
    #[serde(default, alias = "isMut")]
    pub writable: bool,
    /// Signer
    #[serde(default, alias = "isSigner")]
    pub signer: bool,
    /// Optional
    #[serde(default, alias = "isOptional")]
    pub optional: bool,
    /// Documentation
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub docs: Vec<String>,
    /// Fixed address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// PDA definition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pda: Option<AnchorPda>,
}

/// PDA definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnchorPda {
    /// Seeds in order
    pub seeds: Vec<AnchorSeed>,
    /// Owner program when not the IDL's own program
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program: Option<AnchorSeed>,
}

/// One PDA seed
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AnchorSeed {
    /// Constant bytes (0.30+) or typed constant (legacy)
    Const {
        /// Byte array, or a string for legacy string constants
        value: serde_json::Value,
        /// Legacy declared type
        #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
        ty: Option<AnchorType>,
    },
    /// Instruction argument
    Arg {
        /// Argument name (or `arg.field`)
        path: String,
        /// Legacy declared type
        #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
        ty: Option<AnchorType>,
    },
    /// Another account's key (or `account.field` for account data)
    Account {
        /// Account name (or `account.field`)
        path: String,
        /// Account type for data paths
        #[serde(default, skip_serializing_if = "Option::is_none")]
        account: Option<String>,
    },
}

/// Named, typed field (arguments)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnchorField {
    /// Field name
    pub name: String,
    /// Field type
    #[serde(rename = "type")]
    pub ty: AnchorType,
}

/// Anchor type expression
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnchorType {
    /// Primitive: "u8" .. "i128", "f32", "f64", "bool", "string", "bytes", "pubkey"/"publicKey"
    Primitive(String),
    /// Optional value
    Option {
        /// Inner type
        option: Box<AnchorType>,
    },
    /// Dynamic vector
    Vec {
        /// Element type
        vec: Box<AnchorType>,
    },
    /// Fixed-size array: [type, length]
    Array {
        /// Element type and length (a number, or a generic reference)
        array: (Box<AnchorType>, serde_json::Value),
    },
    /// User-defined type
    Defined {
        /// Type name (string in legacy IDLs, object in 0.30+)
        defined: serde_json::Value,
    },
}

impl AnchorType {
    /// Codec for an instruction argument of this type
    pub fn to_descriptor(&self) -> Option<TypeDescriptor> {
        match self {
            AnchorType::Primitive(name) => match name.as_str() {
                "bool" => Some(TypeDescriptor::Boolean),
                "string" => Some(TypeDescriptor::string()),
                "bytes" => Some(TypeDescriptor::bytes()),
                "pubkey" | "publicKey" => Some(TypeDescriptor::PublicKey),
                other => NumberFormat::from_name(other).map(TypeDescriptor::number),
            },
            AnchorType::Option { option } => option.to_descriptor().map(TypeDescriptor::option),
            AnchorType::Vec { vec } => match vec.as_ref() {
                AnchorType::Primitive(p) if p == "u8" => Some(TypeDescriptor::bytes()),
                _ => None,
            },
            AnchorType::Array { array: (inner, len) } => match (inner.as_ref(), len.as_u64()) {
                (AnchorType::Primitive(p), Some(len)) if p == "u8" => {
                    Some(TypeDescriptor::FixedBytes { len: len as usize })
                }
                _ => None,
            },
            AnchorType::Defined { .. } => None,
        }
    }

    /// Codec Anchor uses when this type appears as a PDA seed
    pub fn to_seed_descriptor(&self) -> Option<TypeDescriptor> {
        match self.to_descriptor()? {
            TypeDescriptor::String { .. } => Some(TypeDescriptor::raw_string()),
            TypeDescriptor::Bytes { .. } => Some(TypeDescriptor::raw_bytes()),
            TypeDescriptor::Option { .. } => None,
            other => Some(other),
        }
    }
}

impl AnchorIdl {
    /// Load IDL from JSON file
    pub fn load(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::IdlParse(format!("Failed to read IDL file: {}", e)))?;

        Self::parse(&contents)
    }

    /// Parse IDL from JSON string
    pub fn parse(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::IdlParse(format!("Failed to parse IDL JSON: {}", e)))
    }

    /// Program name from whichever location the IDL version uses
    pub fn program_name(&self) -> String {
        self.metadata
            .as_ref()
            .and_then(|m| m.name.clone())
            .or_else(|| self.name.clone())
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// Convert into the resolver's program description
    pub fn into_program_spec(&self, config: &LoaderConfig) -> Result<ProgramSpec> {
        let address = config
            .program_address
            .as_deref()
            .or(self.address.as_deref())
            .or_else(|| self.metadata.as_ref().and_then(|m| m.address.as_deref()))
            .ok_or_else(|| Error::IdlParse("IDL has no program address".to_string()))?;
        let address = super::parse_address(address)
            .map_err(|e| Error::IdlParse(format!("program address: {}", e)))?;

        let mut program = ProgramSpec::new(self.program_name(), address);
        for ix in &self.instructions {
            program.instructions.push(convert_instruction(ix, config)?);
        }

        tracing::debug!(
            program = %program.name,
            instructions = program.instructions.len(),
            "converted Anchor IDL"
        );
        Ok(program)
    }
}

fn convert_instruction(ix: &AnchorInstruction, config: &LoaderConfig) -> Result<InstructionSpec> {
    let mut spec = InstructionSpec::new(ix.name.clone());

    for arg in &ix.args {
        match arg.ty.to_descriptor() {
            Some(ty) => spec.arguments.push(ArgumentSpec::new(arg.name.clone(), ty)),
            None => tracing::debug!(
                instruction = %ix.name,
                argument = %arg.name,
                "argument type has no seed codec, skipping"
            ),
        }
    }

    let mut flat = Vec::new();
    flatten_accounts(&ix.accounts, &mut flat);
    for account in flat {
        let rule = default_rule(&ix.name, account, &ix.args, config)?;
        spec.accounts.push(AccountSpec {
            name: account.name.clone(),
            default_rule: rule,
            is_writable: account.writable,
            is_signer: account.signer,
            is_optional: account.optional,
            docs: account.docs.clone(),
        });
    }

    spec.validate()?;
    Ok(spec)
}

fn flatten_accounts<'a>(items: &'a [AnchorAccountItem], out: &mut Vec<&'a AnchorAccount>) {
    for item in items {
        match item {
            AnchorAccountItem::Single(account) => out.push(account),
            AnchorAccountItem::Composite(group) => flatten_accounts(&group.accounts, out),
        }
    }
}

fn default_rule(
    instruction: &str,
    account: &AnchorAccount,
    args: &[AnchorField],
    config: &LoaderConfig,
) -> Result<Option<DefaultRule>> {
    if let Some(address) = &account.address {
        let address = super::parse_address(address)
            .map_err(|e| Error::IdlParse(format!("{}.{}: {}", instruction, account.name, e)))?;
        return Ok(Some(DefaultRule::constant(address)));
    }

    if let Some(pda) = &account.pda {
        return match convert_pda(pda, args) {
            Ok(rule) => Ok(Some(rule)),
            Err(Error::UnsupportedSeed { description }) => {
                tracing::warn!(
                    instruction,
                    account = %account.name,
                    %description,
                    "PDA cannot be derived offline, account must be supplied"
                );
                Ok(None)
            }
            Err(e) => Err(e),
        };
    }

    if config.caller_accounts.iter().any(|n| *n == account.name) {
        return Ok(Some(DefaultRule::CallerAddress));
    }

    if config.well_known_programs {
        for (names, address) in WELL_KNOWN_ACCOUNTS {
            if names.contains(&account.name.as_str()) {
                return Ok(Some(DefaultRule::constant(super::parse_address(address)?)));
            }
        }
    }

    Ok(None)
}

fn convert_pda(pda: &AnchorPda, args: &[AnchorField]) -> Result<DefaultRule> {
    let seeds = pda
        .seeds
        .iter()
        .map(|seed| convert_seed(seed, args))
        .collect::<Result<Vec<_>>>()?;

    let program = match &pda.program {
        None => None,
        Some(AnchorSeed::Const { value, ty }) => {
            let bytes = const_bytes(value, ty.as_ref())?;
            let bytes: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| Error::IdlParse(
                format!("PDA program must be 32 bytes, got {}", b.len()),
            ))?;
            Some(ProgramRef::Address {
                address: Pubkey::new_from_array(bytes),
            })
        }
        Some(AnchorSeed::Account { path, .. }) if !path.contains('.') => {
            Some(ProgramRef::Account { name: path.clone() })
        }
        Some(other) => {
            return Err(Error::UnsupportedSeed {
                description: format!("dynamic PDA program {:?}", other),
            })
        }
    };

    Ok(DefaultRule::Derived { seeds, program })
}

fn convert_seed(seed: &AnchorSeed, args: &[AnchorField]) -> Result<SeedSpec> {
    match seed {
        AnchorSeed::Const { value, ty } => Ok(SeedSpec::bytes(const_bytes(value, ty.as_ref())?)),
        AnchorSeed::Account { path, .. } => {
            if path.contains('.') {
                return Err(Error::UnsupportedSeed {
                    description: format!("account data field {}", path),
                });
            }
            Ok(SeedSpec::account(path.clone()))
        }
        AnchorSeed::Arg { path, ty } => {
            if path.contains('.') {
                return Err(Error::UnsupportedSeed {
                    description: format!("argument field {}", path),
                });
            }
            let declared = ty
                .as_ref()
                .or_else(|| args.iter().find(|a| a.name == *path).map(|a| &a.ty));
            let seed_type = declared
                .and_then(AnchorType::to_seed_descriptor)
                .ok_or_else(|| Error::UnsupportedSeed {
                    description: format!("argument {} has no seed encoding", path),
                })?;
            Ok(SeedSpec::ArgumentRef {
                name: path.clone(),
                seed_type: Some(seed_type),
            })
        }
    }
}

/// Bytes of a constant seed. Byte arrays are taken as is; otherwise a declared
/// legacy type picks the encoding, and untyped strings are UTF-8.
fn const_bytes(value: &serde_json::Value, ty: Option<&AnchorType>) -> Result<Vec<u8>> {
    if !value.is_array() {
        if let Some(desc) = ty.and_then(AnchorType::to_seed_descriptor) {
            return ArgumentValue::from_json(&desc, value)
                .and_then(|v| codec::encode_value("const", &desc, &v))
                .map_err(|e| Error::IdlParse(format!("const seed {}: {}", value, e)));
        }
    }
    match value {
        serde_json::Value::String(s) => Ok(s.as_bytes().to_vec()),
        serde_json::Value::Array(items) => items
            .iter()
            .map(|v| {
                v.as_u64()
                    .and_then(|b| u8::try_from(b).ok())
                    .ok_or_else(|| Error::IdlParse(format!("seed byte out of range: {}", v)))
            })
            .collect(),
        other => Err(Error::IdlParse(format!("unsupported const seed {}", other))),
    }
}
