//! # Instruction descriptions
//!
//! The intermediate model the resolver consumes: programs, their
//! instructions, each instruction's accounts (optionally carrying a default
//! rule) and typed arguments. A program-interface loader produces these;
//! [`anchor`] converts an Anchor JSON IDL.
//!
//! Every type round-trips through JSON using `kind`-tagged variants:
//!
//! ```json
//! {
//!   "name": "vault",
//!   "defaultRule": {
//!     "kind": "derived",
//!     "seeds": [
//!       { "kind": "literal", "encoding": "utf8", "data": "vault" },
//!       { "kind": "accountRef", "name": "payer" }
//!     ]
//!   }
//! }
//! ```

pub mod anchor;
pub mod codec;
pub mod types;

pub use types::{ArgumentValue, Endian, NumberFormat, SizePrefix, TypeDescriptor};

use crate::{Error, Result};
use base64::Engine;
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

/// A program and the instructions it exposes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramSpec {
    /// Program name
    pub name: String,
    /// Deployed program address, owner of `Derived` rules without an explicit program
    #[serde(with = "address")]
    pub address: Pubkey,
    /// Instructions exposed by the program
    #[serde(default)]
    pub instructions: Vec<InstructionSpec>,
}

impl ProgramSpec {
    /// Create an empty program description
    pub fn new(name: impl Into<String>, address: Pubkey) -> Self {
        Self {
            name: name.into(),
            address,
            instructions: Vec::new(),
        }
    }

    /// Add an instruction. Returns self for method chaining.
    pub fn with_instruction(mut self, instruction: InstructionSpec) -> Self {
        self.instructions.push(instruction);
        self
    }

    /// Find an instruction by name
    pub fn find_instruction(&self, name: &str) -> Option<&InstructionSpec> {
        self.instructions.iter().find(|ix| ix.name == name)
    }
}

/// One instruction: ordered accounts and ordered arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstructionSpec {
    /// Instruction name
    pub name: String,
    /// Accounts in declaration order
    #[serde(default)]
    pub accounts: Vec<AccountSpec>,
    /// Arguments in declaration order
    #[serde(default)]
    pub arguments: Vec<ArgumentSpec>,
}

impl InstructionSpec {
    /// Create an instruction with no accounts or arguments
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            accounts: Vec::new(),
            arguments: Vec::new(),
        }
    }

    /// Add an account. Returns self for method chaining.
    pub fn with_account(mut self, account: AccountSpec) -> Self {
        self.accounts.push(account);
        self
    }

    /// Add an argument. Returns self for method chaining.
    pub fn with_argument(mut self, argument: ArgumentSpec) -> Self {
        self.arguments.push(argument);
        self
    }

    /// Find an account by name
    pub fn account(&self, name: &str) -> Option<&AccountSpec> {
        self.accounts.iter().find(|a| a.name == name)
    }

    /// Find an argument by name
    pub fn argument(&self, name: &str) -> Option<&ArgumentSpec> {
        self.arguments.iter().find(|a| a.name == name)
    }

    /// Reject instructions that declare the same account name twice
    pub fn validate(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::with_capacity(self.accounts.len());
        for account in &self.accounts {
            if !seen.insert(account.name.as_str()) {
                return Err(Error::DuplicateAccount {
                    instruction: self.name.clone(),
                    name: account.name.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Account slot of an instruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSpec {
    /// Account name (unique within the instruction)
    pub name: String,
    /// How to compute the address when the caller does not (or may not) supply it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_rule: Option<DefaultRule>,
    /// Whether the account is writable
    #[serde(default)]
    pub is_writable: bool,
    /// Whether the account must sign
    #[serde(default)]
    pub is_signer: bool,
    /// Whether the account may be omitted
    #[serde(default)]
    pub is_optional: bool,
    /// Documentation lines
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub docs: Vec<String>,
}

impl AccountSpec {
    /// Account the caller must supply
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default_rule: None,
            is_writable: false,
            is_signer: false,
            is_optional: false,
            docs: Vec::new(),
        }
    }

    /// Account with a default rule
    pub fn with_rule(name: impl Into<String>, rule: DefaultRule) -> Self {
        Self::new(name).rule(rule)
    }

    /// Set the default rule. Returns self for method chaining.
    pub fn rule(mut self, rule: DefaultRule) -> Self {
        self.default_rule = Some(rule);
        self
    }

    /// Mark writable. Returns self for method chaining.
    pub fn writable(mut self) -> Self {
        self.is_writable = true;
        self
    }

    /// Mark signer. Returns self for method chaining.
    pub fn signer(mut self) -> Self {
        self.is_signer = true;
        self
    }
}

/// Default address rule of an account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DefaultRule {
    /// Fixed address known at definition time
    ConstantAddress {
        /// The address
        #[serde(with = "address")]
        address: Pubkey,
    },
    /// The invoking caller's own address
    CallerAddress,
    /// Program-derived address
    Derived {
        /// Seeds in derivation order
        seeds: Vec<SeedSpec>,
        /// Owner program; `None` means the instruction's own program
        #[serde(default, skip_serializing_if = "Option::is_none")]
        program: Option<ProgramRef>,
    },
}

/// Owner program of a `Derived` rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ProgramRef {
    /// Fixed program address
    Address {
        /// The program
        #[serde(with = "address")]
        address: Pubkey,
    },
    /// Address of another account of the instruction, once resolved
    Account {
        /// Referenced account
        name: String,
    },
}

impl DefaultRule {
    /// `ConstantAddress` rule
    pub fn constant(address: Pubkey) -> Self {
        DefaultRule::ConstantAddress { address }
    }

    /// `Derived` rule owned by the instruction's program
    pub fn derived(seeds: Vec<SeedSpec>) -> Self {
        DefaultRule::Derived {
            seeds,
            program: None,
        }
    }

    /// `Derived` rule owned by another program
    pub fn derived_by(program: Pubkey, seeds: Vec<SeedSpec>) -> Self {
        DefaultRule::Derived {
            seeds,
            program: Some(ProgramRef::Address { address: program }),
        }
    }

    /// `Derived` rule owned by the program another account resolves to
    pub fn derived_by_account(account: impl Into<String>, seeds: Vec<SeedSpec>) -> Self {
        DefaultRule::Derived {
            seeds,
            program: Some(ProgramRef::Account {
                name: account.into(),
            }),
        }
    }
}

/// One piece of PDA seed material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SeedSpec {
    /// Fixed bytes known at definition time
    Literal(LiteralSeed),
    /// Another account's resolved address
    AccountRef {
        /// Referenced account
        name: String,
    },
    /// An instruction argument's encoded value
    ArgumentRef {
        /// Referenced argument
        name: String,
        /// Codec declared for this seed; falls back to the argument's own type
        #[serde(default, rename = "seedType", skip_serializing_if = "Option::is_none")]
        seed_type: Option<TypeDescriptor>,
    },
}

impl SeedSpec {
    /// UTF-8 literal seed
    pub fn utf8(data: impl Into<String>) -> Self {
        SeedSpec::Literal(LiteralSeed::Utf8 { data: data.into() })
    }

    /// Raw byte literal seed
    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        SeedSpec::Literal(LiteralSeed::Raw {
            bytes: bytes.into(),
        })
    }

    /// Reference to another account
    pub fn account(name: impl Into<String>) -> Self {
        SeedSpec::AccountRef { name: name.into() }
    }

    /// Reference to an argument, encoded with the argument's declared type
    pub fn argument(name: impl Into<String>) -> Self {
        SeedSpec::ArgumentRef {
            name: name.into(),
            seed_type: None,
        }
    }

    /// Name of the account or argument this seed depends on
    pub fn dependency(&self) -> Option<&str> {
        match self {
            SeedSpec::Literal(_) => None,
            SeedSpec::AccountRef { name } | SeedSpec::ArgumentRef { name, .. } => Some(name),
        }
    }
}

/// Literal seed bytes with their storage encoding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "encoding", rename_all = "camelCase")]
pub enum LiteralSeed {
    /// Bytes stored as-is
    Raw {
        /// The bytes
        bytes: Vec<u8>,
    },
    /// UTF-8 text
    Utf8 {
        /// Text
        data: String,
    },
    /// Hex text
    Base16 {
        /// Hex digits
        data: String,
    },
    /// Base58 text
    Base58 {
        /// Base58 digits
        data: String,
    },
    /// Base64 text (standard alphabet, padded)
    Base64 {
        /// Base64 digits
        data: String,
    },
}

impl LiteralSeed {
    /// Decode the stored data into seed bytes
    pub fn decode(&self) -> Result<Vec<u8>> {
        let invalid = |encoding: &str, data: &str, e: String| Error::InvalidSeedEncoding {
            description: format!("{} literal {:?}: {}", encoding, data, e),
        };

        match self {
            LiteralSeed::Raw { bytes } => Ok(bytes.clone()),
            LiteralSeed::Utf8 { data } => Ok(data.as_bytes().to_vec()),
            LiteralSeed::Base16 { data } => {
                hex::decode(data).map_err(|e| invalid("base16", data.as_str(), e.to_string()))
            }
            LiteralSeed::Base58 { data } => bs58::decode(data)
                .into_vec()
                .map_err(|e| invalid("base58", data.as_str(), e.to_string())),
            LiteralSeed::Base64 { data } => base64::engine::general_purpose::STANDARD
                .decode(data)
                .map_err(|e| invalid("base64", data.as_str(), e.to_string())),
        }
    }
}

/// Typed instruction argument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArgumentSpec {
    /// Argument name
    pub name: String,
    /// Declared type, selects the seed codec
    #[serde(rename = "type")]
    pub type_descriptor: TypeDescriptor,
}

impl ArgumentSpec {
    /// Create an argument
    pub fn new(name: impl Into<String>, type_descriptor: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            type_descriptor,
        }
    }
}

/// Parse a base58 address, rejecting anything that is not exactly 32 bytes
pub fn parse_address(value: &str) -> Result<Pubkey> {
    value
        .parse::<Pubkey>()
        .map_err(|_| Error::InvalidAddress {
            value: value.to_string(),
        })
}

/// Whether `value` is a syntactically valid address
pub fn is_address(value: &str) -> bool {
    parse_address(value).is_ok()
}

/// Serde adapter storing addresses as base58 strings
pub mod address {
    use serde::{Deserialize, Deserializer, Serializer};
    use solana_sdk::pubkey::Pubkey;

    /// Serialize as base58
    pub fn serialize<S: Serializer>(key: &Pubkey, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(key)
    }

    /// Deserialize from base58
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Pubkey, D::Error> {
        let s = String::deserialize(deserializer)?;
        super::parse_address(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_decoding() {
        let hex = LiteralSeed::Base16 {
            data: "deadbeef".to_string(),
        };
        assert_eq!(hex.decode().unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);

        let b58 = LiteralSeed::Base58 {
            data: "2g".to_string(),
        };
        assert_eq!(b58.decode().unwrap(), vec![0x61]);

        let b64 = LiteralSeed::Base64 {
            data: "dmF1bHQ=".to_string(),
        };
        assert_eq!(b64.decode().unwrap(), b"vault".to_vec());
    }

    #[test]
    fn test_malformed_literal_is_invalid_seed_encoding() {
        let bad = LiteralSeed::Base16 {
            data: "xyz".to_string(),
        };
        assert!(matches!(
            bad.decode(),
            Err(Error::InvalidSeedEncoding { .. })
        ));

        let bad = LiteralSeed::Base58 {
            data: "0OIl".to_string(),
        };
        assert!(matches!(
            bad.decode(),
            Err(Error::InvalidSeedEncoding { .. })
        ));
    }

    #[test]
    fn test_duplicate_accounts_rejected() {
        let ix = InstructionSpec::new("init")
            .with_account(AccountSpec::new("a"))
            .with_account(AccountSpec::new("a"));
        assert_eq!(
            ix.validate(),
            Err(Error::DuplicateAccount {
                instruction: "init".to_string(),
                name: "a".to_string(),
            })
        );
    }

    #[test]
    fn test_address_validation() {
        assert!(is_address("11111111111111111111111111111111"));
        assert!(!is_address(""));
        assert!(!is_address("not-an-address"));
        // valid base58 but only 3 bytes
        assert!(!is_address("2gVb"));
    }

    #[test]
    fn test_account_json_shape() {
        let json = r#"{
            "name": "vault",
            "defaultRule": {
                "kind": "derived",
                "seeds": [
                    { "kind": "literal", "encoding": "utf8", "data": "vault" },
                    { "kind": "accountRef", "name": "payer" }
                ]
            }
        }"#;
        let account: AccountSpec = serde_json::from_str(json).unwrap();
        assert_eq!(
            account.default_rule,
            Some(DefaultRule::derived(vec![
                SeedSpec::utf8("vault"),
                SeedSpec::account("payer"),
            ]))
        );
        assert!(!account.is_signer);

        let back = serde_json::to_value(&account).unwrap();
        assert_eq!(back["defaultRule"]["seeds"][0]["encoding"], "utf8");
    }

    #[test]
    fn test_constant_rule_json_uses_base58() {
        let rule = DefaultRule::constant(Pubkey::new_from_array([0u8; 32]));
        let json = serde_json::to_string(&rule).unwrap();
        assert_eq!(
            json,
            r#"{"kind":"constantAddress","address":"11111111111111111111111111111111"}"#
        );
        let back: DefaultRule = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rule);
    }

    #[test]
    fn test_owner_program_json() {
        let rule = DefaultRule::derived_by_account("tokenProgram", vec![SeedSpec::account("payer")]);
        let json = serde_json::to_value(&rule).unwrap();
        assert_eq!(json["program"]["kind"], "account");
        assert_eq!(json["program"]["name"], "tokenProgram");

        let fixed = DefaultRule::derived_by(Pubkey::new_from_array([0u8; 32]), vec![]);
        let json = serde_json::to_value(&fixed).unwrap();
        assert_eq!(json["program"]["kind"], "address");
        assert_eq!(json["program"]["address"], "11111111111111111111111111111111");
        assert_eq!(serde_json::from_value::<DefaultRule>(json).unwrap(), fixed);
    }
}
