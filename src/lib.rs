//! # account-resolver - Instruction Account Resolution for Solana
//!
//! Before an instruction can be sent, every account it touches needs a
//! concrete address. Program interfaces describe many of them by rule:
//! a fixed program id, "whoever signs", or a program-derived address built
//! from seeds that may themselves reference other accounts and arguments.
//! This crate turns those rules into addresses.
//!
//! ## Features
//!
//! - **Fixed-point resolution** - derived accounts may depend on other derived
//!   accounts, in any declaration order
//! - **Cycle detection** - mutually dependent accounts are reported, not looped on
//! - **Bit-exact PDA derivation** - same hash, bump order and curve check as the chain
//! - **Typed seeds** - literals in five encodings, account addresses and
//!   Borsh/Codama-encoded arguments
//! - **Anchor IDL import** - `pda`, `address` and well-known defaults
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! account-resolver = "0.1.0"
//! ```
//!
//! ### Basic Usage
//!
//! ```rust
//! use account_resolver::{resolve, AccountSpec, DefaultRule, InstructionSpec, SeedSpec};
//! use solana_sdk::pubkey::Pubkey;
//! use std::collections::HashMap;
//!
//! # fn main() -> account_resolver::Result<()> {
//! let instruction = InstructionSpec::new("deposit")
//!     .with_account(AccountSpec::with_rule("payer", DefaultRule::CallerAddress))
//!     .with_account(AccountSpec::with_rule(
//!         "vault",
//!         DefaultRule::derived(vec![SeedSpec::utf8("vault"), SeedSpec::account("payer")]),
//!     ));
//!
//! let program = Pubkey::new_from_array([9; 32]);
//! let caller = Pubkey::new_from_array([1; 32]);
//! let result = resolve(&program, &instruction, &HashMap::new(), &HashMap::new(), caller)?;
//!
//! assert!(result.is_complete());
//! assert_eq!(result.address("payer"), Some(&caller));
//! assert!(result.address("vault").is_some());
//! # Ok(())
//! # }
//! ```
//!
//! ### Dependency Failures
//!
//! Per-account problems never fail the call; they are reported alongside
//! whatever did resolve:
//!
//! ```rust
//! use account_resolver::{resolve, AccountSpec, DefaultRule, Error, InstructionSpec, SeedSpec};
//! use solana_sdk::pubkey::Pubkey;
//! use std::collections::HashMap;
//!
//! # fn main() -> account_resolver::Result<()> {
//! let instruction = InstructionSpec::new("swap")
//!     .with_account(AccountSpec::with_rule(
//!         "a",
//!         DefaultRule::derived(vec![SeedSpec::account("b")]),
//!     ))
//!     .with_account(AccountSpec::with_rule(
//!         "b",
//!         DefaultRule::derived(vec![SeedSpec::account("a")]),
//!     ));
//!
//! let result = resolve(
//!     &Pubkey::default(),
//!     &instruction,
//!     &HashMap::new(),
//!     &HashMap::new(),
//!     Pubkey::new_from_array([1; 32]),
//! )?;
//!
//! assert!(matches!(result.reason("a"), Some(Error::CyclicDependency { .. })));
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Anchor IDL → idl::anchor → ProgramSpec / InstructionSpec
//!                                  │
//!     caller input, arguments ──▶ Resolver → ResolutionResult
//!                                  │
//!                     seeds → derive (sha256 + curve check)
//! ```
//!
//! ### Main Components
//!
//! - [`idl`] - Instruction descriptions, argument types and codecs, Anchor import
//! - [`resolver`] - Context, seed encoding, address derivation, the pass loop
//! - [`error`] - Error type and severity classification
//!
//! ## Logging
//!
//! Resolution emits [`tracing`] events: `debug` per pass and per unresolved
//! account, `warn` for permanent seed failures, `trace` per derived address.
//! Install any subscriber to see them.
//!
//! ## License
//!
//! Licensed under the [MIT License](https://opensource.org/licenses/MIT).

/// Version of the resolver crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod error;
pub mod idl;
pub mod resolver;

// Re-export main types
pub use error::{Error, ErrorSeverity, Result};
pub use idl::anchor::{AnchorIdl, LoaderConfig};
pub use idl::{
    parse_address, AccountSpec, ArgumentSpec, ArgumentValue, DefaultRule, InstructionSpec,
    LiteralSeed, ProgramRef, ProgramSpec, SeedSpec, TypeDescriptor,
};
pub use resolver::{
    find_program_address, resolve_batch, BatchConfig, ResolutionContext, ResolutionResult,
    ResolutionStrategy, ResolveRequest, Resolver, ResolverConfig, UnresolvedAccount,
};

use solana_sdk::pubkey::Pubkey;
use std::collections::HashMap;

/// Resolve every account of `instruction` with the default configuration.
///
/// Shorthand for `Resolver::default().resolve(...)`.
pub fn resolve(
    program: &Pubkey,
    instruction: &InstructionSpec,
    known_addresses: &HashMap<String, String>,
    known_arguments: &HashMap<String, ArgumentValue>,
    caller: Pubkey,
) -> Result<ResolutionResult> {
    Resolver::default().resolve(program, instruction, known_addresses, known_arguments, caller)
}
