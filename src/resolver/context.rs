//! Per-call resolution state

use crate::idl::ArgumentValue;
use solana_sdk::pubkey::Pubkey;
use std::collections::HashMap;

/// Addresses resolved so far plus read-only views of arguments and caller.
///
/// Created fresh for every resolution call. Only the resolver mutates it;
/// seed encoding and derivation read from it.
#[derive(Debug, Clone)]
pub struct ResolutionContext<'a> {
    known_addresses: HashMap<String, Pubkey>,
    known_arguments: &'a HashMap<String, ArgumentValue>,
    caller: Pubkey,
}

impl<'a> ResolutionContext<'a> {
    /// Create an empty context
    pub fn new(known_arguments: &'a HashMap<String, ArgumentValue>, caller: Pubkey) -> Self {
        Self {
            known_addresses: HashMap::new(),
            known_arguments,
            caller,
        }
    }

    /// Resolved address of an account
    pub fn address(&self, name: &str) -> Option<&Pubkey> {
        self.known_addresses.get(name)
    }

    /// Supplied argument value
    pub fn argument(&self, name: &str) -> Option<&ArgumentValue> {
        self.known_arguments.get(name)
    }

    /// The invoking caller's address
    pub fn caller(&self) -> Pubkey {
        self.caller
    }

    /// Whether an account has an address
    pub fn is_known(&self, name: &str) -> bool {
        self.known_addresses.contains_key(name)
    }

    /// Number of known addresses
    pub fn len(&self) -> usize {
        self.known_addresses.len()
    }

    /// Whether no address is known yet
    pub fn is_empty(&self) -> bool {
        self.known_addresses.is_empty()
    }

    /// Set (or overwrite) an account's address
    pub(crate) fn insert(&mut self, name: &str, address: Pubkey) -> Option<Pubkey> {
        self.known_addresses.insert(name.to_string(), address)
    }

    /// Consume the context, yielding the address map
    pub(crate) fn into_addresses(self) -> HashMap<String, Pubkey> {
        self.known_addresses
    }
}
