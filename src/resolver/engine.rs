//! Fixed-point dependency resolution
//!
//! Accounts are settled in three stages:
//!
//! 1. Caller-supplied addresses are parsed; invalid strings are dropped, and
//!    only accounts without a default rule keep theirs.
//! 2. `ConstantAddress` and `CallerAddress` rules are applied.
//! 3. `Derived` rules are attempted pass after pass. Every pass encodes seeds
//!    against the context as it stood when the pass began and commits the
//!    new addresses at the end, so a chain `A → B → C` takes three passes
//!    regardless of declaration order. The loop stops when a pass resolves
//!    nothing.
//!
//! Whatever is left is diagnosed: accounts whose chain of first blocking
//! accounts leads back to themselves are reported as `CyclicDependency`, the
//! rest as `MissingDependency` naming the blocker. A missing argument always
//! ends the chain, even when an account shares its name.

use super::context::ResolutionContext;
use super::derive::derive_address;
use super::seeds::encode_seed;
use super::ResolverConfig;
use crate::idl::{
    parse_address, ArgumentValue, DefaultRule, InstructionSpec, ProgramRef, SeedSpec,
};
use crate::{Error, Result};
use solana_sdk::pubkey::Pubkey;
use std::collections::{BTreeMap, HashMap};

/// Account that could not be given an address, and why
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedAccount {
    /// Account name
    pub name: String,
    /// First problem found for it
    pub reason: Error,
}

/// Outcome of one resolution call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionResult {
    /// Addresses of every settled account
    pub resolved: BTreeMap<String, Pubkey>,
    /// Bump seeds of accounts settled by derivation
    pub bumps: BTreeMap<String, u8>,
    /// Accounts still lacking an address, in declaration order
    pub unresolved: Vec<UnresolvedAccount>,
    /// Derivation passes performed
    pub passes: usize,
}

impl ResolutionResult {
    /// Whether every account has an address
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }

    /// Address of an account, if settled
    pub fn address(&self, name: &str) -> Option<&Pubkey> {
        self.resolved.get(name)
    }

    /// Bump of a derived account
    pub fn bump(&self, name: &str) -> Option<u8> {
        self.bumps.get(name).copied()
    }

    /// Why an account is unresolved
    pub fn reason(&self, name: &str) -> Option<&Error> {
        self.unresolved
            .iter()
            .find(|u| u.name == name)
            .map(|u| &u.reason)
    }

    /// Names of unresolved accounts
    pub fn unresolved_names(&self) -> Vec<&str> {
        self.unresolved.iter().map(|u| u.name.as_str()).collect()
    }

    /// Addresses in the instruction's account order, for building the
    /// instruction's account list. Unresolved optional accounts are `None`;
    /// an unresolved required account fails with its reason.
    pub fn account_addresses(&self, instruction: &InstructionSpec) -> Result<Vec<Option<Pubkey>>> {
        instruction
            .accounts
            .iter()
            .map(|account| match self.resolved.get(&account.name) {
                Some(address) => Ok(Some(*address)),
                None if account.is_optional => Ok(None),
                None => Err(self
                    .reason(&account.name)
                    .cloned()
                    .unwrap_or_else(|| Error::missing(account.name.clone()))),
            })
            .collect()
    }

    /// Resolved addresses as base58 strings, for merging back into form state
    pub fn to_string_map(&self) -> BTreeMap<String, String> {
        self.resolved
            .iter()
            .map(|(name, address)| (name.clone(), address.to_string()))
            .collect()
    }
}

/// A derived account still waiting for its seeds
#[derive(Debug, Clone, Copy)]
struct PendingDerivation<'a> {
    name: &'a str,
    seeds: &'a [SeedSpec],
    owner: Option<&'a ProgramRef>,
}

/// First unavailable input of a stuck derivation
#[derive(Debug, Clone, PartialEq, Eq)]
enum Blocker {
    Account(String),
    Argument(String),
}

impl Blocker {
    fn name(&self) -> &str {
        match self {
            Blocker::Account(name) | Blocker::Argument(name) => name,
        }
    }
}

/// Outcome of preparing one derivation against the current context
enum Attempt {
    Ready { seeds: Vec<Vec<u8>>, owner: Pubkey },
    Blocked(Blocker),
    Failed(Error),
}

/// Encode seeds in order, then look up the owner program
fn prepare(
    item: &PendingDerivation<'_>,
    program: &Pubkey,
    ctx: &ResolutionContext<'_>,
    instruction: &InstructionSpec,
) -> Attempt {
    let mut seeds = Vec::with_capacity(item.seeds.len());
    for seed in item.seeds {
        match encode_seed(seed, ctx, instruction) {
            Ok(bytes) => seeds.push(bytes),
            Err(e) if e.is_missing_dependency() => {
                let Some(name) = seed.dependency() else {
                    return Attempt::Failed(e);
                };
                return Attempt::Blocked(match seed {
                    SeedSpec::AccountRef { .. } => Blocker::Account(name.to_string()),
                    _ => Blocker::Argument(name.to_string()),
                });
            }
            Err(e) => return Attempt::Failed(e),
        }
    }

    let owner = match item.owner {
        None => *program,
        Some(ProgramRef::Address { address }) => *address,
        Some(ProgramRef::Account { name }) => match ctx.address(name) {
            Some(address) => *address,
            None => return Attempt::Blocked(Blocker::Account(name.clone())),
        },
    };
    Attempt::Ready { seeds, owner }
}

/// Instruction account resolver
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    config: ResolverConfig,
}

impl Resolver {
    /// Create a resolver with the given configuration
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    /// Active configuration
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve every account of `instruction`.
    ///
    /// # Arguments
    /// * `program` - Address of the program that owns the instruction
    /// * `instruction` - Accounts (with default rules) and arguments
    /// * `known_addresses` - Caller input by account name; may contain blank or invalid strings
    /// * `known_arguments` - Validated argument values by name
    /// * `caller` - The invoking user's address
    ///
    /// # Returns
    /// * `Ok(ResolutionResult)` - Per-account outcome; individual failures land in `unresolved`
    /// * `Err(Error::DuplicateAccount)` - The instruction itself is malformed
    pub fn resolve(
        &self,
        program: &Pubkey,
        instruction: &InstructionSpec,
        known_addresses: &HashMap<String, String>,
        known_arguments: &HashMap<String, ArgumentValue>,
        caller: Pubkey,
    ) -> Result<ResolutionResult> {
        instruction.validate()?;

        let mut ctx = ResolutionContext::new(known_arguments, caller);
        seed_caller_input(instruction, known_addresses, &mut ctx);
        apply_independent_rules(instruction, &mut ctx);

        let mut pending: Vec<PendingDerivation<'_>> = instruction
            .accounts
            .iter()
            .filter_map(|account| match &account.default_rule {
                Some(DefaultRule::Derived { seeds, program: owner }) => Some(PendingDerivation {
                    name: &account.name,
                    seeds,
                    owner: owner.as_ref(),
                }),
                _ => None,
            })
            .collect();

        let limit = self.config.pass_limit(pending.len());
        let mut failures: HashMap<String, Error> = HashMap::new();
        let mut bumps = BTreeMap::new();
        let mut passes = 0;

        while !pending.is_empty() && passes < limit {
            passes += 1;
            let mut derived = Vec::new();
            let mut blocked = Vec::new();

            for item in pending {
                let outcome = match prepare(&item, program, &ctx, instruction) {
                    Attempt::Ready { seeds, owner } => derive_address(&owner, &seeds).map(Some),
                    Attempt::Blocked(_) => Ok(None),
                    Attempt::Failed(e) => Err(e),
                };
                match outcome {
                    Ok(Some((address, bump))) => derived.push((item.name, address, bump)),
                    Ok(None) => blocked.push(item),
                    Err(e) => {
                        tracing::warn!(
                            instruction = %instruction.name,
                            account = item.name,
                            error = %e,
                            "derivation failed"
                        );
                        failures.insert(item.name.to_string(), e);
                    }
                }
            }

            tracing::debug!(
                instruction = %instruction.name,
                pass = passes,
                derived = derived.len(),
                blocked = blocked.len(),
                "derivation pass"
            );

            let progress = !derived.is_empty();
            for (name, address, bump) in derived {
                ctx.insert(name, address);
                bumps.insert(name.to_string(), bump);
            }
            pending = blocked;
            if !progress {
                break;
            }
        }

        // Diagnose what is left against the final context
        let mut blocked_on: HashMap<String, Blocker> = HashMap::new();
        for item in &pending {
            match prepare(item, program, &ctx, instruction) {
                Attempt::Blocked(blocker) => {
                    blocked_on.insert(item.name.to_string(), blocker);
                }
                Attempt::Failed(e) => {
                    failures.insert(item.name.to_string(), e);
                }
                Attempt::Ready { .. } => {
                    failures.insert(item.name.to_string(), Error::PassLimitReached { passes });
                }
            }
        }

        let order: Vec<&str> = instruction.accounts.iter().map(|a| a.name.as_str()).collect();
        let cycles = find_cycles(&order, &blocked_on);

        let mut unresolved = Vec::new();
        for account in &instruction.accounts {
            let name = account.name.as_str();
            if ctx.is_known(name) {
                continue;
            }
            let reason = if let Some(e) = failures.remove(name) {
                e
            } else if let Some(cycle) = cycles.get(name) {
                Error::CyclicDependency {
                    names: cycle.clone(),
                }
            } else if let Some(blocker) = blocked_on.get(name) {
                Error::missing(blocker.name())
            } else {
                Error::missing(name)
            };
            tracing::debug!(instruction = %instruction.name, account = name, reason = %reason, "unresolved");
            unresolved.push(UnresolvedAccount {
                name: name.to_string(),
                reason,
            });
        }

        let resolved: BTreeMap<String, Pubkey> = ctx
            .into_addresses()
            .into_iter()
            .filter(|(name, _)| instruction.account(name).is_some())
            .collect();

        Ok(ResolutionResult {
            resolved,
            bumps,
            unresolved,
            passes,
        })
    }
}

/// Keep valid caller addresses for accounts without a default rule
fn seed_caller_input(
    instruction: &InstructionSpec,
    known_addresses: &HashMap<String, String>,
    ctx: &mut ResolutionContext<'_>,
) {
    for (name, value) in known_addresses {
        let Some(account) = instruction.account(name) else {
            tracing::debug!(account = %name, "ignoring address for undeclared account");
            continue;
        };
        let address = match parse_address(value) {
            Ok(address) => address,
            Err(_) => {
                if !value.is_empty() {
                    tracing::debug!(account = %name, value = %value, "dropping invalid address");
                }
                continue;
            }
        };
        if account.default_rule.is_some() {
            tracing::debug!(account = %name, "caller address superseded by default rule");
            continue;
        }
        ctx.insert(name, address);
    }
}

/// Pass 0: rules that need nothing but the rule itself and the caller
fn apply_independent_rules(instruction: &InstructionSpec, ctx: &mut ResolutionContext<'_>) {
    for account in &instruction.accounts {
        match &account.default_rule {
            Some(DefaultRule::ConstantAddress { address }) => {
                ctx.insert(&account.name, *address);
            }
            Some(DefaultRule::CallerAddress) => {
                let caller = ctx.caller();
                ctx.insert(&account.name, caller);
            }
            Some(DefaultRule::Derived { .. }) | None => {}
        }
    }
}

/// Find accounts whose chain of first blocking accounts loops back.
///
/// `blocked_on` maps each stuck account to the first input it waits for.
/// Only account blockers are edges, so each account has at most one outgoing
/// edge and following edges from any start either leaves the stuck set or
/// enters exactly one cycle. Cycles are reported starting from their
/// earliest-declared member.
fn find_cycles(order: &[&str], blocked_on: &HashMap<String, Blocker>) -> HashMap<String, Vec<String>> {
    let rank: HashMap<&str, usize> = order.iter().enumerate().map(|(i, n)| (*n, i)).collect();
    let mut cycles: HashMap<String, Vec<String>> = HashMap::new();

    for start in order {
        if !blocked_on.contains_key(*start) || cycles.contains_key(*start) {
            continue;
        }

        let mut path: Vec<&str> = Vec::new();
        let mut current: &str = start;
        loop {
            if let Some(at) = path.iter().position(|n| *n == current) {
                let mut cycle: Vec<String> = path[at..].iter().map(|n| n.to_string()).collect();
                let first = cycle
                    .iter()
                    .enumerate()
                    .min_by_key(|(_, n)| rank.get(n.as_str()).copied().unwrap_or(usize::MAX))
                    .map(|(i, _)| i)
                    .unwrap_or(0);
                cycle.rotate_left(first);
                for member in &cycle {
                    cycles.insert(member.clone(), cycle.clone());
                }
                break;
            }
            if cycles.contains_key(current) {
                break;
            }
            path.push(current);
            match blocked_on.get(current) {
                Some(Blocker::Account(next)) if blocked_on.contains_key(next) => {
                    current = next.as_str()
                }
                _ => break,
            }
        }
    }

    cycles
}
