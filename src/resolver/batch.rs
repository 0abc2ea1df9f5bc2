//! Batch resolution on a thread pool
//!
//! Each request owns its inputs and gets a fresh context, so requests run
//! in parallel without coordination. Results come back in request order.

use super::engine::{ResolutionResult, Resolver};
use crate::error::{Error, Result};
use crate::idl::{ArgumentValue, InstructionSpec};
use rayon::prelude::*;
use solana_sdk::pubkey::Pubkey;
use std::collections::HashMap;

/// Configuration for batch resolution
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Maximum number of worker threads (default: num_cpus)
    pub max_parallelism: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_parallelism: num_cpus::get(),
        }
    }
}

/// Inputs of one resolution call
#[derive(Debug, Clone)]
pub struct ResolveRequest<'a> {
    /// Program owning the instruction
    pub program: Pubkey,
    /// Instruction to resolve
    pub instruction: &'a InstructionSpec,
    /// Caller input by account name
    pub known_addresses: HashMap<String, String>,
    /// Argument values by name
    pub known_arguments: HashMap<String, ArgumentValue>,
    /// Invoking user
    pub caller: Pubkey,
}

impl<'a> ResolveRequest<'a> {
    /// Request with no caller input or arguments
    pub fn new(program: Pubkey, instruction: &'a InstructionSpec, caller: Pubkey) -> Self {
        Self {
            program,
            instruction,
            known_addresses: HashMap::new(),
            known_arguments: HashMap::new(),
            caller,
        }
    }

    /// Add a caller-supplied address. Returns self for method chaining.
    pub fn with_address(mut self, name: &str, address: &str) -> Self {
        self.known_addresses
            .insert(name.to_string(), address.to_string());
        self
    }

    /// Add an argument value. Returns self for method chaining.
    pub fn with_argument(mut self, name: &str, value: impl Into<ArgumentValue>) -> Self {
        self.known_arguments.insert(name.to_string(), value.into());
        self
    }

    /// Resolve this request on the current thread
    pub fn resolve(&self, resolver: &Resolver) -> Result<ResolutionResult> {
        resolver.resolve(
            &self.program,
            self.instruction,
            &self.known_addresses,
            &self.known_arguments,
            self.caller,
        )
    }
}

/// Resolve many independent requests in parallel
///
/// # Returns
/// * `Ok(Vec<Result<ResolutionResult>>)` - One outcome per request, in request order
/// * `Err(Error)` - The thread pool could not be created
///
/// # Example
/// ```ignore
/// let results = resolve_batch(&Resolver::default(), &requests, BatchConfig::default())?;
/// ```
pub fn resolve_batch(
    resolver: &Resolver,
    requests: &[ResolveRequest<'_>],
    config: BatchConfig,
) -> Result<Vec<Result<ResolutionResult>>> {
    // Empty batch fast path
    if requests.is_empty() {
        return Ok(Vec::new());
    }

    // Single request - no parallelism needed
    if requests.len() == 1 {
        return Ok(vec![requests[0].resolve(resolver)]);
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.max_parallelism.max(1).min(requests.len()))
        .build()
        .map_err(|e| Error::runtime(format!("Failed to create thread pool: {}", e)))?;

    tracing::debug!(requests = requests.len(), "resolving batch");

    Ok(pool.install(|| {
        requests
            .par_iter()
            .map(|request| request.resolve(resolver))
            .collect()
    }))
}
