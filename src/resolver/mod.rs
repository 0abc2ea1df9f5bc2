//! # Account resolution
//!
//! Computes the concrete address of every account an instruction needs:
//!
//! ```text
//! caller input ──filter──▶ ResolutionContext
//!                             │
//!              pass 0: ConstantAddress / CallerAddress
//!                             │
//!              pass 1..N: Derived (seeds → bytes → find_program_address)
//!                             │
//!                     fixed point reached
//!                             ▼
//!                    ResolutionResult { resolved, unresolved }
//! ```
//!
//! ## Main Components
//!
//! - [`seeds`] - encodes one seed against the current context
//! - [`derive`] - program-derived address search (bump 255 → 0)
//! - [`context`] - addresses known so far, arguments, caller
//! - [`engine`] - the pass loop, cycle detection and failure reporting
//! - [`batch`] - many independent resolutions on a thread pool

pub mod batch;
pub mod context;
pub mod derive;
pub mod engine;
pub mod seeds;

pub use batch::{resolve_batch, BatchConfig, ResolveRequest};
pub use context::ResolutionContext;
pub use derive::{create_program_address, derive_address, find_program_address};
pub use engine::{ResolutionResult, Resolver, UnresolvedAccount};
pub use seeds::{encode_seed, encode_seeds};

use serde::{Deserialize, Serialize};

/// How far derivation passes are repeated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResolutionStrategy {
    /// Repeat derivation passes until nothing changes, so derived accounts
    /// may depend on other derived accounts
    #[default]
    FixedPoint,
    /// Constants, then exactly one derivation pass. PDAs that depend on
    /// other PDAs stay unresolved.
    LegacyTwoPass,
}

/// Resolver configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResolverConfig {
    /// Pass strategy (default: fixed point)
    pub strategy: ResolutionStrategy,
    /// Upper bound on derivation passes (default: number of derived accounts)
    pub max_passes: Option<usize>,
}

impl ResolverConfig {
    /// Set the strategy. Returns self for method chaining.
    pub fn with_strategy(mut self, strategy: ResolutionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Cap derivation passes. Returns self for method chaining.
    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = Some(max_passes);
        self
    }

    /// Number of derivation passes allowed for `derived` pending accounts
    pub(crate) fn pass_limit(&self, derived: usize) -> usize {
        let natural = match self.strategy {
            ResolutionStrategy::FixedPoint => derived,
            ResolutionStrategy::LegacyTwoPass => derived.min(1),
        };
        match self.max_passes {
            Some(cap) => natural.min(cap),
            None => natural,
        }
    }
}
