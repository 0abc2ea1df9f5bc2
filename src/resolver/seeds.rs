//! Seed encoding
//!
//! Turns one [`SeedSpec`] into bytes against a [`ResolutionContext`].
//! Never mutates the context.

use super::context::ResolutionContext;
use crate::idl::codec::encode_value;
use crate::idl::{InstructionSpec, SeedSpec};
use crate::{Error, Result};

/// Encode a single seed.
///
/// Returns `MissingDependency` when the referenced account or argument has
/// no value yet; any other error is permanent for this seed.
pub fn encode_seed(
    seed: &SeedSpec,
    ctx: &ResolutionContext<'_>,
    instruction: &InstructionSpec,
) -> Result<Vec<u8>> {
    match seed {
        SeedSpec::Literal(literal) => literal.decode(),
        SeedSpec::AccountRef { name } => ctx
            .address(name)
            .map(|key| key.to_bytes().to_vec())
            .ok_or_else(|| Error::missing(name.clone())),
        SeedSpec::ArgumentRef { name, seed_type } => {
            let value = ctx
                .argument(name)
                .ok_or_else(|| Error::missing(name.clone()))?;
            let ty = match seed_type {
                Some(ty) => ty,
                None => {
                    &instruction
                        .argument(name)
                        .ok_or_else(|| Error::UnknownArgument { name: name.clone() })?
                        .type_descriptor
                }
            };
            encode_value(name, ty, value)
        }
    }
}

/// Encode all seeds of one derivation, stopping at the first failure
pub fn encode_seeds(
    seeds: &[SeedSpec],
    ctx: &ResolutionContext<'_>,
    instruction: &InstructionSpec,
) -> Result<Vec<Vec<u8>>> {
    seeds
        .iter()
        .map(|seed| encode_seed(seed, ctx, instruction))
        .collect()
}
