//! Program-derived address computation
//!
//! Reproduces the platform's canonical rule bit for bit:
//!
//! ```text
//! for bump in 255..=0:
//!     h = sha256(seed_0 ‖ … ‖ seed_n ‖ [bump] ‖ program ‖ "ProgramDerivedAddress")
//!     if h is not a valid ed25519 point: return (h, bump)
//! ```
//!
//! Off-curve results can never be signing keys, so only the owning program
//! can sign for the address.

use crate::{Error, Result};
use curve25519_dalek::edwards::CompressedEdwardsY;
use sha2::{Digest, Sha256};
use solana_sdk::pubkey::Pubkey;

/// Maximum number of seeds, bump included
pub const MAX_SEEDS: usize = 16;
/// Maximum length of a single seed
pub const MAX_SEED_LEN: usize = 32;
/// Domain separator appended to every derivation hash
pub const PDA_MARKER: &[u8; 21] = b"ProgramDerivedAddress";

/// Whether 32 bytes decode to a point on the ed25519 curve
pub fn is_on_curve(bytes: &[u8; 32]) -> bool {
    CompressedEdwardsY(*bytes).decompress().is_some()
}

fn check_limits(seeds: &[&[u8]], with_bump: bool) -> Result<()> {
    let count = seeds.len() + usize::from(with_bump);
    if count > MAX_SEEDS {
        return Err(Error::TooManySeeds {
            count,
            max: MAX_SEEDS,
        });
    }
    for (index, seed) in seeds.iter().enumerate() {
        if seed.len() > MAX_SEED_LEN {
            return Err(Error::MaxSeedLengthExceeded {
                index,
                len: seed.len(),
                max: MAX_SEED_LEN,
            });
        }
    }
    Ok(())
}

fn hash_candidate(seeds: &[&[u8]], bump: Option<u8>, program: &Pubkey) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for seed in seeds {
        hasher.update(seed);
    }
    if let Some(bump) = bump {
        hasher.update([bump]);
    }
    hasher.update(program.as_ref());
    hasher.update(PDA_MARKER);
    hasher.finalize().into()
}

/// Derive the address for an exact seed list (bump already included).
///
/// Fails with `InvalidSeeds` when the hash lands on the curve.
pub fn create_program_address(seeds: &[&[u8]], program: &Pubkey) -> Result<Pubkey> {
    check_limits(seeds, false)?;
    let hash = hash_candidate(seeds, None, program);
    if is_on_curve(&hash) {
        return Err(Error::InvalidSeeds);
    }
    Ok(Pubkey::new_from_array(hash))
}

/// Find the canonical program-derived address and its bump.
///
/// Scans bumps from 255 down and returns the first off-curve candidate.
pub fn find_program_address(seeds: &[&[u8]], program: &Pubkey) -> Result<(Pubkey, u8)> {
    check_limits(seeds, true)?;

    for bump in (0..=u8::MAX).rev() {
        let hash = hash_candidate(seeds, Some(bump), program);
        if !is_on_curve(&hash) {
            tracing::trace!(%program, bump, "found program address");
            return Ok((Pubkey::new_from_array(hash), bump));
        }
    }

    tracing::error!(
        %program,
        seeds = seeds.len(),
        "no off-curve bump in 0..=255, derivation exhausted"
    );
    Err(Error::NoValidBumpFound {
        program: program.to_string(),
    })
}

/// [`find_program_address`] over owned seed buffers
pub fn derive_address(program: &Pubkey, seeds: &[Vec<u8>]) -> Result<(Pubkey, u8)> {
    let refs: Vec<&[u8]> = seeds.iter().map(Vec::as_slice).collect();
    find_program_address(&refs, program)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn program() -> Pubkey {
        Pubkey::new_from_array([42; 32])
    }

    #[test]
    fn test_deterministic() {
        let a = find_program_address(&[b"vault", &[1, 2, 3]], &program()).unwrap();
        let b = find_program_address(&[b"vault", &[1, 2, 3]], &program()).unwrap();
        assert_eq!(a, b);
        assert!(!is_on_curve(&a.0.to_bytes()));
    }

    #[test]
    fn test_bump_reproduces_address() {
        let (address, bump) = find_program_address(&[b"config"], &program()).unwrap();
        let recreated = create_program_address(&[b"config", &[bump]], &program()).unwrap();
        assert_eq!(address, recreated);
    }

    #[test]
    fn test_higher_bumps_were_on_curve() {
        let (_, bump) = find_program_address(&[b"config"], &program()).unwrap();
        for higher in (bump as u16 + 1)..=255 {
            let higher = higher as u8;
            assert_eq!(
                create_program_address(&[b"config", &[higher]], &program()),
                Err(Error::InvalidSeeds)
            );
        }
    }

    #[test]
    fn test_seed_length_limit() {
        let long = [0u8; 33];
        assert_eq!(
            find_program_address(&[b"ok", &long], &program()),
            Err(Error::MaxSeedLengthExceeded {
                index: 1,
                len: 33,
                max: MAX_SEED_LEN,
            })
        );
        assert!(find_program_address(&[&[0u8; 32]], &program()).is_ok());
    }

    #[test]
    fn test_seed_count_limit() {
        let seeds: Vec<&[u8]> = vec![b"s".as_slice(); 15];
        assert!(find_program_address(&seeds, &program()).is_ok());

        let seeds: Vec<&[u8]> = vec![b"s".as_slice(); 16];
        assert_eq!(
            find_program_address(&seeds, &program()),
            Err(Error::TooManySeeds {
                count: 17,
                max: MAX_SEEDS,
            })
        );
    }

    #[test]
    fn test_on_curve_detection() {
        // The ed25519 basepoint is on the curve
        let basepoint = curve25519_dalek::constants::ED25519_BASEPOINT_COMPRESSED.to_bytes();
        assert!(is_on_curve(&basepoint));
    }
}
