//! Seeded random string generation.
//!
//! The generator is deliberately deterministic: the same seed and length
//! always produce the same string. Unpredictability comes from where the
//! seed was harvested, not from this PRNG.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

/// The 62-character output alphabet: `a-z`, `A-Z`, `0-9`.
pub const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length substituted when a request carries no usable length.
pub const DEFAULT_LENGTH: usize = 128;
/// Smallest accepted string length.
pub const MIN_LENGTH: usize = 1;
/// Largest accepted string length.
pub const MAX_LENGTH: usize = 1000;

/// Rejected generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("length must be between {MIN_LENGTH} and {MAX_LENGTH}, got {0}")]
    LengthOutOfRange(usize),
}

/// Generate a random string of `length` characters from [`ALPHABET`],
/// deterministic given `seed`.
///
/// The seed's bit pattern initializes the PRNG, so distinct floats in `[0, 1]`
/// map to distinct generator states. Not cryptographically secure.
pub fn generate(seed: f64, length: usize) -> Result<String, ValidationError> {
    if !(MIN_LENGTH..=MAX_LENGTH).contains(&length) {
        return Err(ValidationError::LengthOutOfRange(length));
    }
    let mut rng = StdRng::seed_from_u64(seed.to_bits());
    Ok((0..length)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect())
}
