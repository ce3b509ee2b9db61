//! Murmur3 hash function (x64 128-bit variant).

use crate::hash::traits::HashFunction;
use crate::token::Position;

/// Murmur3 x64/128 with seed 0.
#[derive(Clone, Copy, Debug, Default)]
pub struct Murmur3Hash;

impl HashFunction for Murmur3Hash {
    fn hash(&self, data: &[u8]) -> Position {
        Position::from(fastmurmur3::hash(data))
    }

    fn bits(&self) -> u32 {
        128
    }

    fn name(&self) -> &'static str {
        "murmur3"
    }
}
