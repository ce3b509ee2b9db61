//! XXH3 hash function (128-bit).

use xxhash_rust::xxh3::xxh3_128;

use crate::hash::traits::HashFunction;
use crate::token::Position;

/// XXH3-128. Not cryptographic, but the fastest of the built-ins.
#[derive(Clone, Copy, Debug, Default)]
pub struct Xxh3Hash;

impl HashFunction for Xxh3Hash {
    fn hash(&self, data: &[u8]) -> Position {
        Position::from(xxh3_128(data))
    }

    fn bits(&self) -> u32 {
        128
    }

    fn name(&self) -> &'static str {
        "xxh3"
    }
}
