//! SHA-1 hash function (160-bit).

use ::sha1::{Digest, Sha1};

use crate::hash::traits::HashFunction;
use crate::token::Position;

/// SHA-1 digest. Fills the full 160-bit hash space.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sha1Hash;

impl HashFunction for Sha1Hash {
    fn hash(&self, data: &[u8]) -> Position {
        Position::from_be_bytes(&Sha1::digest(data))
    }

    fn bits(&self) -> u32 {
        160
    }

    fn name(&self) -> &'static str {
        "sha1"
    }
}
