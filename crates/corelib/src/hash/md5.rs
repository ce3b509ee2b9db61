//! MD5 hash function (128-bit).

use ::md5::{Digest, Md5};

use crate::hash::traits::HashFunction;
use crate::token::Position;

/// MD5 digest, as used by ketama-style rings.
#[derive(Clone, Copy, Debug, Default)]
pub struct Md5Hash;

impl HashFunction for Md5Hash {
    fn hash(&self, data: &[u8]) -> Position {
        Position::from_be_bytes(&Md5::digest(data))
    }

    fn bits(&self) -> u32 {
        128
    }

    fn name(&self) -> &'static str {
        "md5"
    }
}
