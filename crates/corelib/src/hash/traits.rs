//! Core hash function trait definitions.

use std::fmt::Debug;

use crate::token::Position;

/// A hash function maps keys (and virtual node labels) onto the ring.
///
/// Implementations are stateless and thread-safe, so one instance is shared
/// by every lookup without synchronization. Output must be deterministic and
/// uniformly distributed over `[0, 2^bits)`; the empty input hashes like any
/// other.
pub trait HashFunction: Send + Sync + Debug + 'static {
    /// Hashes `data` to a position in this function's native width.
    fn hash(&self, data: &[u8]) -> Position;

    /// Native output width in bits.
    fn bits(&self) -> u32;

    /// Returns the name of this hash function.
    fn name(&self) -> &'static str;
}
