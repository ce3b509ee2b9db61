//! Replication strategy abstractions.
//!
//! Replication strategies determine how many replicas to keep and where
//! to place them on the ring.
//!
//! - **SimpleStrategy**: N distinct nodes taken clockwise around the ring

pub mod simple;

pub use simple::SimpleStrategy;

use corelib::ring::HashRing;
use corelib::{NodeId, Result};

/// Trait for replication strategies.
///
/// A replication strategy determines:
/// 1. How many replicas to keep for a key
/// 2. Which nodes should hold those replicas
///
/// # Thread Safety
///
/// Implementations must be thread-safe (Send + Sync) as they are shared by
/// every caller of the key manager.
pub trait ReplicationStrategy: Send + Sync + std::fmt::Debug + 'static {
    /// Number of replicas this strategy places, primary included.
    fn replication_factor(&self) -> usize;

    /// Find replica nodes for a given key, primary first.
    ///
    /// Fails with `EmptyRing` or `InsufficientNodes` rather than returning a
    /// short list.
    fn replicas_for_key(&self, ring: &HashRing, key: &[u8]) -> Result<Vec<NodeId>>;

    /// Get the strategy name (for logging/debugging).
    fn name(&self) -> &'static str;
}
