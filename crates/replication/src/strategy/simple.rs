//! Simple replication strategy.
//!
//! Places N replicas on the first N distinct physical nodes clockwise from
//! the key. This works well for:
//!
//! - Single data center deployments
//! - When network topology doesn't matter
//!
//! # Algorithm
//!
//! 1. Find the key's successor virtual node (the primary)
//! 2. Continue clockwise, skipping virtual nodes of already chosen nodes
//! 3. Stop after N distinct nodes
//!
//! # Performance
//!
//! - **Time**: O(log n + w) where w is the number of virtual nodes walked
//! - **Space**: O(r) - returns Vec of node IDs
//!
//! # Limitations
//!
//! - Doesn't consider data center/rack placement

use corelib::ring::HashRing;
use corelib::{NodeId, RingConfig, Result};

use crate::strategy::ReplicationStrategy;

/// Simple replication strategy: N distinct nodes taken clockwise.
///
/// # Example
///
/// ```rust
/// use corelib::ring::RingBuilder;
/// use replication::{ReplicationStrategy, SimpleStrategy};
///
/// let ring = RingBuilder::new()
///     .add_node("node1")
///     .add_node("node2")
///     .add_node("node3")
///     .build()
///     .unwrap();
///
/// let strategy = SimpleStrategy::new(3);
/// let replicas = strategy.replicas_for_key(&ring, b"my-key").unwrap();
/// assert_eq!(replicas.len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct SimpleStrategy {
    /// Number of replicas to create (including primary).
    replication_factor: usize,
}

impl SimpleStrategy {
    /// Create a new simple strategy with the given replication factor.
    ///
    /// # Arguments
    /// * `replication_factor` - Number of replicas (typically 1-5)
    ///   - 1: No replication (single copy)
    ///   - 3: Standard (primary + 2 replicas)
    pub fn new(replication_factor: usize) -> Self {
        Self { replication_factor }
    }

    /// Strategy using the configured default replication factor.
    pub fn from_config(config: &RingConfig) -> Self {
        Self::new(config.replication_factor)
    }

    /// Strategy matching the replication factor a ring was built with.
    pub fn for_ring(ring: &HashRing) -> Self {
        Self::new(ring.replication_factor())
    }
}

impl Default for SimpleStrategy {
    fn default() -> Self {
        Self::from_config(&RingConfig::default())
    }
}

impl ReplicationStrategy for SimpleStrategy {
    fn replication_factor(&self) -> usize {
        self.replication_factor
    }

    fn replicas_for_key(&self, ring: &HashRing, key: &[u8]) -> Result<Vec<NodeId>> {
        ring.locate_replicas(key, self.replication_factor)
    }

    fn name(&self) -> &'static str {
        "SimpleStrategy"
    }
}
