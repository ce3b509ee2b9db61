//! Builder for [`HashRing`].

use std::sync::Arc;

use crate::config::RingConfig;
use crate::error::Result;
use crate::hash::{HashAlgorithm, HashFunction};
use crate::node::NodeId;
use crate::ring::ring::HashRing;

/// Builds a ring and populates it with an initial set of nodes.
///
/// # Example
///
/// ```rust
/// use corelib::ring::RingBuilder;
///
/// let ring = RingBuilder::new()
///     .with_vnodes(16)
///     .add_node("node1")
///     .add_weighted_node("node2", 2)
///     .build()
///     .unwrap();
/// assert_eq!(ring.vnode_count(), 48);
/// ```
#[derive(Debug, Default)]
pub struct RingBuilder {
    config: RingConfig,
    hasher: Option<Arc<dyn HashFunction>>,
    nodes: Vec<(NodeId, u32)>,
}

impl RingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: RingConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Virtual nodes per unit of weight.
    pub fn with_vnodes(mut self, base_replica_count: usize) -> Self {
        self.config.base_replica_count = base_replica_count;
        self
    }

    pub fn with_hash_width(mut self, bits: u32) -> Self {
        self.config.hash_width = bits;
        self
    }

    pub fn with_hash_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.config.hash_function = algorithm;
        self.hasher = None;
        self
    }

    /// Use a custom hash function instead of a built-in one.
    pub fn with_hash_function(mut self, hasher: Arc<dyn HashFunction>) -> Self {
        self.hasher = Some(hasher);
        self
    }

    pub fn with_replication_factor(mut self, replication_factor: usize) -> Self {
        self.config.replication_factor = replication_factor;
        self
    }

    /// Adds a node with weight 1.
    pub fn add_node(self, id: impl Into<NodeId>) -> Self {
        self.add_weighted_node(id, 1)
    }

    pub fn add_weighted_node(mut self, id: impl Into<NodeId>, weight: u32) -> Self {
        self.nodes.push((id.into(), weight));
        self
    }

    /// Builds the ring, adding the queued nodes in insertion order.
    pub fn build(self) -> Result<HashRing> {
        let ring = match self.hasher {
            Some(hasher) => HashRing::with_hash_function(self.config, hasher)?,
            None => HashRing::with_config(self.config)?,
        };
        for (id, weight) in self.nodes {
            ring.add_node(id, weight)?;
        }
        Ok(ring)
    }
}
