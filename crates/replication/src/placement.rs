//! Replica placement for a single key.

use serde::Serialize;

use corelib::NodeId;

/// The nodes chosen to hold one key, in ring order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplicaPlacement {
    key: String,
    nodes: Vec<NodeId>,
}

impl ReplicaPlacement {
    /// Returns `None` when `nodes` is empty: a placement always has a primary.
    pub fn new(key: impl Into<String>, nodes: Vec<NodeId>) -> Option<Self> {
        if nodes.is_empty() {
            return None;
        }
        Some(Self {
            key: key.into(),
            nodes,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// The node that owns the key.
    pub fn primary(&self) -> &NodeId {
        &self.nodes[0]
    }

    /// Every node after the primary.
    pub fn secondaries(&self) -> &[NodeId] {
        &self.nodes[1..]
    }

    /// All replica holders, primary first.
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn contains(&self, node: &str) -> bool {
        self.nodes.iter().any(|n| n == node)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
