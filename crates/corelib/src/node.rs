//! Node abstractions for the consistent hash ring.
//!
//! Physical nodes are the servers or shards keys are ultimately routed to.
//! They are identified by a caller-supplied [`NodeId`] string.

use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RingError};

/// Identifier of a physical node in the cluster.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for NodeId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for NodeId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// A server or shard participating in the ring.
///
/// The ring only cares about `id` and `weight`; the `keys` set is maintained
/// by the key manager and is empty for nodes handed out by the ring itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhysicalNode {
    pub id: NodeId,
    /// Capacity multiplier: the node gets `weight × base_replica_count`
    /// virtual nodes.
    pub weight: u32,
    keys: BTreeSet<String>,
}

impl PhysicalNode {
    /// Construct a node, rejecting a zero weight.
    pub fn new(id: impl Into<NodeId>, weight: u32) -> Result<Self> {
        let id = id.into();
        if weight == 0 {
            return Err(RingError::InvalidWeight { node: id, weight });
        }
        Ok(Self {
            id,
            weight,
            keys: BTreeSet::new(),
        })
    }

    /// Keys currently assigned to this node.
    pub fn keys(&self) -> &BTreeSet<String> {
        &self.keys
    }

    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    /// Returns `true` if the key was not already assigned here.
    pub fn insert_key(&mut self, key: impl Into<String>) -> bool {
        self.keys.insert(key.into())
    }

    pub fn remove_key(&mut self, key: &str) -> bool {
        self.keys.remove(key)
    }
}
