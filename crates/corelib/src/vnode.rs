//! Virtual node abstractions.
//!
//! # Virtual Nodes (VNodes) Concept
//!
//! Instead of each physical node having a single position on the ring, each
//! node owns `weight × base_replica_count` positions. This provides:
//!
//! 1. **Better Load Distribution**: more positions smooth out arc lengths
//! 2. **Gradual Rebalancing**: a joining node takes a little from many nodes
//! 3. **Weighting**: a node's share of the ring scales with its weight
//!
//! # Performance Characteristics
//!
//! - **Memory**: one map entry per virtual node
//! - **Lookup**: O(log n) where n = total vnodes
//! - **Rebalancing**: ~K/N keys move when a node joins or leaves

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::node::NodeId;
use crate::token::Position;

/// A virtual node on the hash ring.
///
/// Represents a single position owned by a physical node.
///
/// # Invariants
///
/// - No two vnodes in one ring share a position
/// - Every vnode belongs to exactly one live physical node
/// - Vnodes order by position, then owner
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VirtualNode {
    /// Position on the ring.
    ///
    /// Hash of `"{owner}#{replica}"`, salted with `"@{attempt}"` if that
    /// collided with an existing position.
    pub position: Position,

    /// The physical node that owns this virtual node.
    pub owner: NodeId,
}

impl VirtualNode {
    #[inline]
    pub fn new(position: Position, owner: NodeId) -> Self {
        Self { position, owner }
    }

    /// Label hashed to place replica `replica` of `owner`.
    ///
    /// Attempt 0 is the plain `"{owner}#{replica}"` label; later attempts
    /// append `"@{attempt}"` to resolve collisions.
    pub fn label(owner: &NodeId, replica: usize, attempt: u32) -> String {
        if attempt == 0 {
            format!("{}#{}", owner, replica)
        } else {
            format!("{}#{}@{}", owner, replica, attempt)
        }
    }

    #[inline]
    pub fn position(&self) -> Position {
        self.position
    }

    #[inline]
    pub fn owner(&self) -> &NodeId {
        &self.owner
    }

    /// Clockwise distance to another virtual node in a `bits`-wide ring.
    #[inline]
    pub fn distance_to(&self, other: &Self, bits: u32) -> Position {
        self.position.distance_to(&other.position, bits)
    }
}

impl fmt::Display for VirtualNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VNode(position={}, node={})", self.position, self.owner)
    }
}
