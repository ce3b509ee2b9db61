//! Ring topology changes.
//!
//! Every successful membership mutation of a [`HashRing`](crate::HashRing)
//! reports exactly which virtual nodes appeared or disappeared, so that key
//! placement can be rebalanced without diffing whole rings.

use crate::node::NodeId;
use crate::vnode::VirtualNode;

/// Direction of a membership change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Joined,
    Left,
}

/// Virtual nodes inserted into or removed from the ring by one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologyChange {
    pub node: NodeId,
    pub kind: ChangeKind,
    /// Affected virtual nodes, sorted by position.
    pub vnodes: Vec<VirtualNode>,
}

impl TopologyChange {
    pub(crate) fn joined(node: NodeId, mut vnodes: Vec<VirtualNode>) -> Self {
        vnodes.sort();
        Self {
            node,
            kind: ChangeKind::Joined,
            vnodes,
        }
    }

    pub(crate) fn left(node: NodeId, mut vnodes: Vec<VirtualNode>) -> Self {
        vnodes.sort();
        Self {
            node,
            kind: ChangeKind::Left,
            vnodes,
        }
    }

    /// Virtual nodes added to the ring (empty for a departure).
    pub fn added(&self) -> &[VirtualNode] {
        match self.kind {
            ChangeKind::Joined => &self.vnodes,
            ChangeKind::Left => &[],
        }
    }

    /// Virtual nodes removed from the ring (empty for a join).
    pub fn removed(&self) -> &[VirtualNode] {
        match self.kind {
            ChangeKind::Joined => &[],
            ChangeKind::Left => &self.vnodes,
        }
    }
}
