//! Error types for the core library.

use crate::node::NodeId;

/// Result type alias for the core library.
pub type Result<T> = std::result::Result<T, RingError>;

/// Errors that can occur in ring operations.
///
/// Every operation that returns one of these leaves the ring exactly as it
/// was before the call.
#[derive(Debug, thiserror::Error)]
pub enum RingError {
    /// A node with this id is already registered.
    #[error("node already present: {0}")]
    DuplicateNode(NodeId),

    /// No node with this id is registered.
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    /// Weight must be a positive integer.
    #[error("invalid weight {weight} for node {node}")]
    InvalidWeight {
        /// Node the weight was supplied for.
        node: NodeId,
        /// Rejected weight.
        weight: u32,
    },

    /// Lookup on a ring with no nodes.
    #[error("ring is empty")]
    EmptyRing,

    /// Fewer distinct physical nodes than requested replicas.
    #[error("insufficient nodes: requested {requested}, only {available} available")]
    InsufficientNodes {
        /// Number of replicas asked for.
        requested: usize,
        /// Number of physical nodes on the ring.
        available: usize,
    },

    /// Salted rehashing could not find a free position for a virtual node.
    #[error("no free ring position for replica {replica} of node {node}")]
    PositionCollision {
        /// Node being added.
        node: NodeId,
        /// Replica index that kept colliding.
        replica: usize,
    },

    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be read.
    #[error("config io error: {0}")]
    ConfigIo(#[from] std::io::Error),

    /// Configuration file is not valid JSON for [`RingConfig`](crate::RingConfig).
    #[error("config parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),
}
