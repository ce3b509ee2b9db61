//! Core library for consistent hashing implementation.
//!
//! This crate provides the fundamental abstractions for consistent hashing:
//! - Ring positions and pluggable hash functions
//! - Physical and virtual node types
//! - The thread-safe hash ring and its builder
//! - Topology change reports consumed by rebalancing

pub mod config;
pub mod error;
pub mod hash;
pub mod node;
pub mod ring;
pub mod token;
pub mod topology;
pub mod vnode;

pub use config::RingConfig;
pub use error::{Result, RingError};
pub use hash::{HashAlgorithm, HashFunction};
pub use node::{NodeId, PhysicalNode};
pub use ring::{HashRing, Ring, RingBuilder};
pub use token::Position;
pub use topology::{ChangeKind, TopologyChange};
pub use vnode::VirtualNode;
