//! Replication strategies for consistent hashing.
//!
//! This crate provides pluggable replication strategies that determine:
//! - How many replicas to keep for a key
//! - Which physical nodes hold them, primary first

pub mod placement;
pub mod strategy;

pub use placement::ReplicaPlacement;
pub use strategy::{ReplicationStrategy, SimpleStrategy};
