//! Consistent hash ring implementation.
//!
//! The ring manages virtual node positions and provides efficient lookup
//! operations for finding nodes responsible for keys.

pub mod builder;
#[allow(clippy::module_inception)]
pub mod ring;

pub use builder::RingBuilder;
pub use ring::{HashRing, MAX_COLLISION_ATTEMPTS};

/// Alias for the main ring type (used by lib.rs).
pub type Ring = HashRing;
