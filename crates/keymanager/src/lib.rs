//! Key placement and rebalancing on a consistent-hash ring.
//!
//! [`KeyManager`] caches the owner of every placed key, moves the minimum
//! set of keys when nodes join or leave, and keeps an audit log of those
//! moves for the storage layer.

pub mod manager;
pub mod migration;
pub mod stats;

pub use manager::{KeyManager, RECONCILE_BATCH};
pub use migration::{MigrationCause, MigrationLog, MigrationRecord};
pub use stats::{std_dev_percent, Statistics};
