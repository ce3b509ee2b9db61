//! Ring configuration.
//!
//! Parsed from JSON or built in code. Missing fields take their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RingError};
use crate::hash::HashAlgorithm;
use crate::token::MAX_BITS;

/// Default virtual nodes per unit of weight.
pub const DEFAULT_BASE_REPLICA_COUNT: usize = 150;

/// Default hash space width in bits.
pub const DEFAULT_HASH_WIDTH: u32 = 160;

/// Default number of replicas returned by [`HashRing::replicas`](crate::HashRing::replicas).
pub const DEFAULT_REPLICATION_FACTOR: usize = 1;

/// Tunables for a [`HashRing`](crate::HashRing).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RingConfig {
    /// Virtual nodes per unit of weight. Higher spreads load more evenly at
    /// the cost of memory.
    pub base_replica_count: usize,
    /// Bit-width of the hash space. Clamped to the hash function's native
    /// width when wider.
    pub hash_width: u32,
    /// Hash function used for both keys and virtual nodes.
    pub hash_function: HashAlgorithm,
    /// Replica count used when the caller does not give one.
    pub replication_factor: usize,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            base_replica_count: DEFAULT_BASE_REPLICA_COUNT,
            hash_width: DEFAULT_HASH_WIDTH,
            hash_function: HashAlgorithm::default(),
            replication_factor: DEFAULT_REPLICATION_FACTOR,
        }
    }
}

impl RingConfig {
    /// Parses and validates a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: RingConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_replica_count == 0 {
            return Err(RingError::InvalidConfig(
                "base_replica_count must be positive".into(),
            ));
        }
        if self.hash_width == 0 || self.hash_width > MAX_BITS || self.hash_width % 8 != 0 {
            return Err(RingError::InvalidConfig(format!(
                "hash_width must be a multiple of 8 in 8..={MAX_BITS}, got {}",
                self.hash_width
            )));
        }
        if self.replication_factor == 0 {
            return Err(RingError::InvalidConfig(
                "replication_factor must be positive".into(),
            ));
        }
        Ok(())
    }
}
