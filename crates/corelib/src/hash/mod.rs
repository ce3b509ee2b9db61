//! Hash function abstraction for consistent hashing.
//!
//! Hash functions convert keys and virtual node labels into positions on
//! the ring. Swapping one for another changes only how evenly keys spread,
//! never the correctness of the ring.

pub mod md5;
pub mod murmur3;
pub mod sha1;
pub mod traits;
pub mod xxh3;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::RingError;

pub use self::md5::Md5Hash;
pub use self::murmur3::Murmur3Hash;
pub use self::sha1::Sha1Hash;
pub use self::xxh3::Xxh3Hash;
pub use traits::HashFunction;

/// Built-in hash functions selectable from configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    Md5,
    #[default]
    Sha1,
    Murmur3,
    Xxh3,
}

impl HashAlgorithm {
    /// Instantiates the hash function.
    pub fn build(self) -> Arc<dyn HashFunction> {
        match self {
            HashAlgorithm::Md5 => Arc::new(Md5Hash),
            HashAlgorithm::Sha1 => Arc::new(Sha1Hash),
            HashAlgorithm::Murmur3 => Arc::new(Murmur3Hash),
            HashAlgorithm::Xxh3 => Arc::new(Xxh3Hash),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HashAlgorithm::Md5 => "md5",
            HashAlgorithm::Sha1 => "sha1",
            HashAlgorithm::Murmur3 => "murmur3",
            HashAlgorithm::Xxh3 => "xxh3",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAlgorithm {
    type Err = RingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "md5" => Ok(HashAlgorithm::Md5),
            "sha1" => Ok(HashAlgorithm::Sha1),
            "murmur3" => Ok(HashAlgorithm::Murmur3),
            "xxh3" => Ok(HashAlgorithm::Xxh3),
            other => Err(RingError::InvalidConfig(format!(
                "unknown hash function {other:?}"
            ))),
        }
    }
}
