//! Fixed-width ring position.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Widest hash space the ring supports, in bits.
pub const MAX_BITS: u32 = 160;

const BYTES: usize = (MAX_BITS / 8) as usize;

/// A point in the circular hash space.
///
/// Stored as a 160-bit big-endian unsigned integer. Narrower hash spaces
/// occupy the low-order bytes, so the derived byte-wise ordering is the
/// numeric ordering regardless of the configured width.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Position([u8; BYTES]);

impl Position {
    /// Start of the ring.
    pub const ZERO: Position = Position([0; BYTES]);

    /// Largest value of a `bits`-wide hash space.
    pub fn max(bits: u32) -> Self {
        Position([u8::MAX; BYTES]).mask(bits)
    }

    /// Builds a position from a big-endian digest.
    ///
    /// Digests shorter than 160 bits are right-aligned; longer ones keep
    /// their leading 160 bits.
    pub fn from_be_bytes(digest: &[u8]) -> Self {
        let take = digest.len().min(BYTES);
        let mut out = [0u8; BYTES];
        out[BYTES - take..].copy_from_slice(&digest[..take]);
        Position(out)
    }

    pub fn as_bytes(&self) -> &[u8; BYTES] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    /// Keeps the leading `to_bits` bits of a `from_bits`-wide value.
    ///
    /// Widths are whole bytes. A target at least as wide as the source
    /// returns the value unchanged.
    pub fn truncate(self, from_bits: u32, to_bits: u32) -> Self {
        if to_bits >= from_bits {
            return self;
        }
        let shift = ((from_bits - to_bits) / 8) as usize;
        let mut out = [0u8; BYTES];
        out[shift..].copy_from_slice(&self.0[..BYTES - shift]);
        Position(out)
    }

    /// Clears everything above the low `bits` bits.
    pub fn mask(self, bits: u32) -> Self {
        let keep = ((bits / 8) as usize).min(BYTES);
        let mut out = self.0;
        out[..BYTES - keep].fill(0);
        Position(out)
    }

    /// `self - rhs` modulo 2^160.
    pub fn wrapping_sub(self, rhs: Self) -> Self {
        let mut out = [0u8; BYTES];
        let mut borrow = 0i16;
        for i in (0..BYTES).rev() {
            let diff = self.0[i] as i16 - rhs.0[i] as i16 - borrow;
            if diff < 0 {
                out[i] = (diff + 256) as u8;
                borrow = 1;
            } else {
                out[i] = diff as u8;
                borrow = 0;
            }
        }
        Position(out)
    }

    /// Clockwise distance from `self` to `other` in a `bits`-wide ring.
    ///
    /// Both positions must already lie inside the `bits`-wide space.
    pub fn distance_to(&self, other: &Self, bits: u32) -> Self {
        other.wrapping_sub(*self).mask(bits)
    }

    /// Lossy numeric value, for ratios and statistics.
    pub fn as_f64(&self) -> f64 {
        self.0.iter().fold(0.0, |acc, b| acc * 256.0 + f64::from(*b))
    }
}

/// Number of points in a `bits`-wide hash space, as a float.
pub fn space_size(bits: u32) -> f64 {
    2f64.powi(bits as i32)
}

impl From<u128> for Position {
    fn from(value: u128) -> Self {
        Position::from_be_bytes(&value.to_be_bytes())
    }
}

impl From<u64> for Position {
    fn from(value: u64) -> Self {
        Position::from_be_bytes(&value.to_be_bytes())
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Position({})", self)
    }
}
