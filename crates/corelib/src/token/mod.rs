//! Positions on the hash ring.
//!
//! A position is the output of a hash function interpreted as an unsigned
//! integer; the ring orders virtual nodes and keys by it.

pub mod position;

pub use position::{space_size, Position, MAX_BITS};
