//! Migration records.
//!
//! Every change of a key's cached owner is appended to an audit log, so the
//! storage layer can move the data behind it.

use std::time::SystemTime;

use serde::Serialize;

use corelib::NodeId;

/// What triggered a key to change owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationCause {
    /// A new virtual node claimed the key's arc.
    NodeAdded,
    /// The key's owner (or one of its virtual nodes) left the ring.
    NodeRemoved,
    /// A full pass or re-placement found a stale owner.
    Reconcile,
}

impl MigrationCause {
    pub fn as_str(self) -> &'static str {
        match self {
            MigrationCause::NodeAdded => "node_added",
            MigrationCause::NodeRemoved => "node_removed",
            MigrationCause::Reconcile => "reconcile",
        }
    }
}

/// One key moving between owners.
///
/// `from` is `None` for a key that had no owner (it was tracked while the
/// ring was empty); `to` is `None` when the ring became empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationRecord {
    /// Position in the log, starting at 0.
    pub seq: u64,
    pub key: String,
    pub from: Option<NodeId>,
    pub to: Option<NodeId>,
    pub cause: MigrationCause,
    pub timestamp: SystemTime,
}

/// Append-only migration log.
#[derive(Debug, Default)]
pub struct MigrationLog {
    records: Vec<MigrationRecord>,
}

impl MigrationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record and returns a copy of it.
    pub fn append(
        &mut self,
        key: &str,
        from: Option<NodeId>,
        to: Option<NodeId>,
        cause: MigrationCause,
    ) -> MigrationRecord {
        let record = MigrationRecord {
            seq: self.records.len() as u64,
            key: key.to_owned(),
            from,
            to,
            cause,
            timestamp: SystemTime::now(),
        };
        self.records.push(record.clone());
        record
    }

    pub fn records(&self) -> &[MigrationRecord] {
        &self.records
    }

    /// Records with `seq >= seq`.
    pub fn since(&self, seq: u64) -> &[MigrationRecord] {
        let start = (seq as usize).min(self.records.len());
        &self.records[start..]
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
