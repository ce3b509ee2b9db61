//! Key placement on top of a [`HashRing`].
//!
//! The [`KeyManager`] remembers which node each key was placed on and moves
//! keys when the ring's membership changes. Only keys whose owner actually
//! changes are touched, and every move is written to the migration log.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::Bound;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use corelib::{
    HashRing, NodeId, PhysicalNode, Position, Result, RingError, TopologyChange, VirtualNode,
};
use replication::{ReplicaPlacement, ReplicationStrategy, SimpleStrategy};

use crate::migration::{MigrationCause, MigrationLog, MigrationRecord};
use crate::stats::Statistics;

/// Keys re-checked per write-lock acquisition in [`KeyManager::reconcile`].
pub const RECONCILE_BATCH: usize = 1024;

#[derive(Debug, Clone)]
struct Placement {
    hash: Position,
    /// `None` while the ring has no nodes.
    owner: Option<NodeId>,
}

/// Key bookkeeping guarded by a single lock.
#[derive(Debug, Default)]
struct KeyIndex {
    placements: HashMap<String, Placement>,
    by_position: BTreeMap<Position, BTreeSet<String>>,
    assignments: HashMap<NodeId, BTreeSet<String>>,
    log: MigrationLog,
}

impl KeyIndex {
    fn insert(&mut self, key: &str, hash: Position, owner: Option<NodeId>) {
        self.by_position
            .entry(hash)
            .or_default()
            .insert(key.to_owned());
        if let Some(owner) = &owner {
            self.assignments
                .entry(owner.clone())
                .or_default()
                .insert(key.to_owned());
        }
        self.placements
            .insert(key.to_owned(), Placement { hash, owner });
    }

    fn remove(&mut self, key: &str) -> Option<Placement> {
        let placement = self.placements.remove(key)?;
        if let Some(keys) = self.by_position.get_mut(&placement.hash) {
            keys.remove(key);
            if keys.is_empty() {
                self.by_position.remove(&placement.hash);
            }
        }
        if let Some(owner) = &placement.owner {
            self.unassign(owner, key);
        }
        Some(placement)
    }

    fn unassign(&mut self, owner: &NodeId, key: &str) {
        if let Some(keys) = self.assignments.get_mut(owner) {
            keys.remove(key);
            if keys.is_empty() {
                self.assignments.remove(owner);
            }
        }
    }

    /// Moves `key` to `to` and logs it. Returns `None` if the key is
    /// unknown or already there.
    fn migrate(
        &mut self,
        key: &str,
        to: Option<NodeId>,
        cause: MigrationCause,
    ) -> Option<MigrationRecord> {
        let placement = self.placements.get_mut(key)?;
        if placement.owner == to {
            return None;
        }
        let from = std::mem::replace(&mut placement.owner, to.clone());
        if let Some(from) = &from {
            self.unassign(from, key);
        }
        if let Some(to) = &to {
            self.assignments
                .entry(to.clone())
                .or_default()
                .insert(key.to_owned());
        }
        Some(self.log.append(key, from, to, cause))
    }

    fn keys_of(&self, owner: &NodeId) -> Vec<String> {
        self.assignments
            .get(owner)
            .map(|keys| keys.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Keys hashing into the arc `(start, end]`, wrapping past zero.
    fn keys_in_arc(&self, start: Position, end: Position) -> Vec<String> {
        let tail = (Bound::Excluded(start), Bound::Included(end));
        let keys: Vec<&BTreeSet<String>> = if start < end {
            self.by_position.range(tail).map(|(_, k)| k).collect()
        } else if start == end {
            // A lone virtual node owns the whole ring.
            self.by_position.values().collect()
        } else {
            self.by_position
                .range((Bound::Excluded(start), Bound::Unbounded))
                .chain(self.by_position.range(..=end))
                .map(|(_, k)| k)
                .collect()
        };
        keys.into_iter().flatten().cloned().collect()
    }
}

/// Tracks the owner of every placed key and rebalances on ring changes.
///
/// Safe to share between threads. Lookups and placements may run while
/// another thread applies a topology change; a rebalancing pass holds the
/// key lock for its whole duration, so no caller sees half of a pass.
#[derive(Debug)]
pub struct KeyManager {
    ring: Arc<HashRing>,
    strategy: Box<dyn ReplicationStrategy>,
    index: RwLock<KeyIndex>,
}

impl KeyManager {
    /// Manager using a [`SimpleStrategy`] with the ring's replication factor.
    pub fn new(ring: Arc<HashRing>) -> Self {
        let strategy = SimpleStrategy::for_ring(&ring);
        Self::with_strategy(ring, strategy)
    }

    pub fn with_strategy(ring: Arc<HashRing>, strategy: impl ReplicationStrategy) -> Self {
        Self {
            ring,
            strategy: Box::new(strategy),
            index: RwLock::new(KeyIndex::default()),
        }
    }

    pub fn ring(&self) -> &Arc<HashRing> {
        &self.ring
    }

    pub fn strategy(&self) -> &dyn ReplicationStrategy {
        self.strategy.as_ref()
    }

    // ------------------------------------------------------------------
    // Keys
    // ------------------------------------------------------------------

    /// Records `key` on the node the ring currently assigns it to.
    ///
    /// Placing a key that is already tracked re-checks its owner and moves
    /// it if the cached one is stale. Fails with
    /// [`RingError::EmptyRing`] when there are no nodes.
    pub fn place_key(&self, key: &str) -> Result<NodeId> {
        let hash = self.ring.hash(key.as_bytes());
        let mut index = self.index.write();
        let owner = self.ring.locate_position(hash)?.owner;

        let cached = index.placements.get(key).map(|p| p.owner.clone());
        match cached {
            None => {
                index.insert(key, hash, Some(owner.clone()));
                debug!(key, node = %owner, "placed key");
            }
            Some(current) if current.as_ref() == Some(&owner) => {}
            Some(_) => {
                let to = Some(owner.clone());
                if let Some(record) = index.migrate(key, to, MigrationCause::Reconcile) {
                    record_metrics(MigrationCause::Reconcile, 1);
                    debug!(key, from = ?record.from, to = %owner, "re-placed stale key");
                }
            }
        }
        metrics::gauge!("keymanager_keys").set(index.placements.len() as f64);
        Ok(owner)
    }

    /// Stops tracking `key`, returning the node it was on.
    pub fn remove_key(&self, key: &str) -> Option<NodeId> {
        let mut index = self.index.write();
        let placement = index.remove(key)?;
        metrics::gauge!("keymanager_keys").set(index.placements.len() as f64);
        placement.owner
    }

    /// Current owner of `key` according to the ring, tracked or not.
    pub fn locate_key(&self, key: &str) -> Result<NodeId> {
        self.ring.locate(key.as_bytes())
    }

    /// Owner recorded for `key`.
    ///
    /// `None` for an unknown key, and for a tracked key while the ring is
    /// empty.
    pub fn cached_owner(&self, key: &str) -> Option<NodeId> {
        self.index
            .read()
            .placements
            .get(key)
            .and_then(|p| p.owner.clone())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.read().placements.contains_key(key)
    }

    pub fn key_count(&self) -> usize {
        self.index.read().placements.len()
    }

    /// Keys currently recorded on `node`.
    pub fn keys_on(&self, node: &str) -> BTreeSet<String> {
        self.index
            .read()
            .assignments
            .get(node)
            .cloned()
            .unwrap_or_default()
    }

    /// The ring's view of `node` together with the keys placed on it.
    pub fn node(&self, id: &str) -> Option<PhysicalNode> {
        let mut node = self.ring.node(id)?;
        for key in self.keys_on(id) {
            node.insert_key(key);
        }
        Some(node)
    }

    /// Replica set for `key` chosen by the configured strategy.
    ///
    /// A strategy asking for zero replicas is a configuration error.
    pub fn replicas(&self, key: &str) -> Result<ReplicaPlacement> {
        if self.strategy.replication_factor() == 0 {
            return Err(RingError::InvalidConfig(format!(
                "{} has a replication factor of 0",
                self.strategy.name()
            )));
        }
        let nodes = self.strategy.replicas_for_key(&self.ring, key.as_bytes())?;
        ReplicaPlacement::new(key, nodes).ok_or(RingError::InsufficientNodes {
            requested: self.strategy.replication_factor(),
            available: self.ring.node_count(),
        })
    }

    // ------------------------------------------------------------------
    // Membership
    // ------------------------------------------------------------------

    /// Adds a node to the ring and moves the keys it now owns.
    pub fn add_node(&self, id: impl Into<NodeId>, weight: u32) -> Result<Vec<MigrationRecord>> {
        let change = self.ring.add_node(id, weight)?;
        Ok(self.apply(&change))
    }

    /// Removes a node from the ring and re-places its keys.
    pub fn remove_node(&self, id: &str) -> Result<Vec<MigrationRecord>> {
        let change = self.ring.remove_node(id)?;
        Ok(self.apply(&change))
    }

    /// Changes a node's weight and rebalances both sides of the change.
    pub fn reweight(&self, id: &str, weight: u32) -> Result<Vec<MigrationRecord>> {
        let (left, joined) = self.ring.reweight(id, weight)?;
        Ok(self.on_topology_change(joined.added(), left.removed()))
    }

    /// Rebalances for a change reported by the ring.
    pub fn apply(&self, change: &TopologyChange) -> Vec<MigrationRecord> {
        self.on_topology_change(change.added(), change.removed())
    }

    /// Moves exactly the keys whose owner changed because `added` joined and
    /// `removed` left the ring.
    ///
    /// Removals are handled first: every key recorded on an owner of a
    /// removed virtual node is located again. Then, for each added virtual
    /// node still on the ring, only the keys in the arc between it and its
    /// predecessor are checked. Owners are always taken from the ring's
    /// current state, so the pass is correct even if the ring changed again
    /// after the change was reported.
    pub fn on_topology_change(
        &self,
        added: &[VirtualNode],
        removed: &[VirtualNode],
    ) -> Vec<MigrationRecord> {
        let mut index = self.index.write();
        let mut records = Vec::new();

        let departed: BTreeSet<&NodeId> = removed.iter().map(|v| &v.owner).collect();
        for owner in departed {
            for key in index.keys_of(owner) {
                let to = self.current_owner(&index, &key);
                if let Some(record) = index.migrate(&key, to, MigrationCause::NodeRemoved) {
                    records.push(record);
                }
            }
        }
        let removed_moves = records.len();

        for vnode in added {
            match self.ring.locate_position(vnode.position) {
                Ok(current) if current == *vnode => {}
                _ => continue,
            }
            let Some(pred) = self.ring.predecessor(vnode.position) else {
                continue;
            };
            for key in index.keys_in_arc(pred.position, vnode.position) {
                let to = self.current_owner(&index, &key);
                if let Some(record) = index.migrate(&key, to, MigrationCause::NodeAdded) {
                    records.push(record);
                }
            }
        }

        record_metrics(MigrationCause::NodeRemoved, removed_moves);
        record_metrics(MigrationCause::NodeAdded, records.len() - removed_moves);
        info!(
            added = added.len(),
            removed = removed.len(),
            moved = records.len(),
            keys = index.placements.len(),
            "rebalanced keys after topology change"
        );
        records
    }

    /// Re-checks every tracked key against the ring.
    ///
    /// Picks up changes made directly on the ring without going through
    /// this manager. Works in batches of [`RECONCILE_BATCH`] keys, taking
    /// the write lock once per batch so placements can interleave.
    pub fn reconcile(&self) -> Vec<MigrationRecord> {
        let keys: Vec<String> = self.index.read().placements.keys().cloned().collect();
        let mut records = Vec::new();

        for batch in keys.chunks(RECONCILE_BATCH) {
            let mut index = self.index.write();
            for key in batch {
                if !index.placements.contains_key(key) {
                    continue;
                }
                let to = self.current_owner(&index, key);
                if let Some(record) = index.migrate(key, to, MigrationCause::Reconcile) {
                    records.push(record);
                }
            }
        }

        record_metrics(MigrationCause::Reconcile, records.len());
        info!(checked = keys.len(), moved = records.len(), "reconciled keys");
        records
    }

    fn current_owner(&self, index: &KeyIndex, key: &str) -> Option<NodeId> {
        let hash = index.placements.get(key)?.hash;
        self.ring.locate_position(hash).ok().map(|v| v.owner)
    }

    // ------------------------------------------------------------------
    // Reporting
    // ------------------------------------------------------------------

    /// Every migration recorded so far, oldest first.
    pub fn migrations(&self) -> Vec<MigrationRecord> {
        self.index.read().log.records().to_vec()
    }

    /// Migrations with a sequence number of at least `seq`.
    pub fn migrations_since(&self, seq: u64) -> Vec<MigrationRecord> {
        self.index.read().log.since(seq).to_vec()
    }

    /// Load and ownership figures for the current ring.
    pub fn statistics(&self) -> Statistics {
        let (snapshot, ownership) = self.ring.snapshot_with_ownership();
        let index = self.index.read();

        let mut per_node_load: BTreeMap<NodeId, usize> =
            snapshot.iter().map(|v| (v.owner.clone(), 0)).collect();
        for (node, keys) in &index.assignments {
            if let Some(load) = per_node_load.get_mut(node) {
                *load = keys.len();
            }
        }
        Statistics::new(snapshot.len(), index.placements.len(), per_node_load, ownership)
    }
}

fn record_metrics(cause: MigrationCause, moved: usize) {
    if moved > 0 {
        metrics::counter!("keymanager_migrations_total", "cause" => cause.as_str())
            .increment(moved as u64);
    }
}
