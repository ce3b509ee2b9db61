//! Hash ring data structure.
//!
//! Holds a `BTreeMap<Position, NodeId>` of virtual nodes behind a
//! reader/writer lock. Lookups take the shared lock; membership changes take
//! the exclusive lock for the whole node, so a reader sees either all of a
//! node's virtual nodes or none of them.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::config::RingConfig;
use crate::error::{Result, RingError};
use crate::hash::HashFunction;
use crate::node::{NodeId, PhysicalNode};
use crate::token::{space_size, Position, MAX_BITS};
use crate::topology::TopologyChange;
use crate::vnode::VirtualNode;

/// Salted rehashes tried per virtual node before giving up.
pub const MAX_COLLISION_ATTEMPTS: u32 = 64;

#[derive(Debug, Clone)]
struct NodeEntry {
    weight: u32,
    positions: Vec<Position>,
}

#[derive(Debug, Default)]
struct RingState {
    /// Virtual node positions: ring position -> physical node.
    entries: BTreeMap<Position, NodeId>,
    /// Per-node weight and the positions it owns.
    nodes: HashMap<NodeId, NodeEntry>,
}

impl RingState {
    /// First entry at or after `pos`, wrapping to the smallest position.
    fn successor(&self, pos: Position) -> Option<(&Position, &NodeId)> {
        self.entries
            .range(pos..)
            .next()
            .or_else(|| self.entries.iter().next())
    }

    fn insert(&mut self, id: &NodeId, entry: NodeEntry) {
        for pos in &entry.positions {
            self.entries.insert(*pos, id.clone());
        }
        self.nodes.insert(id.clone(), entry);
    }

    fn remove(&mut self, id: &str) -> Option<(NodeId, NodeEntry)> {
        let (id, entry) = self.nodes.remove_entry(id)?;
        for pos in &entry.positions {
            self.entries.remove(pos);
        }
        Some((id, entry))
    }
}

/// Consistent hash ring of weighted physical nodes.
///
/// Each physical node is mapped to `weight × base_replica_count` virtual
/// nodes. A key belongs to the first virtual node clockwise from its hash.
///
/// The ring is `Send + Sync`; share it behind an `Arc`.
#[derive(Debug)]
pub struct HashRing {
    state: RwLock<RingState>,
    hasher: Arc<dyn HashFunction>,
    /// Effective hash width in bits.
    width: u32,
    base_replica_count: usize,
    replication_factor: usize,
}

impl Default for HashRing {
    fn default() -> Self {
        let config = RingConfig::default();
        Self::from_parts(config.hash_function.build(), &config)
    }
}

impl HashRing {
    /// Empty ring with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty ring using the hash function named in `config`.
    pub fn with_config(config: RingConfig) -> Result<Self> {
        let hasher = config.hash_function.build();
        Self::with_hash_function(config, hasher)
    }

    /// Empty ring using a caller-supplied hash function.
    ///
    /// `config.hash_function` is ignored.
    pub fn with_hash_function(config: RingConfig, hasher: Arc<dyn HashFunction>) -> Result<Self> {
        config.validate()?;
        let bits = hasher.bits();
        if bits == 0 || bits % 8 != 0 || bits > MAX_BITS {
            return Err(RingError::InvalidConfig(format!(
                "hash function {} reports {bits} bits, expected a multiple of 8 in 8..={MAX_BITS}",
                hasher.name()
            )));
        }
        if config.hash_width > bits {
            warn!(
                hash_function = hasher.name(),
                requested = config.hash_width,
                native = hasher.bits(),
                "hash width clamped to hash function output"
            );
        }
        Ok(Self::from_parts(hasher, &config))
    }

    fn from_parts(hasher: Arc<dyn HashFunction>, config: &RingConfig) -> Self {
        Self {
            state: RwLock::new(RingState::default()),
            width: config.hash_width.min(hasher.bits()),
            hasher,
            base_replica_count: config.base_replica_count,
            replication_factor: config.replication_factor,
        }
    }

    /// Hashes a key into this ring's hash space.
    pub fn hash(&self, key: &[u8]) -> Position {
        self.hasher
            .hash(key)
            .truncate(self.hasher.bits(), self.width)
    }

    /// Add a physical node with `weight × base_replica_count` virtual nodes.
    ///
    /// Either every virtual node becomes visible to lookups or, on error,
    /// none does.
    pub fn add_node(&self, id: impl Into<NodeId>, weight: u32) -> Result<TopologyChange> {
        let id = id.into();
        if weight == 0 {
            return Err(RingError::InvalidWeight { node: id, weight });
        }
        // Plain labels are hashed before taking the lock; only collision
        // resolution needs the current ring.
        let candidates = self.candidates(&id, weight);

        let mut state = self.state.write();
        if state.nodes.contains_key(&id) {
            return Err(RingError::DuplicateNode(id));
        }
        let positions = self.resolve_collisions(&state, &id, candidates)?;
        state.insert(
            &id,
            NodeEntry {
                weight,
                positions: positions.clone(),
            },
        );
        drop(state);

        debug!(node = %id, weight, vnodes = positions.len(), "added node to ring");
        let vnodes = positions
            .into_iter()
            .map(|pos| VirtualNode::new(pos, id.clone()))
            .collect();
        Ok(TopologyChange::joined(id, vnodes))
    }

    /// Remove a physical node and all of its virtual nodes.
    pub fn remove_node(&self, id: &str) -> Result<TopologyChange> {
        let (id, entry) = self
            .state
            .write()
            .remove(id)
            .ok_or_else(|| RingError::NodeNotFound(NodeId::from(id)))?;

        debug!(node = %id, vnodes = entry.positions.len(), "removed node from ring");
        let vnodes = entry
            .positions
            .into_iter()
            .map(|pos| VirtualNode::new(pos, id.clone()))
            .collect();
        Ok(TopologyChange::left(id, vnodes))
    }

    /// Re-register a node with a new weight.
    ///
    /// Equivalent to `remove_node` followed by `add_node`, but performed
    /// under a single write lock so no lookup sees the node missing.
    /// Returns the departure and the join, in that order.
    pub fn reweight(&self, id: &str, weight: u32) -> Result<(TopologyChange, TopologyChange)> {
        let node = NodeId::from(id);
        if weight == 0 {
            return Err(RingError::InvalidWeight { node, weight });
        }
        let candidates = self.candidates(&node, weight);

        let mut state = self.state.write();
        let (node, old) = state.remove(id).ok_or(RingError::NodeNotFound(node))?;
        let positions = match self.resolve_collisions(&state, &node, candidates) {
            Ok(positions) => positions,
            Err(err) => {
                state.insert(&node, old);
                return Err(err);
            }
        };
        state.insert(
            &node,
            NodeEntry {
                weight,
                positions: positions.clone(),
            },
        );
        drop(state);

        debug!(node = %node, from = old.weight, to = weight, "reweighted node");
        let left = old
            .positions
            .into_iter()
            .map(|pos| VirtualNode::new(pos, node.clone()))
            .collect();
        let joined = positions
            .into_iter()
            .map(|pos| VirtualNode::new(pos, node.clone()))
            .collect();
        Ok((
            TopologyChange::left(node.clone(), left),
            TopologyChange::joined(node, joined),
        ))
    }

    fn candidates(&self, id: &NodeId, weight: u32) -> Vec<Position> {
        let count = weight as usize * self.base_replica_count;
        (0..count)
            .map(|replica| self.hash(VirtualNode::label(id, replica, 0).as_bytes()))
            .collect()
    }

    /// Rehashes any candidate that lands on an occupied position, either in
    /// the ring or earlier in the same batch.
    fn resolve_collisions(
        &self,
        state: &RingState,
        id: &NodeId,
        candidates: Vec<Position>,
    ) -> Result<Vec<Position>> {
        let mut claimed = BTreeSet::new();
        let mut positions = Vec::with_capacity(candidates.len());
        for (replica, candidate) in candidates.into_iter().enumerate() {
            let mut pos = candidate;
            let mut attempt = 0;
            while state.entries.contains_key(&pos) || claimed.contains(&pos) {
                attempt += 1;
                if attempt > MAX_COLLISION_ATTEMPTS {
                    return Err(RingError::PositionCollision {
                        node: id.clone(),
                        replica,
                    });
                }
                warn!(node = %id, replica, attempt, %pos, "virtual node collision, rehashing");
                pos = self.hash(VirtualNode::label(id, replica, attempt).as_bytes());
            }
            claimed.insert(pos);
            positions.push(pos);
        }
        Ok(positions)
    }

    /// Returns the node responsible for `key`.
    pub fn locate(&self, key: &[u8]) -> Result<NodeId> {
        Ok(self.locate_vnode(key)?.owner)
    }

    /// Returns the virtual node responsible for `key`.
    pub fn locate_vnode(&self, key: &[u8]) -> Result<VirtualNode> {
        self.locate_position(self.hash(key))
    }

    /// Returns the first virtual node at or clockwise after `pos`.
    ///
    /// A position past the largest virtual node wraps to the smallest.
    pub fn locate_position(&self, pos: Position) -> Result<VirtualNode> {
        let state = self.state.read();
        state
            .successor(pos)
            .map(|(pos, owner)| VirtualNode::new(*pos, owner.clone()))
            .ok_or(RingError::EmptyRing)
    }

    /// Returns `count` distinct physical nodes for `key`, primary first.
    ///
    /// Walks clockwise from the key's successor, skipping virtual nodes whose
    /// owner was already collected.
    pub fn locate_replicas(&self, key: &[u8], count: usize) -> Result<Vec<NodeId>> {
        self.replicas_at(self.hash(key), count)
    }

    /// [`locate_replicas`](Self::locate_replicas) with the configured
    /// replication factor.
    pub fn replicas(&self, key: &[u8]) -> Result<Vec<NodeId>> {
        self.locate_replicas(key, self.replication_factor)
    }

    /// Replica walk starting from a precomputed position.
    pub fn replicas_at(&self, pos: Position, count: usize) -> Result<Vec<NodeId>> {
        let state = self.state.read();
        if state.entries.is_empty() {
            return Err(RingError::EmptyRing);
        }
        let available = state.nodes.len();
        if count > available {
            return Err(RingError::InsufficientNodes {
                requested: count,
                available,
            });
        }

        let mut owners: Vec<NodeId> = Vec::with_capacity(count);
        for (_, owner) in state.entries.range(pos..).chain(state.entries.range(..pos)) {
            if owners.len() == count {
                break;
            }
            if !owners.contains(owner) {
                owners.push(owner.clone());
            }
        }
        Ok(owners)
    }

    /// The virtual node immediately counter-clockwise of `pos`.
    ///
    /// Wraps past zero to the largest position. With a single virtual node
    /// that node is its own predecessor.
    pub fn predecessor(&self, pos: Position) -> Option<VirtualNode> {
        let state = self.state.read();
        state
            .entries
            .range(..pos)
            .next_back()
            .or_else(|| state.entries.iter().next_back())
            .map(|(pos, owner)| VirtualNode::new(*pos, owner.clone()))
    }

    /// All virtual nodes, ordered by position.
    pub fn snapshot(&self) -> Vec<VirtualNode> {
        self.state
            .read()
            .entries
            .iter()
            .map(|(pos, owner)| VirtualNode::new(*pos, owner.clone()))
            .collect()
    }

    /// Fraction of the hash space owned by each node.
    ///
    /// A virtual node owns the arc `(predecessor, position]`.
    pub fn ownership(&self) -> BTreeMap<NodeId, f64> {
        self.ownership_of(&self.state.read())
    }

    /// [`snapshot`](Self::snapshot) and [`ownership`](Self::ownership)
    /// taken under one read lock, so both describe the same membership.
    pub fn snapshot_with_ownership(&self) -> (Vec<VirtualNode>, BTreeMap<NodeId, f64>) {
        let state = self.state.read();
        let snapshot = state
            .entries
            .iter()
            .map(|(pos, owner)| VirtualNode::new(*pos, owner.clone()))
            .collect();
        (snapshot, self.ownership_of(&state))
    }

    fn ownership_of(&self, state: &RingState) -> BTreeMap<NodeId, f64> {
        let mut shares = BTreeMap::new();
        let Some((last, only)) = state.entries.iter().next_back() else {
            return shares;
        };
        if state.entries.len() == 1 {
            shares.insert(only.clone(), 1.0);
            return shares;
        }

        let total = space_size(self.width);
        let mut prev = *last;
        for (pos, owner) in &state.entries {
            let arc = prev.distance_to(pos, self.width).as_f64();
            *shares.entry(owner.clone()).or_insert(0.0) += arc / total;
            prev = *pos;
        }
        shares
    }

    /// Returns the registered node with the given id.
    ///
    /// The returned node carries no keys; key assignment is tracked outside
    /// the ring.
    pub fn node(&self, id: &str) -> Option<PhysicalNode> {
        let state = self.state.read();
        let (id, entry) = state.nodes.get_key_value(id)?;
        PhysicalNode::new(id.clone(), entry.weight).ok()
    }

    /// All registered nodes, sorted by id.
    pub fn nodes(&self) -> Vec<PhysicalNode> {
        let state = self.state.read();
        let mut nodes: Vec<PhysicalNode> = state
            .nodes
            .iter()
            .filter_map(|(id, entry)| PhysicalNode::new(id.clone(), entry.weight).ok())
            .collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        nodes
    }

    /// Virtual nodes of one physical node, sorted by position.
    pub fn vnodes_of(&self, id: &str) -> Option<Vec<VirtualNode>> {
        let state = self.state.read();
        let (id, entry) = state.nodes.get_key_value(id)?;
        let mut vnodes: Vec<VirtualNode> = entry
            .positions
            .iter()
            .map(|pos| VirtualNode::new(*pos, id.clone()))
            .collect();
        vnodes.sort();
        Some(vnodes)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.state.read().nodes.contains_key(id)
    }

    /// Number of physical nodes.
    pub fn node_count(&self) -> usize {
        self.state.read().nodes.len()
    }

    /// Number of virtual nodes.
    pub fn vnode_count(&self) -> usize {
        self.state.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().entries.is_empty()
    }

    /// Effective hash width in bits.
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn base_replica_count(&self) -> usize {
        self.base_replica_count
    }

    pub fn replication_factor(&self) -> usize {
        self.replication_factor
    }

    pub fn hash_function_name(&self) -> &'static str {
        self.hasher.name()
    }
}
