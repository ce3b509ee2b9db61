//! Comprehensive tests for the hash ring implementation.
//!
//! # Test Strategy
//!
//! 1. **Basic functionality**: Empty ring, add/lookup, remove
//! 2. **Multiple nodes**: Distribution, consistency, replicas
//! 3. **Edge cases**: Wraparound, single node, duplicates
//! 4. **Rebalancing**: Only the expected fraction of keys moves
//! 5. **Thread safety**: Readers never see a half-added node

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use corelib::hash::{HashFunction, Sha1Hash};
use corelib::ring::{HashRing, RingBuilder};
use corelib::{NodeId, Position, RingConfig, RingError};

/// Hash function with hand-picked outputs for known labels.
#[derive(Debug, Default)]
struct TableHash(HashMap<Vec<u8>, u128>);

impl TableHash {
    fn with(mut self, label: &str, value: u128) -> Self {
        self.0.insert(label.as_bytes().to_vec(), value);
        self
    }
}

impl HashFunction for TableHash {
    fn hash(&self, data: &[u8]) -> Position {
        match self.0.get(data) {
            Some(value) => Position::from(*value),
            None => Sha1Hash.hash(data),
        }
    }

    fn bits(&self) -> u32 {
        160
    }

    fn name(&self) -> &'static str {
        "table"
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn config(base_replica_count: usize) -> RingConfig {
    RingConfig {
        base_replica_count,
        ..RingConfig::default()
    }
}

fn keys(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("key-{i}")).collect()
}

fn owners(ring: &HashRing, keys: &[String]) -> Vec<NodeId> {
    keys.iter()
        .map(|k| ring.locate(k.as_bytes()).unwrap())
        .collect()
}

/// Whether `h` lies in the arc `(pred, pos]`, wrapping past zero.
fn in_arc(h: Position, pred: Position, pos: Position) -> bool {
    if pred < pos {
        pred < h && h <= pos
    } else {
        h > pred || h <= pos
    }
}

// ============================================================================
// Basic Functionality Tests
// ============================================================================

#[test]
fn test_empty_ring_lookup() {
    let ring = HashRing::new();
    assert!(matches!(ring.locate(b"key1"), Err(RingError::EmptyRing)));
    assert!(matches!(
        ring.locate_replicas(b"key1", 1),
        Err(RingError::EmptyRing)
    ));
    assert_eq!(ring.node_count(), 0);
    assert_eq!(ring.vnode_count(), 0);
    assert!(ring.snapshot().is_empty());
}

#[test]
fn test_add_node_and_lookup() {
    let ring = HashRing::with_config(config(4)).unwrap();

    let change = ring.add_node("node1", 1).unwrap();
    assert_eq!(change.added().len(), 4);
    assert!(change.removed().is_empty());
    assert!(change.vnodes.windows(2).all(|w| w[0].position < w[1].position));

    assert_eq!(ring.node_count(), 1);
    assert_eq!(ring.vnode_count(), 4);
    assert_eq!(ring.locate(b"test-key").unwrap(), "node1");

    let node = ring.node("node1").expect("node registered");
    assert_eq!(node.weight, 1);
    assert!(node.keys().is_empty());
}

#[test]
fn test_remove_node() {
    let ring = HashRing::with_config(config(4)).unwrap();
    ring.add_node("node1", 1).unwrap();
    ring.add_node("node2", 1).unwrap();
    assert_eq!(ring.vnode_count(), 8);

    let change = ring.remove_node("node1").unwrap();
    assert_eq!(change.removed().len(), 4);
    assert!(change.removed().iter().all(|v| v.owner == "node1"));

    assert_eq!(ring.node_count(), 1);
    assert_eq!(ring.vnode_count(), 4);
    assert_eq!(ring.locate(b"some-key").unwrap(), "node2");
    assert!(ring.node("node1").is_none());
    assert!(ring.contains_node("node2"));
}

#[test]
fn test_remove_missing_node_leaves_ring_unchanged() {
    let ring = HashRing::with_config(config(8)).unwrap();
    ring.add_node("a", 1).unwrap();
    ring.add_node("b", 2).unwrap();

    let before = ring.snapshot();
    let err = ring.remove_node("zzz").unwrap_err();
    assert!(matches!(err, RingError::NodeNotFound(ref id) if id == "zzz"));
    assert_eq!(ring.snapshot(), before);
}

#[test]
fn test_invalid_and_duplicate_adds() {
    let ring = HashRing::with_config(config(4)).unwrap();
    assert!(matches!(
        ring.add_node("a", 0),
        Err(RingError::InvalidWeight { weight: 0, .. })
    ));
    assert!(ring.is_empty());

    ring.add_node("a", 1).unwrap();
    let before = ring.snapshot();
    assert!(matches!(
        ring.add_node("a", 3),
        Err(RingError::DuplicateNode(ref id)) if id == "a"
    ));
    assert_eq!(ring.snapshot(), before);
}

// ============================================================================
// Multiple Nodes Tests
// ============================================================================

#[test]
fn test_consistent_lookup_across_instances() {
    let build = || {
        RingBuilder::new()
            .with_vnodes(32)
            .add_node("node1")
            .add_node("node2")
            .add_weighted_node("node3", 2)
            .build()
            .unwrap()
    };
    let ring1 = build();
    let ring2 = build();

    for key in keys(500) {
        let first = ring1.locate(key.as_bytes()).unwrap();
        assert_eq!(first, ring1.locate(key.as_bytes()).unwrap());
        assert_eq!(first, ring2.locate(key.as_bytes()).unwrap());
    }
    assert_eq!(ring1.snapshot(), ring2.snapshot());
}

#[test]
fn test_replica_diversity() {
    let ring = RingBuilder::new()
        .with_vnodes(16)
        .add_node("a")
        .add_node("b")
        .add_node("c")
        .add_weighted_node("d", 3)
        .build()
        .unwrap();

    for key in keys(200) {
        for r in 1..=4 {
            let replicas = ring.locate_replicas(key.as_bytes(), r).unwrap();
            assert_eq!(replicas.len(), r);
            let mut unique = replicas.clone();
            unique.sort();
            unique.dedup();
            assert_eq!(unique.len(), r, "duplicate replica for {key}");
            assert_eq!(replicas[0], ring.locate(key.as_bytes()).unwrap());
        }
    }

    assert!(matches!(
        ring.locate_replicas(b"key", 5),
        Err(RingError::InsufficientNodes {
            requested: 5,
            available: 4
        })
    ));
    assert!(ring.locate_replicas(b"key", 0).unwrap().is_empty());
}

#[test]
fn test_default_replication_factor() {
    let ring = RingBuilder::new()
        .with_vnodes(8)
        .with_replication_factor(2)
        .add_node("a")
        .add_node("b")
        .add_node("c")
        .build()
        .unwrap();
    assert_eq!(ring.replicas(b"key").unwrap().len(), 2);
}

#[test]
fn test_load_is_balanced() {
    let mut builder = RingBuilder::new();
    for i in 0..10 {
        builder = builder.add_node(format!("node{i}"));
    }
    let ring = builder.build().unwrap();
    assert_eq!(ring.vnode_count(), 1500);

    let mut load: BTreeMap<NodeId, usize> = BTreeMap::new();
    for key in keys(100_000) {
        *load.entry(ring.locate(key.as_bytes()).unwrap()).or_default() += 1;
    }
    assert_eq!(load.len(), 10);

    let mean = 100_000.0 / 10.0;
    let variance = load
        .values()
        .map(|v| (*v as f64 - mean).powi(2))
        .sum::<f64>()
        / 10.0;
    let std_dev_pct = variance.sqrt() / mean * 100.0;
    assert!(std_dev_pct <= 15.0, "load std dev {std_dev_pct:.2}% of mean");
}

#[test]
fn test_weight_scales_share() {
    let ring = RingBuilder::new()
        .with_vnodes(100)
        .add_node("light")
        .add_weighted_node("heavy", 3)
        .build()
        .unwrap();

    let shares = ring.ownership();
    let ratio = shares["heavy"] / shares["light"];
    assert!((2.0..=4.5).contains(&ratio), "ownership ratio {ratio:.2}");
}

// ============================================================================
// Ring Builder Tests
// ============================================================================

#[test]
fn test_ring_builder_default() {
    let ring = RingBuilder::new()
        .add_node("node1")
        .add_node("node2")
        .build()
        .unwrap();

    assert_eq!(ring.node_count(), 2);
    // Default is 150 vnodes per unit weight
    assert_eq!(ring.vnode_count(), 300);
    assert_eq!(ring.hash_function_name(), "sha1");
    assert_eq!(ring.width(), 160);
}

#[test]
fn test_ring_builder_mixed_weights() {
    let ring = RingBuilder::new()
        .with_vnodes(4)
        .add_node("node1")
        .add_weighted_node("node2", 2)
        .build()
        .unwrap();

    assert_eq!(ring.node_count(), 2);
    assert_eq!(ring.vnode_count(), 12); // 4 + 8
    assert_eq!(ring.vnodes_of("node2").unwrap().len(), 8);
}

#[test]
fn test_ring_builder_rejects_bad_input() {
    assert!(matches!(
        RingBuilder::new().with_vnodes(0).build(),
        Err(RingError::InvalidConfig(_))
    ));
    assert!(matches!(
        RingBuilder::new().add_node("a").add_node("a").build(),
        Err(RingError::DuplicateNode(_))
    ));
}

// ============================================================================
// Edge Cases
// ============================================================================

#[test]
fn test_wraparound() {
    let hasher = TableHash::default()
        .with("A#0", 10)
        .with("B#0", 50)
        .with("C#0", 90)
        .with("k95", 95)
        .with("k50", 50)
        .with("k51", 51)
        .with("k0", 0);
    let ring = RingBuilder::new()
        .with_vnodes(1)
        .with_hash_function(Arc::new(hasher))
        .add_node("A")
        .add_node("B")
        .add_node("C")
        .build()
        .unwrap();

    let positions: Vec<Position> = ring.snapshot().iter().map(|v| v.position).collect();
    assert_eq!(
        positions,
        vec![
            Position::from(10u128),
            Position::from(50u128),
            Position::from(90u128)
        ]
    );

    assert_eq!(ring.locate(b"k95").unwrap(), "A");
    assert_eq!(ring.locate(b"k50").unwrap(), "B");
    assert_eq!(ring.locate(b"k51").unwrap(), "C");
    assert_eq!(ring.locate(b"k0").unwrap(), "A");
    assert_eq!(ring.locate_replicas(b"k95", 3).unwrap(), vec!["A", "B", "C"]);
}

#[test]
fn test_collision_is_salted() {
    init_tracing();
    // B's first replica lands on A's position and must be rehashed.
    let hasher = TableHash::default()
        .with("A#0", 10)
        .with("B#0", 10)
        .with("B#0@1", 70);
    let ring = RingBuilder::new()
        .with_vnodes(1)
        .with_hash_function(Arc::new(hasher))
        .add_node("A")
        .add_node("B")
        .build()
        .unwrap();

    let snapshot = ring.snapshot();
    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot[0].position, Position::from(10u128));
    assert_eq!(snapshot[0].owner, "A");
    assert_eq!(snapshot[1].position, Position::from(70u128));
    assert_eq!(snapshot[1].owner, "B");
}

/// Claims a 256-bit output, wider than any ring position.
#[derive(Debug)]
struct Wide256;

impl HashFunction for Wide256 {
    fn hash(&self, data: &[u8]) -> Position {
        Sha1Hash.hash(data)
    }

    fn bits(&self) -> u32 {
        256
    }

    fn name(&self) -> &'static str {
        "wide256"
    }
}

#[test]
fn test_oversized_hash_function_rejected() {
    init_tracing();
    let result = RingBuilder::new()
        .with_vnodes(50)
        .with_hash_function(Arc::new(Wide256))
        .add_node("a")
        .add_node("b")
        .build();
    assert!(matches!(result, Err(RingError::InvalidConfig(_))));
}

#[test]
fn test_narrow_hash_function_clamps_width() {
    init_tracing();
    let ring = RingBuilder::new()
        .with_hash_algorithm(corelib::HashAlgorithm::Murmur3)
        .add_node("a")
        .add_node("b")
        .build()
        .unwrap();
    assert_eq!(ring.width(), 128);
    for key in keys(1_000) {
        assert!(ring.hash(key.as_bytes()) <= Position::max(128));
    }
    let total: f64 = ring.ownership().values().sum();
    assert!((total - 1.0).abs() < 1e-6);
}

#[test]
fn test_single_node() {
    let ring = HashRing::with_config(config(4)).unwrap();
    ring.add_node("node1", 1).unwrap();

    for key in ["key1", "key2", "", "very-long-key-name"] {
        let key = key.as_bytes();
        assert_eq!(ring.locate(key).unwrap(), "node1");
    }
}

#[test]
fn test_add_remove_add() {
    let ring = HashRing::with_config(config(4)).unwrap();

    let first = ring.add_node("node1", 1).unwrap();
    ring.remove_node("node1").unwrap();
    assert!(ring.is_empty());

    let second = ring.add_node("node1", 1).unwrap();
    assert_eq!(first.vnodes, second.vnodes, "placement is deterministic");
    assert!(ring.locate(b"key").is_ok());
}

// ============================================================================
// Rebalancing
// ============================================================================

#[test]
fn test_add_node_moves_bounded_fraction() {
    let ring = HashRing::new();
    for i in 0..5 {
        ring.add_node(format!("node{i}"), 1).unwrap();
    }
    let keys = keys(10_000);
    let before = owners(&ring, &keys);

    ring.add_node("node5", 1).unwrap();
    let after = owners(&ring, &keys);

    let moved: Vec<_> = before
        .iter()
        .zip(&after)
        .filter(|(b, a)| b != a)
        .collect();
    let bound = keys.len() as f64 / 6.0 * 1.5;
    assert!(!moved.is_empty());
    assert!((moved.len() as f64) <= bound, "{} keys moved", moved.len());
    assert!(moved.iter().all(|(_, a)| *a == "node5"));
}

#[test]
fn test_remove_node_moves_only_its_keys() {
    let ring = HashRing::with_config(config(50)).unwrap();
    for i in 0..4 {
        ring.add_node(format!("node{i}"), 1).unwrap();
    }
    let keys = keys(5_000);
    let before = owners(&ring, &keys);

    ring.remove_node("node2").unwrap();
    let after = owners(&ring, &keys);

    for (key, (b, a)) in keys.iter().zip(before.iter().zip(&after)) {
        if b == "node2" {
            assert_ne!(a, "node2", "{key} still on removed node");
        } else {
            assert_eq!(b, a, "{key} moved off {b} to {a}");
        }
    }
}

#[test]
fn test_three_node_scenario_arcs() {
    let ring = RingBuilder::new()
        .with_vnodes(3)
        .add_node("A")
        .add_node("B")
        .add_node("C")
        .build()
        .unwrap();
    assert_eq!(ring.vnode_count(), 9);

    let keys = keys(2_000);
    let before = owners(&ring, &keys);

    let change = ring.add_node("D", 1).unwrap();
    let arcs: Vec<(Position, Position)> = change
        .added()
        .iter()
        .map(|v| (ring.predecessor(v.position).unwrap().position, v.position))
        .collect();

    for (key, old) in keys.iter().zip(&before) {
        let h = ring.hash(key.as_bytes());
        let now = ring.locate(key.as_bytes()).unwrap();
        if arcs.iter().any(|(pred, pos)| in_arc(h, *pred, *pos)) {
            assert_eq!(now, "D", "{key} should have moved to D");
        } else {
            assert_eq!(&now, old, "{key} should not have moved");
        }
    }
}

// ============================================================================
// Thread Safety
// ============================================================================

#[test]
fn test_readers_never_see_partial_nodes() {
    const BASE: usize = 10;
    let ring = HashRing::with_config(config(BASE)).unwrap();
    ring.add_node("stable", 1).unwrap();

    std::thread::scope(|s| {
        s.spawn(|| {
            for round in 0..50 {
                let id = format!("tmp{}", round % 3);
                ring.add_node(id.as_str(), 2).unwrap();
                ring.remove_node(&id).unwrap();
            }
        });

        for _ in 0..4 {
            s.spawn(|| {
                for i in 0..200 {
                    let snapshot = ring.snapshot();
                    let mut per_node: HashMap<&str, usize> = HashMap::new();
                    for vnode in &snapshot {
                        *per_node.entry(vnode.owner.as_str()).or_default() += 1;
                    }
                    assert_eq!(per_node.get("stable"), Some(&BASE));
                    for (node, count) in per_node {
                        if node != "stable" {
                            assert_eq!(count, 2 * BASE, "partial view of {node}");
                        }
                    }
                    assert!(ring.locate(format!("k{i}").as_bytes()).is_ok());
                }
            });
        }
    });

    assert_eq!(ring.node_count(), 1);
}
