//! Load statistics.

use std::collections::BTreeMap;

use serde::Serialize;

use corelib::NodeId;

/// Point-in-time view of ring size and key distribution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    pub node_count: usize,
    pub virtual_node_count: usize,
    /// All tracked keys, including any without an owner.
    pub total_keys: usize,
    /// Cached key count per node on the ring; nodes without keys report 0.
    pub per_node_load: BTreeMap<NodeId, usize>,
    /// Population standard deviation of `per_node_load` as a percentage of
    /// its mean.
    pub load_std_dev_percent: f64,
    /// Fraction of the hash space each node owns.
    pub ownership: BTreeMap<NodeId, f64>,
}

impl Statistics {
    pub(crate) fn new(
        virtual_node_count: usize,
        total_keys: usize,
        per_node_load: BTreeMap<NodeId, usize>,
        ownership: BTreeMap<NodeId, f64>,
    ) -> Self {
        Self {
            node_count: per_node_load.len(),
            virtual_node_count,
            total_keys,
            load_std_dev_percent: std_dev_percent(per_node_load.values().copied()),
            per_node_load,
            ownership,
        }
    }
}

/// Standard deviation of `loads` relative to their mean, in percent.
///
/// Zero for an empty input or when every load is zero.
pub fn std_dev_percent(loads: impl IntoIterator<Item = usize>) -> f64 {
    let loads: Vec<f64> = loads.into_iter().map(|l| l as f64).collect();
    if loads.is_empty() {
        return 0.0;
    }
    let n = loads.len() as f64;
    let mean = loads.iter().sum::<f64>() / n;
    if mean == 0.0 {
        return 0.0;
    }
    let variance = loads.iter().map(|l| (l - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt() / mean * 100.0
}
