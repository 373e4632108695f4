//! Local Cache Module
//!
//! The in-process tier: one bounded LRU/TTL partition per resource type,
//! each sized from the endpoint policy table.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::cache::{
    canonical_name, known_policies, policy, resource_type, CacheStats, CacheStore,
    DEFAULT_POLICY, DEFAULT_RESOURCE_TYPE,
};

// == Local Tier Stats ==
/// Size and configuration of one partition.
#[derive(Debug, Clone, Serialize)]
pub struct PartitionStats {
    pub entries: usize,
    pub capacity: usize,
    pub ttl_seconds: u64,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
}

/// Totals across partitions plus a per-resource-type breakdown.
#[derive(Debug, Clone, Serialize)]
pub struct LocalTierStats {
    pub entries: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub hit_rate: f64,
    pub partitions: BTreeMap<String, PartitionStats>,
}

// == Local Cache ==
/// Process-local cache shared by every resource type.
///
/// Every known resource type and the `default` partition exist from the
/// start, so stats always list the full configured capacity.
#[derive(Debug)]
pub struct LocalCache {
    partitions: RwLock<HashMap<&'static str, CacheStore>>,
}

impl Default for LocalCache {
    fn default() -> Self {
        let partitions = known_policies()
            .chain(std::iter::once((DEFAULT_RESOURCE_TYPE, DEFAULT_POLICY)))
            .map(|(name, policy)| (name, CacheStore::new(policy)))
            .collect();

        Self {
            partitions: RwLock::new(partitions),
        }
    }
}

/// Maps a request path onto the partition that holds it.
fn partition_for(path: &str) -> &'static str {
    canonical_name(resource_type(path)).unwrap_or(DEFAULT_RESOURCE_TYPE)
}

impl LocalCache {
    pub fn new() -> Self {
        Self::default()
    }

    // == Get ==
    /// Looks up `key` in the partition owning `path`.
    pub async fn get(&self, path: &str, key: &str) -> Option<Value> {
        let partition = partition_for(path);
        // LRU bookkeeping needs the write lock even for reads
        let mut partitions = self.partitions.write().await;
        let value = partitions
            .entry(partition)
            .or_insert_with(|| CacheStore::new(policy(partition)))
            .get(key);
        debug!(partition, key, hit = value.is_some(), "local cache lookup");
        value
    }

    // == Insert ==
    /// Stores `value` in the partition owning `path`.
    pub async fn insert(&self, path: &str, key: &str, value: Value) {
        let partition = partition_for(path);
        let mut partitions = self.partitions.write().await;
        let store = partitions
            .entry(partition)
            .or_insert_with(|| CacheStore::new(policy(partition)));

        if let Some(evicted) = store.set(key.to_string(), value) {
            debug!(partition, evicted = %evicted, "local cache evicted entry");
        }
    }

    // == Clear ==
    /// Empties every partition, returning the number of entries dropped.
    pub async fn clear(&self) -> usize {
        let mut partitions = self.partitions.write().await;
        partitions.values_mut().map(CacheStore::clear).sum()
    }

    // == Remove Matching ==
    /// Removes entries whose key satisfies `predicate`.
    pub async fn remove_where<F>(&self, predicate: F) -> usize
    where
        F: Fn(&str) -> bool,
    {
        let mut partitions = self.partitions.write().await;
        partitions
            .values_mut()
            .map(|store| store.remove_where(&predicate))
            .sum()
    }

    // == Purge Expired ==
    /// Eagerly drops expired entries from every partition.
    pub async fn purge_expired(&self) -> usize {
        let mut partitions = self.partitions.write().await;
        partitions.values_mut().map(CacheStore::cleanup_expired).sum()
    }

    pub async fn len(&self) -> usize {
        let partitions = self.partitions.read().await;
        partitions.values().map(CacheStore::len).sum()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    // == Stats ==
    pub async fn stats(&self) -> LocalTierStats {
        let partitions = self.partitions.read().await;

        let mut totals = CacheStats::new();
        let mut capacity = 0;
        let mut breakdown = BTreeMap::new();

        for (name, store) in partitions.iter() {
            let stats = store.stats();
            let policy = store.policy();
            totals.merge(&stats);
            capacity += policy.capacity;
            breakdown.insert(
                name.to_string(),
                PartitionStats {
                    entries: stats.entries,
                    capacity: policy.capacity,
                    ttl_seconds: policy.ttl_seconds,
                    hits: stats.hits,
                    misses: stats.misses,
                    evictions: stats.evictions,
                    expirations: stats.expirations,
                },
            );
        }

        LocalTierStats {
            entries: totals.entries,
            capacity,
            hits: totals.hits,
            misses: totals.misses,
            evictions: totals.evictions,
            expirations: totals.expirations,
            hit_rate: totals.hit_rate(),
            partitions: breakdown,
        }
    }
}
