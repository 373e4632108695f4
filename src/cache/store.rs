//! Cache Store Module
//!
//! One bounded partition of the local tier: HashMap storage with LRU
//! eviction and per-entry TTL.

use std::collections::HashMap;

use serde_json::Value;

use crate::cache::{CacheEntry, CachePolicy, CacheStats, LruTracker};

// == Cache Store ==
/// Bounded LRU/TTL storage sized by a [`CachePolicy`].
#[derive(Debug)]
pub struct CacheStore {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// LRU access tracker
    lru: LruTracker,
    /// Performance statistics
    stats: CacheStats,
    /// Capacity and TTL applied to every entry
    policy: CachePolicy,
}

impl CacheStore {
    // == Constructor ==
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            stats: CacheStats::new(),
            policy,
        }
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    // == Set ==
    /// Stores a value under `key` with the partition TTL.
    ///
    /// Overwriting resets the TTL. Inserting a new key into a full partition
    /// first evicts the least recently used entry, whose key is returned.
    pub fn set(&mut self, key: String, value: Value) -> Option<String> {
        if self.policy.capacity == 0 {
            return None;
        }

        let mut evicted = None;
        if !self.entries.contains_key(&key) && self.entries.len() >= self.policy.capacity {
            // Expired entries go first so a live one is not sacrificed for them
            if self.cleanup_expired() == 0 {
                if let Some(oldest) = self.lru.evict_oldest() {
                    self.entries.remove(&oldest);
                    self.stats.record_eviction();
                    evicted = Some(oldest);
                }
            }
        }

        self.entries
            .insert(key.clone(), CacheEntry::new(value, self.policy.ttl()));
        self.lru.touch(&key);
        self.stats.set_entries(self.entries.len());

        evicted
    }

    // == Get ==
    /// Returns a clone of the stored value if present and not expired.
    ///
    /// Expired entries are removed and counted as misses.
    pub fn get(&mut self, key: &str) -> Option<Value> {
        let expired = match self.entries.get(key) {
            Some(entry) if !entry.is_expired() => {
                let value = entry.value.clone();
                self.stats.record_hit();
                self.lru.touch(key);
                return Some(value);
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            self.entries.remove(key);
            self.lru.remove(key);
            self.stats.record_expirations(1);
            self.stats.set_entries(self.entries.len());
        }
        self.stats.record_miss();
        None
    }

    // == Delete ==
    pub fn delete(&mut self, key: &str) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            self.lru.remove(key);
            self.stats.set_entries(self.entries.len());
        }
        removed
    }

    // == Remove Where ==
    /// Removes every entry whose key satisfies `predicate`.
    pub fn remove_where<F>(&mut self, predicate: F) -> usize
    where
        F: Fn(&str) -> bool,
    {
        let doomed: Vec<String> = self
            .entries
            .keys()
            .filter(|key| predicate(key))
            .cloned()
            .collect();

        for key in &doomed {
            self.entries.remove(key);
            self.lru.remove(key);
        }
        self.stats.set_entries(self.entries.len());
        doomed.len()
    }

    // == Clear ==
    /// Drops every entry; counters other than the entry count are kept.
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        self.lru.clear();
        self.stats.set_entries(0);
        count
    }

    // == Cleanup Expired ==
    /// Removes all expired entries, returning how many were dropped.
    pub fn cleanup_expired(&mut self) -> usize {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.entries.remove(key);
            self.lru.remove(key);
        }

        self.stats.record_expirations(expired.len());
        self.stats.set_entries(self.entries.len());
        expired.len()
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats;
        stats.set_entries(self.entries.len());
        stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    fn store(capacity: usize, ttl_seconds: u64) -> CacheStore {
        CacheStore::new(CachePolicy::new(capacity, ttl_seconds))
    }

    #[tokio::test]
    async fn test_store_set_and_get() {
        let mut store = store(100, 300);

        store.set("key1".to_string(), json!({"lap_number": 1}));
        assert_eq!(store.get("key1"), Some(json!({"lap_number": 1})));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_store_get_nonexistent() {
        let mut store = store(100, 300);
        assert_eq!(store.get("nonexistent"), None);
        assert_eq!(store.stats().misses, 1);
    }

    #[tokio::test]
    async fn test_store_overwrite() {
        let mut store = store(100, 300);

        store.set("key1".to_string(), json!(1));
        store.set("key1".to_string(), json!(2));

        assert_eq!(store.get("key1"), Some(json!(2)));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_store_delete() {
        let mut store = store(100, 300);

        store.set("key1".to_string(), json!("v"));
        assert!(store.delete("key1"));
        assert!(!store.delete("key1"));
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_ttl_expiration() {
        let mut store = store(100, 1);

        store.set("key1".to_string(), json!("v"));
        assert!(store.get("key1").is_some());

        tokio::time::advance(Duration::from_millis(1100)).await;

        assert_eq!(store.get("key1"), None);
        assert!(store.is_empty());
        let stats = store.stats();
        assert_eq!(stats.expirations, 1);
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_overwrite_resets_ttl() {
        let mut store = store(100, 10);

        store.set("key1".to_string(), json!(1));
        tokio::time::advance(Duration::from_secs(8)).await;
        store.set("key1".to_string(), json!(2));
        tokio::time::advance(Duration::from_secs(8)).await;

        assert_eq!(store.get("key1"), Some(json!(2)));
    }

    #[tokio::test]
    async fn test_store_lru_eviction() {
        let mut store = store(3, 300);

        store.set("key1".to_string(), json!(1));
        store.set("key2".to_string(), json!(2));
        store.set("key3".to_string(), json!(3));

        let evicted = store.set("key4".to_string(), json!(4));

        assert_eq!(evicted.as_deref(), Some("key1"));
        assert_eq!(store.len(), 3);
        assert_eq!(store.get("key1"), None);
        assert!(store.get("key2").is_some());
        assert!(store.get("key4").is_some());
        assert_eq!(store.stats().evictions, 1);
    }

    #[tokio::test]
    async fn test_store_lru_touch_on_get() {
        let mut store = store(3, 300);

        store.set("key1".to_string(), json!(1));
        store.set("key2".to_string(), json!(2));
        store.set("key3".to_string(), json!(3));

        store.get("key1");
        store.set("key4".to_string(), json!(4));

        assert!(store.get("key1").is_some());
        assert_eq!(store.get("key2"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_full_prefers_dropping_expired() {
        let mut store = store(2, 5);

        store.set("old".to_string(), json!(1));
        tokio::time::advance(Duration::from_secs(3)).await;
        store.set("young".to_string(), json!(2));
        tokio::time::advance(Duration::from_secs(3)).await;

        let evicted = store.set("new".to_string(), json!(3));

        assert_eq!(evicted, None);
        assert_eq!(store.stats().evictions, 0);
        assert!(store.get("young").is_some());
        assert!(store.get("new").is_some());
    }

    #[tokio::test]
    async fn test_store_remove_where_and_clear() {
        let mut store = store(10, 300);
        store.set("f1:/laps?a=1".to_string(), json!(1));
        store.set("f1:/laps?a=2".to_string(), json!(2));
        store.set("f1:/pit?a=1".to_string(), json!(3));

        assert_eq!(store.remove_where(|k| k.starts_with("f1:/laps")), 2);
        assert_eq!(store.len(), 1);
        assert_eq!(store.clear(), 1);
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_cleanup_expired() {
        let mut store = store(100, 1);
        store.set("key1".to_string(), json!(1));
        tokio::time::advance(Duration::from_secs(2)).await;
        store.set("key2".to_string(), json!(2));

        assert_eq!(store.cleanup_expired(), 1);
        assert_eq!(store.len(), 1);
        assert!(store.get("key2").is_some());
    }

    #[tokio::test]
    async fn test_store_stats() {
        let mut store = store(100, 300);

        store.set("key1".to_string(), json!(1));
        store.get("key1");
        store.get("nonexistent");

        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
    }
}
