//! In-process key-value store with Redis-like expiry and glob deletes.
//!
//! Lets the shared tier run without a server, in tests and single-process
//! deployments.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::{KeyValueStore, ServerInfo};
use crate::cache::glob_match;
use crate::error::StoreResult;

#[derive(Debug, Default)]
struct MemoryState {
    /// key -> (payload, deadline)
    entries: HashMap<String, (String, Instant)>,
    hits: u64,
    misses: u64,
}

impl MemoryState {
    fn live(&mut self, key: &str) -> Option<&(String, Instant)> {
        let expired = self
            .entries
            .get(key)
            .is_some_and(|(_, deadline)| Instant::now() >= *deadline);
        if expired {
            self.entries.remove(key);
        }
        self.entries.get(key)
    }
}

// == Memory Store ==
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw payload under `key`, without touching hit counters.
    pub async fn raw(&self, key: &str) -> Option<String> {
        let mut state = self.state.lock().await;
        state.live(key).map(|(payload, _)| payload.clone())
    }

    /// Remaining lifetime of `key`.
    pub async fn ttl(&self, key: &str) -> Option<Duration> {
        let mut state = self.state.lock().await;
        state
            .live(key)
            .map(|(_, deadline)| deadline.saturating_duration_since(Instant::now()))
    }

    /// Number of live keys.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        let state = self.state.lock().await;
        state
            .entries
            .values()
            .filter(|(_, deadline)| now < *deadline)
            .count()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let mut state = self.state.lock().await;
        let payload = state.live(key).map(|(payload, _)| payload.clone());
        if payload.is_some() {
            state.hits += 1;
        } else {
            state.misses += 1;
        }
        Ok(payload)
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        state
            .entries
            .insert(key.to_string(), (value.to_string(), Instant::now() + ttl));
        Ok(())
    }

    async fn delete_matching(&self, pattern: &str) -> StoreResult<usize> {
        let now = Instant::now();
        let mut state = self.state.lock().await;
        state.entries.retain(|_, (_, deadline)| now < *deadline);

        let before = state.entries.len();
        state.entries.retain(|key, _| !glob_match(pattern, key));
        Ok(before - state.entries.len())
    }

    async fn server_info(&self) -> StoreResult<ServerInfo> {
        let state = self.state.lock().await;
        let used_memory: usize = state
            .entries
            .iter()
            .map(|(key, (payload, _))| key.len() + payload.len())
            .sum();

        Ok(ServerInfo {
            connected_clients: 1,
            used_memory: used_memory as u64,
            used_memory_human: format!("{}B", used_memory),
            keyspace_hits: state.hits,
            keyspace_misses: state.misses,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire() {
        let store = MemoryStore::new();
        store.set_ex("f1:a", "1", Duration::from_secs(10)).await.unwrap();

        assert_eq!(store.get("f1:a").await.unwrap().as_deref(), Some("1"));
        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(store.get("f1:a").await.unwrap(), None);
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_delete_matching_counts_removed() {
        let store = MemoryStore::new();
        for key in ["f1:/laps?a=1", "f1:/laps?a=2", "f1:/pit?a=1", "x:/laps"] {
            store.set_ex(key, "v", Duration::from_secs(60)).await.unwrap();
        }

        assert_eq!(store.delete_matching("f1:/laps*").await.unwrap(), 2);
        assert_eq!(store.delete_matching("f1:*").await.unwrap(), 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_server_info_counts_hits_and_misses() {
        let store = MemoryStore::new();
        store.set_ex("k", "v", Duration::from_secs(60)).await.unwrap();
        store.get("k").await.unwrap();
        store.get("missing").await.unwrap();

        let info = store.server_info().await.unwrap();
        assert_eq!(info.keyspace_hits, 1);
        assert_eq!(info.keyspace_misses, 1);
        assert_eq!(info.used_memory, 2);
    }
}
