//! Shared Cache Module
//!
//! Optional cross-process tier backed by a network key-value store. When the
//! store is missing or unreachable the client disables itself and every
//! operation becomes a no-op; store faults are logged, never returned.

mod memory_store;
mod redis_store;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::cache::{build_key, policy, resource_type, QueryParams};
use crate::error::{StoreError, StoreResult};

pub use memory_store::MemoryStore;
pub use redis_store::RedisStore;

// == Key Value Store ==
/// Minimal surface the shared tier needs from a key-value store.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns the raw text stored under `key`.
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Stores `value` under `key`, expiring after `ttl` on the store side.
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<()>;

    /// Deletes every key matching a glob pattern, returning how many went.
    async fn delete_matching(&self, pattern: &str) -> StoreResult<usize>;

    /// Reports server-side counters.
    async fn server_info(&self) -> StoreResult<ServerInfo>;
}

// == Server Info ==
/// Subset of the store's `INFO` report.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ServerInfo {
    pub connected_clients: u64,
    pub used_memory: u64,
    pub used_memory_human: String,
    pub keyspace_hits: u64,
    pub keyspace_misses: u64,
}

impl ServerInfo {
    /// Parses the `field:value` lines of an `INFO` reply.
    pub fn parse(report: &str) -> StoreResult<Self> {
        let mut info = ServerInfo::default();
        let mut seen = false;

        for line in report.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((field, value)) = line.split_once(':') else {
                continue;
            };
            seen = true;
            match field {
                "connected_clients" => info.connected_clients = value.parse().unwrap_or(0),
                "used_memory" => info.used_memory = value.parse().unwrap_or(0),
                "used_memory_human" => info.used_memory_human = value.to_string(),
                "keyspace_hits" => info.keyspace_hits = value.parse().unwrap_or(0),
                "keyspace_misses" => info.keyspace_misses = value.parse().unwrap_or(0),
                _ => {}
            }
        }

        if seen {
            Ok(info)
        } else {
            Err(StoreError::Protocol("empty INFO reply".to_string()))
        }
    }
}

// == Shared Tier Stats ==
/// Shared tier section of the stats report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SharedTierStats {
    /// Store reachable; counters as reported by the server
    Connected(ServerInfo),
    /// No store configured or the initial connection failed
    Disabled,
    /// Store configured but the stats query failed
    Error { message: String },
}

impl SharedTierStats {
    pub fn is_connected(&self) -> bool {
        matches!(self, SharedTierStats::Connected(_))
    }
}

// == Shared Cache ==
/// Capability-checked client for the shared tier.
#[derive(Clone)]
pub struct SharedCache {
    /// `None` when the tier is disabled
    store: Option<Arc<dyn KeyValueStore>>,
    /// Prefix isolating this application's keys
    namespace: String,
}

impl fmt::Debug for SharedCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedCache")
            .field("namespace", &self.namespace)
            .field("available", &self.is_available())
            .finish()
    }
}

impl SharedCache {
    // == Constructors ==
    /// A permanently disabled client.
    pub fn disabled(namespace: impl Into<String>) -> Self {
        Self {
            store: None,
            namespace: namespace.into(),
        }
    }

    /// A client over an already connected store.
    pub fn with_store(namespace: impl Into<String>, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store: Some(store),
            namespace: namespace.into(),
        }
    }

    /// Connects to Redis at `redis_url`, or returns a disabled client when
    /// the URL is absent/blank or the connection check fails.
    pub async fn connect(
        namespace: impl Into<String>,
        redis_url: Option<&str>,
        timeout: Duration,
    ) -> Self {
        let namespace = namespace.into();

        let Some(url) = redis_url.map(str::trim).filter(|url| !url.is_empty()) else {
            info!(namespace = %namespace, "REDIS_URL not set, shared cache disabled");
            return Self::disabled(namespace);
        };

        match RedisStore::connect(url, timeout).await {
            Ok(store) => {
                info!(namespace = %namespace, "Shared cache connected");
                Self::with_store(namespace, Arc::new(store))
            }
            Err(err) => {
                warn!(namespace = %namespace, error = %err, "Shared cache unavailable, continuing without it");
                Self::disabled(namespace)
            }
        }
    }

    /// [`SharedCache::connect`] with the URL taken from `REDIS_URL`.
    pub async fn from_env(namespace: impl Into<String>, timeout: Duration) -> Self {
        let url = std::env::var("REDIS_URL").ok();
        Self::connect(namespace, url.as_deref(), timeout).await
    }

    pub fn is_available(&self) -> bool {
        self.store.is_some()
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Key used on the wire for a request.
    pub fn key(&self, path: &str, params: &QueryParams) -> String {
        build_key(&self.namespace, path, params)
    }

    // == Get ==
    /// Returns the decoded value stored for the request, if any.
    pub async fn get<T: DeserializeOwned>(&self, path: &str, params: &QueryParams) -> Option<T> {
        let store = self.store.as_ref()?;
        let key = self.key(path, params);

        match Self::read(store.as_ref(), &key).await {
            Ok(Some(value)) => {
                debug!(key = %key, "shared cache hit");
                Some(value)
            }
            Ok(None) => {
                debug!(key = %key, "shared cache miss");
                None
            }
            Err(err) => {
                warn!(key = %key, error = %err, "shared cache read failed");
                None
            }
        }
    }

    async fn read<T: DeserializeOwned>(
        store: &dyn KeyValueStore,
        key: &str,
    ) -> StoreResult<Option<T>> {
        match store.get(key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    // == Set ==
    /// Stores `value` with the TTL of the resource type named by `path`.
    ///
    /// Callers convert their payloads to [`Value`] first; anything a `Value`
    /// holds encodes as JSON text.
    pub async fn set(&self, path: &str, params: &QueryParams, value: &Value) {
        let Some(store) = self.store.as_ref() else {
            return;
        };
        let key = self.key(path, params);
        let ttl = policy(resource_type(path)).ttl();

        match Self::write(store.as_ref(), &key, value, ttl).await {
            Ok(()) => debug!(key = %key, ttl_seconds = ttl.as_secs(), "shared cache write"),
            Err(err) => warn!(key = %key, error = %err, "shared cache write skipped"),
        }
    }

    async fn write(
        store: &dyn KeyValueStore,
        key: &str,
        value: &Value,
        ttl: Duration,
    ) -> StoreResult<()> {
        let payload = serde_json::to_string(value)?;
        store.set_ex(key, &payload, ttl).await
    }

    // == Clear Pattern ==
    /// Deletes keys under this namespace matching `pattern`.
    pub async fn clear_pattern(&self, pattern: &str) -> usize {
        let Some(store) = self.store.as_ref() else {
            return 0;
        };
        let full_pattern = format!("{}:{}", self.namespace, pattern);

        match store.delete_matching(&full_pattern).await {
            Ok(count) => count,
            Err(err) => {
                warn!(pattern = %full_pattern, error = %err, "shared cache clear failed");
                0
            }
        }
    }

    // == Stats ==
    pub async fn stats(&self) -> SharedTierStats {
        let Some(store) = self.store.as_ref() else {
            return SharedTierStats::Disabled;
        };

        match store.server_info().await {
            Ok(info) => SharedTierStats::Connected(info),
            Err(err) => {
                warn!(error = %err, "shared cache stats unavailable");
                SharedTierStats::Error {
                    message: err.to_string(),
                }
            }
        }
    }
}
