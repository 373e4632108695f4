//! Read-Through Module
//!
//! Public entry point composing the shared tier, the local tier and the
//! upstream fetch, plus the administrative clear/stats operations.

use std::fmt::Display;
use std::future::Future;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info};

use crate::cache::{
    build_key, glob_match, LocalCache, LocalTierStats, QueryParams, SharedCache, SharedTierStats,
};
use crate::config::Config;

/// Pattern that clears everything.
pub const WILDCARD: &str = "*";

// == Admin Reports ==
/// Result of [`ReadThroughCache::clear_cache`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClearOutcome {
    pub pattern: String,
    pub local_removed: usize,
    pub shared_removed: usize,
}

/// Result of [`ReadThroughCache::get_cache_stats`].
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatsReport {
    pub generated_at: DateTime<Utc>,
    pub namespace: String,
    pub local: LocalTierStats,
    pub shared: SharedTierStats,
}

// == Read-Through Cache ==
/// Two-tier read-through cache, built once per process and shared by handle.
#[derive(Debug)]
pub struct ReadThroughCache {
    local: LocalCache,
    shared: SharedCache,
}

impl ReadThroughCache {
    // == Constructors ==
    pub fn new(local: LocalCache, shared: SharedCache) -> Self {
        Self { local, shared }
    }

    /// A cache whose shared tier is disabled.
    pub fn local_only(namespace: impl Into<String>) -> Self {
        Self::new(LocalCache::new(), SharedCache::disabled(namespace))
    }

    /// Builds the cache from configuration, connecting the shared tier if a
    /// store URL is configured and reachable.
    pub async fn from_config(config: &Config) -> Self {
        let shared = SharedCache::connect(
            config.namespace.clone(),
            config.redis_url.as_deref(),
            config.redis_connect_timeout(),
        )
        .await;
        Self::new(LocalCache::new(), shared)
    }

    pub fn namespace(&self) -> &str {
        self.shared.namespace()
    }

    pub fn local(&self) -> &LocalCache {
        &self.local
    }

    pub fn shared(&self) -> &SharedCache {
        &self.shared
    }

    // == Fetch With Cache ==
    /// Returns the response for `path` + `params`, consulting the shared
    /// tier, then the local tier, then `fetch`.
    ///
    /// A fresh fetch populates both tiers. Fetch errors are logged and
    /// returned unchanged; nothing is cached for them. Concurrent misses on
    /// the same request may each call `fetch`.
    pub async fn fetch_with_cache<F, Fut, E>(
        &self,
        fetch: F,
        path: &str,
        params: &QueryParams,
    ) -> Result<Value, E>
    where
        F: FnOnce(String, QueryParams) -> Fut,
        Fut: Future<Output = Result<Value, E>>,
        E: Display,
    {
        if let Some(value) = self.shared.get::<Value>(path, params).await {
            return Ok(value);
        }

        let key = build_key(self.namespace(), path, params);
        if let Some(value) = self.local.get(path, &key).await {
            return Ok(value);
        }

        debug!(path, key = %key, "cache miss, fetching upstream");
        let value = match fetch(path.to_string(), params.clone()).await {
            Ok(value) => value,
            Err(err) => {
                error!(path, error = %err, "upstream fetch failed");
                return Err(err);
            }
        };

        self.local.insert(path, &key, value.clone()).await;
        self.shared.set(path, params, &value).await;

        Ok(value)
    }

    // == Clear Cache ==
    /// Invalidates entries whose key (without the namespace prefix) matches
    /// `pattern` in both tiers. `*` empties the local tier outright.
    pub async fn clear_cache(&self, pattern: &str) -> ClearOutcome {
        let local_removed = if pattern == WILDCARD {
            self.local.clear().await
        } else {
            let prefix = format!("{}:", self.namespace());
            self.local
                .remove_where(|key| {
                    key.strip_prefix(prefix.as_str())
                        .is_some_and(|rest| glob_match(pattern, rest))
                })
                .await
        };
        let shared_removed = self.shared.clear_pattern(pattern).await;

        info!(pattern, local_removed, shared_removed, "Cache cleared");

        ClearOutcome {
            pattern: pattern.to_string(),
            local_removed,
            shared_removed,
        }
    }

    // == Stats ==
    /// Reports both tiers; a failing shared tier shows up as an error entry.
    pub async fn get_cache_stats(&self) -> CacheStatsReport {
        CacheStatsReport {
            generated_at: Utc::now(),
            namespace: self.namespace().to_string(),
            local: self.local.stats().await,
            shared: self.shared.stats().await,
        }
    }
}
