//! Cache Module
//!
//! Two-tier read-through caching: a bounded in-process tier with TTL and
//! LRU eviction, and an optional shared tier in an external key-value store.

mod entry;
mod keys;
mod local;
mod lru;
pub mod policy;
mod read_through;
mod shared;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use keys::{
    build_key, glob_match, resource_type, QueryParams, HASH_SEGMENT, MAX_READABLE_KEY_LENGTH,
};
pub use local::{LocalCache, LocalTierStats, PartitionStats};
pub use lru::LruTracker;
pub use policy::{
    canonical_name, is_known, known_policies, policy, CachePolicy, DEFAULT_POLICY,
    DEFAULT_RESOURCE_TYPE,
};
pub use read_through::{CacheStatsReport, ClearOutcome, ReadThroughCache, WILDCARD};
pub use shared::{
    KeyValueStore, MemoryStore, RedisStore, ServerInfo, SharedCache, SharedTierStats,
};
pub use stats::CacheStats;
pub use store::CacheStore;
