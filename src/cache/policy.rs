//! Endpoint Policy Module
//!
//! Static capacity/TTL table for every upstream resource type.

use std::time::Duration;

use serde::Serialize;

// == Cache Policy ==
/// Capacity and time-to-live applied to one resource type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CachePolicy {
    /// Maximum number of local entries for the resource type
    pub capacity: usize,
    /// Time-to-live in seconds, shared by both tiers
    pub ttl_seconds: u64,
}

impl CachePolicy {
    /// Creates a policy from a capacity and a TTL in seconds.
    pub const fn new(capacity: usize, ttl_seconds: u64) -> Self {
        Self {
            capacity,
            ttl_seconds,
        }
    }

    /// Returns the TTL as a `Duration`.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

/// Name of the partition used for resource types missing from the table.
pub const DEFAULT_RESOURCE_TYPE: &str = "default";

/// Policy applied to unknown resource types.
pub const DEFAULT_POLICY: CachePolicy = CachePolicy::new(100, 300);

// Session metadata barely changes once published; telemetry streams churn.
const POLICIES: [(&str, CachePolicy); 10] = [
    ("meetings", CachePolicy::new(50, 3600)),
    ("sessions", CachePolicy::new(100, 3600)),
    ("drivers", CachePolicy::new(200, 1800)),
    ("laps", CachePolicy::new(1000, 600)),
    ("stints", CachePolicy::new(500, 600)),
    ("pit", CachePolicy::new(500, 600)),
    ("weather", CachePolicy::new(200, 1800)),
    ("race_control", CachePolicy::new(200, 300)),
    ("position", CachePolicy::new(500, 300)),
    ("car_data", CachePolicy::new(200, 300)),
];

// == Lookup ==
/// Returns the policy for a resource type, falling back to [`DEFAULT_POLICY`].
pub fn policy(resource_type: &str) -> CachePolicy {
    POLICIES
        .iter()
        .find(|(name, _)| *name == resource_type)
        .map(|(_, policy)| *policy)
        .unwrap_or(DEFAULT_POLICY)
}

/// Returns true if the resource type has its own entry in the table.
pub fn is_known(resource_type: &str) -> bool {
    canonical_name(resource_type).is_some()
}

/// Returns the table's own `'static` name for a known resource type.
pub fn canonical_name(resource_type: &str) -> Option<&'static str> {
    POLICIES
        .iter()
        .find(|(name, _)| *name == resource_type)
        .map(|(name, _)| *name)
}

/// Iterates over every known resource type and its policy.
pub fn known_policies() -> impl Iterator<Item = (&'static str, CachePolicy)> {
    POLICIES.iter().copied()
}
