//! F1 Cache - two-tier read-through cache for the OpenF1 API
//!
//! A bounded in-process tier with TTL and LRU eviction, backed by an
//! optional shared Redis tier, in front of a caller-supplied fetch function.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{QueryParams, ReadThroughCache};
pub use config::Config;
pub use tasks::spawn_cleanup_task;
