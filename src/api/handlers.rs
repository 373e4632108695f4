//! API Handlers
//!
//! HTTP request handlers for the administrative operations.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};

use crate::cache::{CacheStatsReport, ClearOutcome, ReadThroughCache};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{ClearQuery, HealthResponse};

/// Application state shared across all handlers.
///
/// Holds the process-wide read-through cache; it is built once at startup
/// and every handler works through the same handle.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<ReadThroughCache>,
}

impl AppState {
    pub fn new(cache: ReadThroughCache) -> Self {
        Self {
            cache: Arc::new(cache),
        }
    }

    /// Creates a new AppState from configuration, connecting the shared
    /// tier when one is configured.
    pub async fn from_config(config: &Config) -> Self {
        Self::new(ReadThroughCache::from_config(config).await)
    }
}

/// Handler for DELETE /cache
///
/// Clears entries matching `pattern` from both tiers.
pub async fn clear_handler(
    State(state): State<AppState>,
    Query(query): Query<ClearQuery>,
) -> Result<Json<ClearOutcome>> {
    if let Some(error_msg) = query.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let outcome = state.cache.clear_cache(query.pattern()).await;
    Ok(Json(outcome))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<CacheStatsReport> {
    Json(state.cache.get_cache_stats().await)
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.cache.shared().is_available()))
}
