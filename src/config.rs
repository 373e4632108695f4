//! Configuration Module
//!
//! Loads cache and server settings from environment variables.

use std::env;
use std::time::Duration;

/// Runtime configuration.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Shared store connection string; `None` disables the shared tier
    pub redis_url: Option<String>,
    /// Prefix applied to every shared-store key
    pub namespace: String,
    /// Upper bound for connecting to (and each command on) the shared store
    pub redis_connect_timeout_ms: u64,
    /// HTTP port of the admin/debug surface
    pub server_port: u16,
    /// Seconds between purges of expired local entries
    pub cleanup_interval: u64,
}

fn parsed_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `REDIS_URL` - Shared store URL (default: unset, shared tier disabled)
    /// - `CACHE_NAMESPACE` - Key prefix (default: f1)
    /// - `REDIS_CONNECT_TIMEOUT_MS` - Store timeout in milliseconds (default: 2000)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Expired-entry purge frequency in seconds (default: 30)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            redis_url: env::var("REDIS_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            namespace: env::var("CACHE_NAMESPACE")
                .ok()
                .filter(|ns| !ns.trim().is_empty())
                .unwrap_or(defaults.namespace),
            redis_connect_timeout_ms: parsed_or(
                "REDIS_CONNECT_TIMEOUT_MS",
                defaults.redis_connect_timeout_ms,
            ),
            server_port: parsed_or("SERVER_PORT", defaults.server_port),
            cleanup_interval: parsed_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
        }
    }

    pub fn redis_connect_timeout(&self) -> Duration {
        Duration::from_millis(self.redis_connect_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            redis_url: None,
            namespace: "f1".to_string(),
            redis_connect_timeout_ms: 2000,
            server_port: 3000,
            cleanup_interval: 30,
        }
    }
}
