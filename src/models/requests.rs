//! Request DTOs for the admin API
//!
//! Defines the structure of incoming query strings.

use serde::Deserialize;

use crate::cache::WILDCARD;

/// Query string for `DELETE /cache`
///
/// # Fields
/// - `pattern`: glob matched against keys without the namespace prefix;
///   defaults to `*`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClearQuery {
    #[serde(default)]
    pub pattern: Option<String>,
}

impl ClearQuery {
    /// The pattern to clear, `*` when none was given.
    pub fn pattern(&self) -> &str {
        self.pattern.as_deref().unwrap_or(WILDCARD)
    }

    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.pattern().trim().is_empty() {
            return Some("Pattern cannot be empty".to_string());
        }
        None
    }
}
