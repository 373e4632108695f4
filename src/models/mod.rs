//! Request and Response models for the admin API
//!
//! DTOs used for serializing/deserializing HTTP request and response bodies.
//! Stats and clear results are served straight from the cache's own report
//! types.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::ClearQuery;
pub use responses::{ErrorResponse, HealthResponse};
