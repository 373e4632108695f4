//! API Module
//!
//! Debug/operations HTTP surface over the read-through cache.
//!
//! # Endpoints
//! - `GET /health` - Liveness plus shared tier availability
//! - `GET /stats` - Local and shared tier statistics
//! - `DELETE /cache?pattern=<glob>` - Invalidate matching entries (default `*`)

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
