//! Background Tasks Module
//!
//! Periodic work run alongside the admin server.
//!
//! # Tasks
//! - TTL Cleanup: purges expired local-tier entries at a fixed interval

mod cleanup;

pub use cleanup::spawn_cleanup_task;
