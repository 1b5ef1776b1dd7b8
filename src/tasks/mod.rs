//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Expiry sweep: removes expired keys from the in-memory remote tier

mod cleanup;

pub use cleanup::spawn_cleanup_task;
