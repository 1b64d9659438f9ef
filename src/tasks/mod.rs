//! Background Tasks Module
//!
//! Contains background tasks that run periodically during sidecar operation.
//!
//! # Tasks
//! - Expiry Cleanup: Removes expired cache entries at configured intervals

mod cleanup;

pub use cleanup::spawn_cleanup_task;
