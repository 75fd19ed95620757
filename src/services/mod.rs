//! Services layer - orchestration logic
//!
//! This module coordinates between domain logic and infrastructure.
//! Services use infrastructure adapters to perform I/O operations.

pub mod composer;
pub mod row_id_scanner;
pub mod snapshot_capturer;
pub mod sql_runner;

// Re-export commonly used types
pub use snapshot_capturer::SnapshotCapturer;
pub use sql_runner::SqlFileRunner;
