//! Domain layer - pure business logic
//!
//! This module contains business logic with no external I/O.
//! Types and functions here can be unit tested without mocking.

pub mod comparator;
pub mod database;
pub mod migration;
pub mod snapshot;
pub mod splitter;

// Re-export commonly used types
pub use comparator::{compare, SnapshotDiff};
pub use database::DatabaseConfig;
pub use migration::{MigrationResult, SqlFile};
pub use snapshot::SnapshotReport;
pub use splitter::split_statements;
