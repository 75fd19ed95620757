//! Infrastructure layer - external I/O adapters
//!
//! This module contains all code that interacts with external systems:
//! - MySQL (the Magento database)
//! - The append-only SQL execution log
//! - Snapshot JSON files

pub mod database;
pub mod snapshot_store;
pub mod sql_logger;

// Re-export commonly used types
pub use database::{DatabaseGateway, MySqlGateway, Row, SqlValue};
pub use snapshot_store::SnapshotStore;
pub use sql_logger::ExecutionLogger;
