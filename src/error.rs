//! Centralized error types for ee2ce
//!
//! Uses thiserror for typed errors that can be matched on,
//! while still being compatible with anyhow for propagation.

use std::path::PathBuf;
use thiserror::Error;

/// SQL file discovery and runner errors.
///
/// Per-statement failures are not errors at this level; they are recorded
/// in the file's `MigrationResult`.
#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("No SQL files found in [{}]", .dir.display())]
    NoSqlFiles { dir: PathBuf },

    #[error("SQL file name must start with a sequence number and '_': {filename}")]
    InvalidFileName { filename: String },

    #[error("Duplicate SQL sequence number {number}: {first} and {second}")]
    DuplicateSequence {
        number: u32,
        first: String,
        second: String,
    },

    #[error("Cannot read SQL file {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot write execution log {}: {source}", .path.display())]
    LogWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Database gateway errors
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database connection failed: {message}")]
    ConnectionFailed { message: String },

    #[error("Database connection not established. Call connect() first.")]
    NotConnected,

    #[error("{message}")]
    Statement { message: String },
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        DatabaseError::Statement {
            message: err.to_string(),
        }
    }
}

/// Snapshot persistence errors
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Snapshot file not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("Invalid JSON in snapshot file {}: {message}", .path.display())]
    InvalidJson { path: PathBuf, message: String },

    #[error("Malformed snapshot {}: {message}", .path.display())]
    Malformed { path: PathBuf, message: String },

    #[error("Failed to write snapshot {}: {source}", .path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Not a valid Magento root: app/etc/env.php not found at [{}]", .path.display())]
    NotMagentoRoot { path: PathBuf },

    #[error("Cannot read {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot parse app/etc/env.php at byte {offset}: {message}")]
    EnvPhpSyntax { offset: usize, message: String },

    #[error("Required configuration missing: {field}")]
    MissingField { field: String },

    #[error("Invalid configuration value for {field}: {value}")]
    InvalidValue { field: String, value: String },
}

/// composer.json errors
#[derive(Error, Debug)]
pub enum ComposerError {
    #[error("composer.json not found at: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("Invalid JSON in composer.json {}: {message}", .path.display())]
    InvalidJson { path: PathBuf, message: String },

    #[error("Failed to write {}: {source}", .path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
