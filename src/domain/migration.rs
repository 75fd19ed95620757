//! Migration domain types
//!
//! Numbered SQL files and the per-file outcome of running them.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::error::MigrationError;

/// A SQL file whose name carries a sequence number, e.g. `07_drop_staging.sql`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlFile {
    /// Sequence number parsed from the filename prefix
    pub number: u32,
    /// Bare filename (no directory)
    pub filename: String,
    /// Full path on disk
    pub path: PathBuf,
}

fn sequence_prefix() -> &'static Regex {
    static PREFIX: OnceLock<Regex> = OnceLock::new();
    PREFIX.get_or_init(|| Regex::new(r"^(\d+)_").expect("valid sequence prefix regex"))
}

/// Parse the sequence number out of a filename like `07_something.sql`.
///
/// Returns `None` when there is no numeric prefix followed by `_`, or when
/// the number is zero or does not fit in a `u32`.
pub fn parse_sequence_number(filename: &str) -> Option<u32> {
    let caps = sequence_prefix().captures(filename)?;
    let number: u32 = caps[1].parse().ok()?;
    (number > 0).then_some(number)
}

impl SqlFile {
    /// Build from a path, validating the filename prefix
    pub fn from_path(path: &Path) -> Result<Self, MigrationError> {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let number = parse_sequence_number(&filename).ok_or_else(|| {
            MigrationError::InvalidFileName {
                filename: filename.clone(),
            }
        })?;

        Ok(Self {
            number,
            filename,
            path: path.to_path_buf(),
        })
    }
}

/// Outcome of executing one SQL file
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationResult {
    pub file_number: u32,
    pub filename: String,
    pub success: bool,
    /// Statements that completed before the file finished or failed
    pub statements_executed: usize,
    pub duration_ms: f64,
    /// Set iff `success` is false
    pub error: Option<String>,
}

impl MigrationResult {
    pub fn succeeded(file: &SqlFile, statements_executed: usize, duration_ms: f64) -> Self {
        Self {
            file_number: file.number,
            filename: file.filename.clone(),
            success: true,
            statements_executed,
            duration_ms,
            error: None,
        }
    }

    pub fn failed(
        file: &SqlFile,
        statements_executed: usize,
        duration_ms: f64,
        error: impl Into<String>,
    ) -> Self {
        Self {
            file_number: file.number,
            filename: file.filename.clone(),
            success: false,
            statements_executed,
            duration_ms,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sequence_number() {
        assert_eq!(parse_sequence_number("07_something.sql"), Some(7));
        assert_eq!(parse_sequence_number("12_drop_staging.sql"), Some(12));
        assert_eq!(parse_sequence_number("001_a.sql"), Some(1));
        assert_eq!(parse_sequence_number("readme.sql"), None);
        assert_eq!(parse_sequence_number("07-something.sql"), None);
        assert_eq!(parse_sequence_number("0_zero.sql"), None);
    }

    #[test]
    fn test_sql_file_from_path() {
        let file = SqlFile::from_path(Path::new("/opt/sql/03_third.sql")).unwrap();
        assert_eq!(file.number, 3);
        assert_eq!(file.filename, "03_third.sql");

        let err = SqlFile::from_path(Path::new("/opt/sql/notes.sql")).unwrap_err();
        assert!(matches!(err, MigrationError::InvalidFileName { .. }));
    }

    #[test]
    fn test_failed_result_carries_error() {
        let file = SqlFile::from_path(Path::new("02_second.sql")).unwrap();
        let result = MigrationResult::failed(&file, 4, 12.5, "Table does not exist");
        assert!(!result.success);
        assert_eq!(result.file_number, 2);
        assert_eq!(result.statements_executed, 4);
        assert_eq!(result.error.as_deref(), Some("Table does not exist"));

        let ok = MigrationResult::succeeded(&file, 9, 1.0);
        assert!(ok.success);
        assert!(ok.error.is_none());
    }
}
