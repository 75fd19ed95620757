//! Append-only SQL execution log
//!
//! Every statement the runner executes is written to
//! `ee-to-ce-migration-<YYYYMMDD-HHMMSS>.sql.log` together with its affected
//! row count and duration, so a failed run can be audited and resumed.
//! The log path is fixed when the logger is created.

use chrono::Local;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::MigrationError;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Writes the SQL audit trail for one migration run
pub struct ExecutionLogger {
    path: PathBuf,
    file: File,
}

impl ExecutionLogger {
    /// Create a timestamped log file inside `dir`
    pub fn create_in(dir: &Path) -> Result<Self, MigrationError> {
        let stamp = Local::now().format("%Y%m%d-%H%M%S");
        Self::create(dir.join(format!("ee-to-ce-migration-{}.sql.log", stamp)))
    }

    /// Create (or truncate) the log at `path` and write the header
    pub fn create(path: PathBuf) -> Result<Self, MigrationError> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)
            .map_err(|source| MigrationError::LogWrite {
                path: path.clone(),
                source,
            })?;

        let mut logger = Self { path, file };
        logger.append(&format!(
            "-- EE to CE Migration Log\n-- Started: {}\n\n",
            now()
        ))?;
        Ok(logger)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn log_file_start(&mut self, filename: &str) -> Result<(), MigrationError> {
        debug!("FILE: {}", filename);
        self.append(&format!("\n-- [{}] FILE: {}\n", now(), filename))
    }

    pub fn log_statement(
        &mut self,
        sql: &str,
        affected_rows: u64,
        duration_ms: f64,
    ) -> Result<(), MigrationError> {
        debug!(affected_rows, duration_ms, "statement executed");
        self.append(&format!(
            "-- [{}] Affected: {} rows | Duration: {:.2}ms\n{}\n\n",
            now(),
            affected_rows,
            duration_ms,
            terminated(sql)
        ))
    }

    pub fn log_error(&mut self, sql: &str, message: &str) -> Result<(), MigrationError> {
        warn!("Statement failed: {}", message);
        self.append(&format!(
            "-- [{}] ERROR: {}\n{}\n\n",
            now(),
            message,
            terminated(sql)
        ))
    }

    fn append(&mut self, entry: &str) -> Result<(), MigrationError> {
        self.file
            .write_all(entry.as_bytes())
            .and_then(|_| self.file.flush())
            .map_err(|source| MigrationError::LogWrite {
                path: self.path.clone(),
                source,
            })
    }
}

fn now() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Statement text with exactly one trailing `;`
fn terminated(sql: &str) -> String {
    format!("{};", sql.trim_end_matches(';'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_written_on_creation() {
        let dir = tempfile::tempdir().unwrap();
        let logger = ExecutionLogger::create_in(dir.path()).unwrap();

        let name = logger.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("ee-to-ce-migration-"));
        assert!(name.ends_with(".sql.log"));

        let content = std::fs::read_to_string(logger.path()).unwrap();
        assert!(content.starts_with("-- EE to CE Migration Log\n-- Started: "));
    }

    #[test]
    fn test_entries_are_appended_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.sql.log");
        let mut logger = ExecutionLogger::create(path.clone()).unwrap();

        logger.log_file_start("01_drop_staging.sql").unwrap();
        logger
            .log_statement("DROP TABLE IF EXISTS `magento_banner`", 0, 1.234)
            .unwrap();
        logger
            .log_error("DROP TABLE `missing`;", "Unknown table 'missing'")
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let file_pos = content.find("FILE: 01_drop_staging.sql").unwrap();
        let ok_pos = content
            .find("Affected: 0 rows | Duration: 1.23ms\nDROP TABLE IF EXISTS `magento_banner`;")
            .unwrap();
        let err_pos = content
            .find("ERROR: Unknown table 'missing'\nDROP TABLE `missing`;\n")
            .unwrap();
        assert!(file_pos < ok_pos && ok_pos < err_pos);
    }

    #[test]
    fn test_terminated_keeps_single_semicolon() {
        assert_eq!(terminated("SELECT 1"), "SELECT 1;");
        assert_eq!(terminated("SELECT 1;;"), "SELECT 1;");
    }
}
