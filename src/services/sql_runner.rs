//! SQL file runner - executes the numbered migration scripts
//!
//! Files run in ascending sequence order, statements in the order the
//! splitter returns them. The first failing statement stops its file and
//! the whole invocation; the caller resumes with `run_from(failed_number)`.

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::fs;
use tracing::{info, warn};

use crate::domain::{split_statements, MigrationResult, SqlFile};
use crate::error::MigrationError;
use crate::infrastructure::{DatabaseGateway, ExecutionLogger};

/// Find every `.sql` file directly inside `dir`, keyed by sequence number.
///
/// Every `.sql` file must be named `NN_description.sql` with `NN >= 1`. An
/// unnumbered file, a `0_` prefix or two files sharing a number is an error
/// rather than being skipped.
pub async fn discover_sql_files(dir: &Path) -> Result<BTreeMap<u32, SqlFile>, MigrationError> {
    if !dir.is_dir() {
        return Err(MigrationError::NoSqlFiles {
            dir: dir.to_path_buf(),
        });
    }

    let mut entries = fs::read_dir(dir)
        .await
        .map_err(|source| MigrationError::Unreadable {
            path: dir.to_path_buf(),
            source,
        })?;

    let mut paths = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|source| MigrationError::Unreadable {
            path: dir.to_path_buf(),
            source,
        })?
    {
        let path = entry.path();
        if path.is_file() && path.extension() == Some(OsStr::new("sql")) {
            paths.push(path);
        }
    }

    if paths.is_empty() {
        return Err(MigrationError::NoSqlFiles {
            dir: dir.to_path_buf(),
        });
    }

    // Sort by filename for consistent ordering
    paths.sort();

    let mut files: BTreeMap<u32, SqlFile> = BTreeMap::new();
    for path in paths {
        let file = SqlFile::from_path(&path)?;
        if let Some(existing) = files.get(&file.number) {
            return Err(MigrationError::DuplicateSequence {
                number: file.number,
                first: existing.filename.clone(),
                second: file.filename,
            });
        }
        files.insert(file.number, file);
    }

    Ok(files)
}

/// Runs migration SQL files against a database gateway
pub struct SqlFileRunner<'a, G: DatabaseGateway> {
    gateway: &'a mut G,
    logger: &'a mut ExecutionLogger,
    sql_dir: PathBuf,
}

impl<'a, G: DatabaseGateway> SqlFileRunner<'a, G> {
    pub fn new(gateway: &'a mut G, logger: &'a mut ExecutionLogger, sql_dir: impl Into<PathBuf>) -> Self {
        Self {
            gateway,
            logger,
            sql_dir: sql_dir.into(),
        }
    }

    pub async fn run_all(&mut self) -> Result<Vec<MigrationResult>, MigrationError> {
        self.run_from(1).await
    }

    /// Run every file numbered `start` or above.
    ///
    /// Returns one result per attempted file; a failed file is always last.
    /// Only directory and file level problems are returned as errors.
    pub async fn run_from(&mut self, start: u32) -> Result<Vec<MigrationResult>, MigrationError> {
        let files = discover_sql_files(&self.sql_dir).await?;
        info!(
            "Found {} SQL files in {}",
            files.len(),
            self.sql_dir.display()
        );

        let mut results = Vec::new();
        for file in files.range(start..).map(|(_, f)| f) {
            let result = self.run_file(file).await?;
            let failed = !result.success;
            results.push(result);

            if failed {
                warn!(
                    "Stopping at {}; resume with --from={}",
                    file.filename, file.number
                );
                break;
            }
        }

        Ok(results)
    }

    async fn run_file(&mut self, file: &SqlFile) -> Result<MigrationResult, MigrationError> {
        self.logger.log_file_start(&file.filename)?;
        info!("Running {}", file.filename);

        let sql = fs::read_to_string(&file.path)
            .await
            .map_err(|source| MigrationError::Unreadable {
                path: file.path.clone(),
                source,
            })?;

        let statements = split_statements(&sql);
        let started = Instant::now();
        let mut executed = 0;

        for statement in &statements {
            let statement_started = Instant::now();
            match self.gateway.execute(statement).await {
                Ok(affected) => {
                    self.logger
                        .log_statement(statement, affected, elapsed_ms(statement_started))?;
                    executed += 1;
                }
                Err(e) => {
                    let message = e.to_string();
                    self.logger.log_error(statement, &message)?;
                    return Ok(MigrationResult::failed(
                        file,
                        executed,
                        elapsed_ms(started),
                        message,
                    ));
                }
            }
        }

        Ok(MigrationResult::succeeded(file, executed, elapsed_ms(started)))
    }
}

fn elapsed_ms(since: Instant) -> f64 {
    since.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database::testing::ScriptedGateway;
    use tempfile::TempDir;

    fn sql_dir(files: &[(&str, &str)]) -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (name, content) in files {
            std::fs::write(dir.path().join(name), content).unwrap();
        }
        dir
    }

    fn logger(dir: &TempDir) -> ExecutionLogger {
        ExecutionLogger::create(dir.path().join("test.sql.log")).unwrap()
    }

    #[tokio::test]
    async fn test_run_from_skips_earlier_files() {
        let dir = sql_dir(&[
            ("01_first.sql", "SELECT 1;"),
            ("02_second.sql", "SELECT 2;"),
            ("03_third.sql", "SELECT 3;"),
        ]);
        let mut gateway = ScriptedGateway::new();
        let mut log = logger(&dir);

        let results = SqlFileRunner::new(&mut gateway, &mut log, dir.path())
            .run_from(3)
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].file_number, 3);
        assert_eq!(results[0].filename, "03_third.sql");
        assert!(results[0].success);
        assert_eq!(gateway.executed, vec!["SELECT 3"]);
    }

    #[tokio::test]
    async fn test_run_all_in_numeric_order() {
        let dir = sql_dir(&[
            ("10_last.sql", "SELECT 10;"),
            ("2_second.sql", "SELECT 2;\nSELECT 22;"),
            ("01_first.sql", "SELECT 1;"),
            ("README.md", "not sql"),
            ("notes.SQL", "SELECT 99;"),
        ]);
        let mut gateway = ScriptedGateway::new();
        let mut log = logger(&dir);

        let results = SqlFileRunner::new(&mut gateway, &mut log, dir.path())
            .run_all()
            .await
            .unwrap();

        let numbers: Vec<u32> = results.iter().map(|r| r.file_number).collect();
        assert_eq!(numbers, vec![1, 2, 10]);
        assert_eq!(results[1].statements_executed, 2);
        assert!(results.iter().all(|r| r.success && r.error.is_none()));
        assert_eq!(gateway.executed, vec!["SELECT 1", "SELECT 2", "SELECT 22", "SELECT 10"]);
    }

    #[tokio::test]
    async fn test_failure_stops_file_and_run() {
        let dir = sql_dir(&[
            ("01_first.sql", "SELECT 1;"),
            (
                "02_second.sql",
                "UPDATE a SET b = 1;\nDROP TABLE `non_existent_table`;\nUPDATE c SET d = 1;",
            ),
            ("03_third.sql", "SELECT 3;"),
        ]);
        let mut gateway =
            ScriptedGateway::new().fail_on("non_existent_table", "Table does not exist");
        let mut log = logger(&dir);
        let log_path = log.path().to_path_buf();

        let results = SqlFileRunner::new(&mut gateway, &mut log, dir.path())
            .run_all()
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert!(results[0].success);

        let failed = &results[1];
        assert_eq!(failed.file_number, 2);
        assert!(!failed.success);
        assert_eq!(failed.statements_executed, 1);
        assert!(failed.error.as_deref().unwrap().contains("Table does not exist"));

        assert_eq!(gateway.executed, vec!["SELECT 1", "UPDATE a SET b = 1"]);

        let content = std::fs::read_to_string(log_path).unwrap();
        assert!(content.contains("FILE: 02_second.sql"));
        assert!(content.contains("ERROR: Table does not exist\nDROP TABLE `non_existent_table`;"));
        assert!(!content.contains("FILE: 03_third.sql"));
    }

    #[tokio::test]
    async fn test_resume_from_failed_file() {
        let dir = sql_dir(&[
            ("01_first.sql", "SELECT 1;"),
            ("02_second.sql", "SELECT 2;"),
            ("03_third.sql", "SELECT 3;"),
        ]);
        let mut gateway = ScriptedGateway::new();
        let mut log = logger(&dir);

        let results = SqlFileRunner::new(&mut gateway, &mut log, dir.path())
            .run_from(2)
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].filename, "02_second.sql");
        assert_eq!(results[1].filename, "03_third.sql");
    }

    #[tokio::test]
    async fn test_delimiter_block_executes_as_one_statement() {
        let dir = sql_dir(&[(
            "05_triggers.sql",
            "DROP TRIGGER IF EXISTS trg;\nDELIMITER $$\nCREATE TRIGGER trg BEFORE INSERT ON t FOR EACH ROW\nBEGIN\n  SET NEW.a = 1;\nEND$$\nDELIMITER ;\n",
        )]);
        let mut gateway = ScriptedGateway::new();
        let mut log = logger(&dir);

        let results = SqlFileRunner::new(&mut gateway, &mut log, dir.path())
            .run_all()
            .await
            .unwrap();

        assert_eq!(results[0].statements_executed, 2);
        assert!(gateway.executed[1].starts_with("CREATE TRIGGER trg"));
        assert!(gateway.executed[1].ends_with("END"));
    }

    #[tokio::test]
    async fn test_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut gateway = ScriptedGateway::new();
        let mut log = logger(&dir);

        let err = SqlFileRunner::new(&mut gateway, &mut log, dir.path().join("sql"))
            .run_all()
            .await
            .unwrap_err();
        assert!(matches!(err, MigrationError::NoSqlFiles { .. }));
    }

    #[tokio::test]
    async fn test_directory_without_sql_files() {
        let dir = sql_dir(&[("README.md", "# notes")]);
        let err = discover_sql_files(dir.path()).await.unwrap_err();
        assert!(matches!(err, MigrationError::NoSqlFiles { .. }));
    }

    #[tokio::test]
    async fn test_duplicate_sequence_number_rejected() {
        let dir = sql_dir(&[("07_a.sql", "SELECT 1;"), ("7_b.sql", "SELECT 2;")]);
        let err = discover_sql_files(dir.path()).await.unwrap_err();
        match err {
            MigrationError::DuplicateSequence {
                number,
                first,
                second,
            } => {
                assert_eq!(number, 7);
                assert_eq!(first, "07_a.sql");
                assert_eq!(second, "7_b.sql");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_unnumbered_sql_file_rejected() {
        let dir = sql_dir(&[("01_a.sql", "SELECT 1;"), ("cleanup.sql", "SELECT 2;")]);
        let err = discover_sql_files(dir.path()).await.unwrap_err();
        assert!(matches!(err, MigrationError::InvalidFileName { .. }));
    }

    #[tokio::test]
    async fn test_zero_prefix_rejected() {
        let dir = sql_dir(&[("0_setup.sql", "SELECT 0;"), ("01_a.sql", "SELECT 1;")]);
        let err = discover_sql_files(dir.path()).await.unwrap_err();
        assert!(matches!(err, MigrationError::InvalidFileName { .. }));
    }
}
