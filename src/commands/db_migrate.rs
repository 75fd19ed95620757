//! `db-migrate`: snapshot the database, then run the migration SQL files

use anyhow::{bail, Context, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};

use crate::commands::{capture_snapshot, connect, disclaimer};
use crate::config;
use crate::domain::MigrationResult;
use crate::infrastructure::{ExecutionLogger, SnapshotStore};
use crate::services::SqlFileRunner;
use crate::ui;

pub async fn execute(
    path: Option<PathBuf>,
    dry_run: bool,
    from: u32,
    accept_terms: bool,
    sql_dir: PathBuf,
) -> Result<()> {
    disclaimer::require_confirmation(accept_terms)?;

    let magento_root = config::resolve_magento_root(path.as_deref())?;

    if dry_run {
        ui::print_warning("DRY RUN MODE: no changes will be made to the database.");
    }

    let mut gateway = connect(&magento_root).await?;

    ui::print_info("Taking pre-migration snapshot...");
    let before = capture_snapshot(&mut gateway, "Capturing pre-migration snapshot...").await;
    let store = SnapshotStore::in_current_dir()?;
    let snapshot_path = store.save(&before).context("Failed to save pre-migration snapshot")?;

    println!("  Snapshot saved: {}", snapshot_path.display());
    println!("  EE tables found: {}", before.ee_tables_present.len());
    println!("  Tables with row_id: {}", before.row_id_columns_present.len());
    println!("  Sequence tables: {}", before.sequence_tables_present.len());
    println!();

    if dry_run {
        ui::print_info("Dry run complete. Snapshot captured. No SQL executed.");
        return Ok(());
    }

    let log_dir = std::env::current_dir().context("Failed to determine working directory")?;
    let mut logger = ExecutionLogger::create_in(&log_dir)?;
    println!("SQL log: {}", logger.path().display());
    println!();

    if from > 1 {
        ui::print_warning(&format!("Resuming from SQL file #{}", from));
    }

    ui::print_info("Running migration SQL files...");
    let results = SqlFileRunner::new(&mut gateway, &mut logger, resolve_sql_dir(&sql_dir))
        .run_from(from)
        .await?;

    for result in &results {
        println!("{}", result_line(result));
    }
    println!();

    if let Some(failed) = results.iter().find(|r| !r.success) {
        bail!(
            "Migration stopped at file #{}. You can resume with --from={}",
            failed.file_number,
            failed.file_number
        );
    }

    ui::print_success("All SQL files executed successfully.");
    Ok(())
}

/// Relative SQL directories are taken from the working directory
fn resolve_sql_dir(sql_dir: &Path) -> PathBuf {
    if sql_dir.is_absolute() {
        return sql_dir.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(sql_dir))
        .unwrap_or_else(|_| sql_dir.to_path_buf())
}

fn result_line(result: &MigrationResult) -> String {
    if result.success {
        format!(
            "  {} {:02}. {:<35}  {} statements  {:.0}ms",
            "✓".green(),
            result.file_number,
            result.filename,
            result.statements_executed,
            result.duration_ms
        )
    } else {
        format!(
            "  {} {:02}. {:<35}  FAILED: {}",
            "✗".red(),
            result.file_number,
            result.filename,
            result.error.as_deref().unwrap_or("unknown error")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(success: bool) -> MigrationResult {
        MigrationResult {
            file_number: 4,
            filename: "04_drop_staging_tables.sql".to_string(),
            success,
            statements_executed: 12,
            duration_ms: 153.6,
            error: (!success).then(|| "Unknown table 'magento_banner'".to_string()),
        }
    }

    #[test]
    fn test_result_lines() {
        colored::control::set_override(false);

        assert_eq!(
            result_line(&result(true)),
            "  ✓ 04. 04_drop_staging_tables.sql           12 statements  154ms"
        );
        assert_eq!(
            result_line(&result(false)),
            "  ✗ 04. 04_drop_staging_tables.sql           FAILED: Unknown table 'magento_banner'"
        );
    }

    #[test]
    fn test_absolute_sql_dir_is_kept() {
        assert_eq!(resolve_sql_dir(Path::new("/opt/ee2ce/sql")), PathBuf::from("/opt/ee2ce/sql"));
        assert!(resolve_sql_dir(Path::new("sql")).is_absolute());
    }
}
