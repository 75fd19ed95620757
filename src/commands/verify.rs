//! `verify`: compare a post-migration snapshot against the saved one

use anyhow::{bail, Result};
use std::path::PathBuf;

use crate::commands::{capture_snapshot, connect, disclaimer};
use crate::config;
use crate::domain::comparator::assert_success;
use crate::domain::{compare, SnapshotDiff, SnapshotReport};
use crate::infrastructure::SnapshotStore;
use crate::ui::{self, Cell};

/// Names listed in a failing check before truncation
const DETAIL_LIMIT: usize = 5;

pub async fn execute(
    path: Option<PathBuf>,
    snapshot: Option<PathBuf>,
    accept_terms: bool,
) -> Result<()> {
    disclaimer::require_confirmation(accept_terms)?;

    let magento_root = config::resolve_magento_root(path.as_deref())?;
    let mut gateway = connect(&magento_root).await?;

    ui::print_info("Taking post-migration snapshot...");
    let after = capture_snapshot(&mut gateway, "Capturing post-migration snapshot...").await;

    let before_path = match snapshot {
        Some(path) => Some(path),
        None => SnapshotStore::in_current_dir()?.find_latest(),
    };

    let Some(before_path) = before_path.filter(|p| p.is_file()) else {
        ui::print_warning("No before-snapshot found. Running verification without comparison.");
        report_presence(&after);
        if after.is_clean() {
            return Ok(());
        }
        bail!("Verification failed: EE artefacts remain in the database");
    };

    ui::print_info(&format!("Loading before-snapshot: {}", before_path.display()));
    let before = SnapshotStore::load(&before_path)?;

    let diff = compare(&before, &after);
    let passed = assert_success(&diff);

    ui::print_header("MIGRATION VERIFICATION");
    for (label, ok, detail) in checks(&diff) {
        ui::print_check(label, ok, &detail);
    }

    println!();
    ui::print_warning("  Schema Changes");
    ui::print_table(
        &["Metric", "Before", "After", "Result"],
        &schema_rows(&before, &after, &diff),
    );

    ui::print_warning("  Data Integrity");
    ui::print_table(&["Table", "Before", "After", "Status"], &integrity_rows(&diff));

    let data_lost = diff.has_row_loss();
    if data_lost {
        ui::print_warning("  Warning: some tables lost rows during migration. Review before proceeding.");
        println!();
    }

    if passed && !data_lost {
        ui::print_success("VERIFICATION PASSED: migration completed successfully.");
        Ok(())
    } else {
        bail!("VERIFICATION FAILED: migration may be incomplete.")
    }
}

fn report_presence(after: &SnapshotReport) {
    let ee = after.ee_tables_present.len();
    let row_id = after.row_id_columns_present.len();
    let seq = after.sequence_tables_present.len();

    ui::print_check(
        "EE-specific tables removed",
        ee == 0,
        &format!("{} EE tables remaining", ee),
    );
    ui::print_check(
        "row_id columns removed",
        row_id == 0,
        &format!("{} row_id columns remaining", row_id),
    );
    ui::print_check(
        "sequence_* tables removed",
        seq == 0,
        &format!("{} sequence_* tables remaining", seq),
    );
}

fn checks(diff: &SnapshotDiff) -> Vec<(&'static str, bool, String)> {
    let ee = &diff.ee_tables_remaining;
    let row_id = &diff.row_id_columns_remaining;
    let seq = &diff.sequence_tables_remaining;

    vec![
        (
            "EE-specific tables removed",
            ee.is_empty(),
            if ee.is_empty() {
                format!("All {} EE tables dropped", diff.ee_tables_removed_count)
            } else {
                format!("{} EE table(s) still present: {}", ee.len(), first_names(ee))
            },
        ),
        (
            "row_id columns removed",
            row_id.is_empty(),
            if row_id.is_empty() {
                "No row_id columns remaining".to_string()
            } else {
                format!(
                    "{} table(s) still have row_id: {}",
                    row_id.len(),
                    first_names(row_id)
                )
            },
        ),
        (
            "EE sequence tables removed",
            seq.is_empty(),
            if seq.is_empty() {
                "All EE staging sequence tables dropped".to_string()
            } else {
                format!("{} EE sequence table(s) still present", seq.len())
            },
        ),
    ]
}

fn first_names(names: &[String]) -> String {
    names
        .iter()
        .take(DETAIL_LIMIT)
        .cloned()
        .collect::<Vec<_>>()
        .join(", ")
}

fn schema_rows(before: &SnapshotReport, after: &SnapshotReport, diff: &SnapshotDiff) -> Vec<Vec<Cell>> {
    let result = |remaining: usize, cleaned: String| {
        if remaining == 0 {
            Cell::good(format!("{} ✓", cleaned))
        } else {
            Cell::bad(format!("{} remaining ✗", remaining))
        }
    };

    vec![
        vec![
            Cell::plain("EE-specific tables"),
            Cell::plain(before.ee_tables_present.len()),
            Cell::plain(after.ee_tables_present.len()),
            result(
                diff.ee_tables_remaining.len(),
                format!("-{} removed", diff.ee_tables_removed_count),
            ),
        ],
        vec![
            Cell::plain("Tables with row_id"),
            Cell::plain(before.row_id_columns_present.len()),
            Cell::plain(after.row_id_columns_present.len()),
            result(diff.row_id_columns_remaining.len(), "all cleaned".to_string()),
        ],
        vec![
            Cell::plain("EE staging sequence tables"),
            Cell::plain(before.sequence_tables_present.len()),
            Cell::plain(after.sequence_tables_present.len()),
            result(
                diff.sequence_tables_remaining.len(),
                format!("-{} removed", before.sequence_tables_present.len()),
            ),
        ],
    ]
}

fn integrity_rows(diff: &SnapshotDiff) -> Vec<Vec<Cell>> {
    let count = |c: Option<i64>| c.map_or_else(|| "N/A".to_string(), |v| v.to_string());

    diff.row_count_deltas
        .iter()
        .map(|(table, delta)| {
            let status = match delta.delta {
                Some(d) if d < 0 => Cell::bad(format!("{:+} ✗", d)),
                _ => Cell::good("✓"),
            };
            vec![
                Cell::plain(table),
                Cell::plain(count(delta.before)),
                Cell::plain(count(delta.after)),
                status,
            ]
        })
        .collect()
}
