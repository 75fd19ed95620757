//! Before/after snapshot comparison
//!
//! Pure functions: `compare` never fails and `assert_success` only looks at
//! the three "remaining" lists. Row deltas and checksum changes are reported
//! for the operator but do not decide pass/fail.

use serde::Serialize;
use std::collections::BTreeMap;

use super::snapshot::SnapshotReport;

/// Row count of one key table on both sides
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowCountDelta {
    pub before: Option<i64>,
    pub after: Option<i64>,
    /// `after - before`, `None` if either side is unknown
    pub delta: Option<i64>,
}

/// A key table whose checksum differs between the two snapshots
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChecksumChange {
    pub before: Option<String>,
    pub after: Option<String>,
}

/// Result of comparing a before and an after snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotDiff {
    pub ee_tables_remaining: Vec<String>,
    pub row_id_columns_remaining: Vec<String>,
    pub sequence_tables_remaining: Vec<String>,
    /// Negative when EE tables appeared between the two snapshots
    pub ee_tables_removed_count: i64,
    pub row_count_deltas: BTreeMap<String, RowCountDelta>,
    pub checksum_changes: BTreeMap<String, ChecksumChange>,
}

impl SnapshotDiff {
    /// Any key table that lost rows. Presentation policy only.
    pub fn has_row_loss(&self) -> bool {
        self.row_count_deltas
            .values()
            .any(|d| d.delta.is_some_and(|delta| delta < 0))
    }
}

/// Diff two snapshots. `before` decides which key tables appear in the deltas.
pub fn compare(before: &SnapshotReport, after: &SnapshotReport) -> SnapshotDiff {
    let row_count_deltas = before
        .table_counts
        .iter()
        .map(|(table, &before_count)| {
            let after_count = after.table_counts.get(table).copied().flatten();
            let delta = match (before_count, after_count) {
                (Some(b), Some(a)) => Some(a - b),
                _ => None,
            };
            (
                table.clone(),
                RowCountDelta {
                    before: before_count,
                    after: after_count,
                    delta,
                },
            )
        })
        .collect();

    let checksum_changes = before
        .table_checksums
        .iter()
        .filter_map(|(table, before_sum)| {
            let after_sum = after.table_checksums.get(table).cloned().flatten();
            (*before_sum != after_sum).then(|| {
                (
                    table.clone(),
                    ChecksumChange {
                        before: before_sum.clone(),
                        after: after_sum,
                    },
                )
            })
        })
        .collect();

    SnapshotDiff {
        ee_tables_remaining: after.ee_tables_present.clone(),
        row_id_columns_remaining: after.row_id_columns_present.clone(),
        sequence_tables_remaining: after.sequence_tables_present.clone(),
        ee_tables_removed_count: before.ee_tables_present.len() as i64
            - after.ee_tables_present.len() as i64,
        row_count_deltas,
        checksum_changes,
    }
}

/// True iff no EE table, `row_id` column or EE sequence table remains
pub fn assert_success(diff: &SnapshotDiff) -> bool {
    diff.ee_tables_remaining.is_empty()
        && diff.row_id_columns_remaining.is_empty()
        && diff.sequence_tables_remaining.is_empty()
}
