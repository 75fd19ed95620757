//! Snapshot persistence
//!
//! Before-snapshots are written as `snapshot-before-<YYYYMMDD-HHMMSS>.json`
//! so that `verify` can pick up the latest one later.

use std::path::{Path, PathBuf};
use tracing::info;

use crate::domain::SnapshotReport;
use crate::error::SnapshotError;

const SNAPSHOT_PREFIX: &str = "snapshot-before-";

/// Reads and writes snapshot files in one directory
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store rooted at the current working directory
    pub fn in_current_dir() -> Result<Self, SnapshotError> {
        let dir = std::env::current_dir().map_err(|source| SnapshotError::WriteFailed {
            path: PathBuf::from("."),
            source,
        })?;
        Ok(Self::new(dir))
    }

    /// Write the report and return its path
    pub fn save(&self, report: &SnapshotReport) -> Result<PathBuf, SnapshotError> {
        let path = self
            .dir
            .join(format!("{}{}.json", SNAPSHOT_PREFIX, report.file_stamp()));

        // SnapshotReport only holds strings, integers and maps with string keys
        let json = serde_json::to_string_pretty(report).map_err(|e| {
            SnapshotError::InvalidJson {
                path: path.clone(),
                message: e.to_string(),
            }
        })?;

        std::fs::write(&path, json).map_err(|source| SnapshotError::WriteFailed {
            path: path.clone(),
            source,
        })?;

        info!("Snapshot saved to {}", path.display());
        Ok(path)
    }

    /// Load a report, rejecting files that are missing required fields
    pub fn load(path: &Path) -> Result<SnapshotReport, SnapshotError> {
        if !path.is_file() {
            return Err(SnapshotError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|_| SnapshotError::NotFound {
            path: path.to_path_buf(),
        })?;

        let report: SnapshotReport =
            serde_json::from_str(&content).map_err(|e| SnapshotError::InvalidJson {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        report
            .revalidate()
            .map_err(|message| SnapshotError::Malformed {
                path: path.to_path_buf(),
                message,
            })
    }

    /// Lexically greatest `snapshot-before-*.json` in the store directory
    pub fn find_latest(&self) -> Option<PathBuf> {
        let pattern = format!(
            "{}/{}*.json",
            glob::Pattern::escape(&self.dir.to_string_lossy()),
            SNAPSHOT_PREFIX
        );

        glob::glob(&pattern)
            .ok()?
            .filter_map(Result::ok)
            .filter(|p| p.is_file())
            .max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::snapshot::KEY_TABLES;
    use chrono::DateTime;
    use std::collections::BTreeMap;

    fn sample_report(ts: &str) -> SnapshotReport {
        let mut counts: BTreeMap<String, Option<i64>> =
            KEY_TABLES.iter().map(|t| (t.to_string(), Some(7))).collect();
        counts.insert("catalog_product_entity".to_string(), Some(42));
        counts.insert("quote".to_string(), None);

        let mut checksums: BTreeMap<String, Option<String>> =
            KEY_TABLES.iter().map(|t| (t.to_string(), Some("1".to_string()))).collect();
        checksums.insert("catalog_product_entity".to_string(), Some("3054871234".to_string()));
        checksums.insert("quote".to_string(), None);

        SnapshotReport::new(
            DateTime::parse_from_rfc3339(ts).unwrap(),
            counts,
            checksums,
            vec!["magento_staging_update".to_string()],
            vec!["catalog_product_entity".to_string()],
            vec!["sequence_product".to_string()],
        )
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        let report = sample_report("2026-02-20T12:00:00+02:00");

        let path = store.save(&report).unwrap();
        assert_eq!(
            path.file_name().unwrap().to_string_lossy(),
            "snapshot-before-20260220-120000.json"
        );

        let loaded = SnapshotStore::load(&path).unwrap();
        assert_eq!(loaded, report);
        assert_eq!(loaded.captured_at.timestamp(), report.captured_at.timestamp());
    }

    #[test]
    fn test_round_trip_truncates_to_seconds() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        let report = sample_report("2026-02-20T12:00:00.750+00:00");

        let loaded = SnapshotStore::load(&store.save(&report).unwrap()).unwrap();
        assert_eq!(loaded.captured_at.timestamp(), report.captured_at.timestamp());
        assert_eq!(loaded.table_counts, report.table_counts);
        assert_eq!(loaded.table_checksums, report.table_checksums);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = SnapshotStore::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, SnapshotError::NotFound { .. }));
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot-before-20260101-000000.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = SnapshotStore::load(&path).unwrap_err();
        assert!(matches!(err, SnapshotError::InvalidJson { .. }));
    }

    #[test]
    fn test_load_rejects_empty_key_table_maps() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot-before-20260101-000000.json");
        std::fs::write(
            &path,
            r#"{"capturedAt":"2026-01-01T00:00:00+00:00","tableCounts":{},"tableChecksums":{"foo":"1"},"eeTablesPresent":[],"rowIdColumnsPresent":[],"sequenceTablesPresent":[]}"#,
        )
        .unwrap();

        let err = SnapshotStore::load(&path).unwrap_err();
        assert!(matches!(err, SnapshotError::Malformed { .. }));
        assert!(err.to_string().contains("tableCounts is missing"));
    }

    #[test]
    fn test_load_filters_presence_lists() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        let report = sample_report("2026-02-20T12:00:00+00:00");
        let path = store.save(&report).unwrap();

        let mut json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        json["eeTablesPresent"] = serde_json::json!(["cms_page", "magento_rma", "magento_rma"]);
        json["rowIdColumnsPresent"] = serde_json::json!(["paypal_settlement_report_row"]);
        json["sequenceTablesPresent"] = serde_json::json!(["sequence_order_1"]);
        std::fs::write(&path, json.to_string()).unwrap();

        let loaded = SnapshotStore::load(&path).unwrap();
        assert_eq!(loaded.ee_tables_present, vec!["magento_rma"]);
        assert!(loaded.row_id_columns_present.is_empty());
        assert!(loaded.sequence_tables_present.is_empty());
    }

    #[test]
    fn test_find_latest_is_lexical_max() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        assert!(store.find_latest().is_none());

        for name in [
            "snapshot-before-20260101-090000.json",
            "snapshot-before-20260220-120000.json",
            "snapshot-before-20260115-235959.json",
            "snapshot-after-20270101-000000.json",
        ] {
            std::fs::write(dir.path().join(name), "{}").unwrap();
        }

        let latest = store.find_latest().unwrap();
        assert_eq!(
            latest.file_name().unwrap().to_string_lossy(),
            "snapshot-before-20260220-120000.json"
        );
    }
}
