//! Snapshot capture
//!
//! Reads row counts, checksums and EE leftovers from a live database.
//! Capture never fails as a whole: a key table that cannot be counted or
//! checksummed records `None`, and a presence query that fails records an
//! empty list.

use chrono::{DateTime, FixedOffset, Local};
use std::collections::{BTreeMap, HashSet};
use tracing::{info, warn};

use crate::domain::snapshot::{EE_SEQUENCE_TABLES, EE_TABLES, KEY_TABLES};
use crate::domain::SnapshotReport;
use crate::infrastructure::{DatabaseGateway, Row};

const ALL_TABLES_SQL: &str =
    "SELECT TABLE_NAME FROM information_schema.TABLES WHERE TABLE_SCHEMA = DATABASE()";

const ROW_ID_TABLES_SQL: &str = "SELECT TABLE_NAME FROM information_schema.COLUMNS \
     WHERE TABLE_SCHEMA = DATABASE() \
     AND COLUMN_NAME = 'row_id' \
     AND TABLE_NAME NOT LIKE 'catalog_product_flat_%' \
     AND TABLE_NAME NOT LIKE 'catalog_category_flat_%' \
     AND TABLE_NAME != 'paypal_settlement_report_row' \
     ORDER BY TABLE_NAME";

const SEQUENCE_TABLES_SQL: &str = "SELECT TABLE_NAME FROM information_schema.TABLES \
     WHERE TABLE_SCHEMA = DATABASE() \
     AND TABLE_NAME LIKE 'sequence_%' \
     ORDER BY TABLE_NAME";

/// Captures [`SnapshotReport`]s through a database gateway
pub struct SnapshotCapturer<'a, G: DatabaseGateway> {
    gateway: &'a mut G,
}

impl<'a, G: DatabaseGateway> SnapshotCapturer<'a, G> {
    pub fn new(gateway: &'a mut G) -> Self {
        Self { gateway }
    }

    pub async fn capture(&mut self) -> SnapshotReport {
        self.capture_at(Local::now().fixed_offset()).await
    }

    pub async fn capture_at(&mut self, captured_at: DateTime<FixedOffset>) -> SnapshotReport {
        info!("Capturing database snapshot");

        let mut table_counts = BTreeMap::new();
        let mut table_checksums = BTreeMap::new();
        for table in KEY_TABLES {
            table_counts.insert(table.to_string(), self.row_count(table).await);
            table_checksums.insert(table.to_string(), self.checksum(table).await);
        }

        let ee_tables = self.ee_tables().await;
        let row_id_tables = self.table_names(ROW_ID_TABLES_SQL).await;
        let sequence_tables = self.sequence_tables().await;

        info!(
            ee_tables = ee_tables.len(),
            row_id_tables = row_id_tables.len(),
            sequence_tables = sequence_tables.len(),
            "Snapshot captured"
        );

        SnapshotReport::new(
            captured_at,
            table_counts,
            table_checksums,
            ee_tables,
            row_id_tables,
            sequence_tables,
        )
    }

    async fn row_count(&mut self, table: &str) -> Option<i64> {
        let sql = format!("SELECT COUNT(*) AS cnt FROM `{}`", table);
        match self.gateway.query(&sql).await {
            Ok(rows) => rows.first().and_then(|r| r.get("cnt")).and_then(|v| v.as_i64()),
            Err(e) => {
                warn!("Could not count rows in {}: {}", table, e);
                None
            }
        }
    }

    async fn checksum(&mut self, table: &str) -> Option<String> {
        let sql = format!("CHECKSUM TABLE `{}`", table);
        match self.gateway.query(&sql).await {
            Ok(rows) => rows
                .first()
                .and_then(|r| r.get("Checksum"))
                .and_then(|v| v.as_text()),
            Err(e) => {
                warn!("Could not checksum {}: {}", table, e);
                None
            }
        }
    }

    /// Known EE tables present in the schema, in catalog order
    async fn ee_tables(&mut self) -> Vec<String> {
        let existing: HashSet<String> = self.table_names(ALL_TABLES_SQL).await.into_iter().collect();
        EE_TABLES
            .iter()
            .filter(|t| existing.contains(**t))
            .map(|t| t.to_string())
            .collect()
    }

    async fn sequence_tables(&mut self) -> Vec<String> {
        self.table_names(SEQUENCE_TABLES_SQL)
            .await
            .into_iter()
            .filter(|t| EE_SEQUENCE_TABLES.contains(&t.as_str()))
            .collect()
    }

    async fn table_names(&mut self, sql: &str) -> Vec<String> {
        match self.gateway.query(sql).await {
            Ok(rows) => rows.iter().filter_map(table_name).collect(),
            Err(e) => {
                warn!("Schema query failed: {}", e);
                Vec::new()
            }
        }
    }
}

fn table_name(row: &Row) -> Option<String> {
    row.get("TABLE_NAME")
        .or_else(|| row.get("table_name"))
        .and_then(|v| v.as_text())
}
