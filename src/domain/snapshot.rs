//! Snapshot domain types
//!
//! A `SnapshotReport` is a point-in-time fact sheet about the Magento
//! database: row counts and checksums of a few key tables, plus which known
//! EE artifacts are still present. Two reports (before and after the SQL
//! files run) are diffed by `domain::comparator`.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// High-value tables whose row counts and checksums are tracked for data loss
pub const KEY_TABLES: &[&str] = &[
    "catalog_product_entity",
    "catalog_category_entity",
    "cms_page",
    "cms_block",
    "customer_entity",
    "sales_order",
    "quote",
    "catalogrule",
];

/// Tables that only exist in Enterprise/Commerce installations
pub const EE_TABLES: &[&str] = &[
    "enterprise_catalog_category_rewrite",
    "enterprise_catalog_product_rewrite",
    "enterprise_cms_hierarchy_lock",
    "enterprise_cms_hierarchy_metadata",
    "enterprise_cms_hierarchy_node",
    "enterprise_cms_increment",
    "enterprise_cms_page_revision",
    "enterprise_cms_page_version",
    "enterprise_customer_sales_flat_order",
    "enterprise_customer_sales_flat_order_address",
    "enterprise_giftregistry_data",
    "enterprise_giftregistry_entity",
    "enterprise_giftregistry_item",
    "enterprise_giftregistry_item_option",
    "enterprise_giftregistry_label",
    "enterprise_giftregistry_person",
    "enterprise_giftregistry_type",
    "enterprise_giftregistry_type_info",
    "enterprise_logging_event",
    "enterprise_logging_event_changes",
    "enterprise_permission_role_website",
    "enterprise_permission_variable",
    "enterprise_permission_website",
    "enterprise_reminder_rule",
    "enterprise_reminder_rule_coupon",
    "enterprise_reminder_rule_log",
    "enterprise_reminder_rule_website",
    "enterprise_reward",
    "enterprise_reward_history",
    "enterprise_reward_salesrule",
    "enterprise_reward_website",
    "magento_staging_update",
    "magento_staging_versions",
    "magento_banner",
    "magento_banner_content",
    "magento_banner_catalogrule",
    "magento_banner_salesrule",
    "magento_customerbalance",
    "magento_customerbalance_history",
    "magento_giftcardaccount",
    "magento_giftcardaccount_history",
    "magento_giftcardaccount_pool",
    "magento_reward",
    "magento_reward_history",
    "magento_reward_salesrule",
    "magento_reward_website",
    "magento_rma",
    "magento_rma_grid",
    "magento_rma_item_entity",
    "magento_rma_shipping_label",
    "magento_rma_status_history",
    "magento_sales_creditmemo_grid_archive",
    "magento_sales_invoice_grid_archive",
    "magento_sales_order_grid_archive",
    "magento_sales_shipment_grid_archive",
];

/// Staging sequence tables that must go. CE's own `sequence_order_*`,
/// `sequence_invoice_*` etc. are not listed and are never reported.
pub const EE_SEQUENCE_TABLES: &[&str] = &[
    "sequence_product",
    "sequence_catalog_category",
    "sequence_cms_page",
    "sequence_cms_block",
    "sequence_catalogrule",
    "sequence_salesrule",
    "sequence_product_bundle_option",
    "sequence_product_bundle_selection",
];

/// Flat catalog tables are rebuilt by the CE indexer and may keep `row_id`
pub const ROW_ID_EXEMPT_PREFIXES: &[&str] = &["catalog_product_flat_", "catalog_category_flat_"];

/// CE table with a legitimate `row_id` column
pub const ROW_ID_EXEMPT_TABLE: &str = "paypal_settlement_report_row";

pub fn is_ee_table(name: &str) -> bool {
    EE_TABLES.contains(&name)
}

pub fn is_ee_sequence_table(name: &str) -> bool {
    EE_SEQUENCE_TABLES.contains(&name)
}

/// Whether a `row_id` column on this table is expected in a CE schema
pub fn is_row_id_exempt(name: &str) -> bool {
    name == ROW_ID_EXEMPT_TABLE
        || ROW_ID_EXEMPT_PREFIXES
            .iter()
            .any(|prefix| name.starts_with(prefix))
}

/// Point-in-time facts about the database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotReport {
    #[serde(with = "atom_timestamp")]
    pub captured_at: DateTime<FixedOffset>,
    /// Key table → row count, `None` when the count query failed
    pub table_counts: BTreeMap<String, Option<i64>>,
    /// Key table → `CHECKSUM TABLE` value, `None` when unavailable
    pub table_checksums: BTreeMap<String, Option<String>>,
    pub ee_tables_present: Vec<String>,
    pub row_id_columns_present: Vec<String>,
    pub sequence_tables_present: Vec<String>,
}

impl SnapshotReport {
    /// Assemble a report, deduplicating the presence lists and dropping any
    /// name outside the EE catalogs or covered by a `row_id` exemption.
    pub fn new(
        captured_at: DateTime<FixedOffset>,
        table_counts: BTreeMap<String, Option<i64>>,
        table_checksums: BTreeMap<String, Option<String>>,
        ee_tables_present: Vec<String>,
        row_id_columns_present: Vec<String>,
        sequence_tables_present: Vec<String>,
    ) -> Self {
        Self {
            captured_at,
            table_counts,
            table_checksums,
            ee_tables_present: retain_unique(ee_tables_present, is_ee_table),
            row_id_columns_present: retain_unique(row_id_columns_present, |t| {
                !is_row_id_exempt(t)
            }),
            sequence_tables_present: retain_unique(sequence_tables_present, is_ee_sequence_table),
        }
    }

    /// Re-check a report read back from disk.
    ///
    /// Both maps must cover exactly the key tables; the presence lists are
    /// filtered and deduplicated the same way `new` does.
    pub fn revalidate(self) -> Result<Self, String> {
        check_key_tables("tableCounts", self.table_counts.keys())?;
        check_key_tables("tableChecksums", self.table_checksums.keys())?;

        Ok(Self::new(
            self.captured_at,
            self.table_counts,
            self.table_checksums,
            self.ee_tables_present,
            self.row_id_columns_present,
            self.sequence_tables_present,
        ))
    }

    /// True when no EE table, `row_id` column or EE sequence table is left
    pub fn is_clean(&self) -> bool {
        self.ee_tables_present.is_empty()
            && self.row_id_columns_present.is_empty()
            && self.sequence_tables_present.is_empty()
    }

    /// `YYYYMMDD-HHMMSS` stamp used in snapshot filenames
    pub fn file_stamp(&self) -> String {
        self.captured_at.format("%Y%m%d-%H%M%S").to_string()
    }
}

fn check_key_tables<'a>(
    field: &str,
    keys: impl Iterator<Item = &'a String>,
) -> Result<(), String> {
    let keys: HashSet<&str> = keys.map(String::as_str).collect();

    let missing: Vec<&str> = KEY_TABLES
        .iter()
        .copied()
        .filter(|t| !keys.contains(t))
        .collect();
    if !missing.is_empty() {
        return Err(format!("{} is missing {}", field, missing.join(", ")));
    }

    let mut unexpected: Vec<&str> = keys
        .into_iter()
        .filter(|k| !KEY_TABLES.contains(k))
        .collect();
    if !unexpected.is_empty() {
        unexpected.sort_unstable();
        return Err(format!("{} has unknown tables {}", field, unexpected.join(", ")));
    }
    Ok(())
}

fn retain_unique(names: Vec<String>, keep: impl Fn(&str) -> bool) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .into_iter()
        .filter(|name| keep(name) && seen.insert(name.clone()))
        .collect()
}

/// ISO-8601 with offset, second precision (`2026-02-20T12:00:00+00:00`)
mod atom_timestamp {
    use chrono::{DateTime, FixedOffset, SecondsFormat};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &DateTime<FixedOffset>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Secs, false))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<FixedOffset>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(ts: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(ts).unwrap()
    }

    #[test]
    fn test_catalog_sizes() {
        assert_eq!(KEY_TABLES.len(), 8);
        assert_eq!(EE_SEQUENCE_TABLES.len(), 8);
        assert_eq!(EE_TABLES.len(), 55);
    }

    #[test]
    fn test_row_id_exemptions() {
        assert!(is_row_id_exempt("catalog_product_flat_1"));
        assert!(is_row_id_exempt("catalog_category_flat_store_2"));
        assert!(is_row_id_exempt("paypal_settlement_report_row"));
        assert!(!is_row_id_exempt("catalog_product_entity"));
    }

    #[test]
    fn test_new_restricts_and_deduplicates_lists() {
        let report = SnapshotReport::new(
            at("2026-02-20T12:00:00+00:00"),
            BTreeMap::new(),
            BTreeMap::new(),
            vec![
                "magento_banner".to_string(),
                "cms_page".to_string(),
                "magento_banner".to_string(),
            ],
            vec![
                "catalog_product_entity".to_string(),
                "catalog_product_flat_1".to_string(),
                "catalog_product_entity".to_string(),
            ],
            vec![
                "sequence_product".to_string(),
                "sequence_order_1".to_string(),
            ],
        );

        assert_eq!(report.ee_tables_present, vec!["magento_banner"]);
        assert_eq!(report.row_id_columns_present, vec!["catalog_product_entity"]);
        assert_eq!(report.sequence_tables_present, vec!["sequence_product"]);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_json_field_names() {
        let mut counts = BTreeMap::new();
        counts.insert("cms_page".to_string(), Some(10));
        counts.insert("quote".to_string(), None);

        let report = SnapshotReport::new(
            at("2026-02-20T12:00:00+01:00"),
            counts,
            BTreeMap::new(),
            vec![],
            vec![],
            vec![],
        );

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["capturedAt"], "2026-02-20T12:00:00+01:00");
        assert_eq!(json["tableCounts"]["cms_page"], 10);
        assert!(json["tableCounts"]["quote"].is_null());
        assert!(json["eeTablesPresent"].as_array().unwrap().is_empty());
        assert!(json.get("rowIdColumnsPresent").is_some());
        assert!(json.get("sequenceTablesPresent").is_some());
        assert_eq!(report.file_stamp(), "20260220-120000");
    }

    fn full_counts() -> BTreeMap<String, Option<i64>> {
        KEY_TABLES.iter().map(|t| (t.to_string(), Some(1))).collect()
    }

    fn full_checksums() -> BTreeMap<String, Option<String>> {
        KEY_TABLES.iter().map(|t| (t.to_string(), None)).collect()
    }

    #[test]
    fn test_revalidate_accepts_full_key_set() {
        let report = SnapshotReport {
            captured_at: at("2026-02-20T12:00:00+00:00"),
            table_counts: full_counts(),
            table_checksums: full_checksums(),
            ee_tables_present: vec!["magento_banner".to_string(), "magento_banner".to_string()],
            row_id_columns_present: vec!["paypal_settlement_report_row".to_string()],
            sequence_tables_present: vec!["sequence_order_1".to_string()],
        };

        let report = report.revalidate().unwrap();
        assert_eq!(report.ee_tables_present, vec!["magento_banner"]);
        assert!(report.row_id_columns_present.is_empty());
        assert!(report.sequence_tables_present.is_empty());
    }

    #[test]
    fn test_revalidate_rejects_missing_key_table() {
        let mut counts = full_counts();
        counts.remove("quote");
        let report = SnapshotReport::new(
            at("2026-02-20T12:00:00+00:00"),
            counts,
            full_checksums(),
            vec![],
            vec![],
            vec![],
        );

        let err = report.revalidate().unwrap_err();
        assert_eq!(err, "tableCounts is missing quote");
    }

    #[test]
    fn test_revalidate_rejects_unknown_key_table() {
        let mut checksums = full_checksums();
        checksums.insert("foo".to_string(), Some("1".to_string()));
        let report = SnapshotReport::new(
            at("2026-02-20T12:00:00+00:00"),
            full_counts(),
            checksums,
            vec![],
            vec![],
            vec![],
        );

        let err = report.revalidate().unwrap_err();
        assert_eq!(err, "tableChecksums has unknown tables foo");
    }

    #[test]
    fn test_missing_field_rejected() {
        let json = r#"{"capturedAt":"2026-02-20T12:00:00+00:00","tableCounts":{}}"#;
        assert!(serde_json::from_str::<SnapshotReport>(json).is_err());
    }
}
