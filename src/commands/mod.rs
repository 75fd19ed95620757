//! Command implementations
//!
//! Each subcommand resolves the Magento root, asks for consent where the
//! operation is destructive, and drives the services layer.

pub mod composer_migrate;
pub mod db_migrate;
pub mod disclaimer;
pub mod migrate;
pub mod scan_row_id;
pub mod verify;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

use crate::config;
use crate::domain::SnapshotReport;
use crate::infrastructure::MySqlGateway;
use crate::services::SnapshotCapturer;

/// Read env.php under `magento_root` and open the database connection
pub(crate) async fn connect(magento_root: &Path) -> Result<MySqlGateway> {
    let db = config::load_database_config(magento_root)
        .with_context(|| format!("Failed to read database settings from {}", magento_root.display()))?;

    let mut gateway = MySqlGateway::new();
    gateway
        .connect(&db)
        .await
        .with_context(|| format!("Failed to connect to {}", db.describe()))?;

    println!("Connected to database: {}", db.describe());
    Ok(gateway)
}

/// Capture a snapshot behind a spinner
pub(crate) async fn capture_snapshot(gateway: &mut MySqlGateway, message: &str) -> SnapshotReport {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));

    let report = SnapshotCapturer::new(gateway).capture().await;

    spinner.finish_and_clear();
    report
}
