//! CLI definitions for ee2ce
//!
//! This module contains all CLI argument parsing structures using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "ee2ce",
    version,
    about = "Magento 2 Enterprise Edition to Community Edition migration tool",
    long_about = "Downgrades a Magento 2 / Adobe Commerce installation to Magento Open Source.\nRuns the numbered migration SQL files, rewrites composer.json and verifies the result against a pre-migration snapshot."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full EE to CE migration (database + composer + verification)
    Migrate {
        /// Path to the Magento root directory (defaults to current directory)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Parse and analyse without making changes
        #[arg(long)]
        dry_run: bool,

        /// Accept the disclaimer and skip the confirmation prompt
        #[arg(long)]
        accept_terms: bool,

        /// Directory holding the numbered migration SQL files
        #[arg(long, env = "EE2CE_SQL_DIR", default_value = "./sql")]
        sql_dir: PathBuf,
    },

    /// Run the EE to CE database migration SQL files
    DbMigrate {
        /// Path to the Magento root directory
        #[arg(long)]
        path: Option<PathBuf>,

        /// Take the pre-migration snapshot without executing any SQL
        #[arg(long)]
        dry_run: bool,

        /// Start from this SQL file number (for resuming failed migrations)
        #[arg(long, default_value = "1")]
        from: u32,

        /// Accept the disclaimer and skip the confirmation prompt
        #[arg(long)]
        accept_terms: bool,

        /// Directory holding the numbered migration SQL files
        #[arg(long, env = "EE2CE_SQL_DIR", default_value = "./sql")]
        sql_dir: PathBuf,
    },

    /// Migrate composer.json from EE to CE
    ComposerMigrate {
        /// Path to the Magento root directory
        #[arg(long)]
        path: Option<PathBuf>,

        /// Analyse composer.json without writing changes
        #[arg(long)]
        dry_run: bool,

        /// Accept the disclaimer and skip the confirmation prompt
        #[arg(long)]
        accept_terms: bool,
    },

    /// Verify the migration by comparing snapshots
    Verify {
        /// Path to the Magento root directory
        #[arg(long)]
        path: Option<PathBuf>,

        /// Before-snapshot JSON file (defaults to the latest in the current directory)
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Accept the disclaimer and skip the confirmation prompt
        #[arg(long)]
        accept_terms: bool,
    },

    /// Scan app/code and vendor for row_id references
    ScanRowId {
        /// Path to the Magento root directory
        #[arg(long)]
        path: Option<PathBuf>,

        /// Output results as JSON
        #[arg(long, conflicts_with = "markdown")]
        json: bool,

        /// Output results as Markdown
        #[arg(long)]
        markdown: bool,

        /// Accept the disclaimer and skip the confirmation prompt
        #[arg(long)]
        accept_terms: bool,
    },

    /// Scan vendor (excluding magento/*) for row_id references
    ScanRowIdVendor {
        /// Path to the Magento root directory
        #[arg(long)]
        path: Option<PathBuf>,

        /// Output results as JSON
        #[arg(long, conflicts_with = "markdown")]
        json: bool,

        /// Output results as Markdown
        #[arg(long)]
        markdown: bool,

        /// Accept the disclaimer and skip the confirmation prompt
        #[arg(long)]
        accept_terms: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_db_migrate_arguments() {
        let cli = Cli::parse_from([
            "ee2ce",
            "db-migrate",
            "--path",
            "/var/www/magento",
            "--from",
            "5",
            "--accept-terms",
        ]);

        match cli.command {
            Commands::DbMigrate {
                path,
                dry_run,
                from,
                accept_terms,
                ..
            } => {
                assert_eq!(path, Some(PathBuf::from("/var/www/magento")));
                assert!(!dry_run);
                assert_eq!(from, 5);
                assert!(accept_terms);
            }
            _ => panic!("expected db-migrate"),
        }
    }

    #[test]
    fn test_scan_output_flags_conflict() {
        let result = Cli::try_parse_from(["ee2ce", "scan-row-id", "--json", "--markdown"]);
        assert!(result.is_err());
    }
}
