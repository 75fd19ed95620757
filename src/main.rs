use anyhow::Result;
use clap::Parser;

// Core modules
mod cli;
mod commands;
mod config;

// Layered architecture
mod domain;
mod error;
mod infrastructure;
mod services;
mod ui;

use cli::{Cli, Commands};
use commands::scan_row_id::OutputFormat;
use commands::{composer_migrate, db_migrate, migrate, scan_row_id, verify};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging with LOGGING env var support
    // LOGGING=debug,info,warn,error or just LOGGING=debug
    let log_level = std::env::var("LOGGING")
        .or_else(|_| std::env::var("LOG_LEVEL"))
        .unwrap_or_else(|_| {
            if cli.verbose {
                "debug".to_string()
            } else {
                "info".to_string()
            }
        });

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    // Execute command
    match cli.command {
        Commands::Migrate {
            path,
            dry_run,
            accept_terms,
            sql_dir,
        } => {
            migrate::execute(path, dry_run, accept_terms, sql_dir).await?;
        }
        Commands::DbMigrate {
            path,
            dry_run,
            from,
            accept_terms,
            sql_dir,
        } => {
            db_migrate::execute(path, dry_run, from, accept_terms, sql_dir).await?;
        }
        Commands::ComposerMigrate {
            path,
            dry_run,
            accept_terms,
        } => {
            composer_migrate::execute(path, dry_run, accept_terms).await?;
        }
        Commands::Verify {
            path,
            snapshot,
            accept_terms,
        } => {
            verify::execute(path, snapshot, accept_terms).await?;
        }
        Commands::ScanRowId {
            path,
            json,
            markdown,
            accept_terms,
        } => {
            scan_row_id::execute(path, OutputFormat::from_flags(json, markdown), accept_terms)
                .await?;
        }
        Commands::ScanRowIdVendor {
            path,
            json,
            markdown,
            accept_terms,
        } => {
            scan_row_id::execute_vendor(path, OutputFormat::from_flags(json, markdown), accept_terms)
                .await?;
        }
    }

    Ok(())
}
