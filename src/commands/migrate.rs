//! `migrate`: database, composer.json and verification in one run

use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;

use crate::commands::{composer_migrate, db_migrate, disclaimer, verify};
use crate::config;
use crate::ui;

pub async fn execute(
    path: Option<PathBuf>,
    dry_run: bool,
    accept_terms: bool,
    sql_dir: PathBuf,
) -> Result<()> {
    disclaimer::require_confirmation(accept_terms)?;

    let magento_root = config::resolve_magento_root(path.as_deref())?;
    println!();
    println!("  Magento root: {}", magento_root.display().to_string().cyan());

    // Consent was given above; the steps must not ask again
    let root = Some(magento_root.clone());

    ui::print_header("Step 1/3: Database Migration");
    if let Err(e) = db_migrate::execute(root.clone(), dry_run, 1, true, sql_dir).await {
        ui::print_error(&format!("{:#}", e));
        println!("  Fix the issue above and re-run with --from=N to resume.");
        anyhow::bail!("Database migration failed. Aborting.");
    }

    ui::print_header("Step 2/3: Composer Migration");
    if let Err(e) = composer_migrate::execute(root.clone(), dry_run, true).await {
        ui::print_error(&format!("{:#}", e));
        anyhow::bail!("Composer migration failed. Aborting.");
    }

    ui::print_header("Step 3/3: Verification");
    if dry_run {
        ui::print_warning("DRY RUN MODE: skipping verification, nothing was migrated.");
        return Ok(());
    }

    if let Err(e) = verify::execute(root, None, true).await {
        ui::print_error(&format!("{:#}", e));
        anyhow::bail!("Verification failed. Review the output above.");
    }

    println!();
    ui::print_success("Migration complete! Run the following to finish:");
    println!();
    for (step, command) in post_migration_steps(&magento_root.display().to_string())
        .iter()
        .enumerate()
    {
        println!("  {}. {}", step + 1, command);
    }
    Ok(())
}

fn post_migration_steps(magento_root: &str) -> Vec<String> {
    vec![
        format!("cd {}", magento_root),
        "composer update --no-dev".to_string(),
        "bin/magento setup:upgrade".to_string(),
        "bin/magento setup:di:compile".to_string(),
        "bin/magento setup:static-content:deploy".to_string(),
        "bin/magento cache:flush".to_string(),
    ]
}
