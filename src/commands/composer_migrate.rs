//! `composer-migrate`: swap the EE metapackage for CE in composer.json

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;

use crate::commands::disclaimer;
use crate::config;
use crate::services::composer;
use crate::ui;

pub async fn execute(path: Option<PathBuf>, dry_run: bool, accept_terms: bool) -> Result<()> {
    disclaimer::require_confirmation(accept_terms)?;

    let magento_root = config::resolve_magento_root(path.as_deref())?;
    let composer_json = magento_root.join("composer.json");

    let analysis = composer::analyse(&composer_json)?;

    if !analysis.is_enterprise_edition() {
        ui::print_warning(&format!(
            "composer.json does not require {}. Nothing to do.",
            composer::EE_PACKAGE
        ));
        return Ok(());
    }

    ui::print_info(&format!(
        "Enterprise Edition detected: {}",
        analysis.ee_version.as_deref().unwrap_or_default()
    ));

    let replace_count = analysis.magento_replace_count();
    if replace_count > 0 {
        println!(
            "  replace section: {} magento/* entries will be removed",
            replace_count
        );
    }

    let conflicts = composer::detect_conflicts(&analysis);
    if !conflicts.is_empty() {
        println!();
        ui::print_warning("Potential conflicts detected:");
        for conflict in &conflicts {
            println!("  {} {} ({})", "⚠".yellow(), conflict.package, conflict.version);
            println!("    {}", conflict.message);
        }
    }

    let repositories = composer::detect_enterprise_repositories(&magento_root);
    if !repositories.is_empty() {
        println!();
        ui::print_warning("Enterprise repositories detected:");
        for finding in &repositories {
            println!("  {} {} in {}", "⚠".yellow(), finding.pattern, finding.file);
            println!("    {}", finding.message);
        }
    }

    println!();
    println!("Changes to be applied:");
    for package in composer::packages_to_remove(&analysis) {
        println!("  {} {}", "- remove".red(), package);
    }
    if let Some((package, version)) = composer::packages_to_add(&analysis) {
        println!("  {}    {}: {}", "+ add".green(), package, version);
    }
    if replace_count > 0 {
        println!("  {}  replace section (magento/* entries)", "~ clear".yellow());
    }

    if dry_run {
        println!();
        ui::print_warning("DRY RUN MODE: no changes written to composer.json.");
        return Ok(());
    }

    println!();
    composer::migrate(&composer_json, &analysis)
        .with_context(|| format!("Failed to update {}", composer_json.display()))?;

    ui::print_success("composer.json updated successfully.");
    println!("  Next step: run 'composer update --no-dev' to resolve CE dependencies.");
    Ok(())
}
