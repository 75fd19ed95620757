//! `scan-row-id` and `scan-row-id-vendor`: find code that still reads `row_id`

use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;

use crate::commands::disclaimer;
use crate::config;
use crate::services::row_id_scanner::{
    group_by_extension, relative_path, render_json, render_markdown, scan_directory,
    RowIdReference, VENDOR_EXCLUDES,
};
use crate::ui;

/// How scan results are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Markdown,
}

impl OutputFormat {
    pub fn from_flags(json: bool, markdown: bool) -> Self {
        if json {
            OutputFormat::Json
        } else if markdown {
            OutputFormat::Markdown
        } else {
            OutputFormat::Text
        }
    }
}

/// Scan app/code and vendor/
pub async fn execute(path: Option<PathBuf>, format: OutputFormat, accept_terms: bool) -> Result<()> {
    disclaimer::require_confirmation(accept_terms)?;
    let magento_root = config::resolve_magento_root(path.as_deref())?;

    if format == OutputFormat::Text {
        ui::print_info("Scanning for row_id references...");
        println!();
    }

    let custom = scan_directory(&magento_root.join("app/code"), &[]);
    let vendor = scan_directory(&magento_root.join("vendor"), VENDOR_EXCLUDES);

    match format {
        OutputFormat::Text => {
            display_results("Custom Extensions (app/code)", &custom);
            display_results("Third-Party Extensions (vendor/)", &vendor);
            display_summary(&custom, &vendor);
        }
        _ => {
            let all: Vec<RowIdReference> = custom.into_iter().chain(vendor).collect();
            print_machine_readable(&all, format)?;
        }
    }
    Ok(())
}

/// Scan vendor/ only
pub async fn execute_vendor(
    path: Option<PathBuf>,
    format: OutputFormat,
    accept_terms: bool,
) -> Result<()> {
    disclaimer::require_confirmation(accept_terms)?;
    let magento_root = config::resolve_magento_root(path.as_deref())?;

    if format == OutputFormat::Text {
        ui::print_info("Scanning vendor for row_id references...");
        println!();
    }

    let results = scan_directory(&magento_root.join("vendor"), VENDOR_EXCLUDES);

    match format {
        OutputFormat::Text => {
            display_results("Third-Party Extensions (vendor/)", &results);
            display_single_summary(&results, "vendor");
        }
        _ => print_machine_readable(&results, format)?,
    }
    Ok(())
}

fn print_machine_readable(references: &[RowIdReference], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", render_json(references)?),
        _ => println!("{}", render_markdown(references)),
    }
    Ok(())
}

fn display_results(title: &str, references: &[RowIdReference]) {
    println!("┌{}┐", "─".repeat(64));
    println!("│  {:<62}│", title);
    println!("└{}┘", "─".repeat(64));
    println!();

    if references.is_empty() {
        println!("  {} No row_id references found", "✓".green());
        println!();
        return;
    }

    for (extension, refs) in group_by_extension(references) {
        println!(
            "{} {} ({} {})",
            "⚠".yellow(),
            extension,
            refs.len(),
            plural(refs.len(), "reference", "references")
        );
        for reference in refs {
            println!("   → {}:{}", relative_path(reference), reference.line_number);
            println!("     {}", reference.line_content.dimmed());
        }
        println!();
    }
}

fn display_summary(custom: &[RowIdReference], vendor: &[RowIdReference]) {
    println!("{}", "─".repeat(64));

    let total = custom.len() + vendor.len();
    let custom_extensions = group_by_extension(custom).len();
    let vendor_extensions = group_by_extension(vendor).len();

    if total == 0 {
        ui::print_success("No row_id references found. Your codebase appears ready for CE.");
        return;
    }

    println!(
        "Summary: {} references found in {} extensions",
        total,
        custom_extensions + vendor_extensions
    );
    if custom_extensions > 0 {
        println!(
            "  • {} custom {} in app/code (requires modification)",
            custom_extensions,
            plural(custom_extensions, "extension", "extensions")
        );
    }
    if vendor_extensions > 0 {
        println!(
            "  • {} third-party {} in vendor/ (may need CE version)",
            vendor_extensions,
            plural(vendor_extensions, "extension", "extensions")
        );
    }
}

fn display_single_summary(references: &[RowIdReference], location: &str) {
    println!("{}", "─".repeat(64));

    let extensions = group_by_extension(references).len();
    if references.is_empty() {
        ui::print_success(&format!("No row_id references found in {}.", location));
        return;
    }

    println!(
        "Summary: {} {} found in {} {}",
        references.len(),
        plural(references.len(), "reference", "references"),
        extensions,
        plural(extensions, "extension", "extensions")
    );
}

fn plural<'a>(count: usize, one: &'a str, many: &'a str) -> &'a str {
    if count == 1 {
        one
    } else {
        many
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_flags() {
        assert_eq!(OutputFormat::from_flags(false, false), OutputFormat::Text);
        assert_eq!(OutputFormat::from_flags(true, false), OutputFormat::Json);
        assert_eq!(OutputFormat::from_flags(false, true), OutputFormat::Markdown);
        assert_eq!(OutputFormat::from_flags(true, true), OutputFormat::Json);
    }

    #[test]
    fn test_plural() {
        assert_eq!(plural(1, "reference", "references"), "reference");
        assert_eq!(plural(0, "reference", "references"), "references");
        assert_eq!(plural(3, "extension", "extensions"), "extensions");
    }
}
