//! `row_id` reference scanner
//!
//! Custom and third-party PHP code written against EE often reads the
//! `row_id` column that CE does not have. The scanner walks a source tree
//! and reports every line that mentions it, attributed to an extension.

use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::debug;
use walkdir::WalkDir;

/// Core Magento packages under vendor/ are migrated by the SQL files
pub const VENDOR_EXCLUDES: &[&str] = &["*/magento/*", "*magento/*"];

fn row_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)['"]row_id['"]|->row_id\b"#).expect("row_id pattern is valid")
    })
}

/// One line that references `row_id`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowIdReference {
    pub file_path: PathBuf,
    /// 1-based
    pub line_number: usize,
    pub line_content: String,
    pub extension_name: String,
}

/// Scan every `.php` file under `dir`, skipping paths that match any of the
/// `excludes` glob patterns. A missing directory yields no references.
pub fn scan_directory(dir: &Path, excludes: &[&str]) -> Vec<RowIdReference> {
    if !dir.is_dir() {
        return Vec::new();
    }

    let base = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
    let patterns: Vec<glob::Pattern> = excludes
        .iter()
        .filter_map(|p| glob::Pattern::new(p).ok())
        .collect();

    let mut references = Vec::new();
    for entry in WalkDir::new(&base)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
    {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("php") {
            continue;
        }

        let path_text = path.to_string_lossy();
        if patterns.iter().any(|p| p.matches(&path_text)) {
            continue;
        }

        references.extend(scan_file(path, &base));
    }

    debug!(
        "Found {} row_id references under {}",
        references.len(),
        base.display()
    );
    references
}

fn scan_file(path: &Path, base: &Path) -> Vec<RowIdReference> {
    let Ok(bytes) = std::fs::read(path) else {
        return Vec::new();
    };
    let content = String::from_utf8_lossy(&bytes);
    let extension_name = extension_name(path, base);

    content
        .split('\n')
        .enumerate()
        .filter(|(_, line)| row_id_regex().is_match(line))
        .map(|(idx, line)| RowIdReference {
            file_path: path.to_path_buf(),
            line_number: idx + 1,
            line_content: line.trim().to_string(),
            extension_name: extension_name.clone(),
        })
        .collect()
}

/// `Vendor_Module` under app/code, `vendor-name/package` elsewhere
fn extension_name(path: &Path, base: &Path) -> String {
    let parts: Vec<String> = path
        .strip_prefix(base)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();

    match parts.as_slice() {
        [first, second, ..] if base.ends_with("app/code") => format!("{}_{}", first, second),
        [first, second, ..] => format!("{}/{}", first, second),
        [only] => only.clone(),
        [] => "unknown".to_string(),
    }
}

/// JSON / Markdown report entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    pub file: String,
    pub line: usize,
    pub extension: String,
}

/// One entry per file and line, first occurrence wins
pub fn deduplicate(references: &[RowIdReference]) -> Vec<ReportEntry> {
    let mut seen = HashSet::new();
    references
        .iter()
        .filter(|r| seen.insert((r.file_path.clone(), r.line_number)))
        .map(|r| ReportEntry {
            file: r.file_path.display().to_string(),
            line: r.line_number,
            extension: r.extension_name.clone(),
        })
        .collect()
}

/// References keyed by extension name, sorted
pub fn group_by_extension(references: &[RowIdReference]) -> BTreeMap<&str, Vec<&RowIdReference>> {
    let mut grouped: BTreeMap<&str, Vec<&RowIdReference>> = BTreeMap::new();
    for reference in references {
        grouped
            .entry(reference.extension_name.as_str())
            .or_default()
            .push(reference);
    }
    grouped
}

/// Path of the file inside its extension, falling back to the file name
pub fn relative_path(reference: &RowIdReference) -> String {
    let marker = match reference.extension_name.split_once('_') {
        Some((vendor, module)) => format!("/{}/{}/", vendor, module),
        None => format!("/{}/", reference.extension_name),
    };

    let full = reference.file_path.to_string_lossy();
    match full.find(&marker) {
        Some(pos) => full[pos + marker.len()..].to_string(),
        None => reference
            .file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
    }
}

pub fn render_json(references: &[RowIdReference]) -> Result<String, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    deduplicate(references).serialize(&mut serializer)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

pub fn render_markdown(references: &[RowIdReference]) -> String {
    let entries = deduplicate(references);
    if entries.is_empty() {
        return "No `row_id` references found.".to_string();
    }

    let mut out = String::from("# row_id References\n\n");
    out.push_str(&format!(
        "Found **{}** references that may need updating after EE to CE migration.\n\n",
        entries.len()
    ));
    out.push_str("| Extension | File | Line |\n");
    out.push_str("|-----------|------|------|\n");
    for entry in &entries {
        out.push_str(&format!(
            "| {} | `{}` | {} |\n",
            entry.extension, entry.file, entry.line
        ));
    }
    out.trim_end().to_string()
}
