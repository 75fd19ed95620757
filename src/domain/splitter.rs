//! SQL statement splitting
//!
//! Splits a migration script into executable statements the way the mysql
//! client does: `;` ends a statement unless a `DELIMITER` line has switched
//! to another terminator (typically `$$` around trigger and routine bodies).

use regex::Regex;
use std::sync::OnceLock;

const DEFAULT_DELIMITER: &str = ";";

fn delimiter_directive() -> &'static Regex {
    static DIRECTIVE: OnceLock<Regex> = OnceLock::new();
    DIRECTIVE.get_or_init(|| {
        Regex::new(r"(?i)^DELIMITER\s+(\S+)\s*$").expect("valid DELIMITER regex")
    })
}

/// Split SQL text into non-empty statements, without their trailing delimiter.
///
/// A delimiter change only applies to text buffered after the last emitted
/// statement; anything left unterminated at the end is emitted as-is.
pub fn split_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut delimiter = DEFAULT_DELIMITER.to_string();
    let mut buffer = String::new();

    for line in sql.split('\n') {
        if let Some(caps) = delimiter_directive().captures(line.trim()) {
            delimiter = caps[1].to_string();
            continue;
        }

        buffer.push_str(line);
        buffer.push('\n');

        let trimmed = buffer.trim_end();
        if let Some(statement) = trimmed.strip_suffix(delimiter.as_str()) {
            let statement = statement.trim();
            if !statement.is_empty() {
                statements.push(statement.to_string());
            }
            buffer.clear();
        }
    }

    let remaining = buffer.trim();
    if !remaining.is_empty() {
        statements.push(remaining.to_string());
    }

    statements
}
