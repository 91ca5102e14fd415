//! CSV serialization of issues.
//!
//! Handles proper escaping of fields containing commas, quotes, or
//! newlines. Tags render as a single comma-joined field, not as multiple
//! columns.

use crate::error::Result;
use crate::model::{Issue, join_tags};
use crate::util::time::SQL_DATETIME_FORMAT;
use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/// Column order for every export, matching the entity's field declaration
/// order.
pub const FIELDS: &[&str] = &[
    "id",
    "title",
    "description",
    "status",
    "resolution",
    "tags",
    "created_at",
    "updated_at",
];

/// Escape a CSV field value.
///
/// Wraps in double quotes if the value contains commas, quotes, or
/// newlines. Doubles any existing quotes within the value.
#[must_use]
pub fn escape_field(value: &str) -> String {
    let needs_quoting = value.contains(',')
        || value.contains('"')
        || value.contains('\n')
        || value.contains('\r');

    if needs_quoting {
        let escaped = value.replace('"', "\"\"");
        format!("\"{escaped}\"")
    } else {
        value.to_string()
    }
}

fn header_line() -> String {
    format!("{}\n", FIELDS.join(","))
}

fn issue_line(issue: &Issue) -> String {
    let columns = [
        issue.id.to_string(),
        escape_field(&issue.title),
        escape_field(&issue.description),
        issue.status.as_str().to_string(),
        escape_field(issue.resolution.as_deref().unwrap_or("")),
        escape_field(&join_tags(&issue.tags)),
        issue.created_at.format(SQL_DATETIME_FORMAT).to_string(),
        issue.updated_at.format(SQL_DATETIME_FORMAT).to_string(),
    ];
    format!("{}\n", columns.join(","))
}

/// Write issues to `path` with a header row, replacing any existing file.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn write_issues(path: &Path, issues: &[Issue]) -> Result<()> {
    let mut out = String::from(header_line());
    for issue in issues {
        out.push_str(&issue_line(issue));
    }
    std::fs::write(path, out)?;
    Ok(())
}

/// Write issues to `path`, deduplicated by id.
///
/// The first occurrence of each id wins, so no id appears twice even when
/// the caller supplies duplicates.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn write_unique(path: &Path, issues: &[Issue]) -> Result<()> {
    let mut seen = HashSet::new();
    let unique: Vec<Issue> = issues
        .iter()
        .filter(|issue| seen.insert(issue.id))
        .cloned()
        .collect();
    write_issues(path, &unique)
}

/// Append a single issue to an append-only log file.
///
/// The header row is written only when the file does not exist yet; an
/// existing log is never overwritten.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or written.
pub fn append_issue(path: &Path, issue: &Issue) -> Result<()> {
    let fresh = !path.exists();
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    if fresh {
        file.write_all(header_line().as_bytes())?;
    }
    file.write_all(issue_line(issue).as_bytes())?;
    Ok(())
}
