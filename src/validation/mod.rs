//! Write-boundary normalization for `tracklite`.
//!
//! Constraint violations are never surfaced as errors: over-length fields
//! are truncated with an ellipsis marker and excess tags are dropped. Each
//! normalization produces a human-readable notice the presentation layer
//! may display.

use crate::config::Limits;
use crate::model::NewIssue;

/// The three-character marker appended to truncated fields.
pub const ELLIPSIS: &str = "...";

/// Cut an over-length string to `limit - 3` characters plus the ellipsis
/// marker; strings within the limit are returned unchanged.
///
/// Lengths are counted in characters, matching the application-level
/// constraint rather than the byte length.
#[must_use]
pub fn truncate_with_ellipsis(value: &str, limit: usize) -> String {
    if value.chars().count() <= limit {
        return value.to_string();
    }
    if limit <= ELLIPSIS.len() {
        return ELLIPSIS.chars().take(limit).collect();
    }
    let kept: String = value.chars().take(limit - ELLIPSIS.len()).collect();
    format!("{kept}{ELLIPSIS}")
}

/// Keep the first `max_tags` tags, order preserved.
#[must_use]
pub fn clamp_tags(tags: &[String], max_tags: usize) -> Vec<String> {
    tags.iter().take(max_tags).cloned().collect()
}

/// Normalize a create payload in place, returning notices for every field
/// that was adjusted.
pub fn normalize_new_issue(draft: &mut NewIssue, limits: &Limits) -> Vec<String> {
    let mut notices = Vec::new();

    if draft.title.chars().count() > limits.title {
        draft.title = truncate_with_ellipsis(&draft.title, limits.title);
        notices.push(format!("title truncated to {} characters", limits.title));
    }
    if draft.description.chars().count() > limits.description {
        draft.description = truncate_with_ellipsis(&draft.description, limits.description);
        notices.push(format!(
            "description truncated to {} characters",
            limits.description
        ));
    }
    if let Some(resolution) = draft.resolution.as_ref() {
        if resolution.chars().count() > limits.resolution {
            draft.resolution = Some(truncate_with_ellipsis(resolution, limits.resolution));
            notices.push(format!(
                "resolution truncated to {} characters",
                limits.resolution
            ));
        }
    }
    if draft.tags.len() > limits.max_tags {
        draft.tags = clamp_tags(&draft.tags, limits.max_tags);
        notices.push(format!("tags limited to the first {}", limits.max_tags));
    }

    notices
}
