//! Core data types for `tracklite`.
//!
//! This module defines the fundamental types used throughout the crate:
//! - `Issue` - The tracked record
//! - `Status` - Issue lifecycle states
//! - `NewIssue` - Payload for creating a record
//! - `IssueUpdate` - Partial-field update payload

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Issue lifecycle status.
///
/// `Archived` is terminal: no outgoing transitions and no further edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Status {
    #[default]
    Open,
    #[serde(rename = "In Progress")]
    InProgress,
    Resolved,
    Archived,
}

impl Status {
    /// Canonical stored/display form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::InProgress => "In Progress",
            Self::Resolved => "Resolved",
            Self::Archived => "Archived",
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Archived)
    }

    /// States that count against the active-issue cap.
    #[must_use]
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Archived)
    }

    /// Whether a record may move from `self` to `to`.
    ///
    /// Open, InProgress and Resolved move freely between one another;
    /// only Resolved may enter Archived; Archived has no exits.
    #[must_use]
    pub const fn can_transition_to(self, to: Self) -> bool {
        match self {
            Self::Open | Self::InProgress => !matches!(to, Self::Archived),
            Self::Resolved => true,
            Self::Archived => false,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Status {
    type Err = crate::error::TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "in progress" | "in_progress" | "inprogress" => Ok(Self::InProgress),
            "resolved" => Ok(Self::Resolved),
            "archived" => Ok(Self::Archived),
            other => Err(crate::error::TrackerError::InvalidStatus {
                status: other.to_string(),
            }),
        }
    }
}

/// The tracked record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Issue {
    /// Store-assigned id, immutable once assigned.
    pub id: i64,

    /// Title, non-empty, bounded by `Limits::title`.
    pub title: String,

    /// Description, non-empty, bounded by `Limits::description`.
    pub description: String,

    /// Workflow status.
    #[serde(default)]
    pub status: Status,

    /// Resolution note; meaningful once Resolved or Archived.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,

    /// Free-form tags, order preserved, bounded by `Limits::max_tags`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Creation timestamp, set once.
    pub created_at: DateTime<Utc>,

    /// Last update timestamp, refreshed on every successful write.
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a record. Field limits are applied on write.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewIssue {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub resolution: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl NewIssue {
    #[must_use]
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }
}

/// Partial update: `None` fields keep their current value.
#[derive(Debug, Clone, Default)]
pub struct IssueUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<Status>,
    pub resolution: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl IssueUpdate {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.resolution.is_none()
            && self.tags.is_none()
    }
}

/// Join tags into the single stored column value.
///
/// Comma-space separated, order preserved; no escaping (tags are short
/// free-form words in this system).
#[must_use]
pub fn join_tags(tags: &[String]) -> String {
    tags.join(", ")
}

/// Split a stored tag column back into the tag sequence.
#[must_use]
pub fn split_tags(raw: &str) -> Vec<String> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_roundtrip_strings() {
        for s in [
            Status::Open,
            Status::InProgress,
            Status::Resolved,
            Status::Archived,
        ] {
            assert_eq!(s.as_str().parse::<Status>().unwrap(), s);
        }
        assert_eq!("in_progress".parse::<Status>().unwrap(), Status::InProgress);
        assert!("done".parse::<Status>().is_err());
    }

    #[test]
    fn archived_is_terminal() {
        assert!(!Status::Archived.can_transition_to(Status::Open));
        assert!(!Status::Archived.can_transition_to(Status::Resolved));
        assert!(Status::Archived.is_terminal());
        assert!(!Status::Archived.is_active());
    }

    #[test]
    fn only_resolved_enters_archived() {
        assert!(Status::Resolved.can_transition_to(Status::Archived));
        assert!(!Status::Open.can_transition_to(Status::Archived));
        assert!(!Status::InProgress.can_transition_to(Status::Archived));
    }

    #[test]
    fn working_states_move_freely() {
        assert!(Status::Open.can_transition_to(Status::InProgress));
        assert!(Status::Open.can_transition_to(Status::Resolved));
        assert!(Status::InProgress.can_transition_to(Status::Open));
        assert!(Status::Resolved.can_transition_to(Status::InProgress));
        assert!(Status::Resolved.can_transition_to(Status::Open));
    }

    #[test]
    fn tags_roundtrip_preserves_order() {
        let tags = vec!["ui".to_string(), "backend".to_string(), "p1".to_string()];
        assert_eq!(join_tags(&tags), "ui, backend, p1");
        assert_eq!(split_tags("ui, backend, p1"), tags);
        assert!(split_tags("").is_empty());
        assert!(split_tags("   ").is_empty());
    }

    #[test]
    fn status_serde_uses_display_form() {
        let json = serde_json::to_string(&Status::InProgress).unwrap();
        assert_eq!(json, "\"In Progress\"");
        let back: Status = serde_json::from_str("\"In Progress\"").unwrap();
        assert_eq!(back, Status::InProgress);
    }

    #[test]
    fn issue_serialization_skips_empty_relations() {
        let issue = Issue {
            id: 1,
            title: "Leaky faucet".to_string(),
            description: "Kitchen sink drips".to_string(),
            status: Status::Open,
            resolution: None,
            tags: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_string(&issue).unwrap();
        assert!(json.contains("\"status\":\"Open\""));
        assert!(!json.contains("resolution"));
        assert!(!json.contains("tags"));
    }
}
