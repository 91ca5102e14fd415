//! Runtime configuration for `tracklite`.
//!
//! The original tool hard-coded its paths and field limits at module level,
//! with different revisions disagreeing on the values (70 vs 100 char
//! titles, 3 vs 5 tags). Here the whole set is an explicit struct handed to
//! the store and maintenance components at construction time, so one build
//! serves every deployment variant.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Field-length and tag-count limits applied at the write boundary.
///
/// Over-length strings are truncated with an ellipsis, never rejected;
/// excess tags are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    /// Maximum title length in characters.
    pub title: usize,
    /// Maximum description length in characters.
    pub description: usize,
    /// Maximum resolution length in characters.
    pub resolution: usize,
    /// Maximum number of tags kept per issue.
    pub max_tags: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            title: 140,
            description: 140,
            resolution: 140,
            max_tags: 5,
        }
    }
}

/// Tracker configuration: store location, maintenance paths, and limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Path of the SQLite database file.
    pub db_path: PathBuf,
    /// Directory where timestamped backups are written.
    pub backup_dir: PathBuf,
    /// Append-only CSV log that archived issues are exported to.
    pub archive_log: PathBuf,
    /// Field limits enforced on every write.
    pub limits: Limits,
    /// Cap on non-archived issues; new creates are rejected at the cap.
    pub max_active: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("data/issues.db"),
            backup_dir: PathBuf::from("backups"),
            archive_log: PathBuf::from("issue_archives.csv"),
            limits: Limits::default(),
            max_active: 7,
        }
    }
}

impl Config {
    /// Configuration rooted at a directory, keeping the default file names.
    #[must_use]
    pub fn rooted_at(dir: &Path) -> Self {
        Self {
            db_path: dir.join("data").join("issues.db"),
            backup_dir: dir.join("backups"),
            archive_log: dir.join("issue_archives.csv"),
            ..Self::default()
        }
    }

    /// Replace the limit set.
    #[must_use]
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Replace the active-issue cap.
    #[must_use]
    pub fn with_max_active(mut self, max_active: usize) -> Self {
        self.max_active = max_active;
        self
    }
}
