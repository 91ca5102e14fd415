//! Error types and handling for `tracklite`.
//!
//! # Design
//!
//! - Uses `thiserror` for derive-based error types
//! - Internal code returns `Result<T, TrackerError>` so tests can assert on
//!   specific failure causes
//! - The public repository/maintenance boundary flattens errors to the
//!   documented sentinel values (false, -1, empty sequence, `None`) after
//!   logging, so callers never see a raw engine fault

use std::path::PathBuf;
use thiserror::Error;

/// Primary error type for `tracklite` operations.
#[derive(Error, Debug)]
pub enum TrackerError {
    // === Storage Errors ===
    /// Database file not found at the specified path.
    #[error("Database not found at '{path}'")]
    DatabaseNotFound { path: PathBuf },

    /// `SQLite` database error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    // === Issue Errors ===
    /// Issue with the specified ID was not found.
    #[error("Issue not found: {id}")]
    IssueNotFound { id: i64 },

    /// Invalid status value.
    #[error("Invalid status: {status}")]
    InvalidStatus { status: String },

    // === Lifecycle Errors ===
    /// The requested status transition is not allowed.
    #[error("Illegal transition: {from} -> {to}")]
    IllegalTransition { from: String, to: String },

    /// Archived records accept no further edits.
    #[error("Issue {id} is archived and can no longer be modified")]
    ArchivedImmutable { id: i64 },

    /// Only open issues may be deleted.
    #[error("Issue {id} is {status}; only open issues can be deleted")]
    DeleteNotOpen { id: i64, status: String },

    /// Only resolved issues may be archived.
    #[error("Issue {id} is {status}; only resolved issues can be archived")]
    ArchiveNotResolved { id: i64, status: String },

    /// The cap on non-archived issues has been reached.
    #[error("Issue limit reached ({limit} active issues); resolve or archive something first")]
    IssueLimitReached { limit: usize },

    // === Validation Errors ===
    /// Field validation failed.
    #[error("Validation failed: {field}: {reason}")]
    Validation { field: String, reason: String },

    // === I/O Errors ===
    /// File system I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TrackerError {
    /// Create a validation error for a specific field.
    #[must_use]
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// True for guard rejections that leave state unchanged and should be
    /// shown to the operator as a plain reason string.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::IllegalTransition { .. }
                | Self::ArchivedImmutable { .. }
                | Self::DeleteNotOpen { .. }
                | Self::ArchiveNotResolved { .. }
                | Self::IssueLimitReached { .. }
                | Self::IssueNotFound { .. }
        )
    }
}

/// Result type using `TrackerError`.
pub type Result<T> = std::result::Result<T, TrackerError>;
