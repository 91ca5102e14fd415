//! Status state machine guards.
//!
//! This is the calling layer the spec of record keeps between the
//! presentation shell and the repository: every transition is checked here
//! before the repository's update/delete runs, and archive carries its
//! append-only export side effect. Guard rejections are returned as
//! `TrackerError` values whose display text is the reason shown to the
//! operator; storage is left unchanged on rejection.
//!
//! Rules:
//! - Open, In Progress, and Resolved move freely between one another.
//! - Delete is permitted only while Open.
//! - Archive is permitted only from Resolved and appends the record to the
//!   archive log; Archived is terminal, no further edits.
//! - Entering Resolved without a resolution note stores a placeholder.

use crate::config::Config;
use crate::error::{Result, TrackerError};
use crate::format::csv;
use crate::model::{Issue, IssueUpdate, NewIssue, Status};
use crate::storage::IssueRepository;

/// Stored when a record is resolved without a resolution note.
pub const DEFAULT_RESOLUTION: &str = "No resolution provided";

/// Create a record, enforcing the required fields and the cap on
/// non-archived issues.
///
/// # Errors
///
/// Returns `Validation` for an empty title or description,
/// `IssueLimitReached` at the cap, or a storage error if the insert fails.
pub fn create(repo: &mut IssueRepository, config: &Config, draft: NewIssue) -> Result<i64> {
    if draft.title.trim().is_empty() {
        return Err(TrackerError::validation("title", "cannot be empty"));
    }
    if draft.description.trim().is_empty() {
        return Err(TrackerError::validation("description", "cannot be empty"));
    }

    let active = repo.try_count_active()?;
    if active >= config.max_active {
        return Err(TrackerError::IssueLimitReached {
            limit: config.max_active,
        });
    }
    repo.try_create(draft)
}

/// Apply a guarded edit, including status transitions.
///
/// Non-status fields overlay the stored record as in `IssueRepository::
/// update`. A status change is validated against the state machine;
/// entering Resolved without a note stores `DEFAULT_RESOLUTION`, and
/// entering Archived (legal only from Resolved) stamps the resolution if
/// unset and appends the archived record to the configured archive log.
///
/// # Errors
///
/// Returns `IssueNotFound`, `ArchivedImmutable`, `ArchiveNotResolved`, or
/// `IllegalTransition` without touching storage; storage errors pass
/// through.
pub fn edit(
    repo: &mut IssueRepository,
    config: &Config,
    id: i64,
    mut update: IssueUpdate,
) -> Result<()> {
    let current = repo
        .try_get_by_id(id)?
        .ok_or(TrackerError::IssueNotFound { id })?;

    if current.status == Status::Archived {
        return Err(TrackerError::ArchivedImmutable { id });
    }

    let mut archived = false;
    if let Some(next) = update.status {
        if next == Status::Archived && current.status != Status::Resolved {
            return Err(TrackerError::ArchiveNotResolved {
                id,
                status: current.status.as_str().to_string(),
            });
        }
        if !current.status.can_transition_to(next) {
            return Err(TrackerError::IllegalTransition {
                from: current.status.as_str().to_string(),
                to: next.as_str().to_string(),
            });
        }
        if matches!(next, Status::Resolved | Status::Archived)
            && update.resolution.is_none()
            && current.resolution.is_none()
        {
            update.resolution = Some(DEFAULT_RESOLUTION.to_string());
        }
        archived = next == Status::Archived;
    }

    if !repo.try_update(id, &update)? {
        return Err(TrackerError::IssueNotFound { id });
    }

    if archived {
        let issue = repo
            .try_get_by_id(id)?
            .ok_or(TrackerError::IssueNotFound { id })?;
        append_to_archive_log(config, &issue)?;
    }

    Ok(())
}

/// Move a record to a new status; thin wrapper over `edit`.
///
/// # Errors
///
/// Same contract as `edit`.
pub fn transition(
    repo: &mut IssueRepository,
    config: &Config,
    id: i64,
    to: Status,
    resolution: Option<String>,
) -> Result<()> {
    let update = IssueUpdate {
        status: Some(to),
        resolution,
        ..IssueUpdate::default()
    };
    edit(repo, config, id, update)
}

/// Archive a resolved record: terminal status plus one appended row in the
/// archive log.
///
/// # Errors
///
/// Returns `ArchiveNotResolved` unless the record is currently Resolved.
pub fn archive(repo: &mut IssueRepository, config: &Config, id: i64) -> Result<()> {
    transition(repo, config, id, Status::Archived, None)
}

/// Delete a record, permitted only while Open. Deletion is permanent and
/// immediate.
///
/// # Errors
///
/// Returns `DeleteNotOpen` for any other status, `IssueNotFound` if the id
/// does not exist.
pub fn delete(repo: &mut IssueRepository, id: i64) -> Result<()> {
    let current = repo
        .try_get_by_id(id)?
        .ok_or(TrackerError::IssueNotFound { id })?;

    if current.status != Status::Open {
        return Err(TrackerError::DeleteNotOpen {
            id,
            status: current.status.as_str().to_string(),
        });
    }

    if !repo.try_delete(id)? {
        return Err(TrackerError::IssueNotFound { id });
    }
    Ok(())
}

fn append_to_archive_log(config: &Config, issue: &Issue) -> Result<()> {
    csv::append_issue(&config.archive_log, issue)?;
    tracing::info!(id = issue.id, "archived record appended to archive log");
    Ok(())
}
