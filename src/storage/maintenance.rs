//! Backup, restore, compaction, statistics, and CSV export.
//!
//! These operate directly against the record store and its file, not
//! through the repository. Backup and restore are whole-file copies and
//! are not synchronized against concurrent writers; the caller quiesces
//! access (in practice, the same single-threaded shell that serializes
//! everything else).

use crate::config::Config;
use crate::error::Result;
use crate::format::csv;
use crate::model::Issue;
use crate::storage::sqlite::{Store, issue_from_row};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Aggregate counts plus on-disk size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DbStats {
    pub total: u64,
    pub open: u64,
    pub closed: u64,
    pub size_kb: f64,
}

/// Maintenance operations over the configured store.
#[derive(Debug, Clone)]
pub struct Maintenance {
    config: Config,
}

impl Maintenance {
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }

    /// Copy the store file to a timestamped location under the backup
    /// directory. Returns the backup path, or `None` if the store file
    /// does not exist or the copy fails.
    #[must_use]
    pub fn backup(&self) -> Option<PathBuf> {
        match self.try_backup() {
            Ok(path) => Some(path),
            Err(crate::error::TrackerError::DatabaseNotFound { .. }) => None,
            Err(e) => {
                tracing::error!(error = %e, "backup failed");
                None
            }
        }
    }

    fn try_backup(&self) -> Result<PathBuf> {
        if !self.config.db_path.exists() {
            return Err(crate::error::TrackerError::DatabaseNotFound {
                path: self.config.db_path.clone(),
            });
        }
        std::fs::create_dir_all(&self.config.backup_dir)?;
        let timestamp = Local::now().format("%Y-%m-%d-%H-%M-%S");
        let backup_path = self
            .config
            .backup_dir
            .join(format!("issues_backup_{timestamp}.db"));
        std::fs::copy(&self.config.db_path, &backup_path)?;
        tracing::info!(path = %backup_path.display(), "backup written");
        Ok(backup_path)
    }

    /// Copy a backup file over the live store. False if the backup path
    /// does not exist or the copy fails. The caller must ensure no writer
    /// is active.
    pub fn restore(&self, backup_path: &Path) -> bool {
        if !backup_path.exists() {
            return false;
        }
        match self.try_restore(backup_path) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(error = %e, "restore failed");
                false
            }
        }
    }

    fn try_restore(&self, backup_path: &Path) -> Result<()> {
        if let Some(parent) = self.config.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::copy(backup_path, &self.config.db_path)?;
        tracing::info!(from = %backup_path.display(), "store restored from backup");
        Ok(())
    }

    /// Reclaim free space in the store file. False on engine error.
    pub fn optimize(&self, store: &mut Store) -> bool {
        // VACUUM cannot run inside a transaction.
        match store.connection().execute("VACUUM", []) {
            Ok(_) => true,
            Err(e) => {
                tracing::error!(error = %e, "vacuum failed");
                false
            }
        }
    }

    /// Aggregate counts and file size; the zeroed struct on any failure.
    #[must_use]
    pub fn stats(&self, store: &Store) -> DbStats {
        self.try_stats(store).unwrap_or_else(|e| {
            tracing::error!(error = %e, "stats failed");
            DbStats::default()
        })
    }

    fn try_stats(&self, store: &Store) -> Result<DbStats> {
        let count = |sql: &str| -> Result<u64> {
            let rows: Vec<i64> = store.query(sql, [], |row| row.get(0))?;
            Ok(u64::try_from(rows.first().copied().unwrap_or(0)).unwrap_or(0))
        };

        let total = count("SELECT COUNT(*) FROM issues")?;
        let open = count("SELECT COUNT(*) FROM issues WHERE status = 'Open'")?;
        let closed =
            count("SELECT COUNT(*) FROM issues WHERE status IN ('Resolved', 'Archived')")?;
        let size_kb = std::fs::metadata(&self.config.db_path)
            .map(|m| m.len() as f64 / 1024.0)
            .unwrap_or(0.0);

        Ok(DbStats {
            total,
            open,
            closed,
            size_kb,
        })
    }

    /// Serialize every record to a delimited file with a header row.
    /// False if there are zero records or the write fails.
    pub fn export_csv(&self, store: &Store, path: &Path) -> bool {
        match self.try_export_csv(store, path) {
            Ok(wrote) => wrote,
            Err(e) => {
                tracing::error!(error = %e, "csv export failed");
                false
            }
        }
    }

    fn try_export_csv(&self, store: &Store, path: &Path) -> Result<bool> {
        let issues: Vec<Issue> = store.query(
            "SELECT id, title, description, status, resolution, tags, created_at, updated_at
             FROM issues ORDER BY created_at DESC, id DESC",
            [],
            issue_from_row,
        )?;
        if issues.is_empty() {
            return Ok(false);
        }
        csv::write_issues(path, &issues)?;
        Ok(true)
    }
}
