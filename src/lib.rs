//! `tracklite` - record lifecycle and persistence core for a single-user
//! issue tracker.
//!
//! The crate owns the entity model, the status state machine, the SQLite
//! record store (schema, migrations, optional full-text shadow index), and
//! the maintenance operations (backup/restore, vacuum, stats, CSV export).
//! The interactive shell that collects input and renders tables is an
//! external collaborator: it calls these operations and displays their
//! results, and nothing here performs process-wide side effects (no
//! logging subscriber, no ambient paths) - everything is driven by an
//! explicit [`Config`].
//!
//! # Example
//!
//! ```no_run
//! use tracklite::{Config, IssueRepository, NewIssue, Status, lifecycle};
//!
//! let config = Config::default();
//! let mut repo = IssueRepository::open(&config)?;
//!
//! let id = lifecycle::create(&mut repo, &config, NewIssue::new("Leaky faucet", "Kitchen sink drips"))?;
//! lifecycle::transition(&mut repo, &config, id, Status::Resolved, Some("Replaced washer".into()))?;
//! lifecycle::archive(&mut repo, &config, id)?;
//! # Ok::<(), tracklite::TrackerError>(())
//! ```
//!
//! # Concurrency
//!
//! Single user, single process, synchronous. The store opens with WAL so a
//! second process reading the file does not block the writer, but `update`
//! is a plain read-modify-write with no version token: concurrent external
//! writers can lose updates, an accepted limitation of the single-user
//! design. Backup and restore are not synchronized against writers either;
//! the caller serializes them.

pub mod config;
pub mod error;
pub mod format;
pub mod lifecycle;
pub mod model;
pub mod storage;
pub mod util;
pub mod validation;

pub use config::{Config, Limits};
pub use error::{Result, TrackerError};
pub use model::{Issue, IssueUpdate, NewIssue, Status};
pub use storage::{DbStats, IssueRepository, Maintenance, Store};
