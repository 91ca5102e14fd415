//! Persistence layer: record store, schema management, repository, and
//! maintenance operations.

pub mod maintenance;
pub mod schema;
pub mod sqlite;

pub use maintenance::{DbStats, Maintenance};
pub use sqlite::{IssueRepository, Store};
