//! `SQLite` record store and issue repository.
//!
//! `Store` owns the connection and exposes the transactional primitives;
//! `IssueRepository` is the only code path that translates between stored
//! rows and `Issue` values. Repository operations follow the documented
//! sentinel contract at the public boundary (false, -1, empty sequence,
//! `None`) over internal `Result`-returning `try_*` methods: engine faults
//! are logged here and never escape as unhandled errors.

use crate::config::{Config, Limits};
use crate::error::Result;
use crate::model::{Issue, IssueUpdate, NewIssue, Status, join_tags, split_tags};
use crate::storage::schema;
use crate::util::time::parse_datetime;
use crate::validation::{normalize_new_issue, truncate_with_ellipsis};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::path::Path;
use std::str::FromStr;

/// Columns selected for every issue read, in entity declaration order.
const ISSUE_COLUMNS: &str = "id, title, description, status, resolution, tags, created_at, updated_at";

/// SQLite-backed record store.
#[derive(Debug)]
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open the store at the given path, creating the parent directory if
    /// needed, and apply pragmas and schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created, the connection
    /// cannot be established, or schema application fails. These are the
    /// fatal startup conditions that must not be swallowed.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Self::apply_pragmas(&conn)?;
        schema::ensure_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Open an in-memory store for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema
    /// application fails.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::apply_pragmas(&conn)?;
        schema::ensure_schema(&conn)?;
        Ok(Self { conn })
    }

    fn apply_pragmas(conn: &Connection) -> Result<()> {
        // WAL lets a concurrent reader proceed while one writer commits;
        // NORMAL durability is the accepted safety/speed balance here.
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "cache_size", -10_000)?;
        conn.pragma_update(None, "temp_store", "MEMORY")?;
        Ok(())
    }

    pub(crate) const fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Run `f` inside a transaction that commits on success and rolls back
    /// on any error path.
    ///
    /// # Errors
    ///
    /// Returns the error produced by `f` or by commit; the transaction is
    /// rolled back when dropped without committing.
    pub fn with_tx<F, R>(&mut self, f: F) -> Result<R>
    where
        F: FnOnce(&Transaction) -> Result<R>,
    {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let result = f(&tx)?;
        tx.commit()?;
        Ok(result)
    }

    /// Execute a read statement and collect the mapped rows.
    ///
    /// # Errors
    ///
    /// Returns an error if preparation, execution, or row mapping fails.
    pub fn query<T, P, F>(&self, sql: &str, params: P, f: F) -> Result<Vec<T>>
    where
        P: rusqlite::Params,
        F: FnMut(&rusqlite::Row<'_>) -> rusqlite::Result<T>,
    {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, f)?.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Execute a single write statement transactionally, returning the
    /// affected row count.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement fails; nothing is applied.
    pub fn execute<P: rusqlite::Params>(&mut self, sql: &str, params: P) -> Result<usize> {
        self.with_tx(|tx| Ok(tx.execute(sql, params)?))
    }

    /// Execute an insert statement and return the new row id.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn execute_insert<P: rusqlite::Params>(&mut self, sql: &str, params: P) -> Result<i64> {
        self.with_tx(|tx| {
            tx.execute(sql, params)?;
            Ok(tx.last_insert_rowid())
        })
    }

    /// Execute one statement for each parameter set, all rows applied
    /// atomically or none.
    ///
    /// # Errors
    ///
    /// Returns an error if any execution fails; the transaction rolls back.
    pub fn execute_many<P>(&mut self, sql: &str, params_list: Vec<P>) -> Result<usize>
    where
        P: rusqlite::Params,
    {
        self.with_tx(|tx| {
            let mut stmt = tx.prepare(sql)?;
            let mut applied = 0;
            for params in params_list {
                applied += stmt.execute(params)?;
            }
            Ok(applied)
        })
    }

    /// Run a multi-statement script atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if any statement fails; the transaction rolls back.
    pub fn execute_script(&mut self, sql: &str) -> Result<()> {
        self.with_tx(|tx| {
            tx.execute_batch(sql)?;
            Ok(())
        })
    }
}

/// Map a selected row (in `ISSUE_COLUMNS` order) to an `Issue`.
pub(crate) fn issue_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Issue> {
    let status_raw: String = row.get(3)?;
    let tags_raw: String = row.get::<_, Option<String>>(5)?.unwrap_or_default();
    let created_at: String = row.get(6)?;
    let updated_at: String = row.get(7)?;
    Ok(Issue {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        // Rows predating the normalized status strings default to Open.
        status: Status::from_str(&status_raw).unwrap_or_default(),
        resolution: row.get(4)?,
        tags: split_tags(&tags_raw),
        created_at: parse_datetime(&created_at),
        updated_at: parse_datetime(&updated_at),
    })
}

/// Escape LIKE wildcards so a keyword matches literally.
fn like_pattern(keyword: &str) -> String {
    let escaped = keyword
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Entity-level CRUD over the record store.
///
/// Every write applies truncate-with-ellipsis and tag clamping against the
/// configured limits before touching storage.
#[derive(Debug)]
pub struct IssueRepository {
    store: Store,
    limits: Limits,
}

impl IssueRepository {
    /// Open the repository over the configured store path.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be opened; this aborts startup
    /// rather than being flattened to a sentinel.
    pub fn open(config: &Config) -> Result<Self> {
        Ok(Self {
            store: Store::open(&config.db_path)?,
            limits: config.limits,
        })
    }

    /// Open an in-memory repository for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be opened.
    pub fn open_memory(limits: Limits) -> Result<Self> {
        Ok(Self {
            store: Store::open_memory()?,
            limits,
        })
    }

    #[must_use]
    pub const fn store(&self) -> &Store {
        &self.store
    }

    pub const fn store_mut(&mut self) -> &mut Store {
        &mut self.store
    }

    #[must_use]
    pub const fn limits(&self) -> &Limits {
        &self.limits
    }

    // === Result-returning core (used by the lifecycle layer and tests) ===

    pub(crate) fn try_create(&mut self, mut draft: NewIssue) -> Result<i64> {
        let notices = normalize_new_issue(&mut draft, &self.limits);
        for notice in &notices {
            tracing::debug!(notice = %notice, "normalized field on create");
        }
        self.store.execute_insert(
            "INSERT INTO issues (title, description, status, resolution, tags, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)",
            rusqlite::params![
                draft.title,
                draft.description,
                draft.status.as_str(),
                draft.resolution,
                join_tags(&draft.tags),
            ],
        )
    }

    pub(crate) fn try_get_by_id(&self, id: i64) -> Result<Option<Issue>> {
        let sql = format!("SELECT {ISSUE_COLUMNS} FROM issues WHERE id = ?");
        let mut stmt = self.store.conn.prepare(&sql)?;
        match stmt.query_row([id], issue_from_row) {
            Ok(issue) => Ok(Some(issue)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub(crate) fn try_get_all(&self) -> Result<Vec<Issue>> {
        let sql = format!(
            "SELECT {ISSUE_COLUMNS} FROM issues ORDER BY created_at DESC, id DESC"
        );
        self.store.query(&sql, [], issue_from_row)
    }

    pub(crate) fn try_get_by_status(&self, status: Status) -> Result<Vec<Issue>> {
        let sql = format!(
            "SELECT {ISSUE_COLUMNS} FROM issues WHERE status = ? ORDER BY created_at DESC, id DESC"
        );
        self.store.query(&sql, [status.as_str()], issue_from_row)
    }

    pub(crate) fn try_update(&mut self, id: i64, update: &IssueUpdate) -> Result<bool> {
        // Read-modify-write with no concurrency token; acceptable for the
        // single-user design (see crate docs).
        let Some(current) = self.try_get_by_id(id)? else {
            return Ok(false);
        };
        if update.is_empty() {
            return Ok(true);
        }

        let title = truncate_with_ellipsis(
            update.title.as_deref().unwrap_or(&current.title),
            self.limits.title,
        );
        let description = truncate_with_ellipsis(
            update.description.as_deref().unwrap_or(&current.description),
            self.limits.description,
        );
        let status = update.status.unwrap_or(current.status);
        let resolution = update
            .resolution
            .as_deref()
            .or(current.resolution.as_deref())
            .map(|r| truncate_with_ellipsis(r, self.limits.resolution));
        let tags = update.tags.as_deref().unwrap_or(&current.tags);
        let tags: Vec<String> = tags.iter().take(self.limits.max_tags).cloned().collect();

        self.store.execute(
            "UPDATE issues
             SET title = ?, description = ?, status = ?, resolution = ?, tags = ?,
                 updated_at = CURRENT_TIMESTAMP
             WHERE id = ?",
            rusqlite::params![
                title,
                description,
                status.as_str(),
                resolution,
                join_tags(&tags),
                id,
            ],
        )?;
        Ok(true)
    }

    pub(crate) fn try_delete(&mut self, id: i64) -> Result<bool> {
        let removed = self.store.execute("DELETE FROM issues WHERE id = ?", [id])?;
        Ok(removed > 0)
    }

    pub(crate) fn try_search(&self, keyword: &str) -> Result<Vec<Issue>> {
        let sql = format!(
            "SELECT {ISSUE_COLUMNS} FROM issues
             WHERE title LIKE ? ESCAPE '\\' OR description LIKE ? ESCAPE '\\'
             ORDER BY created_at DESC, id DESC"
        );
        let pattern = like_pattern(keyword);
        self.store
            .query(&sql, [&pattern, &pattern], issue_from_row)
    }

    pub(crate) fn try_full_text_search(&self, term: &str) -> Result<Vec<Issue>> {
        let sql = format!(
            "SELECT {} FROM issues i
             JOIN issues_fts fts ON i.id = fts.rowid
             WHERE issues_fts MATCH ?
             ORDER BY rank",
            ISSUE_COLUMNS
                .split(", ")
                .map(|c| format!("i.{c}"))
                .collect::<Vec<_>>()
                .join(", ")
        );
        self.store.query(&sql, [term], issue_from_row)
    }

    pub(crate) fn try_batch_create(&mut self, drafts: Vec<NewIssue>) -> Result<()> {
        let limits = self.limits;
        let mut normalized = Vec::with_capacity(drafts.len());
        for mut draft in drafts {
            normalize_new_issue(&mut draft, &limits);
            normalized.push(draft);
        }
        self.store.with_tx(|tx| {
            let mut stmt = tx.prepare(
                "INSERT INTO issues (title, description, status, resolution, tags, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)",
            )?;
            for draft in &normalized {
                stmt.execute(rusqlite::params![
                    draft.title,
                    draft.description,
                    draft.status.as_str(),
                    draft.resolution,
                    join_tags(&draft.tags),
                ])?;
            }
            Ok(())
        })
    }

    pub(crate) fn try_count_active(&self) -> Result<usize> {
        let counts: Vec<i64> = self.store.query(
            "SELECT COUNT(*) FROM issues WHERE status != ?",
            [Status::Archived.as_str()],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(counts.first().copied().unwrap_or(0)).unwrap_or(0))
    }

    // === Sentinel-based public boundary ===

    /// Create a record after applying field limits; returns the new id, or
    /// -1 if the insert fails.
    pub fn create(&mut self, draft: NewIssue) -> i64 {
        match self.try_create(draft) {
            Ok(id) => id,
            Err(e) => {
                tracing::error!(error = %e, "create failed");
                -1
            }
        }
    }

    /// Fetch a record by id; `None` if absent or on engine error.
    #[must_use]
    pub fn get_by_id(&self, id: i64) -> Option<Issue> {
        self.try_get_by_id(id).unwrap_or_else(|e| {
            tracing::error!(error = %e, id, "get_by_id failed");
            None
        })
    }

    /// All records, newest-created first; empty on engine error.
    #[must_use]
    pub fn get_all(&self) -> Vec<Issue> {
        self.try_get_all().unwrap_or_else(|e| {
            tracing::error!(error = %e, "get_all failed");
            Vec::new()
        })
    }

    /// Records with the given status, newest-created first; empty on engine
    /// error.
    #[must_use]
    pub fn get_by_status(&self, status: Status) -> Vec<Issue> {
        self.try_get_by_status(status).unwrap_or_else(|e| {
            tracing::error!(error = %e, status = status.as_str(), "get_by_status failed");
            Vec::new()
        })
    }

    /// Overlay the supplied fields onto the stored record, re-applying
    /// limits and stamping `updated_at`. False if the id does not exist or
    /// the write fails.
    pub fn update(&mut self, id: i64, update: &IssueUpdate) -> bool {
        self.try_update(id, update).unwrap_or_else(|e| {
            tracing::error!(error = %e, id, "update failed");
            false
        })
    }

    /// Remove the row unconditionally; true iff a row was actually removed.
    ///
    /// Lifecycle guards (delete only while Open) live in the calling layer.
    pub fn delete(&mut self, id: i64) -> bool {
        self.try_delete(id).unwrap_or_else(|e| {
            tracing::error!(error = %e, id, "delete failed");
            false
        })
    }

    /// Case-insensitive substring match against title or description,
    /// newest-created first; empty on engine error.
    #[must_use]
    pub fn search(&self, keyword: &str) -> Vec<Issue> {
        self.try_search(keyword).unwrap_or_else(|e| {
            tracing::error!(error = %e, "search failed");
            Vec::new()
        })
    }

    /// Ranked match against the shadow full-text index, falling back
    /// transparently to `search` when the index is missing or the engine
    /// rejects the term.
    #[must_use]
    pub fn full_text_search(&self, term: &str) -> Vec<Issue> {
        match self.try_full_text_search(term) {
            Ok(issues) => issues,
            Err(e) => {
                tracing::debug!(error = %e, "full-text search unavailable, using substring match");
                self.search(term)
            }
        }
    }

    /// Insert many records in one transaction; true iff all rows applied.
    /// No per-row id feedback.
    pub fn batch_create(&mut self, drafts: Vec<NewIssue>) -> bool {
        match self.try_batch_create(drafts) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(error = %e, "batch create failed");
                false
            }
        }
    }

    /// Count of non-archived records; 0 on engine error.
    #[must_use]
    pub fn count_active(&self) -> usize {
        self.try_count_active().unwrap_or_else(|e| {
            tracing::error!(error = %e, "count_active failed");
            0
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> IssueRepository {
        IssueRepository::open_memory(Limits::default()).unwrap()
    }

    #[test]
    fn create_then_get_roundtrip() {
        let mut repo = repo();
        let id = repo.create(
            NewIssue::new("Leaky faucet", "Kitchen sink drips")
                .with_tags(vec!["home".into(), "plumbing".into()]),
        );
        assert!(id > 0);

        let issue = repo.get_by_id(id).unwrap();
        assert_eq!(issue.title, "Leaky faucet");
        assert_eq!(issue.description, "Kitchen sink drips");
        assert_eq!(issue.status, Status::Open);
        assert_eq!(issue.tags, vec!["home".to_string(), "plumbing".to_string()]);
        assert_eq!(issue.created_at, issue.updated_at);
    }

    #[test]
    fn create_truncates_oversized_title() {
        let limits = Limits {
            title: 70,
            ..Limits::default()
        };
        let mut repo = IssueRepository::open_memory(limits).unwrap();
        let id = repo.create(NewIssue::new("x".repeat(80), "desc"));

        let issue = repo.get_by_id(id).unwrap();
        assert_eq!(issue.title.chars().count(), 70);
        assert!(issue.title.ends_with("..."));
    }

    #[test]
    fn create_drops_excess_tags() {
        let limits = Limits {
            max_tags: 3,
            ..Limits::default()
        };
        let mut repo = IssueRepository::open_memory(limits).unwrap();
        let tags: Vec<String> = ["a", "b", "c", "d", "e"]
            .iter()
            .map(ToString::to_string)
            .collect();
        let id = repo.create(NewIssue::new("t", "d").with_tags(tags.clone()));

        let issue = repo.get_by_id(id).unwrap();
        assert_eq!(issue.tags, tags[..3].to_vec());
    }

    #[test]
    fn get_by_id_absent_is_none() {
        let repo = repo();
        assert!(repo.get_by_id(999).is_none());
    }

    #[test]
    fn update_nonexistent_returns_false() {
        let mut repo = repo();
        let update = IssueUpdate {
            title: Some("new".into()),
            ..IssueUpdate::default()
        };
        assert!(!repo.update(999, &update));
        assert!(repo.get_all().is_empty());
    }

    #[test]
    fn update_overlays_only_supplied_fields() {
        let mut repo = repo();
        let id = repo.create(NewIssue::new("title", "description").with_tags(vec!["t".into()]));

        let update = IssueUpdate {
            description: Some("changed".into()),
            ..IssueUpdate::default()
        };
        assert!(repo.update(id, &update));

        let issue = repo.get_by_id(id).unwrap();
        assert_eq!(issue.title, "title");
        assert_eq!(issue.description, "changed");
        assert_eq!(issue.tags, vec!["t".to_string()]);
    }

    #[test]
    fn delete_removes_row() {
        let mut repo = repo();
        let id = repo.create(NewIssue::new("t", "d"));
        assert!(repo.delete(id));
        assert!(repo.get_by_id(id).is_none());
        assert!(!repo.delete(id));
    }

    #[test]
    fn get_all_is_newest_first() {
        let mut repo = repo();
        let first = repo.create(NewIssue::new("first", "d"));
        let second = repo.create(NewIssue::new("second", "d"));
        let all = repo.get_all();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, second);
        assert_eq!(all[1].id, first);
    }

    #[test]
    fn get_by_status_filters() {
        let mut repo = repo();
        repo.create(NewIssue::new("open one", "d"));
        let id = repo.create(NewIssue::new("resolved one", "d"));
        let update = IssueUpdate {
            status: Some(Status::Resolved),
            ..IssueUpdate::default()
        };
        repo.update(id, &update);

        let resolved = repo.get_by_status(Status::Resolved);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].id, id);
        assert_eq!(repo.get_by_status(Status::Open).len(), 1);
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let mut repo = repo();
        repo.create(NewIssue::new("Apple Pie", "dessert"));
        repo.create(NewIssue::new("Banana", "fruit"));

        let hits = repo.search("apple");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Apple Pie");

        // Description matches too.
        assert_eq!(repo.search("FRUIT").len(), 1);
        assert!(repo.search("cherry").is_empty());
    }

    #[test]
    fn search_treats_wildcards_literally() {
        let mut repo = repo();
        repo.create(NewIssue::new("100% done", "d"));
        repo.create(NewIssue::new("plain", "d"));
        assert_eq!(repo.search("100%").len(), 1);
        assert!(repo.search("%").len() <= 1);
    }

    #[test]
    fn full_text_search_falls_back_without_index() {
        let mut repo = repo();
        repo.create(NewIssue::new("Apple Pie", "dessert"));
        // No FTS index built: the fallback substring path must serve this.
        let hits = repo.full_text_search("apple");
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn full_text_search_uses_index_when_present() {
        let mut repo = repo();
        assert!(schema::enable_full_text_index(repo.store_mut()));
        repo.create(NewIssue::new("Apple Pie", "a dessert recipe"));
        repo.create(NewIssue::new("Banana", "fruit"));

        let hits = repo.full_text_search("dessert");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Apple Pie");
    }

    #[test]
    fn batch_create_inserts_all_rows() {
        let mut repo = repo();
        let drafts = vec![
            NewIssue::new("one", "d"),
            NewIssue::new("two", "d"),
            NewIssue::new("three", "d"),
        ];
        assert!(repo.batch_create(drafts));
        assert_eq!(repo.get_all().len(), 3);
    }

    #[test]
    fn count_active_excludes_archived() {
        let mut repo = repo();
        let a = repo.create(NewIssue::new("a", "d"));
        repo.create(NewIssue::new("b", "d"));
        let update = IssueUpdate {
            status: Some(Status::Archived),
            resolution: Some("done".into()),
            ..IssueUpdate::default()
        };
        repo.update(a, &update);
        assert_eq!(repo.count_active(), 1);
    }

    #[test]
    fn store_execute_many_is_atomic() {
        use rusqlite::types::Value;

        let mut store = Store::open_memory().unwrap();
        let rows = vec![
            vec![Value::from("ok".to_string()), Value::from("d".to_string())],
            // NOT NULL violation on title rolls the whole batch back.
            vec![Value::Null, Value::from("d".to_string())],
        ];
        let bad = store.execute_many(
            "INSERT INTO issues (title, description, status) VALUES (?, ?, 'Open')",
            rows.into_iter()
                .map(rusqlite::params_from_iter)
                .collect(),
        );
        assert!(bad.is_err());
        let rows: Vec<i64> = store
            .query("SELECT COUNT(*) FROM issues", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows[0], 0);
    }
}
