//! Schema creation, additive migration, and the optional full-text index.

use crate::config::Limits;
use crate::error::Result;
use crate::storage::sqlite::Store;
use crate::validation::truncate_with_ellipsis;
use rusqlite::Connection;
use std::fmt::Write as _;

/// DDL for a fresh store.
pub const SCHEMA_SQL: &str = "
    CREATE TABLE IF NOT EXISTS issues (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        description TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'Open',
        resolution TEXT,
        tags TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    );
";

/// Supporting indexes, (re)created on every startup.
pub const INDEX_SQL: &str = "
    CREATE INDEX IF NOT EXISTS idx_issues_status ON issues(status);
    CREATE INDEX IF NOT EXISTS idx_issues_created_at ON issues(created_at);
";

/// Shadow full-text index over title/description, kept in sync by
/// triggers, with a backfill of existing rows.
const FTS_SQL: &str = "
    CREATE VIRTUAL TABLE IF NOT EXISTS issues_fts USING fts5(
        title, description, content='issues', content_rowid='id'
    );

    CREATE TRIGGER IF NOT EXISTS issues_ai AFTER INSERT ON issues BEGIN
        INSERT INTO issues_fts(rowid, title, description)
        VALUES (new.id, new.title, new.description);
    END;

    CREATE TRIGGER IF NOT EXISTS issues_ad AFTER DELETE ON issues BEGIN
        INSERT INTO issues_fts(issues_fts, rowid, title, description)
        VALUES('delete', old.id, old.title, old.description);
    END;

    CREATE TRIGGER IF NOT EXISTS issues_au AFTER UPDATE ON issues BEGIN
        INSERT INTO issues_fts(issues_fts, rowid, title, description)
        VALUES('delete', old.id, old.title, old.description);
        INSERT INTO issues_fts(rowid, title, description)
        VALUES (new.id, new.title, new.description);
    END;

    INSERT INTO issues_fts(rowid, title, description)
    SELECT id, title, description FROM issues;
";

fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let exists = conn
        .prepare("SELECT 1 FROM sqlite_master WHERE type='table' AND name=?")?
        .exists([name])?;
    Ok(exists)
}

fn column_exists(conn: &Connection, table: &str, column: &str) -> Result<bool> {
    let sql = format!("SELECT 1 FROM pragma_table_info('{table}') WHERE name=?");
    let exists = conn.prepare(&sql)?.exists([column])?;
    Ok(exists)
}

/// Make the issues table and its indexes exist, exactly once per fresh
/// store, and bring an older store forward.
///
/// On an existing store the only migration is additive: the `resolution`
/// column is added if missing. Idempotent.
///
/// # Errors
///
/// Returns an error if any DDL statement fails.
pub fn ensure_schema(conn: &Connection) -> Result<()> {
    if table_exists(conn, "issues")? {
        if !column_exists(conn, "issues", "resolution")? {
            conn.execute("ALTER TABLE issues ADD COLUMN resolution TEXT", [])?;
            tracing::info!("added resolution column to issues table");
        }
    } else {
        conn.execute_batch(SCHEMA_SQL)?;
        tracing::info!("created issues table");
    }

    conn.execute_batch(INDEX_SQL)?;
    Ok(())
}

/// Retroactively truncate stored fields that exceed the current limits.
///
/// Each row gets exactly the columns that need it updated, or is left
/// untouched; the whole pass runs in one transaction and is idempotent.
/// Returns the number of rows changed.
///
/// # Errors
///
/// Returns an error if reading or updating rows fails; no partial state
/// is left behind.
pub fn migrate_oversized_data(store: &mut Store, limits: &Limits) -> Result<usize> {
    let limits = *limits;
    let changed = store.with_tx(|tx| {
        let mut stmt =
            tx.prepare("SELECT id, title, description, resolution FROM issues")?;
        let rows: Vec<(i64, String, String, Option<String>)> = stmt
            .query_map([], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut changed = 0;
        for (id, title, description, resolution) in rows {
            let mut set_clauses: Vec<&str> = Vec::new();
            let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

            if title.chars().count() > limits.title {
                set_clauses.push("title = ?");
                params.push(Box::new(truncate_with_ellipsis(&title, limits.title)));
            }
            if description.chars().count() > limits.description {
                set_clauses.push("description = ?");
                params.push(Box::new(truncate_with_ellipsis(
                    &description,
                    limits.description,
                )));
            }
            if let Some(resolution) = resolution {
                if resolution.chars().count() > limits.resolution {
                    set_clauses.push("resolution = ?");
                    params.push(Box::new(truncate_with_ellipsis(
                        &resolution,
                        limits.resolution,
                    )));
                }
            }

            if set_clauses.is_empty() {
                continue;
            }

            let mut sql = String::from("UPDATE issues SET ");
            let _ = write!(sql, "{} WHERE id = ?", set_clauses.join(", "));
            params.push(Box::new(id));

            let param_refs: Vec<&dyn rusqlite::ToSql> =
                params.iter().map(AsRef::as_ref).collect();
            tx.execute(&sql, param_refs.as_slice())?;
            changed += 1;
        }
        Ok(changed)
    })?;

    if changed > 0 {
        tracing::info!(changed, "truncated oversized rows to current limits");
    }
    Ok(changed)
}

/// Build the shadow full-text index if the engine supports it.
///
/// Missing FTS support is non-fatal: the failure is logged, false is
/// returned, and keyword search falls back to substring matching.
pub fn enable_full_text_index(store: &mut Store) -> bool {
    let already = match table_exists(store.connection(), "issues_fts") {
        Ok(exists) => exists,
        Err(e) => {
            tracing::warn!(error = %e, "could not probe for full-text index");
            return false;
        }
    };
    if already {
        return true;
    }

    match store.execute_script(FTS_SQL) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "full-text index unavailable");
            false
        }
    }
}
