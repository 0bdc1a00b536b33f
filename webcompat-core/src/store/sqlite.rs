use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rusqlite::types::ValueRef;
use rusqlite::{Connection, Row, params};
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::types::{CacheStats, CachedIssue, IssueRecord};

use super::IssueStore;
use super::schema;

/// SQLite-backed implementation of [`IssueStore`].
#[derive(Debug)]
pub struct SqliteIssueStore {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
}

impl SqliteIssueStore {
    /// Open (or create) a cache at the given path.
    pub fn open(path: &Path) -> crate::error::Result<Self> {
        if !path.exists() {
            warn!(path = %path.display(), "Issue cache not found, creating an empty one");
        }
        let conn = Connection::open(path).map_err(StoreError::Sqlite)?;
        let store = Self {
            conn: Mutex::new(conn),
            db_path: Some(path.to_path_buf()),
        };
        store.initialize()?;
        Ok(store)
    }

    /// Create an in-memory cache (for testing).
    pub fn in_memory() -> crate::error::Result<Self> {
        let conn = Connection::open_in_memory().map_err(StoreError::Sqlite)?;
        let store = Self {
            conn: Mutex::new(conn),
            db_path: None,
        };
        store.initialize()?;
        Ok(store)
    }

    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    fn initialize(&self) -> crate::error::Result<()> {
        let conn = self.conn.lock().expect("issue cache mutex poisoned");

        conn.execute_batch("PRAGMA synchronous = NORMAL;")
            .map_err(StoreError::Sqlite)?;
        // Silently ignored for in-memory databases.
        let _ = conn.execute_batch("PRAGMA journal_mode = WAL;");

        conn.execute_batch(schema::SCHEMA_SQL)
            .map_err(StoreError::Sqlite)?;
        conn.execute(
            "INSERT OR IGNORE INTO cache_meta (key, value) VALUES ('schema_version', ?1)",
            params![schema::SCHEMA_VERSION],
        )
        .map_err(StoreError::Sqlite)?;
        Ok(())
    }

    fn write_issue(conn: &Connection, issue: &CachedIssue) -> crate::error::Result<()> {
        let content = serde_json::to_string(&issue.raw).map_err(StoreError::Serialization)?;
        #[allow(clippy::cast_possible_wrap)]
        let number = issue.number as i64;
        conn.execute(
            schema::UPSERT_ISSUE_SQL,
            params![number, issue.updated_at, content],
        )
        .map_err(StoreError::Sqlite)?;
        Ok(())
    }
}

/// A projected column as text. Anything that is not a JSON string (null,
/// number, object) reads as absent and is left for the normalizer to judge.
fn text_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<String>> {
    Ok(match row.get_ref(idx)? {
        ValueRef::Text(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
        _ => None,
    })
}

#[async_trait::async_trait]
impl IssueStore for SqliteIssueStore {
    async fn watermark(&self) -> crate::error::Result<Option<String>> {
        let conn = self.conn.lock().expect("issue cache mutex poisoned");
        let watermark: Option<String> = conn
            .query_row(schema::WATERMARK_SQL, [], |row| row.get(0))
            .map_err(StoreError::Sqlite)?;
        Ok(watermark)
    }

    async fn upsert_issue(&self, issue: &CachedIssue) -> crate::error::Result<()> {
        let conn = self.conn.lock().expect("issue cache mutex poisoned");
        Self::write_issue(&conn, issue)
    }

    async fn upsert_issues_batch(&self, issues: &[CachedIssue]) -> crate::error::Result<usize> {
        let conn = self.conn.lock().expect("issue cache mutex poisoned");
        let tx = conn.unchecked_transaction().map_err(StoreError::Sqlite)?;
        for issue in issues {
            Self::write_issue(&tx, issue)?;
        }
        tx.commit().map_err(StoreError::Sqlite)?;
        Ok(issues.len())
    }

    async fn load_issues(&self) -> crate::error::Result<Vec<IssueRecord>> {
        let conn = self.conn.lock().expect("issue cache mutex poisoned");

        let invalid: i64 = conn
            .query_row(schema::INVALID_ROWS_SQL, [], |row| row.get(0))
            .map_err(StoreError::Sqlite)?;
        if invalid > 0 {
            warn!(rows = invalid, "Skipping cached issues whose content is not valid JSON");
        }

        let mut stmt = conn
            .prepare(schema::LOAD_ISSUES_SQL)
            .map_err(StoreError::Sqlite)?;
        let rows = stmt
            .query_map([], |row| {
                #[allow(clippy::cast_sign_loss)]
                let number = row.get::<_, i64>(0)? as u64;
                Ok(IssueRecord {
                    number,
                    created_at: text_column(row, 1)?,
                    closed_at: text_column(row, 2)?,
                    state: text_column(row, 3)?,
                    body: text_column(row, 4)?,
                })
            })
            .map_err(StoreError::Sqlite)?;

        let records = rows
            .collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)?;
        debug!(count = records.len(), "Loaded cached issues");
        Ok(records)
    }

    async fn stats(&self) -> crate::error::Result<CacheStats> {
        let conn = self.conn.lock().expect("issue cache mutex poisoned");
        let (total, open, watermark): (i64, i64, Option<String>) = conn
            .query_row(schema::STATS_SQL, [], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })
            .map_err(StoreError::Sqlite)?;
        Ok(CacheStats {
            issue_count: u64::try_from(total).unwrap_or_default(),
            open_count: u64::try_from(open).unwrap_or_default(),
            watermark,
        })
    }
}
