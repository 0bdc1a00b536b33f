/// Current schema version.
pub const SCHEMA_VERSION: &str = "1";

/// SQL schema for the issue cache.
///
/// Each row is the tracker's raw issue JSON, keyed by issue number, with the
/// issue's `updated_at` copied out so the watermark is a plain `max()`.
pub const SCHEMA_SQL: &str = r"
CREATE TABLE IF NOT EXISTS cache_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS issues (
    number INTEGER PRIMARY KEY,
    updated TEXT,
    content TEXT
);
CREATE INDEX IF NOT EXISTS idx_issues_updated ON issues(updated);
";

/// Projection of the fields the engine reads out of each cached issue.
pub const LOAD_ISSUES_SQL: &str = r"
SELECT
    number,
    json_extract(content, '$.created_at'),
    json_extract(content, '$.closed_at'),
    json_extract(content, '$.state'),
    json_extract(content, '$.body')
FROM issues
WHERE coalesce(json_valid(content), 0)
ORDER BY number
";

pub const INVALID_ROWS_SQL: &str =
    "SELECT count(*) FROM issues WHERE NOT coalesce(json_valid(content), 0)";

pub const UPSERT_ISSUE_SQL: &str =
    "INSERT OR REPLACE INTO issues (number, updated, content) VALUES (?1, ?2, ?3)";

pub const WATERMARK_SQL: &str = "SELECT max(updated) FROM issues";

pub const STATS_SQL: &str = r"
SELECT
    count(*),
    coalesce(sum(
        CASE WHEN coalesce(json_valid(content), 0)
             THEN json_extract(content, '$.state') = 'open'
             ELSE 0 END
    ), 0),
    max(updated)
FROM issues
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_executes_on_in_memory_sqlite() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA_SQL).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        assert!(tables.contains(&"issues".to_string()));
        assert!(tables.contains(&"cache_meta".to_string()));
    }

    #[test]
    fn schema_is_idempotent() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA_SQL).unwrap();
        conn.execute_batch(SCHEMA_SQL).unwrap();
    }

    #[test]
    fn projection_reads_json_fields() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA_SQL).unwrap();
        conn.execute(
            UPSERT_ISSUE_SQL,
            rusqlite::params![
                7i64,
                "2018-01-02T00:00:00Z",
                r#"{"created_at":"2018-01-01T00:00:00Z","closed_at":null,"state":"open","body":"URL: a\n"}"#
            ],
        )
        .unwrap();
        let row: (i64, Option<String>, Option<String>, Option<String>, Option<String>) = conn
            .query_row(LOAD_ISSUES_SQL, [], |r| {
                Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?))
            })
            .unwrap();
        assert_eq!(row.0, 7);
        assert_eq!(row.1.as_deref(), Some("2018-01-01T00:00:00Z"));
        assert_eq!(row.2, None);
        assert_eq!(row.3.as_deref(), Some("open"));
        assert_eq!(row.4.as_deref(), Some("URL: a\n"));
    }
}
