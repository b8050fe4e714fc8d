//! SQLite-backed shard implementation.
//!
//! Each shard owns one database file. Pattern matching runs inside SQLite
//! through a registered `regexp()` scalar function so skip/limit stay
//! meaningful at the query level. Calls are moved onto the blocking pool;
//! the two shards of an index have separate connections, so a federated
//! query genuinely runs them in parallel.

use std::path::Path;
use std::sync::{Arc, Mutex};

use regex_lite::Regex;
use rusqlite::functions::FunctionFlags;
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection};

use super::{InsertOutcome, MediaFilter, MediaRecord, Shard, ShardError, ShardName, ShardStats};

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

const RECORD_COLUMNS: &str =
    "compact_id, reference_token, name, size_bytes, media_type, mime_type, caption";

/// SQLite-backed shard.
pub struct SqliteShard {
    name: ShardName,
    conn: Arc<Mutex<Connection>>,
}

impl SqliteShard {
    /// Open (or create) a shard database at `path`.
    pub fn open(path: &Path, name: ShardName) -> Result<Self, ShardError> {
        let conn = Connection::open(path).map_err(|e| ShardError::Database(e.to_string()))?;
        Self::initialize(&conn)?;
        Ok(Self {
            name,
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create an in-memory shard (useful for testing).
    pub fn in_memory(name: ShardName) -> Result<Self, ShardError> {
        let conn = Connection::open_in_memory().map_err(|e| ShardError::Database(e.to_string()))?;
        Self::initialize(&conn)?;
        Ok(Self {
            name,
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn initialize(conn: &Connection) -> Result<(), ShardError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS media (
                compact_id TEXT PRIMARY KEY,
                reference_token TEXT NOT NULL,
                name TEXT NOT NULL,
                size_bytes INTEGER NOT NULL,
                media_type TEXT,
                mime_type TEXT,
                caption TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_media_name ON media(name);
            CREATE INDEX IF NOT EXISTS idx_media_type ON media(media_type);
            "#,
        )
        .map_err(|e| ShardError::Database(e.to_string()))?;

        register_regexp(conn).map_err(|e| ShardError::Database(e.to_string()))?;
        Ok(())
    }

    /// Run `f` with the connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, ShardError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, ShardError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().unwrap();
            f(&conn)
        })
        .await
        .map_err(|e| ShardError::Internal(e.to_string()))?
    }

    fn build_where_clause(filter: &MediaFilter) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if filter.match_caption {
            conditions.push("(name REGEXP ? OR caption REGEXP ?)");
            params.push(Box::new(filter.pattern.clone()));
            params.push(Box::new(filter.pattern.clone()));
        } else {
            conditions.push("name REGEXP ?");
            params.push(Box::new(filter.pattern.clone()));
        }

        if let Some(ref media_type) = filter.media_type {
            conditions.push("media_type = ?");
            params.push(Box::new(media_type.clone()));
        }

        (format!("WHERE {}", conditions.join(" AND ")), params)
    }

    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<MediaRecord> {
        Ok(MediaRecord {
            compact_id: row.get(0)?,
            reference_token: row.get(1)?,
            name: row.get(2)?,
            size_bytes: row.get::<_, i64>(3)?.max(0) as u64,
            media_type: row.get(4)?,
            mime_type: row.get(5)?,
            caption: row.get(6)?,
        })
    }
}

#[async_trait::async_trait]
impl Shard for SqliteShard {
    fn name(&self) -> ShardName {
        self.name
    }

    async fn exists(&self, compact_id: &str) -> Result<bool, ShardError> {
        let compact_id = compact_id.to_string();
        self.with_conn(move |conn| {
            let result = conn.query_row(
                "SELECT 1 FROM media WHERE compact_id = ? LIMIT 1",
                params![compact_id],
                |_| Ok(()),
            );
            match result {
                Ok(()) => Ok(true),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(false),
                Err(e) => Err(ShardError::Database(e.to_string())),
            }
        })
        .await
    }

    async fn insert(&self, record: MediaRecord) -> Result<InsertOutcome, ShardError> {
        self.with_conn(move |conn| {
            let result = conn.execute(
                "INSERT INTO media (compact_id, reference_token, name, size_bytes, media_type, mime_type, caption) \
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
                params![
                    record.compact_id,
                    record.reference_token,
                    record.name,
                    record.size_bytes as i64,
                    record.media_type,
                    record.mime_type,
                    record.caption,
                ],
            );
            match result {
                Ok(_) => Ok(InsertOutcome::Inserted),
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    Ok(InsertOutcome::Duplicate)
                }
                Err(e) => Err(ShardError::Database(e.to_string())),
            }
        })
        .await
    }

    async fn get(&self, compact_id: &str) -> Result<Option<MediaRecord>, ShardError> {
        let compact_id = compact_id.to_string();
        self.with_conn(move |conn| {
            let result = conn.query_row(
                &format!("SELECT {RECORD_COLUMNS} FROM media WHERE compact_id = ?"),
                params![compact_id],
                Self::row_to_record,
            );
            match result {
                Ok(record) => Ok(Some(record)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(ShardError::Database(e.to_string())),
            }
        })
        .await
    }

    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<MediaRecord>, ShardError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids = ids.to_vec();
        self.with_conn(move |conn| {
            let placeholders = vec!["?"; ids.len()].join(", ");
            let sql = format!(
                "SELECT {RECORD_COLUMNS} FROM media WHERE compact_id IN ({placeholders})"
            );
            let mut stmt = conn
                .prepare(&sql)
                .map_err(|e| ShardError::Database(e.to_string()))?;
            let rows = stmt
                .query_map(rusqlite::params_from_iter(ids.iter()), Self::row_to_record)
                .map_err(|e| ShardError::Database(e.to_string()))?;

            let mut records = Vec::new();
            for row in rows {
                records.push(row.map_err(|e| ShardError::Database(e.to_string()))?);
            }
            Ok(records)
        })
        .await
    }

    async fn find(
        &self,
        filter: &MediaFilter,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<MediaRecord>, ShardError> {
        let filter = filter.clone();
        self.with_conn(move |conn| {
            let (where_clause, mut params) = Self::build_where_clause(&filter);
            let sql = format!(
                "SELECT {RECORD_COLUMNS} FROM media {where_clause} \
                 ORDER BY rowid DESC LIMIT ? OFFSET ?"
            );
            params.push(Box::new(limit as i64));
            params.push(Box::new(skip as i64));
            let param_refs: Vec<&dyn rusqlite::ToSql> =
                params.iter().map(|p| p.as_ref()).collect();

            let mut stmt = conn
                .prepare(&sql)
                .map_err(|e| ShardError::Database(e.to_string()))?;
            let rows = stmt
                .query_map(param_refs.as_slice(), Self::row_to_record)
                .map_err(|e| ShardError::Database(e.to_string()))?;

            let mut records = Vec::new();
            for row in rows {
                records.push(row.map_err(|e| ShardError::Database(e.to_string()))?);
            }
            Ok(records)
        })
        .await
    }

    async fn count(&self, filter: &MediaFilter) -> Result<u64, ShardError> {
        let filter = filter.clone();
        self.with_conn(move |conn| {
            let (where_clause, params) = Self::build_where_clause(&filter);
            let sql = format!("SELECT COUNT(*) FROM media {where_clause}");
            let param_refs: Vec<&dyn rusqlite::ToSql> =
                params.iter().map(|p| p.as_ref()).collect();

            let count: i64 = conn
                .query_row(&sql, param_refs.as_slice(), |row| row.get(0))
                .map_err(|e| ShardError::Database(e.to_string()))?;
            Ok(count.max(0) as u64)
        })
        .await
    }

    async fn stats(&self) -> Result<ShardStats, ShardError> {
        self.with_conn(move |conn| {
            let pragma = |name: &str| -> Result<u64, ShardError> {
                conn.query_row(&format!("PRAGMA {name}"), [], |row| row.get::<_, i64>(0))
                    .map(|v| v.max(0) as u64)
                    .map_err(|e| ShardError::Database(e.to_string()))
            };
            let page_count = pragma("page_count")?;
            let page_size = pragma("page_size")?;
            let freelist = pragma("freelist_count")?;

            // SQLite's page count covers table and index pages alike, so the
            // whole footprint lands in data_bytes.
            Ok(ShardStats {
                data_bytes: page_count.saturating_sub(freelist) * page_size,
                index_bytes: 0,
            })
        })
        .await
    }
}

/// Register a `regexp(pattern, text)` scalar function backed by regex-lite.
///
/// SQLite rewrites `text REGEXP pattern` into `regexp(pattern, text)`. The
/// compiled regex is cached per statement through the aux-data slot, so a
/// paginated scan compiles the pattern once. NULL text never matches.
fn register_regexp(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "regexp",
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        move |ctx| {
            let regexp: Arc<Regex> = ctx.get_or_create_aux(0, |vr| -> Result<_, BoxError> {
                Ok(Regex::new(vr.as_str()?)?)
            })?;
            let matched = match ctx.get_raw(1) {
                ValueRef::Text(t) => {
                    let text = std::str::from_utf8(t)
                        .map_err(|e| rusqlite::Error::UserFunctionError(e.into()))?;
                    regexp.is_match(text)
                }
                _ => false,
            };
            Ok(matched)
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, name: &str) -> MediaRecord {
        MediaRecord {
            compact_id: id.to_string(),
            reference_token: format!("ref-{id}"),
            name: name.to_string(),
            size_bytes: 1024,
            media_type: Some("video".to_string()),
            mime_type: Some("video/x-matroska".to_string()),
            caption: None,
        }
    }

    async fn shard_with(records: &[MediaRecord]) -> SqliteShard {
        let shard = SqliteShard::in_memory(ShardName::Primary).unwrap();
        for r in records {
            assert_eq!(
                shard.insert(r.clone()).await.unwrap(),
                InsertOutcome::Inserted
            );
        }
        shard
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let shard = shard_with(&[record("a", "Show S01E01 1080p.mkv")]).await;

        let fetched = shard.get("a").await.unwrap().unwrap();
        assert_eq!(fetched.name, "Show S01E01 1080p.mkv");
        assert_eq!(fetched.reference_token, "ref-a");
        assert!(shard.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_duplicate() {
        let shard = shard_with(&[record("a", "first")]).await;
        let outcome = shard.insert(record("a", "second")).await.unwrap();
        assert_eq!(outcome, InsertOutcome::Duplicate);

        // Original record untouched
        assert_eq!(shard.get("a").await.unwrap().unwrap().name, "first");
    }

    #[tokio::test]
    async fn test_exists() {
        let shard = shard_with(&[record("a", "x")]).await;
        assert!(shard.exists("a").await.unwrap());
        assert!(!shard.exists("b").await.unwrap());
    }

    #[tokio::test]
    async fn test_find_most_recent_first() {
        let shard = shard_with(&[
            record("a", "Alpha.mkv"),
            record("b", "Beta.mkv"),
            record("c", "Gamma.mkv"),
        ])
        .await;

        let filter = MediaFilter::new("(?i).");
        let found = shard.find(&filter, 0, 10).await.unwrap();
        let names: Vec<_> = found.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Gamma.mkv", "Beta.mkv", "Alpha.mkv"]);
    }

    #[tokio::test]
    async fn test_find_skip_limit() {
        let records: Vec<_> = (0..5).map(|i| record(&format!("id{i}"), "match.mkv")).collect();
        let shard = shard_with(&records).await;

        let filter = MediaFilter::new("(?i)match");
        let page = shard.find(&filter, 2, 2).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].compact_id, "id2");
        assert_eq!(page[1].compact_id, "id1");
    }

    #[tokio::test]
    async fn test_regexp_case_insensitive() {
        let shard = shard_with(&[record("a", "The.Big.Show.S01E01.mkv")]).await;

        let filter = MediaFilter::new(r"(?i)(\b|[\.\+\-_])big(\b|[\.\+\-_])");
        assert_eq!(shard.count(&filter).await.unwrap(), 1);

        let miss = MediaFilter::new(r"(?i)(\b|[\.\+\-_])bigger(\b|[\.\+\-_])");
        assert_eq!(shard.count(&miss).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_caption_matching_toggle() {
        let mut r = record("a", "unrelated-name.mkv");
        r.caption = Some("director's commentary".to_string());
        let shard = shard_with(&[r]).await;

        let with_caption = MediaFilter::new("(?i)commentary");
        assert_eq!(shard.count(&with_caption).await.unwrap(), 1);

        let name_only = MediaFilter::new("(?i)commentary").name_only();
        assert_eq!(shard.count(&name_only).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_null_caption_does_not_match() {
        let shard = shard_with(&[record("a", "name.mkv")]).await;
        let filter = MediaFilter::new("(?i)anything");
        assert_eq!(shard.count(&filter).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_media_type_filter() {
        let mut doc = record("d", "match.pdf");
        doc.media_type = Some("document".to_string());
        let shard = shard_with(&[record("v", "match.mkv"), doc]).await;

        let filter = MediaFilter::new("(?i)match").with_media_type("document");
        let found = shard.find(&filter, 0, 10).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].compact_id, "d");
    }

    #[tokio::test]
    async fn test_find_by_ids() {
        let shard = shard_with(&[record("a", "A"), record("b", "B"), record("c", "C")]).await;

        let found = shard
            .find_by_ids(&["a".to_string(), "c".to_string(), "zz".to_string()])
            .await
            .unwrap();
        let mut ids: Vec<_> = found.iter().map(|r| r.compact_id.as_str()).collect();
        ids.sort();
        assert_eq!(ids, vec!["a", "c"]);

        assert!(shard.find_by_ids(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stats_nonzero_after_inserts() {
        let shard = shard_with(&[record("a", "x"), record("b", "y")]).await;
        let stats = shard.stats().await.unwrap();
        assert!(stats.total_bytes() > 0);
    }

    #[tokio::test]
    async fn test_open_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("primary.db");
        let shard = SqliteShard::open(&path, ShardName::Primary).unwrap();
        shard.insert(record("a", "x")).await.unwrap();
        assert!(path.exists());
        assert!(shard.exists("a").await.unwrap());
    }
}
