//! SQLite-backed group store implementation.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use tracing::info;

use super::{GroupError, GroupStore, MediaGroup};

/// SQLite-backed group store.
pub struct SqliteGroupStore {
    conn: Mutex<Connection>,
}

impl SqliteGroupStore {
    /// Open (or create) the group database at `path`.
    pub fn open(path: &Path) -> Result<Self, GroupError> {
        let conn = Connection::open(path).map_err(|e| GroupError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory group store (useful for testing).
    pub fn in_memory() -> Result<Self, GroupError> {
        let conn =
            Connection::open_in_memory().map_err(|e| GroupError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), GroupError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS media_groups (
                name TEXT PRIMARY KEY,
                member_ids TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .map_err(|e| GroupError::Database(e.to_string()))?;
        Ok(())
    }

    fn row_to_group(row: &rusqlite::Row) -> rusqlite::Result<MediaGroup> {
        let name: String = row.get(0)?;
        let member_ids_json: String = row.get(1)?;
        let created_at_str: String = row.get(2)?;

        let member_ids: Vec<String> =
            serde_json::from_str(&member_ids_json).unwrap_or_default();
        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        Ok(MediaGroup {
            name,
            member_ids,
            created_at,
        })
    }
}

impl GroupStore for SqliteGroupStore {
    fn save(&self, name: &str, member_ids: &[String]) -> Result<MediaGroup, GroupError> {
        if name.trim().is_empty() || member_ids.is_empty() {
            return Err(GroupError::Empty);
        }
        let conn = self.conn.lock().unwrap();

        let existing = conn.query_row(
            "SELECT name, member_ids, created_at FROM media_groups WHERE name = ?",
            params![name],
            Self::row_to_group,
        );

        let group = match existing {
            Ok(mut group) => {
                let added: Vec<String> = member_ids
                    .iter()
                    .filter(|id| !group.member_ids.contains(id))
                    .cloned()
                    .collect();
                if !added.is_empty() {
                    group.member_ids.extend(added.iter().cloned());
                    let member_ids_json = serde_json::to_string(&group.member_ids)
                        .map_err(|e| GroupError::Database(e.to_string()))?;
                    conn.execute(
                        "UPDATE media_groups SET member_ids = ? WHERE name = ?",
                        params![member_ids_json, name],
                    )
                    .map_err(|e| GroupError::Database(e.to_string()))?;
                }
                info!(
                    group = name,
                    added = added.len(),
                    total = group.member_ids.len(),
                    "Group updated"
                );
                group
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                // Drop in-batch duplicates while keeping first-seen order
                let mut unique: Vec<String> = Vec::with_capacity(member_ids.len());
                for id in member_ids {
                    if !unique.contains(id) {
                        unique.push(id.clone());
                    }
                }
                let created_at = Utc::now();
                let member_ids_json = serde_json::to_string(&unique)
                    .map_err(|e| GroupError::Database(e.to_string()))?;
                conn.execute(
                    "INSERT INTO media_groups (name, member_ids, created_at) VALUES (?, ?, ?)",
                    params![name, member_ids_json, created_at.to_rfc3339()],
                )
                .map_err(|e| GroupError::Database(e.to_string()))?;
                info!(group = name, members = unique.len(), "Group created");
                MediaGroup {
                    name: name.to_string(),
                    member_ids: unique,
                    created_at,
                }
            }
            Err(e) => return Err(GroupError::Database(e.to_string())),
        };

        Ok(group)
    }

    fn get(&self, name: &str) -> Result<Option<MediaGroup>, GroupError> {
        let conn = self.conn.lock().unwrap();
        let result = conn.query_row(
            "SELECT name, member_ids, created_at FROM media_groups WHERE name = ?",
            params![name],
            Self::row_to_group,
        );
        match result {
            Ok(group) => Ok(Some(group)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(GroupError::Database(e.to_string())),
        }
    }

    fn delete(&self, name: &str) -> Result<bool, GroupError> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn
            .execute("DELETE FROM media_groups WHERE name = ?", params![name])
            .map_err(|e| GroupError::Database(e.to_string()))?;
        if deleted > 0 {
            info!(group = name, "Group deleted");
        }
        Ok(deleted > 0)
    }
}
