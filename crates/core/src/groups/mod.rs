//! Saved media groups.
//!
//! A group is a display name bound to an ordered list of record ids, e.g.
//! every episode of a season published under one title. A search query that
//! equals a group name returns the membership list directly, bypassing the
//! regex path.

mod sqlite;

pub use sqlite::SqliteGroupStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from group operations.
#[derive(Debug, Error)]
pub enum GroupError {
    #[error("Group name and members must not be empty")]
    Empty,

    #[error("Group query failed: {0}")]
    Database(String),
}

/// A named, ordered membership list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaGroup {
    pub name: String,
    /// Record ids in display order. Members may live in either shard.
    pub member_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Trait for group storage backends.
pub trait GroupStore: Send + Sync {
    /// Create a group or merge ids into an existing one.
    ///
    /// Existing member order is preserved; ids not yet present are appended
    /// in the order given. Returns the stored group.
    fn save(&self, name: &str, member_ids: &[String]) -> Result<MediaGroup, GroupError>;

    /// Look up a group by its exact name.
    fn get(&self, name: &str) -> Result<Option<MediaGroup>, GroupError>;

    /// Delete a group. Returns whether it existed.
    fn delete(&self, name: &str) -> Result<bool, GroupError>;
}
