//! Storage module for the durable work store
//!
//! This module handles all database operations, including:
//! - SQLite handle lifecycle and typed schema creation/validation
//! - The crawl queue (`crawler_queue`)
//! - Per-page index status (`indexing_status`)
//! - The inverted index (`inverted_index`)
//! - Batched writes shared by the crawler and the indexer

mod schema;
mod sqlite;
mod traits;
mod writer;

pub use schema::{
    create_indexes, create_table, initialize_schema, validate_schema, ColumnDef, IndexDef,
    TableSchema, CRAWLER_QUEUE, INDEXING_STATUS, INVERTED_INDEX, TABLES,
};
pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};
pub use writer::{BatchRow, BatchedWriter};

use crate::state::{IndexState, UrlStatus};
use std::path::Path;

/// Maximum length of a stored error message, in characters
pub const MAX_ERROR_LEN: usize = 255;

/// Timestamp format used for every DATETIME column
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Opens a storage database, creating and validating the schema
pub fn open_storage(path: &Path) -> StorageResult<SqliteStorage> {
    SqliteStorage::open(path)
}

/// Current local time formatted for a DATETIME column
pub fn now_timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Truncates a message to at most `max_chars` characters
pub fn truncate_message(message: &str, max_chars: usize) -> &str {
    match message.char_indices().nth(max_chars) {
        Some((idx, _)) => &message[..idx],
        None => message,
    }
}

/// Represents a row of `crawler_queue`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlRecord {
    pub id: i64,
    pub url: String,
    pub status: UrlStatus,
    pub timestamp: Option<String>,
}

/// A URL waiting to be inserted into `crawler_queue`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUrl {
    pub url: String,
    pub status: UrlStatus,
    pub timestamp: String,
}

impl NewUrl {
    /// A freshly discovered URL
    pub fn pending(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: UrlStatus::Pending,
            timestamp: now_timestamp(),
        }
    }

    /// A URL that needs no fetching
    pub fn processed(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: UrlStatus::Processed,
            timestamp: now_timestamp(),
        }
    }
}

/// Represents a row of `indexing_status`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexStatusRecord {
    pub id: i64,
    pub page_id: i64,
    pub status: IndexState,
    pub last_indexed: Option<String>,
    pub error: Option<String>,
}

/// Represents a row of `inverted_index`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub keyword: String,
    pub page_id: i64,
    pub frequency: u32,
}
