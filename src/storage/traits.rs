//! Storage traits and error types
//!
//! This module defines the trait interface for the work store and its
//! associated error types.

use crate::state::{IndexState, UrlStatus};
use crate::storage::{IndexEntry, IndexStatusRecord, NewUrl, UrlRecord};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Schema mismatch: {0}")]
    Schema(String),

    #[error("Page not found: {0}")]
    PageNotFound(i64),

    #[error("Unknown status '{value}' in {table}")]
    UnknownStatus { table: &'static str, value: String },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for the durable work store
///
/// Both orchestrators are generic over this trait. Only the controller that
/// owns the handle issues reads and writes; fetch workers never see it.
pub trait Storage {
    // ===== Crawl Queue =====

    /// Inserts a batch of URLs into `crawler_queue` in one transaction
    ///
    /// URLs already present are left untouched. Empty input is a no-op.
    ///
    /// # Returns
    ///
    /// The number of rows actually inserted
    fn insert_urls(&mut self, rows: &[NewUrl]) -> StorageResult<usize>;

    /// Marks a URL as processed, inserting it if it is not stored yet
    fn mark_processed(&mut self, url: &str) -> StorageResult<()>;

    /// Gets every URL with the given status, in insertion order
    fn urls_with_status(&self, status: UrlStatus) -> StorageResult<Vec<String>>;

    /// Gets one page of URL records with the given status, ordered by id
    fn fetch_pages(
        &self,
        status: UrlStatus,
        batch_size: usize,
        offset: usize,
    ) -> StorageResult<Vec<UrlRecord>>;

    /// Gets a URL record by its canonical URL
    fn get_url(&self, url: &str) -> StorageResult<Option<UrlRecord>>;

    /// Deletes a URL; its index status and index entries cascade
    ///
    /// Returns true if a row was deleted.
    fn delete_url(&mut self, url: &str) -> StorageResult<bool>;

    // ===== Index Status =====

    /// Creates a `pending` status record for the page if none exists
    fn ensure_index_status(&mut self, page_id: i64) -> StorageResult<()>;

    /// Gets the status record of a page
    fn index_status(&self, page_id: i64) -> StorageResult<Option<IndexStatusRecord>>;

    /// Sets the index state of a page and stamps `last_indexed`
    ///
    /// The error message is truncated to the column width. Passing `None`
    /// clears any previous error.
    fn set_index_status(
        &mut self,
        page_id: i64,
        state: IndexState,
        error: Option<&str>,
    ) -> StorageResult<()>;

    // ===== Inverted Index =====

    /// Inserts a batch of inverted index entries in one transaction
    fn insert_index_entries(&mut self, rows: &[IndexEntry]) -> StorageResult<usize>;

    /// Deletes every inverted index entry of a page
    ///
    /// Returns the number of deleted rows.
    fn clear_index(&mut self, page_id: i64) -> StorageResult<usize>;

    /// Gets the inverted index entries of a page, most frequent first
    fn index_entries_for(&self, page_id: i64) -> StorageResult<Vec<IndexEntry>>;

    // ===== Statistics =====

    /// Counts URLs with the given crawl status
    fn count_urls_by_status(&self, status: UrlStatus) -> StorageResult<u64>;

    /// Counts pages in the given index state
    fn count_pages_by_index_state(&self, state: IndexState) -> StorageResult<u64>;

    /// Counts all inverted index rows
    fn count_index_entries(&self) -> StorageResult<u64>;

    /// Counts distinct keywords in the inverted index
    fn count_distinct_keywords(&self) -> StorageResult<u64>;
}
