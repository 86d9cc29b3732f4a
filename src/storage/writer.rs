//! Batched writes to the store
//!
//! Rows are buffered in memory and written with one bulk insert once the
//! buffer reaches its limit. `finish` always performs a final flush, even when
//! the buffer is empty.

use crate::storage::{IndexEntry, NewUrl, Storage, StorageResult};
use std::mem;

/// A row type that can be bulk-inserted into one table
pub trait BatchRow: Sized {
    /// Name of the destination table, for logging
    const TABLE: &'static str;

    /// Inserts all rows in one transaction, returning the inserted count
    fn insert_many<S: Storage + ?Sized>(storage: &mut S, rows: &[Self]) -> StorageResult<usize>;
}

impl BatchRow for NewUrl {
    const TABLE: &'static str = "crawler_queue";

    fn insert_many<S: Storage + ?Sized>(storage: &mut S, rows: &[Self]) -> StorageResult<usize> {
        storage.insert_urls(rows)
    }
}

impl BatchRow for IndexEntry {
    const TABLE: &'static str = "inverted_index";

    fn insert_many<S: Storage + ?Sized>(storage: &mut S, rows: &[Self]) -> StorageResult<usize> {
        storage.insert_index_entries(rows)
    }
}

/// In-memory buffer of rows destined for one table
#[derive(Debug)]
pub struct BatchedWriter<T: BatchRow> {
    buffer: Vec<T>,
    limit: usize,
    flushes: usize,
    rows_written: usize,
}

impl<T: BatchRow> BatchedWriter<T> {
    /// Creates a writer that flushes every `limit` rows
    ///
    /// A limit of zero is treated as one.
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            buffer: Vec::with_capacity(limit),
            limit,
            flushes: 0,
            rows_written: 0,
        }
    }

    /// Buffers a row, flushing once the buffer reaches the limit
    pub fn add<S: Storage + ?Sized>(&mut self, storage: &mut S, row: T) -> StorageResult<()> {
        self.buffer.push(row);
        if self.buffer.len() >= self.limit {
            self.flush(storage)?;
        }
        Ok(())
    }

    /// Writes every buffered row and clears the buffer
    ///
    /// The buffer is cleared even if the insert fails; the failed rows are
    /// reported through the returned error.
    pub fn flush<S: Storage + ?Sized>(&mut self, storage: &mut S) -> StorageResult<usize> {
        let rows = mem::take(&mut self.buffer);
        self.flushes += 1;

        let written = T::insert_many(storage, &rows)?;
        self.rows_written += written;

        if !rows.is_empty() {
            tracing::debug!(
                "Flushed {} rows to {} ({} new)",
                rows.len(),
                T::TABLE,
                written
            );
        }
        Ok(written)
    }

    /// Performs the final flush at the end of a run
    pub fn finish<S: Storage + ?Sized>(&mut self, storage: &mut S) -> StorageResult<usize> {
        let pending = self.buffer.len();
        let written = self.flush(storage)?;
        tracing::debug!(
            "Final flush of {} ({} buffered, {} total written)",
            T::TABLE,
            pending,
            self.rows_written
        );
        Ok(written)
    }

    /// Number of rows currently buffered
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Number of flushes performed so far
    pub fn flush_count(&self) -> usize {
        self.flushes
    }

    /// Number of rows the store reported as inserted
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}
