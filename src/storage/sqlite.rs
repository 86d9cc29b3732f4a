//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::state::{IndexState, UrlStatus};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{
    now_timestamp, truncate_message, IndexEntry, IndexStatusRecord, NewUrl, UrlRecord,
    MAX_ERROR_LEN,
};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens or creates the database at `path`
    ///
    /// Creates any missing table, then validates the declared schema against
    /// the database so that a mismatched file is rejected before any work.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    pub fn open(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;

        Self::from_connection(conn)
    }

    /// Creates an in-memory database
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> StorageResult<Self> {
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Closes the underlying connection, reporting any error
    pub fn close(self) -> StorageResult<()> {
        self.conn.close().map_err(|(_, e)| e.into())
    }
}

fn parse_url_status(value: String) -> StorageResult<UrlStatus> {
    UrlStatus::from_db_string(&value).ok_or(StorageError::UnknownStatus {
        table: "crawler_queue",
        value,
    })
}

fn parse_index_state(value: String) -> StorageResult<IndexState> {
    IndexState::from_db_string(&value).ok_or(StorageError::UnknownStatus {
        table: "indexing_status",
        value,
    })
}

type RawUrlRow = (i64, String, String, Option<String>);

fn url_record((id, url, status, timestamp): RawUrlRow) -> StorageResult<UrlRecord> {
    Ok(UrlRecord {
        id,
        url,
        status: parse_url_status(status)?,
        timestamp,
    })
}

impl Storage for SqliteStorage {
    // ===== Crawl Queue =====

    fn insert_urls(&mut self, rows: &[NewUrl]) -> StorageResult<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO crawler_queue (url, status, timestamp) VALUES (?1, ?2, ?3)",
            )?;
            for row in rows {
                inserted += stmt.execute(params![
                    row.url,
                    row.status.to_db_string(),
                    row.timestamp
                ])?;
            }
        }
        tx.commit()?;

        Ok(inserted)
    }

    fn mark_processed(&mut self, url: &str) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO crawler_queue (url, status, timestamp) VALUES (?1, ?2, ?3)
             ON CONFLICT(url) DO UPDATE SET status = excluded.status, timestamp = excluded.timestamp",
            params![url, UrlStatus::Processed.to_db_string(), now_timestamp()],
        )?;
        Ok(())
    }

    fn urls_with_status(&self, status: UrlStatus) -> StorageResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT url FROM crawler_queue WHERE status = ?1 ORDER BY id")?;
        let urls = stmt
            .query_map(params![status.to_db_string()], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(urls)
    }

    fn fetch_pages(
        &self,
        status: UrlStatus,
        batch_size: usize,
        offset: usize,
    ) -> StorageResult<Vec<UrlRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, url, status, timestamp FROM crawler_queue
             WHERE status = ?1 ORDER BY id LIMIT ?2 OFFSET ?3",
        )?;

        let rows = stmt
            .query_map(
                params![status.to_db_string(), batch_size as i64, offset as i64],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )?
            .collect::<Result<Vec<RawUrlRow>, _>>()?;

        rows.into_iter().map(url_record).collect()
    }

    fn get_url(&self, url: &str) -> StorageResult<Option<UrlRecord>> {
        let raw: Option<RawUrlRow> = self
            .conn
            .query_row(
                "SELECT id, url, status, timestamp FROM crawler_queue WHERE url = ?1",
                params![url],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .optional()?;

        raw.map(url_record).transpose()
    }

    fn delete_url(&mut self, url: &str) -> StorageResult<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM crawler_queue WHERE url = ?1", params![url])?;
        Ok(deleted > 0)
    }

    // ===== Index Status =====

    fn ensure_index_status(&mut self, page_id: i64) -> StorageResult<()> {
        let exists: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM crawler_queue WHERE id = ?1",
                params![page_id],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Err(StorageError::PageNotFound(page_id));
        }

        self.conn.execute(
            "INSERT OR IGNORE INTO indexing_status (page_id, status, last_indexed)
             VALUES (?1, ?2, ?3)",
            params![page_id, IndexState::Pending.to_db_string(), now_timestamp()],
        )?;
        Ok(())
    }

    fn index_status(&self, page_id: i64) -> StorageResult<Option<IndexStatusRecord>> {
        let raw: Option<(i64, i64, String, Option<String>, Option<String>)> = self
            .conn
            .query_row(
                "SELECT id, page_id, status, last_indexed, error
                 FROM indexing_status WHERE page_id = ?1",
                params![page_id],
                |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                    ))
                },
            )
            .optional()?;

        raw.map(|(id, page_id, status, last_indexed, error)| {
            Ok(IndexStatusRecord {
                id,
                page_id,
                status: parse_index_state(status)?,
                last_indexed,
                error,
            })
        })
        .transpose()
    }

    fn set_index_status(
        &mut self,
        page_id: i64,
        state: IndexState,
        error: Option<&str>,
    ) -> StorageResult<()> {
        let error = error.map(|e| truncate_message(e, MAX_ERROR_LEN));
        let updated = self.conn.execute(
            "UPDATE indexing_status SET status = ?1, last_indexed = ?2, error = ?3
             WHERE page_id = ?4",
            params![state.to_db_string(), now_timestamp(), error, page_id],
        )?;

        if updated == 0 {
            return Err(StorageError::PageNotFound(page_id));
        }
        Ok(())
    }

    // ===== Inverted Index =====

    fn insert_index_entries(&mut self, rows: &[IndexEntry]) -> StorageResult<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO inverted_index (keyword, page_id, frequency) VALUES (?1, ?2, ?3)",
            )?;
            for row in rows {
                inserted += stmt.execute(params![row.keyword, row.page_id, row.frequency])?;
            }
        }
        tx.commit()?;

        Ok(inserted)
    }

    fn clear_index(&mut self, page_id: i64) -> StorageResult<usize> {
        let deleted = self.conn.execute(
            "DELETE FROM inverted_index WHERE page_id = ?1",
            params![page_id],
        )?;
        Ok(deleted)
    }

    fn index_entries_for(&self, page_id: i64) -> StorageResult<Vec<IndexEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT keyword, page_id, frequency FROM inverted_index
             WHERE page_id = ?1 ORDER BY frequency DESC, id",
        )?;

        let entries = stmt
            .query_map(params![page_id], |row| {
                Ok(IndexEntry {
                    keyword: row.get(0)?,
                    page_id: row.get(1)?,
                    frequency: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    // ===== Statistics =====

    fn count_urls_by_status(&self, status: UrlStatus) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM crawler_queue WHERE status = ?1",
            params![status.to_db_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_pages_by_index_state(&self, state: IndexState) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM indexing_status WHERE status = ?1",
            params![state.to_db_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_index_entries(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM inverted_index", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_distinct_keywords(&self) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(DISTINCT keyword) FROM inverted_index",
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}
