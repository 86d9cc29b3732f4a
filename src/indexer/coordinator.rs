//! Index coordinator - sequential page indexing
//!
//! The coordinator pages through processed URLs and drives each page through
//! the index state machine:
//!
//! ```text
//! ensure status -> indexing -> fetch text -> extract keywords -> indexed
//!                                   \-> failed ("no text content")
//! ```
//!
//! Pages are handled one at a time. The status record of each page is the
//! resume point, so an interrupted run simply starts over and skips what is
//! already indexed.

use crate::config::IndexerConfig;
use crate::crawler::Fetcher;
use crate::indexer::keywords::extract_keywords;
use crate::shutdown::ShutdownSignal;
use crate::state::{IndexState, UrlStatus};
use crate::storage::{BatchedWriter, IndexEntry, Storage, UrlRecord};
use crate::TrawlError;
use std::fmt;
use std::time::{Duration, Instant};

/// Failure reason recorded for pages without extractable text
pub const NO_TEXT_CONTENT: &str = "no text content";

/// Result of considering one page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    /// Keywords were written and the page is `indexed`
    Indexed { keywords: usize },

    /// Page was already indexed and reindexing is off
    Skipped,

    /// Page is now `failed`
    Failed,
}

/// Totals reported at the end of an indexing run
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSummary {
    /// Processed pages considered in this run
    pub considered: usize,

    pub indexed: usize,
    pub skipped: usize,
    pub failed: usize,

    /// Inverted index rows written in this run
    pub keywords: usize,

    pub elapsed: Duration,

    /// True if the run stopped because shutdown was requested
    pub interrupted: bool,
}

impl IndexSummary {
    /// Indexed pages per second
    pub fn rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.indexed as f64 / secs
        } else {
            0.0
        }
    }
}

impl fmt::Display for IndexSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Indexing {}",
            if self.interrupted {
                "interrupted"
            } else {
                "complete"
            }
        )?;
        writeln!(f, "  Pages considered: {}", self.considered)?;
        writeln!(f, "  Pages indexed:    {}", self.indexed)?;
        writeln!(f, "  Pages skipped:    {}", self.skipped)?;
        writeln!(f, "  Pages failed:     {}", self.failed)?;
        writeln!(f, "  Keywords written: {}", self.keywords)?;
        write!(
            f,
            "  Elapsed:          {:.1}s ({:.2} pages/sec)",
            self.elapsed.as_secs_f64(),
            self.rate()
        )
    }
}

/// Sequential indexer over the processed pages of the store
pub struct IndexCoordinator<'s, S: Storage + ?Sized> {
    storage: &'s mut S,
    fetcher: Fetcher,
    writer: BatchedWriter<IndexEntry>,
    page_size: usize,
    reindex: bool,
    signal: ShutdownSignal,
}

impl<'s, S: Storage + ?Sized> IndexCoordinator<'s, S> {
    pub fn new(
        storage: &'s mut S,
        config: &IndexerConfig,
        fetcher: Fetcher,
        signal: ShutdownSignal,
    ) -> Self {
        Self {
            storage,
            fetcher,
            writer: BatchedWriter::new(config.buffer_limit),
            page_size: config.page_size.max(1),
            reindex: config.reindex,
            signal,
        }
    }

    /// Indexes every processed page until the pages run out or shutdown is
    /// requested
    ///
    /// The offset advances by the number of rows each page returned. Shutdown
    /// is checked before each page of rows and before each URL; the page in
    /// progress always completes.
    pub async fn run(&mut self) -> IndexSummary {
        let start = Instant::now();
        let mut summary = IndexSummary {
            considered: 0,
            indexed: 0,
            skipped: 0,
            failed: 0,
            keywords: 0,
            elapsed: Duration::ZERO,
            interrupted: false,
        };

        tracing::info!(
            "Starting indexer (page size {}, reindex {})",
            self.page_size,
            self.reindex
        );

        let mut offset = 0;
        'pages: loop {
            if self.signal.is_requested() {
                summary.interrupted = true;
                break;
            }

            let rows = match self
                .storage
                .fetch_pages(UrlStatus::Processed, self.page_size, offset)
            {
                Ok(rows) => rows,
                Err(e) => {
                    tracing::error!("Failed to read processed URLs at offset {}: {}", offset, e);
                    break;
                }
            };
            if rows.is_empty() {
                break;
            }
            offset += rows.len();

            for record in &rows {
                if self.signal.is_requested() {
                    summary.interrupted = true;
                    break 'pages;
                }

                summary.considered += 1;
                match self.index_page(record).await {
                    PageOutcome::Indexed { keywords } => {
                        summary.indexed += 1;
                        summary.keywords += keywords;
                    }
                    PageOutcome::Skipped => summary.skipped += 1,
                    PageOutcome::Failed => summary.failed += 1,
                }
            }

            tracing::info!(
                "Progress: {} pages considered, {} indexed, {} failed",
                summary.considered,
                summary.indexed,
                summary.failed
            );
        }

        if summary.interrupted {
            tracing::info!("Shutdown requested, stopping indexer");
        }
        self.finish();

        summary.elapsed = start.elapsed();
        tracing::info!(
            "Indexing {}: {} pages indexed in {:?} ({:.2} pages/sec)",
            if summary.interrupted {
                "interrupted"
            } else {
                "finished"
            },
            summary.indexed,
            summary.elapsed,
            summary.rate()
        );
        summary
    }

    /// Runs one page through the state machine
    ///
    /// Errors never escape: the page is recorded as `failed` with the error
    /// message instead.
    pub async fn index_page(&mut self, record: &UrlRecord) -> PageOutcome {
        match self.try_index_page(record).await {
            Ok(outcome) => outcome,
            Err(e) => {
                let message = format!("Failed to index: {}", e);
                tracing::warn!("{} ({})", message, record.url);
                if let Err(e) =
                    self.storage
                        .set_index_status(record.id, IndexState::Failed, Some(&message))
                {
                    tracing::error!("Failed to record failure of {}: {}", record.url, e);
                }
                PageOutcome::Failed
            }
        }
    }

    async fn try_index_page(&mut self, record: &UrlRecord) -> Result<PageOutcome, TrawlError> {
        let page_id = record.id;
        self.storage.ensure_index_status(page_id)?;
        let previous = self
            .storage
            .index_status(page_id)?
            .map(|status| status.status)
            .unwrap_or(IndexState::Pending);

        if previous.is_complete() && !self.reindex {
            tracing::debug!("Skipping indexed page {}", record.url);
            return Ok(PageOutcome::Skipped);
        }

        self.transition(page_id, previous, IndexState::Indexing, None)?;

        // Entries from an earlier attempt are replaced, never added to
        if previous != IndexState::Pending {
            let cleared = self.storage.clear_index(page_id)?;
            if cleared > 0 {
                tracing::debug!("Cleared {} index entries of {}", cleared, record.url);
            }
        }

        let text = self.fetcher.fetch_text(&record.url).await;
        if text.trim().is_empty() {
            tracing::debug!("No text content at {}", record.url);
            self.transition(
                page_id,
                IndexState::Indexing,
                IndexState::Failed,
                Some(NO_TEXT_CONTENT),
            )?;
            return Ok(PageOutcome::Failed);
        }

        let keywords = extract_keywords(&text);
        let count = keywords.len();
        for (keyword, frequency) in keywords {
            self.writer.add(
                &mut *self.storage,
                IndexEntry {
                    keyword,
                    page_id,
                    frequency,
                },
            )?;
        }
        self.writer.flush(&mut *self.storage)?;

        self.transition(page_id, IndexState::Indexing, IndexState::Indexed, None)?;
        tracing::debug!("Indexed {} with {} keywords", record.url, count);
        Ok(PageOutcome::Indexed { keywords: count })
    }

    fn transition(
        &mut self,
        page_id: i64,
        from: IndexState,
        to: IndexState,
        error: Option<&str>,
    ) -> Result<(), TrawlError> {
        if !from.can_transition_to(to) {
            return Err(TrawlError::InvalidTransition { from, to });
        }
        self.storage.set_index_status(page_id, to, error)?;
        Ok(())
    }

    /// Flushes any buffered index entries
    fn finish(&mut self) {
        if let Err(e) = self.writer.finish(&mut *self.storage) {
            tracing::error!("Failed to flush index entries: {}", e);
        }
    }
}
