//! Indexer module for building the inverted index
//!
//! This module contains:
//! - Keyword extraction over visible page text
//! - The English stopword dictionary
//! - The sequential index coordinator and its per-page state machine

mod coordinator;
mod keywords;
mod stopwords;

pub use coordinator::{IndexCoordinator, IndexSummary, PageOutcome, NO_TEXT_CONTENT};
pub use keywords::{extract_keywords, MAX_KEYWORDS, MIN_TOKEN_CHARS};
pub use stopwords::{is_stop_word, ENGLISH_STOP_WORDS};

use crate::config::Config;
use crate::crawler::Fetcher;
use crate::shutdown::ShutdownSignal;
use crate::storage::SqliteStorage;
use crate::TrawlError;

/// Runs a complete indexing pass
///
/// Every processed URL in the store is considered once. Pages already
/// indexed are skipped unless `config.indexer.reindex` is set. Re-running
/// after an interruption picks up from the per-page status records.
pub async fn index(config: &Config, signal: ShutdownSignal) -> Result<IndexSummary, TrawlError> {
    let fetcher = Fetcher::new(&config.http)?;
    let mut storage = SqliteStorage::open(&config.store.database_path)?;
    tracing::info!("Opened store at {}", config.store.database_path.display());

    let summary = {
        let mut coordinator =
            IndexCoordinator::new(&mut storage, &config.indexer, fetcher, signal);
        coordinator.run().await
    };

    storage.close()?;
    Ok(summary)
}
