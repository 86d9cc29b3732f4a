//! Crawler module for web page fetching and frontier management
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with bounded retry and backoff
//! - HTML parsing and external link extraction
//! - The in-memory breadth-first frontier
//! - Overall crawl coordination and resumption

mod coordinator;
mod fetcher;
mod frontier;
mod parser;
mod retry;

pub use coordinator::{Coordinator, CrawlSummary, FetchedOutcome, ResumeSource};
pub use fetcher::{build_http_client, FetchError, Fetcher, LinkBatch, MAX_REDIRECTS};
pub use frontier::{Admission, BatchPlan, Frontier};
pub use parser::{extract_external_links, extract_text, resolve_link};
pub use retry::{Attempt, RetryPolicy, RETRYABLE_STATUS_CODES};

use crate::config::Config;
use crate::shutdown::ShutdownSignal;
use crate::storage::SqliteStorage;
use crate::TrawlError;

/// Runs a complete crawl operation
///
/// This is the main entry point for crawling. It will:
/// 1. Open the store
/// 2. Restore the frontier, or seed it
/// 3. Crawl until the frontier drains or shutdown is requested
/// 4. Flush buffered writes and close the store
///
/// Re-running after an interruption resumes from the store.
pub async fn crawl(config: &Config, signal: ShutdownSignal) -> Result<CrawlSummary, TrawlError> {
    let fetcher = Fetcher::new(&config.http)?;
    let mut storage = SqliteStorage::open(&config.store.database_path)?;
    tracing::info!("Opened store at {}", config.store.database_path.display());

    let summary = {
        let mut coordinator = Coordinator::new(&mut storage, &config.crawler, fetcher, signal);
        coordinator.resume();
        coordinator.run().await
    };

    storage.close()?;
    Ok(summary)
}
