//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl controller, which:
//! - Restores the frontier from the store, or seeds it
//! - Dispatches batches of URLs to concurrent fetch workers
//! - Merges discovered links into the frontier in completion order
//! - Persists new frontier entries and processed markers
//! - Stops between batches when shutdown is requested
//!
//! The controller is the only owner of the frontier and the store handle.
//! Workers get a `Fetcher` clone and a URL and hand back a `LinkBatch`.

use crate::config::CrawlerConfig;
use crate::crawler::fetcher::{Fetcher, LinkBatch};
use crate::crawler::frontier::{Admission, BatchPlan, Frontier};
use crate::shutdown::ShutdownSignal;
use crate::storage::{BatchedWriter, NewUrl, Storage};
use crate::state::UrlStatus;
use crate::url::{canonicalize, Blacklist};
use std::fmt;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;

/// Where the frontier came from at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeSource {
    /// Pending URLs from a previous run were found in the store
    Restored { processed: usize, pending: usize },

    /// No pending URLs; the configured seeds were queued
    Seeded { seeds: usize },
}

/// Links handled for one fetched page
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FetchedOutcome {
    pub enqueued: usize,
    pub blacklisted: usize,
}

/// Totals reported at the end of a crawl
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlSummary {
    /// Pages fetched in this run
    pub fetched: usize,

    /// New URLs queued in this run
    pub enqueued: usize,

    /// URLs marked processed without fetching (blacklisted or invalid)
    pub skipped: usize,

    /// Size of the visited set at the end of the run
    pub visited: usize,

    /// URLs still queued; they stay pending in the store
    pub remaining: usize,

    pub elapsed: Duration,

    /// True if the run stopped because shutdown was requested
    pub interrupted: bool,
}

impl CrawlSummary {
    /// Fetched pages per second
    pub fn rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.fetched as f64 / secs
        } else {
            0.0
        }
    }
}

impl fmt::Display for CrawlSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Crawl {}",
            if self.interrupted {
                "interrupted"
            } else {
                "complete"
            }
        )?;
        writeln!(f, "  Pages fetched:   {}", self.fetched)?;
        writeln!(f, "  URLs queued:     {}", self.enqueued)?;
        writeln!(f, "  URLs skipped:    {}", self.skipped)?;
        writeln!(f, "  Visited total:   {}", self.visited)?;
        writeln!(f, "  Still pending:   {}", self.remaining)?;
        write!(
            f,
            "  Elapsed:         {:.1}s ({:.2} pages/sec)",
            self.elapsed.as_secs_f64(),
            self.rate()
        )
    }
}

/// Main crawler coordinator structure
pub struct Coordinator<'s, S: Storage + ?Sized> {
    storage: &'s mut S,
    frontier: Frontier,
    fetcher: Fetcher,
    writer: BatchedWriter<NewUrl>,
    seeds: Vec<String>,
    max_workers: usize,
    progress_interval: usize,
    signal: ShutdownSignal,
}

impl<'s, S: Storage + ?Sized> Coordinator<'s, S> {
    /// Creates a coordinator with an empty frontier
    ///
    /// Call [`Coordinator::resume`] before [`Coordinator::run`].
    pub fn new(
        storage: &'s mut S,
        config: &CrawlerConfig,
        fetcher: Fetcher,
        signal: ShutdownSignal,
    ) -> Self {
        Self {
            storage,
            frontier: Frontier::new(Blacklist::new(&config.blacklist)),
            fetcher,
            writer: BatchedWriter::new(config.buffer_limit),
            seeds: config.seeds.clone(),
            max_workers: config.max_workers.max(1),
            progress_interval: config.progress_interval,
            signal,
        }
    }

    /// Loads the frontier from the store, or seeds it
    ///
    /// Processed URLs become visited and pending URLs are queued. If the
    /// store has no pending URL, each configured seed is canonicalized,
    /// queued, and persisted as pending.
    pub fn resume(&mut self) -> ResumeSource {
        let stored = self
            .storage
            .urls_with_status(UrlStatus::Processed)
            .and_then(|processed| {
                self.storage
                    .urls_with_status(UrlStatus::Pending)
                    .map(|pending| (processed, pending))
            });

        match stored {
            Ok((processed, pending)) if !pending.is_empty() => {
                let counts = ResumeSource::Restored {
                    processed: processed.len(),
                    pending: pending.len(),
                };
                tracing::info!(
                    "Resuming crawl: {} processed, {} pending URLs in store",
                    processed.len(),
                    pending.len()
                );
                self.frontier.restore(processed, pending);
                counts
            }
            Ok((processed, _)) => {
                if !processed.is_empty() {
                    tracing::info!(
                        "No pending URLs; seeding over {} processed URLs",
                        processed.len()
                    );
                }
                self.frontier.restore(processed, Vec::<String>::new());
                self.seed()
            }
            Err(e) => {
                tracing::warn!("Failed to load crawl state, starting from seeds: {}", e);
                self.seed()
            }
        }
    }

    fn seed(&mut self) -> ResumeSource {
        let mut seeds = 0;
        for seed in &self.seeds {
            let canonical = match canonicalize(seed) {
                Ok(canonical) => canonical,
                Err(e) => {
                    tracing::warn!("Skipping seed {}: {}", seed, e);
                    continue;
                }
            };

            if self.frontier.seed(canonical.clone()) {
                seeds += 1;
                if let Err(e) = self
                    .writer
                    .add(&mut *self.storage, NewUrl::pending(canonical))
                {
                    tracing::error!("Failed to persist seed {}: {}", seed, e);
                }
            }
        }

        if let Err(e) = self.writer.flush(&mut *self.storage) {
            tracing::error!("Failed to persist seeds: {}", e);
        }
        tracing::info!("Seeded frontier with {} URLs", seeds);
        ResumeSource::Seeded { seeds }
    }

    /// Runs the crawl loop until the queue drains or shutdown is requested
    ///
    /// Each round pops `min(max_workers, queue length)` URLs, fetches them
    /// concurrently, and merges the results as they complete. The batch size
    /// is the worker limit, so at most `max_workers` fetches are in flight.
    /// A requested shutdown is honoured between rounds: an in-flight batch
    /// always finishes and its results are persisted.
    pub async fn run(&mut self) -> CrawlSummary {
        let start = Instant::now();

        let mut fetched = 0;
        let mut enqueued = 0;
        let mut skipped = 0;
        let mut next_report = self.progress_interval;
        let mut interrupted = false;

        tracing::info!(
            "Starting crawl with {} queued URLs and {} workers",
            self.frontier.queue_len(),
            self.max_workers
        );

        while !self.frontier.is_empty() {
            if self.signal.is_requested() {
                tracing::info!("Shutdown requested, stopping crawl");
                interrupted = true;
                break;
            }

            let plan = self.frontier.next_batch(self.max_workers);
            skipped += self.settle_undispatched(&plan);

            let mut tasks = JoinSet::new();
            for url in plan.dispatch {
                let fetcher = self.fetcher.clone();
                tasks.spawn(async move { fetcher.fetch_links(&url).await });
            }

            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok(batch) => {
                        let outcome = self.handle_fetched(batch);
                        fetched += 1;
                        enqueued += outcome.enqueued;
                        skipped += outcome.blacklisted;
                    }
                    Err(e) => tracing::error!("Fetch worker failed: {}", e),
                }
            }

            if self.progress_interval > 0 && fetched >= next_report {
                let elapsed = start.elapsed();
                tracing::info!(
                    "Progress: {} visited, {} queued, {} fetched in {:.1}s ({:.2} pages/sec)",
                    self.frontier.visited_len(),
                    self.frontier.queue_len(),
                    fetched,
                    elapsed.as_secs_f64(),
                    fetched as f64 / elapsed.as_secs_f64().max(f64::EPSILON)
                );
                while next_report <= fetched {
                    next_report += self.progress_interval;
                }
            }
        }

        self.finish();

        let summary = CrawlSummary {
            fetched,
            enqueued,
            skipped,
            visited: self.frontier.visited_len(),
            remaining: self.frontier.queue_len(),
            elapsed: start.elapsed(),
            interrupted,
        };
        tracing::info!(
            "Crawl {}: {} pages fetched, {} URLs queued in {:?}",
            if interrupted { "interrupted" } else { "finished" },
            summary.fetched,
            summary.enqueued,
            summary.elapsed
        );
        summary
    }

    /// Merges the result of one fetch into the frontier and the store
    ///
    /// The source URL is marked processed. Each new link is queued and
    /// buffered as pending; each new blacklisted link is stored as processed
    /// right away.
    pub fn handle_fetched(&mut self, batch: LinkBatch) -> FetchedOutcome {
        self.persist_processed(&batch.source);

        let mut outcome = FetchedOutcome::default();
        for link in batch.links {
            match self.frontier.admit(&link) {
                Admission::Enqueued => {
                    outcome.enqueued += 1;
                    if let Err(e) = self
                        .writer
                        .add(&mut *self.storage, NewUrl::pending(link.as_str()))
                    {
                        tracing::error!("Failed to persist queued URLs: {}", e);
                    }
                }
                Admission::Blacklisted => {
                    outcome.blacklisted += 1;
                    tracing::debug!("Blacklisted link {} from {}", link, batch.source);
                    self.persist_processed(&link);
                }
                Admission::Known => {}
            }
        }

        tracing::debug!(
            "Fetched {}: {} new links, {} blacklisted",
            batch.source,
            outcome.enqueued,
            outcome.blacklisted
        );
        outcome
    }

    /// Marks every popped URL that will not be fetched as processed
    ///
    /// Blacklisted and invalid URLs are never fetched. Aliases are stored
    /// URLs whose canonical form is fetched or was already visited; without
    /// the mark they would load as pending on every resume. Returns the
    /// number of skipped (blacklisted or invalid) URLs.
    fn settle_undispatched(&mut self, plan: &BatchPlan) -> usize {
        for url in &plan.blacklisted {
            tracing::debug!("Skipping blacklisted URL {}", url);
            self.persist_processed(url);
        }
        for url in plan.invalid.iter().chain(&plan.aliases) {
            self.persist_processed(url);
        }
        plan.blacklisted.len() + plan.invalid.len()
    }

    fn persist_processed(&mut self, url: &str) {
        if let Err(e) = self.storage.mark_processed(url) {
            tracing::error!("Failed to mark {} as processed: {}", url, e);
        }
    }

    /// Flushes buffered frontier entries
    fn finish(&mut self) {
        if let Err(e) = self.writer.finish(&mut *self.storage) {
            tracing::error!("Failed to flush queued URLs: {}", e);
        }
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    pub fn buffered(&self) -> usize {
        self.writer.len()
    }
}
