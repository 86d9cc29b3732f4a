//! In-memory crawl frontier
//!
//! The frontier is owned by the crawl controller alone. It tracks:
//! - `visited`: every canonical URL that was dispatched or skipped; only grows
//! - `queue`: canonical URLs awaiting fetch, FIFO
//! - `queued`: membership index over `queue`
//! - the blacklist of host substrings
//!
//! A URL moves `discovered -> enqueued -> (blacklisted | dispatched)`. The
//! store is updated by the caller based on the values returned here.

use crate::url::{canonicalize, Blacklist};
use std::collections::{HashSet, VecDeque};

/// Result of offering a discovered link to the frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// New URL, appended to the queue; persist it as pending
    Enqueued,

    /// New URL on the blacklist; persist it as processed, never fetch it
    Blacklisted,

    /// Already visited or queued; nothing to do
    Known,
}

/// URLs popped from the queue for one dispatch round
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchPlan {
    /// Canonical URLs to fetch, each at most once per process
    pub dispatch: Vec<String>,

    /// Popped URLs that matched the blacklist
    pub blacklisted: Vec<String>,

    /// Popped URLs that could not be canonicalized
    pub invalid: Vec<String>,

    /// Popped URLs whose stored form differs from their canonical form
    pub aliases: Vec<String>,
}

impl BatchPlan {
    pub fn is_empty(&self) -> bool {
        self.dispatch.is_empty()
            && self.blacklisted.is_empty()
            && self.invalid.is_empty()
            && self.aliases.is_empty()
    }
}

/// Breadth-first crawl frontier
#[derive(Debug)]
pub struct Frontier {
    visited: HashSet<String>,
    queue: VecDeque<String>,
    queued: HashSet<String>,
    blacklist: Blacklist,
}

impl Frontier {
    pub fn new(blacklist: Blacklist) -> Self {
        Self {
            visited: HashSet::new(),
            queue: VecDeque::new(),
            queued: HashSet::new(),
            blacklist,
        }
    }

    /// Restores state loaded from the store
    ///
    /// `processed` URLs become visited; `pending` URLs are queued in order,
    /// unless they are already visited.
    pub fn restore<P, Q>(&mut self, processed: P, pending: Q)
    where
        P: IntoIterator<Item = String>,
        Q: IntoIterator<Item = String>,
    {
        self.visited.extend(processed);
        for url in pending {
            self.push(url);
        }
    }

    /// Queues a seed URL; returns false if it is already known
    pub fn seed(&mut self, canonical: String) -> bool {
        self.push(canonical)
    }

    fn push(&mut self, canonical: String) -> bool {
        if self.visited.contains(&canonical) || self.queued.contains(&canonical) {
            return false;
        }
        self.queued.insert(canonical.clone());
        self.queue.push_back(canonical);
        true
    }

    /// Pops up to `max` URLs and sorts them into a dispatch plan
    ///
    /// Dispatched URLs are marked visited here, so a URL is handed out at
    /// most once for the lifetime of the frontier. A popped URL that is not
    /// in canonical form is reported as an alias whether or not its canonical
    /// form is dispatched.
    pub fn next_batch(&mut self, max: usize) -> BatchPlan {
        let take = max.min(self.queue.len());
        let mut plan = BatchPlan::default();

        for url in self.queue.drain(..take) {
            self.queued.remove(&url);

            if self.blacklist.is_blacklisted(&url) {
                self.visited.insert(url.clone());
                plan.blacklisted.push(url);
                continue;
            }

            match canonicalize(&url) {
                Ok(canonical) => {
                    if self.visited.insert(canonical.clone()) {
                        plan.dispatch.push(canonical.clone());
                    }
                    if canonical != url {
                        plan.aliases.push(url);
                    }
                }
                Err(e) => {
                    tracing::debug!("Dropping {}: {}", url, e);
                    self.visited.insert(url.clone());
                    plan.invalid.push(url);
                }
            }
        }

        plan
    }

    /// Offers a canonical link discovered on a fetched page
    pub fn admit(&mut self, link: &str) -> Admission {
        if self.visited.contains(link) || self.queued.contains(link) {
            return Admission::Known;
        }

        if self.blacklist.is_blacklisted(link) {
            self.visited.insert(link.to_string());
            return Admission::Blacklisted;
        }

        self.queued.insert(link.to_string());
        self.queue.push_back(link.to_string());
        Admission::Enqueued
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn visited_len(&self) -> usize {
        self.visited.len()
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    pub fn is_queued(&self, url: &str) -> bool {
        self.queued.contains(url)
    }

    /// Snapshot of the queue, front first
    pub fn queued_urls(&self) -> Vec<String> {
        self.queue.iter().cloned().collect()
    }

    pub fn blacklist(&self) -> &Blacklist {
        &self.blacklist
    }
}
