//! Statistics generation from the work store
//!
//! This module provides functionality for extracting and displaying
//! crawl and index statistics from the storage layer.

use crate::state::{IndexState, UrlStatus};
use crate::storage::Storage;
use crate::TrawlError;
use std::collections::HashMap;
use std::fmt::Write;

/// Store statistics summary
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexStatistics {
    /// Total number of URLs in the crawl queue
    pub total_urls: u64,

    /// Count of URLs by crawl status
    pub urls_by_status: HashMap<UrlStatus, u64>,

    /// Count of pages by index state (pages never considered are absent)
    pub pages_by_index_state: HashMap<IndexState, u64>,

    /// Number of inverted index rows
    pub index_entries: u64,

    /// Number of distinct keywords
    pub distinct_keywords: u64,
}

impl IndexStatistics {
    pub fn urls(&self, status: UrlStatus) -> u64 {
        self.urls_by_status.get(&status).copied().unwrap_or(0)
    }

    pub fn pages(&self, state: IndexState) -> u64 {
        self.pages_by_index_state.get(&state).copied().unwrap_or(0)
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(IndexStatistics)` - Successfully loaded statistics
/// * `Err(TrawlError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn Storage) -> Result<IndexStatistics, TrawlError> {
    let mut stats = IndexStatistics::default();

    for status in UrlStatus::all() {
        let count = storage.count_urls_by_status(status)?;
        stats.total_urls += count;
        stats.urls_by_status.insert(status, count);
    }

    for state in IndexState::all() {
        let count = storage.count_pages_by_index_state(state)?;
        stats.pages_by_index_state.insert(state, count);
    }

    stats.index_entries = storage.count_index_entries()?;
    stats.distinct_keywords = storage.count_distinct_keywords()?;

    Ok(stats)
}

/// Renders statistics as a plain text report
pub fn format_statistics(stats: &IndexStatistics) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Trawl Statistics ===\n");

    let _ = writeln!(out, "Crawl Queue:");
    let _ = writeln!(out, "  Total URLs: {}", stats.total_urls);
    for status in UrlStatus::all() {
        let count = stats.urls(status);
        let _ = writeln!(
            out,
            "  {}: {} ({:.1}%)",
            status,
            count,
            percentage(count, stats.total_urls)
        );
    }
    let _ = writeln!(out);

    let processed = stats.urls(UrlStatus::Processed);
    let _ = writeln!(out, "Index Status:");
    for state in IndexState::all() {
        let _ = writeln!(out, "  {}: {}", state, stats.pages(state));
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "Inverted Index:");
    let _ = writeln!(out, "  Entries: {}", stats.index_entries);
    let _ = writeln!(out, "  Distinct keywords: {}", stats.distinct_keywords);
    let _ = writeln!(out);

    let indexed = stats.pages(IndexState::Indexed);
    let _ = write!(
        out,
        "Coverage: {:.1}% ({} / {} processed pages indexed)",
        percentage(indexed, processed),
        indexed,
        processed
    );
    out
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &IndexStatistics) {
    println!("{}", format_statistics(stats));
}

fn percentage(part: u64, whole: u64) -> f64 {
    if whole > 0 {
        (part as f64 / whole as f64) * 100.0
    } else {
        0.0
    }
}
