use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Default browser-like user agent
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
                                      AppleWebKit/537.36 (KHTML, like Gecko) \
                                      Chrome/115.0.0.0 Safari/537.36";

/// Main configuration structure for Trawl
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub store: StoreConfig,
    pub http: HttpConfig,
    pub crawler: CrawlerConfig,
    pub indexer: IndexerConfig,
}

/// Work store configuration
#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    /// Path to the SQLite database file
    pub database_path: PathBuf,
}

/// HTTP client configuration shared by the crawler and the indexer
#[derive(Debug, Clone, PartialEq)]
pub struct HttpConfig {
    pub user_agent: String,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

impl HttpConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout_secs: 5,
        }
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlerConfig {
    /// URLs to start from when the store has no pending work
    pub seeds: Vec<String>,

    /// Host substrings that are never fetched
    pub blacklist: Vec<String>,

    /// Maximum number of concurrent fetches, also the batch size
    pub max_workers: usize,

    /// Number of discovered URLs buffered before a bulk insert
    pub buffer_limit: usize,

    /// Log progress every this many fetched pages; 0 disables it
    pub progress_interval: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            seeds: Vec::new(),
            blacklist: Vec::new(),
            max_workers: 20,
            buffer_limit: 50,
            progress_interval: 10,
        }
    }
}

/// Indexer behavior configuration
#[derive(Debug, Clone, PartialEq)]
pub struct IndexerConfig {
    /// Number of processed URLs read from the store per page
    pub page_size: usize,

    /// Number of inverted index rows buffered before a bulk insert
    pub buffer_limit: usize,

    /// Re-index pages that are already indexed
    pub reindex: bool,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            page_size: 100,
            buffer_limit: 100,
            reindex: false,
        }
    }
}

// ===== Raw file representation =====
//
// Every key is optional here so that all missing required keys can be
// reported together instead of failing on the first one.

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub(crate) struct RawConfig {
    #[serde(default)]
    pub store: RawStoreConfig,
    #[serde(default)]
    pub http: RawHttpConfig,
    #[serde(default)]
    pub crawler: RawCrawlerConfig,
    #[serde(default)]
    pub indexer: RawIndexerConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub(crate) struct RawStoreConfig {
    pub database_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub(crate) struct RawHttpConfig {
    pub user_agent: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub(crate) struct RawCrawlerConfig {
    pub seeds: Option<Vec<String>>,
    pub blacklist: Option<Vec<String>>,
    pub max_workers: Option<usize>,
    pub buffer_limit: Option<usize>,
    pub progress_interval: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub(crate) struct RawIndexerConfig {
    pub page_size: Option<usize>,
    pub buffer_limit: Option<usize>,
    pub reindex: Option<bool>,
}
