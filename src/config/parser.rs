use crate::config::types::{
    Config, CrawlerConfig, HttpConfig, IndexerConfig, RawConfig, StoreConfig,
};
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use trawl::config::load_config;
///
/// let config = load_config(Path::new("trawl.toml")).unwrap();
/// println!("Workers: {}", config.crawler.max_workers);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from TOML text
///
/// Parsing happens in two phases: the raw file is deserialized with every
/// key optional, then all missing required keys are collected and reported
/// in one [`ConfigError::MissingKeys`] error. Defaults fill in the rest
/// before range validation.
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let raw: RawConfig = toml::from_str(content)?;

    let mut missing = Vec::new();
    let database_path = required(raw.store.database_path, "store.database-path", &mut missing);

    let Some(database_path) = database_path.filter(|_| missing.is_empty()) else {
        return Err(ConfigError::MissingKeys(missing));
    };

    let http_defaults = HttpConfig::default();
    let crawler_defaults = CrawlerConfig::default();
    let indexer_defaults = IndexerConfig::default();

    let config = Config {
        store: StoreConfig { database_path },
        http: HttpConfig {
            user_agent: raw.http.user_agent.unwrap_or(http_defaults.user_agent),
            request_timeout_secs: raw
                .http
                .request_timeout_secs
                .unwrap_or(http_defaults.request_timeout_secs),
        },
        crawler: CrawlerConfig {
            seeds: raw.crawler.seeds.unwrap_or(crawler_defaults.seeds),
            blacklist: raw.crawler.blacklist.unwrap_or(crawler_defaults.blacklist),
            max_workers: raw.crawler.max_workers.unwrap_or(crawler_defaults.max_workers),
            buffer_limit: raw
                .crawler
                .buffer_limit
                .unwrap_or(crawler_defaults.buffer_limit),
            progress_interval: raw
                .crawler
                .progress_interval
                .unwrap_or(crawler_defaults.progress_interval),
        },
        indexer: IndexerConfig {
            page_size: raw.indexer.page_size.unwrap_or(indexer_defaults.page_size),
            buffer_limit: raw
                .indexer
                .buffer_limit
                .unwrap_or(indexer_defaults.buffer_limit),
            reindex: raw.indexer.reindex.unwrap_or(indexer_defaults.reindex),
        },
    };

    validate(&config)?;
    Ok(config)
}

/// Records `key` as missing if `value` is absent
fn required<T>(value: Option<T>, key: &str, missing: &mut Vec<String>) -> Option<T> {
    if value.is_none() {
        missing.push(key.to_string());
    }
    value
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so runs can be matched to the configuration they used.
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&content);
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}
