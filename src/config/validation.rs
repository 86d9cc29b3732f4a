use crate::config::types::{Config, CrawlerConfig, HttpConfig, IndexerConfig, StoreConfig};
use crate::ConfigError;
use url::Url;

/// Upper bound for the fetch worker pool
pub const MAX_WORKERS_LIMIT: usize = 256;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_store_config(&config.store)?;
    validate_http_config(&config.http)?;
    validate_crawler_config(&config.crawler)?;
    validate_indexer_config(&config.indexer)?;
    Ok(())
}

fn validate_store_config(config: &StoreConfig) -> Result<(), ConfigError> {
    if config.database_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request-timeout-secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_workers < 1 || config.max_workers > MAX_WORKERS_LIMIT {
        return Err(ConfigError::Validation(format!(
            "max-workers must be between 1 and {}, got {}",
            MAX_WORKERS_LIMIT, config.max_workers
        )));
    }

    if config.buffer_limit < 1 {
        return Err(ConfigError::Validation(format!(
            "crawler buffer-limit must be >= 1, got {}",
            config.buffer_limit
        )));
    }

    for seed in &config.seeds {
        validate_seed(seed)?;
    }

    if config.blacklist.iter().any(|entry| entry.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "blacklist entries cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_seed(seed: &str) -> Result<(), ConfigError> {
    let url = Url::parse(seed)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "Seed URL '{}' must use HTTP or HTTPS",
            seed
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "Seed URL '{}' has no host",
            seed
        )));
    }

    Ok(())
}

fn validate_indexer_config(config: &IndexerConfig) -> Result<(), ConfigError> {
    if config.page_size < 1 {
        return Err(ConfigError::Validation(format!(
            "page-size must be >= 1, got {}",
            config.page_size
        )));
    }

    if config.buffer_limit < 1 {
        return Err(ConfigError::Validation(format!(
            "indexer buffer-limit must be >= 1, got {}",
            config.buffer_limit
        )));
    }

    Ok(())
}
