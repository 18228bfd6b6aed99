use crate::config::types::{Config, CrawlerConfig, InputConfig, TargetConfig};
use crate::ConfigError;
use url::Url;

/// Upper bound on concurrent workers
const MAX_WORKERS: usize = 1000;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_target_config(&config.target)?;
    validate_input_config(&config.input)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.workers < 1 || config.workers > MAX_WORKERS {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and {}, got {}",
            MAX_WORKERS, config.workers
        )));
    }

    if config.fetch_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "fetch_timeout_secs must be >= 1, got {}",
            config.fetch_timeout_secs
        )));
    }

    Ok(())
}

/// Validates the search target
fn validate_target_config(config: &TargetConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url '{}' must use http or https",
            config.base_url
        )));
    }

    if config.query.trim().is_empty() {
        return Err(ConfigError::Validation("query cannot be empty".to_string()));
    }

    if config.block_page_title.is_empty() {
        return Err(ConfigError::Validation(
            "block_page_title cannot be empty".to_string(),
        ));
    }

    if config.no_results_marker.is_empty() {
        return Err(ConfigError::Validation(
            "no_results_marker cannot be empty".to_string(),
        ));
    }

    if config.user_agent.is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates input file settings
fn validate_input_config(config: &InputConfig) -> Result<(), ConfigError> {
    if config.proxy_list.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "proxy_list cannot be empty".to_string(),
        ));
    }

    Ok(())
}
