use crate::config::types::{Config, CrawlerConfig, RewriteConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_rewrite_config(&config.rewrite)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.request_timeout < 1 {
        return Err(ConfigError::Validation(format!(
            "request_timeout must be >= 1s, got {}s",
            config.request_timeout
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates rewrite configuration
///
/// An empty API key passes; `RewriteClient::new` rejects it.
fn validate_rewrite_config(config: &RewriteConfig) -> Result<(), ConfigError> {
    let endpoint = Url::parse(&config.api_endpoint)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid api_endpoint: {}", e)))?;

    if endpoint.scheme() != "http" && endpoint.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "api_endpoint must use http or https, got '{}'",
            endpoint.scheme()
        )));
    }

    if config.model.trim().is_empty() {
        return Err(ConfigError::Validation("model cannot be empty".to_string()));
    }

    if config.max_retries < 1 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be >= 1, got {}",
            config.max_retries
        )));
    }

    if config.timeout < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout must be >= 1s, got {}s",
            config.timeout
        )));
    }

    if config.max_content_length < 1 {
        return Err(ConfigError::Validation(
            "max_content_length must be >= 1".to_string(),
        ));
    }

    validate_output_prefix(&config.output_prefix)?;

    if encoding_rs::Encoding::for_label(config.fallback_encoding.as_bytes()).is_none() {
        return Err(ConfigError::Validation(format!(
            "Unknown fallback_encoding '{}'",
            config.fallback_encoding
        )));
    }

    Ok(())
}

/// The prefix becomes part of a file name, so it may not introduce a path
fn validate_output_prefix(prefix: &str) -> Result<(), ConfigError> {
    if prefix.is_empty() {
        return Err(ConfigError::Validation(
            "output_prefix cannot be empty".to_string(),
        ));
    }

    if prefix.contains('/') || prefix.contains('\\') {
        return Err(ConfigError::Validation(format!(
            "output_prefix cannot contain path separators, got '{}'",
            prefix
        )));
    }

    Ok(())
}
