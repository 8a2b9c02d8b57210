//! docsift: site crawler and Markdown cleaning pipeline
//!
//! This crate fetches every page reachable from a start URL within one site,
//! converts each page to Markdown, and can rewrite those documents through an
//! OpenAI-compatible chat-completion service to prepare them for indexing.

pub mod cleaner;
pub mod config;
pub mod crawler;
pub mod document;
pub mod output;
pub mod progress;
pub mod rewrite;
pub mod state;
pub mod url;

use thiserror::Error;

/// Errors that abort a whole crawl
///
/// Single-page failures never surface here; they are logged and counted in
/// the [`crawler::CrawlReport`].
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Invalid start URL: {0}")]
    InvalidStartUrl(#[from] UrlError),

    #[error("Invalid request header {name}: {message}")]
    InvalidHeader { name: String, message: String },

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use cleaner::{CleanError, CleaningPipeline, CleaningResult};
pub use config::Config;
pub use crawler::{CrawlReport, CrawlRequest, Crawler};
pub use progress::{LogReporter, NoopReporter, ProgressReporter};
pub use rewrite::{RewriteClient, RewriteError, Rewriter};
pub use state::PageState;
pub use url::{normalize_url, same_site};
