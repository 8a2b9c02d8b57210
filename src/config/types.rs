use serde::Deserialize;

/// Main configuration structure for docsift
///
/// Every field has a default, so an empty (or absent) file yields a usable
/// configuration. The value is built once and handed to the crawler and the
/// cleaning pipeline; nothing in the library reads the environment.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub rewrite: RewriteConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum number of link hops from the start URL
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Per-page request timeout (seconds)
    #[serde(rename = "request-timeout")]
    pub request_timeout: u64,

    /// User-Agent header sent with every page request
    #[serde(rename = "user-agent")]
    pub user_agent: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: 5,
            request_timeout: 30,
            user_agent: format!("docsift/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Rewrite service and cleaning pipeline configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RewriteConfig {
    /// Bearer token for the chat-completion service
    #[serde(rename = "api-key")]
    pub api_key: String,

    /// Base URL of the OpenAI-compatible service
    #[serde(rename = "api-endpoint")]
    pub api_endpoint: String,

    /// Model identifier sent with each request
    pub model: String,

    /// Total attempts per file, including the first one
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Per-call timeout (seconds)
    pub timeout: u64,

    /// Prefix prepended to the cleaned file's name
    #[serde(rename = "output-prefix")]
    pub output_prefix: String,

    /// Maximum length of the composed user message, in characters
    #[serde(rename = "max-content-length")]
    pub max_content_length: usize,

    /// Completion token cap passed to the service
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Encoding label tried when a file is not valid UTF-8
    #[serde(rename = "fallback-encoding")]
    pub fallback_encoding: String,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_endpoint: "https://api.deepseek.com".to_string(),
            model: "deepseek-chat".to_string(),
            max_retries: 3,
            timeout: 120,
            output_prefix: "Cleandone-".to_string(),
            max_content_length: 100_000,
            max_tokens: 4000,
            fallback_encoding: "gbk".to_string(),
        }
    }
}
