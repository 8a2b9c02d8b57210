//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with the configured user agent and caller headers
//! - Following redirects only while they stay on the crawled site
//! - GET requests to fetch page content
//! - Content-Type checks
//! - Error classification into page states

use crate::config::CrawlerConfig;
use crate::state::PageState;
use crate::url::same_site;
use crate::CrawlError;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, COOKIE, LOCATION};
use reqwest::{redirect::Policy, Client, StatusCode};
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

/// Longest redirect chain followed before the fetch fails
pub const MAX_REDIRECTS: usize = 10;

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched an HTML page
    Success {
        /// Final URL after redirects
        final_url: Url,
        /// HTTP status code
        status_code: u16,
        /// Page body content
        body: String,
    },

    /// Page is not HTML (Content-Type mismatch)
    ContentMismatch {
        /// The actual Content-Type received
        content_type: String,
    },

    /// Redirect chain left the crawled site; the target was not requested
    RedirectOffSite {
        /// The off-site redirect target
        location: String,
    },

    /// HTTP error that maps to a specific page state
    HttpError {
        /// The HTTP status code
        status_code: u16,
        /// The page state this error maps to
        state: PageState,
    },

    /// Network error (connection refused, timeout, etc.)
    NetworkError {
        /// Error description
        error: String,
        /// The page state this error maps to
        state: PageState,
    },
}

impl FetchResult {
    /// Page state this result ends in
    pub fn state(&self) -> PageState {
        match self {
            Self::Success { .. } => PageState::Processed,
            Self::ContentMismatch { .. } => PageState::ContentMismatch,
            Self::RedirectOffSite { .. } => PageState::Failed,
            Self::HttpError { state, .. } | Self::NetworkError { state, .. } => *state,
        }
    }
}

/// Builds the HTTP client for one crawl
///
/// Caller headers and cookies are installed as default headers, so every
/// request of the crawl carries them. Cookies are joined into a single
/// `Cookie` header in key order.
///
/// Redirects are followed only while the target shares `scope`'s origin. An
/// off-site hop stops the chain and the 3xx response is returned as is, so
/// the off-site URL is never requested.
///
/// # Arguments
///
/// * `config` - Crawler settings (user agent, request timeout)
/// * `scope` - The crawl's start URL
/// * `headers` - Optional extra request headers
/// * `cookies` - Optional cookies
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(CrawlError)` - A header was invalid or the client failed to build
///
/// # Example
///
/// ```
/// use docsift::config::CrawlerConfig;
/// use docsift::crawler::build_http_client;
/// use std::collections::BTreeMap;
/// use url::Url;
///
/// let scope = Url::parse("https://example.com/").unwrap();
/// let mut headers = BTreeMap::new();
/// headers.insert("Accept-Language".to_string(), "en".to_string());
///
/// let client = build_http_client(&CrawlerConfig::default(), &scope, Some(&headers), None);
/// assert!(client.is_ok());
/// ```
pub fn build_http_client(
    config: &CrawlerConfig,
    scope: &Url,
    headers: Option<&BTreeMap<String, String>>,
    cookies: Option<&BTreeMap<String, String>>,
) -> Result<Client, CrawlError> {
    let default_headers = default_headers(headers, cookies)?;

    let client = Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.request_timeout))
        .connect_timeout(Duration::from_secs(10))
        .default_headers(default_headers)
        .redirect(site_redirect_policy(scope.clone()))
        .gzip(true)
        .brotli(true)
        .build()?;

    Ok(client)
}

/// Follows same-site hops up to [`MAX_REDIRECTS`], stops at the first off-site one
fn site_redirect_policy(scope: Url) -> Policy {
    Policy::custom(move |attempt| {
        if attempt.previous().len() > MAX_REDIRECTS {
            attempt.error("too many redirects")
        } else if same_site(&scope, attempt.url()) {
            attempt.follow()
        } else {
            attempt.stop()
        }
    })
}

fn default_headers(
    headers: Option<&BTreeMap<String, String>>,
    cookies: Option<&BTreeMap<String, String>>,
) -> Result<HeaderMap, CrawlError> {
    let mut map = HeaderMap::new();

    for (name, value) in headers.into_iter().flatten() {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| CrawlError::InvalidHeader {
                name: name.clone(),
                message: e.to_string(),
            })?;
        let header_value = HeaderValue::from_str(value).map_err(|e| CrawlError::InvalidHeader {
            name: name.clone(),
            message: e.to_string(),
        })?;
        map.insert(header_name, header_value);
    }

    if let Some(cookies) = cookies.filter(|c| !c.is_empty()) {
        let joined = cookies
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("; ");
        let value = HeaderValue::from_str(&joined).map_err(|e| CrawlError::InvalidHeader {
            name: COOKIE.to_string(),
            message: e.to_string(),
        })?;
        map.insert(COOKIE, value);
    }

    Ok(map)
}

/// Returns true if a Content-Type value names an HTML document
///
/// A missing or empty value counts as HTML.
pub fn is_html_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    essence.is_empty() || essence == "text/html" || essence == "application/xhtml+xml"
}

/// Fetches one page and classifies the outcome
///
/// # Classification
///
/// | Condition | Result |
/// |-----------|--------|
/// | 2xx with HTML (or no) Content-Type | Success |
/// | 2xx with other Content-Type | ContentMismatch |
/// | 3xx left unfollowed (off-site target) | RedirectOffSite |
/// | HTTP 404 / 410 | DeadLink |
/// | Other non-success status | Failed |
/// | Timeout / connection error | Unreachable |
/// | Body read error | Failed |
///
/// Same-site redirects are followed by the client.
pub async fn fetch_url(client: &Client, url: &Url) -> FetchResult {
    let response = match client.get(url.clone()).send().await {
        Ok(response) => response,
        Err(e) => return classify_transport_error(&e),
    };

    let status = response.status();
    let final_url = response.url().clone();

    if status.is_redirection() {
        if let Some(location) = response.headers().get(LOCATION).and_then(|v| v.to_str().ok()) {
            return FetchResult::RedirectOffSite {
                location: location.to_string(),
            };
        }
    }

    if !status.is_success() {
        let state = match status {
            StatusCode::NOT_FOUND | StatusCode::GONE => PageState::DeadLink,
            _ => PageState::Failed,
        };
        return FetchResult::HttpError {
            status_code: status.as_u16(),
            state,
        };
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if !is_html_content_type(&content_type) {
        return FetchResult::ContentMismatch { content_type };
    }

    match response.text().await {
        Ok(body) => FetchResult::Success {
            final_url,
            status_code: status.as_u16(),
            body,
        },
        Err(e) => FetchResult::NetworkError {
            error: e.to_string(),
            state: PageState::Failed,
        },
    }
}

fn classify_transport_error(e: &reqwest::Error) -> FetchResult {
    if e.is_timeout() {
        FetchResult::NetworkError {
            error: "Request timeout".to_string(),
            state: PageState::Unreachable,
        }
    } else if e.is_connect() {
        FetchResult::NetworkError {
            error: format!("Connection failed: {}", e),
            state: PageState::Unreachable,
        }
    } else {
        FetchResult::NetworkError {
            error: e.to_string(),
            state: PageState::Failed,
        }
    }
}
