//! Traversal engine - the main crawl loop
//!
//! One [`Crawler::crawl`] call owns its frontier and visited set; nothing is
//! shared between calls and nothing is persisted apart from the documents.

use crate::config::CrawlerConfig;
use crate::crawler::parser::parse_html;
use crate::crawler::{build_http_client, fetch_url, FetchResult};
use crate::document::Document;
use crate::output::DocumentSink;
use crate::state::PageState;
use crate::url::{normalize_url, same_site, site_key};
use crate::CrawlError;
use reqwest::Client;
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::path::PathBuf;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Input of one crawl
#[derive(Debug, Clone, Default)]
pub struct CrawlRequest {
    /// Starting URL, also the text shown in the start page's header
    pub start_url: String,

    /// Directory receiving one `.md` file per fetched page
    pub output_dir: PathBuf,

    /// Extra headers sent with every request
    pub headers: Option<BTreeMap<String, String>>,

    /// Cookies sent with every request
    pub cookies: Option<BTreeMap<String, String>>,
}

impl CrawlRequest {
    pub fn new(start_url: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            start_url: start_url.into(),
            output_dir: output_dir.into(),
            headers: None,
            cookies: None,
        }
    }

    pub fn with_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.headers = Some(headers);
        self
    }

    pub fn with_cookies(mut self, cookies: BTreeMap<String, String>) -> Self {
        self.cookies = Some(cookies);
        self
    }
}

/// Summary of a finished crawl
#[derive(Debug, Clone, Default)]
pub struct CrawlReport {
    /// Files written, in fetch order
    pub written: Vec<PathBuf>,

    /// URLs requested, in fetch order
    pub fetched: Vec<Url>,

    /// Terminal state counts for fetched URLs
    pub states: BTreeMap<PageState, u64>,

    /// Links discarded because they point to another site
    pub out_of_scope: u64,

    /// Frontier entries skipped for exceeding the maximum depth
    pub depth_limited: u64,

    /// Whether the crawl stopped early on cancellation
    pub cancelled: bool,
}

impl CrawlReport {
    pub fn count(&self, state: PageState) -> u64 {
        self.states.get(&state).copied().unwrap_or(0)
    }

    pub fn pages_fetched(&self) -> usize {
        self.fetched.len()
    }

    fn record(&mut self, state: PageState) {
        *self.states.entry(state).or_insert(0) += 1;
    }
}

/// A URL waiting to be fetched
#[derive(Debug, Clone)]
struct FrontierEntry {
    url: Url,
    depth: u32,
}

/// Bounded, site-scoped crawler
pub struct Crawler {
    config: CrawlerConfig,
    cancel: CancellationToken,
}

impl Crawler {
    pub fn new(config: &CrawlerConfig) -> Self {
        Self {
            config: config.clone(),
            cancel: CancellationToken::new(),
        }
    }

    /// Stops the crawl before the next fetch once `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Crawls every page reachable from the start URL within its site
    ///
    /// # Algorithm
    ///
    /// FIFO worklist of `(url, depth)` plus a visited set:
    /// 1. Pop an entry; skip it if already visited or deeper than `max_depth`
    /// 2. Mark it visited, then fetch it
    /// 3. On failure, log and abandon this branch only
    /// 4. On success, convert to Markdown and write it
    /// 5. Queue every same-site, unvisited link at `depth + 1`
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlReport)` - Traversal exhausted (or cancelled)
    /// * `Err(CrawlError)` - Invalid start URL or headers, client build
    ///   failure, or the output directory cannot be created
    ///
    /// A page that fails to fetch, redirects off-site, or cannot be written
    /// ends its own branch only.
    pub async fn crawl(&self, request: &CrawlRequest) -> Result<CrawlReport, CrawlError> {
        let start_url = normalize_url(&request.start_url)?;
        let client = build_http_client(
            &self.config,
            &start_url,
            request.headers.as_ref(),
            request.cookies.as_ref(),
        )?;
        let sink = DocumentSink::new(&request.output_dir);
        sink.ensure_dir()?;

        tracing::info!(
            "Starting crawl of {} (site {}, max depth {}) into {}",
            start_url,
            site_key(&start_url),
            self.config.max_depth,
            request.output_dir.display()
        );

        let mut report = CrawlReport::default();
        let mut visited: HashSet<String> = HashSet::new();
        let mut frontier = VecDeque::from([FrontierEntry {
            url: start_url.clone(),
            depth: 0,
        }]);
        let start_time = Instant::now();

        while let Some(entry) = frontier.pop_front() {
            if self.cancel.is_cancelled() {
                tracing::warn!("Crawl cancelled with {} URL(s) queued", frontier.len() + 1);
                report.cancelled = true;
                break;
            }

            if entry.depth > self.config.max_depth {
                tracing::debug!("Depth limit reached, skipping {}", entry.url);
                report.depth_limited += 1;
                continue;
            }

            if !visited.insert(entry.url.to_string()) {
                continue;
            }

            let document_source = (entry.url == start_url).then(|| request.start_url.clone());
            let links = self
                .visit(&client, &sink, &entry, document_source, &mut report)
                .await;

            for link in links {
                if !same_site(&start_url, &link) {
                    tracing::debug!("Discarding off-site link {}", link);
                    report.out_of_scope += 1;
                    continue;
                }
                if visited.contains(link.as_str()) {
                    continue;
                }
                frontier.push_back(FrontierEntry {
                    url: link,
                    depth: entry.depth + 1,
                });
            }

            if report.pages_fetched() % 10 == 0 {
                let rate = report.pages_fetched() as f64 / start_time.elapsed().as_secs_f64();
                tracing::info!(
                    "Progress: {} pages fetched, {} in frontier, {:.2} pages/sec",
                    report.pages_fetched(),
                    frontier.len(),
                    rate
                );
            }
        }

        tracing::info!(
            "Crawl completed: {} pages fetched, {} written in {:?}",
            report.pages_fetched(),
            report.written.len(),
            start_time.elapsed()
        );

        Ok(report)
    }

    /// Fetches, converts and writes one page
    ///
    /// Returns the links to consider next; empty when the branch ends here.
    async fn visit(
        &self,
        client: &Client,
        sink: &DocumentSink,
        entry: &FrontierEntry,
        document_source: Option<String>,
        report: &mut CrawlReport,
    ) -> Vec<Url> {
        tracing::debug!("Fetching {} (depth {})", entry.url, entry.depth);
        report.fetched.push(entry.url.clone());

        let result = fetch_url(client, &entry.url).await;
        let state = result.state();

        match result {
            FetchResult::Success {
                final_url,
                status_code,
                body,
            } => {
                let parsed = parse_html(&body, &final_url);
                tracing::debug!(
                    "Fetched {} ({}, {:?}), {} link(s)",
                    entry.url,
                    status_code,
                    parsed.title,
                    parsed.links.len()
                );

                let mut document = Document::from_html(entry.url.clone(), &body);
                if let Some(source) = document_source {
                    document = document.with_source(source);
                }

                match sink.write(&document) {
                    Ok(path) => {
                        report.record(state);
                        report.written.push(path);
                        parsed.links
                    }
                    Err(e) => {
                        tracing::warn!("Abandoning {}: {}", entry.url, e);
                        report.record(PageState::Failed);
                        Vec::new()
                    }
                }
            }

            FetchResult::ContentMismatch { content_type } => {
                tracing::info!("Skipping {}: expected HTML, got {}", entry.url, content_type);
                report.record(state);
                Vec::new()
            }

            FetchResult::RedirectOffSite { location } => {
                tracing::warn!("Abandoning {}: redirects off-site to {}", entry.url, location);
                report.record(state);
                report.out_of_scope += 1;
                Vec::new()
            }

            FetchResult::HttpError { status_code, state } => {
                tracing::warn!(
                    "Abandoning {}: HTTP {} ({})",
                    entry.url,
                    status_code,
                    state
                );
                report.record(state);
                Vec::new()
            }

            FetchResult::NetworkError { error, state } => {
                tracing::warn!("Abandoning {}: {} ({})", entry.url, error, state);
                report.record(state);
                Vec::new()
            }
        }
    }
}
