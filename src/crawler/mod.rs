//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching and response classification
//! - HTML parsing and link extraction
//! - The bounded, site-scoped traversal loop

mod fetcher;
mod parser;
mod traversal;

pub use fetcher::{build_http_client, fetch_url, is_html_content_type, FetchResult};
pub use parser::{parse_html, ParsedPage};
pub use traversal::{CrawlReport, CrawlRequest, Crawler};
