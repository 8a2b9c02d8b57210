//! URL handling module for docsift
//!
//! This module provides link resolution, URL normalization and the site-scope
//! check that keeps a crawl on the start URL's site.

mod normalize;
mod scope;

// Re-export main functions
pub use normalize::{normalize_url, resolve_link};
pub use scope::{same_site, site_key};
