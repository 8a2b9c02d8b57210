//! Document model and HTML to Markdown conversion
//!
//! A [`Document`] is created once per successfully fetched page and handed to
//! the output sink unchanged.

mod convert;

pub use convert::to_markdown;

use url::Url;

/// A converted page, ready to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    source_url: Url,
    source: String,
    markdown: String,
}

impl Document {
    /// Creates a document from a page URL and its already converted body
    pub fn new(source_url: Url, markdown: String) -> Self {
        Self {
            source: source_url.to_string(),
            source_url,
            markdown,
        }
    }

    /// Overrides the URL text shown in the document header
    ///
    /// Used for the start page so the header matches what the caller typed,
    /// e.g. `https://example.com` rather than `https://example.com/`.
    pub fn with_source(mut self, source: String) -> Self {
        self.source = source;
        self
    }

    /// Converts a fetched HTML body into a document
    pub fn from_html(source_url: Url, html: &str) -> Self {
        Self::new(source_url, to_markdown(html))
    }

    pub fn source_url(&self) -> &Url {
        &self.source_url
    }

    /// URL text as requested, used in the document header
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn markdown(&self) -> &str {
        &self.markdown
    }
}
