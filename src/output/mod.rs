//! Output module for crawled documents and run summaries
//!
//! This module handles:
//! - Mapping page URLs to flat Markdown file names
//! - Writing converted documents to the output directory
//! - Printing crawl and cleaning summaries for the CLI

mod sink;
pub mod stats;

pub use sink::{file_name_for, DocumentSink, DOCUMENT_EXTENSION, INDEX_NAME};
pub use stats::{
    format_cleaning_results, format_crawl_report, print_cleaning_results, print_crawl_report,
};

use thiserror::Error;

/// Errors that can occur while writing documents
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to create output directory {path}: {source}")]
    CreateDir {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
