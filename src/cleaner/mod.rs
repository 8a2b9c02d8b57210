//! Markdown cleaning pipeline
//!
//! This module drives documents through the rewrite service:
//! - Selecting eligible files and decoding them
//! - Calling the rewriter under bounded retries with per-class policy
//! - Writing `<prefix><name>` next to each input
//! - Running whole directories with continue-on-error aggregation

mod batch;
mod encoding;
mod pipeline;

pub use batch::discover_markdown_files;
pub use encoding::{read_text, DecodedText};
pub use pipeline::{backoff_delay, output_path_for, CleaningPipeline, CleaningSettings};

use crate::rewrite::RewriteError;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File extensions recognized as Markdown documents (compared case-insensitively)
pub const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown"];

/// Returns true if the path carries a recognized Markdown extension
pub fn is_markdown_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| {
            MARKDOWN_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

/// Errors that end the cleaning of one file, or a whole batch
///
/// Every message names the failure kind so a front end can show actionable
/// guidance.
#[derive(Debug, Error)]
pub enum CleanError {
    #[error("File does not exist: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Unsupported file type (expected .md or .markdown): {}", .0.display())]
    UnsupportedExtension(PathBuf),

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot decode {}: content is neither UTF-8 nor {fallback}", path.display())]
    Encoding { path: PathBuf, fallback: String },

    #[error("Rewrite service timed out after {attempts} attempt(s); the server is taking too long. Try again later or reduce the file size")]
    TimedOut { attempts: u32 },

    #[error("Authentication with the rewrite service failed: the API key is invalid or expired")]
    AuthFailed,

    #[error("Model '{model}' does not exist; check the configured model name (for example deepseek-chat or deepseek-coder)")]
    ModelNotFound { model: String },

    #[error("Rewrite service call failed (attempt {attempt}/{max}): {source}")]
    RewriteFailed {
        attempt: u32,
        max: u32,
        source: RewriteError,
    },

    #[error("Failed to save {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cleaning was cancelled")]
    Cancelled,

    #[error("Directory does not exist: {}", .0.display())]
    DirectoryNotFound(PathBuf),
}

/// Terminal outcome of one cleaning job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleaningResult {
    /// Input file (or directory, for the informational empty-batch entry)
    pub path: PathBuf,

    /// Whether the job succeeded
    pub success: bool,

    /// Output path on success, error message on failure
    pub detail: String,

    /// Rewrite attempts made for this job
    pub attempts: u32,
}

impl CleaningResult {
    pub(crate) fn cleaned(path: &Path, output: &Path, attempts: u32) -> Self {
        Self {
            path: path.to_path_buf(),
            success: true,
            detail: output.display().to_string(),
            attempts,
        }
    }

    pub(crate) fn failed(path: &Path, error: &CleanError, attempts: u32) -> Self {
        Self {
            path: path.to_path_buf(),
            success: false,
            detail: error.to_string(),
            attempts,
        }
    }

    pub(crate) fn info(path: &Path, message: &str) -> Self {
        Self {
            path: path.to_path_buf(),
            success: true,
            detail: message.to_string(),
            attempts: 0,
        }
    }
}
