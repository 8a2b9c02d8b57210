//! Flat-file document sink
//!
//! Each document lands in `<output_dir>/<flattened-path>.md` and starts with a
//! one-line `# <source URL>` header.

use crate::document::Document;
use crate::output::{OutputError, OutputResult};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use url::Url;

/// Extension appended to every written document
pub const DOCUMENT_EXTENSION: &str = "md";

/// File stem used when a URL has an empty path
pub const INDEX_NAME: &str = "index";

/// Separator that replaces `/` inside a URL path
const PATH_SEPARATOR_REPLACEMENT: &str = "_";

/// Derives the output file name for a page URL
///
/// Only the path component is used: surrounding slashes are trimmed, inner
/// slashes become `_`, and an empty path maps to `index`. Query strings are
/// ignored, so two URLs differing only in query share a file.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use docsift::output::file_name_for;
///
/// let url = Url::parse("https://example.com/docs/intro/").unwrap();
/// assert_eq!(file_name_for(&url), "docs_intro.md");
///
/// let url = Url::parse("https://example.com").unwrap();
/// assert_eq!(file_name_for(&url), "index.md");
/// ```
pub fn file_name_for(url: &Url) -> String {
    let flattened = url
        .path()
        .trim_matches('/')
        .replace('/', PATH_SEPARATOR_REPLACEMENT);

    let stem = if flattened.is_empty() {
        INDEX_NAME
    } else {
        flattened.as_str()
    };

    format!("{}.{}", stem, DOCUMENT_EXTENSION)
}

/// Writes documents into a single flat directory
#[derive(Debug, Clone)]
pub struct DocumentSink {
    output_dir: PathBuf,
}

impl DocumentSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Creates the output directory if it does not exist yet
    pub fn ensure_dir(&self) -> OutputResult<()> {
        fs::create_dir_all(&self.output_dir).map_err(|source| OutputError::CreateDir {
            path: self.output_dir.display().to_string(),
            source,
        })
    }

    /// Writes a document and returns the path it was written to
    ///
    /// An existing file with the same derived name is overwritten.
    pub fn write(&self, document: &Document) -> OutputResult<PathBuf> {
        self.ensure_dir()?;

        let path = self.output_dir.join(file_name_for(document.source_url()));
        let contents = format!("# {}\n\n{}", document.source(), document.markdown());

        let write_result = File::create(&path).and_then(|mut file| {
            file.write_all(contents.as_bytes())?;
            file.flush()
        });

        write_result.map_err(|source| OutputError::Write {
            path: path.display().to_string(),
            source,
        })?;

        tracing::debug!("Wrote {} ({} bytes)", path.display(), contents.len());
        Ok(path)
    }
}
