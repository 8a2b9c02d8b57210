//! File decoding with a single fallback encoding

use crate::cleaner::CleanError;
use encoding_rs::Encoding;
use std::path::Path;

/// Decoded file content and the encoding that produced it
#[derive(Debug, Clone)]
pub struct DecodedText {
    pub content: String,
    pub encoding: &'static Encoding,
}

impl DecodedText {
    /// True if the primary UTF-8 decode failed and the fallback was used
    pub fn used_fallback(&self) -> bool {
        self.encoding != encoding_rs::UTF_8
    }
}

/// Reads a file as UTF-8, falling back to `fallback` on invalid input
///
/// The fallback decode is strict: any malformed sequence is an error rather
/// than a replacement character.
pub fn read_text(path: &Path, fallback: &'static Encoding) -> Result<DecodedText, CleanError> {
    let bytes = std::fs::read(path).map_err(|source| CleanError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    match String::from_utf8(bytes) {
        Ok(content) => Ok(DecodedText {
            content,
            encoding: encoding_rs::UTF_8,
        }),
        Err(e) => {
            tracing::debug!(
                "{} is not valid UTF-8, trying {}",
                path.display(),
                fallback.name()
            );
            let bytes = e.into_bytes();
            fallback
                .decode_without_bom_handling_and_without_replacement(&bytes)
                .map(|content| DecodedText {
                    content: content.into_owned(),
                    encoding: fallback,
                })
                .ok_or_else(|| CleanError::Encoding {
                    path: path.to_path_buf(),
                    fallback: fallback.name().to_string(),
                })
        }
    }
}
