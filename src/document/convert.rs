//! HTML to Markdown conversion
//!
//! Links stay inline, `<pre>` blocks become fenced code, and no line wrapping
//! is applied so paragraph boundaries survive for downstream chunking.

use htmd::options::{CodeBlockStyle, HeadingStyle, Options};
use htmd::HtmlToMarkdown;
use scraper::Html;

/// Tags whose contents never belong in the document body
const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// Converts raw HTML into Markdown
///
/// The conversion is pure and deterministic. If the converter rejects the
/// input, the visible text of the page is returned instead.
///
/// # Example
///
/// ```
/// use docsift::document::to_markdown;
///
/// let md = to_markdown(r#"<p>See <a href="/docs">the docs</a>.</p>"#);
/// assert!(md.contains("[the docs](/docs)"));
/// ```
pub fn to_markdown(html: &str) -> String {
    let converter = HtmlToMarkdown::builder()
        .skip_tags(SKIPPED_TAGS.to_vec())
        .options(Options {
            heading_style: HeadingStyle::Atx,
            code_block_style: CodeBlockStyle::Fenced,
            ..Default::default()
        })
        .build();

    match converter.convert(html) {
        Ok(markdown) => markdown,
        Err(e) => {
            tracing::debug!("Markdown conversion failed, falling back to text: {}", e);
            Html::parse_document(html)
                .root_element()
                .text()
                .collect::<String>()
        }
    }
}
