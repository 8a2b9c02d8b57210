//! Request composition for the rewrite service

/// Fixed system instruction describing the cleaning behavior
pub const SYSTEM_INSTRUCTION: &str = "\
You are an expert at cleaning Markdown documents scraped from web pages. \
Clean the document so it is well suited for embedding and vector storage.
Follow these rules:
1. Remove page titles that carry no content, navigation menus, footers, advertisements and other boilerplate.
2. Keep every substantive point, core text, code block, index, URL and image link.
3. You may restructure or simplify wording, but the original meaning must be preserved exactly.
4. Keep the Markdown complete, consistent and well-formed.
5. Return only the cleaned Markdown document, with no comments or explanations.";

/// Text placed before the document in the user message
pub const USER_LEAD_IN: &str =
    "Clean the following Markdown document so it is better suited for vector analysis:\n\n";

/// Appended to a user message that was cut at the length limit
pub const TRUNCATION_MARKER: &str =
    "\n\n[Content truncated: only the leading portion of the document was processed]";

/// A composed rewrite request
///
/// Composition happens once per file, before any attempt is made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteRequest {
    user_message: String,
    truncated: bool,
}

impl RewriteRequest {
    /// Builds the user message for `content`
    ///
    /// If the lead-in plus content is longer than `max_chars` characters, the
    /// message is cut to exactly `max_chars` characters and
    /// [`TRUNCATION_MARKER`] is appended.
    ///
    /// # Example
    ///
    /// ```
    /// use docsift::rewrite::{RewriteRequest, TRUNCATION_MARKER};
    ///
    /// let request = RewriteRequest::compose(&"x".repeat(500), 200);
    /// assert!(request.truncated());
    /// assert!(request.user_message().ends_with(TRUNCATION_MARKER));
    /// ```
    pub fn compose(content: &str, max_chars: usize) -> Self {
        let message = format!("{}{}", USER_LEAD_IN, content);

        match message.char_indices().nth(max_chars) {
            Some((cut, _)) => {
                let mut user_message = String::with_capacity(cut + TRUNCATION_MARKER.len());
                user_message.push_str(&message[..cut]);
                user_message.push_str(TRUNCATION_MARKER);
                Self {
                    user_message,
                    truncated: true,
                }
            }
            None => Self {
                user_message: message,
                truncated: false,
            },
        }
    }

    pub fn system_instruction(&self) -> &str {
        SYSTEM_INSTRUCTION
    }

    pub fn user_message(&self) -> &str {
        &self.user_message
    }

    /// True if the content was cut at the length limit
    pub fn truncated(&self) -> bool {
        self.truncated
    }
}
