//! Rewrite service client
//!
//! This module wraps the external chat-completion service that cleans a
//! Markdown document:
//! - Composing the request (fixed instruction, truncation of long content)
//! - Calling the service with a per-call timeout
//! - Classifying failures into typed errors the retry policy can act on

mod client;
mod request;

pub use client::RewriteClient;
pub use request::{RewriteRequest, SYSTEM_INSTRUCTION, TRUNCATION_MARKER, USER_LEAD_IN};

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Anything that can turn a composed request into cleaned Markdown
///
/// [`RewriteClient`] is the HTTP implementation; the cleaning pipeline only
/// depends on this trait.
#[async_trait]
pub trait Rewriter: Send + Sync {
    async fn rewrite(
        &self,
        request: &RewriteRequest,
        timeout: Duration,
    ) -> Result<String, RewriteError>;
}

/// Errors returned by a single rewrite call
///
/// Classification happens in the client from status codes and transport
/// signals, never by inspecting message text.
#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("Rewrite service timed out")]
    Timeout,

    #[error("Rewrite service rejected the credentials (HTTP {status})")]
    Auth { status: u16 },

    #[error("Model '{model}' does not exist on the rewrite service")]
    ModelNotFound { model: String },

    #[error("Rewrite service returned a malformed response: {0}")]
    BadResponse(String),

    #[error("Rewrite service returned HTTP {status}: {message}")]
    Service { status: u16, message: String },

    #[error("Rewrite request failed: {0}")]
    Transport(String),

    #[error("Rewrite client is misconfigured: {0}")]
    Config(String),
}

/// Policy classes for rewrite failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    Timeout,
    Auth,
    ModelNotFound,
    Unknown,
}

impl FailureKind {
    /// Returns true if another attempt may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout | Self::Unknown)
    }
}

impl RewriteError {
    /// Maps this error to the class the retry policy acts on
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Timeout => FailureKind::Timeout,
            Self::Auth { .. } | Self::Config(_) => FailureKind::Auth,
            Self::ModelNotFound { .. } => FailureKind::ModelNotFound,
            Self::BadResponse(_) | Self::Service { .. } | Self::Transport(_) => {
                FailureKind::Unknown
            }
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}
