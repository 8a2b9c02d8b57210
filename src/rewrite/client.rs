//! HTTP implementation of the rewrite service contract
//!
//! Talks to any OpenAI-compatible `POST {endpoint}/chat/completions` API.
//!
//! # Error Classification
//!
//! | Condition | Error |
//! |-----------|-------|
//! | Transport timeout, HTTP 408, HTTP 504 | `Timeout` |
//! | HTTP 401, HTTP 403 | `Auth` |
//! | Error code `model_not_found` / `model_not_exist` (any status) | `ModelNotFound` |
//! | 2xx without a non-empty completion | `BadResponse` |
//! | Any other status, including a bare 404 | `Service` |
//! | Connection and other transport errors | `Transport` |

use crate::config::RewriteConfig;
use crate::rewrite::{RewriteError, RewriteRequest, Rewriter};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use url::Url;

const COMPLETIONS_PATH: &str = "chat/completions";

/// Error codes some providers use for an unknown model
const MODEL_NOT_FOUND_CODES: &[&str] = &["model_not_found", "model_not_exist"];

/// Client for an OpenAI-compatible chat-completion service
#[derive(Debug, Clone)]
pub struct RewriteClient {
    client: Client,
    completions_url: Url,
    model: String,
    max_tokens: u32,
}

impl RewriteClient {
    /// Builds a client from the rewrite configuration
    ///
    /// # Returns
    ///
    /// * `Ok(RewriteClient)` - Client ready to send requests
    /// * `Err(RewriteError::Config)` - Empty API key, unusable key characters,
    ///   bad endpoint, or the HTTP client could not be built
    pub fn new(config: &RewriteConfig) -> Result<Self, RewriteError> {
        let api_key = config.api_key.trim();
        if api_key.is_empty() {
            return Err(RewriteError::Config("API key cannot be empty".to_string()));
        }

        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|_| RewriteError::Config("API key contains invalid characters".to_string()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| RewriteError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            completions_url: completions_url(&config.api_endpoint)?,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn completions_url(&self) -> &Url {
        &self.completions_url
    }
}

#[async_trait]
impl Rewriter for RewriteClient {
    async fn rewrite(
        &self,
        request: &RewriteRequest,
        timeout: Duration,
    ) -> Result<String, RewriteError> {
        let body = ChatRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: request.system_instruction(),
                },
                ChatMessage {
                    role: "user",
                    content: request.user_message(),
                },
            ],
        };

        let started = Instant::now();
        let response = self
            .client
            .post(self.completions_url.clone())
            .timeout(timeout)
            .json(&body)
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &text, &self.model));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                RewriteError::Timeout
            } else {
                RewriteError::BadResponse(format!("could not decode body: {}", e))
            }
        })?;

        let completion = extract_completion(parsed)?;
        tracing::debug!(
            "Rewrite service answered in {:.2}s ({} chars)",
            started.elapsed().as_secs_f64(),
            completion.chars().count()
        );
        Ok(completion)
    }
}

/// Builds the completions URL from a base endpoint
///
/// Accepts both `https://host` and `https://host/v1/` style bases, and a
/// base that already points at the completions path.
fn completions_url(endpoint: &str) -> Result<Url, RewriteError> {
    let trimmed = endpoint.trim().trim_end_matches('/');
    let full = if trimmed.ends_with(COMPLETIONS_PATH) {
        trimmed.to_string()
    } else {
        format!("{}/{}", trimmed, COMPLETIONS_PATH)
    };

    Url::parse(&full).map_err(|e| RewriteError::Config(format!("invalid api endpoint: {}", e)))
}

fn classify_transport(error: reqwest::Error) -> RewriteError {
    if error.is_timeout() {
        RewriteError::Timeout
    } else {
        RewriteError::Transport(error.to_string())
    }
}

/// Maps a non-success response to a typed error
fn classify_status(status: StatusCode, body: &str, model: &str) -> RewriteError {
    let api_error = serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|b| b.error);

    let code_says_missing_model = api_error
        .as_ref()
        .and_then(|e| e.code.as_ref())
        .and_then(|code| code.as_str())
        .map_or(false, |code| MODEL_NOT_FOUND_CODES.contains(&code));

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RewriteError::Auth {
            status: status.as_u16(),
        },
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => RewriteError::Timeout,
        _ if code_says_missing_model => RewriteError::ModelNotFound {
            model: model.to_string(),
        },
        _ => {
            let message = api_error
                .and_then(|e| e.message)
                .unwrap_or_else(|| body.chars().take(200).collect());
            RewriteError::Service {
                status: status.as_u16(),
                message,
            }
        }
    }
}

fn extract_completion(response: ChatResponse) -> Result<String, RewriteError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| RewriteError::BadResponse("response has no choices".to_string()))?;

    let content = choice
        .message
        .and_then(|m| m.content)
        .unwrap_or_default();

    if content.trim().is_empty() {
        return Err(RewriteError::BadResponse(
            "first choice has no content".to_string(),
        ));
    }

    Ok(content)
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<AssistantMessage>,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: Option<String>,
    code: Option<serde_json::Value>,
}
