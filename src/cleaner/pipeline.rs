//! Single-file cleaning pipeline
//!
//! # Flow
//!
//! 1. Reject missing files and non-Markdown extensions (no retry)
//! 2. Read as UTF-8, falling back to the configured encoding
//! 3. Compose the request, truncating over-long content once
//! 4. Call the rewriter under the retry policy below
//! 5. Write `<prefix><name>` next to the input
//!
//! # Retry Policy
//!
//! | Failure | Action |
//! |---------|--------|
//! | Auth | Fail immediately |
//! | ModelNotFound | Fail immediately |
//! | Timeout | Wait `2^attempt` s and retry, up to `max_retries` attempts |
//! | Unknown | Wait `2^attempt` s and retry, up to `max_retries` attempts |
//!
//! # Progress Milestones
//!
//! | Percent | Milestone |
//! |---------|-----------|
//! | 0 | start |
//! | 5 | file size known |
//! | 10 | reading |
//! | 20 | content read |
//! | 15 | content truncated (only when it happens) |
//! | 25 | about to call the service |
//! | 25 + 5×attempt, at most 35 | attempt started |
//! | 40 | attempt succeeded |
//! | 60 | rewrite finished |
//! | 80 | saving |
//! | 100 | done |
//! | -1 | failed |

use crate::cleaner::{encoding::read_text, is_markdown_file, CleanError, CleaningResult};
use crate::config::RewriteConfig;
use crate::progress::{ProgressReporter, DONE, FAILED};
use crate::rewrite::{RewriteClient, RewriteError, RewriteRequest, Rewriter};
use encoding_rs::Encoding;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Settings the pipeline needs from the rewrite configuration
#[derive(Debug, Clone)]
pub struct CleaningSettings {
    /// Total attempts per file, including the first one
    pub max_retries: u32,

    /// Per-call timeout handed to the rewriter
    pub timeout: Duration,

    /// Prefix for the cleaned file's name
    pub output_prefix: String,

    /// Maximum composed request length, in characters
    pub max_content_length: usize,

    /// Encoding tried when a file is not valid UTF-8
    pub fallback_encoding: &'static Encoding,
}

impl CleaningSettings {
    pub fn from_config(config: &RewriteConfig) -> Self {
        Self {
            max_retries: config.max_retries.max(1),
            timeout: Duration::from_secs(config.timeout),
            output_prefix: config.output_prefix.clone(),
            max_content_length: config.max_content_length,
            fallback_encoding: Encoding::for_label(config.fallback_encoding.as_bytes())
                .unwrap_or(encoding_rs::GBK),
        }
    }
}

impl Default for CleaningSettings {
    fn default() -> Self {
        Self::from_config(&RewriteConfig::default())
    }
}

/// Highest percent an attempt-start event reports; stays below the 40 success milestone
const ATTEMPT_PROGRESS_CAP: u32 = 35;

/// Percent reported when attempt `attempt` (counted from 0) starts
fn attempt_progress(attempt: u32) -> i32 {
    25u32
        .saturating_add(attempt.saturating_mul(5))
        .min(ATTEMPT_PROGRESS_CAP) as i32
}

/// Wait before the retry that follows failed attempt `attempt` (counted from 0)
///
/// # Examples
///
/// ```
/// use docsift::cleaner::backoff_delay;
/// use std::time::Duration;
///
/// assert_eq!(backoff_delay(0), Duration::from_secs(1));
/// assert_eq!(backoff_delay(2), Duration::from_secs(4));
/// ```
pub fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(2u64.saturating_pow(attempt))
}

/// Computes the cleaned file's path: same directory, prefixed file name
///
/// # Examples
///
/// ```
/// use docsift::cleaner::output_path_for;
/// use std::path::{Path, PathBuf};
///
/// assert_eq!(
///     output_path_for(Path::new("notes/doc.md"), "Cleandone-"),
///     Some(PathBuf::from("notes/Cleandone-doc.md"))
/// );
/// ```
pub fn output_path_for(path: &Path, prefix: &str) -> Option<PathBuf> {
    let name = path.file_name()?.to_str()?;
    Some(path.with_file_name(format!("{}{}", prefix, name)))
}

/// One file moving through the pipeline
struct CleaningJob<'a> {
    path: &'a Path,
    id: String,
    content: String,
    attempts: u32,
}

/// Cleans Markdown files through a [`Rewriter`]
pub struct CleaningPipeline<R = RewriteClient> {
    rewriter: R,
    settings: CleaningSettings,
    cancel: CancellationToken,
}

impl CleaningPipeline<RewriteClient> {
    /// Builds a pipeline backed by the HTTP rewrite client
    pub fn from_config(config: &RewriteConfig) -> Result<Self, RewriteError> {
        let client = RewriteClient::new(config)?;
        Ok(Self::new(client, CleaningSettings::from_config(config)))
    }
}

impl<R: Rewriter> CleaningPipeline<R> {
    pub fn new(rewriter: R, settings: CleaningSettings) -> Self {
        Self {
            rewriter,
            settings,
            cancel: CancellationToken::new(),
        }
    }

    /// Uses `token` to abort pending backoff waits and remaining files
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn settings(&self) -> &CleaningSettings {
        &self.settings
    }

    pub fn rewriter(&self) -> &R {
        &self.rewriter
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Cleans one file
    ///
    /// Never fails as a call: every outcome, including rejection of the
    /// input, is a [`CleaningResult`].
    pub async fn clean_file(&self, path: &Path, reporter: &dyn ProgressReporter) -> CleaningResult {
        let mut job = CleaningJob {
            path,
            id: path.display().to_string(),
            content: String::new(),
            attempts: 0,
        };

        reporter.report(&job.id, 0, "Starting file");

        match self.process(&mut job, reporter).await {
            Ok(output) => {
                tracing::info!("Cleaned {} -> {}", job.id, output.display());
                reporter.report(
                    &job.id,
                    DONE,
                    &format!("Done, saved to {}", output.display()),
                );
                CleaningResult::cleaned(path, &output, job.attempts)
            }
            Err(err) => {
                tracing::error!("Cleaning {} failed: {}", job.id, err);
                reporter.report(&job.id, FAILED, &format!("Failed: {}", err));
                CleaningResult::failed(path, &err, job.attempts)
            }
        }
    }

    async fn process(
        &self,
        job: &mut CleaningJob<'_>,
        reporter: &dyn ProgressReporter,
    ) -> Result<PathBuf, CleanError> {
        if self.is_cancelled() {
            return Err(CleanError::Cancelled);
        }

        if !job.path.exists() {
            return Err(CleanError::NotFound(job.path.to_path_buf()));
        }

        if !is_markdown_file(job.path) {
            return Err(CleanError::UnsupportedExtension(job.path.to_path_buf()));
        }

        let output = output_path_for(job.path, &self.settings.output_prefix)
            .ok_or_else(|| CleanError::UnsupportedExtension(job.path.to_path_buf()))?;

        let size = std::fs::metadata(job.path)
            .map_err(|source| CleanError::Read {
                path: job.path.to_path_buf(),
                source,
            })?
            .len();
        reporter.report(
            &job.id,
            5,
            &format!("File size: {:.2} KB", size as f64 / 1024.0),
        );

        reporter.report(&job.id, 10, "Reading file content...");
        let decoded = read_text(job.path, self.settings.fallback_encoding)?;
        if decoded.used_fallback() {
            tracing::info!("{} decoded as {}", job.id, decoded.encoding.name());
        }
        job.content = decoded.content;
        reporter.report(
            &job.id,
            20,
            &format!(
                "Read {} characters ({})",
                job.content.chars().count(),
                decoded.encoding.name()
            ),
        );

        let request = RewriteRequest::compose(&job.content, self.settings.max_content_length);
        if request.truncated() {
            tracing::warn!(
                "{} exceeds {} characters, truncating request",
                job.id,
                self.settings.max_content_length
            );
            reporter.report(
                &job.id,
                15,
                &format!(
                    "Document too long, truncated to the first {} characters",
                    self.settings.max_content_length
                ),
            );
        }

        reporter.report(&job.id, 25, "Preparing rewrite call...");
        let cleaned = self.rewrite_with_retries(job, &request, reporter).await?;
        reporter.report(&job.id, 60, "Rewrite finished, preparing to save");

        reporter.report(&job.id, 80, "Saving cleaned content...");
        std::fs::write(&output, cleaned).map_err(|source| CleanError::Write {
            path: output.clone(),
            source,
        })?;

        Ok(output)
    }

    /// Calls the rewriter until it succeeds, a fail-fast error occurs, or
    /// `max_retries` attempts are used up
    async fn rewrite_with_retries(
        &self,
        job: &mut CleaningJob<'_>,
        request: &RewriteRequest,
        reporter: &dyn ProgressReporter,
    ) -> Result<String, CleanError> {
        let max = self.settings.max_retries.max(1);

        loop {
            let attempt = job.attempts;
            job.attempts += 1;

            reporter.report(
                &job.id,
                attempt_progress(attempt),
                &format!("Calling rewrite service (attempt {}/{})...", attempt + 1, max),
            );

            let started = Instant::now();
            let error = match self.rewriter.rewrite(request, self.settings.timeout).await {
                Ok(cleaned) => {
                    reporter.report(
                        &job.id,
                        40,
                        &format!(
                            "Rewrite service responded in {:.2} s",
                            started.elapsed().as_secs_f64()
                        ),
                    );
                    return Ok(cleaned);
                }
                Err(error) => error,
            };

            if !error.is_retryable() {
                return Err(fail_fast(error, job.attempts, max));
            }

            if job.attempts >= max {
                return Err(exhausted(error, max));
            }

            let delay = backoff_delay(attempt);
            tracing::warn!(
                "Attempt {}/{} for {} failed: {}; retrying in {:?}",
                attempt + 1,
                max,
                job.id,
                error,
                delay
            );
            reporter.report(
                &job.id,
                25,
                &format!(
                    "Attempt {}/{} failed ({}), retrying in {} s...",
                    attempt + 1,
                    max,
                    error,
                    delay.as_secs()
                ),
            );

            self.wait(delay).await?;
        }
    }

    /// Sleeps for `delay` unless the pipeline is cancelled first
    async fn wait(&self, delay: Duration) -> Result<(), CleanError> {
        tokio::select! {
            _ = self.cancel.cancelled() => Err(CleanError::Cancelled),
            _ = tokio::time::sleep(delay) => Ok(()),
        }
    }
}

fn fail_fast(error: RewriteError, attempt: u32, max: u32) -> CleanError {
    match error {
        RewriteError::Auth { .. } => CleanError::AuthFailed,
        RewriteError::ModelNotFound { model } => CleanError::ModelNotFound { model },
        source => CleanError::RewriteFailed {
            attempt,
            max,
            source,
        },
    }
}

fn exhausted(error: RewriteError, max: u32) -> CleanError {
    match error {
        RewriteError::Timeout => CleanError::TimedOut { attempts: max },
        source => CleanError::RewriteFailed {
            attempt: max,
            max,
            source,
        },
    }
}
