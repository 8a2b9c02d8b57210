//! Progress reporting interface
//!
//! The cleaning pipeline reports milestones through [`ProgressReporter`] and
//! never depends on a concrete UI type. Percent values are `0..=100`, with
//! [`FAILED`] marking a failure milestone. Intermediate values are hints and
//! are not guaranteed to be monotonic.

/// Percent value that marks a failure milestone
pub const FAILED: i32 = -1;

/// Percent value that marks success or completion
pub const DONE: i32 = 100;

/// Receives progress milestones from long-running operations
pub trait ProgressReporter {
    /// Reports a milestone for `identifier` (a file or directory path)
    fn report(&self, identifier: &str, percent: i32, message: &str);
}

impl<F> ProgressReporter for F
where
    F: Fn(&str, i32, &str),
{
    fn report(&self, identifier: &str, percent: i32, message: &str) {
        self(identifier, percent, message)
    }
}

/// Discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn report(&self, _identifier: &str, _percent: i32, _message: &str) {}
}

/// Forwards events to `tracing`
///
/// Failure milestones are logged at `warn`, everything else at `info`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl ProgressReporter for LogReporter {
    fn report(&self, identifier: &str, percent: i32, message: &str) {
        if percent == FAILED {
            tracing::warn!("[{}] {}", identifier, message);
        } else {
            tracing::info!("[{}] {:>3}% {}", identifier, percent, message);
        }
    }
}

/// A single recorded progress event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub identifier: String,
    pub percent: i32,
    pub message: String,
}

/// Collects every event in memory
///
/// Useful for front ends that render progress after the fact, and for tests.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: std::sync::Mutex<Vec<ProgressEvent>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of all events recorded so far
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Returns the percent values reported for one identifier, in order
    pub fn percents_for(&self, identifier: &str) -> Vec<i32> {
        self.events()
            .into_iter()
            .filter(|e| e.identifier == identifier)
            .map(|e| e.percent)
            .collect()
    }
}

impl ProgressReporter for RecordingReporter {
    fn report(&self, identifier: &str, percent: i32, message: &str) {
        if let Ok(mut events) = self.events.lock() {
            events.push(ProgressEvent {
                identifier: identifier.to_string(),
                percent,
                message: message.to_string(),
            });
        }
    }
}
