//! Progress-callback trait for generation events.
//!
//! Inject an [`Arc<dyn ManuscriptProgressCallback>`] via
//! [`crate::config::ManuscriptConfigBuilder::progress_callback`] to hear
//! about each stage of a request and about generator retries, which is the
//! only place a request can sit silently for tens of seconds.
//!
//! All methods have default no-op implementations so callers only override
//! what they care about.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Pipeline stages in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Extracting,
    Generating,
    Normalizing,
    Packaging,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Extracting => "Extracting slide text",
            Stage::Generating => "Generating manuscript",
            Stage::Normalizing => "Normalizing",
            Stage::Packaging => "Packaging document",
        };
        f.write_str(s)
    }
}

pub trait ManuscriptProgressCallback: Send + Sync {
    /// Called when a stage begins.
    fn on_stage(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called once the slide text is available.
    ///
    /// # Arguments
    /// * `page_count`  — pages in the PDF
    /// * `empty_pages` — pages without extractable text
    fn on_slides_extracted(&self, page_count: usize, empty_pages: usize) {
        let _ = (page_count, empty_pages);
    }

    /// Called before the retry policy waits.
    ///
    /// # Arguments
    /// * `attempt`      — the attempt that just failed (1-indexed)
    /// * `max_attempts` — attempt budget
    /// * `delay`        — wait before the next attempt
    /// * `error`        — human-readable error description
    fn on_retry(&self, attempt: u32, max_attempts: u32, delay: Duration, error: &str) {
        let _ = (attempt, max_attempts, delay, error);
    }

    /// Called after the document has been packaged.
    fn on_complete(&self, manuscript_chars: usize) {
        let _ = manuscript_chars;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ManuscriptProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ManuscriptConfig`].
pub type ProgressCallback = Arc<dyn ManuscriptProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        stages: Mutex<Vec<Stage>>,
        retries: Mutex<Vec<u32>>,
    }

    impl ManuscriptProgressCallback for Recorder {
        fn on_stage(&self, stage: Stage) {
            self.stages.lock().unwrap().push(stage);
        }

        fn on_retry(&self, attempt: u32, _max: u32, _delay: Duration, _error: &str) {
            self.retries.lock().unwrap().push(attempt);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_stage(Stage::Extracting);
        cb.on_slides_extracted(10, 1);
        cb.on_retry(1, 4, Duration::from_secs(2), "429");
        cb.on_complete(1200);
    }

    #[test]
    fn recorder_receives_events() {
        let rec = Recorder::default();
        rec.on_stage(Stage::Extracting);
        rec.on_stage(Stage::Generating);
        rec.on_retry(1, 4, Duration::from_secs(2), "429");
        assert_eq!(
            *rec.stages.lock().unwrap(),
            vec![Stage::Extracting, Stage::Generating]
        );
        assert_eq!(*rec.retries.lock().unwrap(), vec![1]);
    }

    #[test]
    fn stage_display() {
        assert_eq!(Stage::Packaging.to_string(), "Packaging document");
    }
}
