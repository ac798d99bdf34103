//! Reporter capabilities handed to progress and stream operations.
//!
//! A reporter is created fresh per invocation with its sink injected at
//! construction; operations only ever see the reporting methods. With no
//! sink installed every update is silently dropped, which is what the
//! synchronous execute path relies on.

type ProgressSink = Box<dyn Fn(f64, &str) + Send + Sync>;
type StreamSink = Box<dyn Fn(&str) + Send + Sync>;

/// Percent-plus-message reporter for progress operations.
pub struct ProgressReporter {
    sink: Option<ProgressSink>,
}

impl ProgressReporter {
    /// Reporter that drops every update.
    pub fn noop() -> Self {
        Self { sink: None }
    }

    pub fn with_sink(sink: impl Fn(f64, &str) + Send + Sync + 'static) -> Self {
        Self {
            sink: Some(Box::new(sink)),
        }
    }

    /// Report progress as a step count. Percent is `current / total`
    /// when `total > 0`, else 0.
    pub fn update(&self, current: u64, total: u64, message: &str) {
        let percent = if total > 0 {
            current as f64 / total as f64
        } else {
            0.0
        };
        self.report(percent, message);
    }

    /// Report progress as a percentage in `[0, 1]`.
    pub fn update_percent(&self, percent: f64, message: &str) {
        self.report(percent, message);
    }

    fn report(&self, percent: f64, message: &str) {
        if let Some(sink) = &self.sink {
            sink(percent, message);
        }
    }
}

/// Text chunk reporter for stream operations. Empty chunks are dropped.
pub struct StreamReporter {
    sink: Option<StreamSink>,
}

impl StreamReporter {
    /// Reporter that drops every chunk.
    pub fn noop() -> Self {
        Self { sink: None }
    }

    pub fn with_sink(sink: impl Fn(&str) + Send + Sync + 'static) -> Self {
        Self {
            sink: Some(Box::new(sink)),
        }
    }

    pub fn emit(&self, chunk: &str) {
        if chunk.is_empty() {
            return;
        }
        if let Some(sink) = &self.sink {
            sink(chunk);
        }
    }
}
