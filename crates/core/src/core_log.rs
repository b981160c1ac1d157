use chrono::Local;
use parking_lot::Mutex;
use std::sync::Arc;

/// Minimal logging sink for the generator so the core does not pick a UI.
/// Implement this in the CLI (or any front end) and marshal lines as needed.
pub trait CoreLog: Send + Sync {
    fn info(&self, msg: &str) {
        let _ = msg;
    }
    fn warn(&self, msg: &str) {
        let _ = msg;
    }
    fn error(&self, msg: &str) {
        let _ = msg;
    }
    fn debug(&self, msg: &str) {
        let _ = msg;
    }
}

/// No-op logger if you don't care about logs.
pub struct NoopLog;
impl CoreLog for NoopLog {}

/// Keeps every line in memory, prefixed with its level.
/// Handy for front ends that show the log after the pass and for tests.
#[derive(Default)]
pub struct MemoryLog {
    lines: Mutex<Vec<String>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.lock().iter().any(|l| l.contains(needle))
    }

    fn push(&self, level: &str, msg: &str) {
        self.lines.lock().push(format!("{level}: {msg}"));
    }
}

impl CoreLog for MemoryLog {
    fn info(&self, msg: &str) {
        self.push("INFO", msg);
    }
    fn warn(&self, msg: &str) {
        self.push("WARN", msg);
    }
    fn error(&self, msg: &str) {
        self.push("ERROR", msg);
    }
    fn debug(&self, msg: &str) {
        self.push("DEBUG", msg);
    }
}

/// Prefixes every line with `HH:MM:SS - ` before handing it to `inner`, and
/// mirrors it into `tracing` so it reaches the persistent log.
pub struct TimestampedLog {
    inner: Arc<dyn CoreLog>,
}

impl TimestampedLog {
    pub fn new(inner: Arc<dyn CoreLog>) -> Self {
        Self { inner }
    }

    fn stamp(msg: &str) -> String {
        format!("{} - {msg}", Local::now().format("%H:%M:%S"))
    }
}

impl CoreLog for TimestampedLog {
    fn info(&self, msg: &str) {
        tracing::info!("{msg}");
        self.inner.info(&Self::stamp(msg));
    }
    fn warn(&self, msg: &str) {
        tracing::warn!("{msg}");
        self.inner.warn(&Self::stamp(msg));
    }
    fn error(&self, msg: &str) {
        tracing::error!("{msg}");
        self.inner.error(&Self::stamp(msg));
    }
    fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
        self.inner.debug(msg);
    }
}
