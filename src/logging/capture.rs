//! In-memory log capture and structured test outcome logging.

use crate::redact::{redact, redact_error};
use serde_json::{Map, Value};
use std::{
    error::Error,
    io,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use tracing::{Dispatch, Level, dispatcher::DefaultGuard, error, warn};
use tracing_subscriber::{
    Registry, filter::LevelFilter, fmt, fmt::MakeWriter, layer::SubscriberExt,
};

/// Collects JSON log lines in a shared buffer.
///
/// Clones share the same buffer, so a capture handed to a subscriber can
/// still be inspected afterwards.
#[derive(Debug, Clone, Default)]
pub struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

pub struct CaptureWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl io::Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        lock(&self.buffer).extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = CaptureWriter;

    fn make_writer(&'a self) -> Self::Writer {
        CaptureWriter {
            buffer: Arc::clone(&self.buffer),
        }
    }
}

fn lock(buffer: &Mutex<Vec<u8>>) -> MutexGuard<'_, Vec<u8>> {
    buffer.lock().unwrap_or_else(PoisonError::into_inner)
}

impl LogCapture {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A JSON subscriber writing into this capture at `level` and above.
    #[must_use]
    pub fn dispatch(&self, level: Level) -> Dispatch {
        let fmt_layer = fmt::layer()
            .json()
            .with_ansi(false)
            .with_current_span(false)
            .with_writer(self.clone());
        let subscriber = Registry::default()
            .with(fmt_layer)
            .with(LevelFilter::from_level(level));
        Dispatch::new(subscriber)
    }

    /// Run `f` with this capture as the thread's default subscriber.
    pub fn with_default<T>(&self, level: Level, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch(level), f)
    }

    /// Make this capture the thread's default until the guard drops.
    #[must_use]
    pub fn set_default(&self, level: Level) -> DefaultGuard {
        tracing::dispatcher::set_default(&self.dispatch(level))
    }

    #[must_use]
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&lock(&self.buffer)).into_owned()
    }

    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.contents().contains(needle)
    }

    /// Parsed log lines.
    ///
    /// # Errors
    /// Returns an error if a captured line is not valid JSON.
    pub fn entries(&self) -> Result<Vec<Value>, serde_json::Error> {
        self.contents()
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(serde_json::from_str)
            .collect()
    }

    /// The `message` field of every parsable line.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.contents()
            .lines()
            .filter_map(|line| serde_json::from_str::<Value>(line).ok())
            .filter_map(|entry| {
                entry
                    .pointer("/fields/message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .collect()
    }

    pub fn reset(&self) {
        lock(&self.buffer).clear();
    }
}

fn details_object(details: &[(&str, &str)]) -> Value {
    let map: Map<String, Value> = details
        .iter()
        .map(|(key, value)| ((*key).to_string(), Value::String(redact(value))))
        .collect();
    Value::Object(map)
}

/// Log a failed test with its redacted error chain and extra details.
pub fn log_test_failure(test_name: &str, err: Option<&dyn Error>, details: &[(&str, &str)]) {
    let reason = err.map(|err| redact_error(err)).unwrap_or_default();
    error!(
        test_name,
        test_status = "failed",
        error = %reason,
        details = %details_object(details),
        "TEST FAILED"
    );
}

/// Log a skipped test and why.
pub fn log_test_skip(test_name: &str, reason: &str) {
    warn!(
        test_name,
        test_status = "skipped",
        reason = %redact(reason),
        "TEST SKIPPED"
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tracing::{debug, info};

    #[test]
    fn captures_json_lines() {
        let capture = LogCapture::new();
        capture.with_default(Level::INFO, || {
            info!(port = 5432, "listening");
            debug!("hidden");
        });

        let entries = capture.entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["level"], "INFO");
        assert_eq!(entries[0]["fields"]["message"], "listening");
        assert_eq!(entries[0]["fields"]["port"], 5432);
        assert_eq!(capture.messages(), vec!["listening".to_string()]);
    }

    #[test]
    fn reset_clears_buffer() {
        let capture = LogCapture::new();
        capture.with_default(Level::INFO, || info!("first"));
        assert!(capture.contains("first"));
        capture.reset();
        assert!(capture.contents().is_empty());
    }

    #[test]
    fn failure_details_are_redacted() {
        let capture = LogCapture::new();
        let err = io::Error::other("connect to postgres://app:hunter22@db/app failed");
        capture.with_default(Level::INFO, || {
            log_test_failure(
                "test_login",
                Some(&err as &dyn Error),
                &[("contact", "ops@example.com"), ("stage", "setup")],
            );
        });

        let entries = capture.entries().unwrap();
        let fields = &entries[0]["fields"];
        assert_eq!(entries[0]["level"], "ERROR");
        assert_eq!(fields["test_name"], "test_login");
        assert_eq!(fields["test_status"], "failed");
        assert!(!capture.contains("hunter22"));
        assert!(!capture.contains("ops@example.com"));
        assert!(capture.contains("setup"));
    }

    #[test]
    fn skip_is_a_warning() {
        let capture = LogCapture::new();
        capture.with_default(Level::INFO, || log_test_skip("test_db", "no database configured"));

        let entries = capture.entries().unwrap();
        assert_eq!(entries[0]["level"], "WARN");
        assert_eq!(entries[0]["fields"]["test_status"], "skipped");
        assert_eq!(entries[0]["fields"]["reason"], "no database configured");
    }
}
