//! Diagnostics sink contract and the sinks shipped with the engine.
//!
//! Both engines report through a [`DiagnosticsSink`] synchronously, inline
//! with evaluation. Expression callables receive the same sink so they can
//! report their own problems.
//!
//! - [`TracingSink`] forwards to `tracing` (the default)
//! - [`MemorySink`] keeps entries in memory for inspection
//! - [`NullSink`] discards everything

use std::error::Error as StdError;
use std::fmt;
use std::sync::{Mutex, MutexGuard};

pub trait DiagnosticsSink: Send + Sync {
    fn info(&self, message: &str);
    fn debug(&self, message: &str);
    fn trace(&self, message: &str);
    fn warning(&self, message: &str, error: Option<&(dyn StdError + 'static)>);
    fn error(&self, message: &str, error: Option<&(dyn StdError + 'static)>);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARN",
            LogLevel::Error => "ERROR",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    /// Display text of the attached error, if any
    pub error: Option<String>,
}

/// Forwards every diagnostic to the matching `tracing` macro.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn info(&self, message: &str) {
        tracing::info!("{message}");
    }

    fn debug(&self, message: &str) {
        tracing::debug!("{message}");
    }

    fn trace(&self, message: &str) {
        tracing::trace!("{message}");
    }

    fn warning(&self, message: &str, error: Option<&(dyn StdError + 'static)>) {
        match error {
            Some(err) => tracing::warn!(error = %err, "{message}"),
            None => tracing::warn!("{message}"),
        }
    }

    fn error(&self, message: &str, error: Option<&(dyn StdError + 'static)>) {
        match error {
            Some(err) => tracing::error!(error = %err, "{message}"),
            None => tracing::error!("{message}"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticsSink for NullSink {
    fn info(&self, _message: &str) {}
    fn debug(&self, _message: &str) {}
    fn trace(&self, _message: &str) {}
    fn warning(&self, _message: &str, _error: Option<&(dyn StdError + 'static)>) {}
    fn error(&self, _message: &str, _error: Option<&(dyn StdError + 'static)>) {}
}

/// Records diagnostics in memory.
///
/// Entries from parallel branches arrive in no particular order, so callers
/// should inspect counts and contents rather than positions.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<LogEntry>> {
        // A panicking expression must not take the recorded history with it
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, level: LogLevel, message: &str, error: Option<&(dyn StdError + 'static)>) {
        self.lock().push(LogEntry {
            level,
            message: message.to_string(),
            error: error.map(|err| err.to_string()),
        });
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.lock().clone()
    }

    pub fn count(&self, level: LogLevel) -> usize {
        self.lock().iter().filter(|entry| entry.level == level).count()
    }

    pub fn messages_at(&self, level: LogLevel) -> Vec<String> {
        self.lock()
            .iter()
            .filter(|entry| entry.level == level)
            .map(|entry| entry.message.clone())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

impl DiagnosticsSink for MemorySink {
    fn info(&self, message: &str) {
        self.record(LogLevel::Info, message, None);
    }

    fn debug(&self, message: &str) {
        self.record(LogLevel::Debug, message, None);
    }

    fn trace(&self, message: &str) {
        self.record(LogLevel::Trace, message, None);
    }

    fn warning(&self, message: &str, error: Option<&(dyn StdError + 'static)>) {
        self.record(LogLevel::Warning, message, error);
    }

    fn error(&self, message: &str, error: Option<&(dyn StdError + 'static)>) {
        self.record(LogLevel::Error, message, error);
    }
}
