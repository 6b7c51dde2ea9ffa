//! # Diagnostics
//!
//! Leveled messages tagged with an optional source position.
//!
//! There is no global logger. Every entry point that reports diagnostics
//! takes a `&dyn DiagnosticSink`, so the core stays reentrant and testable.
//! The app layer bridges a sink to `tracing`.
//!
//! ## Contract
//!
//! `DiagnosticSink::log` cannot fail. A sink whose backing store is
//! unavailable drops the message; it never interrupts parsing or encoding.

use crate::types::Position;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::io::Write;

// =============================================================================
// LEVEL
// =============================================================================

/// Severity of a diagnostic. Ordered from least to most severe.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    #[default]
    Trace,
    Warning,
    Error,
}

impl Level {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// SINK TRAIT
// =============================================================================

/// Receiver of diagnostics.
///
/// Implementations must swallow their own failures.
pub trait DiagnosticSink {
    /// Record one message.
    fn log(&self, level: Level, message: &str, position: Option<Position>);

    /// Whether messages at `level` are wanted at all.
    ///
    /// Callers check this before formatting expensive messages.
    fn enabled(&self, level: Level) -> bool {
        let _ = level;
        true
    }
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &S {
    fn log(&self, level: Level, message: &str, position: Option<Position>) {
        (**self).log(level, message, position);
    }

    fn enabled(&self, level: Level) -> bool {
        (**self).enabled(level)
    }
}

// =============================================================================
// DIAGNOSTIC RECORD
// =============================================================================

/// One recorded message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub level: Level,
    pub message: String,
    pub position: Option<Position>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            Some(pos) => write!(f, "{}: {} ({})", self.level, self.message, pos),
            None => write!(f, "{}: {}", self.level, self.message),
        }
    }
}

// =============================================================================
// SINKS
// =============================================================================

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn log(&self, _level: Level, _message: &str, _position: Option<Position>) {}

    fn enabled(&self, _level: Level) -> bool {
        false
    }
}

/// Keeps every message in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: RefCell<Vec<Diagnostic>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded messages, oldest first.
    #[must_use]
    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries
            .try_borrow()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    /// Remove and return all recorded messages.
    pub fn take(&self) -> Vec<Diagnostic> {
        self.entries
            .try_borrow_mut()
            .map(|mut entries| std::mem::take(&mut *entries))
            .unwrap_or_default()
    }

    /// Number of messages recorded at exactly `level`.
    #[must_use]
    pub fn count(&self, level: Level) -> usize {
        self.entries
            .try_borrow()
            .map(|entries| entries.iter().filter(|d| d.level == level).count())
            .unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries
            .try_borrow()
            .map(|entries| entries.is_empty())
            .unwrap_or(true)
    }
}

impl DiagnosticSink for MemorySink {
    fn log(&self, level: Level, message: &str, position: Option<Position>) {
        // A reentrant borrow means we are already inside `log`; drop the message.
        if let Ok(mut entries) = self.entries.try_borrow_mut() {
            entries.push(Diagnostic {
                level,
                message: message.to_string(),
                position,
            });
        }
    }
}

/// Writes one line per message to any `io::Write`.
///
/// Write errors are ignored.
#[derive(Debug)]
pub struct WriterSink<W: Write> {
    writer: RefCell<W>,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: RefCell::new(writer),
        }
    }

    /// Recover the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl<W: Write> DiagnosticSink for WriterSink<W> {
    fn log(&self, level: Level, message: &str, position: Option<Position>) {
        if let Ok(mut writer) = self.writer.try_borrow_mut() {
            let diagnostic = Diagnostic {
                level,
                message: message.to_string(),
                position,
            };
            let _ = writeln!(writer, "{}", diagnostic);
        }
    }
}

/// Forwards messages at or above `min` to an inner sink.
#[derive(Debug, Clone, Copy)]
pub struct LevelFilter<S> {
    inner: S,
    min: Level,
}

impl<S: DiagnosticSink> LevelFilter<S> {
    pub fn new(inner: S, min: Level) -> Self {
        Self { inner, min }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: DiagnosticSink> DiagnosticSink for LevelFilter<S> {
    fn log(&self, level: Level, message: &str, position: Option<Position>) {
        if level >= self.min {
            self.inner.log(level, message, position);
        }
    }

    fn enabled(&self, level: Level) -> bool {
        level >= self.min && self.inner.enabled(level)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    /// A writer that always fails.
    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }
    }

    #[test]
    fn level_ordering() {
        assert!(Level::Trace < Level::Warning);
        assert!(Level::Warning < Level::Error);
    }

    #[test]
    fn memory_sink_records_in_order() {
        let sink = MemorySink::new();
        sink.log(Level::Trace, "first", None);
        sink.log(Level::Error, "second", Some(Position::new(2, 3, 9)));

        let entries = sink.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].message, "first");
        assert_eq!(entries[1].position, Some(Position::new(2, 3, 9)));
        assert_eq!(sink.count(Level::Error), 1);
    }

    #[test]
    fn memory_sink_take_drains() {
        let sink = MemorySink::new();
        sink.log(Level::Warning, "w", None);
        assert_eq!(sink.take().len(), 1);
        assert!(sink.is_empty());
    }

    #[test]
    fn writer_sink_formats_lines() {
        let sink = WriterSink::new(Vec::new());
        sink.log(Level::Warning, "odd input", Some(Position::new(1, 4, 3)));
        sink.log(Level::Error, "bad", None);

        let out = String::from_utf8(sink.into_inner()).expect("utf8");
        assert_eq!(out, "warning: odd input (line 1, column 4)\nerror: bad\n");
    }

    #[test]
    fn writer_sink_swallows_io_errors() {
        let sink = WriterSink::new(BrokenPipe);
        // Must not panic or propagate.
        sink.log(Level::Error, "lost", None);
    }

    #[test]
    fn level_filter_drops_lower_levels() {
        let filter = LevelFilter::new(MemorySink::new(), Level::Warning);
        filter.log(Level::Trace, "noise", None);
        filter.log(Level::Warning, "kept", None);

        assert!(!filter.enabled(Level::Trace));
        assert!(filter.enabled(Level::Error));

        let inner = filter.into_inner();
        assert_eq!(inner.entries().len(), 1);
        assert_eq!(inner.entries()[0].message, "kept");
    }

    #[test]
    fn null_sink_is_disabled() {
        assert!(!NullSink.enabled(Level::Error));
        NullSink.log(Level::Error, "ignored", None);
    }
}
