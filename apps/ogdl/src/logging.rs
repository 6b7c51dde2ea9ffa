//! # Tracing Bridge
//!
//! Forwards core diagnostics to `tracing`, so they obey the same
//! `RUST_LOG` filter and formatter as the rest of the app.

use ogdl_core::{DiagnosticSink, Level, Position};

/// A [`DiagnosticSink`] that emits `tracing` events.
///
/// Positions become `line` and `column` fields; `0` means none was given.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn log(&self, level: Level, message: &str, position: Option<Position>) {
        let (line, column) = position.map_or((0, 0), |p| (p.line, p.column));
        match level {
            Level::Error => tracing::error!(line, column, "{}", message),
            Level::Warning => tracing::warn!(line, column, "{}", message),
            Level::Trace => tracing::trace!(line, column, "{}", message),
        }
    }

    fn enabled(&self, level: Level) -> bool {
        match level {
            Level::Error => tracing::enabled!(tracing::Level::ERROR),
            Level::Warning => tracing::enabled!(tracing::Level::WARN),
            Level::Trace => tracing::enabled!(tracing::Level::TRACE),
        }
    }
}
