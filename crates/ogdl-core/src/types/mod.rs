//! # Core Type Definitions
//!
//! Source positions and the error taxonomy shared by every stage:
//! - `Position` (line, column, byte offset into the source text)
//! - `LexError` (malformed tokens)
//! - `ParseError` (structural violations; wraps `LexError`)
//! - `CodecError` (corrupt or truncated binary input)
//! - `PathError` (path syntax, only from the explicit `Path::parse` APIs)
//! - `JournalError` (journal offsets and embedded documents)
//!
//! ## Error Guarantees
//!
//! - No silent failures: fallible operations return `Result`
//! - Every error carries enough context to locate the fault
//! - The core never panics on malformed input

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// SOURCE POSITION
// =============================================================================

/// A location in source text.
///
/// `line` and `column` are 1-based and count characters; `offset` is the
/// 0-based byte offset into the (UTF-8) input.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl Position {
    /// Position of the first character of a document.
    pub const START: Self = Self {
        line: 1,
        column: 1,
        offset: 0,
    };

    #[must_use]
    pub const fn new(line: usize, column: usize, offset: usize) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

// =============================================================================
// LEXER ERRORS
// =============================================================================

/// Errors raised while turning text into tokens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    /// The input is not valid UTF-8.
    #[error("invalid UTF-8 at byte {}", position.offset)]
    InvalidUtf8 { position: Position },

    /// A quoted string reached end of input before its closing quote.
    #[error("unterminated string starting at {position}")]
    UnterminatedString { quote: char, position: Position },

    /// A backslash escape inside a quoted string is not recognized.
    #[error("invalid escape '{escape}' at {position}")]
    InvalidEscape { escape: String, position: Position },

    /// Spaces and tabs are mixed in indentation.
    #[error("mixed tabs and spaces in indentation at {position}")]
    MixedIndentation { position: Position },

    /// A single token exceeds the configured maximum length.
    #[error("token longer than {limit} bytes at {position}")]
    TokenTooLong { limit: usize, position: Position },
}

impl LexError {
    /// Where the fault was detected.
    #[must_use]
    pub fn position(&self) -> Position {
        match self {
            Self::InvalidUtf8 { position }
            | Self::UnterminatedString { position, .. }
            | Self::InvalidEscape { position, .. }
            | Self::MixedIndentation { position }
            | Self::TokenTooLong { position, .. } => *position,
        }
    }
}

// =============================================================================
// PARSER ERRORS
// =============================================================================

/// Errors raised while building a tree from tokens.
///
/// A failed parse never yields a partial tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The lexer rejected the input.
    #[error(transparent)]
    Lex(#[from] LexError),

    /// A `(`, `)` or `,` appeared where it cannot start or end an entry.
    #[error("unexpected '{delimiter}' at {position}")]
    UnexpectedDelimiter { delimiter: char, position: Position },

    /// A scalar followed a closed group inside the same entry.
    #[error("unexpected {found} after group at {position}")]
    UnexpectedToken { found: String, position: Position },

    /// Input ended while a group was still open.
    #[error("unterminated group opened at {position}")]
    UnterminatedGroup { position: Position },

    /// A line is indented less than the first line of the document.
    #[error("dedent past root at {position}: indentation {indent} is less than {base}")]
    DedentPastRoot {
        indent: usize,
        base: usize,
        position: Position,
    },

    /// Nesting exceeds the configured maximum depth.
    #[error("nesting deeper than {limit} levels at {position}")]
    TooDeep { limit: usize, position: Position },
}

impl ParseError {
    /// Where the fault was detected.
    #[must_use]
    pub fn position(&self) -> Position {
        match self {
            Self::Lex(e) => e.position(),
            Self::UnexpectedDelimiter { position, .. }
            | Self::UnexpectedToken { position, .. }
            | Self::UnterminatedGroup { position }
            | Self::DedentPastRoot { position, .. }
            | Self::TooDeep { position, .. } => *position,
        }
    }
}

// =============================================================================
// CODEC ERRORS
// =============================================================================

/// Errors raised while decoding the binary format.
///
/// Every variant carries the byte offset of the record field at fault.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The input ended in the middle of a record.
    #[error("truncated record at byte {offset}: {needed} more bytes needed")]
    Truncated { offset: usize, needed: usize },

    /// A length prefix points past the end of the input.
    #[error("length {declared} at byte {offset} exceeds the {remaining} bytes remaining")]
    LengthOverflow {
        offset: usize,
        declared: u32,
        remaining: usize,
    },

    /// The record tag is not one of the known tags.
    #[error("unknown tag 0x{tag:02x} at byte {offset}")]
    UnknownTag { offset: usize, tag: u8 },

    /// The tag disagrees with the child count.
    #[error("tag 0x{tag:02x} at byte {offset} does not allow {children} children")]
    TagMismatch {
        offset: usize,
        tag: u8,
        children: u32,
    },

    /// The declared child count cannot fit in the remaining input.
    #[error("child count {declared} at byte {offset} cannot fit in {remaining} bytes")]
    ChildCountOverflow {
        offset: usize,
        declared: u32,
        remaining: usize,
    },

    /// A name or value is not valid UTF-8.
    #[error("invalid UTF-8 in string at byte {offset}")]
    InvalidUtf8 { offset: usize },

    /// Records nest deeper than the configured limit.
    #[error("nesting deeper than {limit} levels at byte {offset}")]
    TooDeep { offset: usize, limit: usize },

    /// Bytes remain after the root record.
    #[error("{remaining} trailing bytes after root record at byte {offset}")]
    TrailingBytes { offset: usize, remaining: usize },
}

impl CodecError {
    /// Byte offset of the fault.
    #[must_use]
    pub fn offset(&self) -> usize {
        match self {
            Self::Truncated { offset, .. }
            | Self::LengthOverflow { offset, .. }
            | Self::UnknownTag { offset, .. }
            | Self::TagMismatch { offset, .. }
            | Self::ChildCountOverflow { offset, .. }
            | Self::InvalidUtf8 { offset }
            | Self::TooDeep { offset, .. }
            | Self::TrailingBytes { offset, .. } => *offset,
        }
    }
}

// =============================================================================
// PATH ERRORS
// =============================================================================

/// Errors from parsing or materializing a path.
///
/// Plain lookups (`Node::get`) never surface these; they return `None`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// A quoted name is missing its closing quote.
    #[error("unterminated quote at offset {offset}")]
    UnterminatedQuote { offset: usize },

    /// An index is missing its closing `]`.
    #[error("unterminated index at offset {offset}")]
    UnterminatedIndex { offset: usize },

    /// The text between `[` and `]` is not a non-negative integer.
    #[error("invalid index '{text}' at offset {offset}")]
    InvalidIndex { text: String, offset: usize },

    /// Two dots in a row, or a dot at either end of the path.
    #[error("empty path element at offset {offset}")]
    EmptyElement { offset: usize },

    /// A character that cannot appear at this point of a path.
    #[error("unexpected '{found}' at offset {offset}")]
    UnexpectedChar { found: char, offset: usize },

    /// An index selector does not resolve; indices are never created.
    #[error("'{path}' does not resolve")]
    NotFound { path: String },
}

// =============================================================================
// JOURNAL ERRORS
// =============================================================================

/// Errors from reading documents out of a journal buffer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JournalError {
    /// The offset lies beyond the end of the journal.
    #[error("offset {offset} is beyond the journal length {len}")]
    OffsetOutOfRange { offset: usize, len: usize },

    /// The document stored at `offset` does not parse.
    #[error("document at offset {offset}: {source}")]
    Parse {
        offset: usize,
        #[source]
        source: ParseError,
    },
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_display_is_line_and_column() {
        let pos = Position::new(3, 7, 42);
        assert_eq!(pos.to_string(), "line 3, column 7");
    }

    #[test]
    fn parse_error_exposes_lex_position() {
        let lex = LexError::MixedIndentation {
            position: Position::new(2, 1, 10),
        };
        let err = ParseError::from(lex);
        assert_eq!(err.position(), Position::new(2, 1, 10));
    }

    #[test]
    fn codec_error_reports_offset() {
        let err = CodecError::UnknownTag { offset: 9, tag: 0x7f };
        assert_eq!(err.offset(), 9);
        assert_eq!(err.to_string(), "unknown tag 0x7f at byte 9");
    }
}
