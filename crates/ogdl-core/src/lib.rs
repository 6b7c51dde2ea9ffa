//! # ogdl-core
//!
//! Parser, tree model, path queries and binary codec for OGDL, the Ordered
//! Graph Data Language.
//!
//! OGDL describes trees with indentation, `,`-separated entries and inline
//! `( … )` groups:
//!
//! ```text
//! server
//!   host example.org
//!   ports (80, 443)
//!   tags web tls public
//! ```
//!
//! ## Pipeline
//!
//! text → [`Lexer`] → [`parse_text`] → [`Node`] ⇄ [`encode_binary`] / [`decode_binary`]
//!
//! [`Node`] also renders back to text ([`to_text`]) and Graphviz ([`to_dot`]),
//! and answers path queries ([`Node::get`]).
//!
//! ## Architectural Constraints
//!
//! - Pure and synchronous: no I/O, no threads, no global state
//! - Every limit (nesting depth, token length) is explicit configuration
//! - Diagnostics flow to a caller-supplied [`DiagnosticSink`]
//! - Malformed input yields an error value, never a panic

// =============================================================================
// MODULES
// =============================================================================

pub mod codec;
pub mod config;
pub mod diagnostics;
pub mod dot;
pub mod graph;
pub mod journal;
pub mod lexer;
pub mod parser;
pub mod path;
pub mod primitives;
pub mod printer;
pub mod types;

// =============================================================================
// RE-EXPORTS: Types and errors
// =============================================================================

pub use types::{CodecError, JournalError, LexError, ParseError, PathError, Position};

// =============================================================================
// RE-EXPORTS: Model and text
// =============================================================================

pub use graph::{Descendants, Node, Walk};
pub use lexer::{Lexer, Token, TokenKind, lex};
pub use parser::{parse_str, parse_text, parse_text_with};
pub use path::{Path, Selector};
pub use printer::{print_text, to_text};

// =============================================================================
// RE-EXPORTS: Binary, export, journal
// =============================================================================

pub use codec::{decode_binary, decode_binary_with, encode_binary, encode_binary_with};
#[cfg(feature = "crypto-hash")]
pub use codec::{fingerprint, verify_fingerprint};
pub use dot::to_dot;
pub use journal::{Documents, Journal};

// =============================================================================
// RE-EXPORTS: Configuration and diagnostics
// =============================================================================

pub use config::{CodecLimits, Config, ParserConfig, PrintOptions};
pub use diagnostics::{
    Diagnostic, DiagnosticSink, Level, LevelFilter, MemorySink, NullSink, WriterSink,
};
