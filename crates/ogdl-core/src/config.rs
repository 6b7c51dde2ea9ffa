//! # Configuration
//!
//! Option structs for the parser, printer and codec.
//!
//! Every struct deserializes with `#[serde(default)]`, so a configuration
//! file only needs the keys it changes. The core never reads files; the
//! app layer loads these from TOML.

use crate::primitives::{DEFAULT_INDENT, MAX_BINARY_DEPTH, MAX_TEXT_DEPTH, MAX_TOKEN_LENGTH};
use serde::{Deserialize, Serialize};

/// Limits applied while lexing and parsing text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParserConfig {
    /// Maximum nesting depth (indentation levels plus open groups).
    pub max_depth: usize,
    /// Maximum length in bytes of a single token.
    pub max_token_len: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_depth: MAX_TEXT_DEPTH,
            max_token_len: MAX_TOKEN_LENGTH,
        }
    }
}

/// Layout of printed OGDL text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PrintOptions {
    /// Spaces per nesting level.
    pub indent: usize,
    /// Stop printing below this depth (`None` prints everything).
    pub max_depth: Option<usize>,
    /// Print runs of three or more unnamed scalars on one line (`a b c`)
    /// and row nodes as `name |` tables.
    pub compact_scalars: bool,
}

impl Default for PrintOptions {
    fn default() -> Self {
        Self {
            indent: DEFAULT_INDENT,
            max_depth: None,
            compact_scalars: true,
        }
    }
}

/// Limits applied while decoding binary input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CodecLimits {
    /// Maximum record nesting depth.
    pub max_depth: usize,
}

impl Default for CodecLimits {
    fn default() -> Self {
        Self {
            max_depth: MAX_BINARY_DEPTH,
        }
    }
}

/// All core options, grouped the way a configuration file lays them out.
///
/// ```toml
/// [parser]
/// max_depth = 64
///
/// [printer]
/// indent = 4
///
/// [codec]
/// max_depth = 256
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub parser: ParserConfig,
    pub printer: PrintOptions,
    pub codec: CodecLimits,
}
