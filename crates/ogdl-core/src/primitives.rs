//! # Primitives
//!
//! Fixed constants of the OGDL text and binary formats.
//!
//! These are compiled in and immutable at runtime. Configurable limits
//! (see [`crate::config`]) default to the values defined here.

// =============================================================================
// TEXT FORMAT
// =============================================================================

/// Opens an inline group: `a (b, c)`.
pub const GROUP_OPEN: char = '(';

/// Closes an inline group.
pub const GROUP_CLOSE: char = ')';

/// Separates sibling entries on one line or inside a group.
pub const SEPARATOR: char = ',';

/// Starts a comment that runs to the end of the line.
pub const COMMENT: char = '#';

/// A lone trailing backslash introduces an indented block of text.
pub const BLOCK_MARKER: char = '\\';

/// A lone trailing bar introduces a table: every deeper-indented line that
/// follows becomes a row named by its index.
pub const TABLE_MARKER: char = '|';

/// End-of-stream marker between documents in a journal.
///
/// Any control character other than NL, CR and TAB would do; form feed is
/// what OGDL log files have always used.
pub const END_OF_STREAM: u8 = 0x0c;

/// Byte-order mark skipped (with a warning) at the start of text input.
pub const BYTE_ORDER_MARK: char = '\u{feff}';

// =============================================================================
// BINARY FORMAT
// =============================================================================

/// Record tag for a node without children.
pub const TAG_NODE: u8 = 0x00;

/// Record tag for a node with at least one child.
pub const TAG_GROUP: u8 = 0x01;

/// Width in bytes of every length and count field (big-endian `u32`).
pub const FIELD_WIDTH: usize = 4;

/// Smallest possible record: tag + name length + value length + child count.
pub const MIN_RECORD_SIZE: usize = 1 + 3 * FIELD_WIDTH;

// =============================================================================
// DEFAULT LIMITS
// =============================================================================

/// Default maximum nesting depth for parsed text (indentation levels plus
/// open groups).
pub const MAX_TEXT_DEPTH: usize = 128;

/// Default maximum length in bytes of a single token.
pub const MAX_TOKEN_LENGTH: usize = 65534;

/// Default maximum nesting depth accepted by the binary decoder.
pub const MAX_BINARY_DEPTH: usize = 1024;

/// Default number of spaces per level used by the printer.
pub const DEFAULT_INDENT: usize = 2;
