//! # Lexer
//!
//! Turns OGDL text into a lazy, finite stream of [`Token`]s.
//!
//! Recognized input:
//! - indentation at the start of every non-blank line (`Indent(width)`)
//! - line breaks (`\n`, `\r\n`, lone `\r`)
//! - bare words, quoted strings (`"…"` or `'…'`) with escapes
//! - block text introduced by a trailing `\`
//! - the table marker, a trailing `|`
//! - `#` comments, running to the end of the line
//! - the structural delimiters `(`, `)` and `,`
//!
//! The lexer is an `Iterator<Item = Result<Token, LexError>>`. It ends after
//! yielding `Eof` once, or right after the first error. [`Lexer::reset`]
//! restarts it from the beginning of the input.

use crate::primitives::{
    BLOCK_MARKER, BYTE_ORDER_MARK, COMMENT, GROUP_CLOSE, GROUP_OPEN, MAX_TOKEN_LENGTH, SEPARATOR,
    TABLE_MARKER,
};
use crate::types::{LexError, Position};

// =============================================================================
// TOKENS
// =============================================================================

/// What a token is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Bare run of non-delimiter characters.
    Word(String),
    /// Quoted string, escapes resolved.
    Quoted(String),
    /// Multi-line block text, indentation stripped.
    Block(String),
    /// Comment body (without the leading `#`).
    Comment(String),
    /// Leading whitespace width of a non-blank line.
    Indent(usize),
    /// End of a line.
    Newline,
    /// `(`
    GroupOpen,
    /// `)`
    GroupClose,
    /// `,`
    Separator,
    /// `|` at the end of a line.
    Table,
    /// End of input.
    Eof,
}

impl TokenKind {
    /// Short human-readable name, used in error messages.
    #[must_use]
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Word(_) => "word",
            Self::Quoted(_) => "quoted string",
            Self::Block(_) => "block text",
            Self::Comment(_) => "comment",
            Self::Indent(_) => "indentation",
            Self::Newline => "end of line",
            Self::GroupOpen => "'('",
            Self::GroupClose => "')'",
            Self::Separator => "','",
            Self::Table => "table marker",
            Self::Eof => "end of input",
        }
    }

    /// True for tokens that carry a scalar (word, quoted string, block).
    #[must_use]
    pub fn is_scalar(&self) -> bool {
        matches!(self, Self::Word(_) | Self::Quoted(_) | Self::Block(_))
    }

    /// The scalar text, if this is a scalar token.
    #[must_use]
    pub fn into_scalar(self) -> Option<String> {
        match self {
            Self::Word(s) | Self::Quoted(s) | Self::Block(s) => Some(s),
            _ => None,
        }
    }
}

/// A token and where it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub pos: Position,
}

impl Token {
    #[must_use]
    pub fn new(kind: TokenKind, pos: Position) -> Self {
        Self { kind, pos }
    }
}

// =============================================================================
// LEXER
// =============================================================================

/// Lex raw bytes. Shorthand for [`Lexer::from_bytes`].
pub fn lex(input: &[u8]) -> Result<Lexer<'_>, LexError> {
    Lexer::from_bytes(input)
}

/// Streaming tokenizer over a UTF-8 string.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    input: &'a str,
    start: usize,
    offset: usize,
    line: usize,
    column: usize,
    at_line_start: bool,
    line_indent: usize,
    indent_char: Option<char>,
    max_token_len: usize,
    pending: Option<Token>,
    finished: bool,
}

impl<'a> Lexer<'a> {
    /// Create a lexer over `input`. A leading byte-order mark is skipped.
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        let start = if input.starts_with(BYTE_ORDER_MARK) {
            BYTE_ORDER_MARK.len_utf8()
        } else {
            0
        };
        Self {
            input,
            start,
            offset: start,
            line: 1,
            column: 1,
            at_line_start: true,
            line_indent: 0,
            indent_char: None,
            max_token_len: MAX_TOKEN_LENGTH,
            pending: None,
            finished: false,
        }
    }

    /// Validate `bytes` as UTF-8 and create a lexer over them.
    pub fn from_bytes(bytes: &'a [u8]) -> Result<Self, LexError> {
        match std::str::from_utf8(bytes) {
            Ok(text) => Ok(Self::new(text)),
            Err(e) => Err(LexError::InvalidUtf8 {
                position: position_of(bytes, e.valid_up_to()),
            }),
        }
    }

    /// Set the maximum accepted token length in bytes.
    #[must_use]
    pub fn with_max_token_len(mut self, max: usize) -> Self {
        self.max_token_len = max;
        self
    }

    /// Rewind to the beginning of the input.
    pub fn reset(&mut self) {
        *self = Self::new(self.input).with_max_token_len(self.max_token_len);
    }

    /// Whether the input started with a byte-order mark.
    #[must_use]
    pub fn has_bom(&self) -> bool {
        self.start > 0
    }

    /// Current position of the cursor.
    #[must_use]
    pub fn cursor(&self) -> Position {
        Position::new(self.line, self.column, self.offset)
    }

    /// Indentation width of the line being lexed.
    #[must_use]
    pub fn line_indent(&self) -> usize {
        self.line_indent
    }

    /// Lex the whole input, stopping at the first error.
    pub fn tokenize(self) -> Result<Vec<Token>, LexError> {
        self.collect()
    }

    // -------------------------------------------------------------------------
    // Cursor
    // -------------------------------------------------------------------------

    fn peek(&self) -> Option<char> {
        self.input[self.offset..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.offset += c.len_utf8();
        match c {
            '\n' => self.next_line(),
            '\r' if self.peek() != Some('\n') => self.next_line(),
            _ => self.column += 1,
        }
        Some(c)
    }

    fn next_line(&mut self) {
        self.line += 1;
        self.column = 1;
    }

    /// Consume one line break if present.
    fn eat_newline(&mut self) -> bool {
        match self.peek() {
            Some('\r') => {
                self.bump();
                if self.peek() == Some('\n') {
                    self.bump();
                }
                true
            }
            Some('\n') => {
                self.bump();
                true
            }
            _ => false,
        }
    }

    fn check_len(&self, len: usize, start: Position) -> Result<(), LexError> {
        if len > self.max_token_len {
            return Err(LexError::TokenTooLong {
                limit: self.max_token_len,
                position: start,
            });
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Token production
    // -------------------------------------------------------------------------

    fn next_token(&mut self) -> Result<Option<Token>, LexError> {
        if let Some(token) = self.pending.take() {
            return Ok(Some(token));
        }
        if self.finished {
            return Ok(None);
        }

        loop {
            if self.at_line_start {
                match self.indentation()? {
                    Some(token) => return Ok(Some(token)),
                    None => continue,
                }
            }

            while matches!(self.peek(), Some(' ' | '\t')) {
                self.bump();
            }

            let start = self.cursor();
            let Some(c) = self.peek() else {
                self.finished = true;
                return Ok(Some(Token::new(TokenKind::Eof, start)));
            };

            let kind = match c {
                '\n' | '\r' => {
                    self.eat_newline();
                    self.at_line_start = true;
                    TokenKind::Newline
                }
                GROUP_OPEN => {
                    self.bump();
                    TokenKind::GroupOpen
                }
                GROUP_CLOSE => {
                    self.bump();
                    TokenKind::GroupClose
                }
                SEPARATOR => {
                    self.bump();
                    TokenKind::Separator
                }
                COMMENT => self.comment(),
                '"' | '\'' => self.quoted(c, start)?,
                BLOCK_MARKER if self.ends_line(BLOCK_MARKER) => self.block(start)?,
                TABLE_MARKER if self.ends_line(TABLE_MARKER) => {
                    self.bump();
                    TokenKind::Table
                }
                _ => self.word(start)?,
            };
            return Ok(Some(Token::new(kind, start)));
        }
    }

    /// Measure the indentation of a new line.
    ///
    /// Returns `None` after skipping a blank line, or when input ends; the
    /// caller loops and produces the next token.
    fn indentation(&mut self) -> Result<Option<Token>, LexError> {
        let start = self.cursor();
        let (mut spaces, mut tabs) = (0usize, 0usize);
        loop {
            match self.peek() {
                Some(' ') => spaces += 1,
                Some('\t') => tabs += 1,
                _ => break,
            }
            self.bump();
        }

        match self.peek() {
            None => {
                self.at_line_start = false;
                return Ok(None);
            }
            Some('\n' | '\r') => {
                self.eat_newline();
                return Ok(None);
            }
            Some(_) => {}
        }

        if spaces > 0 && tabs > 0 {
            return Err(LexError::MixedIndentation { position: start });
        }
        if spaces + tabs > 0 {
            let used = if spaces > 0 { ' ' } else { '\t' };
            match self.indent_char {
                Some(expected) if expected != used => {
                    return Err(LexError::MixedIndentation { position: start });
                }
                _ => self.indent_char = Some(used),
            }
        }

        self.at_line_start = false;
        self.line_indent = spaces + tabs;
        Ok(Some(Token::new(TokenKind::Indent(self.line_indent), start)))
    }

    fn comment(&mut self) -> TokenKind {
        self.bump();
        let body_start = self.offset;
        while !matches!(self.peek(), None | Some('\n' | '\r')) {
            self.bump();
        }
        TokenKind::Comment(self.input[body_start..self.offset].to_string())
    }

    fn word(&mut self, start: Position) -> Result<TokenKind, LexError> {
        while self.peek().is_some_and(is_word_char) {
            self.bump();
        }
        let text = &self.input[start.offset..self.offset];
        self.check_len(text.len(), start)?;
        Ok(TokenKind::Word(text.to_string()))
    }

    fn quoted(&mut self, quote: char, start: Position) -> Result<TokenKind, LexError> {
        self.bump();
        let mut text = String::new();
        loop {
            let at = self.cursor();
            match self.bump() {
                None => return Err(LexError::UnterminatedString { quote, position: start }),
                Some(c) if c == quote => break,
                Some('\\') => text.push(self.escape(quote, start, at)?),
                Some(c) => text.push(c),
            }
            self.check_len(text.len(), start)?;
        }
        Ok(TokenKind::Quoted(text))
    }

    /// Resolve the escape whose backslash sat at `at`.
    fn escape(&mut self, quote: char, start: Position, at: Position) -> Result<char, LexError> {
        let invalid = |escape: String| LexError::InvalidEscape {
            escape,
            position: at,
        };
        let Some(c) = self.bump() else {
            return Err(LexError::UnterminatedString { quote, position: start });
        };
        match c {
            'n' => Ok('\n'),
            'r' => Ok('\r'),
            't' => Ok('\t'),
            '0' => Ok('\0'),
            '\\' | '"' | '\'' => Ok(c),
            'u' => {
                if self.peek() != Some('{') {
                    return Err(invalid("\\u".to_string()));
                }
                self.bump();
                let digits_start = self.offset;
                while self.peek().is_some_and(|d| d.is_ascii_hexdigit()) {
                    self.bump();
                }
                let digits = &self.input[digits_start..self.offset];
                if self.peek() != Some('}') {
                    return Err(invalid(format!("\\u{{{}", digits)));
                }
                self.bump();
                u32::from_str_radix(digits, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| invalid(format!("\\u{{{}}}", digits)))
            }
            other => Err(invalid(format!("\\{}", other))),
        }
    }

    /// A `\` or `|` is a marker only when nothing but blanks follow it on
    /// the same line.
    fn ends_line(&self, marker: char) -> bool {
        let rest = &self.input[self.offset + marker.len_utf8()..];
        let rest = rest.trim_start_matches([' ', '\t']);
        rest.is_empty() || rest.starts_with(['\n', '\r'])
    }

    /// Collect the lines indented deeper than the current line.
    fn block(&mut self, start: Position) -> Result<TokenKind, LexError> {
        self.bump();
        while matches!(self.peek(), Some(' ' | '\t')) {
            self.bump();
        }
        self.eat_newline();

        let input = self.input;
        let base = self.line_indent;
        // `None` marks a blank line.
        let mut lines: Vec<Option<(usize, &str)>> = Vec::new();
        while self.offset < input.len() {
            let rest = &input[self.offset..];
            let end = rest.find(['\n', '\r']).unwrap_or(rest.len());
            let line = &rest[..end];
            let indent = line.len() - line.trim_start_matches([' ', '\t']).len();
            let blank = indent == line.len();
            if !blank && indent <= base {
                break;
            }
            lines.push((!blank).then_some((indent, line)));
            self.offset += line.len();
            self.column += line.chars().count();
            self.eat_newline();
        }

        while lines.last().is_some_and(Option::is_none) {
            lines.pop();
        }
        let strip = lines
            .iter()
            .flatten()
            .map(|(indent, _)| *indent)
            .next()
            .unwrap_or(0);
        let text = lines
            .iter()
            .map(|line| match line {
                Some((indent, line)) => &line[(*indent).min(strip)..],
                None => "",
            })
            .collect::<Vec<_>>()
            .join("\n");
        self.check_len(text.len(), start)?;

        // The block swallowed the end of its own line.
        self.at_line_start = true;
        self.pending = Some(Token::new(TokenKind::Newline, self.cursor()));
        Ok(TokenKind::Block(text))
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_token() {
            Ok(token) => token.map(Ok),
            Err(e) => {
                self.finished = true;
                self.pending = None;
                Some(Err(e))
            }
        }
    }
}

/// Characters that may appear in a bare word.
fn is_word_char(c: char) -> bool {
    !matches!(c, ' ' | '\t' | '\n' | '\r' | GROUP_OPEN | GROUP_CLOSE | SEPARATOR)
}

/// Line and column of byte `offset` in `bytes`, counting only the valid
/// UTF-8 prefix.
fn position_of(bytes: &[u8], offset: usize) -> Position {
    let prefix = String::from_utf8_lossy(&bytes[..offset]);
    let line = 1 + prefix.matches('\n').count();
    let column = 1 + prefix
        .rsplit('\n')
        .next()
        .map(|last| last.chars().count())
        .unwrap_or(0);
    Position::new(line, column, offset)
}

// =============================================================================
// TESTS
// =============================================================================
