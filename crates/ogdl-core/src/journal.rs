//! # Journal
//!
//! An append-only buffer of OGDL documents.
//!
//! Each document is stored as printed text followed by the end-of-stream
//! marker and a newline. [`Journal::add`] returns the byte offset of the new
//! document; [`Journal::get`] parses the document at an offset back into a
//! tree. The printer escapes every control character, so stored text never
//! contains a stray marker.
//!
//! The buffer is plain bytes: the app layer reads and writes it as a file.

use crate::config::ParserConfig;
use crate::diagnostics::{DiagnosticSink, NullSink};
use crate::graph::Node;
use crate::parser::parse_text_with;
use crate::primitives::END_OF_STREAM;
use crate::printer::to_text;
use crate::types::JournalError;

/// In-memory journal of OGDL documents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Journal {
    buf: Vec<u8>,
}

impl Journal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap existing journal bytes (for example a file's contents).
    #[must_use]
    pub fn from_bytes(buf: Vec<u8>) -> Self {
        Self { buf }
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Size of the journal in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Append a document and return its offset.
    pub fn add(&mut self, root: &Node) -> usize {
        let offset = self.buf.len();
        self.buf.extend_from_slice(to_text(root).as_bytes());
        self.buf.push(END_OF_STREAM);
        self.buf.push(b'\n');
        offset
    }

    /// Parse the document starting at `offset`.
    pub fn get(&self, offset: usize) -> Result<Node, JournalError> {
        self.get_with(offset, &ParserConfig::default(), &NullSink)
    }

    /// Parse the document at `offset` with explicit limits and diagnostics.
    pub fn get_with(
        &self,
        offset: usize,
        config: &ParserConfig,
        sink: &dyn DiagnosticSink,
    ) -> Result<Node, JournalError> {
        if offset >= self.buf.len() {
            return Err(JournalError::OffsetOutOfRange {
                offset,
                len: self.buf.len(),
            });
        }
        let (document, _, _) = self.segment(offset);
        parse_text_with(document, config, sink)
            .map_err(|source| JournalError::Parse { offset, source })
    }

    /// Iterate over `(offset, document)` pairs in order.
    pub fn iter(&self) -> Documents<'_> {
        Documents {
            journal: self,
            offset: 0,
        }
    }

    /// The document text at `offset`, the offset of the next document and
    /// whether the document was closed by a marker.
    fn segment(&self, offset: usize) -> (&[u8], usize, bool) {
        let rest = &self.buf[offset..];
        match rest.iter().position(|&b| b == END_OF_STREAM) {
            Some(end) => {
                let mut next = offset + end + 1;
                if self.buf.get(next) == Some(&b'\n') {
                    next += 1;
                }
                (&rest[..end], next, true)
            }
            None => (rest, self.buf.len(), false),
        }
    }
}

impl<'a> IntoIterator for &'a Journal {
    type Item = (usize, Result<Node, JournalError>);
    type IntoIter = Documents<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator returned by [`Journal::iter`].
#[derive(Debug, Clone)]
pub struct Documents<'a> {
    journal: &'a Journal,
    offset: usize,
}

impl Iterator for Documents<'_> {
    type Item = (usize, Result<Node, JournalError>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.journal.len() {
            return None;
        }
        let offset = self.offset;
        let (document, next, terminated) = self.journal.segment(offset);
        self.offset = next;
        // Whitespace after the last marker is not a document.
        if !terminated && document.iter().all(u8::is_ascii_whitespace) {
            return None;
        }
        Some((offset, self.journal.get(offset)))
    }
}
