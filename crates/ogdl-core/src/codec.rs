//! # Binary Codec
//!
//! Compact, length-prefixed binary form of a [`Node`] tree.
//!
//! ## Layout
//!
//! One record per node, in depth-first pre-order:
//!
//! ```text
//! tag:u8 | name_len:u32 | name | value_len:u32 | value | child_count:u32 | children…
//! ```
//!
//! All integers are big-endian. `TAG_NODE` records have no children,
//! `TAG_GROUP` records have at least one. The root is an ordinary record;
//! there is no header.
//!
//! ## Robustness
//!
//! Decoding validates every field against the remaining input before
//! allocating, walks records with an explicit stack, and rejects bytes left
//! over after the root. Malformed input always produces a [`CodecError`],
//! never a panic.

use crate::config::CodecLimits;
use crate::diagnostics::{DiagnosticSink, Level, NullSink};
use crate::graph::Node;
use crate::primitives::{FIELD_WIDTH, MIN_RECORD_SIZE, TAG_GROUP, TAG_NODE};
use crate::types::CodecError;

// =============================================================================
// ENCODING
// =============================================================================

/// Encode a tree.
#[must_use]
pub fn encode_binary(root: &Node) -> Vec<u8> {
    encode_binary_with(root, &NullSink)
}

/// Encode a tree, reporting diagnostics to `sink`.
///
/// Strings and child lists longer than `u32::MAX` cannot be represented;
/// they are cut to that size and a warning is logged.
pub fn encode_binary_with(root: &Node, sink: &dyn DiagnosticSink) -> Vec<u8> {
    let mut out = Vec::new();
    let mut stack = vec![root];
    let mut records = 0usize;

    while let Some(node) = stack.pop() {
        records += 1;
        let children = node.children();
        let count = clamp_len(children.len(), "child list", sink);
        out.push(if count == 0 { TAG_NODE } else { TAG_GROUP });
        write_str(&mut out, node.name(), sink);
        write_str(&mut out, node.value(), sink);
        out.extend_from_slice(&count.to_be_bytes());
        stack.extend(children[..count as usize].iter().rev());
    }

    if sink.enabled(Level::Trace) {
        sink.log(
            Level::Trace,
            &format!("encoded {} records into {} bytes", records, out.len()),
            None,
        );
    }
    out
}

fn write_str(out: &mut Vec<u8>, s: &str, sink: &dyn DiagnosticSink) {
    let len = clamp_len(s.len(), "string", sink);
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(&s.as_bytes()[..len as usize]);
}

fn clamp_len(len: usize, what: &str, sink: &dyn DiagnosticSink) -> u32 {
    u32::try_from(len).unwrap_or_else(|_| {
        sink.log(
            Level::Warning,
            &format!("{} of length {} cut to {}", what, len, u32::MAX),
            None,
        );
        u32::MAX
    })
}

// =============================================================================
// DECODING
// =============================================================================

/// Decode a tree with default limits.
pub fn decode_binary(bytes: &[u8]) -> Result<Node, CodecError> {
    decode_binary_with(bytes, &CodecLimits::default(), &NullSink)
}

/// Decode a tree, reporting diagnostics to `sink`.
pub fn decode_binary_with(
    bytes: &[u8],
    limits: &CodecLimits,
    sink: &dyn DiagnosticSink,
) -> Result<Node, CodecError> {
    let result = decode(bytes, limits);
    match &result {
        Ok(root) => {
            if sink.enabled(Level::Trace) {
                sink.log(
                    Level::Trace,
                    &format!("decoded {} nodes from {} bytes", root.count(), bytes.len()),
                    None,
                );
            }
        }
        Err(e) => sink.log(Level::Error, &e.to_string(), None),
    }
    result
}

/// A group record still waiting for `remaining` children.
struct Frame {
    node: Node,
    remaining: u32,
}

fn decode(bytes: &[u8], limits: &CodecLimits) -> Result<Node, CodecError> {
    let mut reader = Reader::new(bytes);
    let mut stack: Vec<Frame> = Vec::new();

    loop {
        let (node, count) = reader.record()?;
        if count > 0 {
            if stack.len() >= limits.max_depth {
                return Err(CodecError::TooDeep {
                    offset: reader.offset,
                    limit: limits.max_depth,
                });
            }
            stack.push(Frame {
                node,
                remaining: count,
            });
            continue;
        }

        // Attach the finished node, closing every group it completes.
        let mut done = node;
        loop {
            let Some(frame) = stack.last_mut() else {
                return reader.finish(done);
            };
            frame.node.push(done);
            frame.remaining -= 1;
            if frame.remaining > 0 {
                break;
            }
            let Some(complete) = stack.pop() else {
                break;
            };
            done = complete.node;
        }
    }
}

/// Cursor over the input bytes.
struct Reader<'b> {
    bytes: &'b [u8],
    offset: usize,
}

impl<'b> Reader<'b> {
    fn new(bytes: &'b [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }

    fn take(&mut self, n: usize) -> Result<&'b [u8], CodecError> {
        let remaining = self.remaining();
        if n > remaining {
            return Err(CodecError::Truncated {
                offset: self.offset,
                needed: n - remaining,
            });
        }
        let slice = &self.bytes[self.offset..self.offset + n];
        self.offset += n;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.take(1)?[0])
    }

    fn u32(&mut self) -> Result<u32, CodecError> {
        let mut field = [0u8; FIELD_WIDTH];
        field.copy_from_slice(self.take(FIELD_WIDTH)?);
        Ok(u32::from_be_bytes(field))
    }

    fn string(&mut self) -> Result<String, CodecError> {
        let at = self.offset;
        let declared = self.u32()?;
        let remaining = self.remaining();
        if declared as usize > remaining {
            return Err(CodecError::LengthOverflow {
                offset: at,
                declared,
                remaining,
            });
        }
        let start = self.offset;
        let raw = self.take(declared as usize)?;
        std::str::from_utf8(raw)
            .map(str::to_string)
            .map_err(|_| CodecError::InvalidUtf8 { offset: start })
    }

    /// Read one record header; returns the node and its declared child count.
    fn record(&mut self) -> Result<(Node, u32), CodecError> {
        let at = self.offset;
        let tag = self.u8()?;
        if tag != TAG_NODE && tag != TAG_GROUP {
            return Err(CodecError::UnknownTag { offset: at, tag });
        }
        let name = self.string()?;
        let value = self.string()?;

        let count_at = self.offset;
        let count = self.u32()?;
        if (tag == TAG_NODE) != (count == 0) {
            return Err(CodecError::TagMismatch {
                offset: at,
                tag,
                children: count,
            });
        }
        let remaining = self.remaining();
        if count as usize > remaining / MIN_RECORD_SIZE {
            return Err(CodecError::ChildCountOverflow {
                offset: count_at,
                declared: count,
                remaining,
            });
        }

        let mut node = Node::pair(name, value);
        node.children_mut().reserve_exact(count as usize);
        Ok((node, count))
    }

    fn finish(&self, root: Node) -> Result<Node, CodecError> {
        match self.remaining() {
            0 => Ok(root),
            remaining => Err(CodecError::TrailingBytes {
                offset: self.offset,
                remaining,
            }),
        }
    }
}

// =============================================================================
// FINGERPRINT
// =============================================================================

/// BLAKE3 digest of the binary encoding, as 64 hex characters.
///
/// Two trees have the same fingerprint exactly when they are structurally
/// equal.
#[cfg(feature = "crypto-hash")]
#[must_use]
pub fn fingerprint(root: &Node) -> String {
    blake3::hash(&encode_binary(root)).to_hex().to_string()
}

/// Check a tree against a fingerprint produced by [`fingerprint`].
#[cfg(feature = "crypto-hash")]
pub fn verify_fingerprint(root: &Node, expected: &str) -> bool {
    fingerprint(root).eq_ignore_ascii_case(expected)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::diagnostics::MemorySink;

    fn sample() -> Node {
        Node::named("root")
            .with_child(Node::named("a").with_child(Node::pair("x", "1")))
            .with_child(Node::scalar("ünïcode"))
            .with_child(Node::pair("", ""))
    }

    #[test]
    fn record_layout() {
        let bytes = encode_binary(&Node::pair("x", "1"));
        assert_eq!(
            bytes,
            vec![
                TAG_NODE, 0, 0, 0, 1, b'x', 0, 0, 0, 1, b'1', 0, 0, 0, 0
            ]
        );

        let bytes = encode_binary(&Node::new().with_child(Node::new()));
        assert_eq!(bytes.len(), 2 * MIN_RECORD_SIZE);
        assert_eq!(bytes[0], TAG_GROUP);
        assert_eq!(&bytes[9..13], &[0, 0, 0, 1]);
    }

    #[test]
    fn round_trip_preserves_structure() {
        let tree = sample();
        let decoded = decode_binary(&encode_binary(&tree)).expect("decode");
        assert_eq!(decoded, tree);
        assert_eq!(decoded.name(), "root");
    }

    #[test]
    fn single_zero_byte_is_truncated() {
        assert_eq!(
            decode_binary(&[0x00]),
            Err(CodecError::Truncated {
                offset: 1,
                needed: 4
            })
        );
    }

    #[test]
    fn empty_input_is_truncated() {
        assert_eq!(
            decode_binary(&[]),
            Err(CodecError::Truncated {
                offset: 0,
                needed: 1
            })
        );
    }

    #[test]
    fn every_strict_prefix_fails() {
        let bytes = encode_binary(&sample());
        for len in 0..bytes.len() {
            assert!(decode_binary(&bytes[..len]).is_err(), "prefix {len}");
        }
    }

    #[test]
    fn unknown_tag() {
        let mut bytes = encode_binary(&Node::named("a"));
        bytes[0] = 0x7f;
        assert_eq!(
            decode_binary(&bytes),
            Err(CodecError::UnknownTag {
                offset: 0,
                tag: 0x7f
            })
        );
    }

    #[test]
    fn tag_must_agree_with_child_count() {
        let mut leaf = encode_binary(&Node::named("a"));
        leaf[0] = TAG_GROUP;
        assert!(matches!(
            decode_binary(&leaf),
            Err(CodecError::TagMismatch { children: 0, .. })
        ));

        let mut group = encode_binary(&Node::new().with_child(Node::new()));
        group[0] = TAG_NODE;
        assert!(matches!(
            decode_binary(&group),
            Err(CodecError::TagMismatch { children: 1, .. })
        ));
    }

    #[test]
    fn length_prefix_past_end() {
        let bytes = [TAG_NODE, 0, 0, 0, 9, b'a'];
        assert_eq!(
            decode_binary(&bytes),
            Err(CodecError::LengthOverflow {
                offset: 1,
                declared: 9,
                remaining: 1
            })
        );
    }

    #[test]
    fn huge_child_count_is_rejected_before_allocation() {
        let mut bytes = vec![TAG_GROUP, 0, 0, 0, 0, 0, 0, 0, 0];
        bytes.extend_from_slice(&u32::MAX.to_be_bytes());
        bytes.extend_from_slice(&[0; 20]);
        assert_eq!(
            decode_binary(&bytes),
            Err(CodecError::ChildCountOverflow {
                offset: 9,
                declared: u32::MAX,
                remaining: 20
            })
        );
    }

    #[test]
    fn invalid_utf8_in_value() {
        let bytes = [TAG_NODE, 0, 0, 0, 0, 0, 0, 0, 1, 0xff, 0, 0, 0, 0];
        assert_eq!(
            decode_binary(&bytes),
            Err(CodecError::InvalidUtf8 { offset: 9 })
        );
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let mut bytes = encode_binary(&Node::named("a"));
        let end = bytes.len();
        bytes.push(0);
        assert_eq!(
            decode_binary(&bytes),
            Err(CodecError::TrailingBytes {
                offset: end,
                remaining: 1
            })
        );
    }

    fn chain(depth: usize) -> Node {
        let mut root = Node::new();
        let mut cursor = &mut root;
        for _ in 0..depth {
            cursor = cursor.push(Node::named("n"));
        }
        root
    }

    fn dismantle(mut root: Node) {
        let mut pending = root.take_children();
        while let Some(mut node) = pending.pop() {
            pending.extend(node.take_children());
        }
    }

    #[test]
    fn depth_limit() {
        let limits = CodecLimits { max_depth: 8 };
        let ok = encode_binary(&chain(8));
        assert!(decode_binary_with(&ok, &limits, &NullSink).is_ok());

        let deep = encode_binary(&chain(9));
        assert!(matches!(
            decode_binary_with(&deep, &limits, &NullSink),
            Err(CodecError::TooDeep { limit: 8, .. })
        ));
    }

    #[test]
    fn deep_trees_round_trip_iteratively() {
        let tree = chain(20_000);
        let bytes = encode_binary(&tree);
        let limits = CodecLimits { max_depth: 50_000 };
        let decoded = decode_binary_with(&bytes, &limits, &NullSink).expect("decode");
        assert_eq!(decoded.depth(), 20_000);
        dismantle(tree);
        dismantle(decoded);
    }

    #[test]
    fn diagnostics_reach_the_sink() {
        let sink = MemorySink::new();
        let bytes = encode_binary_with(&sample(), &sink);
        assert_eq!(sink.count(Level::Trace), 1);

        decode_binary_with(&bytes[..3], &CodecLimits::default(), &sink).expect_err("truncated");
        assert_eq!(sink.count(Level::Error), 1);
    }

    #[cfg(feature = "crypto-hash")]
    #[test]
    fn fingerprint_tracks_structure() {
        let tree = sample();
        let digest = fingerprint(&tree);
        assert_eq!(digest.len(), 64);
        assert!(verify_fingerprint(&tree, &digest));

        let mut changed = tree.clone();
        changed.set_value("different");
        assert!(!verify_fingerprint(&changed, &digest));
    }
}
