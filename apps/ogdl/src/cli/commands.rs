//! # CLI Command Implementations
//!
//! Each `cmd_*` function reads its input, calls into ogdl-core and writes a
//! human-readable or JSON result to `out`.

use super::Context;
use crate::error::CliError;
use crate::logging::TracingSink;
use ogdl_core::{
    Journal, Node, Path as NodePath, PrintOptions, decode_binary_with, encode_binary_with,
    fingerprint, parse_text_with, print_text, to_dot, to_text,
};
use std::io::{Read, Write};
use std::path::Path;

// =============================================================================
// INPUT LIMITS
// =============================================================================

/// Maximum size of any input file (100 MB).
const MAX_INPUT_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Label used for standard input in messages.
const STDIN_LABEL: &str = "<stdin>";

/// Read a file, or standard input when `file` is `None` or `-`.
fn read_input(file: Option<&Path>) -> Result<(String, Vec<u8>), CliError> {
    match file {
        Some(path) if path != Path::new("-") => {
            let label = path.display().to_string();
            validate_file_size(path, &label)?;
            let bytes = std::fs::read(path).map_err(|e| CliError::io(&label, e))?;
            Ok((label, bytes))
        }
        _ => {
            let mut bytes = Vec::new();
            std::io::stdin()
                .lock()
                .take(MAX_INPUT_FILE_SIZE)
                .read_to_end(&mut bytes)
                .map_err(|e| CliError::io(STDIN_LABEL, e))?;
            Ok((STDIN_LABEL.to_string(), bytes))
        }
    }
}

/// Validate file size before reading.
fn validate_file_size(path: &Path, label: &str) -> Result<(), CliError> {
    let metadata = std::fs::metadata(path).map_err(|e| CliError::io(label, e))?;
    if metadata.len() > MAX_INPUT_FILE_SIZE {
        return Err(CliError::FileTooLarge {
            path: label.to_string(),
            size: metadata.len(),
            limit: MAX_INPUT_FILE_SIZE,
        });
    }
    Ok(())
}

/// Read and parse an OGDL document.
fn parse_input(ctx: &Context, file: Option<&Path>) -> Result<Node, CliError> {
    let (label, bytes) = read_input(file)?;
    let root = parse_text_with(&bytes, &ctx.config.parser, &TracingSink)
        .map_err(|source| CliError::Parse {
            path: label.clone(),
            source,
        })?;
    tracing::debug!(input = %label, nodes = root.count(), "parsed document");
    Ok(root)
}

fn write_file(path: &Path, data: &[u8]) -> Result<(), CliError> {
    std::fs::write(path, data).map_err(|e| CliError::io(path.display().to_string(), e))
}

fn print_json(out: &mut dyn Write, value: &serde_json::Value) -> Result<(), CliError> {
    writeln!(
        out,
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_default()
    )?;
    Ok(())
}

// =============================================================================
// PATH COMMAND
// =============================================================================

/// Resolve `path` and print what it points at.
///
/// A leaf prints its value (or its name when the value is empty). A node
/// with children prints its children, or itself with `root`.
pub fn cmd_path(
    out: &mut dyn Write,
    ctx: &Context,
    path: &str,
    file: Option<&Path>,
    root: bool,
    depth: Option<usize>,
    indent: Option<usize>,
) -> Result<(), CliError> {
    let document = parse_input(ctx, file)?;
    let node = if path == "." {
        Some(&document)
    } else {
        NodePath::parse(path)?.resolve(&document)
    };
    let node = node.ok_or_else(|| CliError::NotFound(path.to_string()))?;

    if ctx.json_mode {
        return print_json(out, &serde_json::to_value(node).unwrap_or_default());
    }

    let options = PrintOptions {
        indent: indent.unwrap_or(ctx.config.printer.indent),
        max_depth: depth.or(ctx.config.printer.max_depth),
        ..ctx.config.printer
    };
    if root {
        out.write_all(print_text(node, &options).as_bytes())?;
    } else if node.is_leaf() {
        let text = if node.value().is_empty() {
            node.name()
        } else {
            node.value()
        };
        writeln!(out, "{}", text)?;
    } else {
        let contents = Node::new().with_children(node.children().to_vec());
        out.write_all(print_text(&contents, &options).as_bytes())?;
    }
    Ok(())
}

// =============================================================================
// FMT COMMAND
// =============================================================================

/// Re-print a document in canonical form.
pub fn cmd_fmt(
    out: &mut dyn Write,
    ctx: &Context,
    file: Option<&Path>,
    indent: Option<usize>,
    expand: bool,
) -> Result<(), CliError> {
    let document = parse_input(ctx, file)?;
    let options = PrintOptions {
        indent: indent.unwrap_or(ctx.config.printer.indent),
        compact_scalars: ctx.config.printer.compact_scalars && !expand,
        ..ctx.config.printer
    };
    out.write_all(print_text(&document, &options).as_bytes())?;
    Ok(())
}

// =============================================================================
// ENCODE / DECODE COMMANDS
// =============================================================================

/// Convert a text document to the binary format.
pub fn cmd_encode(
    out: &mut dyn Write,
    ctx: &Context,
    input: &Path,
    output: &Path,
) -> Result<(), CliError> {
    let document = parse_input(ctx, Some(input))?;
    let bytes = encode_binary_with(&document, &TracingSink);
    write_file(output, &bytes)?;
    tracing::info!(output = %output.display(), bytes = bytes.len(), "encoded document");

    if ctx.json_mode {
        return print_json(
            out,
            &serde_json::json!({
                "output": output.to_string_lossy(),
                "nodes": document.count(),
                "bytes": bytes.len()
            }),
        );
    }
    writeln!(
        out,
        "Encoded {} nodes into {} bytes: {}",
        document.count(),
        bytes.len(),
        output.display()
    )?;
    Ok(())
}

/// Convert a binary file back to text.
pub fn cmd_decode(
    out: &mut dyn Write,
    ctx: &Context,
    input: &Path,
    output: Option<&Path>,
) -> Result<(), CliError> {
    let (label, bytes) = read_input(Some(input))?;
    let document = decode_binary_with(&bytes, &ctx.config.codec, &TracingSink)
        .map_err(|source| CliError::Decode {
            path: label,
            source,
        })?;
    let text = print_text(&document, &ctx.config.printer);

    match output {
        Some(path) => {
            write_file(path, text.as_bytes())?;
            writeln!(
                out,
                "Decoded {} nodes: {}",
                document.count(),
                path.display()
            )?;
        }
        None if ctx.json_mode => {
            print_json(out, &serde_json::to_value(&document).unwrap_or_default())?;
        }
        None => out.write_all(text.as_bytes())?,
    }
    Ok(())
}

// =============================================================================
// DOT COMMAND
// =============================================================================

pub fn cmd_dot(out: &mut dyn Write, ctx: &Context, file: Option<&Path>) -> Result<(), CliError> {
    let document = parse_input(ctx, file)?;
    out.write_all(to_dot(&document).as_bytes())?;
    Ok(())
}

// =============================================================================
// INDENT COMMAND
// =============================================================================

/// Prefix every line with `spaces` spaces and drop carriage returns.
pub fn cmd_indent(
    out: &mut dyn Write,
    spaces: usize,
    title: Option<&str>,
    file: Option<&Path>,
) -> Result<(), CliError> {
    let (_, bytes) = read_input(file)?;
    if let Some(title) = title {
        writeln!(out, "{}", title)?;
    }
    out.write_all(&indent_text(&bytes, spaces))?;
    Ok(())
}

/// Indent each line of `input` by `spaces`. Empty lines stay empty.
pub fn indent_text(input: &[u8], spaces: usize) -> Vec<u8> {
    let mut result = Vec::with_capacity(input.len() + input.len() / 8 * spaces);
    let mut line_start = true;
    for &b in input.iter().filter(|&&b| b != b'\r') {
        if line_start && b != b'\n' {
            result.extend(std::iter::repeat_n(b' ', spaces));
        }
        line_start = b == b'\n';
        result.push(b);
    }
    result
}

// =============================================================================
// CHECK COMMAND
// =============================================================================

/// Parse a document and report its size.
pub fn cmd_check(out: &mut dyn Write, ctx: &Context, file: Option<&Path>) -> Result<(), CliError> {
    let document = parse_input(ctx, file)?;
    // The root is a container, not a node of the document.
    let nodes = document.count() - 1;
    let depth = document.depth();
    let top_level = document.len();

    if ctx.json_mode {
        return print_json(
            out,
            &serde_json::json!({
                "valid": true,
                "nodes": nodes,
                "top_level": top_level,
                "depth": depth
            }),
        );
    }

    writeln!(out, "OGDL Document")?;
    writeln!(out, "=============")?;
    writeln!(out, "Nodes:     {}", nodes)?;
    writeln!(out, "Top level: {}", top_level)?;
    writeln!(out, "Depth:     {}", depth)?;
    Ok(())
}

// =============================================================================
// JOURNAL COMMAND
// =============================================================================

/// List the documents of a journal, print one, or append one.
pub fn cmd_journal(
    out: &mut dyn Write,
    ctx: &Context,
    file: &Path,
    add: Option<&Path>,
    offset: Option<usize>,
) -> Result<(), CliError> {
    let label = file.display().to_string();

    if let Some(document_file) = add {
        let document = parse_input(ctx, Some(document_file))?;
        let mut journal = if file.exists() {
            Journal::from_bytes(read_input(Some(file))?.1)
        } else {
            Journal::new()
        };
        let at = journal.add(&document);
        write_file(file, journal.as_bytes())?;
        tracing::info!(journal = %label, offset = at, "appended document");

        if ctx.json_mode {
            return print_json(out, &serde_json::json!({ "offset": at }));
        }
        writeln!(out, "Appended document at offset {}", at)?;
        return Ok(());
    }

    let journal = Journal::from_bytes(read_input(Some(file))?.1);

    if let Some(at) = offset {
        let document = journal
            .get_with(at, &ctx.config.parser, &TracingSink)
            .map_err(|source| CliError::Journal {
                path: label,
                source,
            })?;
        if ctx.json_mode {
            return print_json(out, &serde_json::to_value(&document).unwrap_or_default());
        }
        out.write_all(to_text(&document).as_bytes())?;
        return Ok(());
    }

    if ctx.json_mode {
        let entries: Vec<serde_json::Value> = journal
            .iter()
            .map(|(at, document)| match document {
                Ok(document) => serde_json::json!({
                    "offset": at,
                    "nodes": document.count() - 1
                }),
                Err(e) => serde_json::json!({ "offset": at, "error": e.to_string() }),
            })
            .collect();
        return print_json(out, &serde_json::Value::Array(entries));
    }

    for (at, document) in &journal {
        match document {
            Ok(document) => writeln!(out, "{:>8}  {} nodes", at, document.count() - 1)?,
            Err(e) => {
                tracing::warn!(journal = %label, offset = at, "unreadable document");
                writeln!(out, "{:>8}  error: {}", at, e)?;
            }
        }
    }
    Ok(())
}

// =============================================================================
// HASH COMMAND
// =============================================================================

/// Print the BLAKE3 fingerprint of a document's binary form.
pub fn cmd_hash(out: &mut dyn Write, ctx: &Context, file: Option<&Path>) -> Result<(), CliError> {
    let document = parse_input(ctx, file)?;
    let hash = fingerprint(&document);

    if ctx.json_mode {
        return print_json(
            out,
            &serde_json::json!({
                "algorithm": "BLAKE3",
                "hash": hash,
                "nodes": document.count() - 1
            }),
        );
    }
    writeln!(out, "{}", hash)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indent_prefixes_non_empty_lines() {
        assert_eq!(indent_text(b"a\r\n\nb", 2), b"  a\n\n  b".to_vec());
        assert_eq!(indent_text(b"", 4), Vec::<u8>::new());
        assert_eq!(indent_text(b"x\n", 0), b"x\n".to_vec());
    }
}
