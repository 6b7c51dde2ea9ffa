//! # OGDL CLI Module
//!
//! ## Available Commands
//!
//! - `path` - Resolve a path and print the matching subtree
//! - `fmt` - Re-print a document in canonical form
//! - `encode` - Convert text to the binary format
//! - `decode` - Convert the binary format to text
//! - `dot` - Render a document as a Graphviz graph
//! - `indent` - Indent every line of a text
//! - `check` - Parse and report node count and depth
//! - `journal` - List, read or append journal documents
//! - `hash` - Compute the BLAKE3 fingerprint of a document

mod commands;

use crate::config;
use crate::error::CliError;
use clap::{Parser, Subcommand};
use ogdl_core::Config;
use std::io::Write;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// OGDL tools
///
/// Query, format and convert OGDL (Ordered Graph Data Language) documents.
/// Commands that take an optional FILE read standard input without one.
#[derive(Parser, Debug)]
#[command(name = "ogdl")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable trace-level diagnostics
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// TOML file with [parser], [printer] and [codec] settings
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long = "json", global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve a path ("." for the whole document) and print the result
    Path {
        /// Path such as `a.b[1].c`
        path: String,

        /// Input file
        file: Option<PathBuf>,

        /// Print the matched node itself, not just its contents
        #[arg(short, long)]
        root: bool,

        /// Maximum number of levels to print
        #[arg(short, long)]
        depth: Option<usize>,

        /// Spaces per indentation level
        #[arg(short = 'n', long)]
        indent: Option<usize>,
    },

    /// Re-print a document in canonical form
    Fmt {
        /// Input file
        file: Option<PathBuf>,

        /// Spaces per indentation level
        #[arg(short = 'n', long)]
        indent: Option<usize>,

        /// Print every scalar on its own line
        #[arg(long)]
        expand: bool,
    },

    /// Convert OGDL text to the binary format
    Encode {
        /// Input text file
        input: PathBuf,

        /// Output binary file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Convert the binary format to OGDL text
    Decode {
        /// Input binary file
        input: PathBuf,

        /// Output text file (standard output if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Render a document as a Graphviz digraph
    Dot {
        /// Input file
        file: Option<PathBuf>,
    },

    /// Indent every line of a text by N spaces, dropping carriage returns
    Indent {
        /// Spaces to prepend
        #[arg(short = 'n', long, default_value = "2")]
        spaces: usize,

        /// Line printed, unindented, before the text
        #[arg(long)]
        title: Option<String>,

        /// Input file
        file: Option<PathBuf>,
    },

    /// Parse a document and report its size
    Check {
        /// Input file
        file: Option<PathBuf>,
    },

    /// List, read or append documents in a journal file
    Journal {
        /// Journal file
        file: PathBuf,

        /// Append the document in this OGDL file
        #[arg(long, conflicts_with = "offset")]
        add: Option<PathBuf>,

        /// Print the document stored at this byte offset
        #[arg(long)]
        offset: Option<usize>,
    },

    /// Compute the BLAKE3 fingerprint of a document
    Hash {
        /// Input file
        file: Option<PathBuf>,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Settings shared by every command.
#[derive(Debug, Clone, Copy, Default)]
pub struct Context {
    pub config: Config,
    pub json_mode: bool,
}

/// Execute the CLI, writing results to standard output.
pub fn execute(cli: Cli) -> Result<(), CliError> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run(cli, &mut out)
}

/// Execute the CLI, writing results to `out`.
pub fn run(cli: Cli, out: &mut dyn Write) -> Result<(), CliError> {
    let ctx = Context {
        config: config::load(cli.config.as_deref())?,
        json_mode: cli.json_mode,
    };

    match cli.command {
        Commands::Path {
            path,
            file,
            root,
            depth,
            indent,
        } => cmd_path(out, &ctx, &path, file.as_deref(), root, depth, indent),
        Commands::Fmt {
            file,
            indent,
            expand,
        } => cmd_fmt(out, &ctx, file.as_deref(), indent, expand),
        Commands::Encode { input, output } => cmd_encode(out, &ctx, &input, &output),
        Commands::Decode { input, output } => cmd_decode(out, &ctx, &input, output.as_deref()),
        Commands::Dot { file } => cmd_dot(out, &ctx, file.as_deref()),
        Commands::Indent {
            spaces,
            title,
            file,
        } => cmd_indent(out, spaces, title.as_deref(), file.as_deref()),
        Commands::Check { file } => cmd_check(out, &ctx, file.as_deref()),
        Commands::Journal { file, add, offset } => {
            cmd_journal(out, &ctx, &file, add.as_deref(), offset)
        }
        Commands::Hash { file } => cmd_hash(out, &ctx, file.as_deref()),
    }
}
