//! # CLI Errors
//!
//! Everything a command can fail with. `main` logs the error and exits
//! with status 1.

use ogdl_core::{CodecError, JournalError, ParseError, PathError};
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    /// Reading or writing a named file failed.
    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Writing to standard output failed.
    #[error("output error: {0}")]
    Output(#[from] io::Error),

    #[error("{path}: file size {size} bytes exceeds maximum allowed {limit} bytes")]
    FileTooLarge { path: String, size: u64, limit: u64 },

    #[error("invalid config {path}: {source}")]
    Config {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("{path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: ParseError,
    },

    #[error("{path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: CodecError,
    },

    #[error("{path}: {source}")]
    Journal {
        path: String,
        #[source]
        source: JournalError,
    },

    #[error("invalid path: {0}")]
    Path(#[from] PathError),

    /// The path is valid but matches nothing.
    #[error("path not found: {0}")]
    NotFound(String),
}

impl CliError {
    pub fn io(path: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
