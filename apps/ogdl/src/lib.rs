//! # ogdl
//!
//! Library half of the `ogdl` binary: CLI definitions, command
//! implementations, configuration loading and the tracing bridge.
//! Split out of `main.rs` so integration tests can drive commands directly.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;

pub use error::CliError;
