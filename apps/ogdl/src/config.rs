//! # Configuration Loading
//!
//! Reads [`Config`] from a TOML file. Missing keys keep their defaults;
//! unknown keys are rejected.

use crate::error::CliError;
use ogdl_core::Config;
use std::path::Path;

/// Load configuration from `path`, or defaults when no file is given.
pub fn load(path: Option<&Path>) -> Result<Config, CliError> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let label = path.display().to_string();
    let text = std::fs::read_to_string(path).map_err(|e| CliError::io(&label, e))?;
    let config = parse(&text).map_err(|source| CliError::Config {
        path: label.clone(),
        source,
    })?;
    tracing::debug!(path = %label, "loaded configuration");
    Ok(config)
}

/// Parse configuration text.
pub fn parse(text: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_tables_keep_defaults() {
        let config = parse("[printer]\nindent = 4\n\n[codec]\nmax_depth = 32\n").expect("parse");
        assert_eq!(config.printer.indent, 4);
        assert!(config.printer.compact_scalars);
        assert_eq!(config.codec.max_depth, 32);
        assert_eq!(config.parser, Config::default().parser);
    }

    #[test]
    fn empty_text_is_default() {
        assert_eq!(parse("").expect("parse"), Config::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(parse("[parser]\nmax_dept = 3\n").is_err());
        assert!(parse("[server]\nport = 1\n").is_err());
    }

    #[test]
    fn no_file_means_defaults() {
        assert_eq!(load(None).expect("load"), Config::default());
    }
}
