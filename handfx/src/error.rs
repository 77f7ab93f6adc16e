//! Error types.
//!
//! The per-frame path never fails: missing hands, short landmark arrays and
//! degenerate geometry all collapse to safe defaults.  The only fallible
//! surface is loading and validating an [`EffectConfig`](crate::EffectConfig).

use std::path::PathBuf;

/// Errors raised while loading or validating an effect configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("cannot read config file {path}: {source}")]
    Io {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML or does not match the config schema.
    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value parsed fine but is outside the range the engine accepts.
    #[error("config field `{field}` is out of range: {reason}")]
    OutOfRange {
        field:  &'static str,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;
