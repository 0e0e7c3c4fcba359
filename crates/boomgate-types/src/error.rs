//! Error types for configuration loading.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while discovering, reading or validating configuration.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// Path that was being read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid JSON or does not match the schema.
    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),

    /// The config parsed but is semantically invalid.
    #[error("invalid config: {reason}")]
    Invalid {
        /// What is wrong with the configuration.
        reason: String,
    },
}

/// A convenience type alias for config operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_invalid() {
        let err = ConfigError::Invalid {
            reason: "stream.channel_capacity must be > 0".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid config: stream.channel_capacity must be > 0"
        );
    }

    #[test]
    fn display_io_includes_path() {
        let err = ConfigError::Io {
            path: PathBuf::from("/etc/boomgate.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/etc/boomgate.json"));
        assert!(msg.contains("gone"));
    }

    #[test]
    fn json_error_from_conversion() {
        let serde_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: ConfigError = serde_err.into();
        assert!(err.to_string().starts_with("failed to parse config:"));
    }
}
