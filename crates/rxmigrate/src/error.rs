//! Error types for the batch driver
//!
//! Per-file transform failures are not errors here: they are counted in the
//! [`crate::report::RunReport`] and the run carries on.

use std::path::PathBuf;

/// Errors loading a configuration file
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading the file
    #[error("io error reading {path}: {source}")]
    Io {
        /// Config file path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Malformed TOML or unknown keys
    #[error("invalid config {path}: {source}")]
    Parse {
        /// Config file path
        path: PathBuf,
        /// TOML error
        #[source]
        source: toml::de::Error,
    },

    /// Values that parse but make no sense
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors that abort a whole run
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// Configuration problem
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Input path is neither a file nor a directory
    #[error("input does not exist or is not a file/dir: {0}")]
    MissingInput(PathBuf),

    /// Worker pool could not be created
    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Result type alias for driver operations
pub type DriverResult<T> = Result<T, DriverError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_input_display() {
        let err = DriverError::MissingInput(PathBuf::from("nope/"));
        assert_eq!(
            err.to_string(),
            "input does not exist or is not a file/dir: nope/"
        );
    }

    #[test]
    fn config_error_converts() {
        let err: DriverError = ConfigError::Invalid("jobs must be at least 1".to_string()).into();
        assert!(matches!(err, DriverError::Config(_)));
        assert!(err.to_string().contains("jobs must be at least 1"));
    }
}
