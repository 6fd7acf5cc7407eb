//! Driver configuration
//!
//! Loaded from TOML (all keys optional) and then overridden by CLI flags:
//!
//! ```toml
//! extensions = ["ts", "tsx"]
//! exclude_dirs = ["node_modules", "dist"]
//! dry_run = false
//! print = false
//! jobs = 4
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Batch driver configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DriverConfig {
    /// File extensions (without dot) picked up when walking directories
    pub extensions: Vec<String>,
    /// Directory names never descended into
    pub exclude_dirs: Vec<String>,
    /// Transform without writing files back
    pub dry_run: bool,
    /// Keep rewritten sources in the report for printing
    pub print: bool,
    /// Worker threads; `None` uses rayon's default
    pub jobs: Option<usize>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            extensions: ["ts", "tsx", "mts", "cts"].map(String::from).to_vec(),
            exclude_dirs: ["node_modules", "dist", ".git"].map(String::from).to_vec(),
            dry_run: false,
            print: false,
            jobs: None,
        }
    }
}

impl DriverConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    ///
    /// # Errors
    /// Returns error if the file cannot be read, parsed, or validated.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::io_error(path, e))?;
        let config: Self = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that deserialize but cannot be used
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] describing the first problem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jobs == Some(0) {
            return Err(ConfigError::Invalid("jobs must be at least 1".to_string()));
        }
        if self.extensions.is_empty() {
            return Err(ConfigError::Invalid("extensions must not be empty".to_string()));
        }
        Ok(())
    }

    /// With dry run
    #[inline]
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// With printing of rewritten sources
    #[inline]
    #[must_use]
    pub fn with_print(mut self, print: bool) -> Self {
        self.print = print;
        self
    }

    /// With worker thread count
    #[inline]
    #[must_use]
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = Some(jobs);
        self
    }

    /// With extensions to pick up
    #[must_use]
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|e| e.into().trim_start_matches('.').to_string())
            .collect();
        self
    }

    /// Whether a walked file should be transformed
    #[must_use]
    pub fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e == ext))
    }

    /// Whether a directory name is excluded from walking
    #[must_use]
    pub fn excludes_dir(&self, name: &str) -> bool {
        self.exclude_dirs.iter().any(|d| d == name)
    }
}
