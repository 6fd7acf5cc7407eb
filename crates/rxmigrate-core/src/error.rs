//! Error types for the rewrite engine
//!
//! Only two things can go wrong in a transform:
//! - the input does not parse (fatal for that file)
//! - the rewritten output does not parse (an engine defect)
//!
//! Unrecognized call shapes are never errors; those sites are skipped.

use std::path::PathBuf;

/// Errors raised while transforming one file
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    /// The tree-sitter grammar could not be loaded
    #[error("parser initialisation failed: {0}")]
    ParserInit(String),

    /// The parser gave up without producing a tree
    #[error("parser produced no tree for {0}")]
    NoTree(PathBuf),

    /// Input contains a syntax error
    #[error("syntax error in {path} at {line}:{column}")]
    Syntax {
        /// File being transformed
        path: PathBuf,
        /// 1-based line of the first error node
        line: usize,
        /// 1-based column of the first error node
        column: usize,
    },

    /// Rewritten source no longer parses
    #[error("rewrite of {path} produced invalid syntax at {line}:{column}")]
    InvalidOutput {
        /// File being transformed
        path: PathBuf,
        /// 1-based line of the first error node
        line: usize,
        /// 1-based column of the first error node
        column: usize,
    },
}

impl TransformError {
    /// Create syntax error for path, with a 0-based tree-sitter position
    pub fn syntax(path: impl Into<PathBuf>, point: tree_sitter::Point) -> Self {
        Self::Syntax {
            path: path.into(),
            line: point.row + 1,
            column: point.column + 1,
        }
    }

    /// Create invalid-output error for path
    pub fn invalid_output(path: impl Into<PathBuf>, point: tree_sitter::Point) -> Self {
        Self::InvalidOutput {
            path: path.into(),
            line: point.row + 1,
            column: point.column + 1,
        }
    }

    /// Whether the failure lies in the input rather than the engine
    #[inline]
    #[must_use]
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::Syntax { .. } | Self::NoTree(_))
    }
}

/// Result type alias for engine operations
pub type TransformResult<T> = Result<T, TransformError>;
