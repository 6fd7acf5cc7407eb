//! Run report

use std::path::PathBuf;
use std::time::Duration;

use rxmigrate_core::TransformStats;
use serde::Serialize;

/// What happened to one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    /// Rewritten (and written back unless dry run)
    Ok(TransformStats),
    /// Nothing to change
    Unmodified,
    /// Read, parse, or write failure
    Failed(String),
}

/// Outcome for one file
#[derive(Debug, Clone)]
pub struct FileResult {
    /// File path
    pub path: PathBuf,
    /// Status
    pub status: FileStatus,
    /// Rewritten source, kept only when printing
    pub output: Option<String>,
}

/// A file that could not be transformed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    /// File path
    pub path: PathBuf,
    /// Error message
    pub message: String,
}

/// Aggregate results of a run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    /// Files processed
    pub files: usize,
    /// Files rewritten
    pub ok: usize,
    /// Files left as they were
    pub unmodified: usize,
    /// Files that failed
    pub errors: Vec<FileFailure>,
    /// Terminal calls replaced across all files
    pub sites_rewritten: usize,
    /// Terminal calls left as written across all files
    pub sites_skipped: usize,
    /// Whether files were written back
    pub dry_run: bool,
    /// Wall time in milliseconds
    pub elapsed_ms: u128,
    /// Rewritten sources in input order, when printing
    #[serde(skip)]
    pub printed: Vec<(PathBuf, String)>,
}

impl RunReport {
    /// Fold per-file results into a report
    #[must_use]
    pub fn from_results(results: Vec<FileResult>, dry_run: bool, elapsed: Duration) -> Self {
        let mut report = RunReport {
            files: results.len(),
            dry_run,
            elapsed_ms: elapsed.as_millis(),
            ..RunReport::default()
        };
        for result in results {
            match result.status {
                FileStatus::Ok(stats) => {
                    report.ok += 1;
                    report.sites_rewritten += stats.sites_rewritten;
                    report.sites_skipped += stats.sites_skipped;
                }
                FileStatus::Unmodified => report.unmodified += 1,
                FileStatus::Failed(message) => report.errors.push(FileFailure {
                    path: result.path.clone(),
                    message,
                }),
            }
            if let Some(output) = result.output {
                report.printed.push((result.path, output));
            }
        }
        report
    }

    /// Whether every file was processed without error
    #[inline]
    #[must_use]
    pub fn passed(&self) -> bool {
        self.errors.is_empty()
    }

    /// Human-readable summary
    #[must_use]
    pub fn generate_text(&self) -> String {
        let mut text = String::new();
        for failure in &self.errors {
            text.push_str(&format!(" ERR {} {}\n", failure.path.display(), failure.message));
        }
        text.push_str("Results:\n");
        text.push_str(&format!("{} errors\n", self.errors.len()));
        text.push_str(&format!("{} unmodified\n", self.unmodified));
        text.push_str(&format!("{} ok\n", self.ok));
        text.push_str(&format!(
            "{} call(s) rewritten, {} left as written\n",
            self.sites_rewritten, self.sites_skipped
        ));
        if self.dry_run {
            text.push_str("Dry run: no files were written\n");
        }
        text.push_str(&format!("Time elapsed: {}ms\n", self.elapsed_ms));
        text
    }

    /// JSON summary
    ///
    /// # Errors
    /// Returns error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
