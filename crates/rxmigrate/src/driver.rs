//! Batch driver
//!
//! Files are independent, so they are transformed in parallel with one
//! [`Transformer`] (and so one tree-sitter parser) per worker thread.

use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use rxmigrate_core::{FileInfo, TransformOutcome, Transformer};

use crate::config::DriverConfig;
use crate::discover::collect_inputs;
use crate::error::DriverResult;
use crate::report::{FileResult, FileStatus, RunReport};

/// Transform every file reachable from `inputs`
///
/// # Errors
/// Returns error for unusable inputs or configuration. Per-file failures
/// are recorded in the report instead.
pub fn run(config: &DriverConfig, inputs: &[PathBuf]) -> DriverResult<RunReport> {
    config.validate()?;
    let files = collect_inputs(inputs, config)?;
    tracing::info!("processing {} file(s)", files.len());

    let started = Instant::now();
    let results = match config.jobs {
        Some(jobs) => rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build()?
            .install(|| process_all(&files, config)),
        None => process_all(&files, config),
    };

    let report = RunReport::from_results(results, config.dry_run, started.elapsed());
    tracing::info!(
        ok = report.ok,
        unmodified = report.unmodified,
        errors = report.errors.len(),
        "run finished"
    );
    Ok(report)
}

fn process_all(files: &[PathBuf], config: &DriverConfig) -> Vec<FileResult> {
    files
        .par_iter()
        .map_init(Transformer::new, |transformer, path| {
            process_file(transformer, path, config)
        })
        .collect()
}

/// Transform one file and write it back when it changed
pub fn process_file(transformer: &mut Transformer, path: &Path, config: &DriverConfig) -> FileResult {
    let failed = |message: String| {
        tracing::warn!(path = %path.display(), "{}", message);
        FileResult {
            path: path.to_path_buf(),
            status: FileStatus::Failed(message),
            output: None,
        }
    };

    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => return failed(format!("read failed: {e}")),
    };

    let (rewritten, stats) = match transformer.transform(&source, &FileInfo::new(path)) {
        Ok(TransformOutcome::Unchanged) => {
            return FileResult {
                path: path.to_path_buf(),
                status: FileStatus::Unmodified,
                output: None,
            }
        }
        Ok(TransformOutcome::Rewritten { source, stats }) => (source, stats),
        Err(e) if e.is_input_error() => return failed(e.to_string()),
        Err(e) => {
            tracing::error!(path = %path.display(), "engine failure, file left untouched: {}", e);
            return failed(format!("internal error: {e}"));
        }
    };

    if !config.dry_run {
        if let Err(e) = std::fs::write(path, &rewritten) {
            return failed(format!("write failed: {e}"));
        }
    }

    FileResult {
        path: path.to_path_buf(),
        status: FileStatus::Ok(stats),
        output: config.print.then_some(rewritten),
    }
}
