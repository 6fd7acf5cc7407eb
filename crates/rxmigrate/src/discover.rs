//! Input discovery
//!
//! Explicit files are always taken; directories are walked for files with a
//! configured extension, skipping excluded directory names.

use std::collections::HashSet;
use std::path::PathBuf;

use walkdir::{DirEntry, WalkDir};

use crate::config::DriverConfig;
use crate::error::{DriverError, DriverResult};

/// Resolve CLI inputs to a de-duplicated list of files
///
/// # Errors
/// Returns [`DriverError::MissingInput`] for a path that is neither a file
/// nor a directory.
pub fn collect_inputs(inputs: &[PathBuf], config: &DriverConfig) -> DriverResult<Vec<PathBuf>> {
    let mut out: Vec<PathBuf> = Vec::new();
    let mut seen: HashSet<PathBuf> = HashSet::new();

    for input in inputs {
        if input.is_file() {
            if seen.insert(input.clone()) {
                out.push(input.clone());
            }
            continue;
        }
        if input.is_dir() {
            let mut files: Vec<PathBuf> = WalkDir::new(input)
                .follow_links(false)
                .into_iter()
                .filter_entry(|entry| should_walk(entry, config))
                .flatten()
                .filter(|entry| entry.file_type().is_file())
                .map(DirEntry::into_path)
                .filter(|path| config.accepts(path))
                .collect();
            files.sort();
            tracing::debug!("{} candidate file(s) under {}", files.len(), input.display());
            for file in files {
                if seen.insert(file.clone()) {
                    out.push(file);
                }
            }
            continue;
        }

        return Err(DriverError::MissingInput(input.clone()));
    }

    Ok(out)
}

fn should_walk(entry: &DirEntry, config: &DriverConfig) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return true;
    }
    entry
        .file_name()
        .to_str()
        .map_or(true, |name| !config.excludes_dir(name))
}
