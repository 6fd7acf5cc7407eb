//! Testing utilities for rxmigrate
//!
//! Inline fixture helpers: feed a source string through the engine and
//! compare the trimmed output with the expected text.

#![allow(missing_docs)]

use pretty_assertions::assert_eq;
use rxmigrate_core::{transform, FileInfo, TransformOutcome};

/// Transform `input` as an inline `.ts` file; unchanged input comes back as is
pub fn run_inline(input: &str) -> String {
    run_as(input, &FileInfo::inline())
}

pub fn run_as(input: &str, file: &FileInfo) -> String {
    match transform(input, file) {
        Ok(outcome) => outcome.into_source().unwrap_or_else(|| input.to_string()),
        Err(e) => panic!("transform failed: {e}\n--- input ---\n{input}"),
    }
}

/// Assert `input` rewrites to `expected` (both trimmed)
pub fn assert_transforms(input: &str, expected: &str) {
    let output = run_inline(input);
    assert_eq!(output.trim(), expected.trim());
}

/// Assert the engine reports no change for `input`
pub fn assert_unchanged(input: &str) {
    match transform(input, &FileInfo::inline()) {
        Ok(TransformOutcome::Unchanged) => {}
        Ok(TransformOutcome::Rewritten { source, .. }) => {
            assert_eq!(source, input, "expected no change");
        }
        Err(e) => panic!("transform failed: {e}\n--- input ---\n{input}"),
    }
}

/// Assert a second run over the output changes nothing
pub fn assert_idempotent(input: &str) {
    let once = run_inline(input);
    assert_unchanged(&once);
}
