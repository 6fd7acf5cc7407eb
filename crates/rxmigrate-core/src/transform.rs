//! Per-file transform: parse, rewrite, re-parse, reconcile imports

use crate::error::TransformResult;
use crate::imports::reconcile;
use crate::rewrite::{rewrite, Rewritten};
use crate::syntax::{FileInfo, SyntaxParser};

/// Counters for one transformed file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformStats {
    /// Terminal calls located
    pub sites_found: usize,
    /// Terminal calls replaced
    pub sites_rewritten: usize,
    /// Terminal calls left as written
    pub sites_skipped: usize,
    /// Specifiers added to `rxjs` imports
    pub imports_added: usize,
    /// Specifiers removed from `rxjs/operators` imports
    pub specifiers_pruned: usize,
    /// `rxjs/operators` declarations removed entirely
    pub declarations_removed: usize,
}

/// Result of transforming one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformOutcome {
    /// Nothing to do; apply no edit
    Unchanged,
    /// New source text
    Rewritten {
        /// Rewritten file contents
        source: String,
        /// Counters
        stats: TransformStats,
    },
}

impl TransformOutcome {
    /// Check for the unchanged signal
    #[inline]
    #[must_use]
    pub fn is_unchanged(&self) -> bool {
        matches!(self, TransformOutcome::Unchanged)
    }

    /// Rewritten source, if any
    #[inline]
    #[must_use]
    pub fn source(&self) -> Option<&str> {
        match self {
            TransformOutcome::Unchanged => None,
            TransformOutcome::Rewritten { source, .. } => Some(source),
        }
    }

    /// Take the rewritten source, if any
    #[inline]
    #[must_use]
    pub fn into_source(self) -> Option<String> {
        match self {
            TransformOutcome::Unchanged => None,
            TransformOutcome::Rewritten { source, .. } => Some(source),
        }
    }
}

/// Reusable transformer holding one parser
///
/// Not `Sync`; create one per thread when transforming files in parallel.
#[derive(Debug, Default)]
pub struct Transformer {
    parser: SyntaxParser,
}

impl Transformer {
    /// Create transformer
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Transform one file's source
    ///
    /// # Errors
    /// Returns an error when `source` does not parse, or (engine defect)
    /// when the rewritten text does not.
    pub fn transform(&mut self, source: &str, file: &FileInfo) -> TransformResult<TransformOutcome> {
        let parsed = self.parser.parse(source.to_string(), file)?;
        let Rewritten {
            source: rewritten,
            required,
            stats: rewrite_stats,
        } = rewrite(&parsed);

        // Reconcile against the final tree so call counts see every rewrite
        let final_file = if rewritten == source {
            parsed
        } else {
            self.parser.reparse(rewritten, file)?
        };
        let reconciled = reconcile(&final_file, &required);
        let output = reconciled.edits.apply(final_file.source());

        if output == source {
            tracing::debug!(path = %file.path().display(), "unchanged");
            return Ok(TransformOutcome::Unchanged);
        }

        let stats = TransformStats {
            sites_found: rewrite_stats.sites_found,
            sites_rewritten: rewrite_stats.sites_rewritten,
            sites_skipped: rewrite_stats.sites_skipped,
            imports_added: reconciled.stats.added,
            specifiers_pruned: reconciled.stats.pruned,
            declarations_removed: reconciled.stats.declarations_removed,
        };
        tracing::info!(
            path = %file.path().display(),
            rewritten = stats.sites_rewritten,
            skipped = stats.sites_skipped,
            "rewrote file"
        );
        Ok(TransformOutcome::Rewritten {
            source: output,
            stats,
        })
    }
}

/// Transform one file with a fresh parser
///
/// # Errors
/// See [`Transformer::transform`].
pub fn transform(source: &str, file: &FileInfo) -> TransformResult<TransformOutcome> {
    Transformer::new().transform(source, file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransformError;

    fn run(source: &str) -> TransformOutcome {
        transform(source, &FileInfo::inline()).unwrap()
    }

    #[test]
    fn no_sites_is_unchanged() {
        assert!(run("const user = getUser();\n").is_unchanged());
    }

    #[test]
    fn skipped_sites_only_is_unchanged() {
        assert!(run("ticks$.subscribe((t) => log(t));\n").is_unchanged());
    }

    #[test]
    fn pruning_alone_changes_the_file() {
        let outcome = run("import { take, map } from \"rxjs/operators\";\nmap(f);\n");
        assert_eq!(
            outcome.source(),
            Some("import { map } from \"rxjs/operators\";\nmap(f);\n")
        );
    }

    #[test]
    fn rewrite_and_reconcile_together() {
        let outcome = run(
            "import { take } from \"rxjs/operators\";\n\nconst user = getUser().pipe(take(1)).toPromise();\n",
        );
        let TransformOutcome::Rewritten { source, stats } = outcome else {
            panic!("expected rewrite");
        };
        assert_eq!(
            source,
            "import { firstValueFrom } from \"rxjs\";\n\nconst user = firstValueFrom(getUser());\n"
        );
        assert_eq!(stats.sites_rewritten, 1);
        assert_eq!(stats.imports_added, 1);
        assert_eq!(stats.specifiers_pruned, 1);
        assert_eq!(stats.declarations_removed, 1);
    }

    #[test]
    fn malformed_input_fails() {
        let err = transform("const = getUser(.toPromise();", &FileInfo::inline()).unwrap_err();
        assert!(matches!(err, TransformError::Syntax { .. }));
    }

    #[test]
    fn transformer_is_reusable_across_dialects() {
        let mut transformer = Transformer::new();
        let ts = transformer
            .transform("a.toPromise();\n", &FileInfo::new("a.ts"))
            .unwrap();
        let tsx = transformer
            .transform("const v = <b>{x}</b>;\nb.toPromise();\n", &FileInfo::new("b.tsx"))
            .unwrap();
        assert!(ts.source().unwrap().contains("lastValueFrom(a)"));
        assert!(tsx.source().unwrap().contains("lastValueFrom(b)"));
    }
}
