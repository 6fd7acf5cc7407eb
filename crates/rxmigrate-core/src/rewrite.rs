//! Rewriter
//!
//! Each site is first turned into an immutable [`Plan`]: a template of
//! literal text and ranges of the original source. A single render pass
//! then substitutes every plan, splicing plans nested inside a range into
//! that range as it is copied. The symbols the output needs are collected
//! while rendering and returned with the text.

use std::fmt;
use std::ops::Range;

use indexmap::IndexSet;

use crate::classify::{classify, Reduction, Shape, Unrecognized};
use crate::locate::{locate_sites, CallSite, TerminalKind};
use crate::syntax::SourceFile;
use crate::vocab;

/// Promise helper a site is rewritten to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Helper {
    /// `firstValueFrom`
    FirstValue,
    /// `lastValueFrom`
    LastValue,
}

impl Helper {
    /// Importable name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Helper::FirstValue => vocab::FIRST_VALUE_FROM,
            Helper::LastValue => vocab::LAST_VALUE_FROM,
        }
    }
}

impl fmt::Display for Helper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Symbols the rewritten file must import from `rxjs`, in first-use order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequiredImports {
    names: IndexSet<&'static str>,
}

impl RequiredImports {
    /// Create empty set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a symbol; returns false if already recorded
    pub fn insert(&mut self, name: &'static str) -> bool {
        self.names.insert(name)
    }

    /// Check membership
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Iterate in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.names.iter().copied()
    }

    /// Number of symbols
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Check if empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<'a> IntoIterator for &'a RequiredImports {
    type Item = &'static str;
    type IntoIter = std::iter::Copied<indexmap::set::Iter<'a, &'static str>>;

    fn into_iter(self) -> Self::IntoIter {
        self.names.iter().copied()
    }
}

/// Why a located site produced no plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skip {
    /// Receiver shape not understood
    Unrecognized(Unrecognized),
    /// `subscribe` without a limiting operator keeps its runtime behavior
    UnlimitedSubscription,
}

impl fmt::Display for Skip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Skip::Unrecognized(reason) => write!(f, "unrecognized shape ({reason})"),
            Skip::UnlimitedSubscription => f.write_str("subscription without take(1)/first()"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Text(String),
    Source(Range<usize>),
}

/// Replacement for one terminal call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    range: Range<usize>,
    helper: Helper,
    asserts_type: bool,
    pieces: Vec<Piece>,
}

impl Plan {
    /// Chosen helper
    #[inline]
    #[must_use]
    pub fn helper(&self) -> Helper {
        self.helper
    }

}

/// Build the replacement for `site`
///
/// # Errors
/// Returns the [`Skip`] reason when the site must stay as written.
pub fn plan_site(file: &SourceFile, site: &CallSite<'_>) -> Result<Plan, Skip> {
    let shape = classify(file, site);

    let (helper, argument, limited) = match &shape {
        Shape::Unrecognized(reason) => return Err(Skip::Unrecognized(*reason)),
        Shape::ArbitraryChain(receiver) => (
            Helper::LastValue,
            vec![Piece::Source(receiver.byte_range())],
            false,
        ),
        Shape::Pipeline(pipeline) => {
            let call = pipeline.call.byte_range();
            match pipeline.reduction() {
                Reduction::Unchanged => (Helper::LastValue, vec![Piece::Source(call)], false),
                Reduction::Collapse => (
                    Helper::FirstValue,
                    vec![Piece::Source(pipeline.source.byte_range())],
                    true,
                ),
                Reduction::Cut(cut) => (
                    Helper::FirstValue,
                    vec![
                        Piece::Source(call.start..cut.start),
                        Piece::Source(cut.end..call.end),
                    ],
                    true,
                ),
            }
        }
    };

    // A folded-in prefix sits at the start of the leftmost range; keep it
    // outside the helper call
    let mut pieces = vec![Piece::Text(format!("{}(", helper.name()))];
    pieces.extend(argument.into_iter().map(|piece| match piece {
        Piece::Source(range) => Piece::Source(range.start.max(site.start)..range.end),
        text => text,
    }));

    let mut asserts_type = false;
    match site.kind {
        TerminalKind::DeferredResult => {
            if let Some(type_arguments) = site.type_arguments() {
                asserts_type = true;
                pieces.push(Piece::Text(format!(
                    " as {}{}",
                    vocab::OBSERVABLE,
                    file.text(type_arguments)
                )));
            }
            pieces.push(Piece::Text(")".to_string()));
        }
        TerminalKind::Subscription => {
            if !limited {
                return Err(Skip::UnlimitedSubscription);
            }
            let Some(arguments) = site.arguments() else {
                return Err(Skip::Unrecognized(Unrecognized::MissingNode));
            };
            pieces.push(Piece::Text(format!(").{}", vocab::THEN)));
            pieces.push(Piece::Source(arguments.byte_range()));
        }
    }

    Ok(Plan {
        range: site.range(),
        helper,
        asserts_type,
        pieces,
    })
}

/// Counters from the rewrite pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteStats {
    /// Terminal calls located
    pub sites_found: usize,
    /// Sites substituted in the output
    pub sites_rewritten: usize,
    /// Sites left as written
    pub sites_skipped: usize,
}

/// Output of the rewrite pass
#[derive(Debug, Clone)]
pub struct Rewritten {
    /// Source with every plan substituted
    pub source: String,
    /// Symbols the reconciler must make importable
    pub required: RequiredImports,
    /// Counters
    pub stats: RewriteStats,
}

/// Rewrite every recognized site in `file`
#[must_use]
pub fn rewrite(file: &SourceFile) -> Rewritten {
    let sites = locate_sites(file);
    let mut plans = Vec::with_capacity(sites.len());
    let mut skipped = 0;

    for site in &sites {
        let line = site.call.start_position().row + 1;
        match plan_site(file, site) {
            Ok(plan) => {
                tracing::debug!(line, kind = %site.kind, helper = %plan.helper(), "planned rewrite");
                plans.push(plan);
            }
            Err(skip) => {
                tracing::debug!(line, kind = %site.kind, "skipping site: {}", skip);
                skipped += 1;
            }
        }
    }

    // Outer plans first when two start at the same offset
    plans.sort_by_key(|p| (p.range.start, std::cmp::Reverse(p.range.end)));

    let source = file.source();
    let mut renderer = Renderer {
        source,
        plans: &plans,
        required: RequiredImports::new(),
        rendered: 0,
    };
    let mut out = String::with_capacity(source.len());
    renderer.render_range(0..source.len(), &mut out);

    let stats = RewriteStats {
        sites_found: sites.len(),
        sites_rewritten: renderer.rendered,
        sites_skipped: skipped,
    };
    if renderer.rendered < plans.len() {
        tracing::debug!(
            "{} nested rewrite(s) discarded with their enclosing operator",
            plans.len() - renderer.rendered
        );
    }

    Rewritten {
        source: out,
        required: renderer.required,
        stats,
    }
}

struct Renderer<'a> {
    source: &'a str,
    plans: &'a [Plan],
    required: RequiredImports,
    rendered: usize,
}

impl Renderer<'_> {
    /// Copy `range` of the source, substituting the outermost plans inside it
    fn render_range(&mut self, range: Range<usize>, out: &mut String) {
        let plans = self.plans;
        let mut cursor = range.start;
        for plan in plans {
            if plan.range.start < cursor || plan.range.end > range.end {
                continue;
            }
            out.push_str(&self.source[cursor..plan.range.start]);
            self.render_plan(plan, out);
            cursor = plan.range.end;
        }
        out.push_str(&self.source[cursor..range.end]);
    }

    fn render_plan(&mut self, plan: &Plan, out: &mut String) {
        if plan.asserts_type {
            self.required.insert(vocab::OBSERVABLE);
        }
        self.required.insert(plan.helper.name());
        self.rendered += 1;

        for piece in &plan.pieces {
            match piece {
                Piece::Text(text) => out.push_str(text),
                Piece::Source(range) => self.render_range(range.clone(), out),
            }
        }
    }
}
