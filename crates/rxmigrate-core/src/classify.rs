//! Shape classifier
//!
//! One function, [`classify`], decides what a site's receiver looks like.
//! Everything downstream branches on the returned [`Shape`].

use std::fmt;
use std::ops::Range;

use tree_sitter::Node;

use crate::locate::CallSite;
use crate::syntax::{code_children, is_optional_chain, misbound_prefix_operand, SourceFile};
use crate::vocab;

/// Receiver shape of a call site
#[derive(Debug, Clone)]
pub enum Shape<'t> {
    /// `<source>.pipe(op1, op2, ...)`
    Pipeline(Pipeline<'t>),
    /// Any other receiver expression, taken verbatim
    ArbitraryChain(Node<'t>),
    /// Not something the rewriter touches
    Unrecognized(Unrecognized),
}

/// Why a site was left alone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unrecognized {
    /// `x?.toPromise()` or `x.toPromise?.()`
    OptionalChain,
    /// `` x.toPromise`...` ``
    TaggedTemplate,
    /// `super.toPromise()`
    SuperReceiver,
    /// Receiver or argument node absent
    MissingNode,
}

impl fmt::Display for Unrecognized {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Unrecognized::OptionalChain => "optional chaining",
            Unrecognized::TaggedTemplate => "tagged template call",
            Unrecognized::SuperReceiver => "super receiver",
            Unrecognized::MissingNode => "missing receiver or arguments",
        };
        f.write_str(reason)
    }
}

/// Which limiting operator matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    /// `take(1)`
    TakeOne,
    /// `first(...)`
    First,
}

/// The operator a rewrite removes from a pipeline
#[derive(Debug, Clone, Copy)]
pub struct LimitingOperator<'t> {
    /// Position in the operator list
    pub index: usize,
    /// The operator call
    pub node: Node<'t>,
    /// Matched operator
    pub kind: LimitKind,
}

/// A `pipe` call receiver
#[derive(Debug, Clone)]
pub struct Pipeline<'t> {
    /// The whole `<source>.pipe(...)` call
    ///
    /// May start with an `await`/`!` the grammar folded in; see
    /// [`crate::locate::CallSite::start`].
    pub call: Node<'t>,
    /// The stream being piped
    pub source: Node<'t>,
    /// Operator arguments, in order
    pub operators: Vec<Node<'t>>,
    /// First limiting operator in argument order
    pub limiting: Option<LimitingOperator<'t>>,
}

/// What removing the limiting operator does to a pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reduction {
    /// No limiting operator; keep the pipeline as is
    Unchanged,
    /// The limiting operator was the only one; use the bare source
    Collapse,
    /// Drop these bytes (the operator plus one separating comma)
    Cut(Range<usize>),
}

impl Pipeline<'_> {
    /// How to drop the limiting operator while keeping the rest verbatim
    ///
    /// The separator before the operator is taken when there is one, so
    /// `a, take(1)` becomes `a` and `take(1), b` becomes `b`.
    #[must_use]
    pub fn reduction(&self) -> Reduction {
        let Some(limit) = self.limiting else {
            return Reduction::Unchanged;
        };
        if self.operators.len() == 1 {
            return Reduction::Collapse;
        }
        let removed = limit.node.byte_range();
        if limit.index > 0 {
            let previous = self.operators[limit.index - 1];
            Reduction::Cut(previous.end_byte()..removed.end)
        } else {
            let next = self.operators[1];
            Reduction::Cut(removed.start..next.start_byte())
        }
    }
}

/// Classify the receiver of `site`
#[must_use]
pub fn classify<'t>(file: &SourceFile, site: &CallSite<'t>) -> Shape<'t> {
    if is_optional_chain(site.callee) || is_optional_chain(site.call) {
        return Shape::Unrecognized(Unrecognized::OptionalChain);
    }
    match site.arguments() {
        Some(arguments) if arguments.kind() == "arguments" => {}
        Some(_) => return Shape::Unrecognized(Unrecognized::TaggedTemplate),
        None => return Shape::Unrecognized(Unrecognized::MissingNode),
    }
    let Some(receiver) = site.receiver() else {
        return Shape::Unrecognized(Unrecognized::MissingNode);
    };
    if receiver.kind() == "super" {
        return Shape::Unrecognized(Unrecognized::SuperReceiver);
    }

    match as_pipeline(file, receiver) {
        Some(pipeline) => Shape::Pipeline(pipeline),
        None => Shape::ArbitraryChain(receiver),
    }
}

fn as_pipeline<'t>(file: &SourceFile, receiver: Node<'t>) -> Option<Pipeline<'t>> {
    if receiver.kind() != "call_expression" || is_optional_chain(receiver) {
        return None;
    }
    let callee = match misbound_prefix_operand(receiver) {
        Some(operand) => operand,
        None => receiver.child_by_field_name("function")?,
    };
    if callee.kind() != "member_expression" || is_optional_chain(callee) {
        return None;
    }
    let property = callee.child_by_field_name("property")?;
    if file.text(property) != vocab::PIPE {
        return None;
    }
    let source = callee.child_by_field_name("object")?;
    let arguments = receiver.child_by_field_name("arguments")?;
    if arguments.kind() != "arguments" {
        return None;
    }

    let operators = code_children(arguments);
    let limiting = operators.iter().enumerate().find_map(|(index, &node)| {
        limit_kind(file, node).map(|kind| LimitingOperator { index, node, kind })
    });

    Some(Pipeline {
        call: receiver,
        source,
        operators,
        limiting,
    })
}

/// Match `take(1)` or `first(...)`
fn limit_kind(file: &SourceFile, operator: Node<'_>) -> Option<LimitKind> {
    if operator.kind() != "call_expression" {
        return None;
    }
    let function = operator.child_by_field_name("function")?;
    if function.kind() != "identifier" {
        return None;
    }
    let arguments = operator.child_by_field_name("arguments")?;
    if arguments.kind() != "arguments" {
        return None;
    }

    match file.text(function) {
        vocab::FIRST => Some(LimitKind::First),
        vocab::TAKE => {
            let args = code_children(arguments);
            match args.as_slice() {
                [count] if count.kind() == "number" => {
                    (numeric_value(file.text(*count)) == Some(1.0)).then_some(LimitKind::TakeOne)
                }
                _ => None,
            }
        }
        _ => None,
    }
}

/// Value of a JavaScript numeric literal; `None` for BigInt or garbage
#[must_use]
pub fn numeric_value(literal: &str) -> Option<f64> {
    if literal.ends_with('n') {
        return None;
    }
    let digits: String = literal.chars().filter(|c| *c != '_').collect();
    let lower = digits.to_ascii_lowercase();

    let radix = |prefix: &str, radix: u32| {
        lower
            .strip_prefix(prefix)
            .map(|rest| u64::from_str_radix(rest, radix).ok().map(|v| v as f64))
    };
    if let Some(value) = radix("0x", 16) {
        return value;
    }
    if let Some(value) = radix("0o", 8) {
        return value;
    }
    if let Some(value) = radix("0b", 2) {
        return value;
    }
    lower.parse::<f64>().ok()
}
