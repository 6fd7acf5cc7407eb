//! Site locator
//!
//! Finds every `<receiver>.toPromise(...)` and `<receiver>.subscribe(...)`
//! call in document order. Shape checks beyond the callee name belong to
//! [`crate::classify`].

use std::fmt;
use std::ops::Range;

use tree_sitter::Node;

use crate::syntax::{code_children, misbound_prefix_operand, walk_preorder, SourceFile};
use crate::vocab;

/// Which terminal call a site ends with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TerminalKind {
    /// `toPromise()`: converts to a deferred result
    DeferredResult,
    /// `subscribe(...)`: registers callbacks
    Subscription,
}

impl TerminalKind {
    /// Match a member name against the terminal vocabulary
    #[inline]
    #[must_use]
    pub fn from_member(name: &str) -> Option<Self> {
        match name {
            vocab::TO_PROMISE => Some(TerminalKind::DeferredResult),
            vocab::SUBSCRIBE => Some(TerminalKind::Subscription),
            _ => None,
        }
    }

    /// Member name
    #[inline]
    #[must_use]
    pub fn member_name(&self) -> &'static str {
        match self {
            TerminalKind::DeferredResult => vocab::TO_PROMISE,
            TerminalKind::Subscription => vocab::SUBSCRIBE,
        }
    }
}

impl fmt::Display for TerminalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.member_name())
    }
}

/// A candidate terminal call
#[derive(Debug, Clone, Copy)]
pub struct CallSite<'t> {
    /// The whole terminal `call_expression`
    pub call: Node<'t>,
    /// The `member_expression` callee
    pub callee: Node<'t>,
    /// Terminal kind
    pub kind: TerminalKind,
    /// First byte of the call proper
    ///
    /// Past any `await`/`!` prefix the grammar folded into the call chain;
    /// that prefix stays outside the replacement.
    pub start: usize,
}

impl<'t> CallSite<'t> {
    /// Bytes the replacement covers
    #[inline]
    #[must_use]
    pub fn range(&self) -> Range<usize> {
        self.start..self.call.end_byte()
    }

    /// Expression the terminal call is invoked on
    #[inline]
    #[must_use]
    pub fn receiver(&self) -> Option<Node<'t>> {
        self.callee.child_by_field_name("object")
    }

    /// Captured `<...>` on the terminal call
    #[inline]
    #[must_use]
    pub fn type_arguments(&self) -> Option<Node<'t>> {
        self.call.child_by_field_name("type_arguments")
    }

    /// Argument list of the terminal call (parenthesized or template)
    #[inline]
    #[must_use]
    pub fn arguments(&self) -> Option<Node<'t>> {
        self.call.child_by_field_name("arguments")
    }
}

/// Every candidate site in `file`, in document order
#[must_use]
pub fn locate_sites(file: &SourceFile) -> Vec<CallSite<'_>> {
    let mut sites = Vec::new();
    walk_preorder(file.root(), |node| {
        if let Some(site) = as_call_site(file, node) {
            sites.push(site);
        }
    });
    sites
}

fn as_call_site<'t>(file: &SourceFile, node: Node<'t>) -> Option<CallSite<'t>> {
    if node.kind() != "call_expression" {
        return None;
    }
    let callee = match misbound_prefix_operand(node) {
        Some(operand) => operand,
        None => node.child_by_field_name("function")?,
    };
    if callee.kind() != "member_expression" {
        return None;
    }
    let property = callee.child_by_field_name("property")?;
    if property.kind() != "property_identifier" {
        return None;
    }
    let kind = TerminalKind::from_member(file.text(property))?;
    Some(CallSite {
        call: node,
        callee,
        kind,
        start: chain_start(node),
    })
}

/// Start of `call` once a prefix folded into its leftmost chain is excluded
///
/// `await a.f<T>().pipe(...).toPromise()` parses with `await` bound to
/// `a.f`, deep inside the chain; the real expression starts at `a`.
fn chain_start(call: Node<'_>) -> usize {
    let mut node = call;
    loop {
        if let Some(operand) = misbound_prefix_operand(node) {
            return operand.start_byte();
        }
        let next = match node.kind() {
            "call_expression" => node.child_by_field_name("function"),
            "member_expression" | "subscript_expression" => node.child_by_field_name("object"),
            "non_null_expression" => code_children(node).into_iter().next(),
            _ => None,
        };
        match next {
            Some(child) if child.start_byte() == node.start_byte() => node = child,
            _ => return call.start_byte(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{FileInfo, SyntaxParser};

    fn sites_of(source: &str) -> Vec<(TerminalKind, String)> {
        let file = SyntaxParser::new()
            .parse(source.to_string(), &FileInfo::inline())
            .unwrap();
        locate_sites(&file)
            .into_iter()
            .map(|s| (s.kind, file.text(s.call).to_string()))
            .collect()
    }

    #[test]
    fn finds_nothing_without_terminal_calls() {
        assert!(sites_of("const user = getUser().pipe(map(f));").is_empty());
    }

    #[test]
    fn finds_both_kinds_in_document_order() {
        let sites = sites_of("a.subscribe(cb);\nconst p = b.toPromise();\n");
        assert_eq!(
            sites,
            vec![
                (TerminalKind::Subscription, "a.subscribe(cb)".to_string()),
                (TerminalKind::DeferredResult, "b.toPromise()".to_string()),
            ]
        );
    }

    #[test]
    fn outer_site_precedes_nested_site() {
        let sites = sites_of("x.pipe(switchMap(() => y.toPromise())).toPromise();");
        assert_eq!(sites.len(), 2);
        assert!(sites[0].1.starts_with("x.pipe"));
        assert_eq!(sites[1].1, "y.toPromise()");
    }

    #[test]
    fn ignores_bare_function_calls_and_computed_members() {
        assert!(sites_of("toPromise(x); x['toPromise']();").is_empty());
    }

    #[test]
    fn exposes_receiver_and_type_arguments() {
        let source = "const r = svc.load().toPromise<Foo>();";
        let file = SyntaxParser::new()
            .parse(source.to_string(), &FileInfo::inline())
            .unwrap();
        let sites = locate_sites(&file);
        let site = sites[0];
        assert_eq!(file.text(site.receiver().unwrap()), "svc.load()");
        assert_eq!(file.text(site.type_arguments().unwrap()), "<Foo>");
        assert_eq!(file.text(site.arguments().unwrap()), "()");
    }

    #[test]
    fn awaited_generic_call_is_located_past_the_prefix() {
        let source = "async function f() { const u = await http.get(u).pipe(take(1)).toPromise<User>(); }";
        let file = SyntaxParser::new()
            .parse(source.to_string(), &FileInfo::inline())
            .unwrap();
        let sites = locate_sites(&file);
        assert_eq!(sites.len(), 1);
        let site = sites[0];
        assert_eq!(site.kind, TerminalKind::DeferredResult);
        assert_eq!(&source[site.range()], "http.get(u).pipe(take(1)).toPromise<User>()");
        assert_eq!(file.text(site.receiver().unwrap()), "http.get(u).pipe(take(1))");
        assert_eq!(file.text(site.type_arguments().unwrap()), "<User>");
    }

    #[test]
    fn prefix_folded_deeper_in_the_chain_is_excluded() {
        let source = "async function f() { return await x.pipe<User>(take(1)).toPromise(); }";
        let file = SyntaxParser::new()
            .parse(source.to_string(), &FileInfo::inline())
            .unwrap();
        let sites = locate_sites(&file);
        assert_eq!(sites.len(), 1);
        assert_eq!(&source[sites[0].range()], "x.pipe<User>(take(1)).toPromise()");
    }

    #[test]
    fn plain_site_range_is_the_call() {
        let source = "const p = b.toPromise();";
        let file = SyntaxParser::new()
            .parse(source.to_string(), &FileInfo::inline())
            .unwrap();
        let site = locate_sites(&file)[0];
        assert_eq!(site.range(), site.call.byte_range());
    }

    #[test]
    fn terminal_kind_vocabulary() {
        assert_eq!(
            TerminalKind::from_member("toPromise"),
            Some(TerminalKind::DeferredResult)
        );
        assert_eq!(
            TerminalKind::from_member("subscribe"),
            Some(TerminalKind::Subscription)
        );
        assert_eq!(TerminalKind::from_member("pipe"), None);
        assert_eq!(TerminalKind::Subscription.to_string(), "subscribe");
    }
}
