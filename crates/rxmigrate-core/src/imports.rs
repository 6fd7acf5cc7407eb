//! Import reconciler
//!
//! Runs once per file over the re-parsed, fully rewritten source:
//! 1. make every required symbol importable from `rxjs`
//! 2. drop `take`/`first` from `rxjs/operators` once nothing calls them
//!
//! Pruning looks at every call left in the file, including ones no rewrite
//! touched, so it cannot be interleaved with rewriting.

use tree_sitter::Node;

use crate::rewrite::RequiredImports;
use crate::syntax::{walk_preorder, EditSet, SourceFile};
use crate::vocab;

/// One `import ... from "<module>"` declaration
#[derive(Debug, Clone)]
pub struct ImportDecl<'t> {
    /// The `import_statement`
    pub node: Node<'t>,
    /// Module specifier without quotes
    pub module: String,
    /// `import type { ... }`
    pub type_only: bool,
    /// Default or namespace binding next to the named clause
    pub other_binding: Option<Node<'t>>,
    /// The `{ ... }` clause
    pub named: Option<Node<'t>>,
    /// Named bindings, in order
    pub specifiers: Vec<ImportBinding<'t>>,
}

impl ImportDecl<'_> {
    /// Whether `name` is imported by this declaration
    #[must_use]
    pub fn imports(&self, name: &str) -> bool {
        self.specifiers.iter().any(|s| s.imported == name)
    }
}

/// A named import specifier
#[derive(Debug, Clone)]
pub struct ImportBinding<'t> {
    /// The `import_specifier`
    pub node: Node<'t>,
    /// Exported name being imported
    pub imported: String,
    /// Local name (differs from `imported` when aliased)
    pub local: String,
}

/// Top-level import declarations in document order
#[must_use]
pub fn collect_imports(file: &SourceFile) -> Vec<ImportDecl<'_>> {
    let root = file.root();
    let mut cursor = root.walk();
    let decls = root
        .named_children(&mut cursor)
        .filter(|node| node.kind() == "import_statement")
        .filter_map(|node| parse_import(file, node))
        .collect();
    decls
}

fn parse_import<'t>(file: &SourceFile, node: Node<'t>) -> Option<ImportDecl<'t>> {
    let source = node.child_by_field_name("source")?;
    let module = unquote(file.text(source)).to_string();

    let mut type_only = false;
    let mut clause = None;
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "type" if !child.is_named() => type_only = true,
            "import_clause" => clause = Some(child),
            _ => {}
        }
    }

    let mut other_binding = None;
    let mut named = None;
    if let Some(clause) = clause {
        let mut cursor = clause.walk();
        for child in clause.named_children(&mut cursor) {
            match child.kind() {
                "named_imports" => named = Some(child),
                "identifier" | "namespace_import" => other_binding = Some(child),
                _ => {}
            }
        }
    }

    let specifiers = named
        .map(|named| {
            let mut cursor = named.walk();
            let specs = named
                .named_children(&mut cursor)
                .filter(|n| n.kind() == "import_specifier")
                .filter_map(|n| parse_specifier(file, n))
                .collect();
            specs
        })
        .unwrap_or_default();

    Some(ImportDecl {
        node,
        module,
        type_only,
        other_binding,
        named,
        specifiers,
    })
}

fn parse_specifier<'t>(file: &SourceFile, node: Node<'t>) -> Option<ImportBinding<'t>> {
    let name = node.child_by_field_name("name")?;
    let imported = unquote(file.text(name)).to_string();
    let local = node
        .child_by_field_name("alias")
        .map_or_else(|| imported.clone(), |alias| file.text(alias).to_string());
    Some(ImportBinding {
        node,
        imported,
        local,
    })
}

fn unquote(literal: &str) -> &str {
    let quoted = literal.len() >= 2
        && (literal.starts_with('"') || literal.starts_with('\''))
        && literal.ends_with(&literal[..1]);
    if quoted {
        &literal[1..literal.len() - 1]
    } else {
        literal
    }
}

/// Number of `name(...)` calls in the file (callee is the bare identifier)
#[must_use]
pub fn count_calls(file: &SourceFile, name: &str) -> usize {
    let mut count = 0;
    walk_preorder(file.root(), |node| {
        if node.kind() != "call_expression" {
            return;
        }
        let calls_name = node
            .child_by_field_name("function")
            .is_some_and(|f| f.kind() == "identifier" && file.text(f) == name);
        if calls_name {
            count += 1;
        }
    });
    count
}

/// Counters from the reconcile pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportStats {
    /// Specifiers added to `rxjs` imports
    pub added: usize,
    /// Specifiers removed from `rxjs/operators` imports
    pub pruned: usize,
    /// Whole declarations removed
    pub declarations_removed: usize,
}

/// Edits that make the import set match the rewritten file
#[derive(Debug, Clone, Default)]
pub struct Reconciled {
    /// Edits against the rewritten source
    pub edits: EditSet,
    /// Counters
    pub stats: ImportStats,
}

/// Compute the import edits for `file`
#[must_use]
pub fn reconcile(file: &SourceFile, required: &RequiredImports) -> Reconciled {
    let imports = collect_imports(file);
    let mut out = Reconciled::default();
    add_required(file, &imports, required, &mut out);
    prune_operators(file, &imports, &mut out);
    out
}

fn add_required(
    file: &SourceFile,
    imports: &[ImportDecl<'_>],
    required: &RequiredImports,
    out: &mut Reconciled,
) {
    let primary: Vec<&ImportDecl<'_>> = imports.iter().filter(|d| d.module == vocab::RXJS).collect();
    let missing: Vec<&str> = required
        .iter()
        .filter(|name| !primary.iter().any(|d| d.imports(name)))
        .collect();
    if missing.is_empty() {
        return;
    }
    out.stats.added += missing.len();

    let target = primary
        .iter()
        .find_map(|d| d.named.filter(|_| !d.type_only).map(|named| (*d, named)));

    if let Some((decl, named)) = target {
        tracing::debug!("adding {:?} to existing rxjs import", missing);
        match decl.specifiers.last() {
            Some(last) => {
                let appended: String = missing.iter().map(|name| format!(", {name}")).collect();
                out.edits.insert(last.node.end_byte(), appended);
            }
            None => out
                .edits
                .replace(named.byte_range(), format!("{{ {} }}", missing.join(", "))),
        }
        return;
    }

    let style = ImportStyle::of(file, imports);
    let statement = format!(
        "import {{ {} }} from {q}{module}{q}{semi}{newline}",
        missing.join(", "),
        q = style.quote,
        module = vocab::RXJS,
        semi = if style.semicolon { ";" } else { "" },
        newline = style.newline,
    );
    let anchor = imports
        .iter()
        .find(|d| d.module == vocab::RXJS_OPERATORS)
        .map(|d| d.node.start_byte())
        .or_else(|| first_statement_start(file))
        .unwrap_or(0);
    tracing::debug!(anchor, "inserting new rxjs import for {:?}", missing);
    out.edits.insert(anchor, statement);
}

fn prune_operators(file: &SourceFile, imports: &[ImportDecl<'_>], out: &mut Reconciled) {
    let unused: Vec<&str> = vocab::LIMITING_OPERATORS
        .into_iter()
        .filter(|op| count_calls(file, op) == 0)
        .collect();
    if unused.is_empty() {
        return;
    }

    for decl in imports.iter().filter(|d| d.module == vocab::RXJS_OPERATORS) {
        let Some(named) = decl.named else {
            continue;
        };
        let (removed, kept): (Vec<&ImportBinding<'_>>, Vec<&ImportBinding<'_>>) = decl
            .specifiers
            .iter()
            .partition(|s| unused.contains(&s.imported.as_str()));
        if removed.is_empty() {
            continue;
        }
        out.stats.pruned += removed.len();
        tracing::debug!(
            "pruning {:?} from rxjs/operators import",
            removed.iter().map(|s| s.imported.as_str()).collect::<Vec<_>>()
        );

        if !kept.is_empty() {
            cut_specifiers(&decl.specifiers, &unused, out);
        } else if let Some(binding) = decl.other_binding {
            // `import ops, { take } from ...` keeps the default binding
            out.edits.delete(binding.end_byte()..named.end_byte());
        } else {
            out.edits.delete(decl.node.start_byte()..line_end(file.source(), decl.node.end_byte()));
            out.stats.declarations_removed += 1;
        }
    }
}

/// Delete each unused specifier with one neighbouring comma
///
/// Specifiers before the first kept one take the separator after them,
/// the rest take the separator before them, so the clause keeps its own
/// layout (multi-line lists, trailing commas).
fn cut_specifiers(specifiers: &[ImportBinding<'_>], unused: &[&str], out: &mut Reconciled) {
    let is_unused = |s: &ImportBinding<'_>| unused.contains(&s.imported.as_str());
    let Some(first_kept) = specifiers.iter().position(|s| !is_unused(s)) else {
        return;
    };
    for (index, spec) in specifiers.iter().enumerate() {
        if !is_unused(spec) {
            continue;
        }
        let range = if index < first_kept {
            spec.node.start_byte()..specifiers[index + 1].node.start_byte()
        } else {
            specifiers[index - 1].node.end_byte()..spec.node.end_byte()
        };
        out.edits.delete(range);
    }
}

/// `at` extended past one directly following line break
fn line_end(source: &str, at: usize) -> usize {
    let rest = &source[at..];
    if rest.starts_with("\r\n") {
        at + 2
    } else if rest.starts_with('\n') {
        at + 1
    } else {
        at
    }
}

fn first_statement_start(file: &SourceFile) -> Option<usize> {
    let root = file.root();
    let mut cursor = root.walk();
    let start = root
        .named_children(&mut cursor)
        .find(|n| !matches!(n.kind(), "comment" | "hash_bang_line"))
        .map(|n| n.start_byte());
    start
}

/// Quote, semicolon and line-break conventions for synthesized imports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ImportStyle {
    quote: char,
    semicolon: bool,
    newline: &'static str,
}

impl ImportStyle {
    /// Follow the file's first import; default to `"` with `;`
    fn of(file: &SourceFile, imports: &[ImportDecl<'_>]) -> Self {
        let newline = newline_of(file.source());
        let Some(first) = imports.first() else {
            return Self {
                quote: '"',
                semicolon: true,
                newline,
            };
        };
        let quote = first
            .node
            .child_by_field_name("source")
            .and_then(|s| file.text(s).chars().next())
            .filter(|c| *c == '\'' || *c == '"')
            .unwrap_or('"');
        let semicolon = file.text(first.node).trim_end().ends_with(';');
        Self {
            quote,
            semicolon,
            newline,
        }
    }
}

/// Line break used by the file's first line; `\n` when there is none
fn newline_of(source: &str) -> &'static str {
    match source.find('\n') {
        Some(at) if source[..at].ends_with('\r') => "\r\n",
        _ => "\n",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{FileInfo, SyntaxParser};

    fn parse(source: &str) -> SourceFile {
        SyntaxParser::new()
            .parse(source.to_string(), &FileInfo::inline())
            .unwrap()
    }

    fn reconciled(source: &str, required: &[&'static str]) -> (String, ImportStats) {
        let file = parse(source);
        let mut set = RequiredImports::new();
        for name in required {
            set.insert(name);
        }
        let r = reconcile(&file, &set);
        (r.edits.apply(file.source()), r.stats)
    }

    #[test]
    fn collects_specifiers_and_aliases() {
        let file = parse("import { take as once, map } from 'rxjs/operators';\n");
        let imports = collect_imports(&file);
        assert_eq!(imports.len(), 1);
        let decl = &imports[0];
        assert_eq!(decl.module, "rxjs/operators");
        assert!(!decl.type_only);
        assert_eq!(decl.specifiers[0].imported, "take");
        assert_eq!(decl.specifiers[0].local, "once");
        assert!(decl.imports("map"));
    }

    #[test]
    fn detects_type_only_imports() {
        let file = parse("import type { Observable } from \"rxjs\";\n");
        assert!(collect_imports(&file)[0].type_only);
    }

    #[test]
    fn counts_only_bare_calls() {
        let file = parse("take(1); x.take(2); const t = take;\n");
        assert_eq!(count_calls(&file, "take"), 1);
        assert_eq!(count_calls(&file, "first"), 0);
    }

    #[test]
    fn appends_to_existing_rxjs_import() {
        let (out, stats) = reconciled(
            "import { Observable } from \"rxjs\";\nlastValueFrom(a);\n",
            &["lastValueFrom"],
        );
        assert_eq!(
            out,
            "import { Observable, lastValueFrom } from \"rxjs\";\nlastValueFrom(a);\n"
        );
        assert_eq!(stats.added, 1);
    }

    #[test]
    fn never_duplicates_a_present_symbol() {
        let source = "import { firstValueFrom } from \"rxjs\";\nfirstValueFrom(a);\n";
        let (out, stats) = reconciled(source, &["firstValueFrom"]);
        assert_eq!(out, source);
        assert_eq!(stats.added, 0);
    }

    #[test]
    fn type_only_import_satisfies_but_is_not_extended() {
        let (out, _) = reconciled(
            "import type { Observable } from 'rxjs';\nx;\n",
            &["Observable", "lastValueFrom"],
        );
        assert_eq!(
            out,
            "import { lastValueFrom } from 'rxjs';\nimport type { Observable } from 'rxjs';\nx;\n"
        );
    }

    #[test]
    fn new_import_goes_before_operators_import() {
        let (out, _) = reconciled(
            "import { foo } from \"bar\";\nimport { map } from \"rxjs/operators\";\nmap(f);\n",
            &["firstValueFrom"],
        );
        assert_eq!(
            out,
            "import { foo } from \"bar\";\nimport { firstValueFrom } from \"rxjs\";\nimport { map } from \"rxjs/operators\";\nmap(f);\n"
        );
    }

    #[test]
    fn new_import_follows_leading_comment_and_quote_style() {
        let (out, _) = reconciled(
            "// header\nimport { foo } from './foo'\nfoo();\n",
            &["lastValueFrom"],
        );
        assert_eq!(
            out,
            "// header\nimport { lastValueFrom } from 'rxjs'\nimport { foo } from './foo'\nfoo();\n"
        );
    }

    #[test]
    fn prunes_unused_limiting_operator() {
        let (out, stats) = reconciled(
            "import { take, map } from \"rxjs/operators\";\nmap(f);\n",
            &[],
        );
        assert_eq!(out, "import { map } from \"rxjs/operators\";\nmap(f);\n");
        assert_eq!(stats.pruned, 1);
        assert_eq!(stats.declarations_removed, 0);
    }

    #[test]
    fn removes_emptied_declaration_with_its_line() {
        let (out, stats) = reconciled(
            "import { first, take } from \"rxjs/operators\";\nconst a = 1;\n",
            &[],
        );
        assert_eq!(out, "const a = 1;\n");
        assert_eq!(stats.pruned, 2);
        assert_eq!(stats.declarations_removed, 1);
    }

    #[test]
    fn keeps_operator_still_called_elsewhere() {
        let source = "import { take, tap } from \"rxjs/operators\";\nconst u$ = u.pipe(tap(log), take(1));\n";
        let (out, stats) = reconciled(source, &[]);
        assert_eq!(out, source);
        assert_eq!(stats.pruned, 0);
    }

    #[test]
    fn keeps_default_binding_when_named_clause_empties() {
        let (out, _) = reconciled("import ops, { take } from \"rxjs/operators\";\nops;\n", &[]);
        assert_eq!(out, "import ops from \"rxjs/operators\";\nops;\n");
    }

    #[test]
    fn ignores_other_modules() {
        let source = "import { take } from \"./local\";\nconst a = 1;\n";
        let (out, _) = reconciled(source, &[]);
        assert_eq!(out, source);
    }

    #[test]
    fn new_import_follows_crlf_line_breaks() {
        let (out, _) = reconciled("import { foo } from \"bar\";\r\nfoo();\r\n", &["lastValueFrom"]);
        assert_eq!(
            out,
            "import { lastValueFrom } from \"rxjs\";\r\nimport { foo } from \"bar\";\r\nfoo();\r\n"
        );
    }

    #[test]
    fn multi_line_clause_keeps_its_layout() {
        let (out, stats) = reconciled(
            "import {\n  take,\n  map,\n  first,\n} from \"rxjs/operators\";\nmap(f);\n",
            &[],
        );
        assert_eq!(out, "import {\n  map,\n} from \"rxjs/operators\";\nmap(f);\n");
        assert_eq!(stats.pruned, 2);
    }

    #[test]
    fn adjacent_unused_specifiers_are_cut_together() {
        let (out, _) = reconciled(
            "import { tap, first, take, map } from \"rxjs/operators\";\ntap(f); map(g);\n",
            &[],
        );
        assert_eq!(out, "import { tap, map } from \"rxjs/operators\";\ntap(f); map(g);\n");
    }

    #[test]
    fn newline_detection() {
        assert_eq!(newline_of("a;\r\nb;\n"), "\r\n");
        assert_eq!(newline_of("a;\nb;\r\n"), "\n");
        assert_eq!(newline_of("a;"), "\n");
    }

    #[test]
    fn unquote_strips_matching_quotes() {
        assert_eq!(unquote("\"rxjs\""), "rxjs");
        assert_eq!(unquote("'rxjs/operators'"), "rxjs/operators");
        assert_eq!(unquote("take"), "take");
    }
}
