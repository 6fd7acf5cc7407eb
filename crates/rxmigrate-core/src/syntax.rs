//! Syntax tree provider
//!
//! Parses TypeScript with tree-sitter and turns a set of byte-range edits
//! back into text. Edits only touch the bytes they cover, so every region
//! the engine does not replace keeps its exact formatting.

use std::fmt;
use std::ops::Range;
use std::path::{Path, PathBuf};

use tree_sitter::{Node, Parser, Tree};

use crate::error::{TransformError, TransformResult};

/// Grammar used to parse a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dialect {
    /// Plain TypeScript (`.ts`, `.mts`, `.cts`, and anything unknown)
    #[default]
    TypeScript,
    /// TypeScript with JSX (`.tsx`)
    Tsx,
}

impl Dialect {
    /// Pick the grammar for a path
    #[inline]
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("tsx" | "jsx") => Dialect::Tsx,
            _ => Dialect::TypeScript,
        }
    }

    /// Get tree-sitter language
    #[inline]
    #[must_use]
    pub fn tree_sitter_language(&self) -> tree_sitter::Language {
        match self {
            Dialect::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Dialect::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dialect::TypeScript => "TypeScript",
            Dialect::Tsx => "TSX",
        };
        write!(f, "{name}")
    }
}

/// Metadata about the file being transformed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    path: PathBuf,
    dialect: Dialect,
}

impl FileInfo {
    /// Describe a file on disk; the dialect follows the extension
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let dialect = Dialect::from_path(&path);
        Self { path, dialect }
    }

    /// Source that does not come from a file
    #[must_use]
    pub fn inline() -> Self {
        Self::new("<inline>.ts")
    }

    /// File path
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Grammar for this file
    #[inline]
    #[must_use]
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }
}

/// Reusable tree-sitter parser
///
/// `tree_sitter::Parser` is not `Sync`; keep one per thread.
pub struct SyntaxParser {
    parser: Parser,
    dialect: Option<Dialect>,
}

impl fmt::Debug for SyntaxParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyntaxParser")
            .field("dialect", &self.dialect)
            .finish_non_exhaustive()
    }
}

impl Default for SyntaxParser {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntaxParser {
    /// Create parser; the grammar is loaded on first use
    #[must_use]
    pub fn new() -> Self {
        Self {
            parser: Parser::new(),
            dialect: None,
        }
    }

    /// Parse `source` for `file`
    ///
    /// # Errors
    /// Returns [`TransformError::Syntax`] at the first error or missing node.
    pub fn parse(&mut self, source: String, file: &FileInfo) -> TransformResult<SourceFile> {
        let tree = self.parse_tree(&source, file)?;
        if let Some(point) = first_error(&tree) {
            return Err(TransformError::syntax(file.path(), point));
        }
        Ok(SourceFile { source, tree })
    }

    /// Parse text the engine produced itself
    ///
    /// # Errors
    /// Returns [`TransformError::InvalidOutput`] instead of a syntax error.
    pub fn reparse(&mut self, source: String, file: &FileInfo) -> TransformResult<SourceFile> {
        let tree = self.parse_tree(&source, file)?;
        if let Some(point) = first_error(&tree) {
            return Err(TransformError::invalid_output(file.path(), point));
        }
        Ok(SourceFile { source, tree })
    }

    fn parse_tree(&mut self, source: &str, file: &FileInfo) -> TransformResult<Tree> {
        let dialect = file.dialect();
        if self.dialect != Some(dialect) {
            self.parser
                .set_language(&dialect.tree_sitter_language())
                .map_err(|e| TransformError::ParserInit(e.to_string()))?;
            self.dialect = Some(dialect);
        }

        self.parser
            .parse(source, None)
            .ok_or_else(|| TransformError::NoTree(file.path().to_path_buf()))
    }
}

/// Position of the first `ERROR` or missing node, if any
fn first_error(tree: &Tree) -> Option<tree_sitter::Point> {
    let root = tree.root_node();
    if !root.has_error() {
        return None;
    }

    let mut node = root;
    loop {
        if node.is_error() || node.is_missing() {
            return Some(node.start_position());
        }
        let mut cursor = node.walk();
        let next = node
            .children(&mut cursor)
            .find(|c| c.is_error() || c.is_missing() || c.has_error());
        match next {
            Some(child) => node = child,
            None => return Some(node.start_position()),
        }
    }
}

/// Parsed source text with its tree
pub struct SourceFile {
    source: String,
    tree: Tree,
}

impl fmt::Debug for SourceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceFile")
            .field("len", &self.source.len())
            .finish_non_exhaustive()
    }
}

impl SourceFile {
    /// Source text
    #[inline]
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Root `program` node
    #[inline]
    #[must_use]
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Text covered by `node`
    #[inline]
    #[must_use]
    pub fn text(&self, node: Node<'_>) -> &str {
        &self.source[node.byte_range()]
    }

    /// Give back the source text
    #[inline]
    #[must_use]
    pub fn into_source(self) -> String {
        self.source
    }
}

/// Visit `root` and all its descendants in document (pre-)order
pub fn walk_preorder<'t>(root: Node<'t>, mut visit: impl FnMut(Node<'t>)) {
    let mut cursor = root.walk();
    loop {
        visit(cursor.node());
        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return;
            }
        }
    }
}

/// Named children that are not comments
///
/// For an `arguments` node this is the argument list.
#[must_use]
pub fn code_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    let children = node
        .named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect();
    children
}

/// Whether a member or call expression uses `?.`
///
/// Depending on the rule, the grammar exposes the token either as an
/// `optional_chain` node or as a bare `?.` child.
#[must_use]
pub fn is_optional_chain(node: Node<'_>) -> bool {
    if node.child_by_field_name("optional_chain").is_some() {
        return true;
    }
    let mut cursor = node.walk();
    let optional = node
        .children(&mut cursor)
        .any(|child| matches!(child.kind(), "optional_chain" | "?."));
    optional
}

/// Operand of a prefix operator the grammar bound tighter than a call
///
/// With type arguments, `await a.f<T>()` and `!a.f<T>()` parse as a call
/// whose function is `await a.f` (or `!a.f`). For such a call this returns
/// `a.f`; the prefix really applies to the whole call and anything chained
/// after it.
#[must_use]
pub fn misbound_prefix_operand(call: Node<'_>) -> Option<Node<'_>> {
    if call.kind() != "call_expression" || call.child_by_field_name("type_arguments").is_none() {
        return None;
    }
    let function = call.child_by_field_name("function")?;
    match function.kind() {
        "await_expression" => code_children(function).into_iter().next(),
        "unary_expression" => function.child_by_field_name("argument"),
        _ => None,
    }
}

/// A single byte-range replacement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEdit {
    /// Bytes being replaced (empty for an insertion)
    pub range: Range<usize>,
    /// Replacement text
    pub text: String,
}

/// Non-overlapping edits against one source text
#[derive(Debug, Clone, Default)]
pub struct EditSet {
    edits: Vec<SourceEdit>,
}

impl EditSet {
    /// Create empty edit set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `text` at byte offset `at`
    pub fn insert(&mut self, at: usize, text: impl Into<String>) {
        self.replace(at..at, text);
    }

    /// Replace `range` with `text`
    pub fn replace(&mut self, range: Range<usize>, text: impl Into<String>) {
        self.edits.push(SourceEdit {
            range,
            text: text.into(),
        });
    }

    /// Delete `range`
    pub fn delete(&mut self, range: Range<usize>) {
        self.replace(range, String::new());
    }

    /// Number of edits
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.edits.len()
    }

    /// Check if empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Apply all edits to `source`
    ///
    /// Insertions at an offset come before a replacement starting there.
    /// An edit overlapping an earlier one is dropped.
    #[must_use]
    pub fn apply(&self, source: &str) -> String {
        let mut edits: Vec<&SourceEdit> = self.edits.iter().collect();
        edits.sort_by_key(|e| (e.range.start, e.range.end));

        let mut out = String::with_capacity(source.len());
        let mut cursor = 0;
        for edit in edits {
            if edit.range.start < cursor {
                tracing::debug!("dropping overlapping edit at {:?}", edit.range);
                continue;
            }
            out.push_str(&source[cursor..edit.range.start]);
            out.push_str(&edit.text);
            cursor = edit.range.end;
        }
        out.push_str(&source[cursor..]);
        out
    }
}
