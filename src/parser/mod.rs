//! Source text to AST, using the tree-sitter JavaScript and TypeScript
//! grammars.

use crate::config::Config;
use crate::location;
use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use serde_json::Value;
use std::path::Path;
use tracing::debug;
use tree_sitter::{Language, Node as SyntaxNode, Parser};

mod lower;

use lower::Lowerer;

const JAVASCRIPT_EXTENSIONS: &[&str] = &["js", "jsx", "mjs", "cjs"];
const TYPESCRIPT_EXTENSIONS: &[&str] = &["ts", "mts", "cts"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Dialect {
    #[default]
    #[value(name = "javascript", alias = "js", alias = "jsx")]
    JavaScript,
    #[value(name = "typescript", alias = "ts")]
    TypeScript,
    Tsx,
}

impl Dialect {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        if JAVASCRIPT_EXTENSIONS.contains(&ext.as_str()) {
            Some(Dialect::JavaScript)
        } else if TYPESCRIPT_EXTENSIONS.contains(&ext.as_str()) {
            Some(Dialect::TypeScript)
        } else if ext == "tsx" {
            Some(Dialect::Tsx)
        } else {
            None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Dialect::JavaScript => "javascript",
            Dialect::TypeScript => "typescript",
            Dialect::Tsx => "tsx",
        }
    }

    fn language(self) -> Language {
        match self {
            Dialect::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
            Dialect::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Dialect::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }
}

/// Reusable parser for one dialect.
pub struct SourceParser {
    parser: Parser,
    dialect: Dialect,
    lenient: bool,
    max_depth: usize,
}

impl SourceParser {
    pub fn new(dialect: Dialect) -> Result<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&dialect.language())
            .with_context(|| format!("loading {} grammar", dialect.as_str()))?;
        Ok(Self {
            parser,
            dialect,
            lenient: false,
            max_depth: Config::get().max_ast_depth,
        })
    }

    /// Lenient parsers lower trees with syntax errors instead of failing;
    /// error regions become `Error` nodes.
    pub fn lenient(mut self, lenient: bool) -> Self {
        self.lenient = lenient;
        self
    }

    /// Deepest syntax tree lowered; deeper sources fail before lowering.
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn parse(&mut self, source: &str) -> Result<Value> {
        let tree = self
            .parser
            .parse(source, None)
            .context("parser produced no tree")?;
        let root = tree.root_node();
        if root.has_error() && !self.lenient {
            match first_error(root) {
                Some(node) => {
                    let at = location::resolve(source, node.start_byte());
                    let what = if node.is_missing() {
                        format!("missing `{}`", node.kind())
                    } else {
                        "unexpected input".to_string()
                    };
                    bail!(
                        "syntax error in {} source at line {}, column {}: {what}",
                        self.dialect.as_str(),
                        at.line,
                        at.column
                    );
                }
                None => bail!("syntax error in {} source", self.dialect.as_str()),
            }
        }
        let depth = tree_depth(root);
        if depth > self.max_depth {
            bail!(
                "syntax tree nests {depth} levels deep, limit is {} (STRUCTVIZ_MAX_AST_DEPTH)",
                self.max_depth
            );
        }
        let ast = Lowerer::new(source).program(root);
        debug!(
            dialect = self.dialect.as_str(),
            bytes = source.len(),
            "parsed source"
        );
        Ok(ast)
    }
}

/// Parses `source` into the AST consumed by [`crate::indexer::extract`].
pub fn parse(source: &str, dialect: Dialect) -> Result<Value> {
    SourceParser::new(dialect)?.parse(source)
}

/// Depth of the concrete tree, root counted as 1. Lowering recurses once per
/// level, so this runs first and without recursion.
fn tree_depth(root: SyntaxNode<'_>) -> usize {
    let mut cursor = root.walk();
    let mut depth = 1;
    let mut deepest = 1;
    loop {
        if cursor.goto_first_child() {
            depth += 1;
            deepest = deepest.max(depth);
            continue;
        }
        while !cursor.goto_next_sibling() {
            if !cursor.goto_parent() {
                return deepest;
            }
            depth -= 1;
        }
    }
}

fn first_error(root: SyntaxNode<'_>) -> Option<SyntaxNode<'_>> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        if node.has_error() {
            let mut cursor = node.walk();
            let children: Vec<_> = node.children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }
    }
    None
}
