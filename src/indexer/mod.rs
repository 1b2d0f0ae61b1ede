use crate::ast::Node;
use crate::model::Insight;
use crate::parser::{self, Dialect};
use anyhow::Result;
use serde_json::Value;
use tracing::debug;

pub mod describe;
pub mod extract;
pub mod pattern;

pub use extract::{ExtractOptions, callee_name};

/// Walks `ast` and returns its insights in traversal order.
///
/// `source` is the text the tree was parsed from; it is only used to turn
/// span offsets into line/column positions.
pub fn extract(ast: &Value, source: &str) -> Vec<Insight> {
    extract_with_options(ast, source, &ExtractOptions::default())
}

pub fn extract_with_options(ast: &Value, source: &str, options: &ExtractOptions) -> Vec<Insight> {
    let mut extractor = extract::Extractor::new(source, options);
    match Node::new(ast) {
        Some(root) => extractor.walk(root),
        None => {
            // a bare list of statements is still walkable
            for item in ast.as_array().into_iter().flatten().filter_map(Node::new) {
                extractor.walk(item);
            }
        }
    }
    let insights = extractor.finish();
    debug!(
        insights = insights.len(),
        source_bytes = source.len(),
        "extracted insights"
    );
    insights
}

/// Parses `source` with the built-in parser and extracts its insights.
pub fn index_source(source: &str, dialect: Dialect) -> Result<Vec<Insight>> {
    let ast = parser::parse(source, dialect)?;
    Ok(extract(&ast, source))
}
