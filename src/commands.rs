use crate::cli::{Command, OutputFormat, SchemaTarget, SourceArgs};
use crate::config::Config;
use crate::graph::{self, CompileOptions};
use crate::indexer::{self, ExtractOptions};
use crate::model::{Graph, Insight};
use crate::parser::{Dialect, SourceParser};
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::io::Read;
use std::path::Path;
use tabled::{Table, Tabled, settings::Style};
use tracing::{debug, info};

/// Runs one subcommand and returns what it prints on stdout.
pub fn run(command: Command) -> Result<String> {
    match command {
        Command::Insights {
            source,
            kinds,
            format,
        } => {
            let insights = filter_kinds(load_insights(&source)?, &kinds);
            match format {
                OutputFormat::Json => Ok(serde_json::to_string_pretty(&insights)?),
                OutputFormat::Table => Ok(insight_table(&insights)),
            }
        }
        Command::Graph {
            source,
            dedupe_edges,
        } => {
            let insights = load_insights(&source)?;
            let graph = graph::compile_with(&insights, CompileOptions { dedupe_edges });
            Ok(serde_json::to_string_pretty(&graph)?)
        }
        Command::Compile {
            insights: path,
            dedupe_edges,
        } => {
            let text = read_input(&path)?;
            let insights: Vec<Insight> = serde_json::from_str(&text)
                .with_context(|| format!("invalid insight list in {}", path.display()))?;
            let graph = graph::compile_with(&insights, CompileOptions { dedupe_edges });
            Ok(serde_json::to_string_pretty(&graph)?)
        }
        Command::Ast {
            input,
            dialect,
            lenient,
        } => {
            let source = read_input(&input)?;
            Config::get().check_source(&source)?;
            let dialect = resolve_dialect(&input, dialect);
            let ast = SourceParser::new(dialect)?
                .lenient(lenient)
                .parse(&source)
                .with_context(|| format!("failed to parse {}", input.display()))?;
            Ok(serde_json::to_string_pretty(&ast)?)
        }
        Command::Schema { target } => {
            let schema = match target {
                SchemaTarget::Insight => schemars::schema_for!(Vec<Insight>),
                SchemaTarget::Graph => schemars::schema_for!(Graph),
            };
            Ok(serde_json::to_string_pretty(&schema)?)
        }
    }
}

/// Reads the source (and optional AST file) named by `args` and extracts
/// its insights.
pub fn load_insights(args: &SourceArgs) -> Result<Vec<Insight>> {
    let config = Config::get();
    let source = read_input(&args.input)?;
    config.check_source(&source)?;

    let ast = match &args.ast {
        Some(path) => {
            let text = read_input(path)?;
            config.check_ast_text(&text)?;
            let ast = decode_ast(&text)
                .with_context(|| format!("invalid JSON AST in {}", path.display()))?;
            debug!(path = %path.display(), "loaded external AST");
            ast
        }
        None => {
            let dialect = resolve_dialect(&args.input, args.dialect);
            crate::parser::parse(&source, dialect)
                .with_context(|| format!("failed to parse {}", args.input.display()))?
        }
    };
    config.check_ast(&ast)?;

    let options = ExtractOptions {
        span_base: args.span_base,
    };
    let insights = indexer::extract_with_options(&ast, &source, &options);
    info!(
        input = %args.input.display(),
        insights = insights.len(),
        "extracted"
    );
    Ok(insights)
}

/// Decodes AST JSON without serde_json's recursion limit; the depth ceiling
/// has already been checked on the text.
fn decode_ast(text: &str) -> Result<Value> {
    let mut de = serde_json::Deserializer::from_str(text);
    de.disable_recursion_limit();
    let ast = Value::deserialize(&mut de)?;
    de.end()?;
    Ok(ast)
}

/// Reads a file, or stdin when `path` is `-`.
pub fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn resolve_dialect(path: &Path, explicit: Option<Dialect>) -> Dialect {
    explicit
        .or_else(|| Dialect::from_path(path))
        .unwrap_or_default()
}

fn filter_kinds(insights: Vec<Insight>, kinds: &[String]) -> Vec<Insight> {
    if kinds.is_empty() {
        return insights;
    }
    insights
        .into_iter()
        .filter(|insight| {
            kinds
                .iter()
                .any(|kind| kind.eq_ignore_ascii_case(insight.kind()))
        })
        .collect()
}

#[derive(Tabled)]
struct InsightRow {
    kind: &'static str,
    context: String,
    line: String,
    summary: String,
}

impl InsightRow {
    fn from_insight(insight: &Insight) -> Self {
        Self {
            kind: insight.kind(),
            context: insight.context.clone(),
            line: insight
                .location
                .map(|loc| format!("{}:{}", loc.line, loc.column))
                .unwrap_or_else(|| "-".to_string()),
            summary: insight.summary(),
        }
    }
}

fn insight_table(insights: &[Insight]) -> String {
    let rows: Vec<InsightRow> = insights.iter().map(InsightRow::from_insight).collect();
    Table::new(&rows).with(Style::psql()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Relation;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn source_args(input: PathBuf) -> SourceArgs {
        SourceArgs {
            input,
            dialect: None,
            ast: None,
            span_base: 0,
        }
    }

    fn write(dir: &TempDir, name: &str, text: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn insights_are_filtered_by_kind() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "app.js", "function add(a, b) { return a + b; }\nadd(1, 2);\n");
        let output = run(Command::Insights {
            source: source_args(path),
            kinds: vec!["functioncall".to_string()],
            format: OutputFormat::Json,
        })
        .unwrap();
        let insights: Vec<Insight> = serde_json::from_str(&output).unwrap();
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].kind(), "FunctionCall");
        assert_eq!(insights[0].summary(), "add(1, 2)");
    }

    #[test]
    fn table_output_lists_rows() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "app.js", "let x = 1;\n");
        let output = run(Command::Insights {
            source: source_args(path),
            kinds: Vec::new(),
            format: OutputFormat::Table,
        })
        .unwrap();
        assert!(output.contains("Variable"), "{output}");
        assert!(output.contains("x = 1"), "{output}");
        assert!(output.contains("1:1"), "{output}");
    }

    #[test]
    fn external_ast_is_used_instead_of_parser() {
        let dir = TempDir::new().unwrap();
        // not valid JavaScript; only the AST matters
        let path = write(&dir, "app.js", "@@@");
        let ast = write(
            &dir,
            "app.ast.json",
            r#"{"type": "Module", "body": [{"type": "Identifier", "value": "ghost"}]}"#,
        );
        let mut args = source_args(path);
        args.ast = Some(ast);
        let insights = load_insights(&args).unwrap();
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].summary(), "ghost");
        assert_eq!(insights[0].location, None);
    }

    #[test]
    fn compile_reads_saved_insights() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "app.js", "log(1);\nlog(2);\n");
        let insights = load_insights(&source_args(path)).unwrap();
        let saved = write(
            &dir,
            "insights.json",
            &serde_json::to_string(&insights).unwrap(),
        );
        let output = run(Command::Compile {
            insights: saved,
            dedupe_edges: false,
        })
        .unwrap();
        let graph: Graph = serde_json::from_str(&output).unwrap();
        assert!(graph.node("symbol:log").is_some());
        let targets = graph
            .edges_into("symbol:log")
            .filter(|edge| edge.relation == Relation::Targets)
            .count();
        assert_eq!(targets, 2);
    }

    #[test]
    fn syntax_errors_name_the_file() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "broken.js", "function (");
        let err = load_insights(&source_args(path)).unwrap_err();
        assert!(format!("{err:#}").contains("broken.js"), "{err:#}");
    }

    #[test]
    fn deeply_nested_source_is_rejected() {
        let dir = TempDir::new().unwrap();
        let source = format!("x = {}1{};", "[".repeat(10_000), "]".repeat(10_000));
        let path = write(&dir, "deep.js", &source);
        let err = load_insights(&source_args(path)).unwrap_err();
        assert!(format!("{err:#}").contains("levels deep"), "{err:#}");
    }

    #[test]
    fn external_ast_below_the_depth_limit_loads() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "app.js", "x");
        let mut expression = r#"{"type": "Identifier", "value": "x"}"#.to_string();
        for _ in 0..200 {
            expression = format!(r#"{{"type": "ParenthesisExpression", "expression": {expression}}}"#);
        }
        let ast = write(
            &dir,
            "app.ast.json",
            &format!(
                r#"{{"type": "Module", "body": [{{"type": "ExpressionStatement", "expression": {expression}}}]}}"#
            ),
        );
        let mut args = source_args(path);
        args.ast = Some(ast);
        let insights = load_insights(&args).unwrap();
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].summary(), "x");
    }

    #[test]
    fn external_ast_above_the_depth_limit_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "app.js", "x");
        let ast = write(&dir, "app.ast.json", &"[".repeat(100_000));
        let mut args = source_args(path);
        args.ast = Some(ast);
        let err = load_insights(&args).unwrap_err();
        assert!(format!("{err:#}").contains("levels deep"), "{err:#}");
    }

    #[test]
    fn schema_describes_insights() {
        let output = run(Command::Schema {
            target: SchemaTarget::Insight,
        })
        .unwrap();
        assert!(output.contains("FunctionDefinition"), "{output}");
    }
}
