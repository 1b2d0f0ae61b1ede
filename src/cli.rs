use crate::parser::Dialect;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "structviz",
    version,
    about = "Structural insights and relationship graphs for JavaScript and TypeScript",
    after_help = r#"Examples:
  structviz insights src/app.js
  structviz insights src/app.ts --kind FunctionDefinition --kind FunctionCall --format table
  structviz insights src/app.js --ast app.ast.json
  cat src/app.js | structviz graph - --dialect js --dedupe-edges
  structviz insights src/app.js > insights.json && structviz compile insights.json
  structviz ast src/app.tsx --lenient
  structviz schema graph
"#
)]
pub struct Args {
    /// Log debug output to stderr (overrides STRUCTVIZ_LOG).
    #[arg(long, short, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Args, Debug, Clone)]
pub struct SourceArgs {
    /// Source file to analyze, or `-` for stdin.
    pub input: PathBuf,
    /// Source dialect; detected from the file extension when omitted.
    #[arg(long)]
    pub dialect: Option<Dialect>,
    /// Read a pre-parsed JSON AST instead of running the built-in parser.
    /// The input file still supplies the source text for positions.
    #[arg(long, value_name = "FILE")]
    pub ast: Option<PathBuf>,
    /// Byte offset of the source text's first character in AST spans.
    #[arg(long, default_value_t = 0)]
    pub span_base: usize,
}

#[derive(Subcommand)]
pub enum Command {
    /// Extract insights from a source file and print them.
    Insights {
        #[command(flatten)]
        source: SourceArgs,
        /// Only print insights of these kinds (e.g. FunctionCall).
        #[arg(long = "kind", value_name = "KIND")]
        kinds: Vec<String>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
    /// Extract insights and compile them into a node/edge graph.
    Graph {
        #[command(flatten)]
        source: SourceArgs,
        /// Collapse repeated (source, target, relation) edges.
        #[arg(long)]
        dedupe_edges: bool,
    },
    /// Compile a saved insight list (JSON array) into a graph.
    Compile {
        /// Insight JSON file, or `-` for stdin.
        insights: PathBuf,
        /// Collapse repeated (source, target, relation) edges.
        #[arg(long)]
        dedupe_edges: bool,
    },
    /// Print the JSON AST the built-in parser produces.
    Ast {
        /// Source file to parse, or `-` for stdin.
        input: PathBuf,
        #[arg(long)]
        dialect: Option<Dialect>,
        /// Keep going on syntax errors; broken regions become `Error` nodes.
        #[arg(long)]
        lenient: bool,
    },
    /// Print the JSON schema of the output records.
    Schema {
        #[arg(value_enum, default_value_t = SchemaTarget::Insight)]
        target: SchemaTarget,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SchemaTarget {
    Insight,
    Graph,
}
