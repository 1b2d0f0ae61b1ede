//! Structural analysis of JavaScript and TypeScript programs.
//!
//! A syntax tree (parsed by [`parser`] or supplied as SWC-style JSON) is
//! walked by [`indexer::extract`] into a flat list of [`model::Insight`]
//! records, which [`graph::compile`] turns into a node/edge graph.

pub mod ast;
pub mod cli;
pub mod commands;
pub mod config;
pub mod graph;
pub mod indexer;
pub mod location;
pub mod logging;
pub mod metrics;
pub mod model;
pub mod parser;

pub use graph::{CompileOptions, compile, compile_with};
pub use indexer::{ExtractOptions, extract, extract_with_options, index_source};
pub use model::{Graph, GraphEdge, GraphNode, Insight, InsightDetail};
