use crate::indexer::extract::UNKNOWN;
use crate::indexer::pattern::OBJECT_PATTERN;
use crate::model::{
    ANONYMOUS, GLOBAL_CONTEXT, Graph, GraphEdge, GraphNode, Insight, InsightDetail, NodeGroup,
    Relation,
};
use indexmap::{IndexMap, IndexSet};
use tracing::debug;

const MIN_FUNCTION_SIZE: u32 = 14;
const MAX_FUNCTION_SIZE: u32 = 40;

#[derive(Debug, Clone, Copy, Default)]
pub struct CompileOptions {
    /// Collapse edges with equal `(source, target, relation)`.
    pub dedupe_edges: bool,
}

/// Builds the node/edge graph for an insight sequence.
pub fn compile(insights: &[Insight]) -> Graph {
    compile_with(insights, CompileOptions::default())
}

pub fn compile_with(insights: &[Insight], options: CompileOptions) -> Graph {
    let mut builder = GraphBuilder::default();
    builder.ensure_node(
        context_id(GLOBAL_CONTEXT),
        GLOBAL_CONTEXT,
        NodeGroup::Context,
        None,
    );
    for (idx, insight) in insights.iter().enumerate() {
        builder.add_insight(idx, insight);
    }
    let graph = builder.finish(options);
    debug!(
        insights = insights.len(),
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        "compiled graph"
    );
    graph
}

#[derive(Default)]
struct GraphBuilder {
    nodes: IndexMap<String, GraphNode>,
    edges: Vec<GraphEdge>,
    /// Scopes opened by function and class insights, innermost last.
    scopes: Vec<OpenScope>,
}

/// A definition's scope: insights at `depth` whose context is the
/// definition's name belong to `id`.
struct OpenScope {
    depth: usize,
    id: String,
}

impl GraphBuilder {
    /// Inserts a node unless one with the same id exists; the first writer's
    /// label and metadata stick.
    fn ensure_node(
        &mut self,
        id: String,
        label: &str,
        group: NodeGroup,
        insight: Option<usize>,
    ) -> String {
        self.nodes
            .entry(id.clone())
            .or_insert_with(|| GraphNode {
                id: id.clone(),
                label: label.to_string(),
                group,
                size_hint: None,
                insight,
            });
        id
    }

    fn link(&mut self, source: &str, target: &str, relation: Relation) {
        self.edges.push(GraphEdge {
            source: source.to_string(),
            target: target.to_string(),
            relation,
        });
    }

    fn symbol(&mut self, name: &str, idx: usize) -> String {
        self.ensure_node(
            format!("symbol:{}", safe_id(name)),
            name,
            NodeGroup::Symbol,
            Some(idx),
        )
    }

    fn occurrence(&mut self, prefix: &str, idx: usize, label: &str, group: NodeGroup) -> String {
        self.ensure_node(format!("{prefix}:{idx}"), label, group, Some(idx))
    }

    /// Context node of an insight. Named contexts collapse by name; an
    /// `anonymous` context is the innermost anonymous scope open at the
    /// insight's depth.
    fn context_of(&mut self, insight: &Insight) -> String {
        while self
            .scopes
            .last()
            .is_some_and(|scope| scope.depth > insight.scope_depth)
        {
            self.scopes.pop();
        }
        let open = if insight.context == ANONYMOUS {
            self.scopes
                .last()
                .filter(|scope| scope.depth == insight.scope_depth)
                .map(|scope| scope.id.clone())
        } else {
            None
        };
        let id = open.unwrap_or_else(|| context_id(&insight.context));
        self.ensure_node(id, &insight.context, NodeGroup::Context, None)
    }

    /// Opens the scope a function or class defines and links it.
    fn open_scope(&mut self, owner: &str, name: &str, idx: usize, insight: &Insight) {
        let scope = self.ensure_node(named_id("ctx", name, idx), name, NodeGroup::Context, None);
        self.link(owner, &scope, Relation::Defines);
        self.scopes.push(OpenScope {
            depth: insight.scope_depth + 1,
            id: scope,
        });
    }

    fn add_insight(&mut self, idx: usize, insight: &Insight) {
        let ctx = self.context_of(insight);

        match &insight.detail {
            InsightDetail::Variable { name, .. } => {
                let var = self.ensure_node(
                    variable_id(name.as_deref(), idx),
                    name.as_deref().unwrap_or(UNKNOWN),
                    NodeGroup::Variable,
                    Some(idx),
                );
                self.link(&ctx, &var, Relation::Contains);
            }
            InsightDetail::FunctionDefinition { name, metrics, .. } => {
                let id = named_id("fn", name, idx);
                let function = self.ensure_node(id, name, NodeGroup::Function, Some(idx));
                if let Some(node) = self.nodes.get_mut(&function) {
                    if node.size_hint.is_none() && node.insight == Some(idx) {
                        node.size_hint = Some(function_size(metrics.cyclomatic));
                    }
                }
                self.link(&ctx, &function, Relation::Contains);
                self.open_scope(&function, name, idx, insight);
            }
            InsightDetail::FunctionCall { callee, .. } => {
                let call = self.occurrence("call", idx, callee, NodeGroup::Call);
                self.link(&ctx, &call, Relation::Calls);
                let target = self.symbol(callee, idx);
                self.link(&call, &target, Relation::Targets);
            }
            InsightDetail::Identifier { name } => {
                let symbol = self.symbol(name, idx);
                self.link(&ctx, &symbol, Relation::Reads);
            }
            InsightDetail::Import { source, specifiers } => {
                let module = self.ensure_node(
                    format!("mod:{}", safe_id(source)),
                    source,
                    NodeGroup::Module,
                    Some(idx),
                );
                self.link(&ctx, &module, Relation::Imports);
                for specifier in specifiers {
                    let local = self.symbol(&specifier.local, idx);
                    self.link(&module, &local, Relation::Binds);
                }
            }
            InsightDetail::Export { source, .. } => {
                let export = self.occurrence("exp", idx, &insight.summary(), NodeGroup::Export);
                self.link(&ctx, &export, Relation::Exports);
                if let Some(source) = source {
                    let module = self.ensure_node(
                        format!("mod:{}", safe_id(source)),
                        source,
                        NodeGroup::Module,
                        Some(idx),
                    );
                    self.link(&export, &module, Relation::Imports);
                }
            }
            InsightDetail::Class {
                name, super_class, ..
            } => {
                let class = self.ensure_node(
                    named_id("class", name, idx),
                    name,
                    NodeGroup::Class,
                    Some(idx),
                );
                self.link(&ctx, &class, Relation::Contains);
                self.open_scope(&class, name, idx, insight);
                if let Some(parent) = super_class {
                    let parent = self.symbol(parent, idx);
                    self.link(&class, &parent, Relation::Extends);
                }
            }
            InsightDetail::Assignment { left, right, .. } => {
                let assign =
                    self.occurrence("assign", idx, &insight.summary(), NodeGroup::Assignment);
                self.link(&ctx, &assign, Relation::Assign);
                let target = self.symbol(left, idx);
                self.link(&assign, &target, Relation::Writes);
                let value = self.occurrence("expr", idx, right, NodeGroup::Expression);
                self.link(&assign, &value, Relation::Reads);
            }
            InsightDetail::Update { argument, .. } => {
                let update =
                    self.occurrence("update", idx, &insight.summary(), NodeGroup::Assignment);
                self.link(&ctx, &update, Relation::Update);
                let target = self.symbol(argument, idx);
                self.link(&update, &target, Relation::Writes);
            }
            InsightDetail::BinaryExpression { .. } => {
                let expr = self.occurrence("expr", idx, &insight.summary(), NodeGroup::Expression);
                self.link(&ctx, &expr, Relation::Contains);
            }
            InsightDetail::Return { .. } => {
                let node = self.occurrence("return", idx, &insight.summary(), NodeGroup::Control);
                self.link(&ctx, &node, Relation::Return);
            }
            InsightDetail::Throw { .. } => {
                let node = self.occurrence("throw", idx, &insight.summary(), NodeGroup::Control);
                self.link(&ctx, &node, Relation::Throw);
            }
            InsightDetail::TryCatch { .. } => {
                let node =
                    self.occurrence("trycatch", idx, &insight.summary(), NodeGroup::Control);
                self.link(&ctx, &node, Relation::Try);
            }
            InsightDetail::StringLiteral { .. }
            | InsightDetail::NumericLiteral { .. }
            | InsightDetail::BooleanLiteral { .. }
            | InsightDetail::NullLiteral {}
            | InsightDetail::TemplateLiteral { .. } => {
                let node = self.occurrence("ins", idx, &insight.summary(), NodeGroup::Literal);
                self.link(&ctx, &node, Relation::Contains);
            }
        }
    }

    fn finish(self, options: CompileOptions) -> Graph {
        let edges = if options.dedupe_edges {
            self.edges
                .into_iter()
                .collect::<IndexSet<_>>()
                .into_iter()
                .collect()
        } else {
            self.edges
        };
        Graph {
            nodes: self.nodes.into_values().collect(),
            edges,
        }
    }
}

fn context_id(name: &str) -> String {
    format!("ctx:{}", safe_id(name))
}

/// Named declarations collapse by name; anonymous ones never do.
fn named_id(prefix: &str, name: &str, idx: usize) -> String {
    if name == ANONYMOUS {
        format!("{prefix}:{ANONYMOUS}:{idx}")
    } else {
        format!("{prefix}:{}", safe_id(name))
    }
}

/// Object destructurings and nameless declarators have no name to share,
/// so each gets its own node.
fn variable_id(name: Option<&str>, idx: usize) -> String {
    match name {
        None => format!("var:{UNKNOWN}:{idx}"),
        Some(OBJECT_PATTERN) => format!("var:{OBJECT_PATTERN}:{idx}"),
        Some(name) => format!("var:{}", safe_id(name)),
    }
}

fn function_size(cyclomatic: usize) -> u32 {
    let size = 12u32.saturating_add(u32::try_from(cyclomatic).unwrap_or(u32::MAX).saturating_mul(2));
    size.clamp(MIN_FUNCTION_SIZE, MAX_FUNCTION_SIZE)
}

/// Collapses whitespace runs so labels make usable ids.
fn safe_id(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join("_")
}
