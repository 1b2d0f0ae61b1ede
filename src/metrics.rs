use crate::ast::Node;
use crate::location::LineIndex;
use crate::model::FunctionMetrics;

const BRANCH_KINDS: &[&str] = &[
    "IfStatement",
    "ConditionalExpression",
    "SwitchStatement",
    "SwitchCase",
];
const LOOP_KINDS: &[&str] = &[
    "ForStatement",
    "ForOfStatement",
    "ForInStatement",
    "WhileStatement",
    "DoWhileStatement",
];
const SHORT_CIRCUIT_OPERATORS: &[&str] = &["&&", "||", "??"];
const STATEMENT_LISTS: &[&str] = &["body", "stmts"];

/// Tallies the body of a function-like node.
pub fn measure(function: Node<'_>, lines: &LineIndex<'_>) -> FunctionMetrics {
    measure_with_base(function, lines, 0)
}

/// Like [`measure`], for trees whose span offsets start at `span_base`.
pub fn measure_with_base(
    function: Node<'_>,
    lines: &LineIndex<'_>,
    span_base: usize,
) -> FunctionMetrics {
    let mut metrics = FunctionMetrics::default();

    let body = function
        .child("body")
        .or_else(|| function.child("function").and_then(|inner| inner.child("body")));
    let mut stack: Vec<Node<'_>> = body.into_iter().collect();
    while let Some(node) = stack.pop() {
        tally(node, &mut metrics);
        stack.extend(node.child_nodes());
    }

    metrics.cyclomatic = 1 + metrics.branches + metrics.loops;
    metrics.line_count = function.span().map(|(start, end)| {
        lines
            .span(start.saturating_sub(span_base), end.saturating_sub(span_base))
            .line_count
    });
    metrics
}

fn tally(node: Node<'_>, metrics: &mut FunctionMetrics) {
    for field in STATEMENT_LISTS {
        metrics.statements += node.list(field).len();
    }
    let Some(kind) = node.kind_name() else {
        return;
    };
    if BRANCH_KINDS.contains(&kind) || is_short_circuit(node, kind) {
        metrics.branches += 1;
    } else if LOOP_KINDS.contains(&kind) {
        metrics.loops += 1;
    } else {
        match kind {
            "ReturnStatement" => metrics.returns += 1,
            "CallExpression" => metrics.calls += 1,
            "ThisExpression" => metrics.uses_self_reference = true,
            _ => {}
        }
    }
}

fn is_short_circuit(node: Node<'_>, kind: &str) -> bool {
    match kind {
        "LogicalExpression" => true,
        "BinaryExpression" => node
            .str("operator")
            .is_some_and(|op| SHORT_CIRCUIT_OPERATORS.contains(&op)),
        _ => false,
    }
}
