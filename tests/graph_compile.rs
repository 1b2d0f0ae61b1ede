use structviz::graph::{CompileOptions, compile, compile_with};
use structviz::indexer::index_source;
use structviz::model::{Graph, NodeGroup, Relation};
use structviz::parser::Dialect;

fn graph_of(source: &str) -> Graph {
    compile(&index_source(source, Dialect::JavaScript).unwrap())
}

fn relations_into(graph: &Graph, id: &str, relation: Relation) -> Vec<String> {
    graph
        .edges_into(id)
        .filter(|edge| edge.relation == relation)
        .map(|edge| edge.source.clone())
        .collect()
}

#[test]
fn call_sites_share_one_symbol() {
    let graph = graph_of("log(1);\nfunction f() { log(2); }\n");

    let symbols: Vec<_> = graph.nodes.iter().filter(|n| n.id == "symbol:log").collect();
    assert_eq!(symbols.len(), 1);
    assert_eq!(symbols[0].group, NodeGroup::Symbol);

    let call_nodes: Vec<_> = graph
        .nodes
        .iter()
        .filter(|n| n.id.starts_with("call:"))
        .collect();
    assert_eq!(call_nodes.len(), 2);

    let targets = relations_into(&graph, "symbol:log", Relation::Targets);
    assert_eq!(targets.len(), 2);
    assert_ne!(targets[0], targets[1]);

    // each call hangs off the context it was made in
    let callers: Vec<String> = targets
        .iter()
        .flat_map(|call| relations_into(&graph, call, Relation::Calls))
        .collect();
    assert_eq!(callers, vec!["ctx:global", "ctx:f"]);
}

#[test]
fn compile_is_deterministic() {
    let insights = index_source(
        "import { a } from './a';\nclass B extends A { m() { a(this.x++); } }\n",
        Dialect::JavaScript,
    )
    .unwrap();
    assert_eq!(compile(&insights), compile(&insights));
    assert_eq!(
        serde_json::to_string(&compile(&insights)).unwrap(),
        serde_json::to_string(&compile(&insights)).unwrap()
    );
}

#[test]
fn global_context_is_always_first() {
    let graph = compile(&[]);
    assert_eq!(graph.nodes.len(), 1);
    assert_eq!(graph.nodes[0].id, "ctx:global");
    assert_eq!(graph.nodes[0].group, NodeGroup::Context);

    let graph = graph_of("function f() {}");
    assert_eq!(graph.nodes[0].id, "ctx:global");
}

#[test]
fn every_edge_endpoint_exists() {
    let graph = graph_of(
        r#"
import fs, { readFile as read } from "fs";
export * from "./util";
let count = 0;
count += 1;
count++;
class Store extends Base {
  save(item) {
    try { fs.write(`${item.id}.json`, item); } catch (e) { throw e; }
    return item ?? null;
  }
}
"#,
    );
    for edge in &graph.edges {
        assert!(graph.node(&edge.source).is_some(), "missing {}", edge.source);
        assert!(graph.node(&edge.target).is_some(), "missing {}", edge.target);
    }
    let relations: Vec<Relation> = graph.edges.iter().map(|e| e.relation).collect();
    for expected in [
        Relation::Imports,
        Relation::Binds,
        Relation::Exports,
        Relation::Contains,
        Relation::Assign,
        Relation::Writes,
        Relation::Update,
        Relation::Defines,
        Relation::Extends,
        Relation::Try,
        Relation::Throw,
        Relation::Return,
        Relation::Calls,
        Relation::Targets,
        Relation::Reads,
    ] {
        assert!(relations.contains(&expected), "no {expected:?} edge");
    }
}

#[test]
fn imports_bind_local_names() {
    let graph = graph_of(r#"import fs, { readFile as read } from "fs";"#);
    let module = graph.node("mod:fs").unwrap();
    assert_eq!(module.group, NodeGroup::Module);
    let bound: Vec<&str> = graph
        .edges_from("mod:fs")
        .filter(|edge| edge.relation == Relation::Binds)
        .map(|edge| edge.target.as_str())
        .collect();
    assert_eq!(bound, vec!["symbol:fs", "symbol:read"]);
    assert_eq!(relations_into(&graph, "mod:fs", Relation::Imports), vec!["ctx:global"]);
}

#[test]
fn dedupe_option_collapses_repeated_reads() {
    let insights = index_source("x; x; x;", Dialect::JavaScript).unwrap();
    let plain = compile(&insights);
    assert_eq!(relations_into(&plain, "symbol:x", Relation::Reads).len(), 3);
    let deduped = compile_with(&insights, CompileOptions { dedupe_edges: true });
    assert_eq!(relations_into(&deduped, "symbol:x", Relation::Reads).len(), 1);
    assert_eq!(deduped.nodes, plain.nodes);
}

#[test]
fn anonymous_arrows_get_separate_contexts() {
    let graph = graph_of("const a = () => { one(); };\nconst b = () => { two(); };\n");
    assert!(graph.node("ctx:anonymous").is_none());

    let caller = |callee: &str| -> String {
        let call = relations_into(&graph, &format!("symbol:{callee}"), Relation::Targets)
            .pop()
            .unwrap();
        relations_into(&graph, &call, Relation::Calls).pop().unwrap()
    };
    let first = caller("one");
    let second = caller("two");
    assert!(first.starts_with("ctx:anonymous:"), "{first}");
    assert!(second.starts_with("ctx:anonymous:"), "{second}");
    assert_ne!(first, second);

    // each arrow defines the context its body runs in
    let definers: Vec<String> = [&first, &second]
        .iter()
        .flat_map(|ctx| relations_into(&graph, ctx, Relation::Defines))
        .collect();
    assert_eq!(definers.len(), 2);
    assert!(definers.iter().all(|id| id.starts_with("fn:anonymous:")));
    assert_ne!(definers[0], definers[1]);
}

#[test]
fn destructured_variables_do_not_merge() {
    let graph = graph_of("const { a } = x;\nconst { b } = y;\n");
    let vars: Vec<&str> = graph
        .nodes
        .iter()
        .filter(|node| node.group == NodeGroup::Variable)
        .map(|node| node.id.as_str())
        .collect();
    assert_eq!(vars.len(), 2, "{vars:?}");
    assert_ne!(vars[0], vars[1]);
    assert!(vars.iter().all(|id| id.starts_with("var:{…}:")));
}
