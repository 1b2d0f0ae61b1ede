use structviz::indexer::index_source;
use structviz::model::{ExportKind, Insight, InsightDetail};
use structviz::parser::Dialect;

fn definitions(insights: &[Insight]) -> Vec<(&str, &[String], bool)> {
    insights
        .iter()
        .filter_map(|insight| match &insight.detail {
            InsightDetail::FunctionDefinition {
                name,
                params,
                is_async,
                ..
            } => Some((name.as_str(), params.as_slice(), *is_async)),
            _ => None,
        })
        .collect()
}

#[test]
fn typed_functions_keep_parameter_names() {
    let source = r#"
interface Point { x: number }

export async function load(id: string, retries = 3, ...rest: unknown[]): Promise<Point> {
  const data = (await fetch(id)) as Point;
  return data!;
}
"#;
    let insights = index_source(source, Dialect::TypeScript).unwrap();

    let defs = definitions(&insights);
    assert_eq!(defs.len(), 1);
    assert_eq!(defs[0].0, "load");
    assert_eq!(defs[0].1, &["id", "retries=3", "...rest"]);
    assert!(defs[0].2);

    let export = insights
        .iter()
        .find_map(|insight| match &insight.detail {
            InsightDetail::Export {
                export_kind, names, ..
            } => Some((*export_kind, names.clone())),
            _ => None,
        })
        .unwrap();
    assert_eq!(export, (ExportKind::Declaration, vec!["load".to_string()]));

    let init = insights
        .iter()
        .find_map(|insight| match &insight.detail {
            InsightDetail::Variable { init, .. } => init.clone(),
            _ => None,
        })
        .unwrap();
    assert_eq!(init, "(await fetch(id))");

    let returned = insights
        .iter()
        .find(|insight| insight.kind() == "Return")
        .unwrap();
    assert_eq!(returned.summary(), "return data");
    assert_eq!(returned.context, "load");
}

#[test]
fn tsx_components_are_functions() {
    let source = r#"
const Button = ({ label }: { label: string }) => <button onClick={() => track(label)}>{label}</button>;
"#;
    let insights = index_source(source, Dialect::Tsx).unwrap();
    let defs = definitions(&insights);
    assert_eq!(defs.len(), 2);
    assert_eq!(defs[0].1, &["{…}"]);

    let call = insights
        .iter()
        .find(|insight| insight.kind() == "FunctionCall")
        .unwrap();
    assert_eq!(call.summary(), "track(label)");
    assert_eq!(call.scope_depth, 2);
}

#[test]
fn class_fields_and_parameter_properties() {
    let source = r#"
class Service {
  private cache = new Map<string, number>();
  constructor(private readonly client: Client) {}
}
"#;
    let insights = index_source(source, Dialect::TypeScript).unwrap();
    let defs = definitions(&insights);
    assert_eq!(defs, vec![("constructor", &["client".to_string()][..], false)]);

    let call = insights
        .iter()
        .find(|insight| insight.kind() == "FunctionCall")
        .unwrap();
    assert_eq!(call.summary(), "new Map()");
    assert_eq!(call.context, "Service");
}

#[test]
fn type_declarations_are_not_reads() {
    let source = r#"
interface Shape { area(): number }
type Id = string;
enum Color { Red, Green }
const shape: Shape = make();
"#;
    let insights = index_source(source, Dialect::TypeScript).unwrap();
    let reads: Vec<&str> = insights
        .iter()
        .filter_map(|insight| match &insight.detail {
            InsightDetail::Identifier { name } => Some(name.as_str()),
            _ => None,
        })
        .collect();
    for name in ["Shape", "Id", "Color"] {
        assert!(!reads.contains(&name), "{name} read in {reads:?}");
    }
    assert_eq!(
        insights
            .iter()
            .filter(|insight| insight.kind() == "FunctionCall")
            .count(),
        1
    );
}
