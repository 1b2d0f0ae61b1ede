use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const GLOBAL_CONTEXT: &str = "global";
pub const ANONYMOUS: &str = "anonymous";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Span {
    pub start: Location,
    pub end: Location,
    pub line_count: usize,
}

/// One structural fact about the analyzed program.
///
/// `context` is the innermost enclosing function or class name at the time
/// the record was emitted, `scope_depth` the length of the context stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    #[serde(flatten)]
    pub detail: InsightDetail,
    pub context: String,
    pub location: Option<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
    pub scope_depth: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind")]
pub enum InsightDetail {
    #[serde(rename_all = "camelCase")]
    Variable {
        name: Option<String>,
        declaration_kind: Option<String>,
        init: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        params: Option<Vec<String>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        is_async: Option<bool>,
    },
    #[serde(rename_all = "camelCase")]
    FunctionDefinition {
        name: String,
        params: Vec<String>,
        is_async: bool,
        is_generator: bool,
        metrics: FunctionMetrics,
    },
    #[serde(rename_all = "camelCase")]
    FunctionCall {
        callee: String,
        args: Vec<String>,
        argument_count: usize,
    },
    BinaryExpression {
        operator: String,
        left: String,
        right: String,
    },
    Assignment {
        operator: String,
        left: String,
        right: String,
    },
    Update {
        operator: String,
        argument: String,
        prefix: bool,
    },
    Return {
        value: Option<String>,
    },
    Throw {
        value: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    TryCatch {
        has_catch: bool,
        has_finally: bool,
    },
    Identifier {
        name: String,
    },
    StringLiteral {
        value: String,
    },
    NumericLiteral {
        value: Option<f64>,
        raw: Option<String>,
    },
    BooleanLiteral {
        value: bool,
    },
    NullLiteral {},
    TemplateLiteral {
        parts: Vec<String>,
        expressions: Vec<String>,
    },
    Import {
        source: String,
        specifiers: Vec<ImportBinding>,
    },
    #[serde(rename_all = "camelCase")]
    Export {
        export_kind: ExportKind,
        names: Vec<String>,
        source: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Class {
        name: String,
        super_class: Option<String>,
        methods: Vec<ClassMember>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FunctionMetrics {
    pub branches: usize,
    pub loops: usize,
    pub returns: usize,
    pub calls: usize,
    pub statements: usize,
    pub uses_self_reference: bool,
    pub cyclomatic: usize,
    pub line_count: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ImportKind {
    Default,
    Namespace,
    Named,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ImportBinding {
    pub kind: ImportKind,
    pub local: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imported: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum ExportKind {
    Declaration,
    Named,
    Default,
    DefaultExpression,
    All,
}

impl ExportKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ExportKind::Declaration => "declaration",
            ExportKind::Named => "named",
            ExportKind::Default => "default",
            ExportKind::DefaultExpression => "defaultExpression",
            ExportKind::All => "all",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClassMember {
    pub name: String,
    pub kind: String,
    pub is_static: bool,
    pub is_async: bool,
    pub is_generator: bool,
}

impl Insight {
    pub fn kind(&self) -> &'static str {
        match &self.detail {
            InsightDetail::Variable { .. } => "Variable",
            InsightDetail::FunctionDefinition { .. } => "FunctionDefinition",
            InsightDetail::FunctionCall { .. } => "FunctionCall",
            InsightDetail::BinaryExpression { .. } => "BinaryExpression",
            InsightDetail::Assignment { .. } => "Assignment",
            InsightDetail::Update { .. } => "Update",
            InsightDetail::Return { .. } => "Return",
            InsightDetail::Throw { .. } => "Throw",
            InsightDetail::TryCatch { .. } => "TryCatch",
            InsightDetail::Identifier { .. } => "Identifier",
            InsightDetail::StringLiteral { .. } => "StringLiteral",
            InsightDetail::NumericLiteral { .. } => "NumericLiteral",
            InsightDetail::BooleanLiteral { .. } => "BooleanLiteral",
            InsightDetail::NullLiteral {} => "NullLiteral",
            InsightDetail::TemplateLiteral { .. } => "TemplateLiteral",
            InsightDetail::Import { .. } => "Import",
            InsightDetail::Export { .. } => "Export",
            InsightDetail::Class { .. } => "Class",
        }
    }

    /// One-line description, as shown in the insight table.
    pub fn summary(&self) -> String {
        match &self.detail {
            InsightDetail::Variable { name, init, .. } => {
                let name = name.as_deref().unwrap_or("unknown");
                match init {
                    Some(init) => format!("{name} = {init}"),
                    None => name.to_string(),
                }
            }
            InsightDetail::FunctionDefinition { name, params, .. } => {
                format!("{name}({})", params.join(", "))
            }
            InsightDetail::FunctionCall { callee, args, .. } => {
                format!("{callee}({})", args.join(", "))
            }
            InsightDetail::BinaryExpression {
                operator,
                left,
                right,
            }
            | InsightDetail::Assignment {
                operator,
                left,
                right,
            } => format!("{left} {operator} {right}"),
            InsightDetail::Update {
                operator,
                argument,
                prefix,
            } => {
                if *prefix {
                    format!("{operator}{argument}")
                } else {
                    format!("{argument}{operator}")
                }
            }
            InsightDetail::Return { value } => {
                format!("return {}", value.as_deref().unwrap_or("")).trim_end().to_string()
            }
            InsightDetail::Throw { value } => {
                format!("throw {}", value.as_deref().unwrap_or("")).trim_end().to_string()
            }
            InsightDetail::TryCatch {
                has_catch,
                has_finally,
            } => {
                let mut label = String::from("try");
                if *has_catch {
                    label.push_str("/catch");
                }
                if *has_finally {
                    label.push_str("/finally");
                }
                label
            }
            InsightDetail::Identifier { name } => name.clone(),
            InsightDetail::StringLiteral { value } => format!("{value:?}"),
            InsightDetail::NumericLiteral { value, raw } => match (value, raw) {
                (Some(value), _) => format_number(*value),
                (None, Some(raw)) => raw.clone(),
                (None, None) => "NaN".to_string(),
            },
            InsightDetail::BooleanLiteral { value } => value.to_string(),
            InsightDetail::NullLiteral {} => "null".to_string(),
            InsightDetail::TemplateLiteral { parts, .. } => {
                format!("`{}`", parts.join("${…}"))
            }
            InsightDetail::Import { source, .. } => format!("import from {source}"),
            InsightDetail::Export {
                export_kind, names, ..
            } => {
                if names.is_empty() {
                    format!("export {}", export_kind.as_str())
                } else {
                    format!("export {}", names.join(", "))
                }
            }
            InsightDetail::Class {
                name, super_class, ..
            } => match super_class {
                Some(parent) => format!("class {name} extends {parent}"),
                None => format!("class {name}"),
            },
        }
    }
}

/// Renders a number the way JavaScript prints it for the common cases:
/// integral values without a fractional part.
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    format!("{value}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum NodeGroup {
    Context,
    Function,
    Variable,
    Call,
    Symbol,
    Module,
    Export,
    Class,
    Assignment,
    Expression,
    Control,
    Literal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    Contains,
    Defines,
    Calls,
    Targets,
    Imports,
    Binds,
    Exports,
    Extends,
    Assign,
    Reads,
    Writes,
    Return,
    Throw,
    Try,
    Update,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    pub group: NodeGroup,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_hint: Option<u32>,
    /// Index of the insight that introduced this node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insight: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub relation: Relation,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Graph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl Graph {
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn edges_from<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a GraphEdge> + 'a {
        self.edges.iter().filter(move |edge| edge.source == id)
    }

    pub fn edges_into<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a GraphEdge> + 'a {
        self.edges.iter().filter(move |edge| edge.target == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn insight(detail: InsightDetail) -> Insight {
        Insight {
            detail,
            context: GLOBAL_CONTEXT.to_string(),
            location: None,
            span: None,
            scope_depth: 0,
        }
    }

    #[test]
    fn serializes_kind_tag_and_camel_case_fields() {
        let value = serde_json::to_value(insight(InsightDetail::FunctionCall {
            callee: "log".to_string(),
            args: vec!["sum".to_string()],
            argument_count: 1,
        }))
        .unwrap();
        assert_eq!(value["kind"], "FunctionCall");
        assert_eq!(value["argumentCount"], 1);
        assert_eq!(value["scopeDepth"], 0);
        assert!(value["location"].is_null());
        assert!(value.get("span").is_none());
    }

    #[test]
    fn deserializes_what_it_serializes() {
        let original = insight(InsightDetail::TryCatch {
            has_catch: true,
            has_finally: false,
        });
        let text = serde_json::to_string(&original).unwrap();
        let decoded: Insight = serde_json::from_str(&text).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn summaries_match_table_rendering() {
        let update = insight(InsightDetail::Update {
            operator: "++".to_string(),
            argument: "i".to_string(),
            prefix: false,
        });
        assert_eq!(update.summary(), "i++");
        let ret = insight(InsightDetail::Return { value: None });
        assert_eq!(ret.summary(), "return");
        let try_catch = insight(InsightDetail::TryCatch {
            has_catch: true,
            has_finally: true,
        });
        assert_eq!(try_catch.summary(), "try/catch/finally");
    }

    #[test]
    fn formats_numbers_like_javascript() {
        assert_eq!(format_number(1.0), "1");
        assert_eq!(format_number(-42.0), "-42");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(f64::NAN), "NaN");
    }
}
