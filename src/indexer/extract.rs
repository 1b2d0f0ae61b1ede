use crate::ast::{Node, NodeKind};
use crate::indexer::describe::{
    class_name, describe, describe_argument, is_async, is_generator, is_pattern,
    param_names, property_name, template_parts,
};
use crate::indexer::pattern::name_of;
use crate::location::LineIndex;
use crate::metrics;
use crate::model::{
    ANONYMOUS, ClassMember, ExportKind, GLOBAL_CONTEXT, ImportBinding, ImportKind, Insight,
    InsightDetail,
};
use tracing::trace;

pub const UNKNOWN: &str = "unknown";

#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractOptions {
    /// Offset of the first source byte in the tree's spans.
    pub span_base: usize,
}

/// Walk state for one extraction request.
pub(crate) struct Extractor<'s> {
    lines: LineIndex<'s>,
    span_base: usize,
    contexts: Vec<String>,
    insights: Vec<Insight>,
}

/// The pieces of a function-like node that the walk needs, whatever its
/// syntactic form.
struct FunctionParts<'a> {
    name: String,
    params: Vec<Option<Node<'a>>>,
    body: Option<Node<'a>>,
    flags: Node<'a>,
    computed_key: Option<Node<'a>>,
}

impl<'s> Extractor<'s> {
    pub(crate) fn new(source: &'s str, options: &ExtractOptions) -> Self {
        Self {
            lines: LineIndex::new(source),
            span_base: options.span_base,
            contexts: Vec::new(),
            insights: Vec::new(),
        }
    }

    pub(crate) fn finish(self) -> Vec<Insight> {
        self.insights
    }

    fn current_context(&self) -> &str {
        self.contexts
            .last()
            .map(String::as_str)
            .unwrap_or(GLOBAL_CONTEXT)
    }

    fn emit(&mut self, anchor: Node<'_>, detail: InsightDetail) {
        let offsets = anchor.span().map(|(start, end)| {
            (
                start.saturating_sub(self.span_base),
                end.saturating_sub(self.span_base),
            )
        });
        let insight = Insight {
            detail,
            context: self.current_context().to_string(),
            location: offsets.map(|(start, _)| self.lines.locate(start)),
            span: offsets.map(|(start, end)| self.lines.span(start, end)),
            scope_depth: self.contexts.len(),
        };
        self.insights.push(insight);
    }

    pub(crate) fn walk(&mut self, node: Node<'_>) {
        match node.kind() {
            NodeKind::VariableDeclaration => self.variable_declaration(node),
            NodeKind::FunctionDeclaration
            | NodeKind::FunctionExpression
            | NodeKind::ArrowFunctionExpression
            | NodeKind::ClassMethod
            | NodeKind::PrivateMethod
            | NodeKind::Constructor
            | NodeKind::MethodProperty
            | NodeKind::GetterProperty
            | NodeKind::SetterProperty => self.function(node),
            NodeKind::CallExpression | NodeKind::NewExpression => self.call(node),
            NodeKind::BinaryExpression => {
                self.emit(
                    node,
                    InsightDetail::BinaryExpression {
                        operator: node.str("operator").unwrap_or(UNKNOWN).to_string(),
                        left: describe(node.child("left"), 0),
                        right: describe(node.child("right"), 0),
                    },
                );
                self.walk_opt(node.child("left"));
                self.walk_opt(node.child("right"));
            }
            NodeKind::AssignmentExpression => self.assignment(node),
            NodeKind::UpdateExpression => {
                let argument = node.child("argument");
                self.emit(
                    node,
                    InsightDetail::Update {
                        operator: node.str("operator").unwrap_or(UNKNOWN).to_string(),
                        argument: describe(argument, 0),
                        prefix: node.flag("prefix"),
                    },
                );
                self.walk_target(argument);
            }
            NodeKind::ReturnStatement => {
                let argument = node.child("argument");
                self.emit(
                    node,
                    InsightDetail::Return {
                        value: argument.map(|arg| describe(Some(arg), 0)),
                    },
                );
                self.walk_opt(argument);
            }
            NodeKind::ThrowStatement => {
                let argument = node.child("argument");
                self.emit(
                    node,
                    InsightDetail::Throw {
                        value: argument.map(|arg| describe(Some(arg), 0)),
                    },
                );
                self.walk_opt(argument);
            }
            NodeKind::TryStatement => {
                let handler = node.child("handler");
                let finalizer = node.child("finalizer");
                self.emit(
                    node,
                    InsightDetail::TryCatch {
                        has_catch: handler.is_some(),
                        has_finally: finalizer.is_some(),
                    },
                );
                self.walk_opt(node.child("block"));
                self.walk_opt(handler.and_then(|h| h.child("body")));
                self.walk_opt(finalizer);
            }
            NodeKind::Identifier => self.emit(
                node,
                InsightDetail::Identifier {
                    name: node.ident().unwrap_or(UNKNOWN).to_string(),
                },
            ),
            NodeKind::StringLiteral => self.emit(
                node,
                InsightDetail::StringLiteral {
                    value: node.str("value").unwrap_or_default().to_string(),
                },
            ),
            NodeKind::NumericLiteral => self.emit(
                node,
                InsightDetail::NumericLiteral {
                    value: node.number("value"),
                    raw: node.str("raw").map(str::to_string),
                },
            ),
            NodeKind::BooleanLiteral => self.emit(
                node,
                InsightDetail::BooleanLiteral {
                    value: node.flag("value"),
                },
            ),
            NodeKind::NullLiteral => self.emit(node, InsightDetail::NullLiteral {}),
            NodeKind::TemplateLiteral => {
                let expressions: Vec<Node<'_>> = node.children("expressions").collect();
                self.emit(
                    node,
                    InsightDetail::TemplateLiteral {
                        parts: template_parts(node),
                        expressions: expressions
                            .iter()
                            .map(|expr| describe(Some(*expr), 0))
                            .collect(),
                    },
                );
                for expr in expressions {
                    self.walk(expr);
                }
            }
            NodeKind::ImportDeclaration => self.import(node),
            NodeKind::ExportDeclaration
            | NodeKind::ExportNamedDeclaration
            | NodeKind::ExportDefaultDeclaration
            | NodeKind::ExportDefaultExpression
            | NodeKind::ExportAllDeclaration => self.export(node),
            NodeKind::ClassDeclaration | NodeKind::ClassExpression => self.class(node),
            NodeKind::MemberExpression | NodeKind::SuperPropExpression => {
                self.walk_opt(node.child("object").or_else(|| node.child("obj")));
                self.walk_computed(node.child("property"));
            }
            NodeKind::KeyValueProperty | NodeKind::ClassProperty | NodeKind::PrivateProperty => {
                self.walk_computed(node.child("key"));
                self.walk_opt(node.child("value"));
            }
            NodeKind::LabeledStatement => self.walk_opt(node.child("body")),
            // names declared here are types, not reads
            NodeKind::BreakStatement | NodeKind::ContinueStatement | NodeKind::TsDeclaration => {}
            NodeKind::VariableDeclarator
            | NodeKind::Module
            | NodeKind::Script
            | NodeKind::Other => {
                if node.kind() == NodeKind::Other {
                    trace!(kind = node.kind_name().unwrap_or("<untyped>"), "generic descent");
                }
                for child in node.child_nodes() {
                    self.walk(child);
                }
            }
        }
    }

    fn walk_opt(&mut self, node: Option<Node<'_>>) {
        if let Some(node) = node {
            self.walk(node);
        }
    }

    /// Property keys are names, not references, unless computed.
    fn walk_computed(&mut self, key: Option<Node<'_>>) {
        if let Some(key) = key.filter(|key| key.is("Computed")) {
            self.walk_opt(key.child("expression"));
        }
    }

    /// Write targets: only member expressions contain references to visit.
    fn walk_target(&mut self, target: Option<Node<'_>>) {
        if let Some(target) = target.filter(|t| {
            matches!(
                t.kind(),
                NodeKind::MemberExpression | NodeKind::SuperPropExpression
            )
        }) {
            self.walk(target);
        }
    }

    fn variable_declaration(&mut self, node: Node<'_>) {
        let declaration_kind = node.str("kind").map(str::to_string);
        for declarator in node.children("declarations") {
            let name = declarator.child("id").map(|id| match id.kind() {
                NodeKind::Identifier => id.ident().unwrap_or(UNKNOWN).to_string(),
                _ => name_of(Some(id)),
            });
            let init = declarator.child("init");
            let arrow = init.filter(|init| init.kind() == NodeKind::ArrowFunctionExpression);
            self.emit(
                node,
                InsightDetail::Variable {
                    name,
                    declaration_kind: declaration_kind.clone(),
                    init: init.map(|init| describe(Some(init), 0)),
                    params: arrow.map(param_names),
                    is_async: arrow.map(is_async),
                },
            );
            self.walk_opt(init);
        }
    }

    fn function(&mut self, node: Node<'_>) {
        let parts = function_parts(node);
        self.emit(
            node,
            InsightDetail::FunctionDefinition {
                name: parts.name.clone(),
                params: parts.params.iter().map(|param| name_of(*param)).collect(),
                is_async: is_async(parts.flags),
                is_generator: is_generator(parts.flags),
                metrics: metrics::measure_with_base(node, &self.lines, self.span_base),
            },
        );
        self.walk_computed(parts.computed_key);

        self.contexts.push(parts.name);
        for param in parts.params.into_iter().flatten() {
            self.walk_defaults(param);
        }
        self.walk_opt(parts.body);
        self.contexts.pop();
    }

    /// Visits default-value expressions nested in a binding pattern.
    fn walk_defaults(&mut self, pattern: Node<'_>) {
        match pattern.kind_name() {
            Some("Parameter") => self.walk_opt_defaults(pattern.child("pat")),
            Some("TsParameterProperty") => self.walk_opt_defaults(pattern.child("param")),
            Some("AssignmentPattern") => {
                self.walk_opt_defaults(pattern.child("left"));
                self.walk_opt(pattern.child("right"));
            }
            Some("RestElement") => self.walk_opt_defaults(pattern.child("argument")),
            Some("ArrayPattern") => {
                for element in pattern.children("elements") {
                    self.walk_defaults(element);
                }
            }
            Some("ObjectPattern") => {
                for property in pattern.children("properties") {
                    match property.kind_name() {
                        Some("AssignmentPatternProperty") => self.walk_opt(property.child("value")),
                        Some("KeyValuePatternProperty") => {
                            self.walk_computed(property.child("key"));
                            self.walk_opt_defaults(property.child("value"));
                        }
                        _ => self.walk_defaults(property),
                    }
                }
            }
            _ => {}
        }
    }

    fn walk_opt_defaults(&mut self, pattern: Option<Node<'_>>) {
        if let Some(pattern) = pattern {
            self.walk_defaults(pattern);
        }
    }

    fn call(&mut self, node: Node<'_>) {
        let callee = node.child("callee");
        let mut callee_text = callee_name(callee);
        if node.kind() == NodeKind::NewExpression {
            callee_text = format!("new {callee_text}");
        }
        let args: Vec<String> = node
            .elements("arguments")
            .map(|arg| describe_argument(arg, 0))
            .collect();
        self.emit(
            node,
            InsightDetail::FunctionCall {
                callee: callee_text,
                argument_count: args.len(),
                args,
            },
        );
        self.walk_opt(callee);
        for arg in node.children("arguments") {
            self.walk(arg);
        }
    }

    fn assignment(&mut self, node: Node<'_>) {
        let target = node.child("left");
        let left = match target {
            Some(target) if target.kind() == NodeKind::Identifier => {
                target.ident().unwrap_or(UNKNOWN).to_string()
            }
            Some(target)
                if matches!(
                    target.kind(),
                    NodeKind::MemberExpression | NodeKind::SuperPropExpression
                ) =>
            {
                callee_name(Some(target))
            }
            Some(target) if is_pattern(target) => name_of(Some(target)),
            other => describe(other, 0),
        };
        let right = node.child("right");
        self.emit(
            node,
            InsightDetail::Assignment {
                operator: node.str("operator").unwrap_or("=").to_string(),
                left,
                right: describe(right, 0),
            },
        );
        self.walk_target(target);
        self.walk_opt(right);
    }

    fn import(&mut self, node: Node<'_>) {
        let specifiers = node
            .children("specifiers")
            .filter_map(|specifier| {
                let local = specifier.child("local")?.ident()?.to_string();
                let binding = match specifier.kind_name()? {
                    "ImportDefaultSpecifier" => ImportBinding {
                        kind: ImportKind::Default,
                        local,
                        imported: None,
                    },
                    "ImportNamespaceSpecifier" => ImportBinding {
                        kind: ImportKind::Namespace,
                        local,
                        imported: None,
                    },
                    _ => ImportBinding {
                        kind: ImportKind::Named,
                        imported: Some(
                            specifier
                                .child("imported")
                                .and_then(|imported| imported.ident())
                                .map(str::to_string)
                                .unwrap_or_else(|| local.clone()),
                        ),
                        local,
                    },
                };
                Some(binding)
            })
            .collect();
        self.emit(
            node,
            InsightDetail::Import {
                source: module_source(node).unwrap_or(UNKNOWN).to_string(),
                specifiers,
            },
        );
    }

    fn export(&mut self, node: Node<'_>) {
        let (export_kind, names, inner) = match node.kind() {
            NodeKind::ExportDeclaration => {
                let declaration = node.child("declaration").or_else(|| node.child("decl"));
                (
                    ExportKind::Declaration,
                    declaration.map(declared_names).unwrap_or_default(),
                    declaration,
                )
            }
            NodeKind::ExportNamedDeclaration => {
                let names = node
                    .children("specifiers")
                    .filter_map(|specifier| {
                        let name = match specifier.kind_name()? {
                            "ExportNamespaceSpecifier" => specifier.child("name"),
                            "ExportDefaultSpecifier" => specifier.child("exported"),
                            _ => specifier
                                .child("exported")
                                .or_else(|| specifier.child("orig")),
                        };
                        name?.ident().map(str::to_string)
                    })
                    .collect();
                (ExportKind::Named, names, None)
            }
            NodeKind::ExportDefaultDeclaration => {
                let declaration = node.child("decl").or_else(|| node.child("declaration"));
                let name = declaration
                    .and_then(class_name)
                    .unwrap_or("default")
                    .to_string();
                (ExportKind::Default, vec![name], declaration)
            }
            NodeKind::ExportDefaultExpression => (
                ExportKind::DefaultExpression,
                vec!["default".to_string()],
                node.child("expression"),
            ),
            _ => (ExportKind::All, Vec::new(), None),
        };
        self.emit(
            node,
            InsightDetail::Export {
                export_kind,
                names,
                source: module_source(node).map(str::to_string),
            },
        );
        self.walk_opt(inner);
    }

    fn class(&mut self, node: Node<'_>) {
        let name = class_name(node).unwrap_or(ANONYMOUS).to_string();
        let super_class = node.child("superClass");
        let methods = node.children("body").filter_map(class_member).collect();
        self.emit(
            node,
            InsightDetail::Class {
                name: name.clone(),
                super_class: super_class.map(|parent| describe(Some(parent), 0)),
                methods,
            },
        );
        self.walk_opt(super_class);

        self.contexts.push(name);
        for member in node.children("body") {
            self.walk(member);
        }
        self.contexts.pop();
    }
}

fn function_parts(node: Node<'_>) -> FunctionParts<'_> {
    let computed_key = node.child("key").filter(|key| key.is("Computed"));
    let key_name = || property_name(node.child("key"), 0);
    match node.kind() {
        NodeKind::ClassMethod | NodeKind::PrivateMethod => {
            let function = node.child("function").unwrap_or(node);
            FunctionParts {
                name: key_name(),
                params: function.elements("params").collect(),
                body: function.child("body"),
                flags: function,
                computed_key,
            }
        }
        NodeKind::Constructor => FunctionParts {
            name: "constructor".to_string(),
            params: node.elements("params").collect(),
            body: node.child("body"),
            flags: node,
            computed_key: None,
        },
        NodeKind::MethodProperty => FunctionParts {
            name: key_name(),
            params: node.elements("params").collect(),
            body: node.child("body"),
            flags: node,
            computed_key,
        },
        NodeKind::GetterProperty => FunctionParts {
            name: key_name(),
            params: Vec::new(),
            body: node.child("body"),
            flags: node,
            computed_key,
        },
        NodeKind::SetterProperty => FunctionParts {
            name: key_name(),
            params: vec![node.child("param")],
            body: node.child("body"),
            flags: node,
            computed_key,
        },
        _ => FunctionParts {
            name: class_name(node).unwrap_or(ANONYMOUS).to_string(),
            params: node.elements("params").collect(),
            body: node.child("body"),
            flags: node,
            computed_key: None,
        },
    }
}

fn class_member(member: Node<'_>) -> Option<ClassMember> {
    match member.kind() {
        NodeKind::ClassMethod | NodeKind::PrivateMethod => {
            let function = member.child("function").unwrap_or(member);
            Some(ClassMember {
                name: property_name(member.child("key"), 0),
                kind: member.str("kind").unwrap_or("method").to_string(),
                is_static: member.flag("isStatic"),
                is_async: is_async(function),
                is_generator: is_generator(function),
            })
        }
        NodeKind::Constructor => Some(ClassMember {
            name: "constructor".to_string(),
            kind: "constructor".to_string(),
            is_static: false,
            is_async: false,
            is_generator: false,
        }),
        _ => None,
    }
}

/// Name a call site refers to: member chains joined with `.` down to their
/// root, calls unwrapped to the function they call.
pub fn callee_name(expr: Option<Node<'_>>) -> String {
    let Some(node) = expr else {
        return UNKNOWN.to_string();
    };
    match node.kind_name() {
        Some("Identifier") => node.ident().unwrap_or(UNKNOWN).to_string(),
        Some("ThisExpression") => "this".to_string(),
        Some("Super") => "super".to_string(),
        Some("Import") => "import".to_string(),
        Some("MemberExpression") => {
            let object = callee_name(node.child("object"));
            match node.child("property") {
                Some(property) if property.is("Computed") => {
                    format!("{object}{}", property_name(Some(property), 0))
                }
                property => format!("{object}.{}", property_name(property, 0)),
            }
        }
        Some("SuperPropExpression") => {
            format!("super.{}", property_name(node.child("property"), 0))
        }
        Some("CallExpression" | "NewExpression" | "OptionalCallExpression") => {
            callee_name(node.child("callee"))
        }
        Some("OptionalChainingExpression") => callee_name(node.child("base")),
        Some(
            "ParenthesisExpression"
            | "ParenthesizedExpression"
            | "TsNonNullExpression"
            | "TsAsExpression",
        ) => callee_name(node.child("expression")),
        _ => UNKNOWN.to_string(),
    }
}

fn module_source<'a>(node: Node<'a>) -> Option<&'a str> {
    node.child("source").and_then(|source| source.str("value"))
}

/// Names bound by a declaration appearing after `export`.
fn declared_names(declaration: Node<'_>) -> Vec<String> {
    match declaration.kind() {
        NodeKind::VariableDeclaration => declaration
            .children("declarations")
            .filter_map(|declarator| declarator.child("id"))
            .map(|id| match id.kind() {
                NodeKind::Identifier => id.ident().unwrap_or(UNKNOWN).to_string(),
                _ => name_of(Some(id)),
            })
            .collect(),
        _ => class_name(declaration)
            .map(|name| vec![name.to_string()])
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn ident(name: &str) -> Value {
        json!({"type": "Identifier", "value": name})
    }

    fn run(ast: &Value) -> Vec<Insight> {
        let mut extractor = Extractor::new("", &ExtractOptions::default());
        extractor.walk(Node::new(ast).unwrap());
        extractor.finish()
    }

    #[test]
    fn resolves_callee_chains() {
        let chain = json!({
            "type": "MemberExpression",
            "object": {
                "type": "CallExpression",
                "callee": {"type": "MemberExpression", "object": ident("a"), "property": ident("b")},
                "arguments": []
            },
            "property": ident("c")
        });
        assert_eq!(callee_name(Node::new(&chain)), "a.b.c");
        assert_eq!(callee_name(None), "unknown");
        assert_eq!(
            callee_name(Node::new(&json!({"type": "ArrowFunctionExpression"}))),
            "unknown"
        );
    }

    #[test]
    fn new_expressions_are_prefixed() {
        let ast = json!({"type": "NewExpression", "callee": ident("Map"), "arguments": null});
        let insights = run(&ast);
        match &insights[0].detail {
            InsightDetail::FunctionCall {
                callee,
                argument_count,
                ..
            } => {
                assert_eq!(callee, "new Map");
                assert_eq!(*argument_count, 0);
            }
            other => panic!("unexpected insight {other:?}"),
        }
    }

    #[test]
    fn scope_is_pushed_after_definition_and_popped_after_body() {
        let ast = json!({
            "type": "Module",
            "body": [
                {
                    "type": "FunctionDeclaration",
                    "identifier": ident("outer"),
                    "params": [],
                    "body": {"type": "BlockStatement", "stmts": [
                        {"type": "ReturnStatement", "argument": ident("x")}
                    ]}
                },
                {"type": "ExpressionStatement", "expression": ident("after")}
            ]
        });
        let insights = run(&ast);
        let contexts: Vec<(&str, &str, usize)> = insights
            .iter()
            .map(|i| (i.kind(), i.context.as_str(), i.scope_depth))
            .collect();
        assert_eq!(
            contexts,
            vec![
                ("FunctionDefinition", "global", 0),
                ("Return", "outer", 1),
                ("Identifier", "outer", 1),
                ("Identifier", "global", 0),
            ]
        );
    }

    #[test]
    fn method_keys_name_their_scopes() {
        let ast = json!({
            "type": "ClassDeclaration",
            "identifier": ident("Counter"),
            "superClass": ident("Base"),
            "body": [
                {"type": "Constructor", "key": ident("constructor"), "params": [], "body": {"type": "BlockStatement", "stmts": []}},
                {
                    "type": "ClassMethod",
                    "key": ident("tick"),
                    "kind": "method",
                    "isStatic": true,
                    "function": {"params": [], "body": {"type": "BlockStatement", "stmts": [
                        {"type": "ExpressionStatement", "expression": {"type": "ThisExpression"}}
                    ]}, "async": true}
                },
                {"type": "ClassProperty", "key": ident("count"), "value": {"type": "NumericLiteral", "value": 0.0}}
            ]
        });
        let insights = run(&ast);
        let summary: Vec<(&str, &str)> = insights
            .iter()
            .map(|i| (i.kind(), i.context.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("Class", "global"),
                ("Identifier", "global"),
                ("FunctionDefinition", "Counter"),
                ("FunctionDefinition", "Counter"),
                ("NumericLiteral", "Counter"),
            ]
        );
        let InsightDetail::Class {
            super_class,
            methods,
            ..
        } = &insights[0].detail
        else {
            panic!("expected class insight");
        };
        assert_eq!(super_class.as_deref(), Some("Base"));
        assert_eq!(methods.len(), 2);
        assert!(methods[1].is_static && methods[1].is_async);
        let InsightDetail::FunctionDefinition { metrics, .. } = &insights[3].detail else {
            panic!("expected method definition");
        };
        assert!(metrics.uses_self_reference);
    }

    #[test]
    fn property_names_are_not_references() {
        let ast = json!({
            "type": "MemberExpression",
            "object": ident("console"),
            "property": ident("log")
        });
        let names: Vec<String> = run(&ast)
            .iter()
            .filter_map(|i| match &i.detail {
                InsightDetail::Identifier { name } => Some(name.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(names, vec!["console"]);
    }
}
