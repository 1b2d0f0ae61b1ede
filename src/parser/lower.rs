//! Lowering of tree-sitter syntax trees into the SWC-style AST layout read by
//! [`crate::ast`].

use serde_json::{Value, json};
use tree_sitter::Node as SyntaxNode;

pub(crate) struct Lowerer<'s> {
    source: &'s str,
}

impl<'s> Lowerer<'s> {
    pub(crate) fn new(source: &'s str) -> Self {
        Self { source }
    }

    pub(crate) fn program(&self, root: SyntaxNode<'_>) -> Value {
        json!({
            "type": "Module",
            "span": span(root),
            "body": self.lower_all(named(root)),
            "interpreter": null,
        })
    }

    pub(crate) fn lower(&self, node: SyntaxNode<'_>) -> Value {
        let span = span(node);
        match node.kind() {
            "program" => self.program(node),
            "expression_statement" => json!({
                "type": "ExpressionStatement",
                "span": span,
                "expression": self.first(node),
            }),
            "statement_block" => json!({
                "type": "BlockStatement",
                "span": span,
                "stmts": self.lower_all(named(node)),
            }),
            "empty_statement" => json!({"type": "EmptyStatement", "span": span}),
            "lexical_declaration" => {
                let kind = node
                    .child_by_field_name("kind")
                    .map(|kind| self.text(kind))
                    .unwrap_or("let");
                self.variable_declaration(node, kind)
            }
            "variable_declaration" => self.variable_declaration(node, "var"),
            "function_declaration" | "generator_function_declaration" => {
                self.function(node, "FunctionDeclaration")
            }
            "function_expression" | "function" | "generator_function" => {
                self.function(node, "FunctionExpression")
            }
            "arrow_function" => self.arrow(node),
            "class_declaration" | "abstract_class_declaration" => {
                self.class(node, "ClassDeclaration")
            }
            "class" => self.class(node, "ClassExpression"),
            "if_statement" => json!({
                "type": "IfStatement",
                "span": span,
                "test": self.unparen(node.child_by_field_name("condition")),
                "consequent": self.field(node, "consequence"),
                "alternate": node
                    .child_by_field_name("alternative")
                    .map(|clause| self.first(clause))
                    .unwrap_or(Value::Null),
            }),
            "switch_statement" => self.switch(node),
            "for_statement" => self.for_statement(node),
            "for_in_statement" => self.for_in(node),
            "while_statement" => json!({
                "type": "WhileStatement",
                "span": span,
                "test": self.unparen(node.child_by_field_name("condition")),
                "body": self.field(node, "body"),
            }),
            "do_statement" => json!({
                "type": "DoWhileStatement",
                "span": span,
                "body": self.field(node, "body"),
                "test": self.unparen(node.child_by_field_name("condition")),
            }),
            "try_statement" => self.try_statement(node),
            "return_statement" => json!({
                "type": "ReturnStatement",
                "span": span,
                "argument": self.first(node),
            }),
            "throw_statement" => json!({
                "type": "ThrowStatement",
                "span": span,
                "argument": self.first(node),
            }),
            "labeled_statement" => json!({
                "type": "LabeledStatement",
                "span": span,
                "label": self.field(node, "label"),
                "body": self.field(node, "body"),
            }),
            "break_statement" | "continue_statement" => json!({
                "type": if node.kind() == "break_statement" { "BreakStatement" } else { "ContinueStatement" },
                "span": span,
                "label": self.field(node, "label"),
            }),
            "import_statement" => self.import(node),
            "export_statement" => self.export(node),
            "identifier"
            | "undefined"
            | "property_identifier"
            | "shorthand_property_identifier"
            | "shorthand_property_identifier_pattern"
            | "statement_identifier" => self.ident(node),
            "private_property_identifier" => self.private_name(node),
            "this" => json!({"type": "ThisExpression", "span": span}),
            "super" => json!({"type": "Super", "span": span}),
            "import" => json!({"type": "Import", "span": span}),
            "null" => json!({"type": "NullLiteral", "span": span}),
            "true" | "false" => json!({
                "type": "BooleanLiteral",
                "span": span,
                "value": node.kind() == "true",
            }),
            "number" => self.number(node),
            "string" => self.string(node),
            "template_string" => self.template(node),
            "regex" => json!({
                "type": "RegExpLiteral",
                "span": span,
                "pattern": node.child_by_field_name("pattern").map(|p| self.text(p)).unwrap_or(""),
                "flags": node.child_by_field_name("flags").map(|f| self.text(f)).unwrap_or(""),
            }),
            "array" => json!({
                "type": "ArrayExpression",
                "span": span,
                "elements": self.with_holes(node, |child| self.argument(child)),
            }),
            "object" => self.object(node),
            "call_expression" => self.call(node),
            "new_expression" => json!({
                "type": "NewExpression",
                "span": span,
                "callee": self.field(node, "constructor"),
                "arguments": node
                    .child_by_field_name("arguments")
                    .map(|args| Value::Array(self.arguments(args)))
                    .unwrap_or(Value::Null),
            }),
            "member_expression" => self.member(node),
            "subscript_expression" => {
                let index = node.child_by_field_name("index");
                json!({
                    "type": "MemberExpression",
                    "span": span,
                    "object": self.field(node, "object"),
                    "property": {
                        "type": "Computed",
                        "span": index.map(self::span).unwrap_or(Value::Null),
                        "expression": index.map(|index| self.lower(index)).unwrap_or(Value::Null),
                    },
                })
            }
            "assignment_expression" | "augmented_assignment_expression" => json!({
                "type": "AssignmentExpression",
                "span": span,
                "operator": node
                    .child_by_field_name("operator")
                    .map(|op| self.text(op))
                    .unwrap_or("="),
                "left": node
                    .child_by_field_name("left")
                    .map(|left| self.pattern(left))
                    .unwrap_or(Value::Null),
                "right": self.field(node, "right"),
            }),
            "binary_expression" => json!({
                "type": "BinaryExpression",
                "span": span,
                "operator": node.child_by_field_name("operator").map(|op| self.text(op)).unwrap_or(""),
                "left": self.field(node, "left"),
                "right": self.field(node, "right"),
            }),
            "unary_expression" => json!({
                "type": "UnaryExpression",
                "span": span,
                "operator": node.child_by_field_name("operator").map(|op| self.text(op)).unwrap_or(""),
                "argument": self.field(node, "argument"),
            }),
            "update_expression" => {
                let operator = node.child_by_field_name("operator");
                let argument = node.child_by_field_name("argument");
                let prefix = match (operator, argument) {
                    (Some(op), Some(arg)) => op.start_byte() < arg.start_byte(),
                    _ => false,
                };
                json!({
                    "type": "UpdateExpression",
                    "span": span,
                    "operator": operator.map(|op| self.text(op)).unwrap_or(""),
                    "prefix": prefix,
                    "argument": argument.map(|arg| self.lower(arg)).unwrap_or(Value::Null),
                })
            }
            "ternary_expression" => json!({
                "type": "ConditionalExpression",
                "span": span,
                "test": self.field(node, "condition"),
                "consequent": self.field(node, "consequence"),
                "alternate": self.field(node, "alternative"),
            }),
            "parenthesized_expression" => json!({
                "type": "ParenthesisExpression",
                "span": span,
                "expression": self.first(node),
            }),
            "sequence_expression" => {
                let mut expressions = Vec::new();
                self.flatten_sequence(node, &mut expressions);
                json!({"type": "SequenceExpression", "span": span, "expressions": expressions})
            }
            "await_expression" => json!({
                "type": "AwaitExpression",
                "span": span,
                "argument": self.first(node),
            }),
            "yield_expression" => json!({
                "type": "YieldExpression",
                "span": span,
                "argument": self.first(node),
                "delegate": has_token(node, "*"),
            }),
            "spread_element" => json!({
                "type": "SpreadElement",
                "span": span,
                "arguments": self.first(node),
            }),
            "meta_property" => json!({
                "type": "MetaProperty",
                "span": span,
                "kind": self.text(node),
            }),
            "as_expression" => self.ts_wrapper(node, "TsAsExpression"),
            "satisfies_expression" => self.ts_wrapper(node, "TsSatisfiesExpression"),
            "non_null_expression" => self.ts_wrapper(node, "TsNonNullExpression"),
            "type_assertion" => json!({
                "type": "TsTypeAssertion",
                "span": span,
                "expression": named(node)
                    .last()
                    .map(|expr| self.lower(*expr))
                    .unwrap_or(Value::Null),
            }),
            "interface_declaration" => self.ts_declaration(node, "TsInterfaceDeclaration"),
            "type_alias_declaration" => self.ts_declaration(node, "TsTypeAliasDeclaration"),
            "enum_declaration" => self.ts_declaration(node, "TsEnumDeclaration"),
            "object_pattern" | "array_pattern" | "assignment_pattern" | "rest_pattern" => {
                self.pattern(node)
            }
            _ => self.generic(node),
        }
    }

    /// Kinds without a dedicated shape keep their children so that the walk
    /// still reaches everything beneath them.
    fn generic(&self, node: SyntaxNode<'_>) -> Value {
        let kind = if node.is_error() {
            "Error".to_string()
        } else {
            pascal_case(node.kind())
        };
        json!({
            "type": kind,
            "span": span(node),
            "children": self.lower_all(named(node)),
        })
    }

    fn text(&self, node: SyntaxNode<'_>) -> &'s str {
        self.source
            .get(node.start_byte()..node.end_byte())
            .unwrap_or("")
    }

    fn lower_all(&self, nodes: Vec<SyntaxNode<'_>>) -> Vec<Value> {
        nodes.into_iter().map(|node| self.lower(node)).collect()
    }

    fn field(&self, node: SyntaxNode<'_>, name: &str) -> Value {
        node.child_by_field_name(name)
            .map(|child| self.lower(child))
            .unwrap_or(Value::Null)
    }

    fn first(&self, node: SyntaxNode<'_>) -> Value {
        named(node)
            .first()
            .map(|child| self.lower(*child))
            .unwrap_or(Value::Null)
    }

    fn unparen(&self, node: Option<SyntaxNode<'_>>) -> Value {
        match node {
            Some(node) if node.kind() == "parenthesized_expression" => self.first(node),
            Some(node) => self.lower(node),
            None => Value::Null,
        }
    }

    fn ident(&self, node: SyntaxNode<'_>) -> Value {
        json!({
            "type": "Identifier",
            "span": span(node),
            "value": self.text(node),
            "optional": false,
        })
    }

    fn private_name(&self, node: SyntaxNode<'_>) -> Value {
        json!({
            "type": "PrivateName",
            "span": span(node),
            "id": {
                "type": "Identifier",
                "span": span(node),
                "value": self.text(node).trim_start_matches('#'),
            },
        })
    }

    fn number(&self, node: SyntaxNode<'_>) -> Value {
        let raw = self.text(node);
        if let Some(digits) = raw.strip_suffix('n') {
            return json!({
                "type": "BigIntLiteral",
                "span": span(node),
                "value": digits.replace('_', ""),
                "raw": raw,
            });
        }
        json!({
            "type": "NumericLiteral",
            "span": span(node),
            "value": parse_number(raw),
            "raw": raw,
        })
    }

    fn string(&self, node: SyntaxNode<'_>) -> Value {
        let raw = self.text(node);
        let inner = raw.get(1..raw.len().saturating_sub(1)).unwrap_or("");
        json!({
            "type": "StringLiteral",
            "span": span(node),
            "value": unescape(inner),
            "raw": raw,
        })
    }

    fn module_export_name(&self, node: SyntaxNode<'_>) -> Value {
        if node.kind() == "string" {
            self.string(node)
        } else {
            self.ident(node)
        }
    }

    fn template(&self, node: SyntaxNode<'_>) -> Value {
        let mut quasis = Vec::new();
        let mut expressions = Vec::new();
        let mut cursor = node.start_byte() + 1;
        for substitution in named(node)
            .into_iter()
            .filter(|child| child.kind() == "template_substitution")
        {
            quasis.push(self.quasi(cursor, substitution.start_byte(), false));
            expressions.push(self.first(substitution));
            cursor = substitution.end_byte();
        }
        let end = node.end_byte().saturating_sub(1).max(cursor);
        quasis.push(self.quasi(cursor, end, true));
        json!({
            "type": "TemplateLiteral",
            "span": span(node),
            "expressions": expressions,
            "quasis": quasis,
        })
    }

    fn quasi(&self, start: usize, end: usize, tail: bool) -> Value {
        let raw = self.source.get(start..end).unwrap_or("");
        json!({
            "type": "TemplateElement",
            "span": {"start": start, "end": end},
            "tail": tail,
            "raw": raw,
            "cooked": unescape(raw),
        })
    }

    /// Comma-separated lists where an empty slot is a hole (`[a, , b]`).
    fn with_holes(
        &self,
        node: SyntaxNode<'_>,
        lower: impl Fn(SyntaxNode<'_>) -> Value,
    ) -> Vec<Value> {
        let mut items = Vec::new();
        let mut pending: Option<Value> = None;
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if is_comment(child) {
                continue;
            }
            if child.is_named() {
                pending = Some(lower(child));
            } else if child.kind() == "," {
                items.push(pending.take().unwrap_or(Value::Null));
            }
        }
        if let Some(last) = pending {
            items.push(last);
        }
        items
    }

    /// Argument wrapper carrying the spread marker.
    fn argument(&self, node: SyntaxNode<'_>) -> Value {
        if node.kind() == "spread_element" {
            json!({"spread": span(node), "expression": self.first(node)})
        } else {
            json!({"spread": null, "expression": self.lower(node)})
        }
    }

    fn arguments(&self, node: SyntaxNode<'_>) -> Vec<Value> {
        named(node)
            .into_iter()
            .map(|arg| self.argument(arg))
            .collect()
    }

    fn flatten_sequence(&self, node: SyntaxNode<'_>, out: &mut Vec<Value>) {
        for child in named(node) {
            if child.kind() == "sequence_expression" {
                self.flatten_sequence(child, out);
            } else {
                out.push(self.lower(child));
            }
        }
    }

    fn ts_wrapper(&self, node: SyntaxNode<'_>, kind: &str) -> Value {
        json!({"type": kind, "span": span(node), "expression": self.first(node)})
    }

    fn ts_declaration(&self, node: SyntaxNode<'_>, kind: &str) -> Value {
        json!({
            "type": kind,
            "span": span(node),
            "id": node
                .child_by_field_name("name")
                .map(|name| self.ident(name))
                .unwrap_or(Value::Null),
        })
    }

    fn variable_declaration(&self, node: SyntaxNode<'_>, kind: &str) -> Value {
        let declarations: Vec<Value> = named(node)
            .into_iter()
            .filter(|child| child.kind() == "variable_declarator")
            .map(|declarator| {
                json!({
                    "type": "VariableDeclarator",
                    "span": span(declarator),
                    "id": declarator
                        .child_by_field_name("name")
                        .map(|name| self.pattern(name))
                        .unwrap_or(Value::Null),
                    "init": self.field(declarator, "value"),
                    "definite": false,
                })
            })
            .collect();
        json!({
            "type": "VariableDeclaration",
            "span": span(node),
            "kind": kind,
            "declare": false,
            "declarations": declarations,
        })
    }

    fn function(&self, node: SyntaxNode<'_>, kind: &str) -> Value {
        json!({
            "type": kind,
            "span": span(node),
            "identifier": self.field(node, "name"),
            "params": self.params(node.child_by_field_name("parameters"), true),
            "body": self.field(node, "body"),
            "async": has_token(node, "async"),
            "generator": has_token(node, "*"),
        })
    }

    fn arrow(&self, node: SyntaxNode<'_>) -> Value {
        let params = match node.child_by_field_name("parameter") {
            Some(param) => vec![self.pattern(param)],
            None => self.params(node.child_by_field_name("parameters"), false),
        };
        json!({
            "type": "ArrowFunctionExpression",
            "span": span(node),
            "params": params,
            "body": self.field(node, "body"),
            "async": has_token(node, "async"),
            "generator": false,
        })
    }

    /// Function parameters; `wrap` produces `Parameter { pat }` records,
    /// arrows take bare patterns.
    fn params(&self, list: Option<SyntaxNode<'_>>, wrap: bool) -> Vec<Value> {
        let Some(list) = list else {
            return Vec::new();
        };
        named(list)
            .into_iter()
            .filter(|param| param.kind() != "decorator")
            .map(|param| {
                let pat = self.parameter_pattern(param);
                if wrap {
                    json!({"type": "Parameter", "span": span(param), "pat": pat})
                } else {
                    pat
                }
            })
            .collect()
    }

    fn parameter_pattern(&self, param: SyntaxNode<'_>) -> Value {
        match param.kind() {
            "required_parameter" | "optional_parameter" => {
                let pattern = param
                    .child_by_field_name("pattern")
                    .map(|pattern| self.pattern(pattern))
                    .unwrap_or(Value::Null);
                match param.child_by_field_name("value") {
                    Some(value) => json!({
                        "type": "AssignmentPattern",
                        "span": span(param),
                        "left": pattern,
                        "right": self.lower(value),
                    }),
                    None => pattern,
                }
            }
            _ => self.pattern(param),
        }
    }

    fn pattern(&self, node: SyntaxNode<'_>) -> Value {
        match node.kind() {
            "identifier" | "shorthand_property_identifier_pattern" | "undefined" => {
                self.ident(node)
            }
            "assignment_pattern" => json!({
                "type": "AssignmentPattern",
                "span": span(node),
                "left": node
                    .child_by_field_name("left")
                    .map(|left| self.pattern(left))
                    .unwrap_or(Value::Null),
                "right": self.field(node, "right"),
            }),
            "rest_pattern" => json!({
                "type": "RestElement",
                "span": span(node),
                "argument": named(node)
                    .first()
                    .map(|inner| self.pattern(*inner))
                    .unwrap_or(Value::Null),
            }),
            "array_pattern" => json!({
                "type": "ArrayPattern",
                "span": span(node),
                "elements": self.with_holes(node, |child| self.pattern(child)),
            }),
            "object_pattern" => json!({
                "type": "ObjectPattern",
                "span": span(node),
                "properties": named(node)
                    .into_iter()
                    .map(|property| self.object_pattern_property(property))
                    .collect::<Vec<_>>(),
            }),
            "required_parameter" | "optional_parameter" => self.parameter_pattern(node),
            _ => self.lower(node),
        }
    }

    fn object_pattern_property(&self, property: SyntaxNode<'_>) -> Value {
        match property.kind() {
            "pair_pattern" => json!({
                "type": "KeyValuePatternProperty",
                "key": property
                    .child_by_field_name("key")
                    .map(|key| self.property_key(key))
                    .unwrap_or(Value::Null),
                "value": property
                    .child_by_field_name("value")
                    .map(|value| self.pattern(value))
                    .unwrap_or(Value::Null),
            }),
            "shorthand_property_identifier_pattern" => json!({
                "type": "AssignmentPatternProperty",
                "span": span(property),
                "key": self.ident(property),
                "value": null,
            }),
            "object_assignment_pattern" => {
                let left = property.child_by_field_name("left");
                match left {
                    Some(left) if left.kind() == "shorthand_property_identifier_pattern" => json!({
                        "type": "AssignmentPatternProperty",
                        "span": span(property),
                        "key": self.ident(left),
                        "value": self.field(property, "right"),
                    }),
                    _ => json!({
                        "type": "AssignmentPattern",
                        "span": span(property),
                        "left": left.map(|left| self.pattern(left)).unwrap_or(Value::Null),
                        "right": self.field(property, "right"),
                    }),
                }
            }
            _ => self.pattern(property),
        }
    }

    fn property_key(&self, node: SyntaxNode<'_>) -> Value {
        match node.kind() {
            "property_identifier" | "identifier" | "shorthand_property_identifier" => {
                self.ident(node)
            }
            "private_property_identifier" => self.private_name(node),
            "string" => self.string(node),
            "number" => self.number(node),
            "computed_property_name" => json!({
                "type": "Computed",
                "span": span(node),
                "expression": self.first(node),
            }),
            _ => self.lower(node),
        }
    }

    fn object(&self, node: SyntaxNode<'_>) -> Value {
        let properties: Vec<Value> = named(node)
            .into_iter()
            .map(|property| match property.kind() {
                "pair" => json!({
                    "type": "KeyValueProperty",
                    "key": property
                        .child_by_field_name("key")
                        .map(|key| self.property_key(key))
                        .unwrap_or(Value::Null),
                    "value": self.field(property, "value"),
                }),
                "shorthand_property_identifier" => self.ident(property),
                "spread_element" => json!({
                    "type": "SpreadElement",
                    "spread": span(property),
                    "arguments": self.first(property),
                }),
                "method_definition" => self.method(property, false),
                _ => self.lower(property),
            })
            .collect();
        json!({"type": "ObjectExpression", "span": span(node), "properties": properties})
    }

    fn call(&self, node: SyntaxNode<'_>) -> Value {
        let arguments = node.child_by_field_name("arguments");
        if let Some(template) = arguments.filter(|args| args.kind() == "template_string") {
            return json!({
                "type": "TaggedTemplateExpression",
                "span": span(node),
                "tag": self.field(node, "function"),
                "template": self.template(template),
            });
        }
        json!({
            "type": "CallExpression",
            "span": span(node),
            "callee": self.field(node, "function"),
            "arguments": arguments.map(|args| self.arguments(args)).unwrap_or_default(),
        })
    }

    fn member(&self, node: SyntaxNode<'_>) -> Value {
        let object = node.child_by_field_name("object");
        let property = node
            .child_by_field_name("property")
            .map(|property| self.property_key(property))
            .unwrap_or(Value::Null);
        match object {
            Some(object) if object.kind() == "super" => json!({
                "type": "SuperPropExpression",
                "span": span(node),
                "obj": {"type": "Super", "span": span(object)},
                "property": property,
            }),
            _ => json!({
                "type": "MemberExpression",
                "span": span(node),
                "object": object.map(|object| self.lower(object)).unwrap_or(Value::Null),
                "property": property,
            }),
        }
    }

    fn class(&self, node: SyntaxNode<'_>, kind: &str) -> Value {
        let super_class = named(node)
            .into_iter()
            .find(|child| child.kind() == "class_heritage")
            .and_then(|heritage| named(heritage).first().copied())
            .and_then(|clause| match clause.kind() {
                "extends_clause" => clause
                    .child_by_field_name("value")
                    .or_else(|| named(clause).first().copied()),
                "implements_clause" => None,
                _ => Some(clause),
            })
            .map(|parent| self.lower(parent))
            .unwrap_or(Value::Null);
        let members: Vec<Value> = node
            .child_by_field_name("body")
            .map(|body| {
                named(body)
                    .into_iter()
                    .filter_map(|member| self.class_member(member))
                    .collect()
            })
            .unwrap_or_default();
        json!({
            "type": kind,
            "span": span(node),
            "identifier": self.field(node, "name"),
            "superClass": super_class,
            "body": members,
        })
    }

    fn class_member(&self, member: SyntaxNode<'_>) -> Option<Value> {
        let lowered = match member.kind() {
            "method_definition" => self.method(member, true),
            "field_definition" | "public_field_definition" => {
                let key = member
                    .child_by_field_name("property")
                    .or_else(|| member.child_by_field_name("name"));
                let private = key.is_some_and(|key| key.kind() == "private_property_identifier");
                json!({
                    "type": if private { "PrivateProperty" } else { "ClassProperty" },
                    "span": span(member),
                    "key": key.map(|key| self.property_key(key)).unwrap_or(Value::Null),
                    "value": self.field(member, "value"),
                    "isStatic": has_token(member, "static"),
                })
            }
            "class_static_block" => json!({
                "type": "StaticBlock",
                "span": span(member),
                "body": self.field(member, "body"),
            }),
            "decorator" => return None,
            _ => self.lower(member),
        };
        Some(lowered)
    }

    fn method(&self, node: SyntaxNode<'_>, in_class: bool) -> Value {
        let name = node.child_by_field_name("name");
        let modifiers = Modifiers::read(node, name);
        let key = name
            .map(|name| self.property_key(name))
            .unwrap_or(Value::Null);
        let parameters = node.child_by_field_name("parameters");
        let body = self.field(node, "body");

        if !in_class {
            return match modifiers.accessor {
                Some("getter") => json!({
                    "type": "GetterProperty",
                    "span": span(node),
                    "key": key,
                    "body": body,
                }),
                Some(_) => json!({
                    "type": "SetterProperty",
                    "span": span(node),
                    "key": key,
                    "param": parameters
                        .and_then(|list| named(list).first().copied())
                        .map(|param| self.parameter_pattern(param))
                        .unwrap_or(Value::Null),
                    "body": body,
                }),
                None => json!({
                    "type": "MethodProperty",
                    "span": span(node),
                    "key": key,
                    "params": self.params(parameters, true),
                    "body": body,
                    "async": modifiers.is_async,
                    "generator": modifiers.is_generator,
                }),
            };
        }

        let is_constructor = name.is_some_and(|name| {
            let text = self.text(name);
            text == "constructor" || text == "\"constructor\""
        });
        if is_constructor && !modifiers.is_static {
            return json!({
                "type": "Constructor",
                "span": span(node),
                "key": key,
                "params": self.params(parameters, true),
                "body": body,
            });
        }
        let private = name.is_some_and(|name| name.kind() == "private_property_identifier");
        json!({
            "type": if private { "PrivateMethod" } else { "ClassMethod" },
            "span": span(node),
            "key": key,
            "function": {
                "span": span(node),
                "params": self.params(parameters, true),
                "body": body,
                "async": modifiers.is_async,
                "generator": modifiers.is_generator,
            },
            "kind": modifiers.accessor.unwrap_or("method"),
            "isStatic": modifiers.is_static,
        })
    }

    fn switch(&self, node: SyntaxNode<'_>) -> Value {
        let cases: Vec<Value> = node
            .child_by_field_name("body")
            .map(|body| {
                named(body)
                    .into_iter()
                    .map(|case| {
                        let test = case.child_by_field_name("value");
                        let consequent: Vec<Value> = named(case)
                            .into_iter()
                            .filter(|stmt| Some(stmt.id()) != test.map(|test| test.id()))
                            .map(|stmt| self.lower(stmt))
                            .collect();
                        json!({
                            "type": "SwitchCase",
                            "span": span(case),
                            "test": test.map(|test| self.lower(test)).unwrap_or(Value::Null),
                            "consequent": consequent,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();
        json!({
            "type": "SwitchStatement",
            "span": span(node),
            "discriminant": self.unparen(node.child_by_field_name("value")),
            "cases": cases,
        })
    }

    fn for_statement(&self, node: SyntaxNode<'_>) -> Value {
        let clause = |name: &str| match node.child_by_field_name(name) {
            Some(part) if part.kind() == "empty_statement" => Value::Null,
            Some(part) if part.kind() == "expression_statement" => self.first(part),
            Some(part) => self.lower(part),
            None => Value::Null,
        };
        json!({
            "type": "ForStatement",
            "span": span(node),
            "init": clause("initializer"),
            "test": clause("condition"),
            "update": clause("increment"),
            "body": self.field(node, "body"),
        })
    }

    fn for_in(&self, node: SyntaxNode<'_>) -> Value {
        let left = node.child_by_field_name("left");
        let left = match (node.child_by_field_name("kind"), left) {
            (Some(kind), Some(left)) => json!({
                "type": "VariableDeclaration",
                "span": span(left),
                "kind": self.text(kind),
                "declare": false,
                "declarations": [{
                    "type": "VariableDeclarator",
                    "span": span(left),
                    "id": self.pattern(left),
                    "init": null,
                    "definite": false,
                }],
            }),
            (None, Some(left)) => self.pattern(left),
            (_, None) => Value::Null,
        };
        let is_of = node
            .child_by_field_name("operator")
            .is_some_and(|op| self.text(op) == "of");
        json!({
            "type": if is_of { "ForOfStatement" } else { "ForInStatement" },
            "span": span(node),
            "isAwait": has_token(node, "await"),
            "left": left,
            "right": self.field(node, "right"),
            "body": self.field(node, "body"),
        })
    }

    fn try_statement(&self, node: SyntaxNode<'_>) -> Value {
        let handler = node
            .child_by_field_name("handler")
            .map(|clause| {
                json!({
                    "type": "CatchClause",
                    "span": span(clause),
                    "param": clause
                        .child_by_field_name("parameter")
                        .map(|param| self.pattern(param))
                        .unwrap_or(Value::Null),
                    "body": self.field(clause, "body"),
                })
            })
            .unwrap_or(Value::Null);
        let finalizer = node
            .child_by_field_name("finalizer")
            .map(|clause| self.field(clause, "body"))
            .unwrap_or(Value::Null);
        json!({
            "type": "TryStatement",
            "span": span(node),
            "block": self.field(node, "body"),
            "handler": handler,
            "finalizer": finalizer,
        })
    }

    fn import(&self, node: SyntaxNode<'_>) -> Value {
        let mut specifiers = Vec::new();
        let clause = named(node)
            .into_iter()
            .find(|child| child.kind() == "import_clause");
        for part in clause.map(named).unwrap_or_default() {
            match part.kind() {
                "identifier" => specifiers.push(json!({
                    "type": "ImportDefaultSpecifier",
                    "span": span(part),
                    "local": self.ident(part),
                })),
                "namespace_import" => specifiers.push(json!({
                    "type": "ImportNamespaceSpecifier",
                    "span": span(part),
                    "local": self.first(part),
                })),
                "named_imports" => {
                    for specifier in named(part)
                        .into_iter()
                        .filter(|child| child.kind() == "import_specifier")
                    {
                        let name = specifier.child_by_field_name("name");
                        let alias = specifier.child_by_field_name("alias");
                        let local = alias.or(name);
                        specifiers.push(json!({
                            "type": "ImportSpecifier",
                            "span": span(specifier),
                            "local": local.map(|local| self.ident(local)).unwrap_or(Value::Null),
                            "imported": match (alias, name) {
                                (Some(_), Some(name)) => self.module_export_name(name),
                                _ => Value::Null,
                            },
                            "isTypeOnly": has_token(specifier, "type"),
                        }));
                    }
                }
                _ => {}
            }
        }
        json!({
            "type": "ImportDeclaration",
            "span": span(node),
            "specifiers": specifiers,
            "source": self.field(node, "source"),
            "typeOnly": has_token(node, "type"),
        })
    }

    fn export(&self, node: SyntaxNode<'_>) -> Value {
        let source = self.field(node, "source");
        let is_default = has_token(node, "default");

        if let Some(declaration) = node.child_by_field_name("declaration") {
            let lowered = self.lower(declaration);
            if is_default {
                return json!({
                    "type": "ExportDefaultDeclaration",
                    "span": span(node),
                    "decl": as_expression_form(lowered),
                });
            }
            return json!({
                "type": "ExportDeclaration",
                "span": span(node),
                "declaration": lowered,
            });
        }

        if let Some(value) = node.child_by_field_name("value") {
            return match value.kind() {
                "function_expression" | "function" | "generator_function" | "class" => json!({
                    "type": "ExportDefaultDeclaration",
                    "span": span(node),
                    "decl": self.lower(value),
                }),
                _ => json!({
                    "type": "ExportDefaultExpression",
                    "span": span(node),
                    "expression": self.lower(value),
                }),
            };
        }

        let children = named(node);
        if let Some(namespace) = children.iter().find(|c| c.kind() == "namespace_export") {
            let name = named(*namespace)
                .first()
                .map(|name| self.module_export_name(*name))
                .unwrap_or(Value::Null);
            return json!({
                "type": "ExportNamedDeclaration",
                "span": span(node),
                "specifiers": [{
                    "type": "ExportNamespaceSpecifier",
                    "span": span(*namespace),
                    "name": name,
                }],
                "source": source,
            });
        }

        if let Some(clause) = children.iter().find(|c| c.kind() == "export_clause") {
            let specifiers: Vec<Value> = named(*clause)
                .into_iter()
                .filter(|child| child.kind() == "export_specifier")
                .map(|specifier| {
                    json!({
                        "type": "ExportSpecifier",
                        "span": span(specifier),
                        "orig": specifier
                            .child_by_field_name("name")
                            .map(|name| self.module_export_name(name))
                            .unwrap_or(Value::Null),
                        "exported": specifier
                            .child_by_field_name("alias")
                            .map(|alias| self.module_export_name(alias))
                            .unwrap_or(Value::Null),
                    })
                })
                .collect();
            return json!({
                "type": "ExportNamedDeclaration",
                "span": span(node),
                "specifiers": specifiers,
                "source": source,
            });
        }

        json!({
            "type": "ExportAllDeclaration",
            "span": span(node),
            "source": source,
        })
    }
}

/// Leading keywords of a method definition.
#[derive(Default)]
struct Modifiers {
    is_static: bool,
    is_async: bool,
    is_generator: bool,
    accessor: Option<&'static str>,
}

impl Modifiers {
    fn read(node: SyntaxNode<'_>, name: Option<SyntaxNode<'_>>) -> Self {
        let mut modifiers = Modifiers::default();
        let stop = name.map(|name| name.id());
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if Some(child.id()) == stop {
                break;
            }
            match child.kind() {
                "static" => modifiers.is_static = true,
                "static get" => {
                    modifiers.is_static = true;
                    modifiers.accessor = Some("getter");
                }
                "async" => modifiers.is_async = true,
                "*" => modifiers.is_generator = true,
                "get" => modifiers.accessor = Some("getter"),
                "set" => modifiers.accessor = Some("setter"),
                _ => {}
            }
        }
        modifiers
    }
}

fn span(node: SyntaxNode<'_>) -> Value {
    json!({"start": node.start_byte(), "end": node.end_byte()})
}

fn is_comment(node: SyntaxNode<'_>) -> bool {
    matches!(node.kind(), "comment" | "html_comment")
}

fn named(node: SyntaxNode<'_>) -> Vec<SyntaxNode<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| !is_comment(*child))
        .collect()
}

fn has_token(node: SyntaxNode<'_>, token: &str) -> bool {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .any(|child| !child.is_named() && child.kind() == token)
}

/// `export default function f() {}` holds an expression, not a declaration.
fn as_expression_form(mut declaration: Value) -> Value {
    if let Some(fields) = declaration.as_object_mut() {
        let renamed = match fields.get("type").and_then(Value::as_str) {
            Some("FunctionDeclaration") => Some("FunctionExpression"),
            Some("ClassDeclaration") => Some("ClassExpression"),
            _ => None,
        };
        if let Some(kind) = renamed {
            fields.insert("type".to_string(), Value::String(kind.to_string()));
        }
    }
    declaration
}

fn pascal_case(kind: &str) -> String {
    kind.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// Numeric value of a JavaScript number literal.
pub(crate) fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| *c != '_')
        .collect::<String>()
        .to_ascii_lowercase();
    let radix = |digits: &str, radix: u32| u128::from_str_radix(digits, radix).ok().map(|v| v as f64);
    if let Some(digits) = cleaned.strip_prefix("0x") {
        return radix(digits, 16);
    }
    if let Some(digits) = cleaned.strip_prefix("0o") {
        return radix(digits, 8);
    }
    if let Some(digits) = cleaned.strip_prefix("0b") {
        return radix(digits, 2);
    }
    let legacy_octal = cleaned.len() > 1
        && cleaned.starts_with('0')
        && cleaned.chars().all(|c| ('0'..='7').contains(&c));
    if legacy_octal {
        return radix(&cleaned[1..], 8);
    }
    cleaned.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Decodes the escape sequences of a string or template body.
pub(crate) fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(escaped) = chars.next() else {
            break;
        };
        match escaped {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            '0' if !chars.peek().is_some_and(char::is_ascii_digit) => out.push('\0'),
            'x' => {
                let hex: String = chars.by_ref().take(2).collect();
                push_code_point(&mut out, u32::from_str_radix(&hex, 16).ok());
            }
            'u' => {
                let code = if chars.peek() == Some(&'{') {
                    chars.next();
                    let hex: String = chars.by_ref().take_while(|c| *c != '}').collect();
                    u32::from_str_radix(&hex, 16).ok()
                } else {
                    let hex: String = chars.by_ref().take(4).collect();
                    u32::from_str_radix(&hex, 16).ok()
                };
                let code = match code {
                    Some(high @ 0xD800..=0xDBFF) => {
                        let mut lookahead = chars.clone();
                        let low = if lookahead.next() == Some('\\') && lookahead.next() == Some('u')
                        {
                            let hex: String = lookahead.by_ref().take(4).collect();
                            u32::from_str_radix(&hex, 16)
                                .ok()
                                .filter(|low| (0xDC00..=0xDFFF).contains(low))
                        } else {
                            None
                        };
                        match low {
                            Some(low) => {
                                chars = lookahead;
                                Some(0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00))
                            }
                            None => Some(high),
                        }
                    }
                    other => other,
                };
                push_code_point(&mut out, code);
            }
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            '\n' | '\u{2028}' | '\u{2029}' => {}
            other => out.push(other),
        }
    }
    out
}

fn push_code_point(out: &mut String, code: Option<u32>) {
    out.push(
        code.and_then(char::from_u32)
            .unwrap_or(char::REPLACEMENT_CHARACTER),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_number_literals() {
        assert_eq!(parse_number("42"), Some(42.0));
        assert_eq!(parse_number("1_000"), Some(1000.0));
        assert_eq!(parse_number("0xff"), Some(255.0));
        assert_eq!(parse_number("0o17"), Some(15.0));
        assert_eq!(parse_number("0b101"), Some(5.0));
        assert_eq!(parse_number("017"), Some(15.0));
        assert_eq!(parse_number("1.5e3"), Some(1500.0));
        assert_eq!(parse_number(".5"), Some(0.5));
        assert_eq!(parse_number("1e400"), None);
    }

    #[test]
    fn unescapes_string_bodies() {
        assert_eq!(unescape(r"a\nb"), "a\nb");
        assert_eq!(unescape(r#"say \"hi\""#), "say \"hi\"");
        assert_eq!(unescape(r"\x41B\u{43}"), "ABC");
        assert_eq!(unescape(r"\uD83D\uDE00!"), "\u{1F600}!");
        assert_eq!(unescape("line\\\ncontinued"), "linecontinued");
        assert_eq!(unescape(r"\q"), "q");
    }

    #[test]
    fn pascal_cases_kinds() {
        assert_eq!(pascal_case("jsx_element"), "JsxElement");
        assert_eq!(pascal_case("debugger_statement"), "DebuggerStatement");
    }
}
