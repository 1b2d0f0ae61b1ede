//! Short, bounded renderings of expression subtrees.

use crate::ast::Node;
use crate::indexer::pattern::name_of;
use crate::model::format_number;

/// Deepest level at which compound expressions are still expanded.
pub const MAX_DEPTH: usize = 2;

pub const ELLIPSIS: &str = "…";
const UNKNOWN: &str = "unknown";
const OBJECT_KEYS_SHOWN: usize = 3;

/// Renders `expr` at nesting level `depth`.
///
/// Compound shapes below [`MAX_DEPTH`] collapse to `…`; names and literals
/// render at any depth. Kinds without a rendering fall back to their kind
/// name, a missing node to `unknown`.
pub fn describe(expr: Option<Node<'_>>, depth: usize) -> String {
    let Some(node) = expr else {
        return UNKNOWN.to_string();
    };
    let Some(kind) = node.kind_name() else {
        // argument wrappers and other untyped records
        return match node.child("expression") {
            Some(_) => describe_argument(Some(node), depth),
            None => UNKNOWN.to_string(),
        };
    };

    if let Some(atom) = describe_atom(node, kind) {
        return atom;
    }
    if depth > MAX_DEPTH {
        return ELLIPSIS.to_string();
    }

    let next = depth + 1;
    match kind {
        "TemplateLiteral" | "Tpl" => format!("`{}`", template_parts(node).join("${…}")),
        "TaggedTemplateExpression" => {
            let template = node.child("template").or_else(|| node.child("tpl"));
            format!(
                "{}{}",
                describe(node.child("tag"), next),
                describe(template, next)
            )
        }
        "ArrayExpression" | "ArrayLiteral" => {
            format!("Array({})", node.list("elements").len())
        }
        "ObjectExpression" | "ObjectLiteral" => describe_object(node, next),
        "MemberExpression" => {
            let object = describe(node.child("object"), next);
            match node.child("property") {
                Some(property) if property.is("Computed") => {
                    format!("{object}{}", property_name(Some(property), depth))
                }
                property => format!("{object}.{}", property_name(property, depth)),
            }
        }
        "SuperPropExpression" => {
            format!("super.{}", property_name(node.child("property"), depth))
        }
        "OptionalChainingExpression" => describe(node.child("base"), depth),
        "CallExpression" | "OptionalCallExpression" => {
            format!(
                "{}({})",
                describe(node.child("callee"), next),
                describe_arguments(node, next)
            )
        }
        "NewExpression" => {
            format!(
                "new {}({})",
                describe(node.child("callee"), next),
                describe_arguments(node, next)
            )
        }
        "ArrowFunctionExpression" => {
            let prefix = if is_async(node) { "async " } else { "" };
            format!("{prefix}({}) => {ELLIPSIS}", param_names(node).join(", "))
        }
        "FunctionExpression" => {
            let prefix = if is_async(node) { "async " } else { "" };
            let name = node
                .child("identifier")
                .or_else(|| node.child("id"))
                .and_then(|id| id.ident())
                .map(|name| format!(" {name}"))
                .unwrap_or_default();
            format!(
                "{prefix}function{name}({}) {{{ELLIPSIS}}}",
                param_names(node).join(", ")
            )
        }
        "ClassExpression" => match class_name(node) {
            Some(name) => format!("class {name}"),
            None => "class".to_string(),
        },
        "UnaryExpression" => {
            let operator = node.str("operator").unwrap_or("");
            let argument = describe(node.child("argument"), next);
            if operator.chars().all(|c| c.is_ascii_alphabetic()) && !operator.is_empty() {
                format!("{operator} {argument}")
            } else {
                format!("{operator}{argument}")
            }
        }
        "UpdateExpression" => {
            let operator = node.str("operator").unwrap_or("");
            let argument = describe(node.child("argument"), next);
            if node.flag("prefix") {
                format!("{operator}{argument}")
            } else {
                format!("{argument}{operator}")
            }
        }
        "BinaryExpression" | "LogicalExpression" | "AssignmentExpression" => {
            format!(
                "{} {} {}",
                describe_target(node.child("left"), next),
                node.str("operator").unwrap_or("?"),
                describe(node.child("right"), next)
            )
        }
        "ConditionalExpression" => format!(
            "{} ? {} : {}",
            describe(node.child("test"), next),
            describe(node.child("consequent"), next),
            describe(node.child("alternate"), next)
        ),
        "ParenthesisExpression" | "ParenthesizedExpression" => {
            format!("({})", describe(node.child("expression"), depth))
        }
        "SequenceExpression" => node
            .children("expressions")
            .map(|expr| describe(Some(expr), next))
            .collect::<Vec<_>>()
            .join(", "),
        "AwaitExpression" => format!("await {}", describe(node.child("argument"), next)),
        "YieldExpression" => {
            let keyword = if node.flag("delegate") { "yield*" } else { "yield" };
            match node.child("argument") {
                Some(argument) => format!("{keyword} {}", describe(Some(argument), next)),
                None => keyword.to_string(),
            }
        }
        "SpreadElement" => format!("...{}", describe(node.child("arguments"), next)),
        "TsAsExpression" | "TsNonNullExpression" | "TsSatisfiesExpression"
        | "TsTypeAssertion" | "TsConstAssertion" => describe(node.child("expression"), depth),
        other => other.to_string(),
    }
}

/// Renders one call argument, honoring the spread marker of the wrapper.
pub fn describe_argument(argument: Option<Node<'_>>, depth: usize) -> String {
    let Some(node) = argument else {
        return UNKNOWN.to_string();
    };
    if node.kind_name().is_some() {
        return describe(Some(node), depth);
    }
    let expression = describe(node.child("expression"), depth);
    if node.get("spread").is_some() {
        format!("...{expression}")
    } else {
        expression
    }
}

/// Display name of a property key or member property.
pub fn property_name(property: Option<Node<'_>>, depth: usize) -> String {
    let Some(node) = property else {
        return UNKNOWN.to_string();
    };
    match node.kind_name() {
        Some("Identifier") | Some("IdentifierName") => {
            node.ident().unwrap_or(UNKNOWN).to_string()
        }
        Some("PrivateName") => {
            let name = node
                .child("id")
                .and_then(|id| id.ident())
                .or_else(|| node.ident())
                .unwrap_or(UNKNOWN);
            format!("#{name}")
        }
        Some("StringLiteral") => format!("{:?}", node.str("value").unwrap_or("")),
        Some("NumericLiteral") | Some("BigIntLiteral") => describe(Some(node), depth),
        Some("Computed") => format!("[{}]", describe(node.child("expression"), depth + 1)),
        _ => describe(Some(node), depth + 1),
    }
}

fn describe_atom(node: Node<'_>, kind: &str) -> Option<String> {
    let text = match kind {
        "Identifier" => node.ident().unwrap_or(UNKNOWN).to_string(),
        "ThisExpression" => "this".to_string(),
        "Super" => "super".to_string(),
        "Import" => "import".to_string(),
        "NullLiteral" => "null".to_string(),
        "BooleanLiteral" => node.flag("value").to_string(),
        "NumericLiteral" => match (node.number("value"), node.str("raw")) {
            (Some(value), _) => format_number(value),
            (None, Some(raw)) => raw.to_string(),
            (None, None) => "NaN".to_string(),
        },
        "BigIntLiteral" => match node.str("raw") {
            Some(raw) => raw.to_string(),
            None => format!("{}n", node.get("value").map(|v| v.to_string()).unwrap_or_default()),
        },
        "StringLiteral" => format!("{:?}", node.str("value").unwrap_or("")),
        "RegExpLiteral" => format!(
            "/{}/{}",
            node.str("pattern").unwrap_or(""),
            node.str("flags").unwrap_or("")
        ),
        "PrivateName" => property_name(Some(node), 0),
        "MetaProperty" => node.str("kind").unwrap_or("meta").to_string(),
        _ => return None,
    };
    Some(text)
}

fn describe_object(node: Node<'_>, depth: usize) -> String {
    let keys: Vec<String> = node
        .children("properties")
        .map(|property| match property.kind_name() {
            Some("Identifier") => property.ident().unwrap_or(UNKNOWN).to_string(),
            Some("SpreadElement") => {
                format!("...{}", describe(property.child("arguments"), depth))
            }
            _ => property_name(property.child("key"), depth),
        })
        .collect();
    if keys.is_empty() {
        return "{}".to_string();
    }
    let mut shown: Vec<&str> = keys
        .iter()
        .take(OBJECT_KEYS_SHOWN)
        .map(String::as_str)
        .collect();
    if keys.len() > OBJECT_KEYS_SHOWN {
        shown.push(ELLIPSIS);
    }
    format!("{{ {} }}", shown.join(", "))
}

fn describe_arguments(node: Node<'_>, depth: usize) -> String {
    node.elements("arguments")
        .map(|argument| describe_argument(argument, depth))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Assignment targets may be binding patterns rather than expressions.
fn describe_target(target: Option<Node<'_>>, depth: usize) -> String {
    match target {
        Some(node) if is_pattern(node) => name_of(Some(node)),
        other => describe(other, depth),
    }
}

pub(crate) fn is_pattern(node: Node<'_>) -> bool {
    matches!(
        node.kind_name(),
        Some("ArrayPattern" | "ObjectPattern" | "RestElement" | "AssignmentPattern")
    )
}

pub(crate) fn template_parts(node: Node<'_>) -> Vec<String> {
    node.children("quasis")
        .map(|quasi| {
            quasi
                .str("cooked")
                .or_else(|| quasi.str("raw"))
                .or_else(|| quasi.child("value").and_then(|v| v.str("cooked")))
                .unwrap_or("")
                .to_string()
        })
        .collect()
}

pub(crate) fn param_names(function: Node<'_>) -> Vec<String> {
    function
        .elements("params")
        .map(name_of)
        .collect()
}

pub(crate) fn is_async(function: Node<'_>) -> bool {
    function.flag("async") || function.flag("isAsync")
}

pub(crate) fn is_generator(function: Node<'_>) -> bool {
    function.flag("generator") || function.flag("isGenerator")
}

pub(crate) fn class_name<'a>(class: Node<'a>) -> Option<&'a str> {
    class
        .child("identifier")
        .or_else(|| class.child("id"))
        .and_then(|id| id.ident())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn ident(name: &str) -> Value {
        json!({"type": "Identifier", "value": name})
    }

    fn arg(expression: Value) -> Value {
        json!({"spread": null, "expression": expression})
    }

    fn call(callee: Value, args: Vec<Value>) -> Value {
        json!({"type": "CallExpression", "callee": callee, "arguments": args})
    }

    fn member(object: Value, property: &str) -> Value {
        json!({"type": "MemberExpression", "object": object, "property": ident(property)})
    }

    fn render(value: &Value) -> String {
        describe(Node::new(value), 0)
    }

    #[test]
    fn renders_member_call_chain() {
        let value = call(
            member(member(ident("a"), "b"), "c"),
            vec![
                arg(json!({"type": "NumericLiteral", "value": 1.0, "raw": "1"})),
                arg(json!({"type": "StringLiteral", "value": "x"})),
            ],
        );
        assert_eq!(render(&value), "a.b.c(1, \"x\")");
    }

    #[test]
    fn renders_literals_and_atoms() {
        assert_eq!(render(&json!({"type": "ThisExpression"})), "this");
        assert_eq!(render(&json!({"type": "NullLiteral"})), "null");
        assert_eq!(render(&json!({"type": "BooleanLiteral", "value": true})), "true");
        assert_eq!(
            render(&json!({"type": "NumericLiteral", "value": 2.5})),
            "2.5"
        );
        assert_eq!(
            render(&json!({"type": "RegExpLiteral", "pattern": "a+", "flags": "g"})),
            "/a+/g"
        );
    }

    #[test]
    fn renders_containers() {
        let array = json!({"type": "ArrayExpression", "elements": [arg(ident("a")), null, arg(ident("b"))]});
        assert_eq!(render(&array), "Array(3)");

        let object = json!({"type": "ObjectExpression", "properties": [
            {"type": "KeyValueProperty", "key": ident("a"), "value": ident("x")},
            ident("b"),
            {"type": "KeyValueProperty", "key": {"type": "StringLiteral", "value": "c-d"}, "value": ident("y")},
            {"type": "SpreadElement", "arguments": ident("rest")},
        ]});
        assert_eq!(render(&object), "{ a, b, \"c-d\", … }");

        assert_eq!(render(&json!({"type": "ObjectExpression", "properties": []})), "{}");
    }

    #[test]
    fn renders_template_with_elided_interpolations() {
        let template = json!({
            "type": "TemplateLiteral",
            "expressions": [ident("name")],
            "quasis": [
                {"type": "TemplateElement", "cooked": "hi ", "raw": "hi "},
                {"type": "TemplateElement", "cooked": "!", "raw": "!"}
            ]
        });
        assert_eq!(render(&template), "`hi ${…}!`");
    }

    #[test]
    fn renders_functions_without_bodies() {
        let arrow = json!({
            "type": "ArrowFunctionExpression",
            "params": [ident("x")],
            "body": call(ident("add"), vec![arg(ident("x")), arg(ident("x"))]),
            "async": false
        });
        assert_eq!(render(&arrow), "(x) => …");

        let function = json!({
            "type": "FunctionExpression",
            "identifier": ident("named"),
            "params": [{"type": "Parameter", "pat": ident("a")}],
            "async": true
        });
        assert_eq!(render(&function), "async function named(a) {…}");
    }

    #[test]
    fn renders_operators() {
        let binary = json!({"type": "BinaryExpression", "operator": "+", "left": ident("a"), "right": ident("b")});
        assert_eq!(render(&binary), "a + b");

        let unary = json!({"type": "UnaryExpression", "operator": "typeof", "argument": ident("x")});
        assert_eq!(render(&unary), "typeof x");
        let negate = json!({"type": "UnaryExpression", "operator": "!", "argument": ident("x")});
        assert_eq!(render(&negate), "!x");

        let ternary = json!({"type": "ConditionalExpression", "test": ident("ok"), "consequent": ident("a"), "alternate": ident("b")});
        assert_eq!(render(&ternary), "ok ? a : b");

        let new = json!({"type": "NewExpression", "callee": ident("Map"), "arguments": []});
        assert_eq!(render(&new), "new Map()");
    }

    #[test]
    fn renders_property_names() {
        let private = json!({"type": "PrivateName", "id": ident("secret")});
        assert_eq!(property_name(Node::new(&private), 0), "#secret");
        let computed = json!({"type": "Computed", "expression": ident("key")});
        assert_eq!(property_name(Node::new(&computed), 0), "[key]");
        let numeric = json!({"type": "NumericLiteral", "value": 0.0});
        assert_eq!(property_name(Node::new(&numeric), 0), "0");

        let indexed = json!({"type": "MemberExpression", "object": ident("list"), "property": computed});
        assert_eq!(render(&indexed), "list[key]");
    }

    #[test]
    fn spread_arguments_are_marked() {
        let spread = json!({"spread": {"start": 4, "end": 7}, "expression": ident("args")});
        assert_eq!(describe_argument(Node::new(&spread), 0), "...args");
        let plain = arg(ident("args"));
        assert_eq!(describe_argument(Node::new(&plain), 0), "args");
    }

    #[test]
    fn caps_nested_expansion_at_two_levels() {
        let mut nested = ident("z");
        for name in ["e", "d", "c", "b", "a"] {
            nested = call(ident(name), vec![arg(nested)]);
        }
        assert_eq!(render(&nested), "a(b(c(…)))");

        let mut sums = ident("x");
        for _ in 0..6 {
            sums = json!({"type": "BinaryExpression", "operator": "+", "left": sums, "right": ident("y")});
        }
        let text = render(&sums);
        assert!(text.starts_with("… + y"), "{text}");
        assert_eq!(text.matches('+').count(), 3);
    }

    #[test]
    fn unknown_kinds_render_as_kind_name() {
        assert_eq!(render(&json!({"type": "JSXElement"})), "JSXElement");
        assert_eq!(describe(None, 0), "unknown");
        assert_eq!(render(&json!({"span": {"start": 0, "end": 1}})), "unknown");
    }
}
