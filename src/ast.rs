//! Read-only access to the parser's AST.
//!
//! The tree arrives as JSON in the SWC layout: every node is an object whose
//! `"type"` names its kind and whose `"span"` holds `start`/`end` offsets.
//! Nothing here fails: missing fields read as `None` and the walk moves on.

use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Module,
    Script,
    VariableDeclaration,
    VariableDeclarator,
    FunctionDeclaration,
    FunctionExpression,
    ArrowFunctionExpression,
    ClassMethod,
    PrivateMethod,
    Constructor,
    MethodProperty,
    GetterProperty,
    SetterProperty,
    CallExpression,
    NewExpression,
    MemberExpression,
    SuperPropExpression,
    BinaryExpression,
    AssignmentExpression,
    UpdateExpression,
    ReturnStatement,
    ThrowStatement,
    TryStatement,
    Identifier,
    StringLiteral,
    NumericLiteral,
    BooleanLiteral,
    NullLiteral,
    TemplateLiteral,
    KeyValueProperty,
    ImportDeclaration,
    ExportDeclaration,
    ExportNamedDeclaration,
    ExportDefaultDeclaration,
    ExportDefaultExpression,
    ExportAllDeclaration,
    ClassDeclaration,
    ClassExpression,
    ClassProperty,
    PrivateProperty,
    LabeledStatement,
    BreakStatement,
    ContinueStatement,
    /// Type-level declarations: interfaces, type aliases, enums, namespaces.
    TsDeclaration,
    Other,
}

impl NodeKind {
    pub fn from_type(kind: &str) -> Self {
        match kind {
            "Module" => NodeKind::Module,
            "Script" => NodeKind::Script,
            "VariableDeclaration" => NodeKind::VariableDeclaration,
            "VariableDeclarator" => NodeKind::VariableDeclarator,
            "FunctionDeclaration" => NodeKind::FunctionDeclaration,
            "FunctionExpression" => NodeKind::FunctionExpression,
            "ArrowFunctionExpression" => NodeKind::ArrowFunctionExpression,
            "ClassMethod" => NodeKind::ClassMethod,
            "PrivateMethod" => NodeKind::PrivateMethod,
            "Constructor" => NodeKind::Constructor,
            "MethodProperty" => NodeKind::MethodProperty,
            "GetterProperty" => NodeKind::GetterProperty,
            "SetterProperty" => NodeKind::SetterProperty,
            "CallExpression" => NodeKind::CallExpression,
            "NewExpression" => NodeKind::NewExpression,
            "MemberExpression" => NodeKind::MemberExpression,
            "SuperPropExpression" => NodeKind::SuperPropExpression,
            "BinaryExpression" => NodeKind::BinaryExpression,
            "AssignmentExpression" => NodeKind::AssignmentExpression,
            "UpdateExpression" => NodeKind::UpdateExpression,
            "ReturnStatement" => NodeKind::ReturnStatement,
            "ThrowStatement" => NodeKind::ThrowStatement,
            "TryStatement" => NodeKind::TryStatement,
            "Identifier" => NodeKind::Identifier,
            "StringLiteral" => NodeKind::StringLiteral,
            "NumericLiteral" => NodeKind::NumericLiteral,
            "BooleanLiteral" => NodeKind::BooleanLiteral,
            "NullLiteral" => NodeKind::NullLiteral,
            "TemplateLiteral" => NodeKind::TemplateLiteral,
            "KeyValueProperty" => NodeKind::KeyValueProperty,
            "ImportDeclaration" => NodeKind::ImportDeclaration,
            "ExportDeclaration" => NodeKind::ExportDeclaration,
            "ExportNamedDeclaration" => NodeKind::ExportNamedDeclaration,
            "ExportDefaultDeclaration" => NodeKind::ExportDefaultDeclaration,
            "ExportDefaultExpression" => NodeKind::ExportDefaultExpression,
            "ExportAllDeclaration" => NodeKind::ExportAllDeclaration,
            "ClassDeclaration" => NodeKind::ClassDeclaration,
            "ClassExpression" => NodeKind::ClassExpression,
            "ClassProperty" => NodeKind::ClassProperty,
            "PrivateProperty" => NodeKind::PrivateProperty,
            "LabeledStatement" => NodeKind::LabeledStatement,
            "BreakStatement" => NodeKind::BreakStatement,
            "ContinueStatement" => NodeKind::ContinueStatement,
            "TsInterfaceDeclaration"
            | "TsTypeAliasDeclaration"
            | "TsEnumDeclaration"
            | "TsModuleDeclaration" => NodeKind::TsDeclaration,
            _ => NodeKind::Other,
        }
    }
}

/// Borrowed view of one AST object.
#[derive(Debug, Clone, Copy)]
pub struct Node<'a> {
    fields: &'a Map<String, Value>,
}

impl<'a> Node<'a> {
    /// Wraps `value` if it is a JSON object; anything else is not a node.
    pub fn new(value: &'a Value) -> Option<Self> {
        value.as_object().map(|fields| Node { fields })
    }

    pub fn kind_name(&self) -> Option<&'a str> {
        self.str("type")
    }

    pub fn kind(&self) -> NodeKind {
        self.kind_name()
            .map(NodeKind::from_type)
            .unwrap_or(NodeKind::Other)
    }

    pub fn is(&self, kind: &str) -> bool {
        self.kind_name() == Some(kind)
    }

    pub fn get(&self, field: &str) -> Option<&'a Value> {
        self.fields.get(field).filter(|value| !value.is_null())
    }

    pub fn child(&self, field: &str) -> Option<Node<'a>> {
        self.get(field).and_then(Node::new)
    }

    /// Elements of a list-valued field; non-object entries (holes) are skipped.
    pub fn children(&self, field: &str) -> impl Iterator<Item = Node<'a>> + 'a {
        self.list(field).iter().filter_map(Node::new)
    }

    /// Elements of a list-valued field with holes kept as `None`.
    pub fn elements(&self, field: &str) -> impl Iterator<Item = Option<Node<'a>>> + 'a {
        self.list(field).iter().map(Node::new)
    }

    pub fn list(&self, field: &str) -> &'a [Value] {
        match self.fields.get(field) {
            Some(Value::Array(items)) => items.as_slice(),
            _ => &[],
        }
    }

    pub fn str(&self, field: &str) -> Option<&'a str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    pub fn flag(&self, field: &str) -> bool {
        self.fields
            .get(field)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn number(&self, field: &str) -> Option<f64> {
        self.fields.get(field).and_then(Value::as_f64)
    }

    /// Identifier-like text: `value` for SWC identifiers, `name` for ESTree.
    pub fn ident(&self) -> Option<&'a str> {
        self.str("value").or_else(|| self.str("name"))
    }

    /// Start/end offsets, if the node carries a well-formed span.
    pub fn span(&self) -> Option<(usize, usize)> {
        let span = self.child("span")?;
        let start = span.get("start")?.as_u64()?;
        let end = span.get("end")?.as_u64()?;
        Some((start as usize, end as usize))
    }

    /// Start offset used to order siblings: the node's own span, or the first
    /// positioned descendant for wrappers that carry none.
    pub fn start_hint(&self) -> Option<usize> {
        if let Some((start, _)) = self.span() {
            return Some(start);
        }
        self.child_nodes_unordered()
            .into_iter()
            .find_map(|child| child.start_hint())
    }

    /// Every object-valued field and every object inside a list-valued field,
    /// in source order.
    pub fn child_nodes(&self) -> Vec<Node<'a>> {
        let mut children: Vec<(Option<usize>, Node<'a>)> = self
            .child_nodes_unordered()
            .into_iter()
            .map(|child| (child.start_hint(), child))
            .collect();
        children.sort_by_key(|(start, _)| start.unwrap_or(usize::MAX));
        children.into_iter().map(|(_, child)| child).collect()
    }

    fn child_nodes_unordered(&self) -> Vec<Node<'a>> {
        let mut children = Vec::new();
        for (key, value) in self.fields {
            if key == "span" || key == "type" {
                continue;
            }
            match value {
                Value::Object(_) => children.extend(Node::new(value)),
                Value::Array(items) => children.extend(items.iter().filter_map(Node::new)),
                _ => {}
            }
        }
        children
    }
}

/// Nesting depth of a JSON tree, counted in objects and arrays.
///
/// Iterative so that it can vet trees too deep for the recursive walk.
pub fn depth(value: &Value) -> usize {
    let mut max = 0;
    let mut stack = vec![(value, 1usize)];
    while let Some((value, level)) = stack.pop() {
        match value {
            Value::Object(fields) => {
                max = max.max(level);
                stack.extend(fields.values().map(|child| (child, level + 1)));
            }
            Value::Array(items) => {
                max = max.max(level);
                stack.extend(items.iter().map(|child| (child, level + 1)));
            }
            _ => {}
        }
    }
    max
}

/// [`depth`] measured on JSON text before it is decoded. Brackets inside
/// strings do not count; malformed text is left for the decoder to reject.
pub fn text_depth(text: &str) -> usize {
    let mut max = 0;
    let mut level = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for byte in text.bytes() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' | b'[' => {
                level += 1;
                max = max.max(level);
            }
            b'}' | b']' => level = level.saturating_sub(1),
            _ => {}
        }
    }
    max
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_kind_and_span() {
        let value = json!({"type": "Identifier", "value": "x", "span": {"start": 3, "end": 4}});
        let node = Node::new(&value).unwrap();
        assert_eq!(node.kind(), NodeKind::Identifier);
        assert_eq!(node.ident(), Some("x"));
        assert_eq!(node.span(), Some((3, 4)));
    }

    #[test]
    fn malformed_spans_read_as_absent() {
        let value = json!({"type": "Identifier", "span": {"start": "3", "end": 4}});
        assert_eq!(Node::new(&value).unwrap().span(), None);
        let value = json!({"type": "Identifier"});
        assert_eq!(Node::new(&value).unwrap().span(), None);
        assert!(Node::new(&json!("text")).is_none());
    }

    #[test]
    fn unknown_and_missing_kinds_are_other() {
        let value = json!({"type": "JSXElement"});
        assert_eq!(Node::new(&value).unwrap().kind(), NodeKind::Other);
        let value = json!({"spread": null, "expression": {"type": "Identifier"}});
        assert_eq!(Node::new(&value).unwrap().kind(), NodeKind::Other);
    }

    #[test]
    fn child_nodes_follow_source_order() {
        let value = json!({
            "type": "TryStatement",
            "span": {"start": 0, "end": 40},
            "block": {"type": "BlockStatement", "span": {"start": 4, "end": 10}},
            "finalizer": {"type": "BlockStatement", "span": {"start": 30, "end": 40}},
            "handler": {"type": "CatchClause", "span": {"start": 11, "end": 29}},
        });
        let node = Node::new(&value).unwrap();
        let kinds: Vec<_> = node
            .child_nodes()
            .iter()
            .map(|child| child.span().unwrap().0)
            .collect();
        assert_eq!(kinds, vec![4, 11, 30]);
    }

    #[test]
    fn wrappers_take_position_of_their_content() {
        let value = json!({
            "type": "CallExpression",
            "span": {"start": 0, "end": 9},
            "arguments": [
                {"spread": null, "expression": {"type": "Identifier", "span": {"start": 5, "end": 6}}}
            ],
            "callee": {"type": "Identifier", "span": {"start": 0, "end": 4}},
        });
        let node = Node::new(&value).unwrap();
        let children = node.child_nodes();
        assert!(children[0].is("Identifier"));
        assert_eq!(children[1].start_hint(), Some(5));
    }

    #[test]
    fn measures_depth() {
        assert_eq!(depth(&json!(1)), 0);
        assert_eq!(depth(&json!({"a": [{"b": {}}]})), 4);
    }

    #[test]
    fn text_depth_matches_decoded_depth() {
        let text = r#"{"a": [{"b": {}, "s": "[{\"]"}], "c": 1}"#;
        let value: Value = serde_json::from_str(text).unwrap();
        assert_eq!(text_depth(text), depth(&value));
        assert_eq!(text_depth("1"), 0);
    }
}
