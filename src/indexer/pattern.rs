use crate::ast::Node;
use crate::indexer::describe::describe;

const PLACEHOLDER: &str = "param";
pub const OBJECT_PATTERN: &str = "{…}";

/// Display name of a binding pattern or parameter.
pub fn name_of(pattern: Option<Node<'_>>) -> String {
    let Some(node) = pattern else {
        return PLACEHOLDER.to_string();
    };
    match node.kind_name() {
        Some("Identifier" | "BindingIdentifier") => {
            node.ident().unwrap_or(PLACEHOLDER).to_string()
        }
        Some("RestElement") => format!("...{}", name_of(node.child("argument"))),
        Some("AssignmentPattern") => format!(
            "{}={}",
            name_of(node.child("left")),
            describe(node.child("right"), 0)
        ),
        Some("ArrayPattern") => {
            let elements: Vec<String> = node
                .elements("elements")
                .map(|element| element.map(|inner| name_of(Some(inner))).unwrap_or_default())
                .collect();
            format!("[{}]", elements.join(", "))
        }
        Some("ObjectPattern") => OBJECT_PATTERN.to_string(),
        Some("Parameter") => name_of(node.child("pat")),
        Some("TsParameterProperty") => name_of(node.child("param")),
        _ => PLACEHOLDER.to_string(),
    }
}
