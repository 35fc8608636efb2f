//! Walking a hierarchical state tree.
//!
//! A state tree is the JSON document a target returns for a subtree read:
//! objects are containers (list entries are keyed `name[key=value]`), every
//! other value is a leaf. Leaf-lists are arrays and render as their JSON text.

use serde_json::Value;

use crate::path;

/// Renders a leaf to the string form carried on the wire.
///
/// Returns `None` for containers and for `null`, which carries no value.
#[must_use]
pub fn render_leaf(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Object(_) => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(_) => Some(value.to_string()),
    }
}

/// Every leaf under `tree`, keyed by its fully-qualified path.
///
/// `root` is the path the tree was read at. A scalar tree yields one leaf at
/// `root` itself.
#[must_use]
pub fn leaves(root: &str, tree: &Value) -> Vec<(String, String)> {
    let mut out = Vec::new();
    collect(root, tree, &mut out);
    out
}

fn collect(at: &str, node: &Value, out: &mut Vec<(String, String)>) {
    if let Value::Object(children) = node {
        for (element, child) in children {
            collect(&path::join(at, element), child, out);
        }
        return;
    }

    if let Some(rendered) = render_leaf(node) {
        out.push((at.to_owned(), rendered));
    }
}

/// Parses a leaf written as text back into a scalar JSON value.
///
/// Numbers and booleans keep their type, anything else is stored as a string.
#[must_use]
pub fn parse_leaf(raw: &str) -> Value {
    match serde_json::from_str::<Value>(raw) {
        Ok(value @ (Value::Number(_) | Value::Bool(_))) => value,
        _ => Value::String(raw.to_owned()),
    }
}
