//! Shared builders for unit tests

use crate::model::{Node, NodeKind};

/// Method node with a full signature and source text.
pub fn method(id: &str, signature: &str, source: &str) -> Node {
    let name = signature
        .split('(')
        .next()
        .and_then(|s| s.rsplit('.').next())
        .unwrap_or(signature)
        .to_string();
    let mut node = Node::new(id, NodeKind::Method, name, signature.to_string());
    node.signature = Some(signature.to_string());
    node.source = Some(source.to_string());
    node
}

/// Type node located in a file.
pub fn type_node(id: &str, qualified_name: &str, file: &str, lines: (u32, u32)) -> Node {
    let name = qualified_name.rsplit('.').next().unwrap_or(qualified_name);
    let mut node = Node::new(id, NodeKind::Type, name, qualified_name);
    node.file_path = Some(file.to_string());
    node.line_start = Some(lines.0);
    node.line_end = Some(lines.1);
    node
}
