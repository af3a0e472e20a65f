//! Exact matcher — structural signature plus source-text identity

use evograph_core::{Node, NodeKind};

use crate::matcher::NodeMatcher;

/// Highest-priority matcher. Two nodes match only when their structural
/// signature is identical; the source text then decides between a perfect
/// match (1.0) and "same element, different body" (0.8), the primary
/// signal that something is MODIFIED rather than UNCHANGED.
pub struct ExactMatcher;

impl NodeMatcher for ExactMatcher {
    fn name(&self) -> &'static str {
        "exact"
    }

    fn priority(&self) -> u32 {
        100
    }

    fn supports(&self, _kind: NodeKind) -> bool {
        true
    }

    fn confidence(&self, a: &Node, b: &Node) -> f64 {
        if a.kind != b.kind || !signatures_match(a, b) {
            return 0.0;
        }
        if sources_match(a, b) { 1.0 } else { 0.8 }
    }
}

/// Kind-specific structural signature comparison:
/// qualified name for types and packages, file path for files, full
/// signature for methods, qualified name plus declared type for fields.
fn signatures_match(a: &Node, b: &Node) -> bool {
    match a.kind {
        NodeKind::Type | NodeKind::Package | NodeKind::Project => {
            a.qualified_name == b.qualified_name
        }
        NodeKind::File => match (&a.file_path, &b.file_path) {
            (Some(pa), Some(pb)) => pa == pb,
            _ => false,
        },
        NodeKind::Method => match (&a.signature, &b.signature) {
            (Some(sa), Some(sb)) => sa == sb,
            // Front ends that do not emit signatures fall back to the
            // qualified name.
            (None, None) => a.qualified_name == b.qualified_name,
            _ => false,
        },
        NodeKind::Field => {
            a.qualified_name == b.qualified_name && a.signature == b.signature
        }
    }
}

/// Source comparison only applies when both sides carry source text.
/// Both missing: nothing to compare, the signature decides. One missing:
/// counted as a source difference, so the pair still scores 0.8.
fn sources_match(a: &Node, b: &Node) -> bool {
    match (&a.source, &b.source) {
        (None, None) => true,
        (Some(sa), Some(sb)) => sa == sb,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evograph_core::Node;

    fn method(sig: &str, source: Option<&str>) -> Node {
        let mut node = Node::new(sig, NodeKind::Method, sig.to_string(), sig.to_string());
        node.signature = Some(sig.to_string());
        node.source = source.map(str::to_string);
        node
    }

    #[test]
    fn identical_signature_and_source_scores_one() {
        let a = method("A.foo()", Some("return 1;"));
        let b = method("A.foo()", Some("return 1;"));
        assert_eq!(ExactMatcher.confidence(&a, &b), 1.0);
    }

    #[test]
    fn changed_source_scores_point_eight() {
        let a = method("A.foo()", Some("return 1;"));
        let b = method("A.foo()", Some("return 2;"));
        assert_eq!(ExactMatcher.confidence(&a, &b), 0.8);
    }

    #[test]
    fn signature_mismatch_scores_zero() {
        let a = method("A.foo()", Some("return 1;"));
        let b = method("A.bar()", Some("return 1;"));
        assert_eq!(ExactMatcher.confidence(&a, &b), 0.0);
    }

    #[test]
    fn kind_mismatch_scores_zero() {
        let a = method("A.foo()", None);
        let b = Node::new("A.foo()", NodeKind::Field, "foo", "A.foo()");
        assert_eq!(ExactMatcher.confidence(&a, &b), 0.0);
    }

    #[test]
    fn one_sided_source_still_signals_modified() {
        let a = method("A.foo()", Some("return 1;"));
        let b = method("A.foo()", None);
        assert_eq!(ExactMatcher.confidence(&a, &b), 0.8);
    }

    #[test]
    fn sourceless_nodes_rely_on_signature_alone() {
        let a = Node::new("p", NodeKind::Package, "acme", "com.acme");
        let b = Node::new("p2", NodeKind::Package, "acme", "com.acme");
        assert_eq!(ExactMatcher.confidence(&a, &b), 1.0);
    }

    #[test]
    fn field_type_participates_in_the_signature() {
        let mut a = Node::new("f", NodeKind::Field, "total", "A.total");
        a.signature = Some("int".to_string());
        let mut b = Node::new("f2", NodeKind::Field, "total", "A.total");
        b.signature = Some("long".to_string());
        assert_eq!(ExactMatcher.confidence(&a, &b), 0.0);

        b.signature = Some("int".to_string());
        assert_eq!(ExactMatcher.confidence(&a, &b), 1.0);
    }
}
