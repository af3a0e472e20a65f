//! Maps refactoring facts onto typed evolution edges

use evograph_core::{
    Detector, EvolutionEdge, EvolutionKind, GraphError, Node, NodeKind, RefactoringInfo,
};

/// Build one evolution edge from a refactoring fact and its already
/// resolved endpoint nodes. The fact's type label decides the edge kind
/// and the kind-specific payload; unknown labels fall back to a generic
/// `Refactored` edge so new detector types degrade gracefully.
pub fn build_edge(
    fact: &RefactoringInfo,
    from: &Node,
    to: &Node,
    from_version: &str,
    to_version: &str,
) -> Result<EvolutionEdge, GraphError> {
    let kind = kind_for(&fact.refactoring_type, from, to);
    let mut edge = EvolutionEdge::new(
        from.id.clone(),
        to.id.clone(),
        kind,
        fact.refactoring_type.clone(),
        fact.confidence,
        fact.description.clone(),
        from_version,
        to_version,
        Detector::Refactoring,
    )?;
    edge.left_locations = rendered(&fact.left_locations);
    edge.right_locations = rendered(&fact.right_locations);
    edge.left_elements = elements(&fact.left_locations);
    edge.right_elements = elements(&fact.right_locations);
    Ok(edge)
}

fn kind_for(ty: &str, from: &Node, to: &Node) -> EvolutionKind {
    match ty {
        "RENAME_CLASS" => renamed("class", from, to),
        "RENAME_METHOD" => renamed("method", from, to),
        "RENAME_ATTRIBUTE" => renamed("field", from, to),
        "RENAME_PARAMETER" => renamed("parameter", from, to),
        "RENAME_VARIABLE" => renamed("variable", from, to),
        "RENAME_PACKAGE" => renamed("package", from, to),
        "MOVE_CLASS" | "MOVE_METHOD" | "MOVE_ATTRIBUTE" | "MOVE_AND_RENAME_CLASS"
        | "MOVE_AND_RENAME_METHOD" | "MOVE_AND_RENAME_ATTRIBUTE" => EvolutionKind::Moved {
            old_location: node_location(from),
            new_location: node_location(to),
        },
        "EXTRACT_METHOD" | "EXTRACT_AND_MOVE_METHOD" => extracted("method"),
        "EXTRACT_CLASS" => extracted("class"),
        "EXTRACT_INTERFACE" => extracted("interface"),
        "EXTRACT_SUPERCLASS" => extracted("superclass"),
        "EXTRACT_SUBCLASS" => extracted("subclass"),
        "EXTRACT_VARIABLE" => extracted("variable"),
        "INLINE_METHOD" | "MOVE_AND_INLINE_METHOD" => inlined("method"),
        "INLINE_VARIABLE" => inlined("variable"),
        "CHANGE_PARAMETER_TYPE" => signature_change(from, to, "parameter_type"),
        "CHANGE_RETURN_TYPE" => signature_change(from, to, "return_type"),
        "ADD_PARAMETER" => signature_change(from, to, "add_parameter"),
        "REMOVE_PARAMETER" => signature_change(from, to, "remove_parameter"),
        "REORDER_PARAMETER" => signature_change(from, to, "reorder_parameter"),
        "ADD_THROWN_EXCEPTION_TYPE" => signature_change(from, to, "add_exception"),
        "REMOVE_THROWN_EXCEPTION_TYPE" => signature_change(from, to, "remove_exception"),
        "CHANGE_METHOD_ACCESS_MODIFIER" | "CHANGE_ATTRIBUTE_ACCESS_MODIFIER" => {
            signature_change(from, to, "modifier")
        }
        "PULL_UP_METHOD" | "PULL_UP_ATTRIBUTE" => refactored("pull_up"),
        "PUSH_DOWN_METHOD" | "PUSH_DOWN_ATTRIBUTE" => refactored("push_down"),
        "REPLACE_VARIABLE_WITH_ATTRIBUTE" => refactored("replace"),
        "PARAMETERIZE_VARIABLE" => refactored("parameterize"),
        "MERGE_PARAMETER" | "MERGE_VARIABLE" | "MERGE_CLASS" => refactored("merge"),
        "SPLIT_PARAMETER" | "SPLIT_VARIABLE" | "SPLIT_CLASS" => refactored("split"),
        // Unknown detector types degrade to a generic edge with no
        // sub-type.
        _ => EvolutionKind::Refactored { detail: None },
    }
}

fn renamed(subject: &str, from: &Node, to: &Node) -> EvolutionKind {
    EvolutionKind::Renamed {
        subject: subject.to_string(),
        old_name: from.name.clone(),
        new_name: to.name.clone(),
    }
}

fn refactored(detail: &str) -> EvolutionKind {
    EvolutionKind::Refactored {
        detail: Some(detail.to_string()),
    }
}

fn extracted(variety: &str) -> EvolutionKind {
    EvolutionKind::Extracted {
        variety: variety.to_string(),
    }
}

fn inlined(variety: &str) -> EvolutionKind {
    EvolutionKind::Inlined {
        variety: variety.to_string(),
    }
}

fn signature_change(from: &Node, to: &Node, change: &str) -> EvolutionKind {
    EvolutionKind::ChangedSignature {
        old_signature: from.signature.clone(),
        new_signature: to.signature.clone(),
        change: change.to_string(),
    }
}

/// Where a node lives, for `Moved` payloads: methods are identified by
/// signature, everything else by qualified name.
fn node_location(node: &Node) -> String {
    match node.kind {
        NodeKind::Method => node
            .signature
            .clone()
            .unwrap_or_else(|| node.qualified_name.clone()),
        _ => node.qualified_name.clone(),
    }
}

fn rendered(locations: &[evograph_core::CodeLocation]) -> Vec<String> {
    dedup(locations.iter().map(|l| l.render()))
}

fn elements(locations: &[evograph_core::CodeLocation]) -> Vec<String> {
    dedup(locations.iter().map(|l| l.element.trim().to_string()))
}

fn dedup(values: impl Iterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for value in values {
        let trimmed = value.trim();
        if !trimmed.is_empty() && !out.iter().any(|v| v == trimmed) {
            out.push(trimmed.to_string());
        }
    }
    out
}
