//! Structural matcher — feature-based similarity for renamed methods

use std::collections::HashSet;

use evograph_core::{MethodMetrics, Node, NodeKind};

use crate::matcher::NodeMatcher;

const WEIGHT_LINES: f64 = 0.2;
const WEIGHT_COMPLEXITY: f64 = 0.2;
const WEIGHT_CALLS: f64 = 0.3;
const WEIGHT_FIELDS: f64 = 0.2;
const WEIGHT_LOCALS: f64 = 0.1;

/// Fallback matcher consulted when no exact signature match exists,
/// typically pairing a renamed method with its old body.
///
/// The score is the raw weighted sum over the available features; it is
/// deliberately NOT renormalized when features are missing, so sparse
/// metrics under-score. That mirrors the scoring the rest of the pipeline
/// is calibrated against; changing it would shift every threshold.
pub struct StructuralMatcher;

impl NodeMatcher for StructuralMatcher {
    fn name(&self) -> &'static str {
        "structural"
    }

    fn priority(&self) -> u32 {
        10
    }

    fn supports(&self, kind: NodeKind) -> bool {
        kind == NodeKind::Method
    }

    fn confidence(&self, a: &Node, b: &Node) -> f64 {
        if a.kind != b.kind || a.kind != NodeKind::Method {
            return 0.0;
        }
        let (Some(ma), Some(mb)) = (&a.metrics, &b.metrics) else {
            return 0.0;
        };
        method_similarity(ma, mb)
    }
}

fn method_similarity(a: &MethodMetrics, b: &MethodMetrics) -> f64 {
    let mut score = 0.0;
    let mut features = 0u32;

    if a.lines > 0 && b.lines > 0 {
        score += count_similarity(a.lines, b.lines) * WEIGHT_LINES;
        features += 1;
    }
    if a.complexity > 0 && b.complexity > 0 {
        score += count_similarity(a.complexity, b.complexity) * WEIGHT_COMPLEXITY;
        features += 1;
    }
    if !a.called_methods.is_empty() && !b.called_methods.is_empty() {
        score += jaccard(&a.called_methods, &b.called_methods) * WEIGHT_CALLS;
        features += 1;
    }
    if !a.accessed_fields.is_empty() && !b.accessed_fields.is_empty() {
        score += jaccard(&a.accessed_fields, &b.accessed_fields) * WEIGHT_FIELDS;
        features += 1;
    }
    if !a.local_variables.is_empty() && !b.local_variables.is_empty() {
        score += count_similarity(
            a.local_variables.len() as u32,
            b.local_variables.len() as u32,
        ) * WEIGHT_LOCALS;
        features += 1;
    }

    if features == 0 { 0.0 } else { score }
}

/// 1.0 for equal counts, decaying with the relative difference.
fn count_similarity(a: u32, b: u32) -> f64 {
    let max = a.max(b) as f64;
    1.0 - (a.abs_diff(b) as f64) / max
}

/// |A ∩ B| / |A ∪ B|
fn jaccard(a: &[String], b: &[String]) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let set_a: HashSet<&str> = a.iter().map(String::as_str).collect();
    let set_b: HashSet<&str> = b.iter().map(String::as_str).collect();
    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.union(&set_b).count();
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}
