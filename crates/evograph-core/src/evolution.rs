//! Evolution edges — typed before/after relationships between versions

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{GraphError, NodeId, check_confidence};

/// Which detector produced an evolution edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Detector {
    /// Structured refactoring fact from the refactoring-detection service.
    Refactoring,
    /// Fallback line-level diff signal.
    Diff,
    /// Derived edge propagated from a changed member to its enclosing type.
    Propagation,
    /// Produced by the node matcher itself (unchanged snapshots).
    Matcher,
}

/// The transformation an evolution edge describes, with the fields that
/// only make sense for that transformation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EvolutionKind {
    Renamed {
        /// What was renamed: class, method, field, parameter, variable,
        /// or package.
        subject: String,
        old_name: String,
        new_name: String,
    },
    Moved {
        old_location: String,
        new_location: String,
    },
    Extracted {
        variety: String,
    },
    Inlined {
        variety: String,
    },
    ChangedSignature {
        old_signature: Option<String>,
        new_signature: Option<String>,
        change: String,
    },
    Refactored {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
    },
    Unchanged,
}

impl EvolutionKind {
    /// Coarse edge-type label; part of the edge's aggregation identity.
    pub fn label(&self) -> &'static str {
        match self {
            EvolutionKind::Renamed { .. } => "RENAMED",
            EvolutionKind::Moved { .. } => "MOVED",
            EvolutionKind::Extracted { .. } => "EXTRACTED",
            EvolutionKind::Inlined { .. } => "INLINED",
            EvolutionKind::ChangedSignature { .. } => "CHANGED_SIGNATURE",
            EvolutionKind::Refactored { .. } => "REFACTORED",
            EvolutionKind::Unchanged => "UNCHANGED",
        }
    }
}

impl fmt::Display for EvolutionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Aggregation identity: edges with the same key are folded together
/// rather than duplicated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EvolutionKey {
    pub source: NodeId,
    pub label: &'static str,
    pub target: NodeId,
}

/// A directed edge from a from-version node to a to-version node,
/// describing how one became the other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionEdge {
    pub source: NodeId,
    pub target: NodeId,
    pub kind: EvolutionKind,
    /// Raw detector label, e.g. `RENAME_METHOD` or `CODE_DIFF`.
    pub refactoring_type: String,
    pub confidence: f64,
    pub description: String,
    pub from_version: String,
    pub to_version: String,
    pub detected_by: Detector,

    // ── Aggregation fields ──────────────────────────────────
    /// How many detections were folded into this edge.
    pub occurrences: u32,
    pub descriptions: Vec<String>,
    pub refactoring_types: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub left_locations: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub right_locations: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub left_elements: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub right_elements: Vec<String>,
}

impl EvolutionEdge {
    /// Build a fresh single-detection edge. Rejects confidence outside [0, 1].
    pub fn new(
        source: NodeId,
        target: NodeId,
        kind: EvolutionKind,
        refactoring_type: impl Into<String>,
        confidence: f64,
        description: impl Into<String>,
        from_version: impl Into<String>,
        to_version: impl Into<String>,
        detected_by: Detector,
    ) -> Result<Self, GraphError> {
        let confidence = check_confidence(confidence)?;
        let refactoring_type = refactoring_type.into();
        let description = description.into();
        let mut descriptions = Vec::new();
        if !description.is_empty() {
            descriptions.push(description.clone());
        }
        let mut refactoring_types = Vec::new();
        if !refactoring_type.is_empty() {
            refactoring_types.push(refactoring_type.clone());
        }
        Ok(EvolutionEdge {
            source,
            target,
            kind,
            refactoring_type,
            confidence,
            description,
            from_version: from_version.into(),
            to_version: to_version.into(),
            detected_by,
            occurrences: 1,
            descriptions,
            refactoring_types,
            left_locations: Vec::new(),
            right_locations: Vec::new(),
            left_elements: Vec::new(),
            right_elements: Vec::new(),
        })
    }

    pub fn key(&self) -> EvolutionKey {
        EvolutionKey {
            source: self.source.clone(),
            label: self.kind.label(),
            target: self.target.clone(),
        }
    }

    pub fn is_high_confidence(&self) -> bool {
        self.confidence >= 0.8
    }

    /// Fold a repeated detection of the same (source, kind, target) into
    /// this edge: bump the occurrence count, keep the maximum confidence,
    /// union descriptions and location lists.
    pub fn absorb(&mut self, other: &EvolutionEdge) {
        self.occurrences += other.occurrences.max(1);
        if other.confidence > self.confidence {
            self.confidence = other.confidence;
        }
        union_into(&mut self.descriptions, &other.descriptions);
        if !other.description.is_empty() {
            union_into(&mut self.descriptions, std::slice::from_ref(&other.description));
        }
        union_into(&mut self.refactoring_types, &other.refactoring_types);
        if !other.refactoring_type.is_empty() {
            union_into(
                &mut self.refactoring_types,
                std::slice::from_ref(&other.refactoring_type),
            );
        }
        union_into(&mut self.left_locations, &other.left_locations);
        union_into(&mut self.right_locations, &other.right_locations);
        union_into(&mut self.left_elements, &other.left_elements);
        union_into(&mut self.right_elements, &other.right_elements);
    }
}

/// Append values not already present, preserving first-seen order.
fn union_into(target: &mut Vec<String>, incoming: &[String]) {
    for value in incoming {
        let trimmed = value.trim();
        if !trimmed.is_empty() && !target.iter().any(|v| v == trimmed) {
            target.push(trimmed.to_string());
        }
    }
}
