//! Node pairing between two version graphs

use std::collections::BTreeMap;
use std::fmt;

use crate::model::{GraphError, NodeId, check_confidence};

/// Best-effort 1:1 association between version-A and version-B node
/// identifiers, each entry carrying a match confidence.
///
/// Bijective by construction: [`NodeMapping::insert`] rejects a second
/// claim on either endpoint, so a matcher bug cannot silently produce a
/// many-to-one pairing.
#[derive(Debug, Clone, Default)]
pub struct NodeMapping {
    forward: BTreeMap<NodeId, NodeId>,
    reverse: BTreeMap<NodeId, NodeId>,
    confidence: BTreeMap<NodeId, f64>,
}

impl NodeMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `v1` evolved into `v2` with the given confidence.
    pub fn insert(&mut self, v1: NodeId, v2: NodeId, confidence: f64) -> Result<(), GraphError> {
        let confidence = check_confidence(confidence)?;
        if self.forward.contains_key(&v1) {
            return Err(GraphError::ConflictingMapping { node: v1 });
        }
        if self.reverse.contains_key(&v2) {
            return Err(GraphError::ConflictingMapping { node: v2 });
        }
        self.confidence.insert(v1.clone(), confidence);
        self.reverse.insert(v2.clone(), v1.clone());
        self.forward.insert(v1, v2);
        Ok(())
    }

    /// The version-B node `v1` maps to, if any.
    pub fn target_of(&self, v1: &NodeId) -> Option<&NodeId> {
        self.forward.get(v1)
    }

    /// Reverse lookup: the version-A node that claimed `v2`.
    pub fn source_of(&self, v2: &NodeId) -> Option<&NodeId> {
        self.reverse.get(v2)
    }

    /// Confidence of the entry keyed by the version-A node. 0.0 if unmapped.
    pub fn confidence_of(&self, v1: &NodeId) -> f64 {
        self.confidence.get(v1).copied().unwrap_or(0.0)
    }

    pub fn contains_source(&self, v1: &NodeId) -> bool {
        self.forward.contains_key(v1)
    }

    pub fn contains_target(&self, v2: &NodeId) -> bool {
        self.reverse.contains_key(v2)
    }

    /// Iterate entries in version-A id order.
    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &NodeId, f64)> {
        self.forward
            .iter()
            .map(|(v1, v2)| (v1, v2, self.confidence_of(v1)))
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    pub fn stats(&self) -> MappingStats {
        let total = self.len();
        let exact = self.confidence.values().filter(|c| **c == 1.0).count();
        let high = self.confidence.values().filter(|c| **c >= 0.8).count();
        MappingStats {
            total,
            exact,
            high,
            low: total - high,
        }
    }
}

/// Confidence breakdown of a mapping, reported after every match run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingStats {
    pub total: usize,
    pub exact: usize,
    pub high: usize,
    pub low: usize,
}

impl fmt::Display for MappingStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} mappings ({} exact, {} high-confidence, {} low-confidence)",
            self.total, self.exact, self.high, self.low
        )
    }
}
