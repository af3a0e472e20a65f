//! External facts consumed by the merger: refactoring reports, diff
//! change sets, and version metadata. All of these are produced by
//! components outside this workspace and arrive as JSON.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::NodeId;

/// A code span referenced by a refactoring fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CodeLocation {
    pub file_path: String,
    pub start_line: u32,
    pub end_line: u32,
    /// Textual name of the element the span covers, when the detector
    /// knows it (used as a tie-break confirmation, never as the key).
    #[serde(default)]
    pub element: String,
}

impl CodeLocation {
    /// Human-readable `path:start-end::element` rendering kept on edges.
    pub fn render(&self) -> String {
        let mut out = self.file_path.clone();
        if self.start_line > 0 || self.end_line > 0 {
            out.push(':');
            out.push_str(&self.start_line.to_string());
            if self.end_line > 0 && self.end_line != self.start_line {
                out.push('-');
                out.push_str(&self.end_line.to_string());
            }
        }
        let element = self.element.trim();
        if !element.is_empty() {
            if !out.is_empty() {
                out.push_str("::");
            }
            out.push_str(element);
        }
        out
    }
}

/// One refactoring reported by the external refactoring detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefactoringInfo {
    /// Detector type label, e.g. `RENAME_METHOD`, `EXTRACT_METHOD`.
    pub refactoring_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    #[serde(default)]
    pub left_locations: Vec<CodeLocation>,
    #[serde(default)]
    pub right_locations: Vec<CodeLocation>,
}

fn default_confidence() -> f64 {
    1.0
}

/// Node identifiers a line-level diff flagged as touched, one set per
/// side of the version pair. Forces mapped pairs into `MODIFIED` even
/// when their signatures still match byte for byte.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DiffChangeSet {
    #[serde(default)]
    pub changed_v1: BTreeSet<NodeId>,
    #[serde(default)]
    pub changed_v2: BTreeSet<NodeId>,
}

impl DiffChangeSet {
    pub fn is_changed(&self, v1: &NodeId, v2: &NodeId) -> bool {
        self.changed_v1.contains(v1) || self.changed_v2.contains(v2)
    }

    pub fn is_empty(&self) -> bool {
        self.changed_v1.is_empty() && self.changed_v2.is_empty()
    }
}

/// One slot on the analyzed timeline: a version label, its canonical
/// position, and the commit it stands for. The commit metadata only
/// decorates merged nodes; it never drives matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineVersion {
    pub label: String,
    pub order_index: usize,
    #[serde(default)]
    pub commit_id: String,
    #[serde(default)]
    pub short_id: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub author: String,
    /// Commit time as epoch seconds.
    #[serde(default)]
    pub committed_at: Option<i64>,
}

impl TimelineVersion {
    pub fn committed_at_utc(&self) -> Option<DateTime<Utc>> {
        self.committed_at.and_then(|secs| DateTime::from_timestamp(secs, 0))
    }
}
