//! Core data structures for version graphs

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Separator between a node's base identifier and a version label.
pub const VERSION_SEPARATOR: char = '@';

/// Stable identifier for a node, assigned by the front end that extracted it.
///
/// Merged graphs append a version label (`id@V1`) when a node has to exist
/// once per version; [`NodeId::base`] strips that suffix again.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        NodeId(id.into())
    }

    /// Identifier for the per-version snapshot of this node.
    /// Already-versioned ids are returned unchanged.
    pub fn versioned(&self, label: &str) -> NodeId {
        let suffix = format!("{VERSION_SEPARATOR}{label}");
        if self.0.ends_with(&suffix) {
            self.clone()
        } else {
            NodeId(format!("{}{}", self.0, suffix))
        }
    }

    /// The identifier with any version suffix removed.
    pub fn base(&self) -> &str {
        match self.0.find(VERSION_SEPARATOR) {
            Some(idx) => &self.0[..idx],
            None => &self.0,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        NodeId(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        NodeId(id)
    }
}

/// What kind of code element a node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Project,
    Package,
    File,
    Type,
    Method,
    Field,
}

/// A node's fate between two versions.
///
/// Statuses are only ever widened toward the more significant state
/// (`Added`/`Deleted` > `Modified` > `Unchanged`), never downgraded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum VersionStatus {
    #[default]
    Unchanged,
    Modified,
    Added,
    Deleted,
}

impl VersionStatus {
    /// Significance used when reconciling statuses across version pairs.
    pub fn rank(self) -> u8 {
        match self {
            VersionStatus::Added | VersionStatus::Deleted => 3,
            VersionStatus::Modified => 2,
            VersionStatus::Unchanged => 1,
        }
    }

    /// The more significant of the two statuses. Ties keep `self`.
    pub fn widen(self, other: VersionStatus) -> VersionStatus {
        if other.rank() > self.rank() { other } else { self }
    }
}

impl fmt::Display for VersionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VersionStatus::Unchanged => "UNCHANGED",
            VersionStatus::Modified => "MODIFIED",
            VersionStatus::Added => "ADDED",
            VersionStatus::Deleted => "DELETED",
        };
        f.write_str(s)
    }
}

/// Structural features of a method body, supplied by the front end.
/// The structural matcher compares these when signatures stop matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MethodMetrics {
    pub lines: u32,
    pub complexity: u32,
    #[serde(default)]
    pub called_methods: Vec<String>,
    #[serde(default)]
    pub accessed_fields: Vec<String>,
    #[serde(default)]
    pub local_variables: Vec<String>,
}

/// A code element in a version graph.
///
/// The fields the matcher and merger actually read are part of the fixed
/// schema; anything else the front end wants to attach goes into `extra`.
/// For `Field` nodes the `signature` carries the declared type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub name: String,
    pub qualified_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_start: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_end: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<MethodMetrics>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,

    // ── Version bookkeeping, filled in by the merger ────────
    #[serde(default)]
    pub status: VersionStatus,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub versions: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_version: Option<String>,
}

impl Node {
    pub fn new(
        id: impl Into<NodeId>,
        kind: NodeKind,
        name: impl Into<String>,
        qualified_name: impl Into<String>,
    ) -> Self {
        Node {
            id: id.into(),
            kind,
            name: name.into(),
            qualified_name: qualified_name.into(),
            signature: None,
            file_path: None,
            line_start: None,
            line_end: None,
            source: None,
            doc: None,
            metrics: None,
            extra: BTreeMap::new(),
            status: VersionStatus::default(),
            versions: BTreeSet::new(),
            first_version: None,
            last_version: None,
        }
    }

    /// Record that this node exists under the given version label.
    pub fn add_version(&mut self, label: impl Into<String>) {
        self.versions.insert(label.into());
    }

    /// Reset version bookkeeping to a single label with the given status.
    pub fn set_version_snapshot(&mut self, label: &str, status: VersionStatus) {
        self.versions.clear();
        self.versions.insert(label.to_string());
        self.status = status;
        self.first_version = Some(label.to_string());
        self.last_version = Some(label.to_string());
    }
}

/// What kind of intra-version relationship an edge represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    Contains,
    Declares,
    Calls,
    Reads,
    Writes,
    Extends,
    Implements,
    Overrides,
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EdgeKind::Contains => "CONTAINS",
            EdgeKind::Declares => "DECLARES",
            EdgeKind::Calls => "CALLS",
            EdgeKind::Reads => "READS",
            EdgeKind::Writes => "WRITES",
            EdgeKind::Extends => "EXTENDS",
            EdgeKind::Implements => "IMPLEMENTS",
            EdgeKind::Overrides => "OVERRIDES",
        };
        f.write_str(s)
    }
}

/// A directed structural edge between two nodes of one version graph.
/// Immutable fact; the merger retargets it with [`Edge::with_endpoints`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
    pub kind: EdgeKind,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl Edge {
    pub fn new(source: impl Into<NodeId>, target: impl Into<NodeId>, kind: EdgeKind) -> Self {
        Edge {
            source: source.into(),
            target: target.into(),
            kind,
            extra: BTreeMap::new(),
        }
    }

    /// Copy of this edge pointing at different endpoints.
    pub fn with_endpoints(&self, source: NodeId, target: NodeId) -> Edge {
        Edge {
            source,
            target,
            kind: self.kind,
            extra: self.extra.clone(),
        }
    }

    /// Deduplication identity of a structural edge.
    pub fn key(&self) -> EdgeKey {
        EdgeKey {
            source: self.source.clone(),
            kind: self.kind,
            target: self.target.clone(),
        }
    }
}

/// (source, kind, target) identity used to deduplicate structural edges.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey {
    pub source: NodeId,
    pub kind: EdgeKind,
    pub target: NodeId,
}

/// Fatal invariant violations. Everything else the pipeline recovers from
/// locally and reports through counters.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("confidence {value} is outside [0, 1]")]
    InvalidConfidence { value: f64 },
    #[error("node {node} already claimed by another mapping entry")]
    ConflictingMapping { node: NodeId },
}

/// Validate a confidence score. Values outside [0, 1] indicate a broken
/// matcher or fact producer and abort the run.
pub fn check_confidence(value: f64) -> Result<f64, GraphError> {
    if (0.0..=1.0).contains(&value) && value.is_finite() {
        Ok(value)
    } else {
        Err(GraphError::InvalidConfidence { value })
    }
}
