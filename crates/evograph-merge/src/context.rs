//! Cross-merge bookkeeping owned by the orchestrator

use std::collections::{BTreeMap, BTreeSet};

use evograph_core::{Node, NodeId, TimelineVersion};

/// State shared across the pairwise merges of one analysis run.
///
/// The tracker remembers which base identifiers have already taken part
/// in a change somewhere on the timeline. Once a node is "seen", later
/// unchanged pairs still produce explicit per-version snapshots, so an
/// evolution chain never dead-ends in a collapsed node. The registry
/// carries commit metadata used to decorate version snapshots.
#[derive(Debug, Default)]
pub struct MergeContext {
    tracked: BTreeSet<String>,
    versions: BTreeMap<String, TimelineVersion>,
}

impl MergeContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register commit metadata for a version label.
    pub fn register_version(&mut self, version: TimelineVersion) {
        self.versions.insert(version.label.clone(), version);
    }

    pub fn version(&self, label: &str) -> Option<&TimelineVersion> {
        self.versions.get(label)
    }

    /// Mark a node as part of an active evolution chain.
    pub fn mark_tracked(&mut self, id: &NodeId) {
        self.tracked.insert(id.base().to_string());
    }

    pub fn is_tracked(&self, id: &NodeId) -> bool {
        self.tracked.contains(id.base())
    }

    /// Forget everything; a fresh run starts with a clean slate.
    pub fn reset(&mut self) {
        self.tracked.clear();
        self.versions.clear();
    }

    /// Copy the registered commit metadata onto a version snapshot.
    pub fn decorate(&self, node: &mut Node, label: &str) {
        let Some(meta) = self.versions.get(label) else {
            return;
        };
        if !meta.commit_id.is_empty() {
            node.extra.insert("commit_id".to_string(), meta.commit_id.clone());
        }
        if !meta.short_id.is_empty() {
            node.extra.insert("commit_short_id".to_string(), meta.short_id.clone());
        }
        if !meta.message.is_empty() {
            node.extra.insert("commit_message".to_string(), meta.message.clone());
        }
        if !meta.author.is_empty() {
            node.extra.insert("commit_author".to_string(), meta.author.clone());
        }
        if let Some(time) = meta.committed_at {
            node.extra.insert("commit_time".to_string(), time.to_string());
        }
    }
}
