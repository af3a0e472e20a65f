//! Per-merge counters, reported after every run so silent data loss
//! stays observable without being fatal.

use std::fmt;

use tracing::info;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MergeStats {
    pub unchanged: usize,
    pub modified: usize,
    pub added: usize,
    pub deleted: usize,
    pub evolution_edges: usize,
    pub structural_edges: usize,
    pub facts_applied: usize,
    pub facts_skipped: usize,
    pub dropped_edges: usize,
}

impl MergeStats {
    pub fn report(&self) {
        info!(
            unchanged = self.unchanged,
            modified = self.modified,
            added = self.added,
            deleted = self.deleted,
            "merged node statuses"
        );
        info!(
            evolution = self.evolution_edges,
            structural = self.structural_edges,
            dropped = self.dropped_edges,
            "merged edges"
        );
        info!(
            applied = self.facts_applied,
            skipped = self.facts_skipped,
            "refactoring facts"
        );
    }
}

impl fmt::Display for MergeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "nodes: {} unchanged, {} modified, {} added, {} deleted; \
             edges: {} evolution, {} structural ({} dropped); \
             facts: {} applied, {} skipped",
            self.unchanged,
            self.modified,
            self.added,
            self.deleted,
            self.evolution_edges,
            self.structural_edges,
            self.dropped_edges,
            self.facts_applied,
            self.facts_skipped
        )
    }
}
