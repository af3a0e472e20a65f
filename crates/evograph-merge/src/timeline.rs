//! Folds pairwise evolution graphs into one timeline graph

use std::collections::BTreeMap;

use tracing::info;

use evograph_core::{KnowledgeGraph, Node, TimelineVersion};

/// Accumulates an ordered sequence of pairwise merged graphs into a
/// single graph spanning the whole analyzed history.
///
/// Nodes appearing in several pairwise graphs are reconciled: their
/// version sets union, their status widens toward the most significant
/// one seen, and first/last versions follow the canonical ordering.
/// Commit hashes in version fields are normalized to their labels so
/// graphs produced against raw revisions still line up.
pub struct TimelineAggregator {
    graph: KnowledgeGraph,
    order: BTreeMap<String, usize>,
    labels: BTreeMap<String, String>,
}

impl TimelineAggregator {
    pub fn new(timeline: &[TimelineVersion]) -> Self {
        let mut order = BTreeMap::new();
        let mut labels = BTreeMap::new();
        for version in timeline {
            order.insert(version.label.clone(), version.order_index);
            labels.insert(version.label.clone(), version.label.clone());
            if !version.commit_id.is_empty() {
                labels.insert(version.commit_id.clone(), version.label.clone());
            }
        }
        let mut graph = KnowledgeGraph::new();
        if let Some(first) = timeline.first() {
            graph.from_version = Some(first.label.clone());
        }
        if let Some(last) = timeline.last() {
            graph.to_version = Some(last.label.clone());
        }
        TimelineAggregator {
            graph,
            order,
            labels,
        }
    }

    pub fn add_graph(&mut self, incoming: &KnowledgeGraph) {
        for node in incoming.nodes() {
            self.merge_node(node);
        }
        for edge in incoming.edges() {
            // Structural duplicates across pairwise graphs collapse via
            // the (source, kind, target) key.
            self.graph.add_edge(edge.clone());
        }
        for edge in incoming.evolution_edges() {
            self.merge_evolution_edge(edge);
        }
        info!(
            nodes = self.graph.node_count(),
            edges = self.graph.edge_count(),
            evolution = self.graph.evolution_count(),
            "timeline graph grew"
        );
    }

    pub fn graph(&self) -> &KnowledgeGraph {
        &self.graph
    }

    pub fn into_graph(self) -> KnowledgeGraph {
        self.graph
    }

    fn merge_node(&mut self, incoming: &Node) {
        let mut incoming = incoming.clone();
        self.normalize_node(&mut incoming);

        let Some(existing) = self.graph.node_mut(&incoming.id) else {
            self.graph.add_node(incoming);
            return;
        };

        for version in &incoming.versions {
            existing.versions.insert(version.clone());
        }
        existing.status = existing.status.widen(incoming.status);

        if let Some(first) =
            pick_extreme(&self.order, existing.first_version.take(), incoming.first_version, true)
        {
            existing.first_version = Some(first);
        }
        if let Some(last) =
            pick_extreme(&self.order, existing.last_version.take(), incoming.last_version, false)
        {
            existing.last_version = Some(last);
        }
    }

    fn merge_evolution_edge(&mut self, incoming: &evograph_core::EvolutionEdge) {
        let mut incoming = incoming.clone();
        incoming.from_version = self.normalize(&incoming.from_version);
        incoming.to_version = self.normalize(&incoming.to_version);

        match self.graph.evolution_edge_mut(&incoming.key()) {
            // Same evolution event reported by two pairwise graphs:
            // keep the more confident report and its description.
            Some(existing) => {
                if incoming.confidence > existing.confidence {
                    existing.confidence = incoming.confidence;
                    existing.description = incoming.description;
                }
            }
            None => self.graph.insert_evolution_edge(incoming),
        }
    }

    fn normalize_node(&self, node: &mut Node) {
        let versions: Vec<String> = node.versions.iter().map(|v| self.normalize(v)).collect();
        node.versions = versions.into_iter().collect();
        if let Some(first) = &node.first_version {
            node.first_version = Some(self.normalize(first));
        }
        if let Some(last) = &node.last_version {
            node.last_version = Some(self.normalize(last));
        }
    }

    fn normalize(&self, version: &str) -> String {
        self.labels
            .get(version)
            .cloned()
            .unwrap_or_else(|| version.to_string())
    }
}

/// Earlier (or later) of two version labels under the canonical order.
/// Labels not on the timeline lose against any that are.
fn pick_extreme(
    order: &BTreeMap<String, usize>,
    current: Option<String>,
    candidate: Option<String>,
    pick_first: bool,
) -> Option<String> {
    let fallback = if pick_first { usize::MAX } else { usize::MIN };
    match (current, candidate) {
        (None, candidate) => candidate,
        (current, None) => current,
        (Some(current), Some(candidate)) => {
            let current_order = order.get(&current).copied().unwrap_or(fallback);
            let candidate_order = order.get(&candidate).copied().unwrap_or(fallback);
            let take_candidate = if pick_first {
                candidate_order < current_order
            } else {
                candidate_order > current_order
            };
            Some(if take_candidate { candidate } else { current })
        }
    }
}
