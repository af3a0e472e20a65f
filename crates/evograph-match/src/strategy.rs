//! Greedy priority-ranked pairing of two version graphs

use std::collections::BTreeSet;

use tracing::{debug, info};

use evograph_core::{KnowledgeGraph, NodeId, NodeMapping};

use crate::config::MatchConfig;
use crate::exact::ExactMatcher;
use crate::matcher::NodeMatcher;
use crate::structural::StructuralMatcher;

/// The ordered set of matchers consulted per version-A node.
///
/// Pairing is greedy in node-id order: once a version-B node is claimed
/// it is never reconsidered, so an earlier mediocre pairing can shadow a
/// later better one. Accepted as a known trade for a single linear scan.
pub struct MatcherSet {
    matchers: Vec<Box<dyn NodeMatcher>>,
    config: MatchConfig,
}

impl MatcherSet {
    /// Default set: exact first, structural as the fallback.
    pub fn new(config: MatchConfig) -> Self {
        Self::with_matchers(config, vec![Box::new(ExactMatcher), Box::new(StructuralMatcher)])
    }

    pub fn with_matchers(config: MatchConfig, mut matchers: Vec<Box<dyn NodeMatcher>>) -> Self {
        matchers.sort_by(|a, b| b.priority().cmp(&a.priority()));
        MatcherSet { matchers, config }
    }

    /// Pair the nodes of two version graphs. Every version-A node gets at
    /// most one version-B partner and vice versa; anything unpaired shows
    /// up as added or deleted downstream.
    ///
    /// Matchers run in priority order, each scanning the whole unclaimed
    /// candidate pool. Once the best candidate found so far is confident
    /// enough, lower-priority matchers are not consulted for this
    /// version-A node at all.
    pub fn build_mapping(
        &self,
        graph_a: &KnowledgeGraph,
        graph_b: &KnowledgeGraph,
    ) -> anyhow::Result<NodeMapping> {
        let mut mapping = NodeMapping::new();
        let mut claimed: BTreeSet<&NodeId> = BTreeSet::new();

        for node_a in graph_a.nodes() {
            let mut best: Option<(&NodeId, f64)> = None;

            'matchers: for matcher in &self.matchers {
                if !matcher.supports(node_a.kind) {
                    continue;
                }
                for node_b in graph_b.nodes() {
                    if node_b.kind != node_a.kind || claimed.contains(&node_b.id) {
                        continue;
                    }
                    let score = matcher.confidence(node_a, node_b);
                    if score > best.map_or(0.0, |(_, s)| s) {
                        best = Some((&node_b.id, score));
                    }
                    // A perfect match cannot be beaten.
                    if score >= 1.0 {
                        break 'matchers;
                    }
                }
                if best.map_or(0.0, |(_, s)| s) >= self.config.early_exit_threshold {
                    break;
                }
            }

            if let Some((id_b, score)) = best {
                if score >= self.config.accept_threshold {
                    debug!(source = %node_a.id, target = %id_b, confidence = score, "paired");
                    claimed.insert(id_b);
                    mapping.insert(node_a.id.clone(), id_b.clone(), score)?;
                }
            }
        }

        let stats = mapping.stats();
        info!(
            total = stats.total,
            exact = stats.exact,
            high = stats.high,
            low = stats.low,
            unmatched_a = graph_a.node_count() - stats.total,
            unmatched_b = graph_b.node_count() - stats.total,
            "node matching complete"
        );
        Ok(mapping)
    }
}
