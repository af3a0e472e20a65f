//! Pairwise merge of two version graphs into one evolution graph

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use evograph_core::{
    CodeLocation, Detector, DiffChangeSet, EvolutionEdge, EvolutionKind, KnowledgeGraph, Node,
    NodeId, NodeKind, NodeMapping, RefactoringInfo, VersionStatus,
};
use evograph_match::{LocationMatcher, MatchConfig};

use crate::context::MergeContext;
use crate::factory;
use crate::stats::MergeStats;

/// Identifier translation from the two version graphs into the merged
/// graph, built up while nodes are processed and consulted when edges
/// and facts are resolved.
#[derive(Debug, Default)]
struct IdMaps {
    v1: BTreeMap<NodeId, NodeId>,
    v2: BTreeMap<NodeId, NodeId>,
}

impl IdMaps {
    /// Reverse lookup: which version-graph id produced this merged id.
    fn original_v1(&self, merged: &NodeId) -> Option<&NodeId> {
        self.v1.iter().find(|(_, m)| *m == merged).map(|(id, _)| id)
    }

    fn original_v2(&self, merged: &NodeId) -> Option<&NodeId> {
        self.v2.iter().find(|(_, m)| *m == merged).map(|(id, _)| id)
    }
}

/// Merges two version graphs under a node mapping, producing one graph
/// in which every node carries a version status and evolution edges
/// explain what happened between the two versions.
pub struct GraphMerger<'c> {
    context: &'c mut MergeContext,
    config: MatchConfig,
    stats: MergeStats,
}

impl<'c> GraphMerger<'c> {
    pub fn new(context: &'c mut MergeContext, config: MatchConfig) -> Self {
        GraphMerger {
            context,
            config,
            stats: MergeStats::default(),
        }
    }

    /// Counters from the most recent merge.
    pub fn stats(&self) -> MergeStats {
        self.stats
    }

    pub fn merge(
        &mut self,
        v1_graph: &KnowledgeGraph,
        v2_graph: &KnowledgeGraph,
        mapping: &NodeMapping,
        refactorings: &[RefactoringInfo],
        diff: &DiffChangeSet,
        label_a: &str,
        label_b: &str,
    ) -> anyhow::Result<KnowledgeGraph> {
        info!(
            v1_nodes = v1_graph.node_count(),
            v2_nodes = v2_graph.node_count(),
            mapped = mapping.len(),
            facts = refactorings.len(),
            from = label_a,
            to = label_b,
            "merging version graphs"
        );

        self.stats = MergeStats::default();
        let mut merged = KnowledgeGraph::with_versions(label_a, label_b);
        let mut maps = IdMaps::default();
        let mut diff_pairs: Vec<(NodeId, NodeId)> = Vec::new();

        self.process_mapped_nodes(
            v1_graph, v2_graph, mapping, diff, &mut merged, &mut maps, &mut diff_pairs, label_a,
            label_b,
        )?;
        self.process_deleted_nodes(v1_graph, mapping, &mut merged, &mut maps, label_a);
        self.process_added_nodes(v2_graph, mapping, &mut merged, &mut maps, label_b);

        for fact in refactorings {
            self.apply_refactoring(
                fact, v1_graph, v2_graph, &mut merged, &mut maps, label_a, label_b,
            )?;
        }
        self.apply_diff_pairs(
            &diff_pairs, v1_graph, v2_graph, &mut merged, &mut maps, label_a, label_b,
        )?;

        self.merge_structural_edges(v1_graph, v2_graph, &mut merged, &maps);

        self.stats.report();
        Ok(merged)
    }

    #[allow(clippy::too_many_arguments)]
    fn process_mapped_nodes(
        &mut self,
        v1_graph: &KnowledgeGraph,
        v2_graph: &KnowledgeGraph,
        mapping: &NodeMapping,
        diff: &DiffChangeSet,
        merged: &mut KnowledgeGraph,
        maps: &mut IdMaps,
        diff_pairs: &mut Vec<(NodeId, NodeId)>,
        label_a: &str,
        label_b: &str,
    ) -> anyhow::Result<()> {
        for (v1_id, v2_id, confidence) in mapping.iter() {
            let (Some(v1_node), Some(v2_node)) = (v1_graph.node(v1_id), v2_graph.node(v2_id))
            else {
                warn!(v1 = %v1_id, v2 = %v2_id, "mapped node missing from its version graph");
                continue;
            };

            let forced = diff.is_changed(v1_id, v2_id);
            if confidence < 1.0 || forced {
                self.context.mark_tracked(v1_id);
                self.context.mark_tracked(v2_id);
                let v1_snap = self.add_snapshot(merged, v1_node, label_a, VersionStatus::Modified);
                maps.v1.insert(v1_id.clone(), v1_snap);
                let v2_snap = self.add_snapshot(merged, v2_node, label_b, VersionStatus::Modified);
                maps.v2.insert(v2_id.clone(), v2_snap);
                self.stats.modified += 1;
                if forced {
                    diff_pairs.push((v1_id.clone(), v2_id.clone()));
                }
            } else if self.context.is_tracked(v1_id) || self.context.is_tracked(v2_id) {
                self.process_tracked_unchanged(
                    merged, maps, v1_node, v2_node, label_a, label_b,
                )?;
            } else {
                // Identical on both sides: one canonical node carrying
                // both version labels.
                let mut collapsed = v2_node.clone();
                collapsed.status = VersionStatus::Unchanged;
                collapsed.versions.clear();
                collapsed.add_version(label_a);
                collapsed.add_version(label_b);
                collapsed.first_version = Some(label_a.to_string());
                collapsed.last_version = Some(label_b.to_string());
                let merged_id = collapsed.id.clone();
                merged.add_node(collapsed);
                maps.v1.insert(v1_id.clone(), merged_id.clone());
                maps.v2.insert(v2_id.clone(), merged_id);
                self.stats.unchanged += 1;
            }
        }
        Ok(())
    }

    /// An unchanged pair whose node is already part of an evolution
    /// chain: keep explicit per-version snapshots joined by an
    /// `Unchanged` edge, so the chain stays walkable on the timeline.
    fn process_tracked_unchanged(
        &mut self,
        merged: &mut KnowledgeGraph,
        maps: &mut IdMaps,
        v1_node: &Node,
        v2_node: &Node,
        label_a: &str,
        label_b: &str,
    ) -> anyhow::Result<()> {
        self.context.mark_tracked(&v1_node.id);
        self.context.mark_tracked(&v2_node.id);

        let v1_snap = self.add_snapshot(merged, v1_node, label_a, VersionStatus::Unchanged);
        maps.v1.insert(v1_node.id.clone(), v1_snap.clone());
        let v2_snap = self.add_snapshot(merged, v2_node, label_b, VersionStatus::Unchanged);
        maps.v2.insert(v2_node.id.clone(), v2_snap.clone());

        let edge = EvolutionEdge::new(
            v1_snap,
            v2_snap,
            EvolutionKind::Unchanged,
            "UNCHANGED",
            1.0,
            format!("No change detected between {label_a} and {label_b}"),
            label_a,
            label_b,
            Detector::Matcher,
        )?;
        if merged.add_evolution_edge(edge) {
            self.stats.evolution_edges += 1;
        }
        self.stats.unchanged += 1;
        Ok(())
    }

    fn process_deleted_nodes(
        &mut self,
        v1_graph: &KnowledgeGraph,
        mapping: &NodeMapping,
        merged: &mut KnowledgeGraph,
        maps: &mut IdMaps,
        label_a: &str,
    ) {
        for node in v1_graph.nodes() {
            if mapping.contains_source(&node.id) {
                continue;
            }
            let snap = self.add_snapshot(merged, node, label_a, VersionStatus::Deleted);
            maps.v1.insert(node.id.clone(), snap);
            self.context.mark_tracked(&node.id);
            self.stats.deleted += 1;
        }
    }

    fn process_added_nodes(
        &mut self,
        v2_graph: &KnowledgeGraph,
        mapping: &NodeMapping,
        merged: &mut KnowledgeGraph,
        maps: &mut IdMaps,
        label_b: &str,
    ) {
        for node in v2_graph.nodes() {
            if mapping.contains_target(&node.id) {
                continue;
            }
            let snap = self.add_snapshot(merged, node, label_b, VersionStatus::Added);
            maps.v2.insert(node.id.clone(), snap);
            self.context.mark_tracked(&node.id);
            self.stats.added += 1;
        }
    }

    /// Clone a version-graph node into the merged graph as a snapshot
    /// for one version label, decorated with that version's commit
    /// metadata. Returns the snapshot's merged id.
    fn add_snapshot(
        &self,
        merged: &mut KnowledgeGraph,
        node: &Node,
        label: &str,
        status: VersionStatus,
    ) -> NodeId {
        let mut snap = node.clone();
        snap.id = node.id.versioned(label);
        snap.set_version_snapshot(label, status);
        self.context.decorate(&mut snap, label);
        let id = snap.id.clone();
        merged.add_node(snap);
        id
    }

    #[allow(clippy::too_many_arguments)]
    fn apply_refactoring(
        &mut self,
        fact: &RefactoringInfo,
        v1_graph: &KnowledgeGraph,
        v2_graph: &KnowledgeGraph,
        merged: &mut KnowledgeGraph,
        maps: &mut IdMaps,
        label_a: &str,
        label_b: &str,
    ) -> anyhow::Result<()> {
        debug!(
            refactoring = %fact.refactoring_type,
            description = %fact.description,
            "applying refactoring fact"
        );

        let mut from_ids = self.resolve_locations(&fact.left_locations, v1_graph, &maps.v1, merged);
        let mut to_ids = self.resolve_locations(&fact.right_locations, v2_graph, &maps.v2, merged);

        if from_ids.is_empty() || to_ids.is_empty() {
            debug!(
                refactoring = %fact.refactoring_type,
                "locations did not resolve to any node, skipping fact"
            );
            self.stats.facts_skipped += 1;
            return Ok(());
        }

        // A resolved endpoint pair landing on one merged node means an
        // earlier unchanged collapse is contradicted by refactoring
        // evidence; split before wiring edges.
        for i in 0..from_ids.len() {
            for j in 0..to_ids.len() {
                if from_ids[i] == to_ids[j] {
                    let (v1_split, v2_split) = self.split_merged_node(
                        &from_ids[i], v1_graph, v2_graph, merged, maps, label_a, label_b,
                    );
                    from_ids[i] = v1_split;
                    to_ids[j] = v2_split;
                }
            }
        }

        let ty = fact.refactoring_type.as_str();
        let pairs: Vec<(NodeId, NodeId)> = if ty.starts_with("EXTRACT_") {
            // One source fans out to every extracted target.
            to_ids.iter().map(|to| (from_ids[0].clone(), to.clone())).collect()
        } else if ty.starts_with("INLINE_") || ty == "MOVE_AND_INLINE_METHOD" {
            // Every inlined source fans in to one target.
            from_ids.iter().map(|from| (from.clone(), to_ids[0].clone())).collect()
        } else {
            vec![(from_ids[0].clone(), to_ids[0].clone())]
        };

        for (from_id, to_id) in pairs {
            let (Some(from_node), Some(to_node)) =
                (merged.node(&from_id).cloned(), merged.node(&to_id).cloned())
            else {
                continue;
            };
            let edge = factory::build_edge(fact, &from_node, &to_node, label_a, label_b)?;
            let confidence = edge.confidence;
            if merged.add_evolution_edge(edge) {
                self.stats.evolution_edges += 1;
            }
            self.propagate_to_types(
                &fact.refactoring_type,
                &fact.description,
                confidence,
                &from_id,
                &to_id,
                v1_graph,
                v2_graph,
                merged,
                maps,
                label_a,
                label_b,
            )?;
        }
        self.stats.facts_applied += 1;
        Ok(())
    }

    /// Diff-flagged pairs that no refactoring fact explained get a
    /// generic lower-confidence edge so the change is still visible.
    #[allow(clippy::too_many_arguments)]
    fn apply_diff_pairs(
        &mut self,
        diff_pairs: &[(NodeId, NodeId)],
        v1_graph: &KnowledgeGraph,
        v2_graph: &KnowledgeGraph,
        merged: &mut KnowledgeGraph,
        maps: &mut IdMaps,
        label_a: &str,
        label_b: &str,
    ) -> anyhow::Result<()> {
        for (v1_id, v2_id) in diff_pairs {
            let (Some(from_id), Some(to_id)) = (maps.v1.get(v1_id), maps.v2.get(v2_id)) else {
                continue;
            };
            let (from_id, to_id) = (from_id.clone(), to_id.clone());
            if merged.has_evolution_between(&from_id, &to_id) {
                continue;
            }
            let description = "Code change detected by line-level diff";
            let edge = EvolutionEdge::new(
                from_id.clone(),
                to_id.clone(),
                EvolutionKind::Refactored { detail: None },
                "CODE_DIFF",
                0.7,
                description,
                label_a,
                label_b,
                Detector::Diff,
            )?;
            if merged.add_evolution_edge(edge) {
                self.stats.evolution_edges += 1;
            }
            self.propagate_to_types(
                "CODE_DIFF",
                description,
                0.7,
                &from_id,
                &to_id,
                v1_graph,
                v2_graph,
                merged,
                maps,
                label_a,
                label_b,
            )?;
        }
        Ok(())
    }

    /// Resolve a fact's code locations to merged-graph node ids, in
    /// location order, one best candidate per location, deduplicated.
    fn resolve_locations(
        &self,
        locations: &[CodeLocation],
        source_graph: &KnowledgeGraph,
        id_map: &BTreeMap<NodeId, NodeId>,
        merged: &KnowledgeGraph,
    ) -> Vec<NodeId> {
        let matcher = LocationMatcher::new(source_graph, self.config.line_tolerance);
        let mut out: Vec<NodeId> = Vec::new();
        for location in locations {
            let Some(node) = matcher.resolve(location) else {
                debug!(location = %location.render(), "unresolvable code location");
                continue;
            };
            let Some(merged_id) = id_map.get(&node.id) else {
                continue;
            };
            if merged.contains_node(merged_id) && !out.contains(merged_id) {
                out.push(merged_id.clone());
            }
        }
        out
    }

    /// Undo an unchanged collapse: turn the canonical node back into a
    /// version-A snapshot in place (its edges survive) and add a fresh
    /// version-B snapshot next to it.
    #[allow(clippy::too_many_arguments)]
    fn split_merged_node(
        &mut self,
        merged_id: &NodeId,
        v1_graph: &KnowledgeGraph,
        v2_graph: &KnowledgeGraph,
        merged: &mut KnowledgeGraph,
        maps: &mut IdMaps,
        label_a: &str,
        label_b: &str,
    ) -> (NodeId, NodeId) {
        let v1_orig = maps.original_v1(merged_id).cloned();
        let v2_orig = maps.original_v2(merged_id).cloned();
        let (Some(v1_orig), Some(v2_orig)) = (v1_orig, v2_orig) else {
            warn!(node = %merged_id, "cannot trace collapsed node back to its versions, split skipped");
            return (merged_id.clone(), merged_id.clone());
        };
        let (Some(v1_node), Some(v2_node)) = (v1_graph.node(&v1_orig), v2_graph.node(&v2_orig))
        else {
            warn!(node = %merged_id, "collapsed node's originals are gone, split skipped");
            return (merged_id.clone(), merged_id.clone());
        };

        debug!(node = %merged_id, "splitting collapsed node contradicted by refactoring evidence");

        // The in-place node keeps its id so edges already attached to it
        // stay valid; it becomes the version-A side.
        let mut v1_snap = v1_node.clone();
        v1_snap.id = merged_id.clone();
        v1_snap.set_version_snapshot(label_a, VersionStatus::Modified);
        self.context.decorate(&mut v1_snap, label_a);
        merged.add_node(v1_snap);

        let v2_id = self.add_snapshot(merged, v2_node, label_b, VersionStatus::Modified);
        maps.v2.insert(v2_orig, v2_id.clone());

        self.context.mark_tracked(&v1_orig);
        self.context.mark_tracked(&v2_id);
        self.stats.unchanged = self.stats.unchanged.saturating_sub(1);
        self.stats.modified += 1;

        (merged_id.clone(), v2_id)
    }

    /// A changed member means its enclosing type changed too: emit a
    /// derived `MEMBER_CHANGED` edge between the two enclosing types,
    /// splitting a collapsed type on demand.
    #[allow(clippy::too_many_arguments)]
    fn propagate_to_types(
        &mut self,
        fact_type: &str,
        description: &str,
        confidence: f64,
        from_member: &NodeId,
        to_member: &NodeId,
        v1_graph: &KnowledgeGraph,
        v2_graph: &KnowledgeGraph,
        merged: &mut KnowledgeGraph,
        maps: &mut IdMaps,
        label_a: &str,
        label_b: &str,
    ) -> anyhow::Result<()> {
        let is_member = merged
            .node(from_member)
            .is_some_and(|n| matches!(n.kind, NodeKind::Method | NodeKind::Field));
        if !is_member {
            return Ok(());
        }

        let from_type = maps
            .original_v1(from_member)
            .and_then(|orig| enclosing_type(v1_graph, orig))
            .and_then(|type_id| maps.v1.get(type_id))
            .cloned();
        let to_type = maps
            .original_v2(to_member)
            .and_then(|orig| enclosing_type(v2_graph, orig))
            .and_then(|type_id| maps.v2.get(type_id))
            .cloned();
        let (Some(mut from_type), Some(mut to_type)) = (from_type, to_type) else {
            return Ok(());
        };

        if from_type == to_type {
            let (split_a, split_b) = self.split_merged_node(
                &from_type, v1_graph, v2_graph, merged, maps, label_a, label_b,
            );
            if split_a == split_b {
                return Ok(());
            }
            from_type = split_a;
            to_type = split_b;
        }

        let edge = EvolutionEdge::new(
            from_type.clone(),
            to_type.clone(),
            EvolutionKind::Refactored {
                detail: Some(fact_type.to_string()),
            },
            "MEMBER_CHANGED",
            confidence,
            format!("Type changed due to member refactoring: {description}"),
            label_a,
            label_b,
            Detector::Propagation,
        )?;
        if merged.add_evolution_edge(edge) {
            self.stats.evolution_edges += 1;
        }
        debug!(from = %from_type, to = %to_type, "propagated member change to enclosing types");
        Ok(())
    }

    fn merge_structural_edges(
        &mut self,
        v1_graph: &KnowledgeGraph,
        v2_graph: &KnowledgeGraph,
        merged: &mut KnowledgeGraph,
        maps: &IdMaps,
    ) {
        for (graph, map) in [(v1_graph, &maps.v1), (v2_graph, &maps.v2)] {
            for edge in graph.edges() {
                let (Some(source), Some(target)) =
                    (map.get(&edge.source), map.get(&edge.target))
                else {
                    debug!(
                        source = %edge.source,
                        target = %edge.target,
                        kind = %edge.kind,
                        "structural edge endpoint has no merged counterpart, dropping"
                    );
                    self.stats.dropped_edges += 1;
                    continue;
                };
                if merged.add_edge(edge.with_endpoints(source.clone(), target.clone())) {
                    self.stats.structural_edges += 1;
                }
            }
        }
    }
}

/// The type declaring a member, found through its incoming `Declares`
/// edge in the member's own version graph.
fn enclosing_type<'g>(graph: &'g KnowledgeGraph, member: &NodeId) -> Option<&'g NodeId> {
    graph
        .edges_to(member)
        .find(|edge| edge.kind == evograph_core::EdgeKind::Declares)
        .map(|edge| &edge.source)
}
