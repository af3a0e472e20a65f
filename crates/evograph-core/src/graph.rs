//! Versioned knowledge-graph container built on petgraph::StableDiGraph

use std::collections::{BTreeMap, BTreeSet};

use petgraph::Direction;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use serde::{Deserialize, Serialize};

use crate::evolution::{EvolutionEdge, EvolutionKey};
use crate::model::{Edge, EdgeKey, Node, NodeId, NodeKind};

/// One version graph, or the merged graph spanning several versions.
///
/// Structural edges live in the petgraph store; evolution edges are kept
/// in their own keyed map because they aggregate instead of duplicating.
/// Node iteration follows id order, so every walk over the graph is
/// deterministic regardless of insertion history.
pub struct KnowledgeGraph {
    inner: StableDiGraph<Node, Edge>,
    index: BTreeMap<NodeId, NodeIndex>,
    edge_keys: BTreeSet<EdgeKey>,
    evolution: BTreeMap<EvolutionKey, EvolutionEdge>,
    pub from_version: Option<String>,
    pub to_version: Option<String>,
}

impl std::fmt::Debug for KnowledgeGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeGraph")
            .field("node_count", &self.node_count())
            .field("edge_count", &self.edge_count())
            .field("evolution_count", &self.evolution_count())
            .field("from_version", &self.from_version)
            .field("to_version", &self.to_version)
            .finish()
    }
}

impl KnowledgeGraph {
    pub fn new() -> Self {
        KnowledgeGraph {
            inner: StableDiGraph::new(),
            index: BTreeMap::new(),
            edge_keys: BTreeSet::new(),
            evolution: BTreeMap::new(),
            from_version: None,
            to_version: None,
        }
    }

    pub fn with_versions(from: impl Into<String>, to: impl Into<String>) -> Self {
        let mut graph = Self::new();
        graph.from_version = Some(from.into());
        graph.to_version = Some(to.into());
        graph
    }

    /// Insert a node. A node with the same id is replaced in place,
    /// keeping its edges.
    pub fn add_node(&mut self, node: Node) {
        match self.index.get(&node.id) {
            Some(&idx) => {
                if let Some(weight) = self.inner.node_weight_mut(idx) {
                    *weight = node;
                }
            }
            None => {
                let id = node.id.clone();
                let idx = self.inner.add_node(node);
                self.index.insert(id, idx);
            }
        }
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.index.get(id).and_then(|&idx| self.inner.node_weight(idx))
    }

    pub fn node_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
        match self.index.get(id) {
            Some(&idx) => self.inner.node_weight_mut(idx),
            None => None,
        }
    }

    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.index.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    pub fn evolution_count(&self) -> usize {
        self.evolution.len()
    }

    /// Iterate all nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.index.values().filter_map(|&idx| self.inner.node_weight(idx))
    }

    /// Iterate node ids in order.
    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.index.keys()
    }

    /// Iterate nodes of one kind, in id order.
    pub fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = &Node> {
        self.nodes().filter(move |n| n.kind == kind)
    }

    /// Add a structural edge. Returns false when the edge was dropped:
    /// either a duplicate (source, kind, target) where the first occurrence
    /// wins, or an endpoint that is not present in this graph.
    pub fn add_edge(&mut self, edge: Edge) -> bool {
        let key = edge.key();
        if self.edge_keys.contains(&key) {
            return false;
        }
        let (Some(&source), Some(&target)) =
            (self.index.get(&edge.source), self.index.get(&edge.target))
        else {
            tracing::debug!(
                source = %edge.source,
                target = %edge.target,
                kind = %edge.kind,
                "dropping edge with missing endpoint"
            );
            return false;
        };
        self.inner.add_edge(source, target, edge);
        self.edge_keys.insert(key);
        true
    }

    pub fn has_edge(&self, key: &EdgeKey) -> bool {
        self.edge_keys.contains(key)
    }

    /// Iterate all structural edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.inner
            .edge_indices()
            .filter_map(|idx| self.inner.edge_weight(idx))
    }

    /// Outgoing structural edges of a node.
    pub fn edges_from(&self, source: &NodeId) -> impl Iterator<Item = &Edge> {
        self.directed_edges(source, Direction::Outgoing)
    }

    /// Incoming structural edges of a node.
    pub fn edges_to(&self, target: &NodeId) -> impl Iterator<Item = &Edge> {
        self.directed_edges(target, Direction::Incoming)
    }

    fn directed_edges(&self, id: &NodeId, direction: Direction) -> impl Iterator<Item = &Edge> {
        self.index
            .get(id)
            .into_iter()
            .flat_map(move |&idx| self.inner.edges_directed(idx, direction))
            .map(|edge_ref| edge_ref.weight())
    }

    /// Add an evolution edge. A repeat of the same (source, kind label,
    /// target) is folded into the existing edge instead of duplicated.
    /// Returns true when a new edge was created.
    pub fn add_evolution_edge(&mut self, edge: EvolutionEdge) -> bool {
        let key = edge.key();
        match self.evolution.get_mut(&key) {
            Some(existing) => {
                existing.absorb(&edge);
                false
            }
            None => {
                self.evolution.insert(key, edge);
                true
            }
        }
    }

    pub fn evolution_edge(&self, key: &EvolutionKey) -> Option<&EvolutionEdge> {
        self.evolution.get(key)
    }

    pub fn evolution_edge_mut(&mut self, key: &EvolutionKey) -> Option<&mut EvolutionEdge> {
        self.evolution.get_mut(key)
    }

    /// Insert an evolution edge verbatim, without aggregation. Used by the
    /// timeline fold, which reconciles repeats itself.
    pub fn insert_evolution_edge(&mut self, edge: EvolutionEdge) {
        self.evolution.insert(edge.key(), edge);
    }

    /// Iterate evolution edges in key order.
    pub fn evolution_edges(&self) -> impl Iterator<Item = &EvolutionEdge> {
        self.evolution.values()
    }

    /// Whether any evolution edge connects the two merged nodes.
    pub fn has_evolution_between(&self, source: &NodeId, target: &NodeId) -> bool {
        self.evolution
            .values()
            .any(|e| &e.source == source && &e.target == target)
    }

    /// Flatten into the serializable exchange form.
    pub fn to_data(&self) -> GraphData {
        GraphData {
            from_version: self.from_version.clone(),
            to_version: self.to_version.clone(),
            nodes: self.nodes().cloned().collect(),
            edges: self.edges().cloned().collect(),
            evolution: self.evolution_edges().cloned().collect(),
        }
    }

    /// Rebuild a graph from its exchange form. Edges referencing unknown
    /// nodes are dropped (and logged) rather than failing the load.
    pub fn from_data(data: GraphData) -> Self {
        let mut graph = KnowledgeGraph::new();
        graph.from_version = data.from_version;
        graph.to_version = data.to_version;
        for node in data.nodes {
            graph.add_node(node);
        }
        for edge in data.edges {
            graph.add_edge(edge);
        }
        for edge in data.evolution {
            graph.insert_evolution_edge(edge);
        }
        graph
    }
}

impl Default for KnowledgeGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Flat JSON exchange form of a [`KnowledgeGraph`]. Version graphs arrive
/// in this shape from the front end; merged and timeline graphs leave in
/// it toward the persistence layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_version: Option<String>,
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub evolution: Vec<EvolutionEdge>,
}
