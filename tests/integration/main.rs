//! End-to-end tests across matching, merging, and timeline folding.

use evograph_core::{
    CodeLocation, Edge, EdgeKind, GraphData, KnowledgeGraph, Node, NodeId, NodeKind,
    RefactoringInfo, TimelineVersion, VersionStatus,
};
use evograph_match::{MatchConfig, MatcherSet};
use evograph_merge::{GraphMerger, MergeContext, TimelineAggregator};

fn method(id: &str, name: &str, source: &str, file: &str, start: u32, end: u32) -> Node {
    let mut node = Node::new(id, NodeKind::Method, name, format!("A.{name}"));
    node.signature = Some(format!("A.{name}()"));
    node.source = Some(source.to_string());
    node.file_path = Some(file.to_string());
    node.line_start = Some(start);
    node.line_end = Some(end);
    node
}

fn type_node(id: &str, name: &str, file: &str, start: u32, end: u32) -> Node {
    let mut node = Node::new(id, NodeKind::Type, name, format!("com.acme.{name}"));
    node.file_path = Some(file.to_string());
    node.line_start = Some(start);
    node.line_end = Some(end);
    node
}

/// Two versions of a small project: a type declaring two methods, one of
/// which gets renamed between the versions.
fn sample_versions() -> (KnowledgeGraph, KnowledgeGraph) {
    let mut v1 = KnowledgeGraph::new();
    v1.add_node(type_node("t-widget", "Widget", "src/Widget.java", 1, 100));
    v1.add_node(method("m-render", "render", "draw();", "src/Widget.java", 10, 20));
    v1.add_node(method("m-old", "refresh", "render();", "src/Widget.java", 30, 40));
    v1.add_edge(Edge::new("t-widget", "m-render", EdgeKind::Declares));
    v1.add_edge(Edge::new("t-widget", "m-old", EdgeKind::Declares));
    v1.add_edge(Edge::new("m-old", "m-render", EdgeKind::Calls));

    let mut v2 = KnowledgeGraph::new();
    v2.add_node(type_node("t-widget", "Widget", "src/Widget.java", 1, 100));
    v2.add_node(method("m-render", "render", "draw();", "src/Widget.java", 10, 20));
    v2.add_node(method("m-new", "repaint", "render();", "src/Widget.java", 30, 40));
    v2.add_edge(Edge::new("t-widget", "m-render", EdgeKind::Declares));
    v2.add_edge(Edge::new("t-widget", "m-new", EdgeKind::Declares));
    v2.add_edge(Edge::new("m-new", "m-render", EdgeKind::Calls));

    (v1, v2)
}

fn rename_fact() -> RefactoringInfo {
    RefactoringInfo {
        refactoring_type: "RENAME_METHOD".to_string(),
        description: "Rename Method refresh() to repaint()".to_string(),
        confidence: 1.0,
        left_locations: vec![CodeLocation {
            file_path: "src/Widget.java".to_string(),
            start_line: 30,
            end_line: 40,
            element: "refresh".to_string(),
        }],
        right_locations: vec![CodeLocation {
            file_path: "src/Widget.java".to_string(),
            start_line: 30,
            end_line: 40,
            element: "repaint".to_string(),
        }],
    }
}

fn timeline_versions() -> Vec<TimelineVersion> {
    ["V1", "V2"]
        .iter()
        .enumerate()
        .map(|(i, label)| TimelineVersion {
            label: label.to_string(),
            order_index: i,
            commit_id: format!("commit-{i}"),
            short_id: String::new(),
            message: String::new(),
            author: String::new(),
            committed_at: None,
        })
        .collect()
}

fn run_merge() -> KnowledgeGraph {
    let (v1, v2) = sample_versions();
    let config = MatchConfig::default();
    let mapping = MatcherSet::new(config).build_mapping(&v1, &v2).unwrap();
    let mut context = MergeContext::new();
    let mut merger = GraphMerger::new(&mut context, config);
    merger
        .merge(&v1, &v2, &mapping, &[rename_fact()], &Default::default(), "V1", "V2")
        .unwrap()
}

#[test]
fn pipeline_produces_a_renamed_edge_and_consistent_statuses() {
    let merged = run_merge();

    // render survived untouched, refresh/repaint ended up unmatched.
    let unchanged = merged.node(&NodeId::new("m-render")).unwrap();
    assert_eq!(unchanged.status, VersionStatus::Unchanged);
    assert!(unchanged.versions.contains("V1") && unchanged.versions.contains("V2"));

    assert_eq!(
        merged.node(&NodeId::new("m-old@V1")).unwrap().status,
        VersionStatus::Deleted
    );
    assert_eq!(
        merged.node(&NodeId::new("m-new@V2")).unwrap().status,
        VersionStatus::Added
    );

    // The rename fact connects the deleted and added snapshots.
    let renamed: Vec<_> = merged
        .evolution_edges()
        .filter(|e| e.refactoring_type == "RENAME_METHOD")
        .collect();
    assert_eq!(renamed.len(), 1);
    assert_eq!(renamed[0].source, NodeId::new("m-old@V1"));
    assert_eq!(renamed[0].target, NodeId::new("m-new@V2"));

    // The member change propagated to the split Widget type.
    assert!(merged
        .evolution_edges()
        .any(|e| e.refactoring_type == "MEMBER_CHANGED"));
}

#[test]
fn merge_output_is_byte_identical_across_runs() {
    let first = serde_json::to_string_pretty(&run_merge().to_data()).unwrap();
    let second = serde_json::to_string_pretty(&run_merge().to_data()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn timeline_over_one_pairwise_graph_reproduces_its_counts() {
    let merged = run_merge();
    let mut aggregator = TimelineAggregator::new(&timeline_versions());
    aggregator.add_graph(&merged);
    let folded = aggregator.into_graph();

    assert_eq!(folded.node_count(), merged.node_count());
    assert_eq!(folded.edge_count(), merged.edge_count());
    assert_eq!(folded.evolution_count(), merged.evolution_count());
}

#[test]
fn graphs_survive_a_json_round_trip_on_disk() {
    let merged = run_merge();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("merged.json");

    let raw = serde_json::to_string_pretty(&merged.to_data()).unwrap();
    std::fs::write(&path, &raw).unwrap();

    let reloaded: GraphData =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let graph = KnowledgeGraph::from_data(reloaded);

    assert_eq!(graph.node_count(), merged.node_count());
    assert_eq!(graph.edge_count(), merged.edge_count());
    assert_eq!(graph.evolution_count(), merged.evolution_count());
    assert_eq!(
        serde_json::to_string_pretty(&graph.to_data()).unwrap(),
        raw
    );
}
