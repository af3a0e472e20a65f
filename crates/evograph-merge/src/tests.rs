use evograph_core::{
    CodeLocation, Edge, EdgeKind, EvolutionKey, EvolutionKind, KnowledgeGraph, Node, NodeId,
    NodeKind, NodeMapping, RefactoringInfo, TimelineVersion, VersionStatus,
};
use evograph_match::MatchConfig;

use crate::context::MergeContext;
use crate::merger::GraphMerger;
use crate::timeline::TimelineAggregator;

fn method(id: &str, name: &str, file: &str, start: u32, end: u32) -> Node {
    let mut node = Node::new(id, NodeKind::Method, name, format!("A.{name}"));
    node.signature = Some(format!("A.{name}()"));
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

fn graph_of(nodes: Vec<Node>) -> KnowledgeGraph {
    let mut graph = KnowledgeGraph::new();
    for node in nodes {
        graph.add_node(node);
    }
    graph
}

fn location(file: &str, start: u32, end: u32, element: &str) -> CodeLocation {
    CodeLocation {
        file_path: file.to_string(),
        start_line: start,
        end_line: end,
        element: element.to_string(),
    }
}

fn fact(ty: &str, left: Vec<CodeLocation>, right: Vec<CodeLocation>) -> RefactoringInfo {
    RefactoringInfo {
        refactoring_type: ty.to_string(),
        description: format!("{ty} detected"),
        confidence: 1.0,
        left_locations: left,
        right_locations: right,
    }
}

fn merge(
    context: &mut MergeContext,
    v1: &KnowledgeGraph,
    v2: &KnowledgeGraph,
    mapping: &NodeMapping,
    facts: &[RefactoringInfo],
    diff: &evograph_core::DiffChangeSet,
) -> KnowledgeGraph {
    let mut merger = GraphMerger::new(context, MatchConfig::default());
    merger
        .merge(v1, v2, mapping, facts, diff, "V1", "V2")
        .unwrap()
}

fn statuses(graph: &KnowledgeGraph, status: VersionStatus) -> Vec<&NodeId> {
    graph
        .nodes()
        .filter(|n| n.status == status)
        .map(|n| &n.id)
        .collect()
}

#[test]
fn identical_pair_collapses_into_one_unchanged_node() {
    let v1 = graph_of(vec![method("m1", "foo", "src/A.java", 10, 20)]);
    let v2 = graph_of(vec![method("m1", "foo", "src/A.java", 10, 20)]);
    let mut mapping = NodeMapping::new();
    mapping.insert("m1".into(), "m1".into(), 1.0).unwrap();

    let mut context = MergeContext::new();
    let merged = merge(&mut context, &v1, &v2, &mapping, &[], &Default::default());

    assert_eq!(merged.node_count(), 1);
    let node = merged.node(&NodeId::new("m1")).unwrap();
    assert_eq!(node.status, VersionStatus::Unchanged);
    assert!(node.versions.contains("V1") && node.versions.contains("V2"));
    assert_eq!(node.first_version.as_deref(), Some("V1"));
    assert_eq!(node.last_version.as_deref(), Some("V2"));
}

#[test]
fn imperfect_confidence_keeps_both_version_snapshots() {
    let v1 = graph_of(vec![method("m1", "foo", "src/A.java", 10, 20)]);
    let v2 = graph_of(vec![method("m1", "foo", "src/A.java", 10, 22)]);
    let mut mapping = NodeMapping::new();
    mapping.insert("m1".into(), "m1".into(), 0.8).unwrap();

    let mut context = MergeContext::new();
    let merged = merge(&mut context, &v1, &v2, &mapping, &[], &Default::default());

    assert_eq!(merged.node_count(), 2);
    assert!(merged.contains_node(&NodeId::new("m1@V1")));
    assert!(merged.contains_node(&NodeId::new("m1@V2")));
    assert_eq!(statuses(&merged, VersionStatus::Modified).len(), 2);
    // Nothing explains the change, so no evolution edge appears.
    assert_eq!(merged.evolution_count(), 0);
}

#[test]
fn unmapped_nodes_become_deleted_and_added() {
    let v1 = graph_of(vec![method("gone", "foo", "src/A.java", 10, 20)]);
    let v2 = graph_of(vec![method("new", "bar", "src/A.java", 30, 40)]);
    let mapping = NodeMapping::new();

    let mut context = MergeContext::new();
    let merged = merge(&mut context, &v1, &v2, &mapping, &[], &Default::default());

    let deleted = merged.node(&NodeId::new("gone@V1")).unwrap();
    assert_eq!(deleted.status, VersionStatus::Deleted);
    assert_eq!(deleted.versions.iter().collect::<Vec<_>>(), vec!["V1"]);
    let added = merged.node(&NodeId::new("new@V2")).unwrap();
    assert_eq!(added.status, VersionStatus::Added);
    assert_eq!(added.versions.iter().collect::<Vec<_>>(), vec!["V2"]);
}

#[test]
fn rename_fact_produces_a_renamed_edge_with_old_and_new_names() {
    let v1 = graph_of(vec![method("m-foo", "foo", "src/A.java", 10, 20)]);
    let v2 = graph_of(vec![method("m-bar", "bar", "src/A.java", 10, 20)]);
    let mapping = NodeMapping::new();
    let facts = vec![fact(
        "RENAME_METHOD",
        vec![location("src/A.java", 10, 20, "foo")],
        vec![location("src/A.java", 10, 20, "bar")],
    )];

    let mut context = MergeContext::new();
    let merged = merge(&mut context, &v1, &v2, &mapping, &facts, &Default::default());

    let key = EvolutionKey {
        source: NodeId::new("m-foo@V1"),
        label: "RENAMED",
        target: NodeId::new("m-bar@V2"),
    };
    let edge = merged.evolution_edge(&key).expect("renamed edge");
    match &edge.kind {
        EvolutionKind::Renamed {
            subject,
            old_name,
            new_name,
        } => {
            assert_eq!(subject, "method");
            assert_eq!(old_name, "foo");
            assert_eq!(new_name, "bar");
        }
        other => panic!("unexpected kind {other:?}"),
    }
    assert_eq!(edge.refactoring_type, "RENAME_METHOD");
}

#[test]
fn hierarchy_refactorings_carry_their_subtype_detail() {
    let from = method("m-from", "foo", "src/Base.java", 10, 20);
    let to = method("m-to", "foo", "src/Parent.java", 10, 20);

    for (ty, detail) in [
        ("PULL_UP_METHOD", "pull_up"),
        ("PULL_UP_ATTRIBUTE", "pull_up"),
        ("PUSH_DOWN_METHOD", "push_down"),
        ("MERGE_VARIABLE", "merge"),
        ("SPLIT_CLASS", "split"),
        ("PARAMETERIZE_VARIABLE", "parameterize"),
        ("REPLACE_VARIABLE_WITH_ATTRIBUTE", "replace"),
    ] {
        let edge =
            crate::factory::build_edge(&fact(ty, vec![], vec![]), &from, &to, "V1", "V2").unwrap();
        match &edge.kind {
            EvolutionKind::Refactored { detail: Some(d) } => assert_eq!(d, detail, "{ty}"),
            other => panic!("unexpected kind for {ty}: {other:?}"),
        }
    }
}

#[test]
fn unknown_refactoring_type_falls_back_without_a_subtype() {
    let from = method("m-from", "foo", "src/A.java", 10, 20);
    let to = method("m-to", "foo", "src/A.java", 10, 20);

    let edge = crate::factory::build_edge(
        &fact("SOME_FUTURE_TYPE", vec![], vec![]),
        &from,
        &to,
        "V1",
        "V2",
    )
    .unwrap();

    assert!(matches!(
        edge.kind,
        EvolutionKind::Refactored { detail: None }
    ));
    assert_eq!(edge.refactoring_type, "SOME_FUTURE_TYPE");
}

#[test]
fn extract_fact_fans_out_to_every_target() {
    let v1 = graph_of(vec![method("m-big", "big", "src/A.java", 10, 60)]);
    let v2 = graph_of(vec![
        method("m-big", "big", "src/A.java", 10, 30),
        method("m-part1", "part1", "src/A.java", 40, 50),
        method("m-part2", "part2", "src/A.java", 55, 65),
    ]);
    let mut mapping = NodeMapping::new();
    mapping.insert("m-big".into(), "m-big".into(), 0.8).unwrap();
    let facts = vec![fact(
        "EXTRACT_METHOD",
        vec![location("src/A.java", 10, 60, "big")],
        vec![
            location("src/A.java", 40, 50, "part1"),
            location("src/A.java", 55, 65, "part2"),
        ],
    )];

    let mut context = MergeContext::new();
    let merged = merge(&mut context, &v1, &v2, &mapping, &facts, &Default::default());

    let sources: Vec<_> = merged
        .evolution_edges()
        .filter(|e| matches!(e.kind, EvolutionKind::Extracted { .. }))
        .map(|e| (e.source.clone(), e.target.clone()))
        .collect();
    assert_eq!(sources.len(), 2);
    assert!(sources.iter().all(|(s, _)| s == &NodeId::new("m-big@V1")));
    let targets: Vec<_> = sources.iter().map(|(_, t)| t.clone()).collect();
    assert!(targets.contains(&NodeId::new("m-part1@V2")));
    assert!(targets.contains(&NodeId::new("m-part2@V2")));
}

#[test]
fn repeated_facts_aggregate_into_one_edge() {
    let v1 = graph_of(vec![method("m-foo", "foo", "src/A.java", 10, 20)]);
    let v2 = graph_of(vec![method("m-bar", "bar", "src/A.java", 10, 20)]);
    let mapping = NodeMapping::new();
    let mut first = fact(
        "RENAME_METHOD",
        vec![location("src/A.java", 10, 20, "foo")],
        vec![location("src/A.java", 10, 20, "bar")],
    );
    first.confidence = 0.9;
    let mut second = first.clone();
    second.confidence = 0.6;
    second.description = "second report".to_string();

    let mut context = MergeContext::new();
    let merged = merge(
        &mut context,
        &v1,
        &v2,
        &mapping,
        &[first, second],
        &Default::default(),
    );

    let edges: Vec<_> = merged
        .evolution_edges()
        .filter(|e| matches!(e.kind, EvolutionKind::Renamed { .. }))
        .collect();
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].occurrences, 2);
    assert_eq!(edges[0].confidence, 0.9);
    assert!(edges[0].descriptions.iter().any(|d| d == "second report"));
}

#[test]
fn contradicting_fact_splits_a_collapsed_node() {
    // Signature and source identical, so the matcher said unchanged, but
    // a refactoring fact points at both sides of the same merged node.
    let v1 = graph_of(vec![method("m1", "foo", "src/A.java", 10, 20)]);
    let v2 = graph_of(vec![method("m1", "foo", "src/A.java", 10, 20)]);
    let mut mapping = NodeMapping::new();
    mapping.insert("m1".into(), "m1".into(), 1.0).unwrap();
    let facts = vec![fact(
        "RENAME_VARIABLE",
        vec![location("src/A.java", 10, 20, "foo")],
        vec![location("src/A.java", 10, 20, "foo")],
    )];

    let mut context = MergeContext::new();
    let merged = merge(&mut context, &v1, &v2, &mapping, &facts, &Default::default());

    // The collapsed node became the V1 side and a V2 snapshot appeared.
    assert_eq!(merged.node_count(), 2);
    let v1_side = merged.node(&NodeId::new("m1")).unwrap();
    assert_eq!(v1_side.status, VersionStatus::Modified);
    assert_eq!(v1_side.versions.iter().collect::<Vec<_>>(), vec!["V1"]);
    let v2_side = merged.node(&NodeId::new("m1@V2")).unwrap();
    assert_eq!(v2_side.status, VersionStatus::Modified);

    let key = EvolutionKey {
        source: NodeId::new("m1"),
        label: "RENAMED",
        target: NodeId::new("m1@V2"),
    };
    assert!(merged.evolution_edge(&key).is_some());
}

#[test]
fn member_change_propagates_to_the_enclosing_types() {
    let mut v1 = graph_of(vec![
        type_node("t1", "Widget", "src/Widget.java", 1, 100),
        method("m-foo", "foo", "src/Widget.java", 10, 20),
    ]);
    v1.add_edge(Edge::new("t1", "m-foo", EdgeKind::Declares));
    let mut v2 = graph_of(vec![
        type_node("t1", "Widget", "src/Widget.java", 1, 100),
        method("m-bar", "bar", "src/Widget.java", 10, 20),
    ]);
    v2.add_edge(Edge::new("t1", "m-bar", EdgeKind::Declares));

    let mut mapping = NodeMapping::new();
    mapping.insert("t1".into(), "t1".into(), 1.0).unwrap();
    mapping.insert("m-foo".into(), "m-bar".into(), 0.7).unwrap();

    let facts = vec![fact(
        "RENAME_METHOD",
        vec![location("src/Widget.java", 10, 20, "foo")],
        vec![location("src/Widget.java", 10, 20, "bar")],
    )];

    let mut context = MergeContext::new();
    let merged = merge(&mut context, &v1, &v2, &mapping, &facts, &Default::default());

    // The collapsed type split into per-version nodes to host the edge.
    let key = EvolutionKey {
        source: NodeId::new("t1"),
        label: "REFACTORED",
        target: NodeId::new("t1@V2"),
    };
    let edge = merged.evolution_edge(&key).expect("propagated type edge");
    assert_eq!(edge.refactoring_type, "MEMBER_CHANGED");
    assert!(edge.description.contains("member refactoring"));
}

#[test]
fn diff_flag_forces_modified_and_emits_a_fallback_edge() {
    let v1 = graph_of(vec![method("m1", "foo", "src/A.java", 10, 20)]);
    let v2 = graph_of(vec![method("m1", "foo", "src/A.java", 10, 20)]);
    let mut mapping = NodeMapping::new();
    mapping.insert("m1".into(), "m1".into(), 1.0).unwrap();
    let mut diff = evograph_core::DiffChangeSet::default();
    diff.changed_v1.insert(NodeId::new("m1"));

    let mut context = MergeContext::new();
    let merged = merge(&mut context, &v1, &v2, &mapping, &[], &diff);

    assert_eq!(statuses(&merged, VersionStatus::Modified).len(), 2);
    let key = EvolutionKey {
        source: NodeId::new("m1@V1"),
        label: "REFACTORED",
        target: NodeId::new("m1@V2"),
    };
    let edge = merged.evolution_edge(&key).expect("diff fallback edge");
    assert_eq!(edge.refactoring_type, "CODE_DIFF");
    assert_eq!(edge.confidence, 0.7);
}

#[test]
fn previously_seen_unchanged_pair_keeps_explicit_snapshots() {
    // First merge marks the node as part of a change.
    let v1 = graph_of(vec![method("m1", "foo", "src/A.java", 10, 20)]);
    let v2 = graph_of(vec![method("m1", "foo", "src/A.java", 10, 22)]);
    let mut mapping = NodeMapping::new();
    mapping.insert("m1".into(), "m1".into(), 0.8).unwrap();
    let mut context = MergeContext::new();
    merge(&mut context, &v1, &v2, &mapping, &[], &Default::default());

    // The next pair is unchanged, but the node is tracked now.
    let v2b = graph_of(vec![method("m1", "foo", "src/A.java", 10, 22)]);
    let v3 = graph_of(vec![method("m1", "foo", "src/A.java", 10, 22)]);
    let mut mapping2 = NodeMapping::new();
    mapping2.insert("m1".into(), "m1".into(), 1.0).unwrap();
    let mut merger = GraphMerger::new(&mut context, MatchConfig::default());
    let merged = merger
        .merge(&v2b, &v3, &mapping2, &[], &Default::default(), "V2", "V3")
        .unwrap();

    assert!(merged.contains_node(&NodeId::new("m1@V2")));
    assert!(merged.contains_node(&NodeId::new("m1@V3")));
    let key = EvolutionKey {
        source: NodeId::new("m1@V2"),
        label: "UNCHANGED",
        target: NodeId::new("m1@V3"),
    };
    assert!(merged.evolution_edge(&key).is_some());
}

#[test]
fn structural_edges_are_remapped_and_deduplicated() {
    let mut v1 = graph_of(vec![
        method("m-a", "a", "src/A.java", 1, 5),
        method("m-b", "b", "src/A.java", 10, 15),
    ]);
    v1.add_edge(Edge::new("m-a", "m-b", EdgeKind::Calls));
    let mut v2 = graph_of(vec![
        method("m-a", "a", "src/A.java", 1, 5),
        method("m-b", "b", "src/A.java", 10, 15),
    ]);
    v2.add_edge(Edge::new("m-a", "m-b", EdgeKind::Calls));

    let mut mapping = NodeMapping::new();
    mapping.insert("m-a".into(), "m-a".into(), 1.0).unwrap();
    mapping.insert("m-b".into(), "m-b".into(), 1.0).unwrap();

    let mut context = MergeContext::new();
    let merged = merge(&mut context, &v1, &v2, &mapping, &[], &Default::default());

    // Both versions contribute the same call edge between the two
    // collapsed nodes; only one survives.
    assert_eq!(merged.edge_count(), 1);
}

#[test]
fn commit_metadata_decorates_version_snapshots() {
    let v1 = graph_of(vec![method("m1", "foo", "src/A.java", 10, 20)]);
    let v2 = graph_of(vec![method("m1", "foo", "src/A.java", 10, 22)]);
    let mut mapping = NodeMapping::new();
    mapping.insert("m1".into(), "m1".into(), 0.8).unwrap();

    let mut context = MergeContext::new();
    context.register_version(TimelineVersion {
        label: "V2".to_string(),
        order_index: 1,
        commit_id: "deadbeef".to_string(),
        short_id: "deadbee".to_string(),
        message: "tweak foo".to_string(),
        author: "dev".to_string(),
        committed_at: Some(1_700_000_000),
    });
    let merged = merge(&mut context, &v1, &v2, &mapping, &[], &Default::default());

    let snap = merged.node(&NodeId::new("m1@V2")).unwrap();
    assert_eq!(snap.extra.get("commit_id").map(String::as_str), Some("deadbeef"));
    assert_eq!(snap.extra.get("commit_author").map(String::as_str), Some("dev"));
    // The other side has no registered metadata.
    let other = merged.node(&NodeId::new("m1@V1")).unwrap();
    assert!(!other.extra.contains_key("commit_id"));
}

// ── timeline ────────────────────────────────────────────────

fn timeline(labels: &[(&str, &str)]) -> Vec<TimelineVersion> {
    labels
        .iter()
        .enumerate()
        .map(|(i, (label, commit))| TimelineVersion {
            label: label.to_string(),
            order_index: i,
            commit_id: commit.to_string(),
            short_id: String::new(),
            message: String::new(),
            author: String::new(),
            committed_at: None,
        })
        .collect()
}

#[test]
fn single_graph_timeline_preserves_all_counts() {
    let mut v1 = graph_of(vec![
        method("m-foo", "foo", "src/A.java", 10, 20),
        method("m-gone", "gone", "src/A.java", 30, 40),
    ]);
    v1.add_edge(Edge::new("m-foo", "m-gone", EdgeKind::Calls));
    let v2 = graph_of(vec![method("m-bar", "bar", "src/A.java", 10, 20)]);
    let mapping = NodeMapping::new();
    let facts = vec![fact(
        "RENAME_METHOD",
        vec![location("src/A.java", 10, 20, "foo")],
        vec![location("src/A.java", 10, 20, "bar")],
    )];

    let mut context = MergeContext::new();
    let merged = merge(&mut context, &v1, &v2, &mapping, &facts, &Default::default());

    let mut aggregator = TimelineAggregator::new(&timeline(&[("V1", "c1"), ("V2", "c2")]));
    aggregator.add_graph(&merged);
    let folded = aggregator.into_graph();

    assert_eq!(folded.node_count(), merged.node_count());
    assert_eq!(folded.edge_count(), merged.edge_count());
    assert_eq!(folded.evolution_count(), merged.evolution_count());
}

#[test]
fn timeline_widens_status_and_unions_versions() {
    let mut unchanged = method("m1", "foo", "src/A.java", 10, 20);
    unchanged.status = VersionStatus::Unchanged;
    unchanged.add_version("V1");
    unchanged.add_version("V2");
    unchanged.first_version = Some("V1".to_string());
    unchanged.last_version = Some("V2".to_string());
    let pair_one = graph_of(vec![unchanged]);

    let mut modified = method("m1", "foo", "src/A.java", 10, 20);
    modified.status = VersionStatus::Modified;
    modified.add_version("V3");
    modified.first_version = Some("V2".to_string());
    modified.last_version = Some("V3".to_string());
    let pair_two = graph_of(vec![modified]);

    let mut aggregator =
        TimelineAggregator::new(&timeline(&[("V1", "c1"), ("V2", "c2"), ("V3", "c3")]));
    aggregator.add_graph(&pair_one);
    aggregator.add_graph(&pair_two);
    let folded = aggregator.into_graph();

    let node = folded.node(&NodeId::new("m1")).unwrap();
    assert_eq!(node.status, VersionStatus::Modified);
    assert_eq!(
        node.versions.iter().collect::<Vec<_>>(),
        vec!["V1", "V2", "V3"]
    );
    assert_eq!(node.first_version.as_deref(), Some("V1"));
    assert_eq!(node.last_version.as_deref(), Some("V3"));
}

#[test]
fn timeline_normalizes_commit_ids_to_labels() {
    let mut node = method("m1", "foo", "src/A.java", 10, 20);
    node.status = VersionStatus::Modified;
    node.add_version("c2");
    node.first_version = Some("c1".to_string());
    node.last_version = Some("c2".to_string());
    let graph = graph_of(vec![node]);

    let mut aggregator = TimelineAggregator::new(&timeline(&[("V1", "c1"), ("V2", "c2")]));
    aggregator.add_graph(&graph);
    let folded = aggregator.into_graph();

    let node = folded.node(&NodeId::new("m1")).unwrap();
    assert!(node.versions.contains("V2"));
    assert!(!node.versions.contains("c2"));
    assert_eq!(node.first_version.as_deref(), Some("V1"));
    assert_eq!(node.last_version.as_deref(), Some("V2"));
}

#[test]
fn timeline_keeps_the_more_confident_duplicate_edge() {
    let make = |confidence: f64, description: &str| {
        let mut graph = graph_of(vec![
            method("m-foo@V1", "foo", "src/A.java", 10, 20),
            method("m-bar@V2", "bar", "src/A.java", 10, 20),
        ]);
        let edge = evograph_core::EvolutionEdge::new(
            NodeId::new("m-foo@V1"),
            NodeId::new("m-bar@V2"),
            EvolutionKind::Renamed {
                subject: "method".to_string(),
                old_name: "foo".to_string(),
                new_name: "bar".to_string(),
            },
            "RENAME_METHOD",
            confidence,
            description,
            "V1",
            "V2",
            evograph_core::Detector::Refactoring,
        )
        .unwrap();
        graph.insert_evolution_edge(edge);
        graph
    };

    let mut aggregator = TimelineAggregator::new(&timeline(&[("V1", "c1"), ("V2", "c2")]));
    aggregator.add_graph(&make(0.6, "weak report"));
    aggregator.add_graph(&make(0.9, "strong report"));
    let folded = aggregator.into_graph();

    let key = EvolutionKey {
        source: NodeId::new("m-foo@V1"),
        label: "RENAMED",
        target: NodeId::new("m-bar@V2"),
    };
    let edge = folded.evolution_edge(&key).unwrap();
    assert_eq!(edge.confidence, 0.9);
    assert_eq!(edge.description, "strong report");
    // The fold reconciles duplicates without inflating occurrences.
    assert_eq!(edge.occurrences, 1);
}
