//! CLI command implementations

use std::path::{Path, PathBuf};

use anyhow::Context;

use evograph_core::{
    DiffChangeSet, GraphData, KnowledgeGraph, RefactoringInfo, TimelineVersion,
};
use evograph_match::{MatchConfig, MatcherSet};
use evograph_merge::{GraphMerger, MergeContext, TimelineAggregator};

pub struct MergeArgs {
    pub root: PathBuf,
    pub v1: PathBuf,
    pub v2: PathBuf,
    pub refactorings: Option<PathBuf>,
    pub diff: Option<PathBuf>,
    pub versions: Option<PathBuf>,
    pub from_label: String,
    pub to_label: String,
    pub output: PathBuf,
}

pub fn merge(args: MergeArgs) -> anyhow::Result<()> {
    let config = MatchConfig::load_or_default(&args.root)?;

    let v1 = load_graph(&args.v1)?;
    let v2 = load_graph(&args.v2)?;
    let refactorings: Vec<RefactoringInfo> = match &args.refactorings {
        Some(path) => load_json(path)?,
        None => Vec::new(),
    };
    let diff: DiffChangeSet = match &args.diff {
        Some(path) => load_json(path)?,
        None => DiffChangeSet::default(),
    };

    let mut context = MergeContext::new();
    if let Some(path) = &args.versions {
        let versions: Vec<TimelineVersion> = load_json(path)?;
        for version in versions {
            context.register_version(version);
        }
    }

    let mapping = MatcherSet::new(config).build_mapping(&v1, &v2)?;

    let mut merger = GraphMerger::new(&mut context, config);
    let merged = merger.merge(
        &v1,
        &v2,
        &mapping,
        &refactorings,
        &diff,
        &args.from_label,
        &args.to_label,
    )?;

    save_graph(&merged, &args.output)?;
    tracing::info!("Merged graph written to {}", args.output.display());
    Ok(())
}

pub fn timeline(inputs: Vec<PathBuf>, versions: PathBuf, output: PathBuf) -> anyhow::Result<()> {
    let timeline: Vec<TimelineVersion> = load_json(&versions)?;
    let mut aggregator = TimelineAggregator::new(&timeline);

    for input in &inputs {
        let graph = load_graph(input)?;
        aggregator.add_graph(&graph);
    }

    let folded = aggregator.into_graph();
    save_graph(&folded, &output)?;
    tracing::info!("Timeline graph written to {}", output.display());
    Ok(())
}

pub fn load_graph(path: &Path) -> anyhow::Result<KnowledgeGraph> {
    let data: GraphData = load_json(path)?;
    Ok(KnowledgeGraph::from_data(data))
}

pub fn save_graph(graph: &KnowledgeGraph, path: &Path) -> anyhow::Result<()> {
    let raw = serde_json::to_string_pretty(&graph.to_data())
        .context("serializing graph")?;
    std::fs::write(path, raw).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}
