//! Evograph Core — versioned graph model, evolution edges, and node mapping

pub mod evolution;
pub mod facts;
pub mod graph;
pub mod mapping;
pub mod model;


#[cfg(test)]
pub mod test_utils;

pub use evolution::{Detector, EvolutionEdge, EvolutionKey, EvolutionKind};
pub use facts::{CodeLocation, DiffChangeSet, RefactoringInfo, TimelineVersion};
pub use graph::{GraphData, KnowledgeGraph};
pub use mapping::{MappingStats, NodeMapping};
pub use model::{
    Edge, EdgeKey, EdgeKind, GraphError, MethodMetrics, Node, NodeId, NodeKind, VersionStatus,
    check_confidence,
};
