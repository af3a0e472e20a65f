//! Evograph Merge — pairwise graph merging and timeline aggregation

pub mod context;
pub mod factory;
pub mod merger;
pub mod stats;
pub mod timeline;

#[cfg(test)]
pub mod tests;

pub use context::MergeContext;
pub use merger::GraphMerger;
pub use stats::MergeStats;
pub use timeline::TimelineAggregator;
