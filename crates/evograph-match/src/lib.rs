//! Evograph Match — pluggable node matchers pairing two version graphs

pub mod config;
pub mod exact;
pub mod location;
pub mod matcher;
pub mod strategy;
pub mod structural;


pub use config::MatchConfig;
pub use exact::ExactMatcher;
pub use location::LocationMatcher;
pub use matcher::NodeMatcher;
pub use strategy::MatcherSet;
pub use structural::StructuralMatcher;
