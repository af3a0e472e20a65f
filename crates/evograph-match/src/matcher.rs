//! Matcher trait implemented by each pairing strategy

use evograph_core::{Node, NodeKind};

/// One way of scoring how likely two nodes are the same code element in
/// two different versions. Matchers are consulted in descending priority
/// order by [`crate::MatcherSet`].
pub trait NodeMatcher {
    fn name(&self) -> &'static str;

    /// Higher-priority matchers are consulted first.
    fn priority(&self) -> u32;

    /// Whether this matcher knows how to score nodes of the given kind.
    fn supports(&self, kind: NodeKind) -> bool;

    /// Confidence in [0, 1] that `a` (version A) and `b` (version B) are
    /// the same element. 1.0 is reserved for byte-identical matches.
    /// A missing feature skips that comparison instead of failing.
    fn confidence(&self, a: &Node, b: &Node) -> f64;
}
