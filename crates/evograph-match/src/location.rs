//! Resolves refactoring-fact code locations to graph nodes

use evograph_core::{CodeLocation, KnowledgeGraph, Node, NodeKind};

/// Finds the node a detector-reported code span refers to. Detectors and
/// the front end parse independently, so their line numbers disagree by a
/// line or two; the tolerance absorbs that.
pub struct LocationMatcher<'g> {
    graph: &'g KnowledgeGraph,
    line_tolerance: u32,
}

impl<'g> LocationMatcher<'g> {
    pub fn new(graph: &'g KnowledgeGraph, line_tolerance: u32) -> Self {
        LocationMatcher {
            graph,
            line_tolerance,
        }
    }

    /// All nodes whose file and line span overlap the location. Only
    /// types, methods and fields are locatable; everything else has no
    /// meaningful line range.
    pub fn find_nodes(&self, location: &CodeLocation) -> Vec<&'g Node> {
        self.graph
            .nodes()
            .filter(|node| self.matches(node, location))
            .collect()
    }

    /// Best single candidate: the one whose line range sits closest to
    /// the reported span. Candidates come out of [`Self::find_nodes`] in
    /// id order, and ties keep the first seen, so equal distances resolve
    /// to the lexically smallest identifier.
    pub fn resolve(&self, location: &CodeLocation) -> Option<&'g Node> {
        let candidates = self.find_nodes(location);
        let mut best: Option<(&Node, u64)> = None;
        for candidate in candidates {
            let distance = self.line_distance(candidate, location);
            match best {
                Some((_, d)) if d <= distance => {}
                _ => best = Some((candidate, distance)),
            }
        }
        best.map(|(node, _)| node)
    }

    fn matches(&self, node: &Node, location: &CodeLocation) -> bool {
        if !Self::matches_file(node, &location.file_path) {
            return false;
        }
        match node.kind {
            NodeKind::Method | NodeKind::Type => self.matches_span(node, location),
            NodeKind::Field => self.matches_single_line(node, location),
            _ => false,
        }
    }

    fn matches_file(node: &Node, target: &str) -> bool {
        match &node.file_path {
            // Front ends emit repository-relative paths; an absolute
            // path still matches on its suffix.
            Some(path) => path == target || path.ends_with(target),
            None => false,
        }
    }

    fn matches_span(&self, node: &Node, location: &CodeLocation) -> bool {
        let (Some(start), Some(end)) = (node.line_start, node.line_end) else {
            return false;
        };
        if start == 0 || end == 0 {
            return false;
        }
        let line_matches = self.ranges_overlap(location.start_line, location.end_line, start, end);
        if line_matches && !location.element.is_empty() && location.element.contains(&node.name) {
            return true;
        }
        line_matches
    }

    /// Fields occupy a single declaration line.
    fn matches_single_line(&self, node: &Node, location: &CodeLocation) -> bool {
        let Some(line) = node.line_start else {
            return false;
        };
        if line == 0 {
            return false;
        }
        let line_matches = line.abs_diff(location.start_line) <= self.line_tolerance;
        if line_matches && !location.element.is_empty() && location.element.contains(&node.name) {
            return true;
        }
        line_matches
    }

    fn ranges_overlap(&self, start1: u32, end1: u32, start2: u32, end2: u32) -> bool {
        let t = self.line_tolerance;
        start1.saturating_sub(t) <= end2 + t && end1 + t >= start2.saturating_sub(t)
    }

    fn line_distance(&self, node: &Node, location: &CodeLocation) -> u64 {
        match node.kind {
            NodeKind::Method | NodeKind::Type => {
                match (node.line_start, node.line_end) {
                    (Some(start), Some(end)) => {
                        u64::from(start.abs_diff(location.start_line))
                            + u64::from(end.abs_diff(location.end_line))
                    }
                    _ => u64::MAX,
                }
            }
            NodeKind::Field => match node.line_start {
                Some(line) => u64::from(line.abs_diff(location.start_line)),
                None => u64::MAX,
            },
            _ => u64::MAX,
        }
    }
}
