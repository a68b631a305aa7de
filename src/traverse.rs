//! Traversal engine: walk a filtered result outward from its seed.
//!
//! Ancestors and descendants are walked independently, breadth-first,
//! under the generation policy of the grouping options. Each side keeps
//! the edges induced by its own node set (both endpoints on that side);
//! the two sides are then unioned.
//!
//! Every walk tracks visited ids, so cyclic input terminates.

use crate::node::LineageNode;
use crate::options::{LineageGenerations, LineageGroupingOptions};
use crate::result::LineageResult;
use crate::vis_graph::VisGraphEdge;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet, VecDeque};

/// Direction of travel along lineage links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineageDirection {
    /// Towards ancestors, along `parents`.
    Parents,
    /// Towards descendants, along `children`.
    Children,
}

impl LineageDirection {
    /// Link ids of `node` in this direction.
    pub fn links<'a>(&self, node: &'a LineageNode) -> impl Iterator<Item = &'a str> + 'a {
        let links = match self {
            Self::Parents => &node.parents,
            Self::Children => &node.children,
        };
        links.iter().map(|link| link.id.as_str())
    }
}

/// Reachable subset of a result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Traversal {
    seed: Option<String>,
    ancestors: BTreeSet<String>,
    descendants: BTreeSet<String>,
    edges: BTreeSet<VisGraphEdge>,
}

impl Traversal {
    /// Seed id, or `None` when the seed was not in the result.
    pub fn seed(&self) -> Option<&str> {
        self.seed.as_deref()
    }

    /// Ids reached along `parents`, excluding the seed.
    pub fn ancestors(&self) -> &BTreeSet<String> {
        &self.ancestors
    }

    /// Ids reached along `children`, excluding the seed.
    pub fn descendants(&self) -> &BTreeSet<String> {
        &self.descendants
    }

    pub fn edges(&self) -> &BTreeSet<VisGraphEdge> {
        &self.edges
    }

    /// Every reachable id, seed included, ordered by id.
    pub fn node_ids(&self) -> BTreeSet<&str> {
        self.seed
            .iter()
            .chain(self.ancestors.iter())
            .chain(self.descendants.iter())
            .map(String::as_str)
            .collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.seed.as_deref() == Some(id)
            || self.ancestors.contains(id)
            || self.descendants.contains(id)
    }

    pub fn node_count(&self) -> usize {
        self.node_ids().len()
    }

    pub fn is_empty(&self) -> bool {
        self.seed.is_none()
    }
}

/// Walk `result` from its seed under `grouping`'s generation policy.
///
/// Returns an empty traversal when the seed is not in the result.
pub fn traverse(result: &LineageResult, grouping: &LineageGroupingOptions) -> Traversal {
    let seed = result.seed();
    if !result.contains(seed) {
        tracing::warn!(seed, "seed not present in lineage result; nothing to traverse");
        return Traversal::default();
    }

    let ancestors = walk(result, seed, LineageDirection::Parents, grouping);
    let descendants = walk(result, seed, LineageDirection::Children, grouping);

    let mut edges = induced_edges(result, seed, &ancestors);
    edges.extend(induced_edges(result, seed, &descendants));

    tracing::debug!(
        seed,
        generations = %grouping.generations(),
        ancestors = ancestors.len(),
        descendants = descendants.len(),
        edges = edges.len(),
        "traversed lineage"
    );

    Traversal {
        seed: Some(seed.to_string()),
        ancestors,
        descendants,
        edges,
    }
}

/// Maximum number of generations to expand in `direction`, `None` = unbounded.
fn depth_limit(grouping: &LineageGroupingOptions, direction: LineageDirection) -> Option<usize> {
    match grouping.generations() {
        LineageGenerations::All | LineageGenerations::Multi => None,
        LineageGenerations::Nearest => Some(1),
        LineageGenerations::Specific => Some(match direction {
            LineageDirection::Parents => grouping.parent_depth(),
            LineageDirection::Children => grouping.child_depth(),
        }),
    }
}

/// Breadth-first walk in one direction; returns reached ids without the seed.
///
/// Under `Multi`, a node with several neighbours in `direction` contributes
/// those neighbours but traversal does not continue past them.
fn walk(
    result: &LineageResult,
    seed: &str,
    direction: LineageDirection,
    grouping: &LineageGroupingOptions,
) -> BTreeSet<String> {
    let limit = depth_limit(grouping, direction);
    let stop_at_branch = grouping.generations() == LineageGenerations::Multi;

    let mut visited: HashSet<&str> = HashSet::new();
    let mut reached: BTreeSet<String> = BTreeSet::new();
    let mut queue: VecDeque<(&str, usize)> = VecDeque::new();

    visited.insert(seed);
    queue.push_back((seed, 0));

    while let Some((current, depth)) = queue.pop_front() {
        if limit.is_some_and(|max| depth >= max) {
            continue;
        }
        let Some(node) = result.node(current) else {
            continue;
        };

        let mut neighbours: Vec<&str> = Vec::new();
        for id in direction.links(node) {
            if result.contains(id) && !neighbours.contains(&id) {
                neighbours.push(id);
            }
        }
        let branching = neighbours.len() > 1;

        for next in neighbours {
            if !visited.insert(next) {
                continue;
            }
            reached.insert(next.to_string());
            if stop_at_branch && branching {
                continue;
            }
            queue.push_back((next, depth + 1));
        }
    }

    reached
}

/// Parent-to-child edges whose endpoints both lie in `side` or are the seed.
fn induced_edges(result: &LineageResult, seed: &str, side: &BTreeSet<String>) -> BTreeSet<VisGraphEdge> {
    let in_side = |id: &str| id == seed || side.contains(id);
    let mut edges = BTreeSet::new();

    for id in std::iter::once(seed).chain(side.iter().map(String::as_str)) {
        let Some(node) = result.node(id) else {
            continue;
        };
        for child in node.child_ids().filter(|&c| in_side(c) && result.contains(c)) {
            edges.insert(VisGraphEdge::new(id, child));
        }
        for parent in node.parent_ids().filter(|&p| in_side(p) && result.contains(p)) {
            edges.insert(VisGraphEdge::new(parent, id));
        }
    }

    edges
}

#[cfg(test)]
mod tests {
    use super::*;

    /// expression1 -> run1 -> child1, expression1 -> run2
    fn branch_result() -> LineageResult {
        LineageResult::new(
            "expression1",
            vec![
                LineageNode::new("expression1", "expression1", "Data")
                    .with_child("run1")
                    .with_child("run2"),
                LineageNode::new("run1", "run1", "ExperimentRun")
                    .with_parent("expression1")
                    .with_child("child1"),
                LineageNode::new("run2", "run2", "ExperimentRun").with_parent("expression1"),
                LineageNode::new("child1", "child1", "Sample").with_parent("run1"),
            ],
        )
    }

    /// a <- b <- c <- seed -> d -> e -> f
    fn chain_result() -> LineageResult {
        LineageResult::new(
            "seed",
            vec![
                LineageNode::new("a", "a", "Sample").with_child("b"),
                LineageNode::new("b", "b", "Sample").with_parent("a").with_child("c"),
                LineageNode::new("c", "c", "Sample").with_parent("b").with_child("seed"),
                LineageNode::new("seed", "seed", "Sample")
                    .with_parent("c")
                    .with_child("d"),
                LineageNode::new("d", "d", "Sample").with_parent("seed").with_child("e"),
                LineageNode::new("e", "e", "Sample").with_parent("d").with_child("f"),
                LineageNode::new("f", "f", "Sample").with_parent("e"),
            ],
        )
    }

    fn ids(traversal: &Traversal) -> Vec<&str> {
        traversal.node_ids().into_iter().collect()
    }

    #[test]
    fn test_all_generations() {
        let traversal = traverse(
            &branch_result(),
            &LineageGroupingOptions::new(LineageGenerations::All),
        );
        assert_eq!(ids(&traversal), vec!["child1", "expression1", "run1", "run2"]);
        assert_eq!(traversal.edges().len(), 3);
    }

    #[test]
    fn test_multi_stops_at_branch() {
        let traversal = traverse(
            &branch_result(),
            &LineageGroupingOptions::new(LineageGenerations::Multi),
        );
        assert_eq!(ids(&traversal), vec!["expression1", "run1", "run2"]);
        assert_eq!(traversal.edges().len(), 2);
    }

    #[test]
    fn test_multi_follows_unbroken_chain() {
        let traversal = traverse(
            &chain_result(),
            &LineageGroupingOptions::new(LineageGenerations::Multi),
        );
        assert_eq!(traversal.node_count(), 7);
    }

    #[test]
    fn test_multi_stops_at_branch_below_seed() {
        // seed -> a -> {b, c}, b -> d
        let result = LineageResult::new(
            "seed",
            vec![
                LineageNode::new("seed", "seed", "Sample").with_child("a"),
                LineageNode::new("a", "a", "ExperimentRun")
                    .with_parent("seed")
                    .with_child("b")
                    .with_child("c"),
                LineageNode::new("b", "b", "Sample").with_parent("a").with_child("d"),
                LineageNode::new("c", "c", "Sample").with_parent("a"),
                LineageNode::new("d", "d", "Sample").with_parent("b"),
            ],
        );
        let traversal = traverse(&result, &LineageGroupingOptions::new(LineageGenerations::Multi));

        assert_eq!(ids(&traversal), vec!["a", "b", "c", "seed"]);
        assert!(!traversal.contains("d"));
        assert_eq!(traversal.edges().len(), 3);
        assert!(!traversal.edges().contains(&VisGraphEdge::new("b", "d")));
    }

    #[test]
    fn test_nearest() {
        let traversal = traverse(
            &branch_result(),
            &LineageGroupingOptions::new(LineageGenerations::Nearest),
        );
        assert_eq!(ids(&traversal), vec!["expression1", "run1", "run2"]);
        assert_eq!(traversal.edges().len(), 2);
        assert!(traversal.ancestors().is_empty());
    }

    #[test]
    fn test_specific_depths() {
        let grouping = LineageGroupingOptions::new(LineageGenerations::Specific)
            .with_parent_depth(2)
            .with_child_depth(1);
        let traversal = traverse(&chain_result(), &grouping);

        assert_eq!(
            traversal.ancestors().iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["b", "c"]
        );
        assert_eq!(
            traversal.descendants().iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["d"]
        );
        assert!(traversal.edges().contains(&VisGraphEdge::new("b", "c")));
        assert!(!traversal.edges().contains(&VisGraphEdge::new("a", "b")));
    }

    #[test]
    fn test_specific_zero_depth_is_seed_only() {
        let grouping = LineageGroupingOptions::new(LineageGenerations::Specific)
            .with_parent_depth(0)
            .with_child_depth(0);
        let traversal = traverse(&chain_result(), &grouping);
        assert_eq!(ids(&traversal), vec!["seed"]);
        assert!(traversal.edges().is_empty());
    }

    #[test]
    fn test_missing_seed() {
        let result = LineageResult::new("ghost", vec![LineageNode::new("a", "a", "Sample")]);
        let traversal = traverse(&result, &LineageGroupingOptions::default());
        assert!(traversal.is_empty());
        assert_eq!(traversal.node_count(), 0);
    }

    #[test]
    fn test_cycle_terminates() {
        let result = LineageResult::new(
            "a",
            vec![
                LineageNode::new("a", "a", "Sample").with_child("b").with_parent("c"),
                LineageNode::new("b", "b", "Sample").with_parent("a").with_child("c"),
                LineageNode::new("c", "c", "Sample").with_parent("b").with_child("a"),
            ],
        );
        let traversal = traverse(&result, &LineageGroupingOptions::default());
        assert_eq!(ids(&traversal), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_dangling_links_ignored() {
        let result = LineageResult::new(
            "a",
            vec![LineageNode::new("a", "a", "Sample").with_child("missing")],
        );
        let traversal = traverse(&result, &LineageGroupingOptions::default());
        assert_eq!(ids(&traversal), vec!["a"]);
        assert!(traversal.edges().is_empty());
    }

    #[test]
    fn test_one_sided_links_still_produce_edges() {
        // only the child lists its parent
        let result = LineageResult::new(
            "p",
            vec![
                LineageNode::new("p", "p", "Sample"),
                LineageNode::new("c", "c", "Sample").with_parent("p"),
            ],
        );
        let traversal = traverse(&result, &LineageGroupingOptions::default());
        // `p` has no child links, so `c` is not reached from the seed
        assert_eq!(ids(&traversal), vec!["p"]);

        let from_child = LineageResult::new("c", result.nodes().values().cloned());
        let traversal = traverse(&from_child, &LineageGroupingOptions::default());
        assert_eq!(ids(&traversal), vec!["c", "p"]);
        assert!(traversal.edges().contains(&VisGraphEdge::new("p", "c")));
    }
}
