//! Cluster engine: collapse oversized sibling sets into combined nodes.
//!
//! Two passes over a [`Traversal`]:
//!
//! 1. Grouping. Every descendant-side node (seed included) offers its
//!    direct children as a sibling set; every ancestor-side node (seed
//!    included) offers its direct parents as a co-parent set. The seed is
//!    never a member. A set with at least `combine_size` members becomes a
//!    combined node whose id is derived from the sorted member ids, so
//!    identical sets collapse into one node and overlapping sets stay
//!    distinct.
//! 2. Rewriting. Each traversal edge has its absorbed endpoints replaced by
//!    every combined node that holds them. A node held by two combined nodes
//!    therefore fans its edges out to both. Resulting duplicates and edges
//!    internal to one combined node are dropped.

use crate::options::LineageGroupingOptions;
use crate::result::LineageResult;
use crate::traverse::{LineageDirection, Traversal};
use crate::vis_graph::{CombinedNode, VisGraphEdge, COMBINED_NODE_PREFIX};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};

/// Bytes of the member digest kept in a combined-node id.
const COMBINED_KEY_BYTES: usize = 16;

/// Output of the cluster engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Clustering {
    combined: BTreeMap<String, CombinedNode>,
    absorbed: BTreeMap<String, BTreeSet<String>>,
    edges: BTreeSet<VisGraphEdge>,
}

impl Clustering {
    /// Pass-through: no combined nodes, edges untouched.
    pub fn unclustered(traversal: &Traversal) -> Self {
        Self {
            edges: traversal.edges().clone(),
            ..Self::default()
        }
    }

    /// Combined nodes ordered by id.
    pub fn combined_nodes(&self) -> impl Iterator<Item = &CombinedNode> {
        self.combined.values()
    }

    pub fn combined_count(&self) -> usize {
        self.combined.len()
    }

    pub fn is_absorbed(&self, id: &str) -> bool {
        self.absorbed.contains_key(id)
    }

    /// Ids of the combined nodes holding `id`.
    pub fn clusters_of(&self, id: &str) -> Option<&BTreeSet<String>> {
        self.absorbed.get(id)
    }

    /// Rewritten, deduplicated edges.
    pub fn edges(&self) -> &BTreeSet<VisGraphEdge> {
        &self.edges
    }
}

/// Deterministic id for a member set.
pub fn combined_node_id<'a>(members: impl IntoIterator<Item = &'a str>) -> String {
    let sorted: BTreeSet<&str> = members.into_iter().collect();
    let mut hasher = Sha256::new();
    for (i, id) in sorted.iter().enumerate() {
        if i > 0 {
            hasher.update(b"\n");
        }
        hasher.update(id.as_bytes());
    }
    let digest = hasher.finalize();
    format!(
        "{}{}",
        COMBINED_NODE_PREFIX,
        hex::encode(&digest[..COMBINED_KEY_BYTES])
    )
}

/// A member set found in pass one, before node records are attached.
struct ClusterDraft {
    members: BTreeSet<String>,
    anchors: BTreeSet<String>,
    direction: LineageDirection,
}

/// Group oversized sibling sets of `traversal` and rewrite its edges.
pub fn cluster(
    result: &LineageResult,
    traversal: &Traversal,
    grouping: &LineageGroupingOptions,
) -> Clustering {
    if !grouping.clustering_enabled() {
        return Clustering::unclustered(traversal);
    }
    let Some(seed) = traversal.seed() else {
        return Clustering::default();
    };
    let threshold = grouping.combine_size();

    let mut children_of: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    let mut parents_of: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for edge in traversal.edges() {
        children_of.entry(&edge.from).or_default().insert(&edge.to);
        parents_of.entry(&edge.to).or_default().insert(&edge.from);
    }

    // Pass 1: find member sets and assign ids.
    let mut drafts: BTreeMap<String, ClusterDraft> = BTreeMap::new();
    let owners = [
        (LineageDirection::Children, traversal.descendants(), &children_of),
        (LineageDirection::Parents, traversal.ancestors(), &parents_of),
    ];
    for (direction, side, adjacency) in owners {
        let anchors = std::iter::once(seed).chain(side.iter().map(String::as_str));
        for anchor in anchors {
            let Some(neighbours) = adjacency.get(anchor) else {
                continue;
            };
            let members: BTreeSet<&str> = neighbours
                .iter()
                .copied()
                .filter(|&id| id != seed && id != anchor)
                .collect();
            if members.len() < threshold {
                continue;
            }

            let id = combined_node_id(members.iter().copied());
            tracing::trace!(anchor, %id, members = members.len(), ?direction, "combining siblings");
            drafts
                .entry(id)
                .or_insert_with(|| ClusterDraft {
                    members: members.iter().map(|m| m.to_string()).collect(),
                    anchors: BTreeSet::new(),
                    direction,
                })
                .anchors
                .insert(anchor.to_string());
        }
    }

    // Pass 2: absorbed-node map, then edge rewriting.
    let mut absorbed: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for (id, draft) in &drafts {
        for member in &draft.members {
            absorbed
                .entry(member.clone())
                .or_default()
                .insert(id.clone());
        }
    }

    let endpoints = |id: &str| -> Vec<String> {
        match absorbed.get(id) {
            Some(clusters) => clusters.iter().cloned().collect(),
            None => vec![id.to_string()],
        }
    };

    let mut edges = BTreeSet::new();
    for edge in traversal.edges() {
        for from in endpoints(&edge.from) {
            for to in endpoints(&edge.to) {
                if from != to {
                    edges.insert(VisGraphEdge { from: from.clone(), to });
                }
            }
        }
    }

    let combined = drafts
        .into_iter()
        .map(|(id, draft)| {
            let node = CombinedNode {
                id: id.clone(),
                contained_nodes: draft
                    .members
                    .iter()
                    .filter_map(|member| result.node(member).cloned())
                    .collect(),
                anchors: draft.anchors.into_iter().collect(),
                direction: draft.direction,
            };
            (id, node)
        })
        .collect::<BTreeMap<_, _>>();

    tracing::debug!(
        combined = combined.len(),
        absorbed = absorbed.len(),
        edges_in = traversal.edges().len(),
        edges_out = edges.len(),
        "clustered lineage"
    );

    Clustering {
        combined,
        absorbed,
        edges,
    }
}
