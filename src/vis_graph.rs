//! Visualization graph: the engine's output boundary.
//!
//! `VisGraphOptions` is a flat node list plus a deduplicated edge list,
//! handed to an external renderer. Guarantees relied on by consumers:
//! - node ids are stable strings
//! - combined-node ids carry the [`COMBINED_NODE_PREFIX`]
//! - no edge references an id absent from the node list

use crate::cluster::Clustering;
use crate::node::LineageNode;
use crate::options::LineageUrlResolver;
use crate::result::LineageResult;
use crate::traverse::{LineageDirection, Traversal};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Prefix distinguishing synthetic cluster ids from node ids.
pub const COMBINED_NODE_PREFIX: &str = "combined:";

// =============================================================================
// EDGES
// =============================================================================

/// Directed edge from a parent (or its cluster) to a child (or its cluster).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VisGraphEdge {
    pub from: String,
    pub to: String,
}

impl VisGraphEdge {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

// =============================================================================
// NODES
// =============================================================================

/// Synthetic node standing in for an oversized sibling set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedNode {
    /// `combined:` + a digest of the sorted member ids.
    pub id: String,

    /// Members, ordered by id.
    pub contained_nodes: Vec<LineageNode>,

    /// Nodes the members were grouped around, ordered by id.
    pub anchors: Vec<String>,

    /// Whether members are children or parents of the anchors.
    pub direction: LineageDirection,
}

impl CombinedNode {
    pub fn contains(&self, id: &str) -> bool {
        self.contained_nodes.iter().any(|node| node.id == id)
    }

    /// `"<count> <type>"` when members share a type, else `"<count> nodes"`.
    pub fn label(&self) -> String {
        let count = self.contained_nodes.len();
        let types: BTreeSet<&str> = self
            .contained_nodes
            .iter()
            .map(|node| node.node_type.as_str())
            .collect();
        match types.iter().next() {
            Some(node_type) if types.len() == 1 && !node_type.is_empty() => {
                format!("{} {}", count, node_type)
            }
            _ => format!("{} nodes", count),
        }
    }
}

/// Discriminant of a [`VisGraphNode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisGraphNodeKind {
    Basic,
    Combined,
}

/// One renderable node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum VisGraphNode {
    Basic(LineageNode),
    Combined(CombinedNode),
}

impl VisGraphNode {
    pub fn id(&self) -> &str {
        match self {
            Self::Basic(node) => &node.id,
            Self::Combined(node) => &node.id,
        }
    }

    pub fn kind(&self) -> VisGraphNodeKind {
        match self {
            Self::Basic(_) => VisGraphNodeKind::Basic,
            Self::Combined(_) => VisGraphNodeKind::Combined,
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::Basic(node) => node.name.clone(),
            Self::Combined(node) => node.label(),
        }
    }

    pub fn as_combined(&self) -> Option<&CombinedNode> {
        match self {
            Self::Combined(node) => Some(node),
            Self::Basic(_) => None,
        }
    }

    pub fn as_basic(&self) -> Option<&LineageNode> {
        match self {
            Self::Basic(node) => Some(node),
            Self::Combined(_) => None,
        }
    }
}

// =============================================================================
// GRAPH
// =============================================================================

#[derive(Deserialize)]
struct VisGraphParts {
    nodes: Vec<VisGraphNode>,
    edges: Vec<VisGraphEdge>,
}

impl From<VisGraphParts> for VisGraphOptions {
    fn from(parts: VisGraphParts) -> Self {
        Self::new(parts.nodes, parts.edges)
    }
}

/// Final node/edge set with id-indexed lookups.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "VisGraphParts")]
pub struct VisGraphOptions {
    nodes: Vec<VisGraphNode>,
    edges: Vec<VisGraphEdge>,
    #[serde(skip)]
    index: BTreeMap<String, usize>,
}

impl PartialEq for VisGraphOptions {
    fn eq(&self, other: &Self) -> bool {
        self.nodes == other.nodes && self.edges == other.edges
    }
}

impl VisGraphOptions {
    /// Build a graph; edges are deduplicated and ordered by `(from, to)`.
    pub fn new(nodes: Vec<VisGraphNode>, edges: impl IntoIterator<Item = VisGraphEdge>) -> Self {
        let edges: Vec<VisGraphEdge> = edges
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let index = nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (node.id().to_string(), i))
            .collect();
        Self {
            nodes,
            edges,
            index,
        }
    }

    pub fn nodes(&self) -> &[VisGraphNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[VisGraphEdge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn find_node_by_id(&self, id: &str) -> Option<&VisGraphNode> {
        self.index.get(id).and_then(|&i| self.nodes.get(i))
    }

    pub fn get_combined_nodes(&self) -> Vec<&CombinedNode> {
        self.nodes.iter().filter_map(VisGraphNode::as_combined).collect()
    }

    pub fn get_basic_nodes(&self) -> Vec<&LineageNode> {
        self.nodes.iter().filter_map(VisGraphNode::as_basic).collect()
    }

    /// Combined nodes that absorbed the given original node id.
    pub fn combined_nodes_containing(&self, id: &str) -> Vec<&CombinedNode> {
        self.get_combined_nodes()
            .into_iter()
            .filter(|combined| combined.contains(id))
            .collect()
    }

    pub fn edges_from(&self, id: &str) -> Vec<&VisGraphEdge> {
        self.edges.iter().filter(|edge| edge.from == id).collect()
    }

    pub fn edges_to(&self, id: &str) -> Vec<&VisGraphEdge> {
        self.edges.iter().filter(|edge| edge.to == id).collect()
    }

    pub fn has_edge(&self, from: &str, to: &str) -> bool {
        self.edges.iter().any(|edge| edge.from == from && edge.to == to)
    }
}

// =============================================================================
// ASSEMBLER
// =============================================================================

/// Package un-absorbed basic nodes, combined nodes and rewritten edges.
///
/// Basic nodes come first ordered by id, then combined nodes ordered by id.
/// When a resolver is given, every emitted node record (basic or
/// contained) gets its `url` stamped.
pub fn assemble(
    result: &LineageResult,
    traversal: &Traversal,
    clustering: &Clustering,
    resolver: Option<&dyn LineageUrlResolver>,
) -> VisGraphOptions {
    let stamp = |node: &LineageNode| -> LineageNode {
        let mut node = node.clone();
        if let Some(resolver) = resolver {
            if let Some(url) = resolver.resolve(&node) {
                node.url = Some(url);
            }
        }
        node
    };

    let mut nodes: Vec<VisGraphNode> = traversal
        .node_ids()
        .into_iter()
        .filter(|id| !clustering.is_absorbed(id))
        .filter_map(|id| result.node(id))
        .map(|node| VisGraphNode::Basic(stamp(node)))
        .collect();

    nodes.extend(clustering.combined_nodes().map(|combined| {
        VisGraphNode::Combined(CombinedNode {
            contained_nodes: combined.contained_nodes.iter().map(stamp).collect(),
            ..combined.clone()
        })
    }));

    let graph = VisGraphOptions::new(nodes, clustering.edges().iter().cloned());
    tracing::debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        combined = graph.get_combined_nodes().len(),
        "assembled lineage graph"
    );
    graph
}
