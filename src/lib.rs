//! Lineage Graph - deterministic provenance graphs for visualization.
//!
//! This crate turns a fetched lineage payload into a renderable graph:
//! - `LineageNode` / `LineageResult` - id-keyed provenance records
//! - `LineageOptions` - filters, generation policy, clustering threshold
//! - `traverse` - bounded per-direction walk from the seed
//! - `cluster` - collapse oversized sibling sets into combined nodes
//! - `VisGraphOptions` - flat node list plus deduplicated edges
//! - Validation - dangling links, id mismatches, cycle detection
//!
//! # Architecture
//!
//! ```text
//! LineageResult { seed, nodes: { id -> LineageNode } }
//!         │
//!         ▼  LineageOptions.filters (filter_in / filter_out)
//! LineageResult (links to removed nodes pruned)
//!         │
//!         ▼  LineageGroupingOptions.generations
//! Traversal { ancestors, descendants, edges }
//!         │
//!         ▼  LineageGroupingOptions.combine_size
//! Clustering { combined, absorbed, rewritten edges }
//!         │
//!         ▼
//! VisGraphOptions { nodes: [basic.., combined..], edges }
//! ```
//!
//! Every stage is pure: identical inputs give identical node ids and edges.
//!
//! # Example
//!
//! ```
//! use lineage_graph::{generate, LineageOptions, LineageResult};
//!
//! let yaml = r#"
//! grouping:
//!   generations: nearest
//!   combineSize: 3
//! "#;
//! let options = LineageOptions::from_yaml_str(yaml).unwrap();
//!
//! let payload = r#"{
//!   "seed": "s1",
//!   "nodes": {
//!     "s1": { "id": "s1", "name": "S1", "type": "Sample", "children": [{ "id": "r1" }] },
//!     "r1": { "id": "r1", "name": "R1", "type": "ExperimentRun", "parents": [{ "id": "s1" }] }
//!   }
//! }"#;
//! let result: LineageResult = serde_json::from_str(payload).unwrap();
//!
//! let graph = generate(&result, &options).unwrap();
//! assert_eq!(graph.node_count(), 2);
//! assert!(graph.has_edge("s1", "r1"));
//! ```

mod cache;
mod cluster;
mod error;
mod generator;
mod node;
mod options;
mod result;
mod traverse;
mod validate;
mod vis_graph;

// Re-exports
pub use cache::{load_or_insert_with, InMemoryLineageCache, LineageCache};
pub use cluster::{cluster, combined_node_id, Clustering};
pub use error::{IntegrityIssue, LineageError};
pub use generator::{generate, generate_with_defaults};
pub use node::{LineageLink, LineageNode};
pub use options::{
    FilterValue, GroupingConfig, LineageFilter, LineageGenerations, LineageGroupingOptions,
    LineageOptions, LineageUrlResolver,
};
pub use result::LineageResult;
pub use traverse::{traverse, LineageDirection, Traversal};
pub use validate::{validate, IntegrityReport};
pub use vis_graph::{
    assemble, CombinedNode, VisGraphEdge, VisGraphNode, VisGraphNodeKind, VisGraphOptions,
    COMBINED_NODE_PREFIX,
};

/// Ancestor generations walked under `Specific` when unset.
pub const DEFAULT_PARENT_DEPTH: usize = 4;

/// Descendant generations walked under `Specific` when unset.
pub const DEFAULT_CHILD_DEPTH: usize = 3;

/// Sibling count at which clustering kicks in when unset.
pub const DEFAULT_COMBINE_SIZE: usize = 6;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, LineageError>;
