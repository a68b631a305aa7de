//! Lineage result: an immutable id-keyed node map plus the seed id.
//!
//! Every filter and merge returns a fresh `LineageResult`; the receiver is
//! never modified. Filtering preserves heritage by pruning links to removed
//! nodes rather than rerouting them.

use crate::error::LineageError;
use crate::node::LineageNode;
use crate::options::FilterValue;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Provenance graph rooted at a seed node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineageResult {
    nodes: BTreeMap<String, LineageNode>,
    seed: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl LineageResult {
    /// Build a result from nodes; the first node with a given id wins.
    pub fn new(seed: impl Into<String>, nodes: impl IntoIterator<Item = LineageNode>) -> Self {
        let mut map = BTreeMap::new();
        for node in nodes {
            map.entry(node.id.clone()).or_insert(node);
        }
        Self {
            nodes: map,
            seed: seed.into(),
            error: None,
        }
    }

    /// A result standing in for a failed fetch.
    pub fn from_error(seed: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            nodes: BTreeMap::new(),
            seed: seed.into(),
            error: Some(error.into()),
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn nodes(&self) -> &BTreeMap<String, LineageNode> {
        &self.nodes
    }

    pub fn node(&self, id: &str) -> Option<&LineageNode> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn seed_node(&self) -> Option<&LineageNode> {
        self.nodes.get(&self.seed)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Resolved parents of a node, skipping links to unknown ids.
    pub fn parents_of(&self, id: &str) -> Vec<&LineageNode> {
        self.node(id)
            .map(|node| node.parent_ids().filter_map(|p| self.node(p)).collect())
            .unwrap_or_default()
    }

    /// Resolved children of a node, skipping links to unknown ids.
    pub fn children_of(&self, id: &str) -> Vec<&LineageNode> {
        self.node(id)
            .map(|node| node.child_ids().filter_map(|c| self.node(c)).collect())
            .unwrap_or_default()
    }

    /// Keep only nodes whose `field` matches `value`.
    ///
    /// The seed gets no special treatment: when it does not match it is
    /// absent from the returned nodes, though the seed id is kept.
    ///
    /// # Errors
    /// Returns [`LineageError::InvalidArgument`] when `field` is empty.
    pub fn filter_in(&self, field: &str, value: &FilterValue) -> Result<Self, LineageError> {
        self.filter(field, value, true)
    }

    /// Drop nodes whose `field` matches `value`; nodes without the field stay.
    ///
    /// # Errors
    /// Returns [`LineageError::InvalidArgument`] when `field` is empty.
    pub fn filter_out(&self, field: &str, value: &FilterValue) -> Result<Self, LineageError> {
        self.filter(field, value, false)
    }

    fn filter(&self, field: &str, value: &FilterValue, keep_matches: bool) -> Result<Self, LineageError> {
        if field.trim().is_empty() {
            return Err(LineageError::InvalidArgument(
                "filter field must be provided".to_string(),
            ));
        }

        let retained: BTreeSet<&str> = self
            .nodes
            .iter()
            .filter(|(_, node)| value.matches(node.field_value(field).as_ref()) == keep_matches)
            .map(|(id, _)| id.as_str())
            .collect();

        let nodes = self
            .nodes
            .iter()
            .filter(|(id, _)| retained.contains(id.as_str()))
            .map(|(id, node)| {
                let mut node = node.clone();
                node.parents.retain(|link| retained.contains(link.id.as_str()));
                node.children.retain(|link| retained.contains(link.id.as_str()));
                (id.clone(), node)
            })
            .collect::<BTreeMap<_, _>>();

        tracing::debug!(
            field,
            keep_matches,
            before = self.nodes.len(),
            after = nodes.len(),
            "filtered lineage result"
        );

        Ok(Self {
            nodes,
            seed: self.seed.clone(),
            error: self.error.clone(),
        })
    }

    /// Union of both node maps, keeping this result's entry on id collision.
    ///
    /// The receiver's seed is preserved; merging a result with itself is a no-op.
    pub fn merge_lineage(&self, other: &LineageResult) -> Self {
        let mut nodes = self.nodes.clone();
        for (id, node) in &other.nodes {
            nodes.entry(id.clone()).or_insert_with(|| node.clone());
        }
        Self {
            nodes,
            seed: self.seed.clone(),
            error: self.error.clone().or_else(|| other.error.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

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

    #[test]
    fn test_filter_in_prunes_links() {
        let result = branch_result();
        let filtered = result
            .filter_in("type", &FilterValue::from(vec!["Data", "ExperimentRun"]))
            .unwrap();

        assert_eq!(filtered.len(), 3);
        assert!(!filtered.contains("child1"));
        let run1 = filtered.node("run1").unwrap();
        assert!(run1.children.is_empty());
        assert_eq!(run1.parents.len(), 1);
        // receiver untouched
        assert_eq!(result.len(), 4);
        assert_eq!(result.node("run1").unwrap().children.len(), 1);
    }

    #[test]
    fn test_filter_in_seed_not_special() {
        let filtered = branch_result()
            .filter_in("type", &FilterValue::from("ExperimentRun"))
            .unwrap();
        assert_eq!(filtered.seed(), "expression1");
        assert!(filtered.seed_node().is_none());
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn test_filter_in_empty_list_drops_everything() {
        let filtered = branch_result()
            .filter_in("type", &FilterValue::Many(vec![]))
            .unwrap();
        assert!(filtered.is_empty());
        assert_eq!(filtered.seed(), "expression1");
    }

    #[test]
    fn test_filter_out() {
        let result = branch_result();
        let filtered = result
            .filter_out("type", &FilterValue::from("ExperimentRun"))
            .unwrap();
        assert_eq!(filtered.len(), 2);
        assert!(filtered.node("expression1").unwrap().children.is_empty());
        assert!(filtered.node("child1").unwrap().parents.is_empty());

        let untouched = result
            .filter_out("noSuchField", &FilterValue::from("x"))
            .unwrap();
        assert_eq!(untouched, result);
    }

    #[test]
    fn test_filter_requires_field() {
        let err = branch_result()
            .filter_in("", &FilterValue::from("Data"))
            .unwrap_err();
        assert!(matches!(err, LineageError::InvalidArgument(_)));
        assert!(branch_result()
            .filter_out("  ", &FilterValue::from("Data"))
            .is_err());
    }

    #[test]
    fn test_filter_on_meta_field() {
        let result = LineageResult::new(
            "a",
            vec![
                LineageNode::new("a", "A", "Sample").with_meta(json!({ "status": "ok" })),
                LineageNode::new("b", "B", "Sample").with_meta(json!({ "status": "failed" })),
            ],
        );
        let filtered = result
            .filter_in("status", &FilterValue::One(json!("ok")))
            .unwrap();
        assert_eq!(filtered.nodes().keys().collect::<Vec<_>>(), vec!["a"]);
    }

    #[test]
    fn test_merge_lineage() {
        let result = branch_result();
        assert_eq!(result.merge_lineage(&result).len(), result.len());

        let empty = LineageResult::new("other", Vec::new());
        let merged = result.merge_lineage(&empty);
        assert_eq!(merged.len(), 4);
        assert_eq!(merged.seed(), "expression1");

        let extra = LineageResult::new(
            "child2",
            vec![
                LineageNode::new("child2", "child2", "Sample").with_parent("run2"),
                LineageNode::new("run2", "renamed", "ExperimentRun"),
            ],
        );
        let merged = result.merge_lineage(&extra);
        assert_eq!(merged.len(), 5);
        assert_eq!(merged.node("run2").unwrap().name, "run2");
    }

    #[test]
    fn test_resolved_neighbours() {
        let result = branch_result().merge_lineage(&LineageResult::new(
            "x",
            vec![LineageNode::new("x", "x", "Data").with_child("ghost")],
        ));
        assert_eq!(
            result
                .children_of("expression1")
                .iter()
                .map(|n| n.id.as_str())
                .collect::<Vec<_>>(),
            vec!["run1", "run2"]
        );
        assert!(result.children_of("x").is_empty());
        assert!(result.parents_of("missing").is_empty());
    }

    #[test]
    fn test_error_result() {
        let result = LineageResult::from_error("s1", "404 Not Found");
        assert!(result.has_error());
        assert_eq!(result.error(), Some("404 Not Found"));
        assert!(result.is_empty());
    }
}
