//! Lineage graph entities.
//!
//! Nodes are flat records keyed by their `id` (an LSID in the payload
//! vocabulary). Relationships are id references resolved through the
//! owning [`LineageResult`](crate::LineageResult), never embedded nodes,
//! so a node graph with mutual parent/child references stays acyclic in
//! memory and serializes as-is.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Directed reference from one node to another, with an optional role.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LineageLink {
    /// Target node id.
    #[serde(alias = "lsid")]
    pub id: String,

    /// Relationship role (e.g. "Input", "Output").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl LineageLink {
    /// Create a link without a role.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: None,
        }
    }

    /// Create a link with a role.
    pub fn with_role(id: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: Some(role.into()),
        }
    }
}

/// One provenance node: a sample, data object or run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineageNode {
    /// Unique id within a result.
    #[serde(alias = "lsid")]
    pub id: String,

    /// Display name.
    #[serde(default)]
    pub name: String,

    /// Node type, e.g. "Sample", "Data", "ExperimentRun".
    #[serde(rename = "type", default)]
    pub node_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpas_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_name: Option<String>,

    /// Ordered parent references.
    #[serde(default)]
    pub parents: Vec<LineageLink>,

    /// Ordered child references.
    #[serde(default)]
    pub children: Vec<LineageLink>,

    /// Free-form metadata attached by enrichment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,

    /// Navigable link stamped by a URL resolver.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl LineageNode {
    /// Create a node with no links.
    pub fn new(id: impl Into<String>, name: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            node_type: node_type.into(),
            cpas_type: None,
            schema_name: None,
            query_name: None,
            parents: Vec::new(),
            children: Vec::new(),
            meta: None,
            url: None,
        }
    }

    /// Add a parent link.
    pub fn with_parent(mut self, id: impl Into<String>) -> Self {
        self.parents.push(LineageLink::new(id));
        self
    }

    /// Add a child link.
    pub fn with_child(mut self, id: impl Into<String>) -> Self {
        self.children.push(LineageLink::new(id));
        self
    }

    /// Add a parent link carrying a role.
    pub fn with_parent_role(mut self, id: impl Into<String>, role: impl Into<String>) -> Self {
        self.parents.push(LineageLink::with_role(id, role));
        self
    }

    /// Add a child link carrying a role.
    pub fn with_child_role(mut self, id: impl Into<String>, role: impl Into<String>) -> Self {
        self.children.push(LineageLink::with_role(id, role));
        self
    }

    pub fn with_cpas_type(mut self, cpas_type: impl Into<String>) -> Self {
        self.cpas_type = Some(cpas_type.into());
        self
    }

    /// Set the schema/query pair the node's row lives in.
    pub fn with_query(mut self, schema_name: impl Into<String>, query_name: impl Into<String>) -> Self {
        self.schema_name = Some(schema_name.into());
        self.query_name = Some(query_name.into());
        self
    }

    pub fn with_meta(mut self, meta: Value) -> Self {
        self.meta = Some(meta);
        self
    }

    /// Ids of the parent links, in payload order.
    pub fn parent_ids(&self) -> impl Iterator<Item = &str> {
        self.parents.iter().map(|link| link.id.as_str())
    }

    /// Ids of the child links, in payload order.
    pub fn child_ids(&self) -> impl Iterator<Item = &str> {
        self.children.iter().map(|link| link.id.as_str())
    }

    /// Resolve a filterable field to its value.
    ///
    /// Known fields map to the record's own attributes (`lsid` is accepted
    /// as an alias of `id`); any other name is looked up as a top-level
    /// scalar key of `meta`. Returns `None` when the node has no value.
    pub fn field_value(&self, field: &str) -> Option<Value> {
        let text = |s: &str| Some(Value::String(s.to_string()));
        match field {
            "id" | "lsid" => text(&self.id),
            "name" => text(&self.name),
            "type" => text(&self.node_type),
            "cpasType" => self.cpas_type.as_deref().and_then(text),
            "schemaName" => self.schema_name.as_deref().and_then(text),
            "queryName" => self.query_name.as_deref().and_then(text),
            other => self
                .meta
                .as_ref()
                .and_then(|meta| meta.get(other))
                .filter(|value| !value.is_null() && !value.is_object() && !value.is_array())
                .cloned(),
        }
    }
}
