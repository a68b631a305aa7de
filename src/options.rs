//! Options model: filter predicates, generation policy and clustering.
//!
//! Options are validated when they are constructed. An invalid
//! `combineSize` is rejected by [`LineageGroupingOptions::with_combine_size`],
//! by `TryFrom<GroupingConfig>` and by deserialization, so a
//! `LineageGroupingOptions` value is always usable as-is.

use crate::error::LineageError;
use crate::node::LineageNode;
use crate::result::LineageResult;
use crate::{DEFAULT_CHILD_DEPTH, DEFAULT_COMBINE_SIZE, DEFAULT_PARENT_DEPTH};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

// =============================================================================
// FILTERS
// =============================================================================

/// Value side of a filter: one scalar or a list of scalars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Many(Vec<Value>),
    One(Value),
}

impl FilterValue {
    /// Whether a node's field value satisfies this filter value.
    ///
    /// A missing field never matches, and an empty list matches nothing.
    pub fn matches(&self, field_value: Option<&Value>) -> bool {
        let Some(field_value) = field_value else {
            return false;
        };
        match self {
            Self::One(expected) => expected == field_value,
            Self::Many(expected) => expected.iter().any(|v| v == field_value),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::One(Value::String(value.to_string()))
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::One(Value::String(value))
    }
}

impl From<Vec<&str>> for FilterValue {
    fn from(values: Vec<&str>) -> Self {
        Self::Many(
            values
                .into_iter()
                .map(|v| Value::String(v.to_string()))
                .collect(),
        )
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(values: Vec<String>) -> Self {
        Self::Many(values.into_iter().map(Value::String).collect())
    }
}

/// A field/value predicate applied to every node of a result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineageFilter {
    pub field: String,
    pub value: FilterValue,
}

impl LineageFilter {
    pub fn new(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

// =============================================================================
// GROUPING
// =============================================================================

/// How far traversal extends from the seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineageGenerations {
    /// Every reachable ancestor and descendant.
    #[default]
    #[serde(alias = "All")]
    All,
    /// Unbroken single-parent/single-child chains, up to the first branch.
    #[serde(alias = "Multi")]
    Multi,
    /// Immediate parents and children only.
    #[serde(alias = "Nearest")]
    Nearest,
    /// `parentDepth` generations up, `childDepth` generations down.
    #[serde(alias = "Specific")]
    Specific,
}

impl LineageGenerations {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Multi => "multi",
            Self::Nearest => "nearest",
            Self::Specific => "specific",
        }
    }
}

impl fmt::Display for LineageGenerations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unvalidated grouping settings, as supplied by a caller or a config file.
///
/// Absent fields fall back to the crate defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupingConfig {
    #[serde(default)]
    pub generations: Option<LineageGenerations>,
    #[serde(default)]
    pub parent_depth: Option<usize>,
    #[serde(default)]
    pub child_depth: Option<usize>,
    #[serde(default)]
    pub combine_size: Option<usize>,
}

/// Validated traversal and clustering parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "GroupingConfig")]
pub struct LineageGroupingOptions {
    generations: LineageGenerations,
    parent_depth: usize,
    child_depth: usize,
    combine_size: usize,
}

impl LineageGroupingOptions {
    /// Defaults with the given generation policy.
    pub fn new(generations: LineageGenerations) -> Self {
        Self {
            generations,
            ..Self::default()
        }
    }

    pub fn with_parent_depth(mut self, depth: usize) -> Self {
        self.parent_depth = depth;
        self
    }

    pub fn with_child_depth(mut self, depth: usize) -> Self {
        self.child_depth = depth;
        self
    }

    /// Set the cluster threshold; `0` disables clustering.
    ///
    /// # Errors
    /// Returns [`LineageError::Validation`] for a size of `1`.
    pub fn with_combine_size(mut self, size: usize) -> Result<Self, LineageError> {
        validate_combine_size(size)?;
        self.combine_size = size;
        Ok(self)
    }

    pub fn generations(&self) -> LineageGenerations {
        self.generations
    }

    pub fn parent_depth(&self) -> usize {
        self.parent_depth
    }

    pub fn child_depth(&self) -> usize {
        self.child_depth
    }

    pub fn combine_size(&self) -> usize {
        self.combine_size
    }

    pub fn clustering_enabled(&self) -> bool {
        self.combine_size > 1
    }

    /// Unbounded traversal with clustering switched off.
    pub(crate) fn ungrouped() -> Self {
        Self {
            combine_size: 0,
            ..Self::default()
        }
    }
}

impl Default for LineageGroupingOptions {
    fn default() -> Self {
        Self {
            generations: LineageGenerations::All,
            parent_depth: DEFAULT_PARENT_DEPTH,
            child_depth: DEFAULT_CHILD_DEPTH,
            combine_size: DEFAULT_COMBINE_SIZE,
        }
    }
}

impl TryFrom<GroupingConfig> for LineageGroupingOptions {
    type Error = LineageError;

    fn try_from(config: GroupingConfig) -> Result<Self, Self::Error> {
        let combine_size = config.combine_size.unwrap_or(DEFAULT_COMBINE_SIZE);
        validate_combine_size(combine_size)?;
        Ok(Self {
            generations: config.generations.unwrap_or_default(),
            parent_depth: config.parent_depth.unwrap_or(DEFAULT_PARENT_DEPTH),
            child_depth: config.child_depth.unwrap_or(DEFAULT_CHILD_DEPTH),
            combine_size,
        })
    }
}

fn validate_combine_size(size: usize) -> Result<(), LineageError> {
    if size == 1 {
        return Err(LineageError::Validation(
            "combineSize must be 0 (disabled) or greater than 1".to_string(),
        ));
    }
    Ok(())
}

// =============================================================================
// URL RESOLVER
// =============================================================================

/// Resolves a navigable URL for a node.
pub trait LineageUrlResolver: Send + Sync {
    fn resolve(&self, node: &LineageNode) -> Option<String>;
}

impl<F> LineageUrlResolver for F
where
    F: Fn(&LineageNode) -> Option<String> + Send + Sync,
{
    fn resolve(&self, node: &LineageNode) -> Option<String> {
        self(node)
    }
}

// =============================================================================
// LINEAGE OPTIONS
// =============================================================================

/// Full configuration for one graph generation.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "OptionsDocument")]
pub struct LineageOptions {
    pub filters: Vec<LineageFilter>,

    /// Keep matching nodes (`true`) or drop them (`false`).
    pub filter_in: bool,

    /// Traversal and clustering; `None` walks everything unclustered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grouping: Option<LineageGroupingOptions>,

    #[serde(skip)]
    pub url_resolver: Option<Arc<dyn LineageUrlResolver>>,
}

fn default_filter_in() -> bool {
    true
}

/// Options document with grouping left unvalidated, so parse failures and
/// validation failures surface as distinct errors. Every deserialization of
/// [`LineageOptions`] goes through it.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptionsDocument {
    #[serde(default)]
    filters: Vec<LineageFilter>,
    #[serde(default = "default_filter_in")]
    filter_in: bool,
    #[serde(default)]
    grouping: Option<GroupingConfig>,
}

impl TryFrom<OptionsDocument> for LineageOptions {
    type Error = LineageError;

    fn try_from(doc: OptionsDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            filters: doc.filters,
            filter_in: doc.filter_in,
            grouping: doc
                .grouping
                .map(LineageGroupingOptions::try_from)
                .transpose()?,
            url_resolver: None,
        })
    }
}

impl LineageOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: LineageFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn with_filter_in(mut self, filter_in: bool) -> Self {
        self.filter_in = filter_in;
        self
    }

    pub fn with_grouping(mut self, grouping: LineageGroupingOptions) -> Self {
        self.grouping = Some(grouping);
        self
    }

    pub fn with_url_resolver(mut self, resolver: impl LineageUrlResolver + 'static) -> Self {
        self.url_resolver = Some(Arc::new(resolver));
        self
    }

    /// Parse options from YAML text.
    pub fn from_yaml_str(text: &str) -> Result<Self, LineageError> {
        let doc: OptionsDocument = serde_yaml::from_str(text)?;
        doc.try_into()
    }

    /// Parse options from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, LineageError> {
        let doc: OptionsDocument = serde_json::from_str(text)?;
        doc.try_into()
    }

    /// Grouping used by the pipeline: the configured one, or an unbounded
    /// unclustered walk when none is set.
    pub fn effective_grouping(&self) -> LineageGroupingOptions {
        self.grouping
            .clone()
            .unwrap_or_else(LineageGroupingOptions::ungrouped)
    }

    /// Apply every filter in order, keeping or dropping matches per `filter_in`.
    pub fn apply_filters(&self, result: &LineageResult) -> Result<LineageResult, LineageError> {
        self.filters.iter().try_fold(result.clone(), |acc, filter| {
            if self.filter_in {
                acc.filter_in(&filter.field, &filter.value)
            } else {
                acc.filter_out(&filter.field, &filter.value)
            }
        })
    }
}

impl Default for LineageOptions {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            filter_in: true,
            grouping: None,
            url_resolver: None,
        }
    }
}

impl fmt::Debug for LineageOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineageOptions")
            .field("filters", &self.filters)
            .field("filter_in", &self.filter_in)
            .field("grouping", &self.grouping)
            .field("url_resolver", &self.url_resolver.as_ref().map(|_| "<resolver>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_grouping_defaults() {
        let grouping = LineageGroupingOptions::default();
        assert_eq!(grouping.generations(), LineageGenerations::All);
        assert_eq!(grouping.parent_depth(), 4);
        assert_eq!(grouping.child_depth(), 3);
        assert_eq!(grouping.combine_size(), 6);
        assert!(grouping.clustering_enabled());
    }

    #[test]
    fn test_combine_size_one_rejected() {
        let err = LineageGroupingOptions::default()
            .with_combine_size(1)
            .unwrap_err();
        assert!(matches!(err, LineageError::Validation(_)));

        let config = GroupingConfig {
            combine_size: Some(1),
            ..Default::default()
        };
        assert!(LineageGroupingOptions::try_from(config).is_err());
    }

    #[test]
    fn test_combine_size_zero_disables() {
        let grouping = LineageGroupingOptions::default()
            .with_combine_size(0)
            .unwrap();
        assert!(!grouping.clustering_enabled());
        assert!(!LineageOptions::default().effective_grouping().clustering_enabled());
    }

    #[test]
    fn test_deserialize_grouping_validates() {
        let ok: LineageGroupingOptions =
            serde_json::from_str(r#"{"generations":"specific","parentDepth":2}"#).unwrap();
        assert_eq!(ok.generations(), LineageGenerations::Specific);
        assert_eq!(ok.parent_depth(), 2);
        assert_eq!(ok.child_depth(), 3);

        let bad = serde_json::from_str::<LineageGroupingOptions>(r#"{"combineSize":1}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_options_from_yaml() {
        let yaml = r#"
filters:
  - field: type
    value: [Sample, Data]
filterIn: false
grouping:
  generations: Nearest
  combineSize: 3
"#;
        let options = LineageOptions::from_yaml_str(yaml).unwrap();
        assert!(!options.filter_in);
        assert_eq!(
            options.filters[0].value,
            FilterValue::Many(vec![json!("Sample"), json!("Data")])
        );
        let grouping = options.grouping.unwrap();
        assert_eq!(grouping.generations(), LineageGenerations::Nearest);
        assert_eq!(grouping.combine_size(), 3);
    }

    #[test]
    fn test_options_from_yaml_errors() {
        let err = LineageOptions::from_yaml_str("grouping:\n  combineSize: 1\n").unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");

        let err = LineageOptions::from_json_str("{ not json").unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_direct_deserialize_uses_options_document() {
        let err = serde_json::from_str::<LineageOptions>(r#"{"grouping":{"combineSize":1}}"#)
            .unwrap_err();
        assert!(err.to_string().contains("validation error"), "{}", err);

        let options: LineageOptions = serde_json::from_str(r#"{"filters":[]}"#).unwrap();
        assert!(options.filter_in);
        assert!(options.grouping.is_none());
        assert!(options.url_resolver.is_none());
    }

    #[test]
    fn test_filter_value_matching() {
        let one = FilterValue::from("Sample");
        assert!(one.matches(Some(&json!("Sample"))));
        assert!(!one.matches(Some(&json!("Data"))));
        assert!(!one.matches(None));

        let empty = FilterValue::Many(vec![]);
        assert!(!empty.matches(Some(&json!("Sample"))));
    }

    #[test]
    fn test_url_resolver_closure() {
        let options = LineageOptions::new()
            .with_url_resolver(|node: &LineageNode| Some(format!("/lineage/{}", node.id)));
        let node = LineageNode::new("s1", "S1", "Sample");
        let resolver = options.url_resolver.as_ref().unwrap();
        assert_eq!(resolver.resolve(&node).as_deref(), Some("/lineage/s1"));
        assert!(format!("{:?}", options).contains("<resolver>"));
    }
}
