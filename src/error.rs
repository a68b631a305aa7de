//! Error types for lineage operations.

use thiserror::Error;

/// Errors raised by the lineage engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineageError {
    /// A required argument was missing or empty.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Options failed validation at construction time.
    #[error("validation error: {0}")]
    Validation(String),

    /// The lineage payload carries an upstream fetch error.
    #[error("upstream lineage error: {0}")]
    Upstream(String),

    /// Options text could not be parsed.
    #[error("config error: {0}")]
    Config(String),
}

impl LineageError {
    /// Get an error code for this error type.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "INVALID_ARGUMENT",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Upstream(_) => "UPSTREAM_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
        }
    }
}

impl From<serde_yaml::Error> for LineageError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<serde_json::Error> for LineageError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(err.to_string())
    }
}

/// Structural problems found in a lineage payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityIssue {
    /// The seed id has no node record.
    #[error("Missing seed: '{seed}' not found in nodes")]
    MissingSeed { seed: String },

    /// A parent or child link names an id with no node record.
    #[error("Dangling link: {source_node} -> {target} (target not found in nodes)")]
    DanglingLink { source_node: String, target: String },

    /// Map key differs from the node's own id.
    #[error("Node ID mismatch: map key '{key}' != node.id '{node_id}'")]
    IdMismatch { key: String, node_id: String },

    /// Following children returns to a node already on the path.
    #[error("Cycle detected in lineage: {}", path.join(" -> "))]
    CycleDetected { path: Vec<String> },
}

impl IntegrityIssue {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingSeed { .. } => "MISSING_SEED",
            Self::DanglingLink { .. } => "DANGLING_LINK",
            Self::IdMismatch { .. } => "ID_MISMATCH",
            Self::CycleDetected { .. } => "CYCLE_DETECTED",
        }
    }

    /// Cycles are tolerated by traversal, so they only warn.
    pub fn is_blocking(&self) -> bool {
        !matches!(self, Self::CycleDetected { .. })
    }
}
