//! Integrity checks for lineage payloads.
//!
//! Implements pre-generation validation:
//! 1. Seed presence (non-empty payloads only)
//! 2. Node ID consistency (map key == node.id)
//! 3. Link integrity (every parent/child id resolves)
//! 4. Cycle detection (DFS from the seed with path tracking, along children)
//!
//! Generation never requires a clean report: dangling links are skipped and
//! cycles terminate. The report exists for callers that want to reject or
//! flag malformed payloads before rendering.

use crate::error::IntegrityIssue;
use crate::result::LineageResult;
use std::collections::HashSet;

/// Result of validating a lineage payload.
#[derive(Debug, Default)]
pub struct IntegrityReport {
    /// Blocking issues.
    pub errors: Vec<IntegrityIssue>,
    /// Non-blocking issues.
    pub warnings: Vec<IntegrityIssue>,
}

impl IntegrityReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// No blocking issues.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Add an issue on the side its severity dictates.
    pub fn add(&mut self, issue: IntegrityIssue) {
        if issue.is_blocking() {
            self.errors.push(issue);
        } else {
            self.warnings.push(issue);
        }
    }

    pub fn issue_count(&self) -> usize {
        self.errors.len() + self.warnings.len()
    }
}

/// Validate a lineage payload.
///
/// # Example
///
/// ```
/// use lineage_graph::{validate, LineageNode, LineageResult};
///
/// let result = LineageResult::new(
///     "s1",
///     vec![LineageNode::new("s1", "S1", "Sample").with_child("ghost")],
/// );
/// let report = validate(&result);
/// assert!(!report.is_valid());
/// ```
pub fn validate(result: &LineageResult) -> IntegrityReport {
    let mut report = IntegrityReport::new();

    validate_seed(result, &mut report);
    validate_node_ids(result, &mut report);
    validate_links(result, &mut report);
    validate_no_cycles(result, &mut report);

    tracing::debug!(
        seed = result.seed(),
        errors = report.errors.len(),
        warnings = report.warnings.len(),
        "validated lineage payload"
    );
    report
}

fn validate_seed(result: &LineageResult, report: &mut IntegrityReport) {
    if !result.is_empty() && result.seed_node().is_none() {
        report.add(IntegrityIssue::MissingSeed {
            seed: result.seed().to_string(),
        });
    }
}

fn validate_node_ids(result: &LineageResult, report: &mut IntegrityReport) {
    for (key, node) in result.nodes() {
        if key != &node.id {
            report.add(IntegrityIssue::IdMismatch {
                key: key.clone(),
                node_id: node.id.clone(),
            });
        }
    }
}

fn validate_links(result: &LineageResult, report: &mut IntegrityReport) {
    for (source_id, node) in result.nodes() {
        for target in node.parent_ids().chain(node.child_ids()) {
            if !result.contains(target) {
                report.add(IntegrityIssue::DanglingLink {
                    source_node: source_id.clone(),
                    target: target.to_string(),
                });
            }
        }
    }
}

fn validate_no_cycles(result: &LineageResult, report: &mut IntegrityReport) {
    let mut global_visited: HashSet<&str> = HashSet::new();
    let mut path: Vec<&str> = Vec::new();
    let mut path_set: HashSet<&str> = HashSet::new();

    // Start DFS from the seed
    detect_cycles_dfs(
        result.seed(),
        result,
        &mut global_visited,
        &mut path,
        &mut path_set,
        report,
    );
}

fn detect_cycles_dfs<'a>(
    node_id: &'a str,
    result: &'a LineageResult,
    global_visited: &mut HashSet<&'a str>,
    path: &mut Vec<&'a str>,
    path_set: &mut HashSet<&'a str>,
    report: &mut IntegrityReport,
) {
    if path_set.contains(node_id) {
        if let Some(pos) = path.iter().position(|&id| id == node_id) {
            report.add(IntegrityIssue::CycleDetected {
                path: path[pos..].iter().map(|id| id.to_string()).collect(),
            });
        }
        return;
    }
    if global_visited.contains(node_id) {
        return;
    }

    path.push(node_id);
    path_set.insert(node_id);

    if let Some(node) = result.node(node_id) {
        for child in node.child_ids() {
            detect_cycles_dfs(child, result, global_visited, path, path_set, report);
        }
    }

    path.pop();
    path_set.remove(node_id);
    global_visited.insert(node_id);
}
