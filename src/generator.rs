//! Graph generation pipeline.
//!
//! ```text
//! LineageResult ──► filters ──► traverse ──► cluster ──► assemble ──► VisGraphOptions
//! ```
//!
//! Generation is deterministic: the same result and options always produce
//! the same node ids and edge set. Nothing is retained between calls.

use crate::cluster::cluster;
use crate::error::LineageError;
use crate::options::LineageOptions;
use crate::result::LineageResult;
use crate::traverse::traverse;
use crate::vis_graph::{assemble, VisGraphOptions};

/// Produce the visualization graph for `result` under `options`.
///
/// # Errors
/// - [`LineageError::Upstream`] when `result` carries a fetch error
/// - [`LineageError::InvalidArgument`] when a filter has no field
pub fn generate(result: &LineageResult, options: &LineageOptions) -> Result<VisGraphOptions, LineageError> {
    if let Some(error) = result.error() {
        return Err(LineageError::Upstream(error.to_string()));
    }

    let filtered = options.apply_filters(result)?;
    if !filtered.contains(filtered.seed()) {
        tracing::warn!(
            seed = filtered.seed(),
            filters = options.filters.len(),
            "seed removed by filters; emitting empty graph"
        );
        return Ok(VisGraphOptions::default());
    }

    let grouping = options.effective_grouping();
    let traversal = traverse(&filtered, &grouping);
    let clustering = cluster(&filtered, &traversal, &grouping);

    Ok(assemble(
        &filtered,
        &traversal,
        &clustering,
        options.url_resolver.as_deref(),
    ))
}

/// Generate with default options: no filters, full unclustered walk.
pub fn generate_with_defaults(result: &LineageResult) -> Result<VisGraphOptions, LineageError> {
    generate(result, &LineageOptions::default())
}
