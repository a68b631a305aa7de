//! Lineage result cache collaborator.
//!
//! The engine never consults a cache; callers that fetch lineage own one
//! and pass results in. Results carrying an upstream error are not cached
//! by [`load_or_insert_with`], so a failed fetch is retried next time.

use crate::result::LineageResult;
use std::collections::BTreeMap;

/// Seed-keyed store of fetched lineage results.
pub trait LineageCache {
    fn get_result(&self, seed: &str) -> Option<LineageResult>;

    fn put_result(&mut self, seed: &str, result: LineageResult);
}

/// In-memory cache (for tests and single-session callers).
#[derive(Debug, Default, Clone)]
pub struct InMemoryLineageCache {
    results: BTreeMap<String, LineageResult>,
}

impl InMemoryLineageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop one seed's entry, returning it if present.
    pub fn invalidate(&mut self, seed: &str) -> Option<LineageResult> {
        self.results.remove(seed)
    }

    pub fn clear(&mut self) {
        self.results.clear();
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

impl LineageCache for InMemoryLineageCache {
    fn get_result(&self, seed: &str) -> Option<LineageResult> {
        self.results.get(seed).cloned()
    }

    fn put_result(&mut self, seed: &str, result: LineageResult) {
        self.results.insert(seed.to_string(), result);
    }
}

/// Return the cached result for `seed`, or load and cache it.
pub fn load_or_insert_with<C, F>(cache: &mut C, seed: &str, loader: F) -> LineageResult
where
    C: LineageCache + ?Sized,
    F: FnOnce() -> LineageResult,
{
    if let Some(hit) = cache.get_result(seed) {
        tracing::trace!(seed, "lineage cache hit");
        return hit;
    }

    let result = loader();
    if result.has_error() {
        tracing::debug!(seed, error = result.error(), "not caching failed lineage fetch");
    } else {
        cache.put_result(seed, result.clone());
    }
    result
}
