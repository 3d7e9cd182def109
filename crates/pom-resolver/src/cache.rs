//! Cache of fully resolved POMs keyed by resolved coordinates.

use std::sync::Arc;

use dashmap::DashMap;
use pom_core::types::Gav;

use crate::resolved::ResolvedPom;

/// Storage for resolved POMs shared across resolution runs.
///
/// `put_resolved_pom` returns the entry that ends up in the cache, so
/// concurrent resolvers of the same coordinate converge on one instance.
pub trait ResolutionCache: Send + Sync {
    fn resolved_pom(&self, gav: &Gav) -> Option<Arc<ResolvedPom>>;
    fn put_resolved_pom(&self, gav: &Gav, pom: Arc<ResolvedPom>) -> Arc<ResolvedPom>;
}

/// Process-local cache backed by a concurrent map.
#[derive(Debug, Default)]
pub struct InMemoryResolutionCache {
    resolved: DashMap<Gav, Arc<ResolvedPom>>,
}

impl InMemoryResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.resolved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }
}

impl ResolutionCache for InMemoryResolutionCache {
    fn resolved_pom(&self, gav: &Gav) -> Option<Arc<ResolvedPom>> {
        self.resolved.get(gav).map(|entry| Arc::clone(&entry))
    }

    fn put_resolved_pom(&self, gav: &Gav, pom: Arc<ResolvedPom>) -> Arc<ResolvedPom> {
        // entry() holds the shard lock, so a racing insert is atomic and
        // the first writer wins.
        let entry = self.resolved.entry(gav.clone()).or_insert(pom);
        Arc::clone(&entry)
    }
}
