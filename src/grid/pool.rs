//! Pool resolution
//!
//! A [`PoolResolver`] maps a pool name to a live pool. Resolution happens on
//! every call, so resolvers must answer from current state and never remember
//! a miss.

use super::{CacheSession, Pool};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Strategy for resolving a [`Pool`] by name
pub trait PoolResolver: Send + Sync {
    /// Returns the pool registered under `name`, if any
    fn resolve(&self, name: &str) -> Option<Arc<dyn Pool>>;
}

impl<F> PoolResolver for F
where
    F: Fn(&str) -> Option<Arc<dyn Pool>> + Send + Sync,
{
    fn resolve(&self, name: &str) -> Option<Arc<dyn Pool>> {
        self(name)
    }
}

/// Concurrent registry of named pools
///
/// Destroyed pools are never returned, even while still registered.
#[derive(Default)]
pub struct PoolManager {
    pools: DashMap<String, Arc<dyn Pool>>,
}

impl PoolManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pool under its own name, replacing any previous pool
    pub fn register(&self, pool: Arc<dyn Pool>) {
        let name = pool.name().to_string();
        if self.pools.insert(name.clone(), pool).is_some() {
            info!(pool = %name, "Replaced registered pool");
        } else {
            debug!(pool = %name, "Registered pool");
        }
    }

    /// Remove a pool, returning it if it was registered
    pub fn unregister(&self, name: &str) -> Option<Arc<dyn Pool>> {
        self.pools.remove(name).map(|(_, pool)| pool)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.pools.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}

impl PoolResolver for PoolManager {
    fn resolve(&self, name: &str) -> Option<Arc<dyn Pool>> {
        self.pools
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
            .filter(|pool| !pool.is_destroyed())
    }
}

/// Resolves pools through a cache session
pub struct SessionPoolResolver {
    session: Arc<dyn CacheSession>,
}

impl SessionPoolResolver {
    pub fn new(session: Arc<dyn CacheSession>) -> Self {
        Self { session }
    }
}

impl PoolResolver for SessionPoolResolver {
    fn resolve(&self, name: &str) -> Option<Arc<dyn Pool>> {
        self.session
            .find_pool(name)
            .filter(|pool| !pool.is_destroyed())
    }
}

/// Consults several resolvers in order; the first answer wins
#[derive(Default)]
pub struct CompositePoolResolver {
    resolvers: Vec<Arc<dyn PoolResolver>>,
}

impl CompositePoolResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, resolver: Arc<dyn PoolResolver>) -> Self {
        self.resolvers.push(resolver);
        self
    }

    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }
}

impl PoolResolver for CompositePoolResolver {
    fn resolve(&self, name: &str) -> Option<Arc<dyn Pool>> {
        self.resolvers.iter().find_map(|resolver| resolver.resolve(name))
    }
}
