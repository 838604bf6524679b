//! In-memory cache of shared load futures.

use std::hash::Hash;
use std::time::Duration;

use futures::future::{FutureExt, Shared};
use moka::sync::Cache;
use tracing::trace;

use crate::loader::{Cacher, LoadFn, LoadFuture};

/// Memory cache bounded by entry count and time-to-idle.
///
/// The future for a load is cached as soon as it is created, so requests that
/// arrive while it is still pending share it. Absent results are cached too
/// and expire like any other entry.
pub struct MemoryCacher<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    cache: Cache<K, Shared<LoadFuture<V>>>,
}

impl<K, V> MemoryCacher<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Creates a cache holding at most `max_entries` entries, each dropped
    /// after `time_to_idle` without access.
    pub fn new(time_to_idle: Duration, max_entries: u64) -> Self {
        let cache = Cache::builder()
            .time_to_idle(time_to_idle)
            .max_capacity(max_entries)
            .build();
        Self { cache }
    }

    /// Returns the approximate number of cached entries.
    pub fn entry_count(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }

    /// Drops every cached entry.
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }
}

impl<K, V> Cacher<K, V> for MemoryCacher<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn get_or_load(&self, key: K, load: LoadFn<V>) -> LoadFuture<V> {
        let entry = self.cache.entry(key).or_insert_with(|| load().shared());
        if entry.is_fresh() {
            trace!("memory cache miss");
        } else {
            trace!("memory cache hit");
        }
        entry.into_value().boxed()
    }
}

impl<K, V> std::fmt::Debug for MemoryCacher<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCacher")
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}
