use std::sync::Arc;

use super::LoadFuture;

/// Deferred invocation of the underlying loader, called only on a miss.
pub type LoadFn<V> = Box<dyn FnOnce() -> LoadFuture<V> + Send + 'static>;

/// A cache that can be interposed in front of a loader.
///
/// Implementations must invoke `load` at most once per key while a load for
/// that key is outstanding; concurrent requests share its result.
pub trait Cacher<K, V>: Send + Sync + 'static {
    fn get_or_load(&self, key: K, load: LoadFn<V>) -> LoadFuture<V>;
}

impl<K, V, C> Cacher<K, V> for Arc<C>
where
    C: Cacher<K, V> + ?Sized,
{
    fn get_or_load(&self, key: K, load: LoadFn<V>) -> LoadFuture<V> {
        (**self).get_or_load(key, load)
    }
}

/// Combinators available on every sized [`Cacher`].
pub trait CacherExt<K, V>: Cacher<K, V> + Sized {
    /// Adapts the key type of this cacher.
    fn map_key<K2, F>(self, f: F) -> MappedCacher<Self, F>
    where
        F: Fn(K2) -> K + Send + Sync + 'static,
    {
        MappedCacher { inner: self, f }
    }
}

impl<K, V, C: Cacher<K, V>> CacherExt<K, V> for C {}

/// Cacher produced by [`CacherExt::map_key`].
pub struct MappedCacher<C, F> {
    inner: C,
    f: F,
}

impl<K, K2, V, C, F> Cacher<K2, V> for MappedCacher<C, F>
where
    C: Cacher<K, V>,
    F: Fn(K2) -> K + Send + Sync + 'static,
{
    fn get_or_load(&self, key: K2, load: LoadFn<V>) -> LoadFuture<V> {
        self.inner.get_or_load((self.f)(key), load)
    }
}
