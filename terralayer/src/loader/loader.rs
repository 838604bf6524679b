use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};

use super::{Cacher, ConcurrencyLimiter, LimitedLoader};

/// Future returned by every loader: the value, or `None` when absent.
pub type LoadFuture<V> = BoxFuture<'static, Option<V>>;

/// Shared, type-erased loader handle.
pub type SharedLoader<K, V> = Arc<dyn Loader<K, V>>;

/// Asynchronously resolves a key to an optional value.
pub trait Loader<K, V>: Send + Sync + 'static {
    fn load(&self, key: K) -> LoadFuture<V>;
}

impl<K, V, L> Loader<K, V> for Arc<L>
where
    L: Loader<K, V> + ?Sized,
{
    fn load(&self, key: K) -> LoadFuture<V> {
        (**self).load(key)
    }
}

/// Combinators available on every sized [`Loader`].
pub trait LoaderExt<K, V>: Loader<K, V> + Sized {
    /// Transforms the key before it reaches this loader.
    fn map_key<K2, F>(self, f: F) -> MapKey<Self, F>
    where
        F: Fn(K2) -> K + Send + Sync + 'static,
    {
        MapKey { inner: self, f }
    }

    /// Runs `first`, then feeds its value (if any) into this loader.
    fn compose<J, L>(self, first: L) -> Composed<L, Self, K>
    where
        L: Loader<J, K>,
    {
        Composed {
            first,
            second: Arc::new(self),
            _intermediate: PhantomData,
        }
    }

    /// Interposes a cache in front of this loader.
    fn cached<C>(self, cacher: C) -> Cached<Self, C>
    where
        C: Cacher<K, V>,
    {
        Cached {
            loader: Arc::new(self),
            cacher,
        }
    }

    /// Routes every load through `limiter`.
    fn limited(self, limiter: Arc<ConcurrencyLimiter>) -> LimitedLoader<Self> {
        ConcurrencyLimiter::wrap(&limiter, self)
    }

    /// Erases the loader type behind an `Arc`.
    fn shared(self) -> SharedLoader<K, V> {
        Arc::new(self)
    }
}

impl<K, V, L: Loader<K, V>> LoaderExt<K, V> for L {}

/// Loader produced by [`LoaderExt::map_key`].
pub struct MapKey<L, F> {
    inner: L,
    f: F,
}

impl<K, K2, V, L, F> Loader<K2, V> for MapKey<L, F>
where
    L: Loader<K, V>,
    F: Fn(K2) -> K + Send + Sync + 'static,
{
    fn load(&self, key: K2) -> LoadFuture<V> {
        self.inner.load((self.f)(key))
    }
}

/// Loader produced by [`LoaderExt::compose`].
pub struct Composed<A, B, K> {
    first: A,
    second: Arc<B>,
    _intermediate: PhantomData<fn(K) -> K>,
}

impl<J, K, V, A, B> Loader<J, V> for Composed<A, B, K>
where
    A: Loader<J, K>,
    B: Loader<K, V>,
    K: 'static,
    V: 'static,
{
    fn load(&self, key: J) -> LoadFuture<V> {
        let first = self.first.load(key);
        let second = Arc::clone(&self.second);
        async move {
            let intermediate = first.await?;
            second.load(intermediate).await
        }
        .boxed()
    }
}

/// Loader produced by [`LoaderExt::cached`].
pub struct Cached<L, C> {
    loader: Arc<L>,
    cacher: C,
}

impl<K, V, L, C> Loader<K, V> for Cached<L, C>
where
    L: Loader<K, V>,
    C: Cacher<K, V>,
    K: Clone + Send + 'static,
{
    fn load(&self, key: K) -> LoadFuture<V> {
        let loader = Arc::clone(&self.loader);
        let inner_key = key.clone();
        self.cacher
            .get_or_load(key, Box::new(move || loader.load(inner_key)))
    }
}

/// Loader backed by a synchronous function.
pub struct FnLoader<F> {
    f: F,
}

/// Lifts a plain function into a loader.
pub fn from_fn<K, V, F>(f: F) -> FnLoader<F>
where
    F: Fn(K) -> Option<V> + Send + Sync + 'static,
{
    FnLoader { f }
}

impl<K, V, F> Loader<K, V> for FnLoader<F>
where
    F: Fn(K) -> Option<V> + Send + Sync + 'static,
    V: Send + 'static,
{
    fn load(&self, key: K) -> LoadFuture<V> {
        futures::future::ready((self.f)(key)).boxed()
    }
}

/// Loader backed by an async function.
pub struct AsyncFnLoader<F> {
    f: F,
}

/// Lifts an async function into a loader.
pub fn from_async_fn<K, V, F, Fut>(f: F) -> AsyncFnLoader<F>
where
    F: Fn(K) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Option<V>> + Send + 'static,
{
    AsyncFnLoader { f }
}

impl<K, V, F, Fut> Loader<K, V> for AsyncFnLoader<F>
where
    F: Fn(K) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Option<V>> + Send + 'static,
{
    fn load(&self, key: K) -> LoadFuture<V> {
        (self.f)(key).boxed()
    }
}

/// Loader that ignores its key and always yields the same value.
pub struct ReadyLoader<V> {
    value: Option<V>,
}

/// Creates a loader resolving every key to `value`.
pub fn ready<V>(value: Option<V>) -> ReadyLoader<V> {
    ReadyLoader { value }
}

impl<K, V> Loader<K, V> for ReadyLoader<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn load(&self, _key: K) -> LoadFuture<V> {
        futures::future::ready(self.value.clone()).boxed()
    }
}
