//! Composable asynchronous loaders.
//!
//! A [`Loader`] resolves a key to an optional value. Absence is the normal
//! outcome for anything that could not be produced: transport and IO failures
//! are logged where they happen and folded into `None`, so callers only ever
//! see "value" or "no data".
//!
//! # Composition
//!
//! ```text
//!   TileKey ──map_key──► url ──HttpLoader──► Bytes
//!                                 ▲
//!                          limited(limiter)
//!                                 │
//!                      cached(FileCacher)──► RasterReader ──► Raster
//!                                                       │
//!                                               cached(TileCache)
//! ```
//!
//! Loaders are combined with [`LoaderExt`], caches are interposed through the
//! [`Cacher`] contract and network access is throttled by a shared
//! [`ConcurrencyLimiter`].

mod cacher;
mod http;
mod limiter;
#[allow(clippy::module_inception)]
mod loader;

pub use cacher::{Cacher, CacherExt, LoadFn, MappedCacher};
pub use http::{HttpLoader, LoaderError, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};
pub use limiter::{ConcurrencyLimiter, LimitedLoader, Submission};
pub use loader::{
    from_async_fn, from_fn, ready, AsyncFnLoader, Cached, Composed, FnLoader, LoadFuture, Loader,
    LoaderExt, MapKey, ReadyLoader, SharedLoader,
};
