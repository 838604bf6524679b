//! Projected views and the typed chunks assembled for them.
//!
//! ```text
//!   AttachmentRegistry ──register──► Attachment<V> (typed key)
//!                                          │
//!   GeoChunkBuilder::put(attachment, future) ... build()
//!                                          │
//!                                          ▼
//!                      GeoChunk { attachment → value }  (absence is normal)
//! ```

mod attachment;
mod chunk;
mod chunk_cache;
mod view;

pub use attachment::{Attachment, AttachmentError, AttachmentId, AttachmentRegistry, AttachmentSet};
pub use chunk::{GeoChunk, GeoChunkBuilder};
pub use chunk_cache::GeoChunkCache;
pub use view::GeoView;
