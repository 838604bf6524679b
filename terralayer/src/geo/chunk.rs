use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{join_all, BoxFuture, FutureExt};

use super::{Attachment, AttachmentError, AttachmentId, AttachmentSet};

type ErasedValue = Arc<dyn Any + Send + Sync>;

#[derive(Clone)]
struct Entry {
    name: Arc<str>,
    value: ErasedValue,
}

/// Heterogeneous map from attachment to value.
///
/// Values are shared, so cloning a chunk is cheap.
#[derive(Clone, Default)]
pub struct GeoChunk {
    entries: HashMap<AttachmentId, Entry>,
}

impl GeoChunk {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builder() -> GeoChunkBuilder {
        GeoChunkBuilder::new()
    }

    pub fn get<V: Any + Send + Sync>(&self, attachment: &Attachment<V>) -> Option<&V> {
        self.entries
            .get(&attachment.id())
            .and_then(|entry| entry.value.downcast_ref::<V>())
    }

    pub fn get_or_err<V: Any + Send + Sync>(
        &self,
        attachment: &Attachment<V>,
    ) -> Result<&V, AttachmentError> {
        self.get(attachment)
            .ok_or_else(|| AttachmentError::Missing(attachment.name().to_string()))
    }

    /// Removes a value from this chunk, cloning it only if it is still
    /// shared with another chunk.
    pub fn take<V: Any + Clone + Send + Sync>(&mut self, attachment: &Attachment<V>) -> Option<V> {
        let entry = self.entries.remove(&attachment.id())?;
        let value = entry.value.downcast::<V>().ok()?;
        Some(Arc::try_unwrap(value).unwrap_or_else(|shared| (*shared).clone()))
    }

    pub fn contains<V>(&self, attachment: &Attachment<V>) -> bool {
        self.entries.contains_key(&attachment.id())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn has_all(&self, attachments: &AttachmentSet) -> bool {
        attachments.iter().all(|id| self.entries.contains_key(&id))
    }

    /// Returns this chunk only if every attachment of the set is present.
    pub fn require_all(self, attachments: &AttachmentSet) -> Option<Self> {
        self.has_all(attachments).then_some(self)
    }
}

impl fmt::Debug for GeoChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.entries.values().map(|e| &*e.name).collect();
        names.sort_unstable();
        f.debug_struct("GeoChunk").field("attachments", &names).finish()
    }
}

type PendingValue = BoxFuture<'static, Option<ErasedValue>>;

/// Collects the pending values of a chunk and awaits them together.
#[derive(Default)]
pub struct GeoChunkBuilder {
    pending: Vec<(AttachmentId, Arc<str>, PendingValue)>,
}

impl GeoChunkBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put<V, F>(mut self, attachment: &Attachment<V>, value: F) -> Self
    where
        V: Any + Send + Sync,
        F: Future<Output = Option<V>> + Send + 'static,
    {
        let erased = value
            .map(|value| value.map(|v| Arc::new(v) as ErasedValue))
            .boxed();
        self.pending
            .push((attachment.id(), attachment.name_arc(), erased));
        self
    }

    /// Awaits every pending value. Absent values are left out; the chunk
    /// itself is always produced.
    pub async fn build(self) -> GeoChunk {
        let (keys, pending): (Vec<_>, Vec<_>) = self
            .pending
            .into_iter()
            .map(|(id, name, future)| ((id, name), future))
            .unzip();

        let values = join_all(pending).await;

        let entries = keys
            .into_iter()
            .zip(values)
            .filter_map(|((id, name), value)| value.map(|value| (id, Entry { name, value })))
            .collect();

        GeoChunk { entries }
    }
}
