use std::collections::{HashMap, HashSet};
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use thiserror::Error;

/// Errors raised by attachment registration and lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttachmentError {
    #[error("attachment is already registered with id: {0}")]
    Duplicate(String),

    #[error("attachment {0} was missing on chunk")]
    Missing(String),
}

/// Process-unique identity of a registered attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttachmentId(u64);

impl AttachmentId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// A named, typed channel of a [`GeoChunk`](super::GeoChunk).
pub struct Attachment<V> {
    id: AttachmentId,
    name: Arc<str>,
    _value: PhantomData<fn() -> V>,
}

impl<V> Attachment<V> {
    pub fn id(&self) -> AttachmentId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn name_arc(&self) -> Arc<str> {
        Arc::clone(&self.name)
    }
}

impl<V> Clone for Attachment<V> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            name: Arc::clone(&self.name),
            _value: PhantomData,
        }
    }
}

impl<V> PartialEq for Attachment<V> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<V> Eq for Attachment<V> {}

impl<V> fmt::Debug for Attachment<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Attachment").field(&self.name).finish()
    }
}

impl<V> fmt::Display for Attachment<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Owns the set of attachment names in use.
///
/// Registration is explicit; a name can only be claimed once per registry.
#[derive(Debug, Default)]
pub struct AttachmentRegistry {
    by_name: HashMap<Arc<str>, AttachmentId>,
}

impl AttachmentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<V>(&mut self, name: &str) -> Result<Attachment<V>, AttachmentError> {
        if self.by_name.contains_key(name) {
            return Err(AttachmentError::Duplicate(name.to_string()));
        }
        let name: Arc<str> = Arc::from(name);
        let id = AttachmentId::next();
        self.by_name.insert(Arc::clone(&name), id);
        Ok(Attachment {
            id,
            name,
            _value: PhantomData,
        })
    }

    /// Resolves a registered name.
    pub fn lookup(&self, name: &str) -> Option<AttachmentId> {
        self.by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

/// An untyped set of attachments, used to check chunk completeness.
#[derive(Debug, Clone, Default)]
pub struct AttachmentSet {
    members: HashSet<AttachmentId>,
}

impl AttachmentSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<V>(mut self, attachment: &Attachment<V>) -> Self {
        self.insert(attachment);
        self
    }

    pub fn insert<V>(&mut self, attachment: &Attachment<V>) -> bool {
        self.members.insert(attachment.id())
    }

    pub fn contains(&self, id: AttachmentId) -> bool {
        self.members.contains(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = AttachmentId> + '_ {
        self.members.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
