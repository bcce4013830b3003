//! Live-instance registry and deferred release pool.
//!
//! Tracked objects hold a [`LiveToken`] for their whole lifetime. Creating
//! the token inserts an entry into an [`ObjectRegistry`]; dropping it removes
//! the entry again, so the registry always answers "which instances of kind
//! K are alive right now" without scanning the heap.
//!
//! Objects that release their children lazily hand them to the registry's
//! release pool. [`ObjectRegistry::collect_one_pass`] drains the pool once and
//! reports how many values it dropped; destructors that run during a pass may
//! defer further values, which the next pass picks up.
//!
//! The default registry is per thread. The test runner gives each test its
//! own thread, so tests never observe each other's objects.

use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::types::ObjectId;

/// Kind of a registered object.
///
/// Kinds form a small is-a hierarchy so that tracking a base kind also
/// covers its descendants:
///
/// ```text
/// Object ─┬─ Element ── Pipeline
///         ├─ Pad
///         └─ ObjectFactory
/// MiniObject ── Caps
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackedKind {
    /// Generic refcounted runtime object.
    Object,
    /// Lightweight value-like runtime object.
    MiniObject,
    /// Media element.
    Element,
    /// Element pad.
    Pad,
    /// Stream capabilities.
    Caps,
    /// Source or sink factory.
    ObjectFactory,
    /// Top-level pipeline.
    Pipeline,
}

impl TrackedKind {
    /// Every kind, base kinds first.
    pub const ALL: [Self; 7] = [
        Self::Object,
        Self::MiniObject,
        Self::Element,
        Self::Pad,
        Self::Caps,
        Self::ObjectFactory,
        Self::Pipeline,
    ];

    /// Returns the direct parent kind.
    #[must_use]
    pub const fn parent(self) -> Option<Self> {
        match self {
            Self::Object | Self::MiniObject => None,
            Self::Element | Self::Pad | Self::ObjectFactory => Some(Self::Object),
            Self::Pipeline => Some(Self::Element),
            Self::Caps => Some(Self::MiniObject),
        }
    }

    /// Returns true if `self` is `other` or descends from it.
    #[must_use]
    pub fn is_a(self, other: Self) -> bool {
        let mut kind = Some(self);
        while let Some(current) = kind {
            if current == other {
                return true;
            }
            kind = current.parent();
        }
        false
    }

    /// The kinds whose leakage matters in editor tests.
    #[must_use]
    pub fn default_tracked() -> Vec<Self> {
        vec![
            Self::MiniObject,
            Self::Element,
            Self::Pad,
            Self::Caps,
            Self::ObjectFactory,
            Self::Pipeline,
        ]
    }

    /// Returns the kind name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Object => "Object",
            Self::MiniObject => "MiniObject",
            Self::Element => "Element",
            Self::Pad => "Pad",
            Self::Caps => "Caps",
            Self::ObjectFactory => "ObjectFactory",
            Self::Pipeline => "Pipeline",
        }
    }
}

impl std::fmt::Display for TrackedKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered live object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveEntry {
    /// Object identity.
    pub id: ObjectId,
    /// Concrete kind.
    pub kind: TrackedKind,
    /// Human-readable label (element factory name, pad name, ...).
    pub label: String,
}

impl std::fmt::Display for LiveEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({}){}", self.kind, self.label, self.id)
    }
}

type Deferred = Box<dyn Any + Send>;

#[derive(Default)]
struct RegistryInner {
    live: Mutex<BTreeMap<ObjectId, LiveEntry>>,
    pool: Mutex<Vec<Deferred>>,
}

/// Registry of live tracked objects.
///
/// Cheap to clone; clones share the same state.
#[derive(Clone, Default)]
pub struct ObjectRegistry {
    inner: Arc<RegistryInner>,
}

thread_local! {
    static CURRENT: ObjectRegistry = ObjectRegistry::new();
}

impl ObjectRegistry {
    /// Creates an isolated registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the calling thread's registry.
    #[must_use]
    pub fn current() -> Self {
        CURRENT.with(Clone::clone)
    }

    /// Registers a new live object and returns the token that keeps it
    /// registered.
    #[must_use]
    pub fn register(&self, kind: TrackedKind, label: impl Into<String>) -> LiveToken {
        let entry = LiveEntry {
            id: ObjectId::next(),
            kind,
            label: label.into(),
        };
        let id = entry.id;
        tracing::trace!(id = %id, kind = %kind, label = %entry.label, "registered");
        self.inner.live.lock().insert(id, entry);
        LiveToken {
            id,
            kind,
            registry: self.clone(),
        }
    }

    fn deregister(&self, id: ObjectId) {
        if self.inner.live.lock().remove(&id).is_some() {
            tracing::trace!(id = %id, "deregistered");
        }
    }

    /// Returns the live entries whose kind is-a `kind`, ordered by identity.
    #[must_use]
    pub fn live_objects(&self, kind: TrackedKind) -> Vec<LiveEntry> {
        self.inner
            .live
            .lock()
            .values()
            .filter(|entry| entry.kind.is_a(kind))
            .cloned()
            .collect()
    }

    /// Returns the identities of live objects whose kind is-a `kind`.
    #[must_use]
    pub fn live_ids(&self, kind: TrackedKind) -> BTreeSet<ObjectId> {
        self.inner
            .live
            .lock()
            .values()
            .filter(|entry| entry.kind.is_a(kind))
            .map(|entry| entry.id)
            .collect()
    }

    /// Returns the number of live objects whose kind is-a `kind`.
    #[must_use]
    pub fn live_count(&self, kind: TrackedKind) -> usize {
        self.inner
            .live
            .lock()
            .values()
            .filter(|entry| entry.kind.is_a(kind))
            .count()
    }

    /// Looks up a live object by identity.
    #[must_use]
    pub fn entry(&self, id: ObjectId) -> Option<LiveEntry> {
        self.inner.live.lock().get(&id).cloned()
    }

    /// Returns true if the object is still registered.
    #[must_use]
    pub fn is_live(&self, id: ObjectId) -> bool {
        self.inner.live.lock().contains_key(&id)
    }

    /// Returns the total number of live objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.live.lock().len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.live.lock().is_empty()
    }

    /// Moves a value into the release pool; it is dropped by the next
    /// collection pass.
    pub fn defer_release<T: Send + 'static>(&self, value: T) {
        self.inner.pool.lock().push(Box::new(value));
    }

    /// Returns the number of values waiting in the release pool.
    #[must_use]
    pub fn pending_releases(&self) -> usize {
        self.inner.pool.lock().len()
    }

    /// Drops everything currently in the release pool and returns how many
    /// values were reclaimed.
    ///
    /// The pool lock is released before any destructor runs, so destructors
    /// may defer more values; those wait for the next pass.
    pub fn collect_one_pass(&self) -> usize {
        let batch = std::mem::take(&mut *self.inner.pool.lock());
        let reclaimed = batch.len();
        drop(batch);
        if reclaimed > 0 {
            tracing::debug!(reclaimed, "collection pass");
        }
        reclaimed
    }

    /// Returns true if both handles point at the same registry.
    #[must_use]
    pub fn same_registry(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for ObjectRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectRegistry")
            .field("live", &self.len())
            .field("pending_releases", &self.pending_releases())
            .finish()
    }
}

/// Registration guard held by a tracked object.
///
/// Dropping the token deregisters the object from the registry it was
/// created in, regardless of which thread performs the drop.
#[derive(Debug)]
pub struct LiveToken {
    id: ObjectId,
    kind: TrackedKind,
    registry: ObjectRegistry,
}

impl LiveToken {
    /// Registers an object in the calling thread's registry.
    #[must_use]
    pub fn new(kind: TrackedKind, label: impl Into<String>) -> Self {
        ObjectRegistry::current().register(kind, label)
    }

    /// Returns the object's identity.
    #[must_use]
    pub const fn id(&self) -> ObjectId {
        self.id
    }

    /// Returns the object's concrete kind.
    #[must_use]
    pub const fn kind(&self) -> TrackedKind {
        self.kind
    }

    /// Returns the registry the object lives in.
    #[must_use]
    pub const fn registry(&self) -> &ObjectRegistry {
        &self.registry
    }
}

impl Drop for LiveToken {
    fn drop(&mut self) {
        self.registry.deregister(self.id);
    }
}
