//! Media elements, pads and caps.
//!
//! These carry identity, typed properties, children and signals only. No
//! data flows through them.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{CoreError, Result};
use crate::registry::{LiveToken, ObjectRegistry, TrackedKind};
use crate::signal::{Observable, SignalEmitter};
use crate::types::{ObjectId, PadDirection, Value};

/// Emitted on containers after a child is added. Args: `[Object(child)]`.
pub const ELEMENT_ADDED: &str = "element-added";
/// Emitted on containers after a child is removed. Args: `[Object(child)]`.
pub const ELEMENT_REMOVED: &str = "element-removed";

/// Returns the notify signal name for a property.
#[must_use]
pub fn notify_signal(property: &str) -> String {
    format!("notify::{property}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Source,
    Sink,
    Filter,
    Container,
}

#[derive(Debug, Clone, Copy)]
enum PropDefault {
    UInt(u64),
    Int(i64),
    Bool(bool),
}

impl PropDefault {
    fn value(self) -> Value {
        match self {
            Self::UInt(v) => Value::UInt(v),
            Self::Int(v) => Value::Int(v),
            Self::Bool(v) => Value::Bool(v),
        }
    }
}

struct ElementFactorySpec {
    name: &'static str,
    role: Role,
    properties: &'static [(&'static str, PropDefault)],
}

const ELEMENT_FACTORIES: &[ElementFactorySpec] = &[
    ElementFactorySpec {
        name: "fakesrc",
        role: Role::Source,
        properties: &[
            ("num-buffers", PropDefault::Int(-1)),
            ("is-live", PropDefault::Bool(false)),
        ],
    },
    ElementFactorySpec {
        name: "fakesink",
        role: Role::Sink,
        properties: &[("sync", PropDefault::Bool(false))],
    },
    ElementFactorySpec {
        name: "videotestsrc",
        role: Role::Source,
        properties: &[
            ("pattern", PropDefault::UInt(0)),
            ("is-live", PropDefault::Bool(false)),
        ],
    },
    ElementFactorySpec {
        name: "audiotestsrc",
        role: Role::Source,
        properties: &[
            ("freq", PropDefault::UInt(440)),
            ("is-live", PropDefault::Bool(false)),
        ],
    },
    ElementFactorySpec {
        name: "identity",
        role: Role::Filter,
        properties: &[("silent", PropDefault::Bool(true))],
    },
    ElementFactorySpec {
        name: "gnlsource",
        role: Role::Container,
        properties: &[
            ("start", PropDefault::UInt(0)),
            ("duration", PropDefault::UInt(0)),
            ("media-start", PropDefault::UInt(0)),
            ("media-duration", PropDefault::UInt(0)),
            ("priority", PropDefault::UInt(0)),
        ],
    },
    ElementFactorySpec {
        name: "bin",
        role: Role::Container,
        properties: &[],
    },
];

fn lookup(factory: &str) -> Result<&'static ElementFactorySpec> {
    ELEMENT_FACTORIES
        .iter()
        .find(|spec| spec.name == factory)
        .ok_or_else(|| CoreError::UnknownElementFactory(factory.to_string()))
}

/// Returns true if an element factory with this name exists.
#[must_use]
pub fn element_factory_exists(factory: &str) -> bool {
    lookup(factory).is_ok()
}

struct ElementInner {
    token: LiveToken,
    factory: &'static str,
    name: String,
    role: Role,
    properties: Mutex<BTreeMap<&'static str, Value>>,
    pads: Vec<Pad>,
    children: Mutex<Vec<Element>>,
    emitter: SignalEmitter,
}

impl Drop for ElementInner {
    fn drop(&mut self) {
        let children = std::mem::take(self.children.get_mut());
        if !children.is_empty() {
            self.token.registry().defer_release(children);
        }
    }
}

/// Handle to a media element. Clones share the same instance.
#[derive(Clone)]
pub struct Element {
    inner: Arc<ElementInner>,
}

impl Element {
    /// Creates an element from a named factory in the calling thread's
    /// registry.
    ///
    /// # Errors
    /// Returns [`CoreError::UnknownElementFactory`] for unknown names.
    pub fn make(factory: &str) -> Result<Self> {
        Self::make_in(&ObjectRegistry::current(), factory)
    }

    /// Creates an element from a named factory in `registry`.
    ///
    /// # Errors
    /// Returns [`CoreError::UnknownElementFactory`] for unknown names.
    pub fn make_in(registry: &ObjectRegistry, factory: &str) -> Result<Self> {
        let spec = lookup(factory)?;
        let token = registry.register(TrackedKind::Element, spec.name);
        let id = token.id();
        let name = format!("{}{}", spec.name, id.as_u64());

        let mut signals: Vec<String> = spec
            .properties
            .iter()
            .map(|(prop, _)| notify_signal(prop))
            .collect();
        if spec.role == Role::Container {
            signals.push(ELEMENT_ADDED.to_string());
            signals.push(ELEMENT_REMOVED.to_string());
        }
        let emitter = SignalEmitter::new(id, format!("Element({}){id}", spec.name), signals);

        let pads = match spec.role {
            Role::Source => vec![Pad::new_in(registry, "src", PadDirection::Src)],
            Role::Sink => vec![Pad::new_in(registry, "sink", PadDirection::Sink)],
            Role::Filter => vec![
                Pad::new_in(registry, "sink", PadDirection::Sink),
                Pad::new_in(registry, "src", PadDirection::Src),
            ],
            Role::Container => Vec::new(),
        };

        let properties = spec
            .properties
            .iter()
            .map(|(prop, default)| (*prop, default.value()))
            .collect();

        tracing::debug!(id = %id, factory = spec.name, "element created");
        Ok(Self {
            inner: Arc::new(ElementInner {
                token,
                factory: spec.name,
                name,
                role: spec.role,
                properties: Mutex::new(properties),
                pads,
                children: Mutex::new(Vec::new()),
                emitter,
            }),
        })
    }

    /// Returns the element's identity.
    #[must_use]
    pub fn id(&self) -> ObjectId {
        self.inner.token.id()
    }

    /// Returns the element factory name.
    #[must_use]
    pub fn factory_name(&self) -> &'static str {
        self.inner.factory
    }

    /// Returns the element's instance name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Returns true if the element can hold children.
    #[must_use]
    pub fn is_container(&self) -> bool {
        self.inner.role == Role::Container
    }

    /// Returns a property value.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<Value> {
        self.inner.properties.lock().get(name).cloned()
    }

    /// Returns a `UInt` property value.
    #[must_use]
    pub fn property_u64(&self, name: &str) -> Option<u64> {
        self.property(name).and_then(|v| v.as_u64())
    }

    /// Sets a property and emits `notify::<name>` with the new value.
    ///
    /// # Errors
    /// Returns an error if the property does not exist or the value has the
    /// wrong type.
    pub fn set_property(&self, name: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        {
            let mut properties = self.inner.properties.lock();
            let slot = properties
                .get_mut(name)
                .ok_or_else(|| CoreError::UnknownProperty {
                    element: self.inner.factory.to_string(),
                    property: name.to_string(),
                })?;
            if !slot.same_type(&value) {
                return Err(CoreError::PropertyType {
                    property: name.to_string(),
                    expected: slot.type_name(),
                    actual: value.type_name(),
                });
            }
            *slot = value.clone();
        }
        self.inner.emitter.emit(&notify_signal(name), vec![value])?;
        Ok(())
    }

    /// Returns the element's pads.
    #[must_use]
    pub fn pads(&self) -> &[Pad] {
        &self.inner.pads
    }

    /// Returns the pad with the given name.
    #[must_use]
    pub fn pad(&self, name: &str) -> Option<&Pad> {
        self.inner.pads.iter().find(|pad| pad.name() == name)
    }

    /// Adds a child element and emits `element-added`.
    ///
    /// # Errors
    /// Returns an error if this element is not a container, or the child is
    /// already present.
    pub fn add(&self, child: &Self) -> Result<()> {
        if !self.is_container() {
            return Err(CoreError::NotAContainer(self.inner.name.clone()));
        }
        {
            let mut children = self.inner.children.lock();
            if children.iter().any(|c| c.id() == child.id()) {
                return Err(CoreError::state(format!(
                    "{} already contains {}",
                    self.inner.name,
                    child.name()
                )));
            }
            children.push(child.clone());
        }
        self.inner
            .emitter
            .emit(ELEMENT_ADDED, vec![Value::Object(child.id())])?;
        Ok(())
    }

    /// Removes a child element and emits `element-removed`.
    ///
    /// Returns false if the child was not present.
    ///
    /// # Errors
    /// Returns an error if this element is not a container.
    pub fn remove(&self, child: &Self) -> Result<bool> {
        if !self.is_container() {
            return Err(CoreError::NotAContainer(self.inner.name.clone()));
        }
        let removed = {
            let mut children = self.inner.children.lock();
            let before = children.len();
            children.retain(|c| c.id() != child.id());
            children.len() != before
        };
        if removed {
            self.inner
                .emitter
                .emit(ELEMENT_REMOVED, vec![Value::Object(child.id())])?;
        }
        Ok(removed)
    }

    /// Returns the current children.
    #[must_use]
    pub fn children(&self) -> Vec<Self> {
        self.inner.children.lock().clone()
    }

    /// Returns the registry the element lives in.
    #[must_use]
    pub fn registry(&self) -> &ObjectRegistry {
        self.inner.token.registry()
    }
}

impl Observable for Element {
    fn emitter(&self) -> &SignalEmitter {
        &self.inner.emitter
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Element {}

impl std::fmt::Debug for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Element")
            .field("id", &self.id())
            .field("factory", &self.inner.factory)
            .field("name", &self.inner.name)
            .finish_non_exhaustive()
    }
}

struct PadInner {
    token: LiveToken,
    name: String,
    direction: PadDirection,
    caps: Mutex<Option<Caps>>,
}

/// Element pad. Clones share the same instance.
#[derive(Clone)]
pub struct Pad {
    inner: Arc<PadInner>,
}

impl Pad {
    /// Creates a pad in the calling thread's registry.
    #[must_use]
    pub fn new(name: impl Into<String>, direction: PadDirection) -> Self {
        Self::new_in(&ObjectRegistry::current(), name, direction)
    }

    /// Creates a pad in `registry`.
    #[must_use]
    pub fn new_in(
        registry: &ObjectRegistry,
        name: impl Into<String>,
        direction: PadDirection,
    ) -> Self {
        let name = name.into();
        Self {
            inner: Arc::new(PadInner {
                token: registry.register(TrackedKind::Pad, name.clone()),
                name,
                direction,
                caps: Mutex::new(None),
            }),
        }
    }

    /// Returns the pad's identity.
    #[must_use]
    pub fn id(&self) -> ObjectId {
        self.inner.token.id()
    }

    /// Returns the pad name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Returns the pad direction.
    #[must_use]
    pub fn direction(&self) -> PadDirection {
        self.inner.direction
    }

    /// Returns the negotiated caps, if any.
    #[must_use]
    pub fn caps(&self) -> Option<Caps> {
        self.inner.caps.lock().clone()
    }

    /// Replaces the pad's caps.
    pub fn set_caps(&self, caps: Option<Caps>) {
        *self.inner.caps.lock() = caps;
    }
}

impl std::fmt::Debug for Pad {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pad")
            .field("id", &self.id())
            .field("name", &self.inner.name)
            .field("direction", &self.inner.direction)
            .finish()
    }
}

struct CapsInner {
    token: LiveToken,
    media: String,
}

/// Stream capabilities. Clones share the same instance.
#[derive(Clone)]
pub struct Caps {
    inner: Arc<CapsInner>,
}

impl Caps {
    /// Creates caps for a media description in the calling thread's registry.
    #[must_use]
    pub fn new(media: impl Into<String>) -> Self {
        Self::new_in(&ObjectRegistry::current(), media)
    }

    /// Creates caps in `registry`.
    #[must_use]
    pub fn new_in(registry: &ObjectRegistry, media: impl Into<String>) -> Self {
        let media = media.into();
        Self {
            inner: Arc::new(CapsInner {
                token: registry.register(TrackedKind::Caps, media.clone()),
                media,
            }),
        }
    }

    /// Creates caps that accept anything.
    #[must_use]
    pub fn any() -> Self {
        Self::new("ANY")
    }

    /// Returns the caps' identity.
    #[must_use]
    pub fn id(&self) -> ObjectId {
        self.inner.token.id()
    }

    /// Returns the media description.
    #[must_use]
    pub fn media(&self) -> &str {
        &self.inner.media
    }

    /// Returns true if these caps accept anything.
    #[must_use]
    pub fn is_any(&self) -> bool {
        self.inner.media == "ANY"
    }
}

impl std::fmt::Debug for Caps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Caps")
            .field("id", &self.id())
            .field("media", &self.inner.media)
            .finish()
    }
}
