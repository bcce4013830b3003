//! Timeline objects.
//!
//! A timeline object places a factory's media on the timeline. The element
//! that realises it (the "gnl object") and its linked sibling of the other
//! media type (its "brother") are produced by an injected
//! [`TimelineBackend`], so tests can substitute fake element graphs without
//! touching the rest of the object's behavior.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::element::Element;
use crate::error::{CoreError, Result};
use crate::factory::ObjectFactory;
use crate::types::{MediaType, ObjectId};

/// Marker for an unset timeline position.
pub const UNSET: i64 = -1;

/// Position and media parameters of a timeline object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineParams {
    /// Object name.
    pub name: String,
    /// Timeline start in nanoseconds, or [`UNSET`].
    pub start: i64,
    /// Timeline duration in nanoseconds, or [`UNSET`].
    pub duration: i64,
    /// Offset into the media in nanoseconds, or [`UNSET`].
    pub media_start: i64,
    /// Media duration in nanoseconds, or [`UNSET`].
    pub media_duration: i64,
    /// Media type carried by the object.
    pub media_type: MediaType,
}

impl TimelineParams {
    /// Creates parameters with every position unset.
    #[must_use]
    pub fn new(name: impl Into<String>, media_type: MediaType) -> Self {
        Self {
            name: name.into(),
            start: UNSET,
            duration: UNSET,
            media_start: UNSET,
            media_duration: UNSET,
            media_type,
        }
    }

    /// Sets the timeline start.
    #[must_use]
    pub fn with_start(mut self, start: i64) -> Self {
        self.start = start;
        self
    }

    /// Sets the timeline duration.
    #[must_use]
    pub fn with_duration(mut self, duration: i64) -> Self {
        self.duration = duration;
        self
    }

    /// Sets the media start.
    #[must_use]
    pub fn with_media_start(mut self, media_start: i64) -> Self {
        self.media_start = media_start;
        self
    }

    /// Sets the media duration.
    #[must_use]
    pub fn with_media_duration(mut self, media_duration: i64) -> Self {
        self.media_duration = media_duration;
        self
    }
}

/// Converts a timeline position into an element clock value.
///
/// [`UNSET`] maps to 0, the default of every gnl position property.
///
/// # Errors
/// Returns [`CoreError::PropertyType`] for any other negative position.
pub fn position_nanos(property: &str, position: i64) -> Result<u64> {
    if position == UNSET {
        return Ok(0);
    }
    u64::try_from(position).map_err(|_| CoreError::PropertyType {
        property: property.to_string(),
        expected: "uint",
        actual: "int",
    })
}

/// Parameters shared between a timeline object and the handlers its backend
/// installs on the gnl object.
pub type SharedParams = Arc<Mutex<TimelineParams>>;

/// Strategy that realises a timeline object.
pub trait TimelineBackend: Send + Sync {
    /// Serialisation tag of the objects this backend builds.
    fn data_type(&self) -> &'static str;

    /// Builds the element that realises the object.
    ///
    /// The backend may fill unset parameters and keep `params` in sync with
    /// the element through signal handlers.
    ///
    /// # Errors
    /// Returns an error if the element cannot be built.
    fn make_gnl_object(&self, params: &SharedParams, factory: &ObjectFactory) -> Result<Element>;

    /// Returns the parameters of the linked sibling, or `None` if the object
    /// has none.
    fn make_brother(
        &self,
        params: &TimelineParams,
        factory: &ObjectFactory,
    ) -> Option<TimelineParams> {
        let _ = (params, factory);
        None
    }
}

/// An object placed on the timeline.
pub struct TimelineObject {
    id: ObjectId,
    factory: Arc<ObjectFactory>,
    params: SharedParams,
    backend: Arc<dyn TimelineBackend>,
    gnl_object: Mutex<Option<Element>>,
    brother: Mutex<Option<ObjectId>>,
}

impl TimelineObject {
    /// Creates a timeline object.
    #[must_use]
    pub fn new(
        factory: Arc<ObjectFactory>,
        params: TimelineParams,
        backend: Arc<dyn TimelineBackend>,
    ) -> Self {
        Self {
            id: ObjectId::next(),
            factory,
            params: Arc::new(Mutex::new(params)),
            backend,
            gnl_object: Mutex::new(None),
            brother: Mutex::new(None),
        }
    }

    /// Returns the object's identity.
    #[must_use]
    pub const fn id(&self) -> ObjectId {
        self.id
    }

    /// Returns the backend's data type tag.
    #[must_use]
    pub fn data_type(&self) -> &'static str {
        self.backend.data_type()
    }

    /// Returns the factory.
    #[must_use]
    pub fn factory(&self) -> &Arc<ObjectFactory> {
        &self.factory
    }

    /// Returns a snapshot of the parameters.
    #[must_use]
    pub fn params(&self) -> TimelineParams {
        self.params.lock().clone()
    }

    /// Returns the object name.
    #[must_use]
    pub fn name(&self) -> String {
        self.params.lock().name.clone()
    }

    /// Returns the media type.
    #[must_use]
    pub fn media_type(&self) -> MediaType {
        self.params.lock().media_type
    }

    /// Returns the gnl object, building it on first use.
    ///
    /// # Errors
    /// Returns the backend's error if building fails.
    pub fn gnl_object(&self) -> Result<Element> {
        let mut slot = self.gnl_object.lock();
        if let Some(element) = slot.as_ref() {
            return Ok(element.clone());
        }
        let element = self.backend.make_gnl_object(&self.params, &self.factory)?;
        tracing::debug!(
            object = %self.id,
            data_type = self.backend.data_type(),
            gnl = %element.id(),
            "gnl object built"
        );
        *slot = Some(element.clone());
        Ok(element)
    }

    /// Returns true if the gnl object has been built.
    #[must_use]
    pub fn has_gnl_object(&self) -> bool {
        self.gnl_object.lock().is_some()
    }

    /// Drops the cached gnl object.
    pub fn release_gnl_object(&self) -> Option<Element> {
        self.gnl_object.lock().take()
    }

    /// Moves the object on the timeline, propagating to the gnl object when
    /// it has been built. [`UNSET`] resets the gnl `start` to 0.
    ///
    /// # Errors
    /// Returns an error for negative positions other than [`UNSET`], leaving
    /// the object unchanged, or if the gnl object rejects the value.
    pub fn set_start(&self, start: i64) -> Result<()> {
        let nanos = position_nanos("start", start)?;
        self.params.lock().start = start;
        self.propagate("start", nanos)
    }

    /// Changes the timeline duration, propagating to the gnl object when it
    /// has been built. [`UNSET`] resets the gnl `duration` to 0.
    ///
    /// # Errors
    /// Returns an error for negative durations other than [`UNSET`], leaving
    /// the object unchanged, or if the gnl object rejects the value.
    pub fn set_duration(&self, duration: i64) -> Result<()> {
        let nanos = position_nanos("duration", duration)?;
        self.params.lock().duration = duration;
        self.propagate("duration", nanos)
    }

    fn propagate(&self, property: &str, nanos: u64) -> Result<()> {
        let element = self.gnl_object.lock().clone();
        if let Some(element) = element {
            if element.property(property).is_some() {
                element.set_property(property, nanos)?;
            }
        }
        Ok(())
    }

    /// Builds the linked sibling carrying the other media type, if the
    /// backend provides one. Both objects record each other's identity.
    #[must_use]
    pub fn make_brother(&self) -> Option<Self> {
        let params = self.params();
        let brother_params = self.backend.make_brother(&params, &self.factory)?;
        let brother = Self::new(
            Arc::clone(&self.factory),
            brother_params,
            Arc::clone(&self.backend),
        );
        *self.brother.lock() = Some(brother.id);
        *brother.brother.lock() = Some(self.id);
        tracing::debug!(object = %self.id, brother = %brother.id, "brother linked");
        Some(brother)
    }

    /// Returns the identity of the linked sibling.
    #[must_use]
    pub fn brother_id(&self) -> Option<ObjectId> {
        *self.brother.lock()
    }
}

impl std::fmt::Debug for TimelineObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimelineObject")
            .field("id", &self.id)
            .field("data_type", &self.data_type())
            .field("params", &self.params())
            .finish_non_exhaustive()
    }
}
