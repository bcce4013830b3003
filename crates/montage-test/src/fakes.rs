//! Fake factories and timeline backends.
//!
//! Lightweight element graphs for tests that need factories or timeline
//! objects without real media.

use std::sync::Arc;

use montage_core::{
    BinMaker, CoreError, Element, FactoryRole, MediaType, ObjectFactory, ObjectRegistry,
    Observable, SharedParams, TimelineBackend, TimelineObject, TimelineParams, UNSET, Value,
    notify_signal, timeline::position_nanos,
};

/// One second in nanoseconds.
pub const SECOND: u64 = 1_000_000_000;

/// Source maker that builds a single named element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeSourceFactory {
    element: String,
}

impl FakeSourceFactory {
    /// Creates a maker for the given element factory.
    #[must_use]
    pub fn new(element: impl Into<String>) -> Self {
        Self {
            element: element.into(),
        }
    }

    /// Returns the element factory name.
    #[must_use]
    pub fn element(&self) -> &str {
        &self.element
    }

    /// Wraps the maker in a source factory in the calling thread's registry.
    #[must_use]
    pub fn build(self, name: impl Into<String>) -> ObjectFactory {
        self.build_in(&ObjectRegistry::current(), name)
    }

    /// Wraps the maker in a source factory in `registry`.
    #[must_use]
    pub fn build_in(self, registry: &ObjectRegistry, name: impl Into<String>) -> ObjectFactory {
        ObjectFactory::new_in(registry, name, FactoryRole::Source, Arc::new(self))
    }
}

impl Default for FakeSourceFactory {
    fn default() -> Self {
        Self::new("fakesrc")
    }
}

impl BinMaker for FakeSourceFactory {
    fn make_bin(
        &self,
        registry: &ObjectRegistry,
        _stream: Option<MediaType>,
    ) -> montage_core::Result<Element> {
        Element::make_in(registry, &self.element)
    }
}

/// Sink maker that builds a single named element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeSinkFactory {
    element: String,
}

impl FakeSinkFactory {
    /// Creates a maker for the given element factory.
    #[must_use]
    pub fn new(element: impl Into<String>) -> Self {
        Self {
            element: element.into(),
        }
    }

    /// Returns the element factory name.
    #[must_use]
    pub fn element(&self) -> &str {
        &self.element
    }

    /// Wraps the maker in a sink factory in the calling thread's registry.
    #[must_use]
    pub fn build(self, name: impl Into<String>) -> ObjectFactory {
        self.build_in(&ObjectRegistry::current(), name)
    }

    /// Wraps the maker in a sink factory in `registry`.
    #[must_use]
    pub fn build_in(self, registry: &ObjectRegistry, name: impl Into<String>) -> ObjectFactory {
        ObjectFactory::new_in(registry, name, FactoryRole::Sink, Arc::new(self))
    }
}

impl Default for FakeSinkFactory {
    fn default() -> Self {
        Self::new("fakesink")
    }
}

impl BinMaker for FakeSinkFactory {
    fn make_bin(
        &self,
        registry: &ObjectRegistry,
        _stream: Option<MediaType>,
    ) -> montage_core::Result<Element> {
        Element::make_in(registry, &self.element)
    }
}

/// Source maker that builds a `gnlsource` wrapping a `videotestsrc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FakeGnlFactory {
    /// Value of the gnlsource `duration` property, in nanoseconds.
    pub duration: u64,
    /// Value of the gnlsource `media-duration` property, in nanoseconds.
    pub media_duration: u64,
}

impl FakeGnlFactory {
    /// Creates a maker with explicit durations.
    #[must_use]
    pub const fn new(duration: u64, media_duration: u64) -> Self {
        Self {
            duration,
            media_duration,
        }
    }

    /// Wraps the maker in a source factory in the calling thread's registry.
    #[must_use]
    pub fn build(self, name: impl Into<String>) -> ObjectFactory {
        self.build_in(&ObjectRegistry::current(), name)
    }

    /// Wraps the maker in a source factory in `registry`.
    #[must_use]
    pub fn build_in(self, registry: &ObjectRegistry, name: impl Into<String>) -> ObjectFactory {
        ObjectFactory::new_in(registry, name, FactoryRole::Source, Arc::new(self))
    }
}

impl Default for FakeGnlFactory {
    fn default() -> Self {
        Self::new(10 * SECOND, 10 * SECOND)
    }
}

impl BinMaker for FakeGnlFactory {
    fn make_bin(
        &self,
        registry: &ObjectRegistry,
        _stream: Option<MediaType>,
    ) -> montage_core::Result<Element> {
        let gnl = Element::make_in(registry, "gnlsource")?;
        gnl.add(&Element::make_in(registry, "videotestsrc")?)?;
        gnl.set_property("duration", self.duration)?;
        gnl.set_property("media-duration", self.media_duration)?;
        Ok(gnl)
    }
}

/// Timeline backend whose gnl object is the factory's bin for the object's
/// media type, and whose brother carries the other media type.
#[derive(Debug, Clone, Copy, Default)]
pub struct TestTimelineBackend;

impl TestTimelineBackend {
    /// Creates a timeline object backed by this backend.
    #[must_use]
    pub fn object(factory: Arc<ObjectFactory>, params: TimelineParams) -> TimelineObject {
        TimelineObject::new(factory, params, Arc::new(Self))
    }
}

impl TimelineBackend for TestTimelineBackend {
    fn data_type(&self) -> &'static str {
        "test-timeline-object"
    }

    fn make_gnl_object(
        &self,
        params: &SharedParams,
        factory: &ObjectFactory,
    ) -> montage_core::Result<Element> {
        let media_type = params.lock().media_type;
        match media_type {
            MediaType::Audio => factory.make_audio_bin(),
            MediaType::Video => factory.make_video_bin(),
            MediaType::None => Err(CoreError::stream_unavailable(format!(
                "timeline object '{}' has no media type",
                params.lock().name
            ))),
        }
    }

    fn make_brother(
        &self,
        params: &TimelineParams,
        _factory: &ObjectFactory,
    ) -> Option<TimelineParams> {
        if params.media_type == MediaType::None {
            return None;
        }
        Some(TimelineParams {
            name: params.name.clone(),
            start: params.start,
            duration: params.duration,
            media_start: UNSET,
            media_duration: UNSET,
            media_type: params.media_type.other(),
        })
    }
}

/// Timeline backend that uses the factory's default bin and has no brother.
#[derive(Debug, Clone, Copy, Default)]
pub struct TestTimelineSourceBackend;

impl TestTimelineSourceBackend {
    /// Creates a timeline object backed by this backend.
    #[must_use]
    pub fn object(factory: Arc<ObjectFactory>, params: TimelineParams) -> TimelineObject {
        TimelineObject::new(factory, params, Arc::new(Self))
    }
}

impl TimelineBackend for TestTimelineSourceBackend {
    fn data_type(&self) -> &'static str {
        "test-timeline-source"
    }

    fn make_gnl_object(
        &self,
        _params: &SharedParams,
        factory: &ObjectFactory,
    ) -> montage_core::Result<Element> {
        factory.make_bin(None)
    }
}

/// Timeline backend that builds a `gnlsource` wrapping a `fakesrc`.
///
/// Unset media positions are filled in (start 0, duration = factory length)
/// and the gnlsource's `media-start` / `media-duration` changes are written
/// back into the object's parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct TestFileSourceBackend;

impl TestFileSourceBackend {
    /// Creates a timeline object backed by this backend.
    #[must_use]
    pub fn object(factory: Arc<ObjectFactory>, params: TimelineParams) -> TimelineObject {
        TimelineObject::new(factory, params, Arc::new(Self))
    }
}

fn optional_nanos(property: &str, position: i64) -> montage_core::Result<Option<u64>> {
    if position == UNSET {
        Ok(None)
    } else {
        position_nanos(property, position).map(Some)
    }
}

impl TimelineBackend for TestFileSourceBackend {
    fn data_type(&self) -> &'static str {
        "test-timeline-file-source"
    }

    fn make_gnl_object(
        &self,
        params: &SharedParams,
        factory: &ObjectFactory,
    ) -> montage_core::Result<Element> {
        let snapshot = params.lock().clone();
        let start = optional_nanos("start", snapshot.start)?;
        let duration = optional_nanos("duration", snapshot.duration)?;
        let media_start = optional_nanos("media-start", snapshot.media_start)?.unwrap_or(0);
        let media_duration =
            optional_nanos("media-duration", snapshot.media_duration)?.unwrap_or(factory.length());

        let registry = factory.registry();
        let gnl = Element::make_in(registry, "gnlsource")?;
        gnl.add(&Element::make_in(registry, "fakesrc")?)?;

        {
            let mut params = params.lock();
            if params.media_start == UNSET {
                params.media_start = i64::try_from(media_start).unwrap_or(i64::MAX);
            }
            if params.media_duration == UNSET {
                params.media_duration = i64::try_from(media_duration).unwrap_or(i64::MAX);
            }
        }

        if let Some(start) = start {
            gnl.set_property("start", start)?;
        }
        if let Some(duration) = duration {
            gnl.set_property("duration", duration)?;
        }
        gnl.set_property("media-duration", media_duration)?;
        gnl.set_property("media-start", media_start)?;

        for property in ["media-start", "media-duration"] {
            let shared = Arc::clone(params);
            gnl.emitter().connect(&notify_signal(property), move |emission| {
                let Some(value) = emission.args.first().and_then(Value::as_u64) else {
                    return;
                };
                let value = i64::try_from(value).unwrap_or(i64::MAX);
                let mut params = shared.lock();
                if property == "media-start" {
                    params.media_start = value;
                } else {
                    params.media_duration = value;
                }
                tracing::trace!(
                    name = %params.name,
                    property,
                    value,
                    "media position synced"
                );
            })?;
        }
        Ok(gnl)
    }

    fn make_brother(
        &self,
        params: &TimelineParams,
        factory: &ObjectFactory,
    ) -> Option<TimelineParams> {
        let other = match params.media_type {
            MediaType::None => return None,
            media => media.other(),
        };
        if !factory.provides(other) {
            return None;
        }
        Some(TimelineParams {
            name: format!("{}-brother", params.name),
            media_type: other,
            ..params.clone()
        })
    }
}
