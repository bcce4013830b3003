//! Source and sink object factories.
//!
//! A factory does not know how to build its media element itself; it
//! delegates to an injected [`BinMaker`]. Production code supplies makers
//! backed by real element graphs, tests supply fakes.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::element::Element;
use crate::error::{CoreError, Result};
use crate::registry::{LiveToken, ObjectRegistry, TrackedKind};
use crate::types::{MediaType, ObjectId};

/// Strategy that constructs the media element behind a factory.
pub trait BinMaker: Send + Sync {
    /// Builds an element for the requested output stream (`None` means the
    /// factory's default output).
    ///
    /// # Errors
    /// Returns an error if the element cannot be built.
    fn make_bin(&self, registry: &ObjectRegistry, stream: Option<MediaType>) -> Result<Element>;
}

impl<F> BinMaker for F
where
    F: Fn(&ObjectRegistry, Option<MediaType>) -> Result<Element> + Send + Sync,
{
    fn make_bin(&self, registry: &ObjectRegistry, stream: Option<MediaType>) -> Result<Element> {
        self(registry, stream)
    }
}

/// Direction of a factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactoryRole {
    /// Produces media.
    Source,
    /// Consumes media.
    Sink,
}

/// Object factory: a named producer or consumer of media elements.
pub struct ObjectFactory {
    token: LiveToken,
    name: String,
    role: FactoryRole,
    length: u64,
    is_audio: bool,
    is_video: bool,
    maker: Arc<dyn BinMaker>,
    bins_made: AtomicUsize,
}

impl ObjectFactory {
    /// Creates a source factory in the calling thread's registry.
    #[must_use]
    pub fn source(name: impl Into<String>, maker: Arc<dyn BinMaker>) -> Self {
        Self::new_in(&ObjectRegistry::current(), name, FactoryRole::Source, maker)
    }

    /// Creates a sink factory in the calling thread's registry.
    #[must_use]
    pub fn sink(name: impl Into<String>, maker: Arc<dyn BinMaker>) -> Self {
        Self::new_in(&ObjectRegistry::current(), name, FactoryRole::Sink, maker)
    }

    /// Creates a factory in `registry`.
    #[must_use]
    pub fn new_in(
        registry: &ObjectRegistry,
        name: impl Into<String>,
        role: FactoryRole,
        maker: Arc<dyn BinMaker>,
    ) -> Self {
        let name = name.into();
        Self {
            token: registry.register(TrackedKind::ObjectFactory, name.clone()),
            name,
            role,
            length: 0,
            is_audio: false,
            is_video: false,
            maker,
            bins_made: AtomicUsize::new(0),
        }
    }

    /// Sets the media length in nanoseconds.
    #[must_use]
    pub fn with_length(mut self, length: u64) -> Self {
        self.length = length;
        self
    }

    /// Declares whether the factory provides audio.
    #[must_use]
    pub fn with_audio(mut self, is_audio: bool) -> Self {
        self.is_audio = is_audio;
        self
    }

    /// Declares whether the factory provides video.
    #[must_use]
    pub fn with_video(mut self, is_video: bool) -> Self {
        self.is_video = is_video;
        self
    }

    /// Returns the factory's identity.
    #[must_use]
    pub fn id(&self) -> ObjectId {
        self.token.id()
    }

    /// Returns the factory name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the registry the factory and its bins live in.
    #[must_use]
    pub fn registry(&self) -> &ObjectRegistry {
        self.token.registry()
    }

    /// Returns the factory role.
    #[must_use]
    pub const fn role(&self) -> FactoryRole {
        self.role
    }

    /// Returns the media length in nanoseconds.
    #[must_use]
    pub const fn length(&self) -> u64 {
        self.length
    }

    /// Returns true if the factory provides audio.
    #[must_use]
    pub const fn is_audio(&self) -> bool {
        self.is_audio
    }

    /// Returns true if the factory provides video.
    #[must_use]
    pub const fn is_video(&self) -> bool {
        self.is_video
    }

    /// Returns true if the factory provides `media`.
    #[must_use]
    pub const fn provides(&self, media: MediaType) -> bool {
        match media {
            MediaType::Audio => self.is_audio,
            MediaType::Video => self.is_video,
            MediaType::None => false,
        }
    }

    /// Returns the number of bins built so far.
    #[must_use]
    pub fn bins_made(&self) -> usize {
        self.bins_made.load(Ordering::Relaxed)
    }

    /// Builds a bin for the requested stream.
    ///
    /// # Errors
    /// Returns [`CoreError::StreamUnavailable`] if a specific stream is
    /// requested that the factory does not provide, or the maker's error.
    pub fn make_bin(&self, stream: Option<MediaType>) -> Result<Element> {
        if let Some(media) = stream {
            if !self.provides(media) {
                return Err(CoreError::stream_unavailable(format!(
                    "factory '{}' does not provide {media:?}",
                    self.name
                )));
            }
        }
        let bin = self.maker.make_bin(self.token.registry(), stream)?;
        self.bins_made.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(factory = %self.name, bin = %bin.id(), ?stream, "bin made");
        Ok(bin)
    }

    /// Builds an audio bin.
    ///
    /// # Errors
    /// See [`ObjectFactory::make_bin`].
    pub fn make_audio_bin(&self) -> Result<Element> {
        self.make_bin(Some(MediaType::Audio))
    }

    /// Builds a video bin.
    ///
    /// # Errors
    /// See [`ObjectFactory::make_bin`].
    pub fn make_video_bin(&self) -> Result<Element> {
        self.make_bin(Some(MediaType::Video))
    }
}

impl std::fmt::Debug for ObjectFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectFactory")
            .field("id", &self.id())
            .field("name", &self.name)
            .field("role", &self.role)
            .field("length", &self.length)
            .field("is_audio", &self.is_audio)
            .field("is_video", &self.is_video)
            .finish_non_exhaustive()
    }
}
