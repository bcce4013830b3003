//! Core value types: object identity, signal arguments, media kinds.
//!
//! Identity is a process-wide monotonic counter, never reused, so two
//! objects compare equal only when they are the same instance.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a live object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId(u64);

impl ObjectId {
    /// Allocates a fresh identity.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw identity value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Signal argument and property value.
///
/// A closed tagged union; handlers match on the variant instead of relying
/// on argument positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    /// Signed integer (timeline positions use `-1` for unset).
    Int(i64),
    /// Unsigned integer (element clock times).
    UInt(u64),
    /// Boolean flag.
    Bool(bool),
    /// String.
    Str(String),
    /// Reference to another object by identity.
    Object(ObjectId),
}

impl Value {
    /// Returns the variant name, used in type errors.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::UInt(_) => "uint",
            Self::Bool(_) => "bool",
            Self::Str(_) => "string",
            Self::Object(_) => "object",
        }
    }

    /// Returns true if both values carry the same variant.
    #[must_use]
    pub fn same_type(&self, other: &Self) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    /// Returns the value as `u64` if it is a `UInt`.
    #[must_use]
    pub const fn as_u64(&self) -> Option<u64> {
        match self {
            Self::UInt(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as `i64` if it is an `Int`.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the referenced object, if any.
    #[must_use]
    pub const fn as_object(&self) -> Option<ObjectId> {
        match self {
            Self::Object(id) => Some(*id),
            _ => None,
        }
    }

    /// Returns the string slice, if any.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Self::UInt(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<ObjectId> for Value {
    fn from(v: ObjectId) -> Self {
        Self::Object(v)
    }
}

/// Kind of media a stream or timeline object carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaType {
    /// No media.
    None,
    /// Audio stream.
    Audio,
    /// Video stream.
    Video,
}

impl MediaType {
    /// Returns the complementary media type (audio ↔ video).
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Audio => Self::Video,
            Self::Video => Self::Audio,
            Self::None => Self::None,
        }
    }
}

/// Pad data-flow direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PadDirection {
    /// Produces data.
    Src,
    /// Consumes data.
    Sink,
}

/// Pipeline state.
///
/// ```text
/// Null ↔ Ready ↔ Paused ↔ Playing
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PipelineState {
    /// No resources allocated.
    Null,
    /// Resources allocated, not prerolled.
    Ready,
    /// Prerolled, clock stopped.
    Paused,
    /// Clock running.
    Playing,
}

impl PipelineState {
    /// Returns the lowercase state name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Ready => "ready",
            Self::Paused => "paused",
            Self::Playing => "playing",
        }
    }
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
