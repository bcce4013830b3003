//! Error types for montage-core.
//!
//! All failures are explicit values; nothing in this crate panics.

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Error type for object, signal and factory operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Signal name not declared by the emitting object.
    #[error("unknown signal '{signal}' on {object}")]
    UnknownSignal {
        /// The requested signal name.
        signal: String,
        /// Display form of the object.
        object: String,
    },

    /// No element factory registered under this name.
    #[error("unknown element factory: {0}")]
    UnknownElementFactory(String),

    /// Property not declared by the element's factory.
    #[error("element '{element}' has no property '{property}'")]
    UnknownProperty {
        /// Element factory name.
        element: String,
        /// Requested property.
        property: String,
    },

    /// Property value has the wrong type.
    #[error("property '{property}' expects {expected}, got {actual}")]
    PropertyType {
        /// Property name.
        property: String,
        /// Expected value type.
        expected: &'static str,
        /// Actual value type.
        actual: &'static str,
    },

    /// Factory cannot produce the requested stream.
    #[error("stream unavailable: {0}")]
    StreamUnavailable(String),

    /// Element is not a container.
    #[error("not a container: {0}")]
    NotAContainer(String),

    /// Invalid state for operation.
    #[error("invalid state: {0}")]
    State(String),
}

impl CoreError {
    /// Creates an unknown-signal error.
    #[must_use]
    pub fn unknown_signal(signal: impl Into<String>, object: impl Into<String>) -> Self {
        Self::UnknownSignal {
            signal: signal.into(),
            object: object.into(),
        }
    }

    /// Creates a state error.
    #[must_use]
    pub fn state(msg: impl Into<String>) -> Self {
        Self::State(msg.into())
    }

    /// Creates a stream-unavailable error.
    #[must_use]
    pub fn stream_unavailable(msg: impl Into<String>) -> Self {
        Self::StreamUnavailable(msg.into())
    }
}
