//! Test error types.

use montage_core::CoreError;

use crate::harness::LeakReport;

/// Result type alias for test operations.
pub type Result<T> = std::result::Result<T, TestError>;

/// Testing errors.
#[derive(Debug, thiserror::Error)]
pub enum TestError {
    /// Harness error.
    #[error("harness error: {0}")]
    Harness(String),

    /// Harness used out of order (track twice, verify without track, ...).
    #[error("invalid harness state: {0}")]
    State(String),

    /// Tracked objects survived the test.
    #[error("leak detected: {0}")]
    Leaked(LeakReport),

    /// Assertion failed.
    #[error("assertion failed: {0}")]
    Assertion(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Object model error.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TestError {
    /// Creates a harness error.
    #[must_use]
    pub fn harness(msg: impl Into<String>) -> Self {
        Self::Harness(msg.into())
    }

    /// Creates a state error.
    #[must_use]
    pub fn state(msg: impl Into<String>) -> Self {
        Self::State(msg.into())
    }

    /// Creates an assertion error.
    #[must_use]
    pub fn assertion(msg: impl Into<String>) -> Self {
        Self::Assertion(msg.into())
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Returns the leak report if this error is a detected leak.
    #[must_use]
    pub const fn leak_report(&self) -> Option<&LeakReport> {
        match self {
            Self::Leaked(report) => Some(report),
            _ => None,
        }
    }
}
