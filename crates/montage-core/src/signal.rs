//! Named signals with explicit emission records.
//!
//! An emitter declares its signal names up front. Handlers are connected per
//! signal name and receive an [`Emission`] that carries the source identity,
//! the signal name and the argument list, so a handler never has to infer the
//! signal from argument positions.
//!
//! Emission is synchronous and run-to-completion: `emit` calls every handler
//! for the signal, in connection order, before returning. The handler list is
//! snapshotted first, so handlers may connect, disconnect or emit re-entrantly.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::error::{CoreError, Result};
use crate::types::{ObjectId, Value};

/// One signal emission as seen by a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emission {
    /// Object that emitted the signal.
    pub source: ObjectId,
    /// Signal name.
    pub signal: String,
    /// Signal-specific arguments.
    pub args: Vec<Value>,
}

/// Identifies a connected handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

type Handler = Arc<dyn Fn(&Emission) + Send + Sync>;

struct Connection {
    id: HandlerId,
    signal: String,
    handler: Handler,
}

struct EmitterInner {
    owner: ObjectId,
    describe: String,
    signals: BTreeSet<String>,
    connections: Mutex<Vec<Connection>>,
    next_handler: AtomicU64,
}

/// Signal dispatcher owned by an object.
#[derive(Clone)]
pub struct SignalEmitter {
    inner: Arc<EmitterInner>,
}

impl SignalEmitter {
    /// Creates an emitter for `owner` declaring the given signal names.
    ///
    /// `describe` is the object's display form, used in error messages.
    #[must_use]
    pub fn new<I, S>(owner: ObjectId, describe: impl Into<String>, signals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inner: Arc::new(EmitterInner {
                owner,
                describe: describe.into(),
                signals: signals.into_iter().map(Into::into).collect(),
                connections: Mutex::new(Vec::new()),
                next_handler: AtomicU64::new(1),
            }),
        }
    }

    /// Returns the owning object's identity.
    #[must_use]
    pub fn owner(&self) -> ObjectId {
        self.inner.owner
    }

    /// Returns true if `signal` is declared.
    #[must_use]
    pub fn has_signal(&self, signal: &str) -> bool {
        self.inner.signals.contains(signal)
    }

    /// Returns the declared signal names in sorted order.
    #[must_use]
    pub fn signal_names(&self) -> Vec<String> {
        self.inner.signals.iter().cloned().collect()
    }

    /// Connects a handler to `signal`.
    ///
    /// # Errors
    /// Returns [`CoreError::UnknownSignal`] if the signal is not declared.
    pub fn connect<F>(&self, signal: &str, handler: F) -> Result<HandlerId>
    where
        F: Fn(&Emission) + Send + Sync + 'static,
    {
        if !self.has_signal(signal) {
            return Err(CoreError::unknown_signal(signal, &self.inner.describe));
        }
        let id = HandlerId(self.inner.next_handler.fetch_add(1, Ordering::Relaxed));
        self.inner.connections.lock().push(Connection {
            id,
            signal: signal.to_string(),
            handler: Arc::new(handler),
        });
        Ok(id)
    }

    /// Disconnects a handler. Returns false if it was not connected.
    pub fn disconnect(&self, id: HandlerId) -> bool {
        let mut connections = self.inner.connections.lock();
        let before = connections.len();
        connections.retain(|c| c.id != id);
        connections.len() != before
    }

    /// Returns the number of handlers connected to `signal`.
    #[must_use]
    pub fn handler_count(&self, signal: &str) -> usize {
        self.inner
            .connections
            .lock()
            .iter()
            .filter(|c| c.signal == signal)
            .count()
    }

    /// Emits `signal` with `args` and returns the number of handlers called.
    ///
    /// # Errors
    /// Returns [`CoreError::UnknownSignal`] if the signal is not declared.
    pub fn emit(&self, signal: &str, args: Vec<Value>) -> Result<usize> {
        if !self.has_signal(signal) {
            return Err(CoreError::unknown_signal(signal, &self.inner.describe));
        }
        let handlers: Vec<Handler> = self
            .inner
            .connections
            .lock()
            .iter()
            .filter(|c| c.signal == signal)
            .map(|c| Arc::clone(&c.handler))
            .collect();

        let emission = Emission {
            source: self.inner.owner,
            signal: signal.to_string(),
            args,
        };
        tracing::trace!(
            source = %emission.source,
            signal,
            handlers = handlers.len(),
            "emit"
        );
        for handler in &handlers {
            handler(&emission);
        }
        Ok(handlers.len())
    }

    /// Returns a non-owning handle to this emitter.
    #[must_use]
    pub fn downgrade(&self) -> WeakEmitter {
        WeakEmitter {
            owner: self.inner.owner,
            inner: Arc::downgrade(&self.inner),
        }
    }
}

impl std::fmt::Debug for SignalEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalEmitter")
            .field("owner", &self.inner.owner)
            .field("signals", &self.inner.signals)
            .finish_non_exhaustive()
    }
}

/// Non-owning handle to a [`SignalEmitter`].
#[derive(Debug, Clone)]
pub struct WeakEmitter {
    owner: ObjectId,
    inner: Weak<EmitterInner>,
}

impl WeakEmitter {
    /// Returns the owning object's identity.
    #[must_use]
    pub const fn owner(&self) -> ObjectId {
        self.owner
    }

    /// Returns the emitter if its object is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<SignalEmitter> {
        self.inner.upgrade().map(|inner| SignalEmitter { inner })
    }
}

/// An object that exposes signals.
pub trait Observable {
    /// Returns the object's emitter.
    fn emitter(&self) -> &SignalEmitter;

    /// Returns the object's identity.
    fn object_id(&self) -> ObjectId {
        self.emitter().owner()
    }

    /// Connects a handler to one of the object's signals.
    ///
    /// # Errors
    /// Returns [`CoreError::UnknownSignal`] if the signal is not declared.
    fn connect<F>(&self, signal: &str, handler: F) -> Result<HandlerId>
    where
        F: Fn(&Emission) + Send + Sync + 'static,
        Self: Sized,
    {
        self.emitter().connect(signal, handler)
    }
}

impl Observable for SignalEmitter {
    fn emitter(&self) -> &SignalEmitter {
        self
    }
}
