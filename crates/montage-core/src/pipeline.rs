//! Top-level pipeline object.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::element::{ELEMENT_ADDED, ELEMENT_REMOVED, Element};
use crate::error::{CoreError, Result};
use crate::registry::{LiveToken, ObjectRegistry, TrackedKind};
use crate::signal::{Observable, SignalEmitter};
use crate::types::{ObjectId, PipelineState, Value};

/// Emitted after a state change. Args: `[Str(old), Str(new)]`.
pub const STATE_CHANGED: &str = "state-changed";

struct PipelineInner {
    token: LiveToken,
    name: String,
    elements: Mutex<Vec<Element>>,
    state: Mutex<PipelineState>,
    emitter: SignalEmitter,
}

impl Drop for PipelineInner {
    fn drop(&mut self) {
        let elements = std::mem::take(self.elements.get_mut());
        if !elements.is_empty() {
            self.token.registry().defer_release(elements);
        }
    }
}

/// Pipeline holding a flat set of elements. Clones share the same instance.
#[derive(Clone)]
pub struct Pipeline {
    inner: Arc<PipelineInner>,
}

impl Pipeline {
    /// Creates a pipeline in the calling thread's registry.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::new_in(&ObjectRegistry::current(), name)
    }

    /// Creates a pipeline in `registry`.
    #[must_use]
    pub fn new_in(registry: &ObjectRegistry, name: impl Into<String>) -> Self {
        let name = name.into();
        let token = registry.register(TrackedKind::Pipeline, name.clone());
        let id = token.id();
        let emitter = SignalEmitter::new(
            id,
            format!("Pipeline({name}){id}"),
            [ELEMENT_ADDED, ELEMENT_REMOVED, STATE_CHANGED],
        );
        Self {
            inner: Arc::new(PipelineInner {
                token,
                name,
                elements: Mutex::new(Vec::new()),
                state: Mutex::new(PipelineState::Null),
                emitter,
            }),
        }
    }

    /// Returns the pipeline's identity.
    #[must_use]
    pub fn id(&self) -> ObjectId {
        self.inner.token.id()
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Adds an element and emits `element-added`.
    ///
    /// # Errors
    /// Returns an error if the element is already in the pipeline.
    pub fn add(&self, element: &Element) -> Result<()> {
        {
            let mut elements = self.inner.elements.lock();
            if elements.iter().any(|e| e.id() == element.id()) {
                return Err(CoreError::state(format!(
                    "{} already in pipeline {}",
                    element.name(),
                    self.inner.name
                )));
            }
            elements.push(element.clone());
        }
        self.inner
            .emitter
            .emit(ELEMENT_ADDED, vec![Value::Object(element.id())])?;
        Ok(())
    }

    /// Removes an element and emits `element-removed`. Returns false if the
    /// element was not present.
    ///
    /// # Errors
    /// Propagates emitter errors.
    pub fn remove(&self, element: &Element) -> Result<bool> {
        let removed = {
            let mut elements = self.inner.elements.lock();
            let before = elements.len();
            elements.retain(|e| e.id() != element.id());
            elements.len() != before
        };
        if removed {
            self.inner
                .emitter
                .emit(ELEMENT_REMOVED, vec![Value::Object(element.id())])?;
        }
        Ok(removed)
    }

    /// Returns the pipeline's elements in insertion order.
    #[must_use]
    pub fn elements(&self) -> Vec<Element> {
        self.inner.elements.lock().clone()
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> PipelineState {
        *self.inner.state.lock()
    }

    /// Changes state, emitting `state-changed` when it differs. Returns the
    /// previous state.
    ///
    /// # Errors
    /// Returns an error when leaving `Null` with no elements.
    pub fn set_state(&self, new: PipelineState) -> Result<PipelineState> {
        let old = {
            let mut state = self.inner.state.lock();
            let old = *state;
            if old == PipelineState::Null
                && new != PipelineState::Null
                && self.inner.elements.lock().is_empty()
            {
                return Err(CoreError::state(format!(
                    "pipeline {} has no elements",
                    self.inner.name
                )));
            }
            *state = new;
            old
        };
        if old != new {
            tracing::debug!(pipeline = %self.inner.name, %old, %new, "state changed");
            self.inner.emitter.emit(
                STATE_CHANGED,
                vec![Value::from(old.as_str()), Value::from(new.as_str())],
            )?;
        }
        Ok(old)
    }
}

impl Observable for Pipeline {
    fn emitter(&self) -> &SignalEmitter {
        &self.inner.emitter
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("id", &self.id())
            .field("name", &self.inner.name)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
