//! Signal monitor: counts and records emissions on an object.
//!
//! ```rust
//! use montage_core::{Element, ObjectRegistry, Value};
//! use montage_test::SignalMonitor;
//!
//! let registry = ObjectRegistry::new();
//! let bin = Element::make_in(&registry, "bin").unwrap();
//! let monitor = SignalMonitor::new(&bin, &["element-added", "element-removed"]).unwrap();
//!
//! let src = Element::make_in(&registry, "fakesrc").unwrap();
//! bin.add(&src).unwrap();
//!
//! assert_eq!(monitor.count("element-added"), 1);
//! assert_eq!(monitor.count("element_removed"), 0);
//! assert_eq!(monitor.collected("element-added"), vec![vec![Value::Object(src.id())]]);
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;

use montage_core::{HandlerId, ObjectId, Observable, Value, WeakEmitter};

use crate::error::{Result, TestError};

/// Emissions recorded for one signal, in firing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignalRecord {
    /// Argument list of every emission.
    pub collect: Vec<Vec<Value>>,
}

impl SignalRecord {
    /// Number of emissions.
    #[must_use]
    pub fn count(&self) -> usize {
        self.collect.len()
    }
}

/// Normalises a signal name into a field name: every character that is not
/// ASCII alphanumeric becomes `_`.
#[must_use]
pub fn field_name(signal: &str) -> String {
    signal
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

type Records = Arc<Mutex<BTreeMap<String, SignalRecord>>>;

/// Subscribes to a set of signals on an object and records every emission.
///
/// The monitor holds only a weak link to the object's emitter; it never
/// keeps the object alive. Dropping the monitor disconnects its handlers.
pub struct SignalMonitor {
    object: ObjectId,
    emitter: WeakEmitter,
    signals: Vec<String>,
    handlers: Vec<HandlerId>,
    records: Records,
}

impl SignalMonitor {
    /// Connects to each named signal on `object`. Duplicate names are
    /// subscribed once.
    ///
    /// # Errors
    /// Returns [`TestError::Harness`] if two different names normalise to the
    /// same field name. Propagates the emitter's error for undeclared signal
    /// names; handlers connected before the failure are disconnected again.
    pub fn new<O>(object: &O, signals: &[&str]) -> Result<Self>
    where
        O: Observable + ?Sized,
    {
        for (i, &signal) in signals.iter().enumerate() {
            let field = field_name(signal);
            if let Some(&other) = signals[..i]
                .iter()
                .find(|&&other| other != signal && field_name(other) == field)
            {
                return Err(TestError::harness(format!(
                    "signals '{other}' and '{signal}' share field name '{field}'"
                )));
            }
        }

        let emitter = object.emitter();
        let records: Records = Arc::new(Mutex::new(BTreeMap::new()));
        let mut names: Vec<String> = Vec::with_capacity(signals.len());
        let mut handlers = Vec::with_capacity(signals.len());

        for &signal in signals {
            if names.iter().any(|n| n == signal) {
                continue;
            }
            let sink = Arc::clone(&records);
            let key = signal.to_string();
            let connected = emitter.connect(signal, move |emission| {
                sink.lock()
                    .entry(key.clone())
                    .or_default()
                    .collect
                    .push(emission.args.clone());
            });
            match connected {
                Ok(id) => handlers.push(id),
                Err(e) => {
                    for id in handlers {
                        emitter.disconnect(id);
                    }
                    return Err(e.into());
                }
            }
            records
                .lock()
                .insert(signal.to_string(), SignalRecord::default());
            names.push(signal.to_string());
        }

        tracing::debug!(object = %emitter.owner(), signals = ?names, "monitor attached");
        Ok(Self {
            object: emitter.owner(),
            emitter: emitter.downgrade(),
            signals: names,
            handlers,
            records,
        })
    }

    /// Returns the identity of the observed object.
    #[must_use]
    pub const fn object(&self) -> ObjectId {
        self.object
    }

    /// Returns the monitored signal names in subscription order.
    #[must_use]
    pub fn signals(&self) -> &[String] {
        &self.signals
    }

    /// Returns true if `signal` (raw or normalised) is monitored.
    #[must_use]
    pub fn is_monitoring(&self, signal: &str) -> bool {
        self.resolve(signal).is_some()
    }

    fn resolve(&self, signal: &str) -> Option<&str> {
        self.signals
            .iter()
            .find(|s| s.as_str() == signal)
            .or_else(|| self.signals.iter().find(|s| field_name(s) == signal))
            .map(String::as_str)
    }

    /// Returns a snapshot of the record for `signal` (raw or normalised).
    #[must_use]
    pub fn record(&self, signal: &str) -> Option<SignalRecord> {
        let name = self.resolve(signal)?;
        self.records.lock().get(name).cloned()
    }

    /// Returns how many times `signal` fired. Unmonitored names count 0.
    #[must_use]
    pub fn count(&self, signal: &str) -> usize {
        self.record(signal).map_or(0, |r| r.count())
    }

    /// Returns the argument lists recorded for `signal`, in firing order.
    #[must_use]
    pub fn collected(&self, signal: &str) -> Vec<Vec<Value>> {
        self.record(signal).map(|r| r.collect).unwrap_or_default()
    }

    /// Checks that `signal` fired exactly `expected` times.
    ///
    /// # Errors
    /// Returns [`TestError::Assertion`] with both counts when they differ.
    pub fn assert_count(&self, signal: &str, expected: usize) -> Result<()> {
        let actual = self.count(signal);
        if actual == expected {
            Ok(())
        } else {
            Err(TestError::assertion(format!(
                "{signal} on {}: expected {expected} emission(s), got {actual}",
                self.object
            )))
        }
    }

    /// Returns the total number of recorded emissions.
    #[must_use]
    pub fn total(&self) -> usize {
        self.records.lock().values().map(SignalRecord::count).sum()
    }

    /// Returns the `(count, collect)` field names for a signal, e.g.
    /// `element-added` → `("element_added_count", "element_added_collect")`.
    #[must_use]
    pub fn field_names(signal: &str) -> (String, String) {
        let field = field_name(signal);
        (format!("{field}_count"), format!("{field}_collect"))
    }

    /// Returns every record keyed by normalised field name.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, SignalRecord> {
        self.records
            .lock()
            .iter()
            .map(|(name, record)| (field_name(name), record.clone()))
            .collect()
    }

    /// Clears every record, keeping the subscriptions.
    pub fn reset(&self) {
        for record in self.records.lock().values_mut() {
            record.collect.clear();
        }
    }
}

impl Drop for SignalMonitor {
    fn drop(&mut self) {
        if let Some(emitter) = self.emitter.upgrade() {
            for id in self.handlers.drain(..) {
                emitter.disconnect(id);
            }
        }
    }
}

impl std::fmt::Debug for SignalMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalMonitor")
            .field("object", &self.object)
            .field("records", &self.snapshot())
            .finish_non_exhaustive()
    }
}
