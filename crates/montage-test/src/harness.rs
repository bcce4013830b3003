//! Leak-tracking test harness.
//!
//! Wraps a test body between a baseline snapshot of live tracked objects and
//! a verification that no new tracked objects survived it.
//!
//! ```text
//! Idle ──track()──▶ Tracking ──verify()──▶ Verified ──track()──▶ Tracking ...
//! ```
//!
//! Both snapshots are taken after a full collection: the registry's release
//! pool is drained pass after pass until one pass reclaims nothing, so
//! objects whose release is deferred by their owners are not mistaken for
//! survivors.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use montage_core::{LiveEntry, ObjectId, ObjectRegistry, TrackedKind};

use crate::config::LeakTrackerConfig;
use crate::error::{Result, TestError};

/// Objects that were live after a test but not before it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LeakReport {
    leaked: Vec<LiveEntry>,
}

impl LeakReport {
    /// Returns the leaked objects ordered by identity.
    #[must_use]
    pub fn entries(&self) -> &[LiveEntry] {
        &self.leaked
    }

    /// Returns the number of leaked objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.leaked.len()
    }

    /// Returns true if nothing leaked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.leaked.is_empty()
    }

    /// Returns true if the object with this identity leaked.
    #[must_use]
    pub fn contains(&self, id: ObjectId) -> bool {
        self.leaked.iter().any(|entry| entry.id == id)
    }

    /// Returns the leaked identities.
    #[must_use]
    pub fn ids(&self) -> Vec<ObjectId> {
        self.leaked.iter().map(|entry| entry.id).collect()
    }

    /// Serialises the report as JSON.
    ///
    /// # Errors
    /// Returns an error if serialisation fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl std::fmt::Display for LeakReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} tracked object(s) leaked: [", self.leaked.len())?;
        for (i, entry) in self.leaked.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{entry}")?;
        }
        f.write_str("]")
    }
}

/// Observable phase of a [`LeakTracker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerPhase {
    /// No baseline taken yet.
    Idle,
    /// Baseline taken, waiting for verification.
    Tracking,
    /// Last baseline has been verified and discarded.
    Verified,
}

#[derive(Debug)]
enum TrackerState {
    Idle,
    Tracking(BTreeMap<TrackedKind, BTreeSet<ObjectId>>),
    Verified,
}

/// Leak-tracking harness for a single test at a time.
#[derive(Debug)]
pub struct LeakTracker {
    config: LeakTrackerConfig,
    registry: ObjectRegistry,
    state: TrackerState,
}

impl LeakTracker {
    /// Creates a tracker with the default tracked kinds, watching the calling
    /// thread's registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: LeakTrackerConfig::default(),
            registry: ObjectRegistry::current(),
            state: TrackerState::Idle,
        }
    }

    /// Creates a tracker from a configuration.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn with_config(config: LeakTrackerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            registry: ObjectRegistry::current(),
            state: TrackerState::Idle,
        })
    }

    /// Watches `registry` instead of the calling thread's registry.
    #[must_use]
    pub fn with_registry(mut self, registry: ObjectRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Returns the tracked kinds.
    #[must_use]
    pub fn tracked_kinds(&self) -> &[TrackedKind] {
        &self.config.tracked_kinds
    }

    /// Returns the watched registry.
    #[must_use]
    pub const fn registry(&self) -> &ObjectRegistry {
        &self.registry
    }

    /// Returns the current phase.
    #[must_use]
    pub const fn phase(&self) -> TrackerPhase {
        match self.state {
            TrackerState::Idle => TrackerPhase::Idle,
            TrackerState::Tracking(_) => TrackerPhase::Tracking,
            TrackerState::Verified => TrackerPhase::Verified,
        }
    }

    /// Runs collection passes until one reclaims nothing. Returns the total
    /// number of values reclaimed.
    ///
    /// # Errors
    /// Returns [`TestError::Harness`] if the pool has not settled after the
    /// configured number of passes.
    pub fn full_collect(&self) -> Result<usize> {
        let mut total = 0;
        for pass in 1..=self.config.max_collect_passes {
            let reclaimed = self.registry.collect_one_pass();
            if reclaimed == 0 {
                tracing::debug!(passes = pass, reclaimed = total, "collection settled");
                return Ok(total);
            }
            total += reclaimed;
        }
        Err(TestError::harness(format!(
            "release pool still busy after {} passes ({total} reclaimed)",
            self.config.max_collect_passes
        )))
    }

    fn snapshot(&self) -> BTreeMap<TrackedKind, BTreeSet<ObjectId>> {
        self.config
            .tracked_kinds
            .iter()
            .map(|&kind| (kind, self.registry.live_ids(kind)))
            .collect()
    }

    /// Takes the pre-test baseline.
    ///
    /// # Errors
    /// Returns [`TestError::State`] if a baseline is already pending, or a
    /// collection error.
    pub fn track(&mut self) -> Result<()> {
        if matches!(self.state, TrackerState::Tracking(_)) {
            return Err(TestError::state("track() called twice without verify()"));
        }
        self.full_collect()?;
        let baseline = self.snapshot();
        tracing::debug!(
            kinds = baseline.len(),
            live = baseline.values().map(BTreeSet::len).sum::<usize>(),
            "baseline taken"
        );
        self.state = TrackerState::Tracking(baseline);
        Ok(())
    }

    /// Compares live tracked objects against the baseline and discards it.
    ///
    /// # Errors
    /// Returns [`TestError::Leaked`] with the new objects if any survived,
    /// [`TestError::State`] if no baseline is pending, or a collection error.
    pub fn verify(&mut self) -> Result<()> {
        let baseline = match std::mem::replace(&mut self.state, TrackerState::Verified) {
            TrackerState::Tracking(baseline) => baseline,
            previous => {
                let already = matches!(previous, TrackerState::Verified);
                self.state = previous;
                return Err(TestError::state(if already {
                    "verify() called twice"
                } else {
                    "verify() called without track()"
                }));
            }
        };

        self.full_collect()?;
        let report = self.leaks_against(&baseline);
        if report.is_empty() {
            tracing::debug!("no tracked objects leaked");
            Ok(())
        } else {
            tracing::warn!(count = report.len(), leaked = %report, "tracked objects leaked");
            Err(TestError::Leaked(report))
        }
    }

    fn leaks_against(&self, baseline: &BTreeMap<TrackedKind, BTreeSet<ObjectId>>) -> LeakReport {
        let mut new_ids = BTreeSet::new();
        for &kind in &self.config.tracked_kinds {
            let before = baseline.get(&kind);
            for id in self.registry.live_ids(kind) {
                if !before.is_some_and(|ids| ids.contains(&id)) {
                    new_ids.insert(id);
                }
            }
        }
        LeakReport {
            leaked: new_ids
                .into_iter()
                .filter_map(|id| self.registry.entry(id))
                .collect(),
        }
    }

    /// Runs `test` between [`track`](Self::track) and
    /// [`verify`](Self::verify) and returns its output.
    ///
    /// # Errors
    /// Returns the tracker's error; the test body's output is discarded when
    /// verification fails.
    pub fn run<T, F>(&mut self, test: F) -> Result<T>
    where
        F: FnOnce() -> T,
    {
        self.track()?;
        let output = test();
        self.verify()?;
        Ok(output)
    }
}

impl Default for LeakTracker {
    fn default() -> Self {
        Self::new()
    }
}
