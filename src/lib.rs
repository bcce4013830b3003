//! Montage: object model and test scaffolding for a nonlinear video editor
//!
//! # Quick Start
//!
//! ```rust
//! use montage::prelude::*;
//!
//! let registry = ObjectRegistry::new();
//! let mut tracker = LeakTracker::new().with_registry(registry.clone());
//! let source = FakeSourceFactory::default().build_in(&registry, "clip-source");
//!
//! tracker
//!     .run(|| {
//!         let pipeline = Pipeline::new_in(&registry, "preview");
//!         let monitor = SignalMonitor::new(&pipeline, &["element-added"]).unwrap();
//!         pipeline.add(&source.make_bin(None).unwrap()).unwrap();
//!         assert_eq!(monitor.count("element-added"), 1);
//!     })
//!     .unwrap();
//! ```

pub use montage_core as core;
pub use montage_test as test;

/// Prelude module for common imports.
pub mod prelude {
    pub use montage_core::{
        Caps, Element, MediaType, ObjectFactory, ObjectRegistry, Observable, Pad, Pipeline,
        PipelineState, TimelineObject, TimelineParams, TrackedKind, Value,
    };
    pub use montage_test::{
        FakeGnlFactory, FakeSinkFactory, FakeSourceFactory, LeakTracker, LeakTrackerConfig,
        SignalMonitor, TestError, init_test_logging,
    };
}
