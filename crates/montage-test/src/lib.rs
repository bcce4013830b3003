// Allow unwrap/expect in tests for clear failure messages
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! # montage-test
//!
//! Testing infrastructure for the Montage video editor.
//!
//! This crate provides:
//! - **Signal monitor**: counts and records emissions of named signals
//! - **Leak tracker**: fails a test when tracked objects survive it
//! - **Fakes**: source/sink/gnl factories and timeline backends without
//!   real media
//! - **Falsification tests**: numbered claims under `tests/`
//!
//! ## Example
//!
//! ```rust
//! use montage_core::{Element, ObjectRegistry};
//! use montage_test::{LeakTracker, SignalMonitor};
//!
//! let registry = ObjectRegistry::new();
//! let mut tracker = LeakTracker::new().with_registry(registry.clone());
//!
//! tracker
//!     .run(|| {
//!         let bin = Element::make_in(&registry, "bin").unwrap();
//!         let monitor = SignalMonitor::new(&bin, &["element-added"]).unwrap();
//!         bin.add(&Element::make_in(&registry, "fakesrc").unwrap()).unwrap();
//!         assert_eq!(monitor.count("element-added"), 1);
//!     })
//!     .unwrap();
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::significant_drop_tightening)]

pub mod config;
pub mod error;
pub mod fakes;
pub mod harness;
pub mod logging;
pub mod monitor;

pub use config::LeakTrackerConfig;
pub use error::{Result, TestError};
pub use fakes::{
    FakeGnlFactory, FakeSinkFactory, FakeSourceFactory, SECOND, TestFileSourceBackend,
    TestTimelineBackend, TestTimelineSourceBackend,
};
pub use harness::{LeakReport, LeakTracker, TrackerPhase};
pub use logging::init_test_logging;
pub use monitor::{SignalMonitor, SignalRecord, field_name};
