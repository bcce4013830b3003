// Allow unwrap/expect in tests for clear failure messages
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! # montage-core
//!
//! Object model primitives for the Montage video editor.
//!
//! This crate provides:
//!
//! - [`ObjectRegistry`] and [`LiveToken`]: live-instance accounting for
//!   tracked object kinds, plus a deferred release pool
//! - [`SignalEmitter`] and [`Observable`]: named signals with explicit
//!   [`Emission`] records
//! - [`Element`], [`Pad`], [`Caps`], [`Pipeline`]: the tracked media objects
//! - [`ObjectFactory`] with an injected [`BinMaker`]
//! - [`TimelineObject`] with an injected [`TimelineBackend`]
//!
//! ## Example
//!
//! ```rust
//! use montage_core::{Element, ObjectRegistry, Observable, TrackedKind};
//!
//! let registry = ObjectRegistry::new();
//! let bin = Element::make_in(&registry, "bin").unwrap();
//! bin.connect("element-added", |emission| {
//!     println!("{} gained {:?}", emission.source, emission.args);
//! })
//! .unwrap();
//!
//! let src = Element::make_in(&registry, "fakesrc").unwrap();
//! bin.add(&src).unwrap();
//! assert_eq!(registry.live_count(TrackedKind::Element), 2);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::significant_drop_tightening)]

pub mod element;
pub mod error;
pub mod factory;
pub mod pipeline;
pub mod registry;
pub mod signal;
pub mod timeline;
pub mod types;

pub use element::{Caps, ELEMENT_ADDED, ELEMENT_REMOVED, Element, Pad, notify_signal};
pub use error::{CoreError, Result};
pub use factory::{BinMaker, FactoryRole, ObjectFactory};
pub use pipeline::{Pipeline, STATE_CHANGED};
pub use registry::{LiveEntry, LiveToken, ObjectRegistry, TrackedKind};
pub use signal::{Emission, HandlerId, Observable, SignalEmitter, WeakEmitter};
pub use timeline::{
    SharedParams, TimelineBackend, TimelineObject, TimelineParams, UNSET, position_nanos,
};
pub use types::{MediaType, ObjectId, PadDirection, PipelineState, Value};
