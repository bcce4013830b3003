//! Falsification Tests: Category B - Leak Tracker (F011-F025)

use std::sync::Arc;

use montage_core::{Caps, Element, ObjectRegistry, Pad, PadDirection, Pipeline, TrackedKind};
use montage_test::{
    FakeSourceFactory, LeakTracker, LeakTrackerConfig, TestError, TrackerPhase,
    init_test_logging,
};

fn tracker() -> (LeakTracker, ObjectRegistry) {
    init_test_logging();
    let registry = ObjectRegistry::new();
    (LeakTracker::new().with_registry(registry.clone()), registry)
}

// =============================================================================
// F011-F015: Detection
// =============================================================================

/// F011: track/verify with nothing allocated in between never fails
///
/// # Falsification Attempt
/// Pre-populate the registry, then run 100 empty track/verify cycles.
#[test]
fn f011_empty_cycle_never_fails() {
    let (mut tracker, registry) = tracker();
    let _pipeline = Pipeline::new_in(&registry, "existing");
    let _caps = Caps::new_in(&registry, "video/x-raw");

    for i in 0..100 {
        tracker.track().unwrap();
        let result = tracker.verify();
        assert!(result.is_ok(), "F011 FALSIFIED: cycle {i} failed: {result:?}");
    }
}

/// F012: An instance kept alive past verify is reported exactly once
///
/// # Falsification Attempt
/// Keep a pipeline, which is both a Pipeline and an Element; it must appear
/// once in the report.
#[test]
fn f012_kept_instance_reported_once() {
    let (mut tracker, registry) = tracker();
    tracker.track().unwrap();
    let pipeline = Pipeline::new_in(&registry, "kept");

    let err = tracker.verify().unwrap_err();
    let report = err.leak_report().expect("F012 FALSIFIED: not a leak error");
    let hits = report
        .entries()
        .iter()
        .filter(|e| e.id == pipeline.id())
        .count();
    assert_eq!(hits, 1, "F012 FALSIFIED: pipeline reported {hits} times");
    assert_eq!(report.len(), 1, "F012 FALSIFIED: unexpected extra leaks");
}

/// F013: An instance dropped before verify is not reported
#[test]
fn f013_dropped_instance_not_reported() {
    let (mut tracker, registry) = tracker();
    tracker.track().unwrap();
    for _ in 0..10 {
        let src = Element::make_in(&registry, "fakesrc").unwrap();
        let caps = Caps::new_in(&registry, "audio/x-raw");
        src.pad("src").unwrap().set_caps(Some(caps));
    }
    let result = tracker.verify();
    assert!(
        result.is_ok(),
        "F013 FALSIFIED: dropped instances reported: {result:?}"
    );
}

/// F014: Every default tracked kind is detected
#[test]
fn f014_each_tracked_kind_detected() {
    let (mut tracker, registry) = tracker();

    tracker.track().unwrap();
    let pad = Pad::new_in(&registry, "lonely", PadDirection::Src);
    let err = tracker.verify().unwrap_err();
    assert!(
        err.leak_report().unwrap().contains(pad.id()),
        "F014 FALSIFIED: pad leak not detected"
    );

    tracker.track().unwrap();
    let caps = Caps::new_in(&registry, "ANY");
    let err = tracker.verify().unwrap_err();
    assert!(
        err.leak_report().unwrap().contains(caps.id()),
        "F014 FALSIFIED: caps leak not detected"
    );

    tracker.track().unwrap();
    let factory = FakeSourceFactory::default().build_in(&registry, "f014");
    let err = tracker.verify().unwrap_err();
    assert!(
        err.leak_report().unwrap().contains(factory.id()),
        "F014 FALSIFIED: factory leak not detected"
    );
}

/// F015: Objects of untracked kinds are ignored
#[test]
fn f015_untracked_kind_ignored() {
    init_test_logging();
    let registry = ObjectRegistry::new();
    let config = LeakTrackerConfig::tracking([TrackedKind::Pipeline]);
    let mut tracker = LeakTracker::with_config(config)
        .unwrap()
        .with_registry(registry.clone());

    tracker.track().unwrap();
    let _element = Element::make_in(&registry, "identity").unwrap();
    assert!(
        tracker.verify().is_ok(),
        "F015 FALSIFIED: untracked Element reported"
    );

    tracker.track().unwrap();
    let _pipeline = Pipeline::new_in(&registry, "f015");
    assert!(
        tracker.verify().is_err(),
        "F015 FALSIFIED: tracked Pipeline missed"
    );
}

// =============================================================================
// F016-F019: Deferred release
// =============================================================================

/// F016: Nested containers released in levels are fully collected
///
/// # Falsification Attempt
/// Build a pipeline holding a chain of nested bins; dropping it leaves each
/// level in the release pool until the level above is collected.
#[test]
fn f016_nested_release_collected() {
    let (mut tracker, registry) = tracker();
    tracker.track().unwrap();
    {
        let pipeline = Pipeline::new_in(&registry, "f016");
        let mut parent = Element::make_in(&registry, "bin").unwrap();
        pipeline.add(&parent).unwrap();
        for _ in 0..8 {
            let child = Element::make_in(&registry, "bin").unwrap();
            parent.add(&child).unwrap();
            parent = child;
        }
        parent
            .add(&Element::make_in(&registry, "fakesrc").unwrap())
            .unwrap();
    }
    assert!(registry.pending_releases() > 0);

    let result = tracker.verify();
    assert!(
        result.is_ok(),
        "F016 FALSIFIED: nested release reported as leak: {result:?}"
    );
    assert!(registry.is_empty(), "F016 FALSIFIED: registry not empty");
}

/// F017: Full collection reaches a fixed point
#[test]
fn f017_full_collect_fixed_point() {
    let (tracker, registry) = tracker();
    {
        let outer = Element::make_in(&registry, "bin").unwrap();
        let inner = Element::make_in(&registry, "bin").unwrap();
        inner
            .add(&Element::make_in(&registry, "fakesink").unwrap())
            .unwrap();
        outer.add(&inner).unwrap();
    }
    let reclaimed = tracker.full_collect().unwrap();
    assert!(reclaimed >= 2, "F017 FALSIFIED: only {reclaimed} reclaimed");
    assert_eq!(
        tracker.full_collect().unwrap(),
        0,
        "F017 FALSIFIED: second collection still reclaimed values"
    );
}

/// F018: A pool that never settles is reported instead of looping forever
#[test]
fn f018_unsettled_pool_bounded() {
    struct Requeue(ObjectRegistry);

    impl Drop for Requeue {
        fn drop(&mut self) {
            self.0.defer_release(Self(self.0.clone()));
        }
    }

    let registry = ObjectRegistry::new();
    let config = LeakTrackerConfig {
        max_collect_passes: 5,
        ..LeakTrackerConfig::default()
    };
    let mut tracker = LeakTracker::with_config(config)
        .unwrap()
        .with_registry(registry.clone());
    registry.defer_release(Requeue(registry.clone()));

    let err = tracker.track().unwrap_err();
    assert!(
        matches!(err, TestError::Harness(_)),
        "F018 FALSIFIED: expected harness error, got {err:?}"
    );
    assert_eq!(tracker.phase(), TrackerPhase::Idle);
}

/// F019: Objects kept alive by a live timeline object's gnl cache are leaks
#[test]
fn f019_cached_gnl_object_leaks() {
    let (mut tracker, registry) = tracker();
    let factory = Arc::new(FakeSourceFactory::default().build_in(&registry, "f019"));
    tracker.track().unwrap();

    let obj = montage_test::TestTimelineSourceBackend::object(
        Arc::clone(&factory),
        montage_core::TimelineParams::new("clip", montage_core::MediaType::Video),
    );
    let gnl_id = obj.gnl_object().unwrap().id();
    let err = tracker.verify().unwrap_err();
    assert!(
        err.leak_report().unwrap().contains(gnl_id),
        "F019 FALSIFIED: cached gnl object not reported"
    );

    tracker.track().unwrap();
    drop(obj);
    assert!(tracker.verify().is_ok());
}

// =============================================================================
// F020-F025: Harness state machine
// =============================================================================

/// F020: Two consecutive track calls fail
#[test]
fn f020_double_track_fails() {
    let (mut tracker, _) = tracker();
    tracker.track().unwrap();
    assert!(
        matches!(tracker.track(), Err(TestError::State(_))),
        "F020 FALSIFIED: second track accepted"
    );
}

/// F021: verify without track fails
#[test]
fn f021_verify_without_track_fails() {
    let (mut tracker, _) = tracker();
    assert!(
        matches!(tracker.verify(), Err(TestError::State(_))),
        "F021 FALSIFIED: verify accepted without baseline"
    );
}

/// F022: verify twice fails
#[test]
fn f022_double_verify_fails() {
    let (mut tracker, _) = tracker();
    tracker.track().unwrap();
    tracker.verify().unwrap();
    assert!(
        matches!(tracker.verify(), Err(TestError::State(_))),
        "F022 FALSIFIED: second verify accepted"
    );
}

/// F023: A failed verify still discards the baseline
#[test]
fn f023_failed_verify_discards_baseline() {
    let (mut tracker, registry) = tracker();
    tracker.track().unwrap();
    let _kept = Caps::new_in(&registry, "video/x-raw");
    assert!(tracker.verify().is_err());
    assert_eq!(
        tracker.phase(),
        TrackerPhase::Verified,
        "F023 FALSIFIED: baseline kept after failed verify"
    );
    assert!(tracker.track().is_ok());
}

/// F024: run() wraps a test body and surfaces leaks
#[test]
fn f024_run_surfaces_leaks() {
    let (mut tracker, registry) = tracker();
    let mut keep = Vec::new();
    let result = tracker.run(|| keep.push(Element::make_in(&registry, "identity").unwrap()));
    let report = match result {
        Err(TestError::Leaked(report)) => report,
        other => panic!("F024 FALSIFIED: expected leak, got {other:?}"),
    };
    // identity element plus its sink and src pads
    assert_eq!(report.len(), 3, "F024 FALSIFIED: report {report}");
    assert!(report.contains(keep[0].id()));
}

/// F025: Trackers on separate threads do not see each other's objects
#[test]
fn f025_thread_isolation() {
    init_test_logging();
    let mut tracker = LeakTracker::new();
    tracker.track().unwrap();

    let leaked_elsewhere = std::thread::spawn(|| {
        let element = Element::make("fakesrc").unwrap();
        let id = element.id();
        std::mem::forget(element);
        id
    })
    .join()
    .unwrap();

    let result = tracker.verify();
    assert!(
        result.is_ok(),
        "F025 FALSIFIED: object {leaked_elsewhere} from another thread reported"
    );
}
