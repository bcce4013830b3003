//! Falsification Tests: Category A - Signal Monitor (F001-F010)

use montage_core::{
    Element, ObjectId, ObjectRegistry, Pipeline, PipelineState, SignalEmitter, Value,
};
use montage_test::{LeakTracker, SignalMonitor, TestError};

fn container() -> SignalEmitter {
    SignalEmitter::new(ObjectId::next(), "Container", ["added", "removed"])
}

// =============================================================================
// F001-F004: Counting and collection
// =============================================================================

/// F001: Count and collected arguments follow the added/removed scenario
///
/// # Falsification Attempt
/// Add x, add y, remove x; any other count or argument order falsifies.
#[test]
fn f001_added_removed_scenario() {
    let c = container();
    let monitor = SignalMonitor::new(&c, &["added", "removed"]).unwrap();
    let x = Value::Object(ObjectId::next());
    let y = Value::Object(ObjectId::next());

    c.emit("added", vec![x.clone()]).unwrap();
    c.emit("added", vec![y.clone()]).unwrap();
    c.emit("removed", vec![x.clone()]).unwrap();

    assert_eq!(
        monitor.count("added"),
        2,
        "F001 FALSIFIED: added count is not 2"
    );
    assert_eq!(
        monitor.collected("added"),
        vec![vec![x.clone()], vec![y]],
        "F001 FALSIFIED: added arguments out of order"
    );
    assert_eq!(
        monitor.count("removed"),
        1,
        "F001 FALSIFIED: removed count is not 1"
    );
    assert_eq!(
        monitor.collected("removed"),
        vec![vec![x]],
        "F001 FALSIFIED: removed arguments wrong"
    );
}

/// F002: A fresh monitor reports zero for every subscribed signal
#[test]
fn f002_fresh_monitor_is_zeroed() {
    let c = container();
    let monitor = SignalMonitor::new(&c, &["added", "removed"]).unwrap();
    for signal in ["added", "removed"] {
        assert_eq!(
            monitor.count(signal),
            0,
            "F002 FALSIFIED: {signal} count not zero"
        );
        assert!(
            monitor.collected(signal).is_empty(),
            "F002 FALSIFIED: {signal} collect not empty"
        );
    }
}

/// F003: Count equals collected length after many firings
///
/// # Falsification Attempt
/// Fire 1000 interleaved emissions; the count must match list length.
#[test]
fn f003_count_equals_collected_length() {
    let c = container();
    let monitor = SignalMonitor::new(&c, &["added", "removed"]).unwrap();
    for i in 0..1000_u64 {
        let signal = if i % 3 == 0 { "removed" } else { "added" };
        c.emit(signal, vec![Value::UInt(i)]).unwrap();
    }
    for signal in ["added", "removed"] {
        assert_eq!(
            monitor.count(signal),
            monitor.collected(signal).len(),
            "F003 FALSIFIED: count and collect diverged for {signal}"
        );
    }
    assert_eq!(monitor.total(), 1000, "F003 FALSIFIED: total is not 1000");
}

/// F004: Emissions on unmonitored signals are not recorded
#[test]
fn f004_unmonitored_signal_ignored() {
    let c = container();
    let monitor = SignalMonitor::new(&c, &["added"]).unwrap();
    c.emit("removed", vec![]).unwrap();
    assert_eq!(
        monitor.total(),
        0,
        "F004 FALSIFIED: unmonitored emission recorded"
    );
}

// =============================================================================
// F005-F007: Real objects
// =============================================================================

/// F005: Container element add/remove is observed with child identities
#[test]
fn f005_element_added_removed() {
    let registry = ObjectRegistry::new();
    let bin = Element::make_in(&registry, "bin").unwrap();
    let monitor = SignalMonitor::new(&bin, &["element-added", "element-removed"]).unwrap();
    let src = Element::make_in(&registry, "fakesrc").unwrap();
    let sink = Element::make_in(&registry, "fakesink").unwrap();

    bin.add(&src).unwrap();
    bin.add(&sink).unwrap();
    bin.remove(&src).unwrap();

    assert_eq!(
        monitor.collected("element_added"),
        vec![vec![Value::Object(src.id())], vec![Value::Object(sink.id())]],
        "F005 FALSIFIED: element-added arguments wrong"
    );
    assert_eq!(
        monitor.collected("element-removed"),
        vec![vec![Value::Object(src.id())]],
        "F005 FALSIFIED: element-removed arguments wrong"
    );
}

/// F006: Pipeline state changes are recorded with old and new state
#[test]
fn f006_pipeline_state_changed() {
    let registry = ObjectRegistry::new();
    let pipeline = Pipeline::new_in(&registry, "f006");
    let monitor = SignalMonitor::new(&pipeline, &["state-changed"]).unwrap();
    pipeline
        .add(&Element::make_in(&registry, "fakesrc").unwrap())
        .unwrap();

    pipeline.set_state(PipelineState::Paused).unwrap();
    pipeline.set_state(PipelineState::Paused).unwrap();
    pipeline.set_state(PipelineState::Playing).unwrap();

    assert_eq!(
        monitor.collected("state_changed"),
        vec![
            vec![Value::from("null"), Value::from("paused")],
            vec![Value::from("paused"), Value::from("playing")],
        ],
        "F006 FALSIFIED: state changes not recorded in order"
    );
}

/// F007: Property notifications are observable through the monitor
#[test]
fn f007_notify_property() {
    let registry = ObjectRegistry::new();
    let gnl = Element::make_in(&registry, "gnlsource").unwrap();
    let monitor = SignalMonitor::new(&gnl, &["notify::start"]).unwrap();
    gnl.set_property("start", 42_u64).unwrap();
    assert_eq!(
        monitor.collected("notify__start"),
        vec![vec![Value::UInt(42)]],
        "F007 FALSIFIED: notify::start not recorded"
    );
}

// =============================================================================
// F008-F010: Subscription lifecycle
// =============================================================================

/// F008: Subscribing to an undeclared signal fails without side effects
#[test]
fn f008_unknown_signal_rejected() {
    let c = container();
    let result = SignalMonitor::new(&c, &["added", "exploded"]);
    assert!(
        matches!(result, Err(TestError::Core(_))),
        "F008 FALSIFIED: undeclared signal accepted"
    );
    assert_eq!(
        c.handler_count("added"),
        0,
        "F008 FALSIFIED: partial subscription left behind"
    );
}

/// F009: A monitor never keeps its object alive
#[test]
fn f009_monitor_does_not_leak_object() {
    let registry = ObjectRegistry::new();
    let mut tracker = LeakTracker::new().with_registry(registry.clone());
    tracker.track().unwrap();

    let bin = Element::make_in(&registry, "bin").unwrap();
    let monitor = SignalMonitor::new(&bin, &["element-added"]).unwrap();
    drop(bin);

    let result = tracker.verify();
    assert!(
        result.is_ok(),
        "F009 FALSIFIED: monitor kept the object alive: {result:?}"
    );
    assert_eq!(monitor.count("element-added"), 0);
}

/// F010: Dropping the monitor disconnects every handler
#[test]
fn f010_drop_disconnects() {
    let c = container();
    {
        let _monitor = SignalMonitor::new(&c, &["added", "removed"]).unwrap();
        assert_eq!(c.handler_count("added"), 1);
    }
    assert_eq!(
        c.handler_count("added") + c.handler_count("removed"),
        0,
        "F010 FALSIFIED: handlers survived the monitor"
    );
    assert_eq!(c.emit("added", vec![]).unwrap(), 0);
}
