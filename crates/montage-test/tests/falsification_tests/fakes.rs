//! Falsification Tests: Category C - Fakes (F026-F035)

use std::sync::Arc;

use montage_core::{
    MediaType, ObjectFactory, ObjectRegistry, Pipeline, PipelineState, TimelineParams, UNSET,
};
use montage_test::{
    FakeGnlFactory, FakeSinkFactory, FakeSourceFactory, LeakTracker, SECOND, SignalMonitor,
    TestFileSourceBackend, TestTimelineBackend, TestTimelineSourceBackend,
};

fn av_factory(registry: &ObjectRegistry, length: u64) -> Arc<ObjectFactory> {
    Arc::new(
        FakeSourceFactory::default()
            .build_in(registry, "av")
            .with_audio(true)
            .with_video(true)
            .with_length(length),
    )
}

// =============================================================================
// F026-F029: Factories
// =============================================================================

/// F026: Fake source and sink bins can be linked into a playable pipeline
#[test]
fn f026_fake_factories_build_pipeline() {
    let registry = ObjectRegistry::new();
    let mut tracker = LeakTracker::new().with_registry(registry.clone());
    let source = FakeSourceFactory::default().build_in(&registry, "src");
    let sink = FakeSinkFactory::default().build_in(&registry, "sink");

    tracker
        .run(|| {
            let pipeline = Pipeline::new_in(&registry, "f026");
            pipeline.add(&source.make_bin(None).unwrap()).unwrap();
            pipeline.add(&sink.make_bin(None).unwrap()).unwrap();
            pipeline.set_state(PipelineState::Playing).unwrap();
            pipeline.set_state(PipelineState::Null).unwrap();
        })
        .expect("F026 FALSIFIED: pipeline of fake bins leaked");
}

/// F027: Fake gnl factory applies its durations
#[test]
fn f027_fake_gnl_durations() {
    let registry = ObjectRegistry::new();
    let factory = FakeGnlFactory::new(3 * SECOND, 7 * SECOND).build_in(&registry, "gnl");
    let gnl = factory.make_bin(None).unwrap();
    assert_eq!(
        gnl.property_u64("duration"),
        Some(3 * SECOND),
        "F027 FALSIFIED: duration not applied"
    );
    assert_eq!(
        gnl.property_u64("media-duration"),
        Some(7 * SECOND),
        "F027 FALSIFIED: media-duration not applied"
    );
}

/// F028: Default gnl durations are ten seconds
#[test]
fn f028_fake_gnl_default_ten_seconds() {
    let maker = FakeGnlFactory::default();
    assert_eq!(maker.duration, 10_000_000_000);
    assert_eq!(
        maker.media_duration, 10_000_000_000,
        "F028 FALSIFIED: default media duration is not 10s"
    );
}

/// F029: Bins built by a fake factory are released with their container
#[test]
fn f029_gnl_bin_released() {
    let registry = ObjectRegistry::new();
    let factory = FakeGnlFactory::default().build_in(&registry, "gnl");
    let mut tracker = LeakTracker::new().with_registry(registry.clone());
    let result = tracker.run(|| factory.make_bin(None).map(|gnl| gnl.children().len()));
    assert_eq!(
        result.unwrap().unwrap(),
        1,
        "F029 FALSIFIED: gnl bin did not contain one child"
    );
}

// =============================================================================
// F030-F032: Timeline backends
// =============================================================================

/// F030: Test timeline objects carry their data type tags
#[test]
fn f030_data_type_tags() {
    let registry = ObjectRegistry::new();
    let factory = av_factory(&registry, SECOND);
    let params = TimelineParams::new("clip", MediaType::Video);
    let tags = [
        TestTimelineBackend::object(Arc::clone(&factory), params.clone()).data_type(),
        TestTimelineSourceBackend::object(Arc::clone(&factory), params.clone()).data_type(),
        TestFileSourceBackend::object(factory, params).data_type(),
    ];
    assert_eq!(
        tags,
        [
            "test-timeline-object",
            "test-timeline-source",
            "test-timeline-file-source"
        ],
        "F030 FALSIFIED: data type tags wrong"
    );
}

/// F031: Timeline object brothers swap audio and video
#[test]
fn f031_brother_swaps_media() {
    let registry = ObjectRegistry::new();
    let factory = av_factory(&registry, SECOND);
    for (media, other) in [
        (MediaType::Audio, MediaType::Video),
        (MediaType::Video, MediaType::Audio),
    ] {
        let obj = TestTimelineBackend::object(
            Arc::clone(&factory),
            TimelineParams::new("clip", media).with_start(5).with_duration(9),
        );
        let brother = obj.make_brother().unwrap();
        let params = brother.params();
        assert_eq!(
            params.media_type, other,
            "F031 FALSIFIED: brother of {media:?} is {:?}",
            params.media_type
        );
        assert_eq!((params.start, params.duration), (5, 9));
        assert_eq!(brother.brother_id(), Some(obj.id()));
    }
}

/// F032: The file source brother exists only when the factory provides the
/// other media type
#[test]
fn f032_file_source_brother_availability() {
    let registry = ObjectRegistry::new();
    let audio_only = Arc::new(
        FakeSourceFactory::default()
            .build_in(&registry, "a")
            .with_audio(true),
    );
    let obj = TestFileSourceBackend::object(
        Arc::clone(&audio_only),
        TimelineParams::new("song", MediaType::Audio),
    );
    assert!(
        obj.make_brother().is_none(),
        "F032 FALSIFIED: brother made without video"
    );

    let obj = TestFileSourceBackend::object(
        av_factory(&registry, SECOND),
        TimelineParams::new("movie", MediaType::Audio),
    );
    let brother = obj.make_brother().unwrap();
    assert_eq!(brother.name(), "movie-brother");
    assert_eq!(brother.media_type(), MediaType::Video);
}

// =============================================================================
// F033-F035: File source media positions
// =============================================================================

/// F033: Unset media positions default to zero and the factory length
#[test]
fn f033_file_source_defaults() {
    let registry = ObjectRegistry::new();
    let obj = TestFileSourceBackend::object(
        av_factory(&registry, 12 * SECOND),
        TimelineParams::new("file", MediaType::Video),
    );
    assert_eq!(obj.params().media_start, UNSET);
    let gnl = obj.gnl_object().unwrap();
    let params = obj.params();
    assert_eq!(params.media_start, 0, "F033 FALSIFIED: media start not 0");
    assert_eq!(
        params.media_duration,
        (12 * SECOND) as i64,
        "F033 FALSIFIED: media duration not factory length"
    );
    assert_eq!(gnl.property_u64("media-duration"), Some(12 * SECOND));
}

/// F034: Changing the gnl object's media positions updates the timeline
/// object
#[test]
fn f034_file_source_notify_sync() {
    let registry = ObjectRegistry::new();
    let obj = TestFileSourceBackend::object(
        av_factory(&registry, 12 * SECOND),
        TimelineParams::new("file", MediaType::Video),
    );
    let gnl = obj.gnl_object().unwrap();
    let monitor = SignalMonitor::new(&gnl, &["notify::media-start", "notify::media-duration"])
        .unwrap();

    gnl.set_property("media-start", 2 * SECOND).unwrap();
    gnl.set_property("media-duration", 4 * SECOND).unwrap();

    let params = obj.params();
    assert_eq!(
        (params.media_start, params.media_duration),
        ((2 * SECOND) as i64, (4 * SECOND) as i64),
        "F034 FALSIFIED: timeline params not synced"
    );
    assert_eq!(monitor.count("notify__media_start"), 1);
    assert_eq!(monitor.count("notify__media_duration"), 1);
}

/// F035: Moving a timeline object moves its built gnl object
#[test]
fn f035_set_start_propagates() {
    let registry = ObjectRegistry::new();
    let obj = TestFileSourceBackend::object(
        av_factory(&registry, SECOND),
        TimelineParams::new("file", MediaType::Video).with_start(1),
    );
    let gnl = obj.gnl_object().unwrap();
    assert_eq!(gnl.property_u64("start"), Some(1));

    obj.set_start(3 * SECOND as i64).unwrap();
    obj.set_duration(SECOND as i64).unwrap();
    assert_eq!(
        gnl.property_u64("start"),
        Some(3 * SECOND),
        "F035 FALSIFIED: start not propagated"
    );
    assert_eq!(gnl.property_u64("duration"), Some(SECOND));
}
