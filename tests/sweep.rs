mod common;

use cascade_framing::{
    CascadeError, Document, FailurePolicy, SceneOptions, SweepOptions, build_cascade_scene,
    camera_tests, framing_tests, run_sweep,
};
use common::{FakeBackend, scratch_dir};

fn built_scene() -> Document {
    let mut doc = Document::new();
    build_cascade_scene(&mut doc, &SceneOptions::default()).unwrap();
    doc
}

fn options(dir: &std::path::Path, on_failure: FailurePolicy) -> SweepOptions {
    SweepOptions {
        output_dir: dir.to_path_buf(),
        prefix: "camera_test".to_string(),
        on_failure,
    }
}

#[test]
fn one_artifact_per_pose_in_catalog_order() {
    let dir = scratch_dir("sweep_order");
    let mut doc = built_scene();
    let objects_before = doc.len();
    let catalog = camera_tests();
    let mut backend = FakeBackend::default();

    let report = run_sweep(
        &mut doc,
        &mut backend,
        catalog.poses(),
        &options(&dir, FailurePolicy::Continue),
    )
    .unwrap();

    assert!(report.is_complete());
    assert_eq!(report.artifacts.len(), catalog.len());
    for (artifact, pose) in report.artifacts.iter().zip(catalog.poses()) {
        assert_eq!(artifact.pose_name, pose.name);
        assert_eq!(
            artifact.file_path,
            dir.join(format!("camera_test_{}.png", pose.name))
        );
        assert!(artifact.file_path.is_file());
    }

    // One camera on top of the content during each render, none afterwards.
    assert!(backend.object_counts.iter().all(|&n| n == objects_before + 1));
    assert_eq!(doc.len(), objects_before);
    assert_eq!(doc.camera_count(), 0);
    assert!(doc.active_camera().is_none());
}

#[test]
fn rerunning_overwrites_the_same_files() {
    let dir = scratch_dir("sweep_rerun");
    let mut doc = built_scene();
    let catalog = framing_tests();
    let poses = &catalog.poses()[..3];
    let opts = options(&dir, FailurePolicy::Continue);

    let first = run_sweep(&mut doc, &mut FakeBackend::default(), poses, &opts).unwrap();
    let second = run_sweep(&mut doc, &mut FakeBackend::default(), poses, &opts).unwrap();

    let names = |r: &cascade_framing::SweepReport| {
        r.artifacts
            .iter()
            .map(|a| a.file_path.clone())
            .collect::<Vec<_>>()
    };
    assert_eq!(names(&first), names(&second));
    assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 3);
}

#[test]
fn continue_policy_records_failures_and_renders_the_rest() {
    let dir = scratch_dir("sweep_continue");
    let mut doc = built_scene();
    let catalog = camera_tests();
    let mut backend = FakeBackend::failing(&["close_low"]);

    let report = run_sweep(
        &mut doc,
        &mut backend,
        catalog.poses(),
        &options(&dir, FailurePolicy::Continue),
    )
    .unwrap();

    assert_eq!(report.artifacts.len(), catalog.len() - 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].pose_name, "close_low");
    assert!(matches!(report.failures[0].error, CascadeError::Render(_)));
    assert_eq!(backend.rendered.len(), catalog.len());
    assert_eq!(doc.camera_count(), 0);
}

#[test]
fn abort_policy_stops_at_first_failure() {
    let dir = scratch_dir("sweep_abort");
    let mut doc = built_scene();
    let catalog = camera_tests();
    let mut backend = FakeBackend::failing(&["close_low"]);

    let err = run_sweep(
        &mut doc,
        &mut backend,
        catalog.poses(),
        &options(&dir, FailurePolicy::Abort),
    )
    .unwrap_err();

    assert!(matches!(err, CascadeError::Render(_)));
    assert_eq!(backend.rendered.len(), 3);
    assert_eq!(doc.camera_count(), 0);
}

#[test]
fn empty_scene_is_rejected_before_rendering() {
    let dir = scratch_dir("sweep_empty");
    let mut doc = Document::new();
    let mut backend = FakeBackend::default();

    let err = run_sweep(
        &mut doc,
        &mut backend,
        camera_tests().poses(),
        &options(&dir, FailurePolicy::Continue),
    )
    .unwrap_err();

    assert!(matches!(err, CascadeError::Validation(_)));
    assert!(backend.rendered.is_empty());
}

#[test]
fn previously_active_camera_is_restored() {
    let dir = scratch_dir("sweep_restore");
    let mut doc = built_scene();
    let hero = framing_tests().get_pose("perfect_center").unwrap().clone();
    let id = doc.add_camera(&hero).unwrap();
    doc.set_active_camera(id).unwrap();

    run_sweep(
        &mut doc,
        &mut FakeBackend::default(),
        &camera_tests().poses()[..2],
        &options(&dir, FailurePolicy::Continue),
    )
    .unwrap();

    let (active, obj) = doc.active_camera().unwrap();
    assert_eq!(active, id);
    assert_eq!(obj.name, "Camera_perfect_center");
}
