mod common;

use std::path::Path;

use cascade_framing::{
    CascadeError, CameraConfig, CritiqueMode, Document, FailurePolicy, FixedSelector,
    ManualSelector, PoseCatalog, SceneOptions, ScoreSelector, SweepOptions, WorkflowOptions,
    camera_tests, load_camera_config, render_production, run_workflow, save_camera_config,
};
use common::{FakeBackend, FakeVision, scratch_dir};

fn options(dir: &Path, mode: CritiqueMode) -> WorkflowOptions {
    WorkflowOptions {
        scene: SceneOptions::default(),
        sweep: SweepOptions {
            output_dir: dir.join("sweep"),
            prefix: "camera_test".to_string(),
            on_failure: FailurePolicy::Continue,
        },
        rubric: "Rate the framing.".to_string(),
        critique_mode: mode,
        camera_config: dir.join("camera.json"),
        patch_script: None,
        catalog_label: Some("camera_tests".to_string()),
    }
}

fn small_catalog() -> PoseCatalog {
    PoseCatalog::from_poses(camera_tests().poses()[..4].to_vec()).unwrap()
}

#[test]
fn score_selection_persists_the_best_pose() {
    let dir = scratch_dir("wf_score");
    let vision = FakeVision::new(|_, images| {
        let name = images[0].file_stem().unwrap().to_string_lossy().into_owned();
        let score = if name.ends_with("close_low") { 9 } else { 5 };
        Ok(format!(r#"{{"overall_score": {score}, "summary": "{name}"}}"#))
    });

    let report = run_workflow(
        &mut Document::new(),
        &mut FakeBackend::default(),
        Some(&vision),
        &mut ScoreSelector,
        &small_catalog(),
        &options(&dir, CritiqueMode::Scored),
    )
    .unwrap();

    assert_eq!(report.selected.name, "close_low");
    assert_eq!(report.critiques.results.len(), 4);
    let saved = load_camera_config(&dir.join("camera.json")).unwrap();
    assert_eq!(saved.pose, report.selected);
    assert_eq!(saved.source.as_deref(), Some("camera_tests"));
}

#[test]
fn service_errors_skip_the_pose_and_the_run_continues() {
    let dir = scratch_dir("wf_skip");
    let vision = FakeVision::new(|_, images| {
        if images[0].to_string_lossy().contains("medium_medium") {
            Err(CascadeError::http_status(503, "busy"))
        } else {
            Ok("fine".to_string())
        }
    });

    let report = run_workflow(
        &mut Document::new(),
        &mut FakeBackend::default(),
        Some(&vision),
        &mut FixedSelector::new("far_high"),
        &small_catalog(),
        &options(&dir, CritiqueMode::FreeText),
    )
    .unwrap();

    assert_eq!(report.critiques.results.len(), 3);
    assert_eq!(report.critiques.skipped.len(), 1);
    assert_eq!(report.critiques.skipped[0].pose_name, "medium_medium");
    assert_eq!(report.selected.name, "far_high");
}

#[test]
fn scored_selection_without_vision_fails_before_rendering() {
    let dir = scratch_dir("wf_score_no_vision");
    let mut backend = FakeBackend::default();
    let err = run_workflow(
        &mut Document::new(),
        &mut backend,
        None,
        &mut ScoreSelector,
        &small_catalog(),
        &options(&dir, CritiqueMode::Scored),
    )
    .unwrap_err();
    assert!(matches!(err, CascadeError::Validation(_)));
    assert!(backend.rendered.is_empty());
}

#[test]
fn failed_renders_are_not_offered_for_selection() {
    let dir = scratch_dir("wf_failed_render");
    let err = run_workflow(
        &mut Document::new(),
        &mut FakeBackend::failing(&["close_low"]),
        None,
        &mut FixedSelector::new("close_low"),
        &small_catalog(),
        &options(&dir, CritiqueMode::FreeText),
    )
    .unwrap_err();
    assert!(matches!(err, CascadeError::NotFound(_)));
    assert!(!dir.join("camera.json").exists());
}

#[test]
fn manual_selection_reads_the_choice_from_input() {
    let dir = scratch_dir("wf_manual");
    let mut output = Vec::new();
    let mut selector = ManualSelector::new(&b"2\n"[..], &mut output);

    let report = run_workflow(
        &mut Document::new(),
        &mut FakeBackend::default(),
        None,
        &mut selector,
        &small_catalog(),
        &options(&dir, CritiqueMode::FreeText),
    )
    .unwrap();
    drop(selector);

    assert_eq!(report.selected.name, "medium_medium");
    assert!(String::from_utf8(output).unwrap().contains("2. medium_medium"));
}

#[test]
fn patch_script_is_updated_when_requested() {
    let dir = scratch_dir("wf_patch");
    let script = dir.join("ultimate_cascade_render.py");
    std::fs::write(&script, "camera.data.lens = 35\n").unwrap();
    let mut opts = options(&dir, CritiqueMode::FreeText);
    opts.patch_script = Some(script.clone());

    let report = run_workflow(
        &mut Document::new(),
        &mut FakeBackend::default(),
        None,
        &mut FixedSelector::new("close_low"),
        &small_catalog(),
        &opts,
    )
    .unwrap();

    let patch = report.patch.unwrap();
    assert!(patch.written);
    assert_eq!(patch.missing_fields().count(), 2);
    assert_eq!(std::fs::read_to_string(&script).unwrap(), "camera.data.lens = 50\n");
}

#[test]
fn production_render_uses_the_persisted_pose() {
    let dir = scratch_dir("wf_production");
    let camera = dir.join("camera.json");
    let pose = camera_tests().get_pose("telephoto").unwrap().clone();
    save_camera_config(&camera, &CameraConfig::new(pose, None)).unwrap();

    let out = dir.join("final").join("production.png");
    let mut backend = FakeBackend::default();
    let artifact = render_production(
        &mut Document::new(),
        &mut backend,
        &SceneOptions::default(),
        &camera,
        &out,
    )
    .unwrap();

    assert_eq!(artifact.pose_name, "telephoto");
    assert!(out.is_file());
    assert_eq!(backend.rendered, ["Camera_telephoto"]);
}
