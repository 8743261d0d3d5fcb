//! End-to-end orchestration: build, sweep, critique, select, persist, and the production
//! render that consumes the persisted pose.

use std::path::{Path, PathBuf};

use crate::{
    camera::{catalog::PoseCatalog, pose::CameraPose},
    error::{CascadeError, CascadeResult},
    patch::{PatchReport, apply_pose},
    persist::{CameraConfig, load_camera_config, save_camera_config},
    render::{
        artifacts::RenderArtifact,
        backend::RenderBackend,
        blender::ensure_parent_dir,
        sweep::{SweepOptions, SweepReport, run_sweep},
    },
    scene::{
        builder::{SceneOptions, build_cascade_scene},
        document::Document,
    },
    select::PoseSelector,
    vision::{
        client::VisionModel,
        critique::{CritiqueBatch, CritiqueMode, critique_artifacts},
    },
};

#[derive(Clone, Debug)]
pub struct WorkflowOptions {
    pub scene: SceneOptions,
    pub sweep: SweepOptions,
    pub rubric: String,
    pub critique_mode: CritiqueMode,
    pub camera_config: PathBuf,
    /// Legacy production script to patch in place after the camera config is written.
    pub patch_script: Option<PathBuf>,
    /// Recorded as the config's `source`.
    pub catalog_label: Option<String>,
}

#[derive(Debug)]
pub struct WorkflowReport {
    pub sweep: SweepReport,
    pub critiques: CritiqueBatch,
    pub selected: CameraPose,
    pub camera_config: PathBuf,
    pub patch: Option<PatchReport>,
}

/// Run one framing iteration over every pose in `catalog`.
///
/// Without a vision model, selection happens on renders alone, and scored critiques are
/// refused before anything renders. Poses whose render failed are not offered to the selector.
#[tracing::instrument(skip_all, fields(poses = catalog.len()))]
pub fn run_workflow(
    doc: &mut Document,
    backend: &mut dyn RenderBackend,
    vision: Option<&dyn VisionModel>,
    selector: &mut dyn PoseSelector,
    catalog: &PoseCatalog,
    opts: &WorkflowOptions,
) -> CascadeResult<WorkflowReport> {
    if vision.is_none() && opts.critique_mode == CritiqueMode::Scored {
        return Err(CascadeError::validation(
            "score-based selection needs a reachable vision model",
        ));
    }

    build_cascade_scene(doc, &opts.scene)?;
    tracing::info!(objects = doc.len(), "scene built");

    let sweep = run_sweep(doc, backend, catalog.poses(), &opts.sweep)?;
    if sweep.artifacts.is_empty() {
        return Err(CascadeError::render(format!(
            "all {} poses failed to render",
            catalog.len()
        )));
    }

    let critiques = match vision {
        Some(model) => {
            critique_artifacts(model, &sweep.artifacts, &opts.rubric, opts.critique_mode)
        }
        None => {
            tracing::info!("no vision model; skipping critique");
            CritiqueBatch::default()
        }
    };

    let candidates: Vec<CameraPose> = sweep
        .artifacts
        .iter()
        .map(|a| catalog.get_pose(&a.pose_name).cloned())
        .collect::<CascadeResult<_>>()?;
    let name = selector.select(&candidates, &critiques.results)?;
    let selected = catalog.get_pose(&name)?.clone();
    tracing::info!(pose = %selected.name, "pose selected");

    let config = CameraConfig::new(selected.clone(), opts.catalog_label.clone());
    save_camera_config(&opts.camera_config, &config)?;

    let patch = opts
        .patch_script
        .as_deref()
        .map(|script| apply_pose(script, &selected))
        .transpose()?;

    Ok(WorkflowReport {
        sweep,
        critiques,
        selected,
        camera_config: opts.camera_config.clone(),
        patch,
    })
}

/// Place the persisted pose's camera in a freshly built scene and make it active.
pub fn stage_production_scene(
    doc: &mut Document,
    scene: &SceneOptions,
    config: &CameraConfig,
) -> CascadeResult<()> {
    build_cascade_scene(doc, scene)?;
    let camera = doc.add_camera(&config.pose)?;
    doc.set_active_camera(camera)
}

/// Production still from the camera config at `camera_config`.
#[tracing::instrument(skip(doc, backend, scene))]
pub fn render_production(
    doc: &mut Document,
    backend: &mut dyn RenderBackend,
    scene: &SceneOptions,
    camera_config: &Path,
    out: &Path,
) -> CascadeResult<RenderArtifact> {
    let config = load_camera_config(camera_config)?;
    stage_production_scene(doc, scene, &config)?;
    ensure_parent_dir(out)?;
    backend.render_still(doc, out)?;
    tracing::info!(pose = %config.pose.name, out = %out.display(), "production render written");
    RenderArtifact::from_file(out, None).map(|artifact| RenderArtifact {
        pose_name: config.pose.name,
        ..artifact
    })
}
