use std::{collections::HashSet, path::PathBuf};

use anyhow::Context as _;
use chrono::Utc;

use crate::{
    camera::pose::CameraPose,
    error::{CascadeError, CascadeResult},
    render::{artifacts::RenderArtifact, backend::RenderBackend},
    scene::document::Document,
};

/// What a sweep does when one pose fails to render.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Record the failure and render the remaining poses.
    #[default]
    Continue,
    /// Stop at the first failure and return its error.
    Abort,
}

#[derive(Clone, Debug)]
pub struct SweepOptions {
    pub output_dir: PathBuf,
    pub prefix: String,
    pub on_failure: FailurePolicy,
}

#[derive(Debug)]
pub struct SweepFailure {
    pub pose_name: String,
    pub error: CascadeError,
}

#[derive(Debug, Default)]
pub struct SweepReport {
    pub artifacts: Vec<RenderArtifact>, // catalog order
    pub failures: Vec<SweepFailure>,
}

impl SweepReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Render `doc` once per pose into `<output_dir>/<prefix>_<pose>.png`.
///
/// The document must already hold the scene content. Only the per-pose camera is added and
/// removed; geometry is left untouched, and the camera is removed even when its render fails.
/// Any camera that was active before the sweep is active again afterwards.
#[tracing::instrument(skip_all, fields(poses = poses.len(), out = %opts.output_dir.display()))]
pub fn run_sweep(
    doc: &mut Document,
    backend: &mut dyn RenderBackend,
    poses: &[CameraPose],
    opts: &SweepOptions,
) -> CascadeResult<SweepReport> {
    if poses.is_empty() {
        return Err(CascadeError::validation("sweep needs at least one pose"));
    }
    if doc.content_count() == 0 {
        return Err(CascadeError::validation(
            "scene is empty; build it before running a sweep",
        ));
    }
    if opts.prefix.is_empty() {
        return Err(CascadeError::validation("sweep prefix must be non-empty"));
    }
    let mut seen = HashSet::new();
    for pose in poses {
        pose.validate()?;
        if !seen.insert(pose.name.as_str()) {
            return Err(CascadeError::validation(format!(
                "pose '{}' appears twice; render file names would collide",
                pose.name
            )));
        }
    }

    std::fs::create_dir_all(&opts.output_dir).with_context(|| {
        format!(
            "failed to create sweep output directory '{}'",
            opts.output_dir.display()
        )
    })?;

    let previous_camera = doc.active_camera().map(|(id, _)| id);
    let content_before = doc.content_count();
    let mut report = SweepReport::default();

    for pose in poses {
        let file_path = opts
            .output_dir
            .join(pose.render_file_name(&opts.prefix));
        tracing::info!(pose = %pose.name, "rendering");

        let camera = doc.add_camera(pose)?;
        let rendered = doc
            .set_active_camera(camera)
            .and_then(|()| backend.render_still(doc, &file_path));
        doc.remove_object(camera)?;
        debug_assert_eq!(doc.content_count(), content_before);

        match rendered {
            Ok(()) => report.artifacts.push(RenderArtifact {
                pose_name: pose.name.clone(),
                file_path,
                created_at: Utc::now(),
            }),
            Err(err) if opts.on_failure == FailurePolicy::Continue => {
                tracing::warn!(pose = %pose.name, error = %err, "render failed; continuing");
                report.failures.push(SweepFailure {
                    pose_name: pose.name.clone(),
                    error: err,
                });
            }
            Err(err) => {
                restore_camera(doc, previous_camera);
                return Err(err);
            }
        }
    }

    restore_camera(doc, previous_camera);
    tracing::info!(
        rendered = report.artifacts.len(),
        failed = report.failures.len(),
        "sweep finished"
    );
    Ok(report)
}

fn restore_camera(doc: &mut Document, previous: Option<crate::scene::document::ObjectId>) {
    if let Some(id) = previous
        && let Err(err) = doc.set_active_camera(id)
    {
        tracing::warn!(error = %err, "could not restore the previously active camera");
    }
}
