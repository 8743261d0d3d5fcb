#![allow(dead_code)]

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
};

use cascade_framing::{
    CascadeError, CascadeResult, Document, RenderBackend, VisionModel,
    vision::client::VisionRequest,
};

static SCRATCH: AtomicU64 = AtomicU64::new(0);

/// Fresh, empty directory under the system temp dir.
pub fn scratch_dir(name: &str) -> PathBuf {
    let n = SCRATCH.fetch_add(1, Ordering::Relaxed);
    let dir = std::env::temp_dir().join(format!(
        "cascade_it_{name}_{}_{n}",
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

pub fn write_png(path: &Path) {
    let img = image::RgbImage::from_pixel(8, 8, image::Rgb([40, 120, 200]));
    img.save(path).unwrap();
}

/// Writes a tiny PNG per render and records which camera was active.
#[derive(Default)]
pub struct FakeBackend {
    pub rendered: Vec<String>,
    pub fail_for: HashSet<String>,
    pub object_counts: Vec<usize>,
}

impl FakeBackend {
    pub fn failing(poses: &[&str]) -> Self {
        Self {
            fail_for: poses.iter().map(|p| format!("Camera_{p}")).collect(),
            ..Self::default()
        }
    }
}

impl RenderBackend for FakeBackend {
    fn render_still(&mut self, doc: &Document, out_path: &Path) -> CascadeResult<()> {
        let (_, camera) = doc
            .active_camera()
            .ok_or_else(|| CascadeError::validation("no active camera"))?;
        self.rendered.push(camera.name.clone());
        self.object_counts.push(doc.len());
        if self.fail_for.contains(&camera.name) {
            return Err(CascadeError::render(format!(
                "blender exited with status 1 for {}",
                camera.name
            )));
        }
        write_png(out_path);
        Ok(())
    }
}

/// Answers from a closure over the prompt and image paths.
pub struct FakeVision<F>(F);

impl<F> FakeVision<F>
where
    F: Fn(&str, &[&Path]) -> CascadeResult<String>,
{
    pub fn new(answer: F) -> Self {
        Self(answer)
    }
}

impl<F> VisionModel for FakeVision<F>
where
    F: Fn(&str, &[&Path]) -> CascadeResult<String>,
{
    fn generate(&self, request: VisionRequest<'_>) -> CascadeResult<String> {
        (self.0)(request.prompt, request.images)
    }
}
