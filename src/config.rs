use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context as _;

use crate::{
    error::{CascadeError, CascadeResult},
    render::backend::RenderSettings,
};

/// File picked up from the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "cascade.json";

/// Everything a workflow run needs that is not a camera pose.
///
/// Every field has a default, so `{}` is a valid config file.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub blender: BlenderConfig,
    pub vision: VisionConfig,
    pub paths: PathsConfig,
    pub preview: RenderSettings,
    pub production: RenderSettings,
    pub sweep_prefix: String, // render file names are `<prefix>_<pose>.png`
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            blender: BlenderConfig::default(),
            vision: VisionConfig::default(),
            paths: PathsConfig::default(),
            preview: RenderSettings::preview(),
            production: RenderSettings::production(),
            sweep_prefix: "camera_test".to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BlenderConfig {
    /// Explicit executable. When unset, `BLENDER`, then `PATH`, then well-known install
    /// locations are searched.
    pub executable: Option<PathBuf>,
    /// Passed to Blender after the script arguments.
    pub extra_args: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    pub base_url: String,
    pub model: String,
    pub single_image_timeout_secs: u64,
    pub multi_image_timeout_secs: u64,
    pub health_timeout_secs: u64,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llava".to_string(),
            single_image_timeout_secs: 60,
            multi_image_timeout_secs: 90,
            health_timeout_secs: 5,
        }
    }
}

impl VisionConfig {
    /// Request timeout for a generate call carrying `image_count` images.
    pub fn timeout_for(&self, image_count: usize) -> Duration {
        if image_count > 1 {
            Duration::from_secs(self.multi_image_timeout_secs)
        } else {
            Duration::from_secs(self.single_image_timeout_secs)
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub renders_dir: PathBuf,
    pub sweep_dir: PathBuf,
    pub references_dir: PathBuf,
    pub production_script: PathBuf,
    pub camera_config: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        let root = PathBuf::from("references_and_renders");
        Self {
            renders_dir: root.join("renders"),
            sweep_dir: root.join("camera_tests"),
            references_dir: root.join("reference_images"),
            production_script: PathBuf::from("ultimate_cascade_render.py"),
            camera_config: PathBuf::from("camera.json"),
        }
    }
}

impl PathsConfig {
    /// An existing file path as given, else `name` inside `renders_dir`.
    pub fn resolve_render(&self, name: &Path) -> CascadeResult<PathBuf> {
        resolve_in(&self.renders_dir, name, "render")
    }

    /// An existing file path as given, else `name` inside `references_dir`.
    pub fn resolve_reference(&self, name: &Path) -> CascadeResult<PathBuf> {
        resolve_in(&self.references_dir, name, "reference image")
    }
}

fn resolve_in(dir: &Path, name: &Path, what: &str) -> CascadeResult<PathBuf> {
    if name.is_file() {
        return Ok(name.to_path_buf());
    }
    let joined = dir.join(name);
    if joined.is_file() {
        Ok(joined)
    } else {
        Err(CascadeError::missing_path(what, &joined))
    }
}

impl WorkflowConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> CascadeResult<Self> {
        if !path.is_file() {
            return Err(CascadeError::missing_path("config file", path));
        }
        let bytes =
            std::fs::read(path).with_context(|| format!("read config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_slice(&bytes).map_err(|e| {
            CascadeError::serde(format!("parse config '{}': {e}", path.display()))
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// `explicit` if given (must exist), else [`DEFAULT_CONFIG_FILE`] if present, else
    /// built-in defaults.
    pub fn discover(explicit: Option<&Path>) -> CascadeResult<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let fallback = Path::new(DEFAULT_CONFIG_FILE);
        if fallback.is_file() {
            tracing::debug!(path = %fallback.display(), "using config from working directory");
            return Self::load(fallback);
        }
        Ok(Self::new())
    }

    pub fn validate(&self) -> CascadeResult<()> {
        if self.vision.base_url.trim().is_empty() {
            return Err(CascadeError::validation("vision.base_url must be non-empty"));
        }
        if self.vision.model.trim().is_empty() {
            return Err(CascadeError::validation("vision.model must be non-empty"));
        }
        if self.vision.single_image_timeout_secs == 0
            || self.vision.multi_image_timeout_secs == 0
            || self.vision.health_timeout_secs == 0
        {
            return Err(CascadeError::validation("vision timeouts must be > 0 seconds"));
        }
        if self.sweep_prefix.is_empty()
            || !self
                .sweep_prefix
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(CascadeError::validation(
                "sweep_prefix must be non-empty and use only ASCII letters, digits, '_' and '-'",
            ));
        }
        self.preview.validate()?;
        self.production.validate()?;
        Ok(())
    }
}
