//! The camera config file: the hand-off between framing and the production render.
//!
//! ```json
//! {
//!   "version": 1,
//!   "pose": { "name": "wide_angle", "position": {..}, "rotation": {..}, ... },
//!   "selected_at": "2026-10-18T09:30:00Z",
//!   "source": "framing_tests"
//! }
//! ```

use std::path::Path;

use anyhow::Context as _;
use chrono::{DateTime, Utc};

use crate::{
    camera::pose::CameraPose,
    error::{CascadeError, CascadeResult},
    patch::write_atomic,
    render::blender::ensure_parent_dir,
};

pub const CAMERA_CONFIG_VERSION: u32 = 1;

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CameraConfig {
    pub version: u32,
    pub pose: CameraPose,
    pub selected_at: DateTime<Utc>,
    /// Catalog the pose came from, for the record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl CameraConfig {
    pub fn new(pose: CameraPose, source: Option<String>) -> Self {
        Self {
            version: CAMERA_CONFIG_VERSION,
            pose,
            selected_at: Utc::now(),
            source,
        }
    }
}

/// Write `config` as pretty JSON through a temp file and rename.
#[tracing::instrument(skip(config), fields(pose = %config.pose.name))]
pub fn save_camera_config(path: &Path, config: &CameraConfig) -> CascadeResult<()> {
    config.pose.validate()?;
    ensure_parent_dir(path)?;
    let mut json = serde_json::to_vec_pretty(config)
        .map_err(|e| CascadeError::serde(format!("encode camera config: {e}")))?;
    json.push(b'\n');
    write_atomic(path, &json)?;
    tracing::info!(path = %path.display(), "camera config saved");
    Ok(())
}

pub fn load_camera_config(path: &Path) -> CascadeResult<CameraConfig> {
    if !path.is_file() {
        return Err(CascadeError::missing_path("camera config", path));
    }
    let bytes = std::fs::read(path)
        .with_context(|| format!("read camera config '{}'", path.display()))?;
    let config: CameraConfig = serde_json::from_slice(&bytes).map_err(|e| {
        CascadeError::serde(format!("parse camera config '{}': {e}", path.display()))
    })?;
    if config.version != CAMERA_CONFIG_VERSION {
        return Err(CascadeError::validation(format!(
            "camera config version {} is not supported (expected {CAMERA_CONFIG_VERSION})",
            config.version
        )));
    }
    config.pose.validate()?;
    Ok(config)
}
