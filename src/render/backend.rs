use std::path::Path;

use crate::{
    error::{CascadeError, CascadeResult},
    scene::document::Document,
};

/// Something that can turn a [`Document`] with an active camera into a still image on disk.
///
/// Implementations must block until the file is written (or the render failed) and must not
/// mutate the document.
pub trait RenderBackend {
    fn render_still(&mut self, doc: &Document, out_path: &Path) -> CascadeResult<()>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderEngine {
    Eevee,
    EeveeNext,
    Cycles,
    Workbench,
}

impl RenderEngine {
    /// Identifier Blender expects in `scene.render.engine`.
    pub fn blender_id(self) -> &'static str {
        match self {
            Self::Eevee => "BLENDER_EEVEE",
            Self::EeveeNext => "BLENDER_EEVEE_NEXT",
            Self::Cycles => "CYCLES",
            Self::Workbench => "BLENDER_WORKBENCH",
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RenderSettings {
    pub engine: RenderEngine,
    pub resolution_x: u32,
    pub resolution_y: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub samples: Option<u32>,
    pub aperture_fstop: f64,
    pub clip_start: f64,
    pub clip_end: f64,
}

impl RenderSettings {
    /// 1080p EEVEE, the resolution used for sweep candidates.
    pub fn preview() -> Self {
        Self {
            engine: RenderEngine::Eevee,
            resolution_x: 1920,
            resolution_y: 1080,
            samples: None,
            aperture_fstop: 5.6,
            clip_start: 0.1,
            clip_end: 1000.0,
        }
    }

    /// 4K EEVEE at 256 samples for the final still.
    pub fn production() -> Self {
        Self {
            resolution_x: 3840,
            resolution_y: 2160,
            samples: Some(256),
            ..Self::preview()
        }
    }

    pub fn validate(&self) -> CascadeResult<()> {
        if self.resolution_x == 0 || self.resolution_y == 0 {
            return Err(CascadeError::validation(
                "render resolution must be non-zero",
            ));
        }
        if self.samples == Some(0) {
            return Err(CascadeError::validation("render samples must be > 0"));
        }
        if !(self.aperture_fstop > 0.0) {
            return Err(CascadeError::validation("aperture f-stop must be > 0"));
        }
        if !(self.clip_start > 0.0 && self.clip_end > self.clip_start) {
            return Err(CascadeError::validation(
                "camera clipping requires 0 < clip_start < clip_end",
            ));
        }
        Ok(())
    }
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self::preview()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_validate() {
        RenderSettings::preview().validate().unwrap();
        RenderSettings::production().validate().unwrap();
        assert_eq!(RenderSettings::production().samples, Some(256));
    }

    #[test]
    fn validation_catches_bad_values() {
        let mut s = RenderSettings::preview();
        s.resolution_y = 0;
        assert!(s.validate().is_err());

        let mut s = RenderSettings::preview();
        s.clip_end = 0.05;
        assert!(s.validate().is_err());

        let mut s = RenderSettings::preview();
        s.samples = Some(0);
        assert!(s.validate().is_err());
    }

    #[test]
    fn engine_serializes_snake_case() {
        let json = serde_json::to_string(&RenderEngine::EeveeNext).unwrap();
        assert_eq!(json, "\"eevee_next\"");
        assert_eq!(RenderEngine::Cycles.blender_id(), "CYCLES");
    }
}
