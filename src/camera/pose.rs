use crate::{
    error::{CascadeError, CascadeResult},
    foundation::core::{Euler, Vec3, py_float, py_number},
};

/// Blender's lower bound for `camera.data.lens`.
pub const MIN_FOCAL_LENGTH_MM: f64 = 1.0;

/// A named camera configuration.
///
/// `name` doubles as the render file-name suffix, so it is restricted to characters that are
/// safe in a path component.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CameraPose {
    pub name: String,
    pub position: Vec3,
    pub rotation: Euler, // radians, XYZ
    pub focal_length_mm: f64,
    pub focus_distance: f64,
}

impl CameraPose {
    pub fn new(
        name: impl Into<String>,
        position: impl Into<Vec3>,
        rotation: Euler,
        focal_length_mm: f64,
        focus_distance: f64,
    ) -> Self {
        Self {
            name: name.into(),
            position: position.into(),
            rotation,
            focal_length_mm,
            focus_distance,
        }
    }

    pub fn validate(&self) -> CascadeResult<()> {
        if self.name.is_empty() {
            return Err(CascadeError::validation("pose name must be non-empty"));
        }
        if !self
            .name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(CascadeError::validation(format!(
                "pose name '{}' may only contain ASCII letters, digits, '_' and '-'",
                self.name
            )));
        }
        if !self.position.is_finite() || !self.rotation.is_finite() {
            return Err(CascadeError::validation(format!(
                "pose '{}' has a non-finite position or rotation",
                self.name
            )));
        }
        if !(self.focal_length_mm.is_finite() && self.focal_length_mm >= MIN_FOCAL_LENGTH_MM) {
            return Err(CascadeError::validation(format!(
                "pose '{}' focal length must be at least {MIN_FOCAL_LENGTH_MM} mm",
                self.name
            )));
        }
        if !(self.focus_distance.is_finite() && self.focus_distance > 0.0) {
            return Err(CascadeError::validation(format!(
                "pose '{}' focus distance must be > 0",
                self.name
            )));
        }
        Ok(())
    }

    /// `<prefix>_<name>.png`
    pub fn render_file_name(&self, prefix: &str) -> String {
        format!("{prefix}_{}.png", self.name)
    }

    pub fn lens_literal(&self) -> String {
        py_number(self.focal_length_mm)
    }

    pub fn focus_literal(&self) -> String {
        py_float(self.focus_distance)
    }
}

impl std::fmt::Display for CameraPose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: location={} rotation={} lens={}mm focus={}",
            self.name,
            self.position.to_py_tuple(),
            self.rotation.to_py_tuple(),
            self.lens_literal(),
            self.focus_literal()
        )
    }
}
