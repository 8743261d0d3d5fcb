use std::{collections::HashMap, path::Path};

use anyhow::Context as _;

use crate::{
    camera::pose::CameraPose,
    error::{CascadeError, CascadeResult},
    foundation::core::Euler,
};

/// An ordered set of uniquely named camera poses.
///
/// Iteration order is insertion order; sweeps render in this order and ties in score-based
/// selection resolve towards the earlier entry.
#[derive(Clone, Debug, Default)]
pub struct PoseCatalog {
    poses: Vec<CameraPose>,
    index: HashMap<String, usize>,
}

#[derive(serde::Deserialize)]
struct CatalogFile {
    poses: Vec<CameraPose>,
}

impl PoseCatalog {
    /// Build a catalog, rejecting invalid poses and duplicate names.
    pub fn from_poses(poses: impl IntoIterator<Item = CameraPose>) -> CascadeResult<Self> {
        let mut catalog = Self::default();
        for pose in poses {
            pose.validate()?;
            if catalog.index.contains_key(&pose.name) {
                return Err(CascadeError::validation(format!(
                    "duplicate pose name '{}' in catalog",
                    pose.name
                )));
            }
            catalog.index.insert(pose.name.clone(), catalog.poses.len());
            catalog.poses.push(pose);
        }
        Ok(catalog)
    }

    /// Load `{"poses": [...]}` from a JSON file.
    pub fn load_json(path: &Path) -> CascadeResult<Self> {
        if !path.is_file() {
            return Err(CascadeError::missing_path("pose catalog", path));
        }
        let bytes = std::fs::read(path)
            .with_context(|| format!("read pose catalog '{}'", path.display()))?;
        let file: CatalogFile = serde_json::from_slice(&bytes).map_err(|e| {
            CascadeError::serde(format!("parse pose catalog '{}': {e}", path.display()))
        })?;
        Self::from_poses(file.poses)
    }

    /// Resolve a built-in catalog name, or fall back to reading `spec` as a JSON file path.
    pub fn resolve(spec: &str) -> CascadeResult<Self> {
        match spec {
            "camera_tests" => Ok(camera_tests()),
            "framing_tests" => Ok(framing_tests()),
            other => Self::load_json(Path::new(other)),
        }
    }

    pub fn get_pose(&self, name: &str) -> CascadeResult<&CameraPose> {
        self.index
            .get(name)
            .map(|&i| &self.poses[i])
            .ok_or_else(|| CascadeError::not_found(format!("camera pose '{name}'")))
    }

    pub fn poses(&self) -> &[CameraPose] {
        &self.poses
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.poses.iter().map(|p| p.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.poses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }

    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }
}

fn pose(
    name: &str,
    loc: (f64, f64, f64),
    rot_deg: (f64, f64, f64),
    lens: f64,
    focus: f64,
) -> CameraPose {
    CameraPose::new(
        name,
        loc,
        Euler::degrees(rot_deg.0, rot_deg.1, rot_deg.2),
        lens,
        focus,
    )
}

fn builtin(poses: Vec<CameraPose>) -> PoseCatalog {
    let mut catalog = PoseCatalog::default();
    for p in poses {
        catalog.index.insert(p.name.clone(), catalog.poses.len());
        catalog.poses.push(p);
    }
    catalog
}

/// First-pass sweep: distance and lens variations around the front of the scene.
pub fn camera_tests() -> PoseCatalog {
    builtin(vec![
        pose("far_high", (0.0, -60.0, 45.0), (25.0, 0.0, 0.0), 35.0, 50.0),
        pose("medium_medium", (0.0, -40.0, 30.0), (35.0, 0.0, 0.0), 40.0, 40.0),
        pose("close_low", (0.0, -30.0, 20.0), (45.0, 0.0, 0.0), 50.0, 30.0),
        pose("very_far_high", (0.0, -80.0, 60.0), (20.0, 0.0, 0.0), 28.0, 70.0),
        pose("side_view", (20.0, -40.0, 30.0), (30.0, 15.0, 0.0), 35.0, 45.0),
        pose("wide_angle", (0.0, -50.0, 35.0), (30.0, 0.0, 0.0), 24.0, 50.0),
        pose("telephoto", (0.0, -70.0, 50.0), (25.0, 0.0, 0.0), 70.0, 60.0),
        pose("perfect_framing", (0.0, -55.0, 40.0), (28.0, 0.0, 0.0), 32.0, 55.0),
    ])
}

/// Second-pass sweep: composition variants (character, environment, balanced, dynamic,
/// cinematic).
pub fn framing_tests() -> PoseCatalog {
    builtin(vec![
        pose("perfect_center", (0.0, -55.0, 40.0), (28.0, 0.0, 0.0), 32.0, 55.0),
        pose("perfect_left", (-10.0, -50.0, 35.0), (30.0, 5.0, 0.0), 35.0, 50.0),
        pose("perfect_right", (10.0, -50.0, 35.0), (30.0, -5.0, 0.0), 35.0, 50.0),
        pose("character_close", (0.0, -40.0, 25.0), (35.0, 0.0, 0.0), 40.0, 40.0),
        pose("character_wide", (0.0, -60.0, 45.0), (25.0, 0.0, 0.0), 28.0, 60.0),
        pose("environment_wide", (0.0, -70.0, 50.0), (22.0, 0.0, 0.0), 24.0, 70.0),
        pose("environment_high", (0.0, -50.0, 60.0), (15.0, 0.0, 0.0), 35.0, 50.0),
        pose("balanced_1", (0.0, -45.0, 30.0), (32.0, 0.0, 0.0), 36.0, 45.0),
        pose("balanced_2", (0.0, -65.0, 40.0), (26.0, 0.0, 0.0), 30.0, 65.0),
        pose("balanced_3", (0.0, -55.0, 35.0), (30.0, 0.0, 0.0), 33.0, 55.0),
        pose("dynamic_left", (-15.0, -45.0, 30.0), (30.0, 10.0, 0.0), 35.0, 45.0),
        pose("dynamic_right", (15.0, -45.0, 30.0), (30.0, -10.0, 0.0), 35.0, 45.0),
        pose("cinematic_low", (0.0, -35.0, 20.0), (40.0, 0.0, 0.0), 45.0, 35.0),
        pose("cinematic_high", (0.0, -75.0, 55.0), (20.0, 0.0, 0.0), 25.0, 75.0),
    ])
}
