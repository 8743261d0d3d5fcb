use std::path::{Path, PathBuf};

use anyhow::Context as _;
use chrono::{DateTime, Utc};

use crate::error::{CascadeError, CascadeResult};

/// One rendered still, produced once per pose by a sweep.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RenderArtifact {
    pub pose_name: String,
    pub file_path: PathBuf,
    pub created_at: DateTime<Utc>,
}

impl RenderArtifact {
    /// Describe an existing render on disk. The pose name is the file stem with an optional
    /// `<prefix>_` removed.
    pub fn from_file(path: &Path, prefix: Option<&str>) -> CascadeResult<Self> {
        let meta = std::fs::metadata(path)
            .map_err(|_| CascadeError::missing_path("render", path))?;
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| {
                CascadeError::validation(format!("render '{}' has no file name", path.display()))
            })?;
        let pose_name = prefix
            .and_then(|p| stem.strip_prefix(p))
            .and_then(|rest| rest.strip_prefix('_'))
            .unwrap_or(stem)
            .to_string();
        let created_at = meta
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());
        Ok(Self {
            pose_name,
            file_path: path.to_path_buf(),
            created_at,
        })
    }
}

#[derive(Clone, Debug)]
pub struct RenderEntry {
    pub path: PathBuf,
    pub modified: DateTime<Utc>,
}

impl RenderEntry {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// PNG files directly inside `dir`, newest first (ties by name).
pub fn list_renders(dir: &Path) -> CascadeResult<Vec<RenderEntry>> {
    if !dir.is_dir() {
        return Err(CascadeError::missing_path("renders directory", dir));
    }
    let mut out = Vec::new();
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("read directory '{}'", dir.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("read directory '{}'", dir.display()))?;
        let path = entry.path();
        let is_png = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("png"));
        if !is_png || !path.is_file() {
            continue;
        }
        let modified = entry
            .metadata()
            .and_then(|m| m.modified())
            .map(DateTime::<Utc>::from)
            .with_context(|| format!("stat '{}'", path.display()))?;
        out.push(RenderEntry { path, modified });
    }
    out.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.path.cmp(&b.path)));
    Ok(out)
}

pub fn latest_render(dir: &Path) -> CascadeResult<RenderEntry> {
    list_renders(dir)?.into_iter().next().ok_or_else(|| {
        CascadeError::not_found(format!("PNG renders in '{}'", dir.display()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "cascade_{name}_{}_{}",
            std::process::id(),
            Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ))
    }

    #[test]
    fn pose_name_strips_prefix() {
        let dir = temp_dir("artifact_prefix");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("camera_test_wide_angle.png");
        std::fs::write(&path, b"png").unwrap();

        let a = RenderArtifact::from_file(&path, Some("camera_test")).unwrap();
        assert_eq!(a.pose_name, "wide_angle");
        let b = RenderArtifact::from_file(&path, None).unwrap();
        assert_eq!(b.pose_name, "camera_test_wide_angle");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn listing_ignores_non_png_and_missing_dir_errors() {
        let dir = temp_dir("artifact_list");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("a.png"), b"1").unwrap();
        std::fs::write(dir.join("notes.txt"), b"2").unwrap();
        std::fs::write(dir.join("B.PNG"), b"3").unwrap();

        let names: Vec<String> = list_renders(&dir)
            .unwrap()
            .iter()
            .map(RenderEntry::file_name)
            .collect();
        assert_eq!(names.len(), 2);
        assert!(!names.contains(&"notes.txt".to_string()));

        std::fs::remove_dir_all(&dir).ok();
        assert!(matches!(
            list_renders(&dir).unwrap_err(),
            CascadeError::NotFound(_)
        ));
    }
}
