//! In-place rewriting of a production render script's camera literals.
//!
//! Three statements are located by fixed patterns:
//!
//! - `bpy.ops.object.camera_add(location=(...), rotation=(...))`
//! - `camera.data.lens = <number>`
//! - `camera.data.dof.focus_distance = <number>`
//!
//! Every occurrence of a pattern is replaced with the same text. A pattern with no occurrences
//! leaves its field untouched and is reported as [`FieldPatch::replacements`] `== 0`; callers
//! decide whether that is fatal. The replacement text matches its own pattern, so applying the
//! same pose twice gives byte-identical output.

use std::{
    fmt,
    path::{Path, PathBuf},
    sync::LazyLock,
};

use anyhow::Context as _;
use regex::{NoExpand, Regex};

use crate::{
    camera::{catalog::PoseCatalog, pose::CameraPose},
    error::{CascadeError, CascadeResult},
};

type Pattern = LazyLock<Result<Regex, regex::Error>>;

// Rotation tuples contain nested calls (`math.radians(30)`), so the rotation group allows one
// level of parentheses.
static CAMERA_ADD: Pattern = LazyLock::new(|| {
    Regex::new(
        r"bpy\.ops\.object\.camera_add\(location=\([^()]*\),\s*rotation=\((?:[^()]|\([^()]*\))*\)\)",
    )
});
static LENS: Pattern = LazyLock::new(|| Regex::new(r"camera\.data\.lens = \d+(?:\.\d+)?"));
static FOCUS: Pattern =
    LazyLock::new(|| Regex::new(r"camera\.data\.dof\.focus_distance = \d+(?:\.\d+)?"));

fn compiled(pattern: &'static Pattern, field: PatchField) -> CascadeResult<&'static Regex> {
    LazyLock::force(pattern)
        .as_ref()
        .map_err(|e| CascadeError::pattern(format!("{field} pattern: {e}")))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PatchField {
    CameraAdd,
    Lens,
    FocusDistance,
}

impl fmt::Display for PatchField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::CameraAdd => "camera_add call",
            Self::Lens => "lens assignment",
            Self::FocusDistance => "focus distance assignment",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldPatch {
    pub field: PatchField,
    pub replacements: usize,
    pub value: String, // text written for each occurrence
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatchReport {
    pub script: PathBuf,
    pub pose_name: String,
    pub fields: [FieldPatch; 3],
    pub written: bool,
}

impl PatchReport {
    /// Fields whose pattern was not found.
    pub fn missing_fields(&self) -> impl Iterator<Item = PatchField> + '_ {
        self.fields
            .iter()
            .filter(|f| f.replacements == 0)
            .map(|f| f.field)
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().next().is_none()
    }
}

fn camera_add_call(pose: &CameraPose) -> String {
    format!(
        "bpy.ops.object.camera_add(location={}, rotation={})",
        pose.position.to_py_tuple(),
        pose.rotation.to_py_tuple()
    )
}

/// Apply `pose` to script text. Returns the new text and per-field counts.
pub fn patch_source(
    source: &str,
    pose: &CameraPose,
) -> CascadeResult<(String, [FieldPatch; 3])> {
    let rules: [(PatchField, &Regex, String); 3] = [
        (
            PatchField::CameraAdd,
            compiled(&CAMERA_ADD, PatchField::CameraAdd)?,
            camera_add_call(pose),
        ),
        (
            PatchField::Lens,
            compiled(&LENS, PatchField::Lens)?,
            format!("camera.data.lens = {}", pose.lens_literal()),
        ),
        (
            PatchField::FocusDistance,
            compiled(&FOCUS, PatchField::FocusDistance)?,
            format!("camera.data.dof.focus_distance = {}", pose.focus_literal()),
        ),
    ];

    let mut text = source.to_string();
    let fields = rules.map(|(field, re, value)| {
        let replacements = re.find_iter(&text).count();
        if replacements > 0 {
            text = re.replace_all(&text, NoExpand(&value)).into_owned();
        }
        FieldPatch {
            field,
            replacements,
            value,
        }
    });
    Ok((text, fields))
}

/// Rewrite `script` in place with `pose`'s camera values.
///
/// The file is only written when at least one field matched, and then through a sibling temp
/// file plus rename so a failed write never leaves a truncated script behind.
#[tracing::instrument(skip(pose), fields(pose = %pose.name))]
pub fn apply_pose(script: &Path, pose: &CameraPose) -> CascadeResult<PatchReport> {
    pose.validate()?;
    if !script.is_file() {
        return Err(CascadeError::missing_path("production script", script));
    }
    let source = std::fs::read_to_string(script)
        .with_context(|| format!("read script '{}'", script.display()))?;

    let (patched, fields) = patch_source(&source, pose)?;
    let matched = fields.iter().any(|f| f.replacements > 0);
    if matched {
        write_atomic(script, patched.as_bytes())?;
    }

    let report = PatchReport {
        script: script.to_path_buf(),
        pose_name: pose.name.clone(),
        fields,
        written: matched,
    };
    for field in report.missing_fields() {
        tracing::warn!(%field, "pattern not found; field left unchanged");
    }
    Ok(report)
}

/// Look `name` up in `catalog`, then [`apply_pose`]. An unknown name fails before the script is
/// opened.
pub fn apply_named_pose(
    script: &Path,
    catalog: &PoseCatalog,
    name: &str,
) -> CascadeResult<PatchReport> {
    let pose = catalog.get_pose(name)?;
    apply_pose(script, pose)
}

pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> CascadeResult<()> {
    let file_name = path
        .file_name()
        .ok_or_else(|| {
            CascadeError::validation(format!("'{}' is not a file path", path.display()))
        })?;
    let mut tmp_name = std::ffi::OsString::from(".");
    tmp_name.push(file_name);
    tmp_name.push(format!(".tmp-{}", std::process::id()));
    let tmp = path.with_file_name(tmp_name);

    // An existing target keeps its mode (e.g. an exec bit on a script).
    let permissions = std::fs::metadata(path).ok().map(|m| m.permissions());
    let result = std::fs::write(&tmp, bytes)
        .with_context(|| format!("write temp file '{}'", tmp.display()))
        .and_then(|()| match permissions {
            Some(perms) => std::fs::set_permissions(&tmp, perms)
                .with_context(|| format!("copy permissions to '{}'", tmp.display())),
            None => Ok(()),
        })
        .and_then(|()| {
            std::fs::rename(&tmp, path)
                .with_context(|| format!("replace '{}'", path.display()))
        });
    if result.is_err() {
        std::fs::remove_file(&tmp).ok();
    }
    result.map_err(CascadeError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::catalog::camera_tests;

    const SCRIPT: &str = "\
import bpy
import math

def setup_camera():
    bpy.ops.object.camera_add(location=(-15, -45, 30), rotation=(math.radians(30), math.radians(10), 0))
    camera = bpy.context.active_object
    camera.data.lens = 35  # Optimal lens for this framing
    camera.data.clip_start = 0.1
    camera.data.dof.use_dof = True
    camera.data.dof.focus_distance = 45.0
";

    fn wide_angle() -> CameraPose {
        camera_tests().get_pose("wide_angle").unwrap().clone()
    }

    #[test]
    fn wide_angle_replaces_literals_and_keeps_other_lines() {
        let (out, fields) = patch_source(SCRIPT, &wide_angle()).unwrap();
        assert!(fields.iter().all(|f| f.replacements == 1));

        let before: Vec<&str> = SCRIPT.lines().collect();
        let after: Vec<&str> = out.lines().collect();
        assert_eq!(before.len(), after.len());
        for (i, (b, a)) in before.iter().zip(&after).enumerate() {
            match i {
                4 => assert_eq!(
                    *a,
                    "    bpy.ops.object.camera_add(location=(0, -50, 35), rotation=(math.radians(30), 0, 0))"
                ),
                6 => assert_eq!(*a, "    camera.data.lens = 24  # Optimal lens for this framing"),
                9 => assert_eq!(*a, "    camera.data.dof.focus_distance = 50.0"),
                _ => assert_eq!(a, b),
            }
        }
    }

    #[test]
    fn applying_twice_is_byte_identical() {
        let pose = camera_tests().get_pose("side_view").unwrap().clone();
        let (once, _) = patch_source(SCRIPT, &pose).unwrap();
        let (twice, fields) = patch_source(&once, &pose).unwrap();
        assert_eq!(once, twice);
        assert!(fields.iter().all(|f| f.replacements == 1));
    }

    #[test]
    fn missing_lens_is_reported_not_silent() {
        let script = SCRIPT.replace("camera.data.lens = 35", "camera.data.sensor_width = 36");
        let (out, fields) = patch_source(&script, &wide_angle()).unwrap();
        assert_eq!(fields[1].field, PatchField::Lens);
        assert_eq!(fields[1].replacements, 0);
        assert!(out.contains("camera.data.sensor_width = 36"));
        assert_eq!(fields[0].replacements, 1);
    }

    #[test]
    fn every_occurrence_is_replaced() {
        let script = format!("{SCRIPT}{SCRIPT}");
        let (out, fields) = patch_source(&script, &wide_angle()).unwrap();
        assert!(fields.iter().all(|f| f.replacements == 2));
        assert_eq!(out.matches("camera.data.lens = 24").count(), 2);
    }

    #[test]
    fn fractional_values_stay_idempotent() {
        let mut pose = wide_angle();
        pose.focal_length_mm = 32.5;
        pose.focus_distance = 47.25;
        let (once, _) = patch_source(SCRIPT, &pose).unwrap();
        assert!(once.contains("camera.data.lens = 32.5  #"));
        let (twice, _) = patch_source(&once, &pose).unwrap();
        assert_eq!(once, twice);
    }

    #[cfg(unix)]
    #[test]
    fn rewrite_keeps_the_script_mode() {
        use std::os::unix::fs::PermissionsExt as _;

        let path = std::env::temp_dir().join(format!(
            "cascade_patch_mode_{}.py",
            std::process::id()
        ));
        std::fs::write(&path, SCRIPT).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();

        let report = apply_pose(&path, &wide_angle()).unwrap();
        assert!(report.written);
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
        std::fs::remove_file(&path).ok();
    }
}
