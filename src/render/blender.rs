use std::{
    path::{Path, PathBuf},
    process::{Command, Stdio},
    sync::atomic::{AtomicU64, Ordering},
};

use anyhow::Context as _;

use crate::{
    config::BlenderConfig,
    error::{CascadeError, CascadeResult},
    render::{
        backend::{RenderBackend, RenderSettings},
        bpy::scene_script,
    },
    scene::document::Document,
};

/// Environment variable consulted before `PATH` when locating Blender.
pub const BLENDER_ENV: &str = "BLENDER";

static SCRIPT_COUNTER: AtomicU64 = AtomicU64::new(0);

fn well_known_locations() -> Vec<PathBuf> {
    let mut out = Vec::new();
    if cfg!(windows) {
        let foundation = PathBuf::from(r"C:\Program Files\Blender Foundation");
        out.push(foundation.join("Blender").join("blender.exe"));
        for v in ["4.2", "4.1", "4.0", "3.6", "3.5", "3.4", "3.3"] {
            out.push(foundation.join(format!("Blender {v}")).join("blender.exe"));
        }
        if let Some(local) = std::env::var_os("LOCALAPPDATA") {
            out.push(
                PathBuf::from(local)
                    .join("Programs")
                    .join("Blender Foundation")
                    .join("Blender")
                    .join("blender.exe"),
            );
        }
        out.push(PathBuf::from(
            r"C:\Program Files (x86)\Steam\steamapps\common\Blender\blender.exe",
        ));
        out.push(PathBuf::from(r"C:\blender\blender.exe"));
    } else if cfg!(target_os = "macos") {
        out.push(PathBuf::from(
            "/Applications/Blender.app/Contents/MacOS/Blender",
        ));
    } else {
        out.push(PathBuf::from("/usr/bin/blender"));
        out.push(PathBuf::from("/usr/local/bin/blender"));
        out.push(PathBuf::from("/snap/bin/blender"));
        out.push(PathBuf::from("/opt/blender/blender"));
    }
    out
}

pub fn is_blender_on_path() -> bool {
    Command::new("blender")
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Resolve the Blender executable: config, then `$BLENDER`, then `PATH`, then well-known
/// install locations.
pub fn locate_blender(cfg: &BlenderConfig) -> CascadeResult<PathBuf> {
    if let Some(exe) = &cfg.executable {
        if exe.is_file() {
            return Ok(exe.clone());
        }
        return Err(CascadeError::missing_path(
            "configured Blender executable",
            exe,
        ));
    }

    if let Some(exe) = std::env::var_os(BLENDER_ENV).map(PathBuf::from) {
        if exe.is_file() {
            return Ok(exe);
        }
        tracing::warn!(path = %exe.display(), "{BLENDER_ENV} does not point at a file; ignoring");
    }

    if is_blender_on_path() {
        return Ok(PathBuf::from("blender"));
    }

    well_known_locations()
        .into_iter()
        .find(|p| p.is_file())
        .ok_or_else(|| {
            CascadeError::not_found(format!(
                "Blender executable (set blender.executable in the config, export {BLENDER_ENV}, \
                 or put `blender` on PATH)"
            ))
        })
}

pub fn ensure_parent_dir(path: &Path) -> CascadeResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Renders by writing a `bpy` script and running Blender headless on it.
///
/// Each call is a fresh Blender process, so every render starts from the same generated scene.
pub struct BlenderBackend {
    executable: PathBuf,
    extra_args: Vec<String>,
    settings: RenderSettings,
    script_dir: PathBuf,
}

impl BlenderBackend {
    pub fn new(cfg: &BlenderConfig, settings: RenderSettings) -> CascadeResult<Self> {
        settings.validate()?;
        Ok(Self {
            executable: locate_blender(cfg)?,
            extra_args: cfg.extra_args.clone(),
            settings,
            script_dir: std::env::temp_dir(),
        })
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    fn write_script(&self, script: &str) -> CascadeResult<PathBuf> {
        let n = SCRIPT_COUNTER.fetch_add(1, Ordering::Relaxed);
        let path = self
            .script_dir
            .join(format!("cascade_render_{}_{n}.py", std::process::id()));
        std::fs::write(&path, script)
            .with_context(|| format!("write render script '{}'", path.display()))?;
        Ok(path)
    }
}

impl RenderBackend for BlenderBackend {
    #[tracing::instrument(skip(self, doc), fields(out = %out_path.display()))]
    fn render_still(&mut self, doc: &Document, out_path: &Path) -> CascadeResult<()> {
        ensure_parent_dir(out_path)?;
        let script = scene_script(doc, &self.settings, Some(out_path))?;
        let script_path = self.write_script(&script)?;

        // `--python-exit-code` makes a Python exception inside the script fail the process;
        // without it Blender exits 0 and the error only shows up as a missing file.
        let output = Command::new(&self.executable)
            .args([
                "--background",
                "--factory-startup",
                "--python-exit-code",
                "1",
                "--python",
            ])
            .arg(&script_path)
            .args(&self.extra_args)
            .stdin(Stdio::null())
            .output();
        std::fs::remove_file(&script_path).ok();

        let output = output.map_err(|e| {
            CascadeError::render(format!(
                "failed to spawn Blender '{}': {e}",
                self.executable.display()
            ))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CascadeError::render(format!(
                "Blender exited with status {}: {}",
                output.status,
                tail(stderr.trim(), 20)
            )));
        }
        if !out_path.is_file() {
            return Err(CascadeError::render(format!(
                "Blender finished but did not write '{}'",
                out_path.display()
            )));
        }

        tracing::debug!("render complete");
        Ok(())
    }
}

/// Last `n` lines of `text`.
fn tail(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_missing_executable_is_not_found() {
        let cfg = BlenderConfig {
            executable: Some(PathBuf::from("/definitely/not/blender")),
            extra_args: vec![],
        };
        let err = locate_blender(&cfg).unwrap_err();
        assert!(matches!(err, CascadeError::NotFound(_)));
    }

    #[test]
    fn tail_keeps_last_lines() {
        assert_eq!(tail("a\nb\nc", 2), "b\nc");
        assert_eq!(tail("a", 5), "a");
        assert_eq!(tail("", 3), "");
    }

    #[test]
    fn ensure_parent_dir_accepts_bare_file_names() {
        ensure_parent_dir(Path::new("render.png")).unwrap();
    }
}
