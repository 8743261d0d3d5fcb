use std::io::{BufRead, Write};

use anyhow::Context as _;

use crate::{
    camera::{catalog::PoseCatalog, pose::CameraPose},
    error::{CascadeError, CascadeResult},
    vision::critique::{CritiqueMode, CritiqueResult},
};

/// Picks exactly one pose name out of `candidates`.
///
/// `critiques` may be empty (no vision model reachable); selectors must still decide.
pub trait PoseSelector {
    fn select(
        &mut self,
        candidates: &[CameraPose],
        critiques: &[CritiqueResult],
    ) -> CascadeResult<String>;
}

/// A decision made ahead of time, e.g. from a `--select <pose>` flag.
#[derive(Clone, Debug)]
pub struct FixedSelector {
    pose: String,
}

impl FixedSelector {
    pub fn new(pose: impl Into<String>) -> Self {
        Self { pose: pose.into() }
    }
}

impl PoseSelector for FixedSelector {
    fn select(&mut self, candidates: &[CameraPose], _: &[CritiqueResult]) -> CascadeResult<String> {
        if candidates.iter().any(|p| p.name == self.pose) {
            Ok(self.pose.clone())
        } else {
            Err(CascadeError::not_found(format!(
                "camera pose '{}' among the sweep candidates",
                self.pose
            )))
        }
    }
}

/// Deterministic max-by-score over structured critiques.
#[derive(Clone, Copy, Debug, Default)]
pub struct ScoreSelector;

impl PoseSelector for ScoreSelector {
    fn select(
        &mut self,
        candidates: &[CameraPose],
        critiques: &[CritiqueResult],
    ) -> CascadeResult<String> {
        select_best_by_score(candidates, critiques)
    }
}

/// Highest `score` wins; equal scores resolve to the candidate listed first. Critiques for poses
/// outside `candidates` and unscored critiques are ignored.
pub fn select_best_by_score(
    candidates: &[CameraPose],
    critiques: &[CritiqueResult],
) -> CascadeResult<String> {
    let mut best: Option<(usize, f64)> = None;
    for c in critiques {
        let Some(score) = c.score else {
            continue;
        };
        let Some(idx) = candidates
            .iter()
            .position(|p| p.name == c.artifact.pose_name)
        else {
            continue;
        };
        best = match best {
            Some((bi, bs)) if bs > score || (bs == score && bi < idx) => Some((bi, bs)),
            _ => Some((idx, score)),
        };
    }
    best.map(|(idx, _)| candidates[idx].name.clone())
        .ok_or_else(|| {
            CascadeError::validation(
                "no scored critiques to select from; rerun with scored critiques or select manually",
            )
        })
}

/// How a workflow run picks its pose, as given on the command line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectionStrategy {
    Manual,
    Score,
    Fixed(String),
}

impl SelectionStrategy {
    /// `manual`, `score`, or a pose name that must exist in `catalog`.
    pub fn parse(value: &str, catalog: &PoseCatalog) -> CascadeResult<Self> {
        match value {
            "manual" => Ok(Self::Manual),
            "score" => Ok(Self::Score),
            pose => catalog
                .get_pose(pose)
                .map(|p| Self::Fixed(p.name.clone())),
        }
    }

    pub fn critique_mode(&self) -> CritiqueMode {
        match self {
            Self::Score => CritiqueMode::Scored,
            Self::Manual | Self::Fixed(_) => CritiqueMode::FreeText,
        }
    }
}

/// One block per critique: `=== <pose> ===`, the score if any, then the text.
pub fn write_critiques<W: Write>(
    mut out: W,
    critiques: &[CritiqueResult],
) -> std::io::Result<()> {
    for c in critiques {
        writeln!(out, "=== {} ===", c.artifact.pose_name)?;
        if let Some(score) = c.score {
            writeln!(out, "score: {score}")?;
        }
        writeln!(out, "{}", c.raw_text.trim())?;
        writeln!(out)?;
    }
    Ok(())
}

/// Prints the critiques and asks on `output`/`input` for a number or a pose name.
pub struct ManualSelector<R, W> {
    input: R,
    output: W,
    max_attempts: usize,
}

impl<R: BufRead, W: Write> ManualSelector<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            max_attempts: 3,
        }
    }

    fn show(&mut self, candidates: &[CameraPose], critiques: &[CritiqueResult]) -> anyhow::Result<()> {
        let out = &mut self.output;
        write_critiques(&mut *out, critiques)?;
        writeln!(out, "Available camera poses:")?;
        for (i, p) in candidates.iter().enumerate() {
            writeln!(out, "  {}. {}", i + 1, p.name)?;
        }
        Ok(())
    }

    fn parse_choice<'a>(candidates: &'a [CameraPose], line: &str) -> Option<&'a CameraPose> {
        let line = line.trim();
        if let Ok(n) = line.parse::<usize>() {
            return n.checked_sub(1).and_then(|i| candidates.get(i));
        }
        candidates.iter().find(|p| p.name == line)
    }
}

impl<R: BufRead, W: Write> PoseSelector for ManualSelector<R, W> {
    fn select(
        &mut self,
        candidates: &[CameraPose],
        critiques: &[CritiqueResult],
    ) -> CascadeResult<String> {
        if candidates.is_empty() {
            return Err(CascadeError::validation("no candidate poses to choose from"));
        }
        self.show(candidates, critiques)
            .context("write selection menu")?;

        for _ in 0..self.max_attempts {
            write!(self.output, "Select a pose (number or name): ")
                .and_then(|()| self.output.flush())
                .context("write selection prompt")?;
            let mut line = String::new();
            let read = self
                .input
                .read_line(&mut line)
                .context("read selection")?;
            if read == 0 {
                break;
            }
            match Self::parse_choice(candidates, &line) {
                Some(pose) => return Ok(pose.name.clone()),
                None => {
                    writeln!(self.output, "Invalid choice '{}'", line.trim())
                        .context("write selection prompt")?;
                }
            }
        }
        Err(CascadeError::validation("no camera pose was selected"))
    }
}
