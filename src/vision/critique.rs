use crate::{
    error::{CascadeError, CascadeResult},
    render::artifacts::RenderArtifact,
    vision::{
        client::{ResponseFormat, VisionModel, VisionRequest, ensure_readable_image},
        prompts,
    },
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CritiqueMode {
    /// Free text, printed for a person to read.
    #[default]
    FreeText,
    /// JSON with an `overall_score`, for automatic selection.
    Scored,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CritiqueResult {
    pub artifact: RenderArtifact,
    pub raw_text: String,
    /// Only present for [`CritiqueMode::Scored`] replies that parsed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
pub struct StructuredCritique {
    pub overall_score: f64,
    #[serde(default)]
    pub summary: String,
}

/// Parse a scored reply. Models sometimes wrap the object in prose or code fences, so the
/// outermost `{...}` span is used.
pub fn parse_structured(text: &str) -> CascadeResult<StructuredCritique> {
    let start = text.find('{');
    let end = text.rfind('}');
    let json = match (start, end) {
        (Some(s), Some(e)) if s < e => &text[s..=e],
        _ => {
            return Err(CascadeError::serde(
                "scored critique contains no JSON object",
            ));
        }
    };
    let parsed: StructuredCritique = serde_json::from_str(json)
        .map_err(|e| CascadeError::serde(format!("scored critique is not valid JSON: {e}")))?;
    if !(0.0..=10.0).contains(&parsed.overall_score) {
        return Err(CascadeError::serde(format!(
            "overall_score {} is outside 0..=10",
            parsed.overall_score
        )));
    }
    Ok(parsed)
}

#[derive(Debug)]
pub struct SkippedCritique {
    pub pose_name: String,
    pub error: CascadeError,
}

#[derive(Debug, Default)]
pub struct CritiqueBatch {
    pub results: Vec<CritiqueResult>,
    pub skipped: Vec<SkippedCritique>,
}

/// Critique one artifact.
pub fn critique_artifact(
    model: &dyn VisionModel,
    artifact: &RenderArtifact,
    rubric: &str,
    mode: CritiqueMode,
) -> CascadeResult<CritiqueResult> {
    let image = artifact.file_path.as_path();
    match mode {
        CritiqueMode::FreeText => {
            let raw_text = model.critique(image, rubric)?;
            Ok(CritiqueResult {
                artifact: artifact.clone(),
                raw_text,
                score: None,
            })
        }
        CritiqueMode::Scored => {
            ensure_readable_image(image)?;
            let prompt = prompts::scored(rubric);
            let raw_text = model.generate(VisionRequest {
                prompt: &prompt,
                images: &[image],
                format: ResponseFormat::Json,
            })?;
            let score = match parse_structured(&raw_text) {
                Ok(s) => Some(s.overall_score),
                Err(err) => {
                    tracing::warn!(pose = %artifact.pose_name, error = %err, "unscored critique");
                    None
                }
            };
            Ok(CritiqueResult {
                artifact: artifact.clone(),
                raw_text,
                score,
            })
        }
    }
}

/// Critique every artifact in order, one request at a time.
///
/// A failure only affects its own artifact: it is recorded in `skipped` and the batch moves on.
pub fn critique_artifacts(
    model: &dyn VisionModel,
    artifacts: &[RenderArtifact],
    rubric: &str,
    mode: CritiqueMode,
) -> CritiqueBatch {
    let mut batch = CritiqueBatch::default();
    for artifact in artifacts {
        tracing::info!(pose = %artifact.pose_name, "requesting critique");
        match critique_artifact(model, artifact, rubric, mode) {
            Ok(result) => batch.results.push(result),
            Err(error) => {
                tracing::warn!(pose = %artifact.pose_name, %error, "critique skipped");
                batch.skipped.push(SkippedCritique {
                    pose_name: artifact.pose_name.clone(),
                    error,
                });
            }
        }
    }
    batch
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_reply_parses_through_code_fences() {
        let text = "```json\n{\"overall_score\": 8, \"summary\": \"balanced\"}\n```";
        let parsed = parse_structured(text).unwrap();
        assert_eq!(parsed.overall_score, 8.0);
        assert_eq!(parsed.summary, "balanced");
    }

    #[test]
    fn structured_reply_rejects_prose_and_out_of_range() {
        assert!(parse_structured("Overall score: 8/10").is_err());
        assert!(parse_structured("{\"overall_score\": 42}").is_err());
        assert!(parse_structured("{\"summary\": \"no score\"}").is_err());
    }
}
