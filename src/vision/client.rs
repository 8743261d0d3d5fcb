use std::{path::Path, time::Duration};

use anyhow::Context as _;
use base64::Engine as _;

use crate::{
    config::VisionConfig,
    error::{CascadeError, CascadeResult},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResponseFormat {
    #[default]
    Text,
    /// Ask the server to constrain output to JSON.
    Json,
}

#[derive(Clone, Copy, Debug)]
pub struct VisionRequest<'a> {
    pub prompt: &'a str,
    pub images: &'a [&'a Path],
    pub format: ResponseFormat,
}

/// A vision-language model that answers a prompt about one or more images.
///
/// `generate` is the only required method. `critique` and `compare` check their inputs first, so
/// every implementation gets the same "file exists and decodes as an image" precondition.
pub trait VisionModel {
    fn generate(&self, request: VisionRequest<'_>) -> CascadeResult<String>;

    fn critique(&self, image: &Path, prompt: &str) -> CascadeResult<String> {
        ensure_readable_image(image)?;
        self.generate(VisionRequest {
            prompt,
            images: &[image],
            format: ResponseFormat::Text,
        })
    }

    fn compare(&self, a: &Path, b: &Path, prompt: &str) -> CascadeResult<String> {
        ensure_readable_image(a)?;
        ensure_readable_image(b)?;
        self.generate(VisionRequest {
            prompt,
            images: &[a, b],
            format: ResponseFormat::Text,
        })
    }
}

/// Fails with `NotFound` when `path` is missing and `Validation` when it does not decode as an
/// image header.
pub fn ensure_readable_image(path: &Path) -> CascadeResult<()> {
    if !path.is_file() {
        return Err(CascadeError::missing_path("image", path));
    }
    image::ImageReader::open(path)
        .with_context(|| format!("open image '{}'", path.display()))?
        .with_guessed_format()
        .with_context(|| format!("read image '{}'", path.display()))?
        .into_dimensions()
        .map_err(|e| {
            CascadeError::validation(format!(
                "'{}' is not a readable image: {e}",
                path.display()
            ))
        })?;
    Ok(())
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ModelInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

#[derive(serde::Serialize)]
struct GenerateBody<'a> {
    model: &'a str,
    prompt: &'a str,
    images: Vec<String>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
}

#[derive(serde::Deserialize)]
struct GenerateReply {
    response: Option<String>,
}

#[derive(serde::Deserialize)]
struct TagsReply {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

/// Blocking client for an Ollama-compatible server (`/api/generate`, `/api/tags`).
///
/// One request at a time, no retries. Timeouts come from [`VisionConfig`] and scale with the
/// number of attached images.
pub struct OllamaClient {
    http: reqwest::blocking::Client,
    base_url: String,
    cfg: VisionConfig,
}

impl OllamaClient {
    pub fn new(cfg: &VisionConfig) -> CascadeResult<Self> {
        let http = reqwest::blocking::Client::builder()
            .build()
            .map_err(|e| CascadeError::service(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            cfg: cfg.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.cfg.model
    }

    /// `GET /api/tags`: the models the server has pulled.
    #[tracing::instrument(skip(self), fields(url = %self.base_url))]
    pub fn list_models(&self) -> CascadeResult<Vec<ModelInfo>> {
        let url = format!("{}/api/tags", self.base_url);
        let timeout = Duration::from_secs(self.cfg.health_timeout_secs);
        let resp = self
            .http
            .get(&url)
            .timeout(timeout)
            .send()
            .map_err(|e| map_transport_error(&url, timeout, e))?;
        let resp = check_status(resp)?;
        let tags: TagsReply = resp
            .json()
            .map_err(|e| CascadeError::service(format!("invalid JSON from {url}: {e}")))?;
        Ok(tags.models)
    }

    fn encode_image(path: &Path) -> CascadeResult<String> {
        let bytes =
            std::fs::read(path).with_context(|| format!("read image '{}'", path.display()))?;
        Ok(base64::engine::general_purpose::STANDARD.encode(bytes))
    }
}

impl VisionModel for OllamaClient {
    #[tracing::instrument(skip_all, fields(model = %self.cfg.model, images = request.images.len()))]
    fn generate(&self, request: VisionRequest<'_>) -> CascadeResult<String> {
        let images = request
            .images
            .iter()
            .map(|p| Self::encode_image(p))
            .collect::<CascadeResult<Vec<_>>>()?;
        let body = GenerateBody {
            model: &self.cfg.model,
            prompt: request.prompt,
            images,
            stream: false,
            format: match request.format {
                ResponseFormat::Text => None,
                ResponseFormat::Json => Some("json"),
            },
        };

        let url = format!("{}/api/generate", self.base_url);
        let timeout = self.cfg.timeout_for(request.images.len());
        tracing::debug!(timeout_secs = timeout.as_secs(), "sending generate request");
        let resp = self
            .http
            .post(&url)
            .timeout(timeout)
            .json(&body)
            .send()
            .map_err(|e| map_transport_error(&url, timeout, e))?;
        let resp = check_status(resp)?;
        let reply: GenerateReply = resp
            .json()
            .map_err(|e| CascadeError::service(format!("invalid JSON from {url}: {e}")))?;
        reply
            .response
            .ok_or_else(|| CascadeError::service(format!("{url} returned no `response` field")))
    }
}

fn check_status(
    resp: reqwest::blocking::Response,
) -> CascadeResult<reqwest::blocking::Response> {
    let status = resp.status();
    if status == reqwest::StatusCode::OK {
        return Ok(resp);
    }
    let message = match resp.text() {
        Ok(body) => body.trim().to_string(),
        Err(e) => format!("{status} (response body unreadable: {e})"),
    };
    Err(CascadeError::http_status(status.as_u16(), message))
}

fn map_transport_error(url: &str, timeout: Duration, e: reqwest::Error) -> CascadeError {
    if e.is_timeout() {
        CascadeError::service(format!(
            "request to {url} timed out after {}s",
            timeout.as_secs()
        ))
    } else if e.is_connect() {
        CascadeError::service(format!(
            "cannot connect to {url} (is `ollama serve` running?): {e}"
        ))
    } else {
        CascadeError::service(format!("request to {url} failed: {e}"))
    }
}
