use std::path::Path;

pub type CascadeResult<T> = Result<T, CascadeError>;

#[derive(thiserror::Error, Debug)]
pub enum CascadeError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("{}", fmt_service(.status, .message))]
    Service {
        status: Option<u16>,
        message: String,
    },

    #[error("render error: {0}")]
    Render(String),

    #[error("pattern error: {0}")]
    Pattern(String),

    #[error("serialization error: {0}")]
    Serde(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn fmt_service(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("service error (HTTP {code}): {message}"),
        None => format!("service error: {message}"),
    }
}

impl CascadeError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn missing_path(what: &str, path: &Path) -> Self {
        Self::NotFound(format!("{what} '{}'", path.display()))
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn service(msg: impl Into<String>) -> Self {
        Self::Service {
            status: None,
            message: msg.into(),
        }
    }

    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::Service {
            status: Some(status),
            message: body.into(),
        }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn pattern(msg: impl Into<String>) -> Self {
        Self::Pattern(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// External-service and host-tool failures affect one pose only; the workflow skips it
    /// and moves on.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Service { .. } | Self::Render(_))
    }
}
