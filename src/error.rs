use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("session expired")]
    Unauthorized,

    #[error("request rejected with status {status}")]
    Rejected { status: u16, detail: Option<String> },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("could not decode response: {0}")]
    Decode(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    SessionExpired,
    Rejected,
    Unavailable,
}

impl ApiError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ApiError::Unauthorized => FailureKind::SessionExpired,
            ApiError::Rejected { .. } => FailureKind::Rejected,
            ApiError::Transport(_) | ApiError::Decode(_) => FailureKind::Unavailable,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }

    /// Server-provided reason, if the response carried one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::Rejected { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    /// `"<prefix>: <detail>"`, falling back to `fallback` when the server gave no reason.
    pub fn reason_or(&self, prefix: &str, fallback: &str) -> String {
        format!("{}: {}", prefix, self.detail().unwrap_or(fallback))
    }

    pub fn from_status(status: u16, body: &str) -> Self {
        if status == 401 {
            return ApiError::Unauthorized;
        }
        Self::rejected(status, body)
    }

    /// Like [`ApiError::from_status`] but never treats the status as a lost session.
    pub fn rejected(status: u16, body: &str) -> Self {
        ApiError::Rejected {
            status,
            detail: parse_detail(body),
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
}

// FastAPI puts validation failures in `detail` as a list of objects; only a
// plain string is worth showing verbatim.
fn parse_detail(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    match parsed.detail? {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s),
        _ => None,
    }
}
