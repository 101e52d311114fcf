use std::fmt;

use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Unauthorized(Reply),

    #[error("{0}")]
    AccessDenied(Reply),

    #[error("{0}")]
    NotFound(Reply),

    #[error("{reply}")]
    Rejected { status: u16, reply: Reply },

    #[error("Server error: {0}")]
    ServerError(Reply),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Body of a non-2xx response. `detail` is set only when the body followed
/// the `{"detail": ...}` convention; `body` keeps the truncated raw text.
#[derive(Debug, Clone)]
pub struct Reply {
    pub detail: Option<String>,
    pub body: String,
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            Some(detail) => f.write_str(detail),
            None => f.write_str(&self.body),
        }
    }
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Error body convention of the backend: `{"detail": "..."}`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Pull `detail` out of an error body. Validation errors carry a list
    /// instead of a string; those are rendered as compact JSON.
    fn parse_detail(body: &str) -> Option<String> {
        let parsed: ErrorBody = serde_json::from_str(body).ok()?;
        match parsed.detail {
            serde_json::Value::String(s) => Some(s),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let reply = Reply {
            detail: Self::parse_detail(body),
            body: Self::truncate_body(body),
        };
        match status.as_u16() {
            401 => ApiError::Unauthorized(reply),
            403 => ApiError::AccessDenied(reply),
            404 => ApiError::NotFound(reply),
            500..=599 => ApiError::ServerError(reply),
            code @ 400..=499 => ApiError::Rejected {
                status: code,
                reply,
            },
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, reply)),
        }
    }

    /// The server-provided message, if the server sent one.
    pub fn detail(&self) -> Option<&str> {
        let reply = match self {
            ApiError::Unauthorized(reply)
            | ApiError::AccessDenied(reply)
            | ApiError::NotFound(reply)
            | ApiError::ServerError(reply)
            | ApiError::Rejected { reply, .. } => reply,
            ApiError::NetworkError(_) | ApiError::InvalidResponse(_) => return None,
        };
        reply.detail.as_deref().filter(|d| !d.is_empty())
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }
}

/// Message to show the user for a failed request: the server's `detail`
/// verbatim when present, otherwise `fallback`.
pub fn user_message(err: &anyhow::Error, fallback: &str) -> String {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<ApiError>())
        .and_then(ApiError::detail)
        .map(str::to_string)
        .unwrap_or_else(|| fallback.to_string())
}
