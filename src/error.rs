//! Error types for media generation.

use std::fmt;
use std::time::Duration;

/// Raw error details reported by the service on a finished operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceError {
    /// Service status code (google.rpc.Code), if any.
    pub code: Option<i32>,
    /// Service message, if any.
    pub message: Option<String>,
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.code, self.message.as_deref()) {
            (Some(code), Some(msg)) => write!(f, "{code}: {msg}"),
            (Some(code), None) => write!(f, "code {code}"),
            (None, Some(msg)) => write!(f, "{msg}"),
            (None, None) => write!(f, "unknown service error"),
        }
    }
}

fn describe(service_error: &Option<ServiceError>) -> String {
    service_error
        .as_ref()
        .map(|e| format!(" ({e})"))
        .unwrap_or_default()
}

fn filtered_note(filtered: &u32) -> String {
    if *filtered > 0 {
        format!(", {filtered} video(s) filtered by content policy")
    } else {
        String::new()
    }
}

/// Errors that can occur during media generation.
#[derive(Debug, thiserror::Error)]
pub enum GenError {
    /// Image call returned no candidates.
    #[error("no image generated: the API returned an empty response")]
    EmptyResponse,

    /// Image candidate lacks content parts.
    #[error("invalid response structure: candidate has no content parts")]
    MalformedResponse,

    /// No content part carries inline image data.
    #[error("no image data returned: the response did not contain inline data")]
    NoPayload,

    /// The service did not return an operation for a video request.
    #[error("video generation failed to start")]
    StartFailed,

    /// A status refresh returned no operation.
    #[error("video generation operation lost after {attempt} poll(s)")]
    OperationLost { attempt: u32 },

    /// The operation finished without a response payload.
    #[error("video generation completed but no response was returned{}", describe(.service_error))]
    NoResponse { service_error: Option<ServiceError> },

    /// The response has no download location. Covers both service errors
    /// and content-policy rejections.
    #[error("no download URI returned{}{}", describe(.service_error), filtered_note(.filtered))]
    NoDownloadUri {
        service_error: Option<ServiceError>,
        filtered: u32,
    },

    /// The media download returned a non-2xx status.
    #[error("failed to download video: {status} {status_text}")]
    DownloadFailed { status: u16, status_text: String },

    /// Polling exceeded the configured wall-clock or attempt bound.
    #[error("operation timed out after {elapsed:?} ({attempts} poll(s))")]
    Timeout { elapsed: Duration, attempts: u32 },

    /// The caller cancelled the wait.
    #[error("generation cancelled")]
    Cancelled,

    /// Invalid request parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// API key missing or invalid.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Rate limit exceeded.
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error (e.g., saving file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GenError {
    /// Returns true if the caller cancelled the generation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns the HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::DownloadFailed { status, .. } | Self::Api { status, .. } => Some(*status),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Result type alias for media generation operations.
pub type Result<T> = std::result::Result<T, GenError>;

/// Reads a `Retry-After` header expressed in seconds.
pub(crate) fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// Pulls the `error.message` out of a JSON error body and caps its length.
pub(crate) fn sanitize_error_message(text: &str) -> String {
    const MAX_LEN: usize = 500;

    let message = serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| text.trim().to_string());

    if message.chars().count() > MAX_LEN {
        let truncated: String = message.chars().take(MAX_LEN).collect();
        format!("{truncated}...")
    } else {
        message
    }
}
