//! The seam between the generation pipeline and the remote media API.

use crate::error::Result;
use crate::operation::Operation;
use crate::types::{AspectRatio, VideoConfig};
use async_trait::async_trait;

/// Remote media-generation service.
///
/// `None` from [`start_video`](Self::start_video) or
/// [`get_operation`](Self::get_operation) means the service answered
/// without a usable operation; transport and HTTP failures are `Err`.
#[async_trait]
pub trait MediaService: Send + Sync {
    /// One-shot image generation.
    async fn generate_content(
        &self,
        prompt: &str,
        aspect_ratio: AspectRatio,
    ) -> Result<Option<ContentResponse>>;

    /// Starts a long-running video generation.
    async fn start_video(&self, prompt: &str, config: &VideoConfig) -> Result<Option<Operation>>;

    /// Fetches the current state of an operation.
    async fn get_operation(&self, operation: &Operation) -> Result<Option<Operation>>;

    /// Authenticated GET of a generated media file.
    ///
    /// Non-2xx responses are returned, not raised; the caller decides.
    async fn download(&self, uri: &str) -> Result<DownloadedMedia>;
}

/// Result of an image generation call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentResponse {
    /// Candidate answers, best first.
    pub candidates: Vec<Candidate>,
}

/// One candidate answer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidate {
    /// Generated content.
    pub content: Option<Content>,
    /// Why generation stopped (e.g., `STOP`, `IMAGE_SAFETY`).
    pub finish_reason: Option<String>,
}

/// Content of a candidate. `parts` is `None` when the service omitted it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Content {
    /// Content parts, in order.
    pub parts: Option<Vec<Part>>,
}

/// A content part: text, inline binary data, or both absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Part {
    /// Text content.
    pub text: Option<String>,
    /// Binary content.
    pub inline_data: Option<InlineData>,
}

/// Base64-encoded binary data embedded in a response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineData {
    /// MIME type, when the service reports one.
    pub mime_type: Option<String>,
    /// Base64 payload.
    pub data: String,
}

/// Outcome of [`MediaService::download`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedMedia {
    /// HTTP status code.
    pub status: u16,
    /// Canonical reason phrase for `status`.
    pub status_text: String,
    /// Content-Type header, if sent.
    pub content_type: Option<String>,
    /// Response body.
    pub bytes: Vec<u8>,
}

impl DownloadedMedia {
    /// True for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
