//! Submits generation requests to the service.

use crate::error::{GenError, Result};
use crate::operation::Operation;
use crate::service::{ContentResponse, MediaService};
use crate::types::{GeneratedImage, GenerationMode, GenerationRequest, VideoConfig};
use std::sync::Arc;

/// What a submission produced.
#[derive(Debug, Clone)]
pub enum Submission {
    /// Images come back in one call.
    Image(GeneratedImage),
    /// Videos come back as an operation to poll.
    Operation(Operation),
}

/// Sends a [`GenerationRequest`] to the service. Never retries.
#[derive(Clone)]
pub struct RequestInitiator {
    service: Arc<dyn MediaService>,
}

impl RequestInitiator {
    /// Creates an initiator over `service`.
    pub fn new(service: Arc<dyn MediaService>) -> Self {
        Self { service }
    }

    /// Submits the request.
    pub async fn submit(&self, request: &GenerationRequest) -> Result<Submission> {
        match request.mode() {
            GenerationMode::Image => {
                let response = self
                    .service
                    .generate_content(request.prompt(), request.aspect_ratio())
                    .await?;
                let image = extract_image(response)?;
                tracing::info!(mime = %image.mime_type, "image generated");
                Ok(Submission::Image(image))
            }
            GenerationMode::Video => {
                let config = VideoConfig::single(request.resolution().unwrap_or_default());
                let operation = self
                    .service
                    .start_video(request.prompt(), &config)
                    .await?
                    .ok_or(GenError::StartFailed)?;
                tracing::info!(
                    operation = %operation.name,
                    resolution = %config.resolution,
                    "video generation started"
                );
                Ok(Submission::Operation(operation))
            }
        }
    }
}

/// Picks the first inline data part of the first candidate.
fn extract_image(response: Option<ContentResponse>) -> Result<GeneratedImage> {
    let candidate = response
        .and_then(|r| r.candidates.into_iter().next())
        .ok_or(GenError::EmptyResponse)?;

    let parts = candidate
        .content
        .and_then(|c| c.parts)
        .ok_or(GenError::MalformedResponse)?;

    let inline = parts
        .into_iter()
        .find_map(|p| p.inline_data)
        .ok_or(GenError::NoPayload)?;

    let mime_type = inline
        .mime_type
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| "image/png".to_string());

    Ok(GeneratedImage::from_base64(mime_type, &inline.data))
}
