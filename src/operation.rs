//! Long-running operation state as reported by the service.

use crate::error::ServiceError;

/// A server-side video generation job.
///
/// Operations are never mutated locally: every state change comes from a
/// fresh copy fetched from the service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Operation {
    /// Opaque handle used to refresh the operation (e.g., `models/.../operations/abc`).
    pub name: String,
    /// True once the job has finished, successfully or not.
    pub done: bool,
    /// Present only when done.
    pub response: Option<OperationResponse>,
    /// Failure reported by the service.
    pub error: Option<ServiceError>,
}

impl Operation {
    /// A freshly submitted, unfinished operation.
    pub fn pending(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// The download location of the first generated video, if any.
    pub fn download_uri(&self) -> Option<&str> {
        self.response
            .as_ref()?
            .generated_videos
            .first()?
            .video
            .as_ref()?
            .uri
            .as_deref()
            .filter(|uri| !uri.is_empty())
    }
}

/// Payload of a finished operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationResponse {
    /// Generated videos, in order.
    pub generated_videos: Vec<GeneratedVideo>,
    /// Number of videos removed by content filters.
    pub rai_media_filtered_count: Option<u32>,
    /// Reasons given by the content filters.
    pub rai_media_filtered_reasons: Vec<String>,
}

/// One entry of [`OperationResponse::generated_videos`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedVideo {
    /// The video file, if one was produced.
    pub video: Option<VideoFile>,
}

/// A remote video file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoFile {
    /// Download location.
    pub uri: Option<String>,
    /// MIME type, when reported.
    pub mime_type: Option<String>,
}
