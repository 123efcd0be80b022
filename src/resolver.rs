//! Turns a finished operation into a local media handle.

use crate::error::{GenError, Result};
use crate::operation::Operation;
use crate::progress::{ProgressEvent, ProgressSender};
use crate::service::MediaService;
use crate::store::{MediaHandle, MediaStore};
use std::sync::Arc;

const DEFAULT_VIDEO_MIME: &str = "video/mp4";

/// Downloads the video of a finished operation into a [`MediaStore`].
#[derive(Clone)]
pub struct ResultResolver {
    service: Arc<dyn MediaService>,
    store: MediaStore,
    progress: ProgressSender,
}

impl ResultResolver {
    /// Creates a resolver writing into `store`.
    pub fn new(service: Arc<dyn MediaService>, store: MediaStore, progress: ProgressSender) -> Self {
        Self {
            service,
            store,
            progress,
        }
    }

    /// Downloads the first generated video of `operation`.
    ///
    /// Nothing is fetched unless the operation carries a download URI.
    pub async fn resolve(&self, operation: &Operation) -> Result<MediaHandle> {
        if !operation.done {
            return Err(GenError::InvalidRequest(format!(
                "operation {} is not finished",
                operation.name
            )));
        }

        let response = operation.response.as_ref().ok_or_else(|| GenError::NoResponse {
            service_error: operation.error.clone(),
        })?;

        let uri = operation.download_uri().ok_or_else(|| GenError::NoDownloadUri {
            service_error: operation.error.clone(),
            filtered: response.rai_media_filtered_count.unwrap_or(0),
        })?;

        if !response.rai_media_filtered_reasons.is_empty() {
            tracing::warn!(
                reasons = ?response.rai_media_filtered_reasons,
                "some videos were filtered"
            );
        }

        self.progress.send(ProgressEvent::Downloading);
        let media = self.service.download(uri).await?;
        if !media.is_success() {
            return Err(GenError::DownloadFailed {
                status: media.status,
                status_text: media.status_text,
            });
        }

        let mime_type = response
            .generated_videos
            .first()
            .and_then(|v| v.video.as_ref())
            .and_then(|v| v.mime_type.clone())
            .or(media.content_type)
            .unwrap_or_else(|| DEFAULT_VIDEO_MIME.to_string());

        let handle = self.store.insert(media.bytes, mime_type);
        tracing::info!(url = handle.url(), size = handle.size(), "video downloaded");
        Ok(handle)
    }
}
