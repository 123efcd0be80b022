//! Scripted service and clock for unit tests.

use crate::clock::Clock;
use crate::error::Result;
use crate::operation::{GeneratedVideo, Operation, OperationResponse, VideoFile};
use crate::service::{Candidate, Content, ContentResponse, DownloadedMedia, InlineData, MediaService, Part};
use crate::types::{AspectRatio, VideoConfig};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

pub(crate) const VIDEO_URI: &str = "https://files.example/v1beta/files/abc:download?alt=media";

/// A service whose answers are fixed up front.
#[derive(Default)]
pub(crate) struct FakeService {
    pub image: Mutex<Option<ContentResponse>>,
    pub started: Mutex<Option<Operation>>,
    pub refreshes: Mutex<VecDeque<Option<Operation>>>,
    pub download: Mutex<Option<DownloadedMedia>>,
    pub last_image_call: Mutex<Option<(String, AspectRatio)>>,
    pub last_video_call: Mutex<Option<(String, VideoConfig)>>,
    pub downloaded: Mutex<Vec<String>>,
    pub image_calls: AtomicU32,
    pub start_calls: AtomicU32,
    pub refresh_calls: AtomicU32,
    pub stall_refresh: AtomicBool,
}

impl FakeService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(self, response: ContentResponse) -> Self {
        *self.image.lock().unwrap() = Some(response);
        self
    }

    pub fn with_started(self, operation: Operation) -> Self {
        *self.started.lock().unwrap() = Some(operation);
        self
    }

    pub fn with_refreshes(self, refreshes: impl IntoIterator<Item = Option<Operation>>) -> Self {
        *self.refreshes.lock().unwrap() = refreshes.into_iter().collect();
        self
    }

    pub fn with_download(self, status: u16, status_text: &str, bytes: &[u8]) -> Self {
        *self.download.lock().unwrap() = Some(DownloadedMedia {
            status,
            status_text: status_text.to_string(),
            content_type: Some("video/mp4".to_string()),
            bytes: bytes.to_vec(),
        });
        self
    }

    /// Makes every status refresh hang forever.
    pub fn stalling_refresh(self) -> Self {
        self.stall_refresh.store(true, Ordering::SeqCst);
        self
    }

    pub fn image_calls(&self) -> u32 {
        self.image_calls.load(Ordering::SeqCst)
    }

    pub fn start_calls(&self) -> u32 {
        self.start_calls.load(Ordering::SeqCst)
    }

    pub fn refresh_calls(&self) -> u32 {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn downloads(&self) -> Vec<String> {
        self.downloaded.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaService for FakeService {
    async fn generate_content(
        &self,
        prompt: &str,
        aspect_ratio: AspectRatio,
    ) -> Result<Option<ContentResponse>> {
        self.image_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_image_call.lock().unwrap() = Some((prompt.to_string(), aspect_ratio));
        Ok(self.image.lock().unwrap().clone())
    }

    async fn start_video(&self, prompt: &str, config: &VideoConfig) -> Result<Option<Operation>> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_video_call.lock().unwrap() = Some((prompt.to_string(), config.clone()));
        Ok(self.started.lock().unwrap().clone())
    }

    async fn get_operation(&self, operation: &Operation) -> Result<Option<Operation>> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        if self.stall_refresh.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        let next = self.refreshes.lock().unwrap().pop_front();
        // Once the script runs out, keep reporting the operation as pending.
        Ok(next.unwrap_or_else(|| Some(Operation::pending(operation.name.clone()))))
    }

    async fn download(&self, uri: &str) -> Result<DownloadedMedia> {
        self.downloaded.lock().unwrap().push(uri.to_string());
        Ok(self.download.lock().unwrap().clone().unwrap_or(DownloadedMedia {
            status: 404,
            status_text: "Not Found".to_string(),
            content_type: None,
            bytes: Vec::new(),
        }))
    }
}

/// A clock whose sleeps return immediately and advance virtual time.
pub(crate) struct FakeClock {
    base: Instant,
    elapsed: Mutex<Duration>,
    sleeps: Mutex<Vec<Duration>>,
    cancel_on_sleep: Option<(usize, CancellationToken)>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            elapsed: Mutex::new(Duration::ZERO),
            sleeps: Mutex::new(Vec::new()),
            cancel_on_sleep: None,
        }
    }

    /// Cancels `token` during the `n`th sleep (1-based).
    pub fn cancelling_on_sleep(mut self, n: usize, token: CancellationToken) -> Self {
        self.cancel_on_sleep = Some((n, token));
        self
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }

    pub fn total_slept(&self) -> Duration {
        *self.elapsed.lock().unwrap()
    }
}

#[async_trait]
impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.base + *self.elapsed.lock().unwrap()
    }

    async fn sleep(&self, duration: Duration) {
        let count = {
            let mut sleeps = self.sleeps.lock().unwrap();
            sleeps.push(duration);
            sleeps.len()
        };
        *self.elapsed.lock().unwrap() += duration;
        if let Some((n, token)) = &self.cancel_on_sleep {
            if *n == count {
                token.cancel();
            }
        }
    }
}

pub(crate) fn done_with_uri(name: &str, uri: &str) -> Operation {
    Operation {
        name: name.to_string(),
        done: true,
        response: Some(OperationResponse {
            generated_videos: vec![GeneratedVideo {
                video: Some(VideoFile {
                    uri: Some(uri.to_string()),
                    mime_type: Some("video/mp4".to_string()),
                }),
            }],
            ..Default::default()
        }),
        error: None,
    }
}

pub(crate) fn image_response(parts: Vec<Part>) -> ContentResponse {
    ContentResponse {
        candidates: vec![Candidate {
            content: Some(Content { parts: Some(parts) }),
            finish_reason: Some("STOP".to_string()),
        }],
    }
}

pub(crate) fn inline_part(mime: &str, data: &str) -> Part {
    Part {
        text: None,
        inline_data: Some(InlineData {
            mime_type: Some(mime.to_string()),
            data: data.to_string(),
        }),
    }
}

pub(crate) fn text_part(text: &str) -> Part {
    Part {
        text: Some(text.to_string()),
        inline_data: None,
    }
}
