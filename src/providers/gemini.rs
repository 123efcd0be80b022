//! Gemini Developer API backend (Gemini image models and Veo video models).

use crate::error::{parse_retry_after, sanitize_error_message, GenError, Result, ServiceError};
use crate::operation::{GeneratedVideo, Operation, OperationResponse, VideoFile};
use crate::service::{Candidate, Content, ContentResponse, DownloadedMedia, InlineData, MediaService, Part};
use crate::types::{AspectRatio, VideoConfig};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Gemini image model variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ImageModel {
    /// Nano Banana - Gemini 2.5 Flash Image.
    #[default]
    FlashImage,
}

impl ImageModel {
    /// Returns the API model identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FlashImage => "gemini-2.5-flash-image",
        }
    }
}

/// Veo model variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VideoModel {
    /// Veo 3.1 Fast Preview.
    #[default]
    Veo31FastPreview,
    /// Veo 3.1 Preview (higher quality, slower).
    Veo31Preview,
}

impl VideoModel {
    /// Returns the API model identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Veo31FastPreview => "veo-3.1-fast-generate-preview",
            Self::Veo31Preview => "veo-3.1-generate-preview",
        }
    }
}

/// Builder for [`GeminiService`].
#[derive(Debug, Clone, Default)]
pub struct GeminiServiceBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    image_model: ImageModel,
    video_model: VideoModel,
}

impl GeminiServiceBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key. Falls back to `GOOGLE_API_KEY`, then `API_KEY`.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Overrides the API root. Falls back to `GENSTARTER_BASE_URL`.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the image model.
    pub fn image_model(mut self, model: ImageModel) -> Self {
        self.image_model = model;
        self
    }

    /// Sets the video model.
    pub fn video_model(mut self, model: VideoModel) -> Self {
        self.video_model = model;
        self
    }

    /// Builds the service, resolving the API key.
    pub fn build(self) -> Result<GeminiService> {
        let api_key = self
            .api_key
            .or_else(|| std::env::var("GOOGLE_API_KEY").ok())
            .or_else(|| std::env::var("API_KEY").ok())
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                GenError::Auth("GOOGLE_API_KEY not set and no API key provided".into())
            })?;

        let base_url = self
            .base_url
            .or_else(|| std::env::var("GENSTARTER_BASE_URL").ok())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(GeminiService {
            client: reqwest::Client::new(),
            api_key,
            base_url,
            image_model: self.image_model,
            video_model: self.video_model,
        })
    }
}

/// HTTP client for the Gemini Developer API.
pub struct GeminiService {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    image_model: ImageModel,
    video_model: VideoModel,
}

impl GeminiService {
    /// Creates a new `GeminiServiceBuilder`.
    pub fn builder() -> GeminiServiceBuilder {
        GeminiServiceBuilder::new()
    }

    /// The configured image model.
    pub fn image_model(&self) -> ImageModel {
        self.image_model
    }

    /// The configured video model.
    pub fn video_model(&self) -> VideoModel {
        self.video_model
    }

    fn model_url(&self, model: &str, method: &str) -> String {
        format!("{}/v1beta/models/{model}:{method}", self.base_url)
    }

    fn operation_url(&self, name: &str) -> String {
        format!("{}/v1beta/{name}", self.base_url)
    }

    /// Appends the API key as a query parameter (required by the file endpoint).
    fn keyed_download_url(&self, uri: &str) -> String {
        if uri.contains('?') {
            format!("{uri}&key={}", self.api_key)
        } else {
            format!("{uri}?key={}", self.api_key)
        }
    }

    async fn post_json<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;
        self.check(response).await
    }

    async fn check(&self, response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let headers = response.headers().clone();
        let text = response.text().await.unwrap_or_default();
        Err(parse_error(status.as_u16(), &text, &headers))
    }
}

/// Drops the request URL, which carries the API key on download calls.
fn without_key(err: reqwest::Error) -> GenError {
    GenError::Network(err.without_url())
}

fn parse_error(status: u16, text: &str, headers: &reqwest::header::HeaderMap) -> GenError {
    let text = sanitize_error_message(text);
    match status {
        401 | 403 => GenError::Auth(text),
        429 => {
            let retry_after = parse_retry_after(headers).map(std::time::Duration::from_secs);
            GenError::RateLimited { retry_after }
        }
        _ => GenError::Api {
            status,
            message: text,
        },
    }
}

#[async_trait]
impl MediaService for GeminiService {
    async fn generate_content(
        &self,
        prompt: &str,
        aspect_ratio: AspectRatio,
    ) -> Result<Option<ContentResponse>> {
        let url = self.model_url(self.image_model.as_str(), "generateContent");
        let body = GeminiRequest::new(prompt, aspect_ratio);

        let response = self.post_json(&url, &body).await?;
        let gemini_response: Option<GeminiResponse> = response.json().await?;
        Ok(gemini_response.map(Into::into))
    }

    async fn start_video(&self, prompt: &str, config: &VideoConfig) -> Result<Option<Operation>> {
        let url = self.model_url(self.video_model.as_str(), "predictLongRunning");
        let body = VeoRequest::new(prompt, config);

        let response = self.post_json(&url, &body).await?;
        let operation: Option<VeoOperationResponse> = response.json().await?;
        let operation = operation.and_then(|op| op.into_operation(None));
        if let Some(ref op) = operation {
            tracing::debug!(operation = %op.name, model = self.video_model.as_str(), "video operation created");
        }
        Ok(operation)
    }

    async fn get_operation(&self, operation: &Operation) -> Result<Option<Operation>> {
        let url = self.operation_url(&operation.name);

        let response = self
            .client
            .get(&url)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await?;
        let response = self.check(response).await?;

        let refreshed: Option<VeoOperationResponse> = response.json().await?;
        Ok(refreshed.and_then(|op| op.into_operation(Some(&operation.name))))
    }

    async fn download(&self, uri: &str) -> Result<DownloadedMedia> {
        let response = self
            .client
            .get(self.keyed_download_url(uri))
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
            .map_err(without_key)?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = if status.is_success() {
            response.bytes().await.map_err(without_key)?.to_vec()
        } else {
            Vec::new()
        };

        Ok(DownloadedMedia {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            content_type,
            bytes,
        })
    }
}

// ── Image wire types ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiTextPart>,
}

#[derive(Debug, Serialize)]
struct GeminiTextPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiConfig {
    response_modalities: Vec<String>,
    image_config: GeminiImageConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiImageConfig {
    aspect_ratio: AspectRatio,
}

impl GeminiRequest {
    fn new(prompt: &str, aspect_ratio: AspectRatio) -> Self {
        Self {
            contents: vec![GeminiContent {
                parts: vec![GeminiTextPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GeminiConfig {
                response_modalities: vec!["IMAGE".to_string()],
                image_config: GeminiImageConfig { aspect_ratio },
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContentResponse>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Option<Vec<GeminiPartResponse>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPartResponse {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    inline_data: Option<GeminiInlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    #[serde(default)]
    mime_type: Option<String>,
    data: String,
}

impl From<GeminiResponse> for ContentResponse {
    fn from(resp: GeminiResponse) -> Self {
        let candidates = resp
            .candidates
            .into_iter()
            .map(|c| Candidate {
                content: c.content.map(|content| Content {
                    parts: content.parts.map(|parts| {
                        parts
                            .into_iter()
                            .map(|p| Part {
                                text: p.text,
                                inline_data: p.inline_data.map(|d| InlineData {
                                    mime_type: d.mime_type,
                                    data: d.data,
                                }),
                            })
                            .collect()
                    }),
                }),
                finish_reason: c.finish_reason,
            })
            .collect();
        Self { candidates }
    }
}

// ── Video wire types ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct VeoRequest {
    instances: Vec<VeoInstance>,
    parameters: VeoParameters,
}

#[derive(Debug, Serialize)]
struct VeoInstance {
    prompt: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VeoParameters {
    number_of_videos: u32,
    resolution: String,
    aspect_ratio: AspectRatio,
}

impl VeoRequest {
    fn new(prompt: &str, config: &VideoConfig) -> Self {
        Self {
            instances: vec![VeoInstance {
                prompt: prompt.to_string(),
            }],
            parameters: VeoParameters {
                number_of_videos: config.number_of_videos,
                resolution: config.resolution.as_str().to_string(),
                aspect_ratio: config.aspect_ratio,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct VeoOperationResponse {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    done: Option<bool>,
    #[serde(default)]
    response: Option<VeoVideoResponse>,
    #[serde(default)]
    error: Option<VeoError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VeoVideoResponse {
    #[serde(default)]
    generate_video_response: Option<VeoGenerateVideoResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VeoGenerateVideoResponse {
    #[serde(default)]
    generated_samples: Option<Vec<VeoGeneratedSample>>,
    #[serde(default)]
    rai_media_filtered_count: Option<u32>,
    #[serde(default)]
    rai_media_filtered_reasons: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct VeoGeneratedSample {
    #[serde(default)]
    video: Option<VeoVideo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VeoVideo {
    #[serde(default)]
    uri: Option<String>,
    #[serde(default)]
    mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VeoError {
    #[serde(default)]
    code: Option<i32>,
    #[serde(default)]
    message: Option<String>,
}

impl VeoOperationResponse {
    /// Maps the wire shape to an [`Operation`]. A missing name falls back to
    /// `known_name`; with neither, there is no usable operation.
    fn into_operation(self, known_name: Option<&str>) -> Option<Operation> {
        let name = self
            .name
            .filter(|n| !n.is_empty())
            .or_else(|| known_name.map(str::to_string))?;

        let response = self.response.map(|resp| {
            let gen = resp.generate_video_response;
            let (samples, filtered_count, filtered_reasons) = match gen {
                Some(g) => (
                    g.generated_samples.unwrap_or_default(),
                    g.rai_media_filtered_count,
                    g.rai_media_filtered_reasons.unwrap_or_default(),
                ),
                None => (Vec::new(), None, Vec::new()),
            };
            OperationResponse {
                generated_videos: samples
                    .into_iter()
                    .map(|s| GeneratedVideo {
                        video: s.video.map(|v| VideoFile {
                            uri: v.uri,
                            mime_type: v.mime_type,
                        }),
                    })
                    .collect(),
                rai_media_filtered_count: filtered_count,
                rai_media_filtered_reasons: filtered_reasons,
            }
        });

        Some(Operation {
            name,
            done: self.done.unwrap_or(false),
            response,
            error: self.error.map(|e| ServiceError {
                code: e.code,
                message: e.message,
            }),
        })
    }
}
