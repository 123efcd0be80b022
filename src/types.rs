//! Core request and result types.

use crate::store::MediaHandle;
use serde::{Deserialize, Serialize};

/// What kind of media a request produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMode {
    /// One-shot image generation.
    Image,
    /// Long-running video generation.
    Video,
}

impl GenerationMode {
    /// Aspect ratio sent with every request of this mode.
    pub fn aspect_ratio(&self) -> AspectRatio {
        match self {
            Self::Image => AspectRatio::Square,
            Self::Video => AspectRatio::Landscape,
        }
    }
}

impl std::fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Image => write!(f, "image"),
            Self::Video => write!(f, "video"),
        }
    }
}

/// Output resolution for video generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    /// 1280x720.
    #[default]
    #[serde(rename = "720p")]
    Hd720,
    /// 1920x1080.
    #[serde(rename = "1080p")]
    Hd1080,
}

impl Resolution {
    /// Returns the wire value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hd720 => "720p",
            Self::Hd1080 => "1080p",
        }
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aspect ratios used by the two generation modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectRatio {
    /// 1:1, used for images.
    #[serde(rename = "1:1")]
    Square,
    /// 16:9, used for video.
    #[serde(rename = "16:9")]
    Landscape,
}

impl AspectRatio {
    /// Returns the ratio string (e.g., "16:9").
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Square => "1:1",
            Self::Landscape => "16:9",
        }
    }
}

/// A request to generate an image or a video.
///
/// The aspect ratio is derived from the mode, and the resolution only
/// applies to video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    prompt: String,
    mode: GenerationMode,
    resolution: Option<Resolution>,
}

impl GenerationRequest {
    /// Creates an image request.
    pub fn image(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            mode: GenerationMode::Image,
            resolution: None,
        }
    }

    /// Creates a video request at the given resolution.
    pub fn video(prompt: impl Into<String>, resolution: Resolution) -> Self {
        Self {
            prompt: prompt.into(),
            mode: GenerationMode::Video,
            resolution: Some(resolution),
        }
    }

    /// The text prompt.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// The generation mode.
    pub fn mode(&self) -> GenerationMode {
        self.mode
    }

    /// Video resolution; `None` for image requests.
    pub fn resolution(&self) -> Option<Resolution> {
        self.resolution
    }

    /// Aspect ratio fixed by the mode.
    pub fn aspect_ratio(&self) -> AspectRatio {
        self.mode.aspect_ratio()
    }

    /// True when the prompt is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.prompt.trim().is_empty()
    }
}

/// Parameters sent with a video submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoConfig {
    /// Number of videos to produce.
    pub number_of_videos: u32,
    /// Output resolution.
    pub resolution: Resolution,
    /// Output aspect ratio.
    pub aspect_ratio: AspectRatio,
}

impl VideoConfig {
    /// A single video at the given resolution, 16:9.
    pub fn single(resolution: Resolution) -> Self {
        Self {
            number_of_videos: 1,
            resolution,
            aspect_ratio: AspectRatio::Landscape,
        }
    }
}

/// A generated image, as a displayable data URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    /// `data:<mime>;base64,<payload>`.
    pub data_url: String,
    /// MIME type of the payload.
    pub mime_type: String,
}

impl GeneratedImage {
    /// Wraps a base64 payload in a data URL without re-encoding it.
    pub fn from_base64(mime_type: impl Into<String>, payload: &str) -> Self {
        let mime_type = mime_type.into();
        Self {
            data_url: format!("data:{mime_type};base64,{payload}"),
            mime_type,
        }
    }

    /// Returns the base64 payload embedded in the data URL.
    pub fn base64_payload(&self) -> &str {
        self.data_url
            .split_once(";base64,")
            .map(|(_, b64)| b64)
            .unwrap_or_default()
    }

    /// Decodes the payload to raw bytes.
    pub fn decode(&self) -> std::result::Result<Vec<u8>, base64::DecodeError> {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD.decode(self.base64_payload())
    }
}

/// The terminal outcome of a generation.
#[derive(Debug, Clone)]
pub enum GenerationResult {
    /// Image as a data URL.
    Image(GeneratedImage),
    /// Video bytes held in a [`MediaStore`](crate::MediaStore).
    Video(MediaHandle),
}

impl GenerationResult {
    /// The displayable reference string.
    pub fn url(&self) -> &str {
        match self {
            Self::Image(image) => &image.data_url,
            Self::Video(handle) => handle.url(),
        }
    }

    /// The mode that produced this result.
    pub fn mode(&self) -> GenerationMode {
        match self {
            Self::Image(_) => GenerationMode::Image,
            Self::Video(_) => GenerationMode::Video,
        }
    }
}
