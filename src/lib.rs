#![warn(missing_docs)]
//! GenStarter - prompt-to-media generation with Gemini and Veo.
//!
//! Images come back from a single call as a `data:` URL. Videos are
//! long-running: the request starts an operation that is polled at a fixed
//! interval until it is done, then the video is downloaded into an
//! in-memory [`MediaStore`] and handed out as a `blob:` style
//! [`MediaHandle`].
//!
//! # Quick Start - Images
//!
//! ```no_run
//! use genstarter::{GenerationRequest, Generator};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> genstarter::Result<()> {
//!     let generator = Generator::builder().build()?;
//!     let request = GenerationRequest::image("A futuristic cyberpunk cat");
//!     let result = generator.generate(&request, &CancellationToken::new()).await?;
//!     println!("{}", result.url());
//!     Ok(())
//! }
//! ```
//!
//! # Quick Start - Videos
//!
//! ```no_run
//! use genstarter::{GenerationRequest, GenerationResult, Generator, PollPolicy, Resolution};
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> genstarter::Result<()> {
//!     let generator = Generator::builder()
//!         .poll_policy(PollPolicy::default().with_timeout(Duration::from_secs(600)))
//!         .build()?;
//!     let request = GenerationRequest::video("A neon hologram of a shark", Resolution::Hd1080);
//!     if let GenerationResult::Video(handle) =
//!         generator.generate(&request, &CancellationToken::new()).await?
//!     {
//!         if let Some(bytes) = generator.store().get(handle.url()) {
//!             std::fs::write("shark.mp4", &bytes[..])?;
//!         }
//!         generator.store().revoke(&handle);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `cli` (default): the `genstarter` command-line front-end.

mod clock;
mod error;
mod generator;
mod initiator;
mod operation;
mod poller;
pub mod progress;
pub mod providers;
mod resolver;
mod service;
mod store;
mod types;

#[cfg(test)]
mod testing;

pub use clock::{Clock, TokioClock};
pub use error::{GenError, Result, ServiceError};
pub use generator::{Generator, GeneratorBuilder};
pub use initiator::{RequestInitiator, Submission};
pub use operation::{GeneratedVideo, Operation, OperationResponse, VideoFile};
pub use poller::{OperationPoller, PollPolicy, DEFAULT_POLL_INTERVAL};
pub use progress::{ProgressEvent, ProgressSender};
pub use providers::{GeminiService, GeminiServiceBuilder, ImageModel, VideoModel};
pub use resolver::ResultResolver;
pub use service::{Candidate, Content, ContentResponse, DownloadedMedia, InlineData, MediaService, Part};
pub use store::{MediaHandle, MediaStore};
pub use types::{
    AspectRatio, GeneratedImage, GenerationMode, GenerationRequest, GenerationResult, Resolution,
    VideoConfig,
};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{GenError, Result};
    pub use crate::generator::Generator;
    pub use crate::progress::ProgressEvent;
    pub use crate::types::{GenerationRequest, GenerationResult, Resolution};
}
