//! Remote media service backends.

mod gemini;

pub use gemini::{GeminiService, GeminiServiceBuilder, ImageModel, VideoModel};
