//! Video generation with live progress.
//!
//! Run with: `cargo run --example generate_video`
//!
//! Requires `GOOGLE_API_KEY` environment variable.

use genstarter::{GenerationRequest, GenerationResult, Generator, Resolution};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> genstarter::Result<()> {
    let generator = Generator::builder().build()?;

    let mut progress = generator.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = progress.recv().await {
            println!("{event}");
        }
    });

    let request = GenerationRequest::video(
        "Ocean waves crashing on a rocky shore at sunset",
        Resolution::Hd720,
    );
    let result = generator.generate(&request, &CancellationToken::new()).await?;

    if let GenerationResult::Video(handle) = result {
        if let Some(bytes) = generator.store().get(handle.url()) {
            std::fs::write("output.mp4", &bytes[..])?;
        }
        println!("Generated video: {} bytes at {}", handle.size(), handle.url());
        generator.store().revoke(&handle);
    }

    Ok(())
}
