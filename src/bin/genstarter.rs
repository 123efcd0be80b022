//! CLI for GenStarter - prompt-to-media generation.

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use genstarter::{
    GenError, GenerationRequest, GenerationResult, Generator, PollPolicy, ProgressEvent,
    Resolution,
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "genstarter")]
#[command(about = "Generate images (Gemini) and videos (Veo) from a text prompt")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a 1:1 image from a text prompt
    Image(ImageArgs),

    /// Generate a 16:9 video from a text prompt
    Video(VideoArgs),
}

#[derive(Args)]
struct ImageArgs {
    /// The text prompt describing the image
    prompt: String,

    /// Output file path
    #[arg(short, long, default_value = "image.png")]
    output: PathBuf,
}

#[derive(Args)]
struct VideoArgs {
    /// The text prompt describing the video
    prompt: String,

    /// Output file path
    #[arg(short, long, default_value = "video.mp4")]
    output: PathBuf,

    /// Video resolution
    #[arg(short, long, value_enum, default_value = "720p")]
    resolution: ResolutionArg,

    /// Seconds between status checks
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    poll_interval: u64,

    /// Give up after this many seconds of polling
    #[arg(long)]
    timeout: Option<u64>,

    /// Give up after this many status checks
    #[arg(long)]
    max_attempts: Option<u32>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ResolutionArg {
    #[value(name = "720p")]
    Hd720,
    #[value(name = "1080p")]
    Hd1080,
}

impl From<ResolutionArg> for Resolution {
    fn from(arg: ResolutionArg) -> Self {
        match arg {
            ResolutionArg::Hd720 => Resolution::Hd720,
            ResolutionArg::Hd1080 => Resolution::Hd1080,
        }
    }
}

impl VideoArgs {
    fn poll_policy(&self) -> PollPolicy {
        let mut policy =
            PollPolicy::default().with_interval(Duration::from_secs(self.poll_interval));
        if let Some(secs) = self.timeout {
            policy = policy.with_timeout(Duration::from_secs(secs));
        }
        if let Some(attempts) = self.max_attempts {
            policy = policy.with_max_attempts(attempts);
        }
        policy
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let (request, output, policy) = match cli.command {
        Commands::Image(args) => (
            GenerationRequest::image(&args.prompt),
            args.output,
            PollPolicy::default(),
        ),
        Commands::Video(args) => {
            let policy = args.poll_policy();
            (
                GenerationRequest::video(&args.prompt, args.resolution.into()),
                args.output,
                policy,
            )
        }
    };

    if request.is_blank() {
        anyhow::bail!("prompt must not be empty");
    }

    let generator = Generator::builder().poll_policy(policy).build()?;

    let progress = generator.subscribe();
    let quiet = cli.json;
    let printer = tokio::spawn(print_progress(progress, quiet));

    let outcome = generator.generate(&request, &cancel).await;
    let saved = outcome.map(|result| save(&generator, &result, &output));
    // Closing the channel lets the printer flush the remaining events and exit.
    drop(generator);
    printer.await.ok();

    let (size, mime_type) = match saved {
        Ok(saved) => saved?,
        Err(GenError::Cancelled) => {
            eprintln!("Cancelled.");
            std::process::exit(130);
        }
        Err(e) => return Err(e.into()),
    };

    if cli.json {
        let summary = serde_json::json!({
            "type": request.mode().to_string(),
            "success": true,
            "output": output.display().to_string(),
            "size_bytes": size,
            "mime_type": mime_type,
            "resolution": request.resolution().map(|r| r.to_string()),
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "Generated {}: {} ({} bytes)",
            request.mode(),
            output.display(),
            size
        );
    }

    Ok(())
}

/// Prints progress to stderr until the channel closes. Returns how many
/// events were shown.
async fn print_progress(mut progress: broadcast::Receiver<ProgressEvent>, quiet: bool) -> usize {
    let mut shown = 0;
    loop {
        match progress.recv().await {
            Ok(event) if !quiet => {
                eprintln!("{event}");
                shown += 1;
            }
            Ok(_) | Err(RecvError::Lagged(_)) => {}
            Err(RecvError::Closed) => return shown,
        }
    }
}

/// Writes the result to `path` and releases any stored media.
fn save(
    generator: &Generator,
    result: &GenerationResult,
    path: &Path,
) -> anyhow::Result<(usize, String)> {
    match result {
        GenerationResult::Image(image) => {
            let bytes = image.decode().context("image payload is not valid base64")?;
            std::fs::write(path, &bytes)?;
            Ok((bytes.len(), image.mime_type.clone()))
        }
        GenerationResult::Video(handle) => {
            let bytes = generator
                .store()
                .get(handle.url())
                .context("downloaded video is no longer available")?;
            std::fs::write(path, &bytes[..])?;
            generator.store().revoke(handle);
            Ok((bytes.len(), handle.mime_type().to_string()))
        }
    }
}
