//! Progress notifications for a running generation.
//!
//! Events go out on a [`tokio::sync::broadcast`] channel so any number of
//! consumers (a status line, logs, tests) can follow the same generation.
//! Sending never blocks and never fails the generation; events are simply
//! dropped when nobody is subscribed.

use crate::types::{GenerationMode, Resolution};
use tokio::sync::broadcast;

/// Default channel capacity.
pub const DEFAULT_CAPACITY: usize = 64;

/// A phase transition or poll tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// The request is about to be submitted.
    Started {
        mode: GenerationMode,
        resolution: Option<Resolution>,
    },
    /// The operation is not done yet; `attempt` counts from 1.
    StillProcessing { attempt: u32 },
    /// The video is being fetched.
    Downloading,
    /// The result is ready.
    Completed,
}

impl ProgressEvent {
    /// Human-readable status line.
    pub fn message(&self) -> String {
        match self {
            Self::Started {
                mode: GenerationMode::Image,
                ..
            } => "Generating image...".to_string(),
            Self::Started {
                mode: GenerationMode::Video,
                resolution,
            } => format!(
                "Initiating {} video generation (this takes 1-3 minutes)...",
                resolution.unwrap_or_default()
            ),
            Self::StillProcessing { .. } => "Still processing... rendering video frames.".to_string(),
            Self::Downloading => "Fetching video stream...".to_string(),
            Self::Completed => "Completed!".to_string(),
        }
    }
}

impl std::fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message())
    }
}

/// Sending half of the progress channel. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ProgressSender {
    tx: broadcast::Sender<ProgressEvent>,
}

impl Default for ProgressSender {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ProgressSender {
    /// Creates a channel holding up to `capacity` unread events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Subscribes to events sent from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.tx.subscribe()
    }

    /// Publishes an event to every current subscriber.
    pub fn send(&self, event: ProgressEvent) {
        tracing::debug!(subscribers = self.tx.receiver_count(), "{event}");
        let _ = self.tx.send(event);
    }
}
