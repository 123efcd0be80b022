//! End-to-end generation: submit, poll, resolve.

use crate::clock::{Clock, TokioClock};
use crate::error::{GenError, Result};
use crate::initiator::{RequestInitiator, Submission};
use crate::poller::{cancellable, OperationPoller, PollPolicy};
use crate::progress::{ProgressEvent, ProgressSender, DEFAULT_CAPACITY};
use crate::providers::GeminiService;
use crate::resolver::ResultResolver;
use crate::service::MediaService;
use crate::store::MediaStore;
use crate::types::{GenerationRequest, GenerationResult};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// Builder for [`Generator`].
#[derive(Default)]
pub struct GeneratorBuilder {
    service: Option<Arc<dyn MediaService>>,
    clock: Option<Arc<dyn Clock>>,
    policy: PollPolicy,
    store: Option<MediaStore>,
    progress_capacity: Option<usize>,
}

impl GeneratorBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the remote service. Defaults to [`GeminiService`] from the environment.
    pub fn service(mut self, service: Arc<dyn MediaService>) -> Self {
        self.service = Some(service);
        self
    }

    /// Sets the clock used between polls. Defaults to [`TokioClock`].
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Sets the polling policy.
    pub fn poll_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Shares an existing media store.
    pub fn store(mut self, store: MediaStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets how many unread progress events each subscriber may buffer.
    pub fn progress_capacity(mut self, capacity: usize) -> Self {
        self.progress_capacity = Some(capacity);
        self
    }

    /// Builds the generator.
    pub fn build(self) -> Result<Generator> {
        let service: Arc<dyn MediaService> = match self.service {
            Some(service) => service,
            None => Arc::new(GeminiService::builder().build()?),
        };
        let clock: Arc<dyn Clock> = match self.clock {
            Some(clock) => clock,
            None => Arc::new(TokioClock),
        };
        let store = self.store.unwrap_or_default();
        let progress = ProgressSender::new(self.progress_capacity.unwrap_or(DEFAULT_CAPACITY));

        Ok(Generator {
            initiator: RequestInitiator::new(service.clone()),
            poller: OperationPoller::new(service.clone(), clock, self.policy, progress.clone()),
            resolver: ResultResolver::new(service, store.clone(), progress.clone()),
            progress,
            store,
        })
    }
}

/// Runs a [`GenerationRequest`] to a [`GenerationResult`].
///
/// ```no_run
/// use genstarter::{GenerationRequest, Generator, Resolution};
/// use tokio_util::sync::CancellationToken;
///
/// # async fn run() -> genstarter::Result<()> {
/// let generator = Generator::builder().build()?;
/// let mut progress = generator.subscribe();
/// tokio::spawn(async move {
///     while let Ok(event) = progress.recv().await {
///         println!("{event}");
///     }
/// });
///
/// let request = GenerationRequest::video("a cat", Resolution::Hd720);
/// let result = generator.generate(&request, &CancellationToken::new()).await?;
/// println!("{}", result.url());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Generator {
    initiator: RequestInitiator,
    poller: OperationPoller,
    resolver: ResultResolver,
    progress: ProgressSender,
    store: MediaStore,
}

impl Generator {
    /// Creates a new `GeneratorBuilder`.
    pub fn builder() -> GeneratorBuilder {
        GeneratorBuilder::new()
    }

    /// Subscribes to progress events of every later generation.
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.progress.subscribe()
    }

    /// Store holding downloaded videos.
    pub fn store(&self) -> &MediaStore {
        &self.store
    }

    /// Generates the requested media.
    ///
    /// Blank prompts are rejected before anything is sent.
    pub async fn generate(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<GenerationResult> {
        if request.is_blank() {
            return Err(GenError::InvalidRequest("prompt is empty".into()));
        }

        let start = Instant::now();
        self.progress.send(ProgressEvent::Started {
            mode: request.mode(),
            resolution: request.resolution(),
        });

        let result = match cancellable(cancel, self.initiator.submit(request)).await? {
            Submission::Image(image) => GenerationResult::Image(image),
            Submission::Operation(operation) => {
                let operation = self.poller.resolve(operation, cancel).await?;
                let handle = cancellable(cancel, self.resolver.resolve(&operation)).await?;
                GenerationResult::Video(handle)
            }
        };

        tracing::info!(
            mode = %request.mode(),
            duration_ms = start.elapsed().as_millis() as u64,
            "generation complete"
        );
        self.progress.send(ProgressEvent::Completed);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::Operation;
    use crate::testing::{
        done_with_uri, image_response, inline_part, FakeClock, FakeService, VIDEO_URI,
    };
    use crate::types::{GenerationMode, Resolution};
    use std::time::Duration;

    const INTERVAL: Duration = Duration::from_secs(10);

    fn generator(service: Arc<FakeService>, clock: Arc<FakeClock>) -> Generator {
        Generator::builder()
            .service(service)
            .clock(clock)
            .poll_policy(PollPolicy::default().with_interval(INTERVAL))
            .build()
            .unwrap()
    }

    fn drain(rx: &mut broadcast::Receiver<ProgressEvent>) -> Vec<ProgressEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_blank_prompt_never_reaches_service() {
        let service = Arc::new(FakeService::new());
        let gen = generator(service.clone(), Arc::new(FakeClock::new()));
        let mut rx = gen.subscribe();

        for prompt in ["", "   ", "\n\t"] {
            let err = gen
                .generate(&GenerationRequest::image(prompt), &CancellationToken::new())
                .await
                .unwrap_err();
            assert!(matches!(err, GenError::InvalidRequest(_)));

            let err = gen
                .generate(
                    &GenerationRequest::video(prompt, Resolution::Hd720),
                    &CancellationToken::new(),
                )
                .await
                .unwrap_err();
            assert!(matches!(err, GenError::InvalidRequest(_)));
        }

        assert_eq!(service.image_calls(), 0);
        assert_eq!(service.start_calls(), 0);
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_image_generation() {
        let service = Arc::new(
            FakeService::new().with_image(image_response(vec![inline_part("image/png", "QUJD")])),
        );
        let clock = Arc::new(FakeClock::new());
        let gen = generator(service.clone(), clock.clone());
        let mut rx = gen.subscribe();

        let result = gen
            .generate(&GenerationRequest::image("a cat"), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.mode(), GenerationMode::Image);
        assert_eq!(result.url(), "data:image/png;base64,QUJD");
        assert!(clock.sleeps().is_empty());
        assert_eq!(
            drain(&mut rx),
            vec![
                ProgressEvent::Started {
                    mode: GenerationMode::Image,
                    resolution: None
                },
                ProgressEvent::Completed,
            ]
        );
    }

    #[tokio::test]
    async fn test_video_end_to_end() {
        let name = "models/veo/operations/cat";
        let service = Arc::new(
            FakeService::new()
                .with_started(Operation::pending(name))
                .with_refreshes([
                    Some(Operation::pending(name)),
                    Some(Operation::pending(name)),
                    Some(done_with_uri(name, VIDEO_URI)),
                ])
                .with_download(200, "OK", b"mp4-bytes"),
        );
        let clock = Arc::new(FakeClock::new());
        let gen = generator(service.clone(), clock.clone());
        let mut rx = gen.subscribe();

        let result = gen
            .generate(
                &GenerationRequest::video("a cat", Resolution::Hd720),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        let GenerationResult::Video(handle) = result else {
            panic!("expected video");
        };
        assert!(!handle.url().is_empty());
        assert_eq!(&*gen.store().get(handle.url()).unwrap(), b"mp4-bytes");
        assert_eq!(service.refresh_calls(), 3);
        assert_eq!(service.downloads(), vec![VIDEO_URI.to_string()]);
        assert_eq!(clock.total_slept(), INTERVAL * 3);

        let events = drain(&mut rx);
        assert_eq!(
            events,
            vec![
                ProgressEvent::Started {
                    mode: GenerationMode::Video,
                    resolution: Some(Resolution::Hd720)
                },
                ProgressEvent::StillProcessing { attempt: 1 },
                ProgressEvent::StillProcessing { attempt: 2 },
                ProgressEvent::StillProcessing { attempt: 3 },
                ProgressEvent::Downloading,
                ProgressEvent::Completed,
            ]
        );
    }

    #[tokio::test]
    async fn test_video_start_failure_propagates() {
        let service = Arc::new(FakeService::new());
        let gen = generator(service.clone(), Arc::new(FakeClock::new()));
        let mut rx = gen.subscribe();

        let err = gen
            .generate(
                &GenerationRequest::video("a cat", Resolution::Hd1080),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, GenError::StartFailed));
        assert_eq!(service.refresh_calls(), 0);
        let events = drain(&mut rx);
        assert!(!events.contains(&ProgressEvent::Completed));
    }

    #[tokio::test]
    async fn test_cancelled_before_submit() {
        let service = Arc::new(FakeService::new().with_started(Operation::pending("operations/1")));
        let gen = generator(service.clone(), Arc::new(FakeClock::new()));
        let token = CancellationToken::new();
        token.cancel();

        let err = gen
            .generate(&GenerationRequest::video("a cat", Resolution::Hd720), &token)
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert_eq!(service.start_calls(), 0);
    }

    #[tokio::test]
    async fn test_generators_share_store() {
        let store = MediaStore::new();
        let gen = Generator::builder()
            .service(Arc::new(FakeService::new()))
            .store(store.clone())
            .build()
            .unwrap();
        let handle = gen.store().insert(vec![1], "video/mp4");
        assert!(store.revoke(&handle));
        assert!(gen.store().is_empty());
    }
}
