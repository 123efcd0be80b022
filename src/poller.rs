//! Drives a long-running operation to completion.

use crate::clock::Clock;
use crate::error::{GenError, Result};
use crate::operation::Operation;
use crate::progress::{ProgressEvent, ProgressSender};
use crate::service::MediaService;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Default delay between status refreshes.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// How often to poll and when to give up.
///
/// Both bounds are unset by default, which polls until the service reports
/// the operation done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay between refreshes.
    pub interval: Duration,
    /// Wall-clock bound measured from the start of polling.
    pub timeout: Option<Duration>,
    /// Bound on the number of refresh calls.
    pub max_attempts: Option<u32>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: None,
            max_attempts: None,
        }
    }
}

impl PollPolicy {
    /// Sets the polling interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Sets the wall-clock bound.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the refresh-count bound.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }
}

#[derive(Debug)]
enum PollState {
    Pending,
    Polling { attempt: u32 },
    Done,
    Failed(GenError),
}

/// Re-fetches an operation until it is done.
#[derive(Clone)]
pub struct OperationPoller {
    service: Arc<dyn MediaService>,
    clock: Arc<dyn Clock>,
    policy: PollPolicy,
    progress: ProgressSender,
}

impl OperationPoller {
    /// Creates a poller.
    pub fn new(
        service: Arc<dyn MediaService>,
        clock: Arc<dyn Clock>,
        policy: PollPolicy,
        progress: ProgressSender,
    ) -> Self {
        Self {
            service,
            clock,
            policy,
            progress,
        }
    }

    /// The active policy.
    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Polls `operation` until it is done and returns the terminal copy.
    ///
    /// Each round emits [`ProgressEvent::StillProcessing`], sleeps for the
    /// policy interval, then refreshes. An operation that is already done
    /// returns at once without emitting or sleeping. A wall-clock bound also
    /// cuts short the last sleep and any refresh still in flight.
    pub async fn resolve(
        &self,
        operation: Operation,
        cancel: &CancellationToken,
    ) -> Result<Operation> {
        let start = self.clock.now();
        let mut operation = operation;
        let mut state = PollState::Pending;

        loop {
            state = match state {
                PollState::Pending if operation.done => PollState::Done,
                PollState::Pending => PollState::Polling { attempt: 1 },
                PollState::Polling { attempt } => {
                    match self.poll_once(&operation, attempt, start, cancel).await {
                        Ok(refreshed) => {
                            operation = refreshed;
                            if operation.done {
                                PollState::Done
                            } else {
                                PollState::Polling {
                                    attempt: attempt + 1,
                                }
                            }
                        }
                        Err(e) => PollState::Failed(e),
                    }
                }
                PollState::Done => {
                    tracing::info!(
                        operation = %operation.name,
                        elapsed_secs = self.elapsed(start).as_secs(),
                        "operation finished"
                    );
                    return Ok(operation);
                }
                PollState::Failed(e) => {
                    tracing::warn!(operation = %operation.name, "polling stopped: {e}");
                    return Err(e);
                }
            };
        }
    }

    async fn poll_once(
        &self,
        operation: &Operation,
        attempt: u32,
        start: Instant,
        cancel: &CancellationToken,
    ) -> Result<Operation> {
        let completed = attempt - 1;
        if self.policy.max_attempts.is_some_and(|max| completed >= max) {
            return Err(self.timed_out(start, completed));
        }
        let budget = self.remaining(start);
        if budget == Some(Duration::ZERO) {
            return Err(self.timed_out(start, completed));
        }
        if cancel.is_cancelled() {
            return Err(GenError::Cancelled);
        }

        self.progress.send(ProgressEvent::StillProcessing { attempt });
        let nap = budget.map_or(self.policy.interval, |left| left.min(self.policy.interval));
        cancellable(cancel, async {
            self.clock.sleep(nap).await;
            Ok(())
        })
        .await?;

        // The refresh itself must not outlive the wall-clock bound.
        let budget = self.remaining(start);
        if budget == Some(Duration::ZERO) {
            return Err(self.timed_out(start, completed));
        }
        let deadline = async {
            match budget {
                Some(left) => self.clock.sleep(left).await,
                None => std::future::pending::<()>().await,
            }
        };
        let refreshed = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(GenError::Cancelled),
            result = self.service.get_operation(operation) => result,
            _ = deadline => Err(self.timed_out(start, completed)),
        }?
        .ok_or(GenError::OperationLost { attempt })?;

        tracing::debug!(
            operation = %refreshed.name,
            attempt,
            done = refreshed.done,
            elapsed_secs = self.elapsed(start).as_secs(),
            "polled video operation"
        );
        Ok(refreshed)
    }

    fn elapsed(&self, start: Instant) -> Duration {
        self.clock.now().saturating_duration_since(start)
    }

    /// Time left before the wall-clock bound, if one is set.
    fn remaining(&self, start: Instant) -> Option<Duration> {
        let elapsed = self.elapsed(start);
        self.policy.timeout.map(|limit| limit.saturating_sub(elapsed))
    }

    fn timed_out(&self, start: Instant, attempts: u32) -> GenError {
        GenError::Timeout {
            elapsed: self.elapsed(start),
            attempts,
        }
    }
}

/// Runs `fut` unless `cancel` fires first.
pub(crate) async fn cancellable<T, F>(cancel: &CancellationToken, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(GenError::Cancelled),
        result = fut => result,
    }
}
