//! Time source used by the poller.

use async_trait::async_trait;
use std::time::{Duration, Instant};

/// Supplies the current time and suspends the calling task.
///
/// The poller never sleeps directly; tests swap in a clock that advances
/// instantly.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> Instant;

    /// Suspends for `duration` without blocking the thread.
    async fn sleep(&self, duration: Duration);
}

/// Wall clock backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_tokio_clock_advances_with_sleep() {
        let clock = TokioClock;
        let start = clock.now();
        clock.sleep(Duration::from_secs(10)).await;
        assert!(clock.now() - start >= Duration::from_secs(10));
    }
}
