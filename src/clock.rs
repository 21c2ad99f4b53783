//! Injectable sleep abstraction.
//!
//! Every pause in the control loop goes through [`Clock`] so the state
//! machine can be driven in tests without real delays.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

#[async_trait]
pub trait Clock: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real clock backed by the tokio timer.
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Clock that returns immediately and records how long it was asked to sleep.
///
/// Used by tests and by fast-forwarded simulation runs.
#[derive(Default)]
pub struct NullClock {
    slept_millis: AtomicU64,
}

impl NullClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total time requested across all `sleep` calls.
    pub fn total_slept(&self) -> Duration {
        Duration::from_millis(self.slept_millis.load(Ordering::SeqCst))
    }
}

#[async_trait]
impl Clock for NullClock {
    async fn sleep(&self, duration: Duration) {
        self.slept_millis
            .fetch_add(duration.as_millis() as u64, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_clock_accumulates_requested_time() {
        let clock = NullClock::new();
        tokio_test::block_on(async {
            clock.sleep(Duration::from_millis(100)).await;
            clock.sleep(Duration::from_secs(1)).await;
        });
        assert_eq!(clock.total_slept(), Duration::from_millis(1100));
    }
}
