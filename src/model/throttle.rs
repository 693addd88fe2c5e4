// src/model/throttle.rs

//! Minimum spacing between model calls.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{Instant, sleep_until};
use tracing::trace;

/// Spaces the start of successive calls at least `min_interval` apart.
///
/// Clones share one clock, so every clone of a client draws from the same
/// allowance. Waiters are served in arrival order.
#[derive(Debug, Clone)]
pub struct Throttle {
    min_interval: Duration,
    last_start: Arc<Mutex<Option<Instant>>>,
}

impl Throttle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_start: Arc::new(Mutex::new(None)),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait until a call may start and claim the slot.
    pub async fn acquire(&self) {
        if self.min_interval.is_zero() {
            return;
        }

        let mut last_start = self.last_start.lock().await;
        let previous: Option<Instant> = *last_start;
        if let Some(ready) = previous.and_then(|prev| prev.checked_add(self.min_interval)) {
            if ready > Instant::now() {
                trace!(wait = ?(ready - Instant::now()), "throttling model call");
                sleep_until(ready).await;
            }
        }
        *last_start = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_near(actual: Duration, expected: Duration) {
        assert!(
            actual >= expected && actual < expected + Duration::from_millis(5),
            "expected about {expected:?}, got {actual:?}"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn first_call_is_not_delayed() {
        let throttle = Throttle::new(Duration::from_millis(100));
        let start = Instant::now();

        throttle.acquire().await;

        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn back_to_back_calls_are_spaced() {
        let throttle = Throttle::new(Duration::from_millis(100));
        let start = Instant::now();

        for _ in 0..3 {
            throttle.acquire().await;
        }

        assert_near(start.elapsed(), Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn idle_time_counts_towards_the_interval() {
        let throttle = Throttle::new(Duration::from_millis(100));
        throttle.acquire().await;
        tokio::time::sleep(Duration::from_millis(60)).await;

        let before = Instant::now();
        throttle.acquire().await;

        assert_near(before.elapsed(), Duration::from_millis(40));
    }

    #[tokio::test(start_paused = true)]
    async fn clones_share_the_allowance() {
        let throttle = Throttle::new(Duration::from_millis(100));
        let other = throttle.clone();
        let start = Instant::now();

        let (a, b) = tokio::join!(
            async {
                throttle.acquire().await;
                start.elapsed()
            },
            async {
                other.acquire().await;
                start.elapsed()
            }
        );

        let mut starts = [a, b];
        starts.sort();
        assert_eq!(starts[0], Duration::ZERO);
        assert_near(starts[1], Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_interval_never_waits() {
        let throttle = Throttle::new(Duration::ZERO);
        let start = Instant::now();

        for _ in 0..5 {
            throttle.acquire().await;
        }

        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
