//! Process-wide request pacing.
//!
//! One [`PacingGate`] is shared by every query in a run. Each outbound
//! request calls [`PacingGate::wait`] first; the gate holds its lock while
//! sleeping, so consecutive requests are spaced at least `min_interval`
//! apart no matter which task issues them.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{Instant, sleep_until};

#[derive(Debug)]
pub struct PacingGate {
    min_interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl PacingGate {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last: Mutex::new(None),
        }
    }

    /// Wait for this caller's slot and claim it.
    ///
    /// The first request of a run goes out immediately.
    pub async fn wait(&self) {
        let mut last = self.last.lock().await;
        if let Some(previous) = *last {
            sleep_until(previous + self.min_interval).await;
        }
        *last = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn first_wait_is_immediate() {
        let gate = PacingGate::new(Duration::from_secs(1));
        let start = Instant::now();
        gate.wait().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_waiters_are_spaced() {
        let gate = Arc::new(PacingGate::new(Duration::from_millis(250)));
        let start = Instant::now();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let gate = Arc::clone(&gate);
                tokio::spawn(async move {
                    gate.wait().await;
                    Instant::now()
                })
            })
            .collect();

        let mut stamps = Vec::new();
        for handle in handles {
            stamps.push(handle.await.unwrap());
        }
        stamps.sort();
        for pair in stamps.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_millis(250));
        }
        assert_eq!(stamps[3] - start, Duration::from_millis(750));
    }
}
