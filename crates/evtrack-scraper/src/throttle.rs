//! Minimum-interval request spacing for one upstream provider.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

/// Serialises callers so consecutive requests start at least `min_interval`
/// apart.
pub(crate) struct RequestSpacing {
    min_interval: Duration,
    last_tick: Mutex<Option<Instant>>,
}

impl RequestSpacing {
    pub(crate) fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_tick: Mutex::new(None),
        }
    }

    pub(crate) async fn wait(&self) {
        let mut guard = self.last_tick.lock().await;
        if let Some(prev) = *guard {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                sleep(self.min_interval - elapsed).await;
            }
        }
        *guard = Some(Instant::now());
    }
}
