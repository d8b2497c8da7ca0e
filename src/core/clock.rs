use std::time::{SystemTime, UNIX_EPOCH};

use tokio::time::Instant;

/// Millisecond wall clock for event timestamps.
///
/// Captures the wall-clock time once, then advances with tokio's monotonic clock: timestamps
/// never go backwards within a run, and they follow tokio's paused clock in tests.
#[derive(Clone, Copy, Debug)]
pub struct Clock {
    origin: Instant,
    origin_ms: i64,
}

impl Clock {
    /// Anchors a clock at the current instant.
    pub fn start() -> Self {
        let origin_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
            .unwrap_or(0);
        Self {
            origin: Instant::now(),
            origin_ms,
        }
    }

    /// Milliseconds since the Unix epoch.
    pub fn now_ms(&self) -> i64 {
        let elapsed = i64::try_from(self.origin.elapsed().as_millis()).unwrap_or(i64::MAX);
        self.origin_ms.saturating_add(elapsed)
    }
}
