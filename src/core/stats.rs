use std::sync::atomic::{AtomicU64, Ordering};

/// How a delayed click task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ClickOutcome {
    /// The click reached the publisher.
    Written,
    /// The click write failed.
    Failed,
    /// Shutdown was observed before the delay elapsed.
    Canceled,
}

/// Live counters of one generator run.
///
/// Shared by the control loop and every click task; read it at any time through
/// [`Generator::stats`](crate::Generator::stats).
#[derive(Debug, Default)]
pub struct RunStats {
    impressions_written: AtomicU64,
    impressions_failed: AtomicU64,
    clicks_scheduled: AtomicU64,
    clicks_written: AtomicU64,
    clicks_failed: AtomicU64,
    clicks_canceled: AtomicU64,
}

/// Point-in-time copy of [`RunStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Impressions delivered.
    pub impressions_written: u64,
    /// Impression writes that failed.
    pub impressions_failed: u64,
    /// Click tasks registered.
    pub clicks_scheduled: u64,
    /// Clicks delivered.
    pub clicks_written: u64,
    /// Click writes that failed.
    pub clicks_failed: u64,
    /// Click tasks that observed shutdown before their delay elapsed.
    pub clicks_canceled: u64,
}

impl RunSummary {
    /// Impressions generated, whether or not delivery succeeded.
    pub fn impressions(&self) -> u64 {
        self.impressions_written + self.impressions_failed
    }

    /// Click tasks that reached an outcome.
    pub fn clicks_settled(&self) -> u64 {
        self.clicks_written + self.clicks_failed + self.clicks_canceled
    }
}

impl RunStats {
    pub(crate) fn impression(&self, ok: bool) {
        let counter = if ok {
            &self.impressions_written
        } else {
            &self.impressions_failed
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn click_scheduled(&self) {
        self.clicks_scheduled.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts how a click task ended.
    pub(crate) fn click_settled(&self, outcome: ClickOutcome) {
        let counter = match outcome {
            ClickOutcome::Written => &self.clicks_written,
            ClickOutcome::Failed => &self.clicks_failed,
            ClickOutcome::Canceled => &self.clicks_canceled,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Reads every counter.
    pub fn snapshot(&self) -> RunSummary {
        RunSummary {
            impressions_written: self.impressions_written.load(Ordering::Relaxed),
            impressions_failed: self.impressions_failed.load(Ordering::Relaxed),
            clicks_scheduled: self.clicks_scheduled.load(Ordering::Relaxed),
            clicks_written: self.clicks_written.load(Ordering::Relaxed),
            clicks_failed: self.clicks_failed.load(Ordering::Relaxed),
            clicks_canceled: self.clicks_canceled.load(Ordering::Relaxed),
        }
    }
}
