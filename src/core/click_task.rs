//! # Delayed click task.
//!
//! One task per scheduled click. Its deadline is anchored to the instant the impression was
//! built, so the time spent writing the impression never stretches the click lag. The task
//! races that deadline against the shared shutdown signal:
//!
//! ```text
//! select! (biased)
//!   ├─ shutdown observed   ─► no click is written          ─► Canceled
//!   └─ deadline reached    ─► Click::for_impression ─► write ─► Written / Failed
//!                                                              │
//!                                          RunStats::click_settled(outcome)
//! ```
//!
//! ## Rules
//! - Shutdown wins ties: once shutdown is observed no delayed click is started.
//! - The race runs once; there is no retry of either branch.
//! - A write that already started may still finish (or fail as cancelled) after shutdown.
//! - The coordinator counts the task until this future returns, so completion is signalled
//!   exactly once on either branch.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::core::emitter::Emitter;
use crate::core::stats::ClickOutcome;
use crate::lifecycle::{Notice, NoticeKind};
use crate::model::Impression;

/// A click decided on the control loop, waiting for its deadline.
pub(crate) struct ScheduledClick {
    pub impression: Impression,
    /// When the impression was built.
    pub created: Instant,
    /// Drawn lag between impression and click.
    pub delay: Duration,
}

impl ScheduledClick {
    fn deadline(&self) -> Instant {
        self.created + self.delay
    }
}

/// Writes the click for `scheduled` at its deadline unless `shutdown` fires first, then
/// settles the outcome in the run stats.
pub(crate) async fn delayed_click(
    emitter: Arc<Emitter>,
    scheduled: ScheduledClick,
    shutdown: CancellationToken,
) {
    let outcome = race(&emitter, &scheduled, &shutdown).await;
    emitter.stats.click_settled(outcome);
}

async fn race(
    emitter: &Emitter,
    scheduled: &ScheduledClick,
    shutdown: &CancellationToken,
) -> ClickOutcome {
    tokio::select! {
        biased;
        _ = shutdown.cancelled() => {
            emitter.bus.publish(
                Notice::new(NoticeKind::ClickCanceled)
                    .with_key(scheduled.impression.impr_id.as_str())
                    .with_delay(scheduled.delay),
            );
            return ClickOutcome::Canceled;
        }
        _ = time::sleep_until(scheduled.deadline()) => {}
    }

    let click = emitter.click_for(&scheduled.impression);
    if emitter.write_click(shutdown, &click, scheduled.delay).await {
        ClickOutcome::Written
    } else {
        ClickOutcome::Failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::Clock;
    use crate::core::emitter::IdLengths;
    use crate::core::stats::RunStats;
    use crate::lifecycle::Bus;
    use crate::model::{CLICKS, Click, IMPRESSIONS, RandomSource};
    use crate::publisher::{MemoryWriter, TopicPublisher};

    fn emitter(clicks: MemoryWriter) -> Arc<Emitter> {
        let publisher = TopicPublisher::new()
            .with_writer(IMPRESSIONS, MemoryWriter::new())
            .with_writer(CLICKS, clicks);
        Arc::new(Emitter {
            publisher: Arc::new(publisher),
            random: Arc::new(RandomSource::seeded(17)),
            clock: Clock::start(),
            bus: Bus::new(64),
            stats: Arc::new(RunStats::default()),
            campaigns: Arc::from(vec!["campaign-1".to_string()]),
            ids: IdLengths {
                impression: 8,
                user: 6,
                click: 8,
            },
        })
    }

    fn schedule(em: &Emitter, delay: Duration) -> ScheduledClick {
        ScheduledClick {
            created: Instant::now(),
            impression: em.next_impression().unwrap(),
            delay,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_writes_linked_click() {
        let clicks = MemoryWriter::new();
        let em = emitter(clicks.clone());
        let mut rx = em.bus.subscribe();
        let scheduled = schedule(&em, Duration::from_millis(2_750));
        let imp = scheduled.impression.clone();

        delayed_click(em.clone(), scheduled, CancellationToken::new()).await;

        let records = clicks.records();
        assert_eq!(records.len(), 1);
        let click: Click = serde_json::from_slice(&records[0].value).unwrap();
        assert_eq!(click.impr_id, imp.impr_id);
        assert_eq!(click.user_id, imp.user_id);
        assert_eq!(records[0].key, click.click_id.as_bytes());
        assert_eq!(click.timestamp_ms - imp.timestamp_ms, 2_750);
        assert_eq!(em.stats.snapshot().clicks_written, 1);

        let notice = rx.recv().await.unwrap();
        assert_eq!(notice.kind, NoticeKind::ClickWritten);
        assert_eq!(notice.delay_ms, Some(2_750));
    }

    #[tokio::test(start_paused = true)]
    async fn time_spent_before_the_task_starts_counts_toward_the_delay() {
        let clicks = MemoryWriter::new();
        let em = emitter(clicks.clone());
        let scheduled = schedule(&em, Duration::from_millis(300));
        let imp = scheduled.impression.clone();

        // A slow impression write delays the spawn past part of the click delay.
        time::sleep(Duration::from_millis(200)).await;
        delayed_click(em.clone(), scheduled, CancellationToken::new()).await;

        let click: Click = serde_json::from_slice(&clicks.records()[0].value).unwrap();
        assert_eq!(click.timestamp_ms - imp.timestamp_ms, 300);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_before_deadline_writes_nothing() {
        let clicks = MemoryWriter::new();
        let em = emitter(clicks.clone());
        let shutdown = CancellationToken::new();

        let task = tokio::spawn(delayed_click(
            em.clone(),
            schedule(&em, Duration::from_secs(10)),
            shutdown.clone(),
        ));
        time::sleep(Duration::from_secs(3)).await;
        shutdown.cancel();
        task.await.unwrap();

        // Long past the scheduled deadline: still nothing.
        time::sleep(Duration::from_secs(30)).await;
        assert!(clicks.records().is_empty());
        assert_eq!(clicks.send_attempts(), 0);
        assert_eq!(em.stats.snapshot().clicks_canceled, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_wins_a_tie() {
        let clicks = MemoryWriter::new();
        let em = emitter(clicks.clone());
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        delayed_click(em.clone(), schedule(&em, Duration::ZERO), shutdown).await;
        assert!(clicks.records().is_empty());
        assert_eq!(em.stats.snapshot().clicks_canceled, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_click_write_is_not_fatal() {
        let clicks = MemoryWriter::named(CLICKS).failing_sends("not leader for partition");
        let em = emitter(clicks.clone());
        let mut rx = em.bus.subscribe();

        delayed_click(
            em.clone(),
            schedule(&em, Duration::from_millis(5)),
            CancellationToken::new(),
        )
        .await;

        let summary = em.stats.snapshot();
        assert_eq!(summary.clicks_failed, 1);
        assert_eq!(summary.clicks_written, 0);
        let notice = rx.recv().await.unwrap();
        assert_eq!(notice.kind, NoticeKind::ClickFailed);
        assert!(notice.reason.unwrap().contains("not leader"));
    }
}
