//! # Emitter: builds events and writes them through the publisher.
//!
//! Shared (behind an `Arc`) by the control loop and every click task. Each write outcome is
//! published as a notice and counted in [`RunStats`] (clicks by their task, once settled).
//! Failures are never propagated: no single write may stop generation.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::core::clock::Clock;
use crate::core::stats::RunStats;
use crate::lifecycle::{Bus, Notice, NoticeKind};
use crate::model::{Click, Event, Impression, RandomSource};
use crate::publisher::PublisherRef;

/// Identifier lengths for generated events.
#[derive(Clone, Copy, Debug)]
pub(crate) struct IdLengths {
    pub impression: usize,
    pub user: usize,
    pub click: usize,
}

pub(crate) struct Emitter {
    pub publisher: PublisherRef,
    pub random: Arc<RandomSource>,
    pub clock: Clock,
    pub bus: Bus,
    pub stats: Arc<RunStats>,
    pub campaigns: Arc<[String]>,
    pub ids: IdLengths,
}

impl Emitter {
    /// Builds a fresh impression stamped with the current time.
    ///
    /// `None` only for an empty campaign list, which config validation rules out.
    pub fn next_impression(&self) -> Option<Impression> {
        Impression::generate(
            &self.random,
            &self.campaigns,
            self.ids.impression,
            self.ids.user,
            self.clock.now_ms(),
        )
    }

    /// Builds the click for `impression`, stamped with the current time.
    pub fn click_for(&self, impression: &Impression) -> Click {
        Click::for_impression(
            impression,
            self.random.id("click", self.ids.click),
            self.clock.now_ms(),
        )
    }

    /// Writes an impression and counts the outcome.
    pub async fn write_impression(&self, ctx: &CancellationToken, imp: &Impression) {
        let ok = self
            .write(
                ctx,
                imp,
                &imp.impr_id,
                None,
                NoticeKind::ImpressionWritten,
                NoticeKind::ImpressionFailed,
            )
            .await;
        self.stats.impression(ok);
    }

    /// Writes a click emitted `delay` after its impression; returns whether delivery
    /// succeeded. The caller settles the click in [`RunStats`].
    pub async fn write_click(&self, ctx: &CancellationToken, click: &Click, delay: Duration) -> bool {
        self.write(
            ctx,
            click,
            &click.click_id,
            Some(delay),
            NoticeKind::ClickWritten,
            NoticeKind::ClickFailed,
        )
        .await
    }

    async fn write(
        &self,
        ctx: &CancellationToken,
        event: &dyn Event,
        key: &str,
        delay: Option<Duration>,
        written: NoticeKind,
        failed: NoticeKind,
    ) -> bool {
        let (ok, mut notice) = match self.publisher.write(ctx, event).await {
            Ok(()) => (true, Notice::new(written)),
            Err(e) => (false, Notice::new(failed).with_reason(e.to_string())),
        };
        if let Some(delay) = delay {
            notice = notice.with_delay(delay);
        }
        self.bus.publish(
            notice
                .with_key(key)
                .with_destination(event.destination()),
        );
        ok
    }
}
