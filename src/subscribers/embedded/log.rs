//! # LogWriter: notices as structured logs
//!
//! Renders every [`Notice`] through `tracing`. Per-event notices (impression/click writes)
//! go to `debug`, failures to `warn`, lifecycle transitions to `info`.
//!
//! ## Example output (fmt layer)
//! ```text
//! INFO generator started reason="rate=5/s click_probability=0.25 max_click_delay=10s"
//! WARN impression write failed key="impr-Q2x8fL0a" destination="impressions" reason="write cancelled"
//! INFO shutdown requested, draining in_flight=3
//! INFO drained
//! INFO publisher closed
//! ```

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::lifecycle::{Notice, NoticeKind};
use crate::subscribers::Subscribe;

/// Notice writer subscriber backed by `tracing`.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_notice(&self, n: &Notice) {
        let key = n.key.as_deref().unwrap_or("-");
        let destination = n.destination.as_deref().unwrap_or("-");
        let reason = n.reason.as_deref().unwrap_or("-");

        match n.kind {
            NoticeKind::GeneratorStarted => info!(reason, "generator started"),
            NoticeKind::ImpressionWritten => debug!(key, destination, "impression written"),
            NoticeKind::ImpressionFailed => {
                warn!(key, destination, reason, "impression write failed")
            }
            NoticeKind::ClickScheduled => debug!(key, delay_ms = n.delay_ms, "click scheduled"),
            NoticeKind::ClickWritten => {
                debug!(key, destination, delay_ms = n.delay_ms, "click written")
            }
            NoticeKind::ClickFailed => warn!(key, destination, reason, "click write failed"),
            NoticeKind::ClickCanceled => {
                debug!(key, delay_ms = n.delay_ms, "click dropped by shutdown")
            }
            NoticeKind::ShutdownRequested => {
                info!(in_flight = n.in_flight, "shutdown requested, draining")
            }
            NoticeKind::Drained => info!("drained"),
            NoticeKind::GraceExceeded => warn!(
                in_flight = n.in_flight,
                grace_ms = n.delay_ms,
                "drain grace exceeded"
            ),
            NoticeKind::PublisherClosed => info!("publisher closed"),
            NoticeKind::CloseFailed => warn!(destination, reason, "destination close failed"),
            NoticeKind::SubscriberOverflow => warn!(subscriber = key, reason, "subscriber overflow"),
            NoticeKind::SubscriberPanicked => warn!(subscriber = key, reason, "subscriber panicked"),
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
