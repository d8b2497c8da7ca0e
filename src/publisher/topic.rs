//! # Destination-routing publisher.
//!
//! [`TopicPublisher`] owns one [`DestinationWriter`] per destination and implements
//! [`Publish`] on top of them.
//!
//! ## Write path
//! ```text
//! write(ctx, event)
//!   ├─► event.payload()            Err ─► PublishError::Serialization (nothing sent)
//!   ├─► writers[event.destination] None ─► PublishError::UnknownDestination
//!   └─► select! (biased)
//!         ├─ ctx.cancelled()       ─► PublishError::Canceled
//!         └─ writer.send(key, value)
//! ```
//!
//! ## Close path
//! Every writer is closed in destination order; failures are collected, never short-circuited.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::{CloseError, PublishError};
use crate::model::Event;
use crate::publisher::publish::Publish;
use crate::publisher::writer::{DestinationWriter, WriterRef};

/// Publisher that routes events to per-destination writers.
#[derive(Default)]
pub struct TopicPublisher {
    writers: BTreeMap<String, WriterRef>,
}

impl TopicPublisher {
    /// Creates a publisher with no destinations bound.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `writer` to `destination`, replacing any previous binding.
    pub fn with_writer(
        mut self,
        destination: impl Into<String>,
        writer: impl DestinationWriter,
    ) -> Self {
        self.writers.insert(destination.into(), Arc::new(writer));
        self
    }

    /// Builds one writer per destination with `make`.
    pub fn from_destinations<W, F>(destinations: &[&str], mut make: F) -> Self
    where
        W: DestinationWriter,
        F: FnMut(&str) -> W,
    {
        destinations
            .iter()
            .fold(Self::new(), |p, d| p.with_writer(*d, make(*d)))
    }

    /// Bound destination names, sorted.
    pub fn destinations(&self) -> Vec<&str> {
        self.writers.keys().map(String::as_str).collect()
    }
}

#[async_trait]
impl Publish for TopicPublisher {
    async fn write(&self, ctx: &CancellationToken, event: &dyn Event) -> Result<(), PublishError> {
        let value = event.payload()?;
        let destination = event.destination();
        let writer = self
            .writers
            .get(destination)
            .ok_or_else(|| PublishError::UnknownDestination {
                destination: destination.to_string(),
            })?;

        tokio::select! {
            biased;
            _ = ctx.cancelled() => Err(PublishError::Canceled),
            res = writer.send(event.identity_key(), value) => res,
        }
    }

    async fn close(&self) -> Vec<CloseError> {
        let mut errors = Vec::new();
        for (destination, writer) in &self.writers {
            if let Err(source) = writer.close().await {
                errors.push(CloseError {
                    destination: destination.clone(),
                    source,
                });
            }
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SerializationError;
    use crate::model::{CLICKS, Click, IMPRESSIONS, Impression};
    use crate::publisher::MemoryWriter;
    use std::time::Duration;

    fn impression() -> Impression {
        Impression {
            impr_id: "impr-k1".into(),
            user_id: "user-u1".into(),
            campaign_id: "campaign-1".into(),
            timestamp_ms: 10,
        }
    }

    fn pair() -> (TopicPublisher, MemoryWriter, MemoryWriter) {
        let imps = MemoryWriter::new();
        let clicks = MemoryWriter::new();
        let p = TopicPublisher::new()
            .with_writer(IMPRESSIONS, imps.clone())
            .with_writer(CLICKS, clicks.clone());
        (p, imps, clicks)
    }

    struct Unencodable;

    impl Event for Unencodable {
        fn identity_key(&self) -> &[u8] {
            b"bad"
        }
        fn destination(&self) -> &str {
            IMPRESSIONS
        }
        fn payload(&self) -> Result<Vec<u8>, SerializationError> {
            Err(SerializationError::Unrepresentable {
                field: "ts",
                reason: "not a number".into(),
            })
        }
    }

    #[tokio::test]
    async fn routes_by_destination_with_identity_key() {
        let (p, imps, clicks) = pair();
        let ctx = CancellationToken::new();
        let imp = impression();
        let click = Click::for_impression(&imp, "click-c1".into(), 20);

        p.write(&ctx, &imp).await.unwrap();
        p.write(&ctx, &click).await.unwrap();

        let imp_records = imps.records();
        assert_eq!(imp_records.len(), 1);
        assert_eq!(imp_records[0].key, b"impr-k1");
        assert_eq!(imp_records[0].value, imp.payload().unwrap());

        let click_records = clicks.records();
        assert_eq!(click_records.len(), 1);
        assert_eq!(click_records[0].key, b"click-c1");
        let decoded: Click = serde_json::from_slice(&click_records[0].value).unwrap();
        assert_eq!(decoded, click);
    }

    #[tokio::test]
    async fn payload_failure_aborts_before_delivery() {
        let (p, imps, _) = pair();
        let err = p
            .write(&CancellationToken::new(), &Unencodable)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PublishError::Serialization(SerializationError::Unrepresentable { field: "ts", .. })
        ));
        assert_eq!(imps.send_attempts(), 0);
    }

    #[tokio::test]
    async fn unknown_destination_is_reported() {
        let p = TopicPublisher::new().with_writer(CLICKS, MemoryWriter::new());
        let err = p
            .write(&CancellationToken::new(), &impression())
            .await
            .unwrap_err();
        assert!(
            matches!(err, PublishError::UnknownDestination { ref destination } if destination == "impressions")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_a_blocked_send() {
        let slow = MemoryWriter::new().with_latency(Duration::from_secs(3600));
        let p = TopicPublisher::new().with_writer(IMPRESSIONS, slow.clone());
        let ctx = CancellationToken::new();

        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            canceller.cancel();
        });

        let started = tokio::time::Instant::now();
        let err = p.write(&ctx, &impression()).await.unwrap_err();
        assert!(matches!(err, PublishError::Canceled));
        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(slow.records().is_empty());
    }

    #[tokio::test]
    async fn already_cancelled_context_sends_nothing() {
        let (p, imps, _) = pair();
        let ctx = CancellationToken::new();
        ctx.cancel();

        let err = p.write(&ctx, &impression()).await.unwrap_err();
        assert!(matches!(err, PublishError::Canceled));
        assert!(imps.records().is_empty());
    }

    #[tokio::test]
    async fn close_collects_partial_failures_and_closes_everything() {
        let imps = MemoryWriter::new();
        let clicks = MemoryWriter::new().failing_close("broker unreachable");
        let p = TopicPublisher::new()
            .with_writer(IMPRESSIONS, imps.clone())
            .with_writer(CLICKS, clicks.clone());

        let errors = p.close().await;

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].destination, "clicks");
        assert!(errors[0].to_string().contains("broker unreachable"));
        assert!(imps.is_closed());
        assert!(clicks.is_closed());
    }

    #[tokio::test]
    async fn writes_after_close_fail() {
        let (p, _, _) = pair();
        assert!(p.close().await.is_empty());

        let err = p
            .write(&CancellationToken::new(), &impression())
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::Closed { .. }));
    }

    #[test]
    fn from_destinations_binds_every_name() {
        let p = TopicPublisher::from_destinations(&[IMPRESSIONS, CLICKS], |_| MemoryWriter::new());
        assert_eq!(p.destinations(), vec!["clicks", "impressions"]);
    }
}
