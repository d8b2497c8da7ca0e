use std::sync::Arc;

use async_trait::async_trait;

use crate::error::PublishError;

/// Shared handle to a destination writer.
pub type WriterRef = Arc<dyn DestinationWriter>;

/// # Transport resource bound to one destination.
///
/// A writer delivers already-encoded messages; routing, encoding and cancellation are handled
/// by [`TopicPublisher`](crate::TopicPublisher). `send` may be called concurrently.
#[async_trait]
pub trait DestinationWriter: Send + Sync + 'static {
    /// Delivers one message.
    async fn send(&self, key: &[u8], value: Vec<u8>) -> Result<(), PublishError>;

    /// Releases the resource. Later sends fail with [`PublishError::Closed`].
    async fn close(&self) -> Result<(), PublishError>;
}
