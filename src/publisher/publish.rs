//! # Publisher port.
//!
//! The generator only ever sees a [`PublisherRef`]: it writes events through it from the
//! control loop and from every click task concurrently, then closes it once at the end of
//! the drain. Implementations must tolerate concurrent `write` calls.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::{CloseError, PublishError};
use crate::model::Event;

/// Shared handle to a publisher.
pub type PublisherRef = Arc<dyn Publish>;

/// # Event delivery capability.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use tokio_util::sync::CancellationToken;
/// use adsynth::{CloseError, Event, Publish, PublishError};
///
/// struct Discard;
///
/// #[async_trait]
/// impl Publish for Discard {
///     async fn write(&self, ctx: &CancellationToken, event: &dyn Event) -> Result<(), PublishError> {
///         if ctx.is_cancelled() {
///             return Err(PublishError::Canceled);
///         }
///         event.payload()?;
///         Ok(())
///     }
///
///     async fn close(&self) -> Vec<CloseError> {
///         Vec::new()
///     }
/// }
/// ```
#[async_trait]
pub trait Publish: Send + Sync + 'static {
    /// Delivers one event to the destination it names, keyed by its identity key.
    ///
    /// - A payload encoding failure is returned as-is and nothing is sent.
    /// - Once `ctx` is cancelled the call returns promptly with [`PublishError::Canceled`].
    async fn write(&self, ctx: &CancellationToken, event: &dyn Event) -> Result<(), PublishError>;

    /// Releases every underlying resource.
    ///
    /// Attempts all of them even when some fail, returning one [`CloseError`] per failure.
    async fn close(&self) -> Vec<CloseError>;
}
