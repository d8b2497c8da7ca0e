//! # Core subscriber trait
//!
//! `Subscribe` is the extension point for plugging custom notice handlers into the
//! generator. Each subscriber is driven by a dedicated worker loop fed by a bounded
//! queue owned by the [`SubscriberSet`](crate::SubscriberSet).
//!
//! ## Contract
//! - Implementations may be slow (I/O, batching) – they do **not** block the generator
//!   nor other subscribers.
//! - Each subscriber **declares** its preferred queue capacity via
//!   [`Subscribe::queue_capacity`]. If the queue overflows, notices for that subscriber are
//!   **dropped** and a `SubscriberOverflow` notice is published.

use crate::lifecycle::Notice;
use async_trait::async_trait;

/// Contract for notice subscribers.
///
/// Called from a subscriber-dedicated worker task. Implementations should avoid
/// blocking the async runtime.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handle a single notice.
    async fn on_notice(&self, notice: &Notice);

    /// Human-readable name (for logs/notices).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this subscriber's queue.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
