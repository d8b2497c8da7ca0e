//! # Notice subscribers for the generator runtime.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out and the
//! built-in [`LogWriter`].
//!
//! ## Architecture
//! ```text
//! Notice flow:
//!   Generator / click task ── publish(Notice) ──► Bus ──► listener ──► SubscriberSet
//!                                                                          │
//!                                                               ┌──────────┼──────────┐
//!                                                               ▼          ▼          ▼
//!                                                           LogWriter   Metrics    Custom
//! ```
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use adsynth::{Notice, NoticeKind, Subscribe};
//! use async_trait::async_trait;
//!
//! struct FailureCounter;
//!
//! #[async_trait]
//! impl Subscribe for FailureCounter {
//!     async fn on_notice(&self, notice: &Notice) {
//!         if matches!(notice.kind, NoticeKind::ImpressionFailed | NoticeKind::ClickFailed) {
//!             // increment a counter
//!         }
//!     }
//! }
//! ```

mod embedded;
mod set;
mod subscribe;

pub use embedded::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
