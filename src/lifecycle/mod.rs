//! Runtime notices: types and broadcast bus.
//!
//! This module groups the notice **data model** and the **bus** the generator, click tasks
//! and subscriber workers publish on.
//!
//! ## Contents
//! - [`NoticeKind`], [`Notice`] classification and metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Generator` (ticks, drain, close), click tasks, `SubscriberSet`
//!   workers (overflow/panic).
//! - **Consumer**: the generator's listener task, which fans out to the `SubscriberSet`.

mod bus;
mod notice;

pub use bus::Bus;
pub use notice::{Notice, NoticeKind};
