//! # adsynth
//!
//! **adsynth** generates a synthetic stream of ad impressions and the clicks that follow
//! some of them, for exercising downstream stream processors.
//!
//! Impressions are produced at a fixed rate. Each one schedules, with a configured
//! probability, a click written after a random delay. On shutdown the generator stops
//! producing, drops clicks whose delay has not elapsed, waits for every click task to
//! finish and only then closes the publisher.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!                ┌────────────────────────────────────────────┐
//!                │  Generator (control loop, one per run)     │
//!                │  - ticker (impressions_per_second)         │
//!                │  - RandomSource (seedable)                 │
//!                │  - ShutdownCoordinator (in-flight clicks)  │
//!                └──────┬──────────────────────┬──────────────┘
//!          impression   │                      │ spawn per scheduled click
//!                       ▼                      ▼
//!               ┌──────────────┐     ┌──────────────────────┐
//!               │   Publish    │◄────│  delayed click task  │
//!               │ (TopicPub.)  │     │ select!(shutdown,    │
//!               └──────┬───────┘     │         sleep(delay))│
//!                      │             └──────────────────────┘
//!          ┌───────────┴───────────┐
//!          ▼                       ▼
//!   DestinationWriter       DestinationWriter
//!    "impressions"             "clicks"
//!   (MQTT / stdout / mem)  (MQTT / stdout / mem)
//!
//!   every outcome ── publish(Notice) ──► Bus ──► listener ──► SubscriberSet ──► LogWriter, ...
//! ```
//!
//! ### Lifecycle
//! ```text
//! Running  ── shutdown token cancelled ──►  Draining  ── tasks done, publisher closed ──►  Stopped
//!   tick ─► write impression                  no new impressions
//!        └► maybe spawn click task            pending click delays abandoned
//!                                             wait (optionally bounded by grace)
//!                                             Publish::close() exactly once
//! ```
//!
//! ## Features
//! | Area            | Description                                             | Key types / traits                          |
//! |-----------------|---------------------------------------------------------|---------------------------------------------|
//! | **Generation**  | Rate-driven impressions with delayed, linked clicks.    | [`Generator`], [`GeneratorConfig`]          |
//! | **Events**      | JSON payloads keyed by their identifier.                | [`Event`], [`Impression`], [`Click`]        |
//! | **Publishing**  | Destination-routed, cancellable writes.                 | [`Publish`], [`TopicPublisher`], [`DestinationWriter`] |
//! | **Shutdown**    | Broadcast plus counting join over click tasks.          | [`ShutdownCoordinator`]                     |
//! | **Observation** | Runtime notices fanned out to subscribers.              | [`Subscribe`], [`Notice`], [`LogWriter`]    |
//! | **Errors**      | Typed errors with stable labels.                        | [`PublishError`], [`RuntimeError`]          |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use adsynth::{CLICKS, Generator, GeneratorConfig, IMPRESSIONS, MemoryWriter, TopicPublisher};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let impressions = MemoryWriter::named(IMPRESSIONS);
//!     let publisher = TopicPublisher::new()
//!         .with_writer(IMPRESSIONS, impressions.clone())
//!         .with_writer(CLICKS, MemoryWriter::named(CLICKS));
//!
//!     let cfg = GeneratorConfig {
//!         impressions_per_second: 50,
//!         max_click_delay: Duration::from_millis(20),
//!         seed: Some(1),
//!         ..GeneratorConfig::default()
//!     };
//!     let generator = Generator::builder(cfg, Arc::new(publisher)).build()?;
//!
//!     let token = CancellationToken::new();
//!     let stop = token.clone();
//!     tokio::spawn(async move {
//!         tokio::time::sleep(Duration::from_millis(200)).await;
//!         stop.cancel();
//!     });
//!
//!     let summary = generator.run(token).await?;
//!     assert_eq!(summary.impressions_written as usize, impressions.records().len());
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod lifecycle;
mod model;
mod publisher;
mod subscribers;

// ---- Public re-exports ----

pub use crate::core::{
    Clock, DEFAULT_CAMPAIGNS, Generator, GeneratorBuilder, GeneratorConfig, InFlight, RunStats,
    RunSummary, ShutdownCoordinator, TerminationSignal, wait_for_termination,
};
pub use error::{CloseError, PublishError, RuntimeError, SerializationError};
pub use lifecycle::{Bus, Notice, NoticeKind};
pub use model::{CLICKS, Click, Event, IMPRESSIONS, Impression, RandomSource};
pub use publisher::{
    DestinationWriter, MemoryWriter, MqttSettings, MqttWriter, Publish, PublisherRef, Record,
    StdoutWriter, TopicPublisher, WriterRef,
};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
