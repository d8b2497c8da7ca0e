//! # Generator: the impression control loop and the drain that ends it.
//!
//! The [`Generator`] owns the notice bus, the subscriber fan-out and the publisher. It ticks
//! at the configured rate, writes one impression per tick, schedules delayed clicks through a
//! [`ShutdownCoordinator`], and on shutdown drains every click task before closing the
//! publisher.
//!
//! ## States
//! ```text
//! run(token)
//!   │
//!   ├─ Running ───────────────────────────────────────────────────────────────┐
//!   │    loop select! (biased)                                                 │
//!   │      ├─ token.cancelled() ─► leave loop                                  │
//!   │      └─ ticker.tick()     ─► impression (created = now)                  │
//!   │                              ├─ chance(p)? ─► delay ∈ [0, D]             │
//!   │                              │    └─► spawn(click at created + delay)    │
//!   │                              └─ publisher.write(impression)              │
//!   │                                                                          │
//!   ├─ Draining ◄──────────────────────────────────────────────────────────────┘
//!   │    Bus.publish(ShutdownRequested)
//!   │    coordinator.drain_with_grace(cfg.grace)
//!   │      ├─ Ok            ─► Bus.publish(Drained)
//!   │      └─ timeout       ─► Bus.publish(GraceExceeded)
//!   │    publisher.close()  ─► PublisherClosed / CloseFailed (one per destination)
//!   │
//!   └─ Stopped: listener flushed, RunSummary returned
//! ```
//!
//! ## Rules
//! - No impression is generated once shutdown is observed; shutdown wins a tie with a tick.
//! - Write failures are reported (notice + stats) and never stop the loop.
//! - The publisher is closed after the drain, even when the grace ran out.
//! - Every random draw for an impression (campaign, ids, click chance, delay) happens on the
//!   loop, so a seeded run generates the same impressions in the same order.
//! - A click's deadline is measured from the impression's creation, and its task is spawned
//!   before the impression write, so slow writes never push a click past the maximum delay.
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use adsynth::{
//!     CLICKS, Generator, GeneratorConfig, IMPRESSIONS, LogWriter, StdoutWriter,
//!     Subscribe, TopicPublisher,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let publisher = TopicPublisher::new()
//!         .with_writer(IMPRESSIONS, StdoutWriter::new(IMPRESSIONS))
//!         .with_writer(CLICKS, StdoutWriter::new(CLICKS));
//!
//!     let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
//!     let generator = Generator::builder(GeneratorConfig::default(), Arc::new(publisher))
//!         .with_subscribers(subs)
//!         .build()?;
//!
//!     let summary = generator.run_until_signal().await?;
//!     println!("{summary:?}");
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::core::builder::GeneratorBuilder;
use crate::core::click_task::{ScheduledClick, delayed_click};
use crate::core::config::GeneratorConfig;
use crate::core::coordinator::ShutdownCoordinator;
use crate::core::emitter::Emitter;
use crate::core::shutdown;
use crate::core::stats::{RunStats, RunSummary};
use crate::error::RuntimeError;
use crate::lifecycle::{Bus, Notice, NoticeKind};
use crate::publisher::PublisherRef;
use crate::subscribers::{Subscribe, SubscriberSet};

/// Synthetic impression/click generator.
pub struct Generator {
    cfg: GeneratorConfig,
    emitter: Arc<Emitter>,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl Generator {
    /// Starts building a generator around `publisher`.
    pub fn builder(cfg: GeneratorConfig, publisher: PublisherRef) -> GeneratorBuilder {
        GeneratorBuilder::new(cfg, publisher)
    }

    pub(crate) fn new_internal(
        cfg: GeneratorConfig,
        emitter: Arc<Emitter>,
        subscribers: Vec<Arc<dyn Subscribe>>,
    ) -> Self {
        Self {
            cfg,
            emitter,
            subscribers,
        }
    }

    /// The validated configuration.
    pub fn config(&self) -> &GeneratorConfig {
        &self.cfg
    }

    /// Live counters; keep a handle to watch a run in progress.
    pub fn stats(&self) -> Arc<RunStats> {
        Arc::clone(&self.emitter.stats)
    }

    /// The notice bus; receivers see every notice published after they subscribe.
    pub fn bus(&self) -> &Bus {
        &self.emitter.bus
    }

    /// Generates until `shutdown` is cancelled, then drains and closes the publisher.
    ///
    /// Returns the final counters, or the first shutdown failure:
    /// [`RuntimeError::GraceExceeded`] before [`RuntimeError::CloseFailed`].
    pub async fn run(self, shutdown: CancellationToken) -> Result<RunSummary, RuntimeError> {
        let listener = NoticeListener::start(&self.emitter.bus, self.subscribers.clone());
        let coordinator = ShutdownCoordinator::new(shutdown);

        self.emitter.bus.publish(
            Notice::new(NoticeKind::GeneratorStarted).with_reason(format!(
                "rate={}/s click_probability={} max_click_delay={:?}",
                self.cfg.impressions_per_second,
                self.cfg.click_probability,
                self.cfg.max_click_delay,
            )),
        );

        self.generate(&coordinator).await;
        let result = self.drain(&coordinator).await;

        listener.stop().await;
        result.map(|()| self.emitter.stats.snapshot())
    }

    /// Like [`run`](Self::run), shutting down on SIGINT, SIGTERM or SIGQUIT.
    pub async fn run_until_signal(self) -> Result<RunSummary, RuntimeError> {
        let token = CancellationToken::new();
        let watcher = tokio::spawn(cancel_on_signal(token.clone()));

        let result = self.run(token).await;
        watcher.abort();
        result
    }

    /// Running state: one impression per tick until shutdown is observed.
    async fn generate(&self, coordinator: &ShutdownCoordinator) {
        let period = self.cfg.tick_period();
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let token = coordinator.token();

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = ticker.tick() => {}
            }
            self.tick(coordinator).await;
        }
    }

    async fn tick(&self, coordinator: &ShutdownCoordinator) {
        let em = &self.emitter;
        let created = Instant::now();
        let Some(impression) = em.next_impression() else {
            warn!("campaign list is empty; no impression generated");
            return;
        };

        if em.random.chance(self.cfg.click_probability) {
            let delay = em.random.delay_up_to(self.cfg.max_click_delay);
            em.stats.click_scheduled();
            em.bus.publish(
                Notice::new(NoticeKind::ClickScheduled)
                    .with_key(impression.impr_id.as_str())
                    .with_delay(delay),
            );
            let scheduled = ScheduledClick {
                impression: impression.clone(),
                created,
                delay,
            };
            coordinator.spawn(delayed_click(
                Arc::clone(em),
                scheduled,
                coordinator.token().clone(),
            ));
        }

        em.write_impression(coordinator.token(), &impression).await;
    }

    /// Draining state: wait for click tasks, then release the publisher.
    async fn drain(&self, coordinator: &ShutdownCoordinator) -> Result<(), RuntimeError> {
        let bus = &self.emitter.bus;
        bus.publish(Notice::new(NoticeKind::ShutdownRequested).with_in_flight(coordinator.in_flight()));
        coordinator.shutdown();

        let drained = coordinator.drain_with_grace(self.cfg.grace).await;
        match &drained {
            Ok(()) => bus.publish(Notice::new(NoticeKind::Drained)),
            Err(RuntimeError::GraceExceeded { grace, outstanding }) => bus.publish(
                Notice::new(NoticeKind::GraceExceeded)
                    .with_delay(*grace)
                    .with_in_flight(*outstanding),
            ),
            Err(_) => {}
        }

        let errors = self.emitter.publisher.close().await;
        if errors.is_empty() {
            bus.publish(Notice::new(NoticeKind::PublisherClosed));
        }
        for e in &errors {
            bus.publish(
                Notice::new(NoticeKind::CloseFailed)
                    .with_destination(e.destination.as_str())
                    .with_reason(e.source.to_string()),
            );
        }

        drained?;
        if errors.is_empty() {
            Ok(())
        } else {
            Err(RuntimeError::CloseFailed { errors })
        }
    }
}

async fn cancel_on_signal(token: CancellationToken) {
    match shutdown::wait_for_termination().await {
        Ok(signal) => info!(%signal, "termination requested"),
        Err(e) => warn!(error = %e, "cannot listen for termination signals; stopping"),
    }
    token.cancel();
}

/// Forwards bus notices to the subscriber set until stopped.
struct NoticeListener {
    stop: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl NoticeListener {
    /// Subscribes to `bus` right away, so notices published after this call are delivered.
    fn start(bus: &Bus, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        let stop = CancellationToken::new();
        if subscribers.is_empty() {
            return Self { stop, handle: None };
        }

        let mut rx = bus.subscribe();
        let set = SubscriberSet::new(subscribers, bus.clone());
        let stopped = stop.clone();
        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    res = rx.recv() => match res {
                        Ok(notice) => set.emit(notice),
                        Err(RecvError::Lagged(_)) => continue,
                        Err(RecvError::Closed) => break,
                    },
                    _ = stopped.cancelled() => break,
                }
            }
            loop {
                match rx.try_recv() {
                    Ok(notice) => set.emit(notice),
                    Err(TryRecvError::Lagged(_)) => continue,
                    Err(_) => break,
                }
            }
            set.shutdown().await;
        });
        Self {
            stop,
            handle: Some(handle),
        }
    }

    /// Delivers whatever is still queued, then waits for every subscriber worker.
    async fn stop(self) {
        self.stop.cancel();
        if let Some(handle) = self.handle {
            let _ = handle.await;
        }
    }
}
