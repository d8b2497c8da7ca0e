use std::sync::Arc;

use crate::core::clock::Clock;
use crate::core::config::GeneratorConfig;
use crate::core::emitter::{Emitter, IdLengths};
use crate::core::generator::Generator;
use crate::core::stats::RunStats;
use crate::error::RuntimeError;
use crate::lifecycle::Bus;
use crate::model::RandomSource;
use crate::publisher::PublisherRef;
use crate::subscribers::Subscribe;

/// Builder for a [`Generator`].
pub struct GeneratorBuilder {
    cfg: GeneratorConfig,
    publisher: PublisherRef,
    subscribers: Vec<Arc<dyn Subscribe>>,
    random: Option<RandomSource>,
}

impl GeneratorBuilder {
    /// Starts a builder from a configuration and the publisher every event goes through.
    pub fn new(cfg: GeneratorConfig, publisher: PublisherRef) -> Self {
        Self {
            cfg,
            publisher,
            subscribers: Vec::new(),
            random: None,
        }
    }

    /// Sets notice subscribers (logging, metrics, custom handlers).
    ///
    /// Each subscriber gets a dedicated worker with a bounded queue.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Overrides the random source; otherwise one is derived from `cfg.seed`.
    pub fn with_random(mut self, random: RandomSource) -> Self {
        self.random = Some(random);
        self
    }

    /// Validates the configuration and assembles the generator.
    pub fn build(self) -> Result<Generator, RuntimeError> {
        self.cfg.validate()?;

        let random = self
            .random
            .unwrap_or_else(|| RandomSource::from_seed(self.cfg.seed));
        let emitter = Emitter {
            publisher: self.publisher,
            random: Arc::new(random),
            clock: Clock::start(),
            bus: Bus::new(self.cfg.bus_capacity),
            stats: Arc::new(RunStats::default()),
            campaigns: Arc::clone(&self.cfg.campaigns),
            ids: IdLengths {
                impression: self.cfg.impression_id_len,
                user: self.cfg.user_id_len,
                click: self.cfg.click_id_len,
            },
        };
        Ok(Generator::new_internal(
            self.cfg,
            Arc::new(emitter),
            self.subscribers,
        ))
    }
}
