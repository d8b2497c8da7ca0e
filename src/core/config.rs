//! # Generator configuration.
//!
//! Provides [`GeneratorConfig`], the immutable settings a [`Generator`](crate::Generator) is
//! built from. There is no file or environment layer: callers fill the struct (or start from
//! [`Default`]) and pass it in.
//!
//! ## Sentinel values
//! - `grace = None` → drain waits for every click task, however long
//! - `seed = None` → random source seeded from OS entropy

use std::sync::Arc;
use std::time::Duration;

use crate::error::RuntimeError;

/// Campaigns used when none are configured.
pub const DEFAULT_CAMPAIGNS: [&str; 3] = ["campaign-1", "campaign-2", "campaign-3"];

/// Settings for the generation scheduler.
///
/// ## Field semantics
/// - `impressions_per_second`: tick rate; one impression per tick
/// - `click_probability`: chance in `[0, 1]` that an impression schedules a click
/// - `max_click_delay`: upper bound `D` of the uniform click delay `[0, D]`
/// - `campaigns`: fixed set an impression's campaign is drawn from
/// - `*_id_len`: random characters after the `impr-` / `user-` / `click-` prefixes
/// - `grace`: optional bound on the drain wait
/// - `bus_capacity`: notice bus ring buffer size (min 1)
/// - `seed`: reproducible random source when set
#[derive(Clone, Debug)]
pub struct GeneratorConfig {
    /// Impressions generated per second.
    pub impressions_per_second: u32,
    /// Probability that an impression yields a delayed click.
    pub click_probability: f64,
    /// Largest delay between an impression and its click.
    pub max_click_delay: Duration,
    /// Campaign identifiers.
    pub campaigns: Arc<[String]>,
    /// Random characters in impression ids.
    pub impression_id_len: usize,
    /// Random characters in user ids.
    pub user_id_len: usize,
    /// Random characters in click ids.
    pub click_id_len: usize,
    /// Maximum drain wait (`None` = until every click task finishes).
    pub grace: Option<Duration>,
    /// Capacity of the notice bus.
    pub bus_capacity: usize,
    /// Seed for the random source (`None` = OS entropy).
    pub seed: Option<u64>,
}

impl GeneratorConfig {
    /// Interval between two impressions.
    ///
    /// Callers must validate first: [`validate`](Self::validate) rejects a zero rate and any rate
    /// whose period rounds down to zero.
    #[inline]
    pub fn tick_period(&self) -> Duration {
        Duration::from_secs(1) / self.impressions_per_second.max(1)
    }

    /// Checks that the configuration can drive a generator.
    pub fn validate(&self) -> Result<(), RuntimeError> {
        if self.impressions_per_second == 0 {
            return Err(RuntimeError::invalid("impressions_per_second must be > 0"));
        }
        if self.tick_period().is_zero() {
            return Err(RuntimeError::invalid(format!(
                "impressions_per_second {} is finer than the timer resolution",
                self.impressions_per_second
            )));
        }
        if !(0.0..=1.0).contains(&self.click_probability) {
            return Err(RuntimeError::invalid(format!(
                "click_probability must be within [0, 1], got {}",
                self.click_probability
            )));
        }
        if self.campaigns.is_empty() {
            return Err(RuntimeError::invalid("campaigns must not be empty"));
        }
        if self.impression_id_len == 0 || self.user_id_len == 0 || self.click_id_len == 0 {
            return Err(RuntimeError::invalid("identifier lengths must be > 0"));
        }
        Ok(())
    }
}

impl Default for GeneratorConfig {
    /// Default configuration:
    ///
    /// - 5 impressions/s, click probability 0.25, clicks within 10 s
    /// - campaigns `campaign-1..3`
    /// - ids: 8 chars (impressions, clicks), 6 chars (users)
    /// - unbounded drain, bus capacity 1024, entropy seed
    fn default() -> Self {
        Self {
            impressions_per_second: 5,
            click_probability: 0.25,
            max_click_delay: Duration::from_secs(10),
            campaigns: DEFAULT_CAMPAIGNS.iter().map(|c| c.to_string()).collect(),
            impression_id_len: 8,
            user_id_len: 6,
            click_id_len: 8,
            grace: None,
            bus_capacity: 1024,
            seed: None,
        }
    }
}
