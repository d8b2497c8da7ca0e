//! # Seedable random source.
//!
//! Every random decision the generator makes (identifiers, campaign choice, click draw,
//! click delay) goes through one [`RandomSource`]. Seed it to reproduce a run exactly;
//! leave it unseeded for OS entropy.
//!
//! Identifiers are `prefix + "-" + n alphanumerics`. Uniqueness is probabilistic only.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use rand::distr::Alphanumeric;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

/// Shared, seedable random source.
///
/// The generator loop and click tasks draw from the same instance; draws are serialized by
/// an internal mutex that is never held across an await.
#[derive(Debug)]
pub struct RandomSource {
    rng: Mutex<StdRng>,
}

impl RandomSource {
    /// Creates a deterministic source: equal seeds give equal sequences.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Creates a source seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Seeded when `seed` is given, entropy-backed otherwise.
    pub fn from_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(s) => Self::seeded(s),
            None => Self::from_entropy(),
        }
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut rng)
    }

    /// Random alphanumeric string of length `n`.
    pub fn alphanumeric(&self, n: usize) -> String {
        self.with_rng(|rng| (0..n).map(|_| char::from(rng.sample(Alphanumeric))).collect())
    }

    /// Identifier of the form `prefix-XXXX` with `n` random characters.
    pub fn id(&self, prefix: &str, n: usize) -> String {
        format!("{prefix}-{}", self.alphanumeric(n))
    }

    /// Picks one item uniformly; `None` for an empty slice.
    pub fn choose<'a, T>(&self, items: &'a [T]) -> Option<&'a T> {
        self.with_rng(|rng| items.choose(rng))
    }

    /// Draws a uniform value in `[0, 1)` and reports whether it falls below `p`.
    pub fn chance(&self, p: f64) -> bool {
        self.with_rng(|rng| rng.random::<f64>() < p)
    }

    /// Uniform delay in `[0, max]`, millisecond granularity.
    pub fn delay_up_to(&self, max: Duration) -> Duration {
        let ms = u64::try_from(max.as_millis()).unwrap_or(u64::MAX);
        if ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(self.with_rng(|rng| rng.random_range(0..=ms)))
    }
}

impl Default for RandomSource {
    fn default() -> Self {
        Self::from_entropy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_seeds_reproduce_sequences() {
        let a = RandomSource::seeded(99);
        let b = RandomSource::seeded(99);
        for _ in 0..20 {
            assert_eq!(a.id("impr", 8), b.id("impr", 8));
            assert_eq!(a.chance(0.5), b.chance(0.5));
            assert_eq!(
                a.delay_up_to(Duration::from_secs(10)),
                b.delay_up_to(Duration::from_secs(10))
            );
        }
    }

    #[test]
    fn id_has_prefix_and_alphanumeric_suffix() {
        let r = RandomSource::seeded(3);
        let id = r.id("click", 8);
        let (prefix, suffix) = id.split_once('-').unwrap();
        assert_eq!(prefix, "click");
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn chance_converges_to_probability() {
        let r = RandomSource::seeded(2024);
        let n = 10_000;
        let hits = (0..n).filter(|_| r.chance(0.25)).count();
        let observed = hits as f64 / n as f64;
        assert!(
            (0.23..=0.27).contains(&observed),
            "observed click fraction {observed} outside tolerance"
        );
    }

    #[test]
    fn chance_edges_are_exact() {
        let r = RandomSource::seeded(5);
        assert!((0..1_000).all(|_| !r.chance(0.0)));
        assert!((0..1_000).all(|_| r.chance(1.0)));
    }

    #[test]
    fn delay_stays_within_bound() {
        let r = RandomSource::seeded(11);
        let max = Duration::from_millis(750);
        for _ in 0..1_000 {
            assert!(r.delay_up_to(max) <= max);
        }
        assert_eq!(r.delay_up_to(Duration::ZERO), Duration::ZERO);
    }

    #[test]
    fn choose_covers_every_campaign() {
        let r = RandomSource::seeded(8);
        let campaigns = ["campaign-1", "campaign-2", "campaign-3"];
        let mut seen = [0usize; 3];
        for _ in 0..3_000 {
            let c = r.choose(&campaigns).unwrap();
            let idx = campaigns.iter().position(|x| x == c).unwrap();
            seen[idx] += 1;
        }
        assert!(seen.iter().all(|&n| n > 800), "skewed campaign draw: {seen:?}");
        assert!(r.choose::<&str>(&[]).is_none());
    }
}
