//! Runtime core: the generation scheduler and its shutdown.
//!
//! The public entry point is [`Generator`], built through [`GeneratorBuilder`] from a
//! [`GeneratorConfig`].
//!
//! Internal modules:
//! - [`generator`]: control loop (Running) and drain (Draining);
//! - [`click_task`]: one delayed click raced against shutdown;
//! - [`emitter`]: builds events, writes them, reports outcomes;
//! - [`coordinator`]: counting join over in-flight click tasks;
//! - [`shutdown`]: cross-platform termination signals;
//! - [`clock`], [`stats`]: event timestamps and run counters.

mod builder;
mod click_task;
mod clock;
mod config;
mod coordinator;
mod emitter;
mod generator;
mod shutdown;
mod stats;

pub use builder::GeneratorBuilder;
pub use clock::Clock;
pub use config::{DEFAULT_CAMPAIGNS, GeneratorConfig};
pub use coordinator::{InFlight, ShutdownCoordinator};
pub use generator::Generator;
pub use shutdown::{TerminationSignal, wait_for_termination};
pub use stats::{RunStats, RunSummary};
