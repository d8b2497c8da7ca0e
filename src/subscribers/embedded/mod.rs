//! # Built-in subscribers
//!
//! - [`LogWriter`]: renders notices through `tracing` with structured fields.

mod log;

pub use log::LogWriter;
