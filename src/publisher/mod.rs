//! # Publisher port and destination writers.
//!
//! - [`Publish`] the abstract capability the generator writes through (write one event,
//!   close everything)
//! - [`DestinationWriter`] one transport-level resource per destination
//! - [`TopicPublisher`] routes events to writers by destination and closes them all
//! - [`MemoryWriter`], [`StdoutWriter`], [`MqttWriter`] concrete writers
//!
//! ## Wiring
//! ```text
//! Generator ──write(ctx, &dyn Event)──► TopicPublisher
//!                                           │ payload() ─► Err → Serialization (no send)
//!                                           │ writers[destination]
//!                                           ├──► "impressions" ─► DestinationWriter::send(key, value)
//!                                           └──► "clicks"      ─► DestinationWriter::send(key, value)
//! ```
//! Retry policy, if any, belongs to the transport below the writer.

mod memory;
mod mqtt;
mod publish;
mod stdout;
mod topic;
mod writer;

pub use memory::{MemoryWriter, Record};
pub use mqtt::{MqttSettings, MqttWriter};
pub use publish::{Publish, PublisherRef};
pub use stdout::StdoutWriter;
pub use topic::TopicPublisher;
pub use writer::{DestinationWriter, WriterRef};
