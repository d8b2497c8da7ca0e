//! # Publishable event capability.
//!
//! An [`Event`] is anything the publisher can route: it names its destination,
//! exposes the key used for partitioning/dedup, and encodes its own body.
//! The mapping from fields to these three operations must be deterministic and free
//! of side effects.

use crate::error::SerializationError;

/// Destination of [`Impression`](crate::Impression) events.
pub const IMPRESSIONS: &str = "impressions";

/// Destination of [`Click`](crate::Click) events.
pub const CLICKS: &str = "clicks";

/// # Publishable event.
///
/// Object safe, so the publisher takes `&dyn Event`. `Send + Sync` lets a borrowed event
/// live across await points inside a write.
///
/// # Example
/// ```
/// use adsynth::{Event, SerializationError};
///
/// struct Heartbeat;
///
/// impl Event for Heartbeat {
///     fn identity_key(&self) -> &[u8] { b"hb" }
///     fn destination(&self) -> &str { "heartbeats" }
///     fn payload(&self) -> Result<Vec<u8>, SerializationError> { Ok(b"{}".to_vec()) }
/// }
///
/// assert_eq!(Heartbeat.destination(), "heartbeats");
/// ```
pub trait Event: Send + Sync {
    /// Partitioning / dedup key, sent as raw bytes.
    fn identity_key(&self) -> &[u8];

    /// Logical destination (topic / stream) name.
    fn destination(&self) -> &str;

    /// Encodes the event body.
    fn payload(&self) -> Result<Vec<u8>, SerializationError>;
}
