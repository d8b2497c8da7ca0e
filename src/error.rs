//! Error types used by the generator runtime and its publishers.
//!
//! This module defines the error taxonomy of the crate:
//!
//! - [`SerializationError`]: an event body could not be encoded; aborts that single write.
//! - [`PublishError`]: delivery of one event failed; never fatal for the generator.
//! - [`CloseError`]: one destination failed to release its resources during close.
//! - [`RuntimeError`]: errors raised by the generator runtime itself.
//!
//! Every enum provides a short stable label (`as_label`) for logs and notices.

use std::time::Duration;
use thiserror::Error;

/// # Errors produced while encoding an event body.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SerializationError {
    /// The JSON encoder rejected the value.
    #[error("json encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    /// A field holds a value the configured encoding cannot represent.
    #[error("field `{field}` cannot be encoded: {reason}")]
    Unrepresentable {
        /// Name of the offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

impl SerializationError {
    /// Returns a short stable label (snake_case) for use in logs/notices.
    pub fn as_label(&self) -> &'static str {
        match self {
            SerializationError::Json(_) => "serialization_json",
            SerializationError::Unrepresentable { .. } => "serialization_unrepresentable",
        }
    }
}

/// # Errors produced by a single publisher write.
///
/// None of these stop the generator: they are reported and counted, and generation
/// continues on the next tick.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum PublishError {
    /// The event payload could not be encoded; nothing was sent.
    #[error(transparent)]
    Serialization(#[from] SerializationError),

    /// No writer is bound to the event's destination.
    #[error("no writer bound to destination `{destination}`")]
    UnknownDestination {
        /// The destination the event asked for.
        destination: String,
    },

    /// The operation context was cancelled before delivery completed.
    #[error("write cancelled")]
    Canceled,

    /// The destination writer was already closed.
    #[error("destination `{destination}` is closed")]
    Closed {
        /// The closed destination.
        destination: String,
    },

    /// The underlying transport rejected or failed the operation.
    #[error("transport failure on `{destination}`: {error}")]
    Transport {
        /// Destination the transport was serving.
        destination: String,
        /// Transport error message.
        error: String,
    },
}

impl PublishError {
    /// Returns a short stable label (snake_case) for use in logs/notices.
    ///
    /// # Example
    /// ```
    /// use adsynth::PublishError;
    ///
    /// assert_eq!(PublishError::Canceled.as_label(), "publish_canceled");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            PublishError::Serialization(_) => "publish_serialization",
            PublishError::UnknownDestination { .. } => "publish_unknown_destination",
            PublishError::Canceled => "publish_canceled",
            PublishError::Closed { .. } => "publish_closed",
            PublishError::Transport { .. } => "publish_transport",
        }
    }

    /// Builds a [`PublishError::Transport`] from any displayable error.
    pub fn transport(destination: impl Into<String>, error: impl std::fmt::Display) -> Self {
        PublishError::Transport {
            destination: destination.into(),
            error: error.to_string(),
        }
    }
}

/// # Failure to release one destination's resources.
///
/// Returned in bulk by [`Publish::close`](crate::Publish::close): one entry per failing
/// destination, never short-circuited.
#[derive(Error, Debug)]
#[error("closing `{destination}` failed: {source}")]
pub struct CloseError {
    /// Destination whose writer failed to close.
    pub destination: String,
    /// The underlying failure.
    #[source]
    pub source: PublishError,
}

/// # Errors produced by the generator runtime.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The supplied configuration cannot drive a generator.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// What is wrong with it.
        reason: String,
    },

    /// Draining exceeded the configured grace period with click tasks still outstanding.
    #[error("drain grace {grace:?} exceeded; {outstanding} click task(s) still in flight")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Number of tasks still registered when the grace period ran out.
        outstanding: usize,
    },

    /// One or more destinations failed to close.
    #[error("{} destination(s) failed to close: {}", .errors.len(), join_errors(.errors))]
    CloseFailed {
        /// Every close failure, in destination order.
        errors: Vec<CloseError>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/notices.
    ///
    /// # Example
    /// ```
    /// use adsynth::RuntimeError;
    ///
    /// let err = RuntimeError::CloseFailed { errors: vec![] };
    /// assert_eq!(err.as_label(), "runtime_close_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::InvalidConfig { .. } => "runtime_invalid_config",
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
            RuntimeError::CloseFailed { .. } => "runtime_close_failed",
        }
    }

    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        RuntimeError::InvalidConfig {
            reason: reason.into(),
        }
    }
}

fn join_errors(errors: &[CloseError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_failed_lists_every_destination() {
        let err = RuntimeError::CloseFailed {
            errors: vec![
                CloseError {
                    destination: "clicks".into(),
                    source: PublishError::transport("clicks", "broker gone"),
                },
                CloseError {
                    destination: "impressions".into(),
                    source: PublishError::Closed {
                        destination: "impressions".into(),
                    },
                },
            ],
        };
        let msg = err.to_string();
        assert!(msg.starts_with("2 destination(s) failed to close"));
        assert!(msg.contains("clicks"));
        assert!(msg.contains("impressions"));
    }

    #[test]
    fn serialization_error_is_transparent_in_publish_error() {
        let inner = SerializationError::Unrepresentable {
            field: "ts",
            reason: "out of range".into(),
        };
        let expected = inner.to_string();
        let err = PublishError::from(inner);
        assert_eq!(err.to_string(), expected);
        assert_eq!(err.as_label(), "publish_serialization");
    }
}
