//! Error types for the JSON-RPC call helper.
//!
//! # Design
//! Every failure a call can hit maps to exactly one `CallError` variant, and
//! nothing is logged or retried on the caller's behalf. Draining a snapshot
//! body can fail twice (read, then close); `BodyRead` keeps the read error as
//! the primary cause and carries the close failure alongside it.

use std::fmt;
use std::io;

/// Errors returned by `Destination::call` and friends.
#[derive(Debug, thiserror::Error)]
pub enum CallError {
    /// A required destination field (method, protocol or host) is empty.
    #[error("invalid destination: {0} is empty")]
    InvalidDestination(&'static str),

    /// The request envelope could not be encoded as JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The HTTP method or URL is structurally invalid.
    #[error("request construction failed: {0}")]
    RequestConstruction(String),

    /// The transport failed to complete the round trip.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Draining the response body failed. `close` holds a failure from the
    /// close that followed, if there was one.
    #[error("reading response body failed: {source}{}", close_suffix(.close))]
    BodyRead {
        source: io::Error,
        close: Option<io::Error>,
    },

    /// The body was read completely but releasing the stream failed.
    #[error("closing response body failed: {0}")]
    BodyClose(#[source] io::Error),
}

impl CallError {
    /// The secondary close failure attached to a `BodyRead` error.
    pub fn close_error(&self) -> Option<&io::Error> {
        match self {
            CallError::BodyRead { close, .. } => close.as_ref(),
            _ => None,
        }
    }
}

fn close_suffix(close: &Option<io::Error>) -> String {
    match close {
        Some(err) => format!(" (close also failed: {err})"),
        None => String::new(),
    }
}

/// Failure reported by a `Transport` implementation.
///
/// Wraps whatever error the underlying HTTP client produced so callers can
/// downcast to it.
pub struct TransportError(Box<dyn std::error::Error + Send + Sync>);

impl TransportError {
    pub fn new(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self(err.into())
    }

    pub fn get_ref(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        &*self.0
    }

    pub fn into_inner(self) -> Box<dyn std::error::Error + Send + Sync> {
        self.0
    }
}

impl fmt::Debug for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TransportError").field(&self.0).finish()
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&*self.0)
    }
}
