/// Error taxonomy for tag generation.
///
/// Every variant renders a message that can be shown to a user verbatim.
use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while generating tags.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TagError {
    /// Missing or invalid provider configuration. Raised before any request is sent.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A single attempt exceeded its deadline.
    #[error("Request timed out after {}s", .after.as_secs_f64())]
    Timeout { after: Duration },

    /// The provider answered with a non-success status.
    #[error("Provider returned HTTP {status}: {message}")]
    RemoteError { status: u16, message: String },

    /// The provider answered successfully but without the expected text field.
    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    /// The request never produced a status (connection refused, DNS failure, etc.)
    #[error("Network error: {0}")]
    Network(String),
}

impl TagError {
    /// Shorthand for building a [`TagError::Configuration`].
    pub fn config(message: impl Into<String>) -> Self {
        TagError::Configuration(message.into())
    }

    /// HTTP status equivalent of this error, if it has one.
    ///
    /// Timeouts report 408 so hosts can treat them like any other status.
    pub fn status(&self) -> Option<u16> {
        match self {
            TagError::Timeout { .. } => Some(408),
            TagError::RemoteError { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` only for server-side failures (HTTP 5xx).
    ///
    /// Timeouts, client errors, network failures and malformed responses
    /// are never considered transient.
    pub fn is_transient(&self) -> bool {
        matches!(self, TagError::RemoteError { status, .. } if *status >= 500)
    }
}
