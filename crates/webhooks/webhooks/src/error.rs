//! Webhook error types.

use serde::Serialize;
use thiserror::Error;

/// Result type for webhook operations.
pub type WebhookResult<T> = Result<T, WebhookError>;

/// Error type for webhook configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WebhookError {
    /// A webhook secret was empty.
    #[error("Webhook secret must not be empty")]
    EmptySecret,

    /// One or more event types have no secret configured.
    #[error("Missing webhook secrets: {}", .keys.join(", "))]
    MissingSecrets { keys: Vec<&'static str> },

    /// The replay tolerance was zero.
    #[error("Replay tolerance must be a positive duration")]
    InvalidTolerance,

    /// The event slug or name is not one the platform sends.
    #[error("Unknown webhook event: {0}")]
    UnknownEvent(String),
}

/// Reason an inbound request was rejected by the authenticator.
///
/// All variants are per-request and terminal for that request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Error)]
pub enum AuthFailure {
    /// No secret is configured for the event type.
    #[error("No webhook secret configured for this event type")]
    UnknownEventType,

    /// The signature header is absent or empty.
    #[error("Missing signature header")]
    MissingSignature,

    /// The signature does not match the request body.
    #[error("Invalid signature")]
    InvalidSignature,

    /// The timestamp header is absent or not a number.
    #[error("Missing or malformed timestamp header")]
    MissingOrMalformedTimestamp,

    /// The timestamp is outside the replay tolerance window.
    #[error("Timestamp outside the allowed window")]
    StaleOrFutureTimestamp,
}

impl AuthFailure {
    /// Stable machine-readable reason code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownEventType => "UnknownEventType",
            Self::MissingSignature => "MissingSignature",
            Self::InvalidSignature => "InvalidSignature",
            Self::MissingOrMalformedTimestamp => "MissingOrMalformedTimestamp",
            Self::StaleOrFutureTimestamp => "StaleOrFutureTimestamp",
        }
    }
}
