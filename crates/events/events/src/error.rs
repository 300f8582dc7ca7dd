//! Event error types.

use thiserror::Error;

/// Result type for event operations.
pub type EventResult<T> = Result<T, EventError>;

/// Error type for event names and subscriptions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    /// The event name is empty or malformed.
    #[error("Invalid event name '{name}': {reason}")]
    InvalidEventName { name: String, reason: &'static str },
}

impl EventError {
    pub(crate) fn invalid_name(name: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidEventName {
            name: name.into(),
            reason,
        }
    }
}

/// Error returned by a webhook handler.
///
/// Handler errors never reach the calling platform. The router records them
/// in the dispatch result and logs them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    /// Handler execution failed.
    #[error("Handler failed: {0}")]
    Failed(String),

    /// The handler received a payload variant it cannot process.
    #[error("Unexpected payload: {0}")]
    UnexpectedPayload(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl HandlerError {
    /// Creates a new handler failure.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}
