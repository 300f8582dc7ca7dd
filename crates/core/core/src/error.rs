//! Error types for Ghala Hooks.
//!
//! `GhalaError` covers every way an inbound webhook can fail before it is
//! acknowledged. Handler failures are not part of it: they are reported in
//! the dispatch result and never change the response.

use ghala_webhooks::{AuthFailure, WebhookError};
use thiserror::Error;

/// The main error type of the webhook pipeline.
#[derive(Debug, Error)]
pub enum GhalaError {
    // ==================== Request Errors ====================
    /// The request failed authentication.
    #[error("Authentication failed: {0}")]
    Authentication(#[from] AuthFailure),

    /// The body is not valid UTF-8.
    #[error("Request body is not valid UTF-8")]
    InvalidBody,

    /// The body does not match the event's schema.
    #[error("Invalid payload: {message}")]
    PayloadDecode { message: String },

    // ==================== Configuration Errors ====================
    /// The service is misconfigured.
    #[error("Configuration error: {0}")]
    Configuration(#[from] WebhookError),

    // ==================== Internal Errors ====================
    /// An internal error occurred.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl GhalaError {
    /// Creates a new payload decode error.
    pub fn payload(message: impl Into<String>) -> Self {
        Self::PayloadDecode {
            message: message.into(),
        }
    }

    /// Creates a new internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Stable machine-readable reason code.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Authentication(failure) => failure.code(),
            Self::InvalidBody => "InvalidBody",
            Self::PayloadDecode { .. } => "InvalidPayload",
            Self::Configuration(_) | Self::Internal { .. } => "InternalError",
        }
    }

    /// Returns true if the sender caused this error.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Authentication(_) | Self::InvalidBody | Self::PayloadDecode { .. }
        )
    }

    /// Returns an HTTP status code appropriate for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Authentication(_) => 401,
            Self::InvalidBody => 400,
            Self::PayloadDecode { .. } => 422,
            Self::Configuration(_) | Self::Internal { .. } => 500,
        }
    }
}

impl From<serde_json::Error> for GhalaError {
    fn from(err: serde_json::Error) -> Self {
        Self::payload(err.to_string())
    }
}

/// A Result type alias using GhalaError.
pub type GhalaResult<T> = Result<T, GhalaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        for failure in [
            AuthFailure::UnknownEventType,
            AuthFailure::MissingSignature,
            AuthFailure::InvalidSignature,
            AuthFailure::MissingOrMalformedTimestamp,
            AuthFailure::StaleOrFutureTimestamp,
        ] {
            assert_eq!(GhalaError::from(failure).status_code(), 401);
        }
        assert_eq!(GhalaError::InvalidBody.status_code(), 400);
        assert_eq!(GhalaError::payload("missing field `data`").status_code(), 422);
        assert_eq!(GhalaError::internal("boom").status_code(), 500);
        assert_eq!(GhalaError::from(WebhookError::InvalidTolerance).status_code(), 500);
    }

    #[test]
    fn test_reason_codes() {
        assert_eq!(
            GhalaError::from(AuthFailure::StaleOrFutureTimestamp).reason(),
            "StaleOrFutureTimestamp"
        );
        assert_eq!(GhalaError::payload("x").reason(), "InvalidPayload");
        assert_eq!(GhalaError::internal("x").reason(), "InternalError");
    }

    #[test]
    fn test_json_error_maps_to_invalid_payload() {
        let err = GhalaError::from(serde_json::from_str::<u32>("\"x\"").unwrap_err());

        assert!(matches!(err, GhalaError::PayloadDecode { .. }));
        assert_eq!(err.status_code(), 422);
        assert_eq!(err.reason(), "InvalidPayload");
        assert!(err.is_client_error());
    }

    #[test]
    fn test_is_client_error() {
        assert!(GhalaError::from(AuthFailure::InvalidSignature).is_client_error());
        assert!(GhalaError::InvalidBody.is_client_error());
        assert!(!GhalaError::internal("test").is_client_error());
    }
}
