//! Server errors and their HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ghala_core::GhalaError;
use ghala_core::webhooks::WebhookError;
use serde::Serialize;

use crate::config::ConfigError;

/// Errors that stop the server from starting or serving.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Webhook(#[from] WebhookError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error body returned for rejected webhooks.
#[derive(Debug, Serialize)]
struct ErrorBody {
    status: &'static str,
    reason: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

/// Wrapper for GhalaError that implements IntoResponse.
///
/// Only a stable reason code is exposed. Decode failures also carry the
/// decoder's message; internal faults carry nothing.
#[derive(Debug)]
pub struct ApiError(pub GhalaError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if !self.0.is_client_error() {
            tracing::error!(error = %self.0, "Internal error while handling webhook");
        }

        let detail = match &self.0 {
            GhalaError::PayloadDecode { message } => Some(message.clone()),
            _ => None,
        };
        let body = ErrorBody {
            status: "error",
            reason: self.0.reason(),
            detail,
        };

        (status, Json(body)).into_response()
    }
}

impl From<GhalaError> for ApiError {
    fn from(err: GhalaError) -> Self {
        ApiError(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ghala_core::webhooks::AuthFailure;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (GhalaError::from(AuthFailure::UnknownEventType), StatusCode::UNAUTHORIZED),
            (GhalaError::from(AuthFailure::InvalidSignature), StatusCode::UNAUTHORIZED),
            (GhalaError::InvalidBody, StatusCode::BAD_REQUEST),
            (GhalaError::payload("missing field `data`"), StatusCode::UNPROCESSABLE_ENTITY),
            (GhalaError::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError(err).into_response().status(), status);
        }
    }
}
