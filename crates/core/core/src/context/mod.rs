//! The webhook pipeline: authenticate, decode, dispatch, acknowledge.

use ghala_events::{DispatchResult, EventRouter, WebhookMeta};
use ghala_webhooks::{RequestAuthenticator, WebhookEventType};
use http::HeaderMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{GhalaError, GhalaResult};
use crate::types::Payload;

/// Acknowledgment returned for every accepted webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookAck {
    pub status: String,
    pub event: String,
    pub message: String,
}

impl WebhookAck {
    /// Acknowledges `event_type`.
    pub fn received(event_type: WebhookEventType) -> Self {
        Self {
            status: "ok".to_string(),
            event: event_type.as_str().to_string(),
            message: format!("{} webhook received and verified", event_type.as_str()),
        }
    }
}

/// An accepted webhook together with what its handlers did.
#[derive(Debug, Clone)]
pub struct WebhookReceipt {
    pub ack: WebhookAck,
    pub dispatch: DispatchResult,
}

/// Everything needed to process an inbound webhook.
///
/// Cheap to clone; the authenticator and router are shared.
#[derive(Clone)]
pub struct WebhookContext {
    authenticator: Arc<RequestAuthenticator>,
    router: Arc<EventRouter<Payload>>,
}

impl WebhookContext {
    /// Creates a new context.
    pub fn new(authenticator: RequestAuthenticator, router: EventRouter<Payload>) -> Self {
        Self::from_shared(Arc::new(authenticator), Arc::new(router))
    }

    /// Creates a context from already shared parts.
    pub fn from_shared(authenticator: Arc<RequestAuthenticator>, router: Arc<EventRouter<Payload>>) -> Self {
        Self {
            authenticator,
            router,
        }
    }

    /// Returns the authenticator.
    pub fn authenticator(&self) -> &RequestAuthenticator {
        &self.authenticator
    }

    /// Returns the router.
    pub fn router(&self) -> &EventRouter<Payload> {
        &self.router
    }

    /// Processes a webhook and returns the acknowledgment.
    ///
    /// Handler failures never turn into an error here; they are logged by
    /// the router and the request is still acknowledged.
    pub async fn handle(&self, event_type: WebhookEventType, body: &[u8], headers: &HeaderMap) -> GhalaResult<WebhookAck> {
        self.process(event_type, body, headers).await.map(|r| r.ack)
    }

    /// Processes a webhook against the current server time.
    pub async fn process(
        &self,
        event_type: WebhookEventType,
        body: &[u8],
        headers: &HeaderMap,
    ) -> GhalaResult<WebhookReceipt> {
        self.process_at(event_type, body, headers, chrono::Utc::now().timestamp())
            .await
    }

    /// Processes a webhook against an explicit server time.
    ///
    /// Once the payload is decoded, dispatch is detached from the caller:
    /// if this future is dropped, every matching handler still runs.
    pub async fn process_at(
        &self,
        event_type: WebhookEventType,
        body: &[u8],
        headers: &HeaderMap,
        now: i64,
    ) -> GhalaResult<WebhookReceipt> {
        let verified = self
            .authenticator
            .verify_at(event_type, body, headers, now)
            .inspect_err(|failure| {
                tracing::warn!(event = %event_type, reason = failure.code(), "Rejected webhook");
            })?;

        let text = std::str::from_utf8(body).map_err(|_| GhalaError::InvalidBody)?;
        let payload = Payload::decode(event_type, text).map_err(|e| {
            tracing::warn!(event = %event_type, error = %e, "Invalid webhook payload");
            GhalaError::from(e)
        })?;

        let meta = WebhookMeta::new(event_type.event_name(), verified.timestamp)
            .with_headers(self.redacted_headers(headers));

        // Dispatch runs in its own task so a dropped request cannot stop
        // the handlers that have not started yet.
        let router = Arc::clone(&self.router);
        let event = event_type.event_name();
        let dispatch = tokio::spawn(async move { router.dispatch(&event, payload, meta).await })
            .await
            .map_err(|e| {
                tracing::error!(event = %event_type, error = %e, "Dispatch task failed");
                GhalaError::internal(e.to_string())
            })?;

        tracing::debug!(
            event = %event_type,
            delivery_id = %dispatch.delivery_id,
            invoked = dispatch.invoked(),
            failed = dispatch.failures().count(),
            "Webhook processed"
        );

        Ok(WebhookReceipt {
            ack: WebhookAck::received(event_type),
            dispatch,
        })
    }

    /// Headers passed to handlers, without the signature.
    fn redacted_headers<'h>(&self, headers: &'h HeaderMap) -> impl Iterator<Item = (&'h str, String)> {
        let signature_header = self.authenticator.config().signature_header.to_ascii_lowercase();

        headers
            .iter()
            .filter(move |(name, _)| name.as_str() != signature_header)
            .filter_map(|(name, value)| Some((name.as_str(), value.to_str().ok()?.to_string())))
    }
}

impl std::fmt::Debug for WebhookContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookContext")
            .field("authenticator", &self.authenticator)
            .field("handlers", &self.router.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ghala_webhooks::{AuthenticatorConfig, AuthFailure, SecretStore, WebhookSecret, WebhookSigner};
    use http::HeaderValue;

    const NOW: i64 = 1_700_000_000;

    fn context() -> WebhookContext {
        let secrets = SecretStore::new().with(WebhookEventType::OrderCreated, WebhookSecret::new("s").unwrap());
        let authenticator = RequestAuthenticator::new(secrets, AuthenticatorConfig::default()).unwrap();
        WebhookContext::new(authenticator, EventRouter::builder().build())
    }

    fn signed(body: &[u8]) -> HeaderMap {
        let sig = WebhookSigner::new(WebhookSecret::new("s").unwrap()).sign("", body);
        let mut headers = HeaderMap::new();
        headers.insert("x-signature", HeaderValue::from_str(&sig).unwrap());
        headers.insert("x-timestamp", HeaderValue::from_str(&NOW.to_string()).unwrap());
        headers.insert("x-request-id", HeaderValue::from_static("req-1"));
        headers
    }

    #[test]
    fn test_ack_shape() {
        let ack = WebhookAck::received(WebhookEventType::OrderCreated);
        assert_eq!(
            serde_json::to_value(&ack).unwrap(),
            serde_json::json!({
                "status": "ok",
                "event": "order.created",
                "message": "order.created webhook received and verified"
            })
        );
    }

    #[test]
    fn test_signature_header_redacted() {
        let ctx = context();
        let headers = signed(b"{}");
        let kept: Vec<_> = ctx.redacted_headers(&headers).map(|(k, _)| k).collect();

        assert!(kept.contains(&"x-request-id"));
        assert!(kept.contains(&"x-timestamp"));
        assert!(!kept.contains(&"x-signature"));
    }

    #[tokio::test]
    async fn test_invalid_utf8_body() {
        let body = [0xff, 0xfe, 0x00];
        let err = context()
            .process_at(WebhookEventType::OrderCreated, &body, &signed(&body), NOW)
            .await
            .unwrap_err();
        assert!(matches!(err, GhalaError::InvalidBody));
    }

    #[tokio::test]
    async fn test_auth_runs_before_decoding() {
        let err = context()
            .process_at(WebhookEventType::OrderCreated, b"not json", &HeaderMap::new(), NOW)
            .await
            .unwrap_err();
        assert!(matches!(err, GhalaError::Authentication(AuthFailure::MissingSignature)));
    }
}
