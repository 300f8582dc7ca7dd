//! HTTP routes.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use ghala_core::webhooks::WebhookEventType;
use ghala_core::{WebhookAck, WebhookContext};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::error::ApiError;

/// Shared state for webhook routes.
#[derive(Debug, Clone)]
pub struct AppState {
    context: WebhookContext,
}

/// Path of the endpoint receiving `event_type` under `base_path`.
pub fn webhook_path(base_path: &str, event_type: WebhookEventType) -> String {
    format!("{}/{}", base_path.trim_end_matches('/'), event_type.slug())
}

/// Creates an Axum router with one POST route per event type and `/health`.
///
/// # Example
///
/// ```rust,ignore
/// let app = webhook_routes(context, "/webhook");
/// axum::serve(listener, app).await?;
/// ```
pub fn webhook_routes(context: WebhookContext, base_path: &str) -> Router {
    let mut router = Router::new().route("/health", get(health));

    for event_type in WebhookEventType::ALL {
        router = router.route(
            &webhook_path(base_path, event_type),
            post(
                move |State(state): State<AppState>, headers: HeaderMap, body: Bytes| async move {
                    receive(state, event_type, headers, body).await
                },
            ),
        );
    }

    let trace_layer =
        TraceLayer::new_for_http().make_span_with(|request: &'_ axum::extract::Request<_>| {
            tracing::info_span!("request", method = %request.method(), uri = %request.uri())
        });

    router.layer(trace_layer).with_state(AppState { context })
}

/// Verifies, decodes and dispatches one webhook.
///
/// The body is taken as raw bytes so that the signature is checked against
/// exactly what was sent.
async fn receive(
    state: AppState,
    event_type: WebhookEventType,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, ApiError> {
    let ack = state.context.handle(event_type, &body, &headers).await?;
    Ok(Json(ack))
}

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    name: &'static str,
    version: &'static str,
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "ok",
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webhook_path() {
        assert_eq!(
            webhook_path("/webhook", WebhookEventType::OrderCreated),
            "/webhook/order-created"
        );
        assert_eq!(
            webhook_path("/ghala/webhook/", WebhookEventType::PaymentFailed),
            "/ghala/webhook/payment-failed"
        );
        assert_eq!(webhook_path("/", WebhookEventType::OrderUpdated), "/order-updated");
    }
}
