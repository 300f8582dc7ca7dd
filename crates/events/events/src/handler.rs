//! Webhook handler trait and dispatch outcomes.

use async_trait::async_trait;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::HandlerError;
use crate::event::{Subscription, WebhookMeta};

/// Trait for webhook handlers.
///
/// Handlers receive a read-only view of the payload and the delivery metadata.
#[async_trait]
pub trait WebhookHandler<P: Send + Sync>: Send + Sync {
    /// Returns an identifier for this handler, used in logs and outcomes.
    fn id(&self) -> &str {
        "anonymous"
    }

    /// Handles one delivery.
    async fn handle(&self, payload: &P, meta: &WebhookMeta) -> Result<(), HandlerError>;
}

/// A shared handler reference, as stored in the router.
pub type HandlerRef<P> = Arc<dyn WebhookHandler<P>>;

/// Boxed future returned by function handlers.
pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = Result<(), HandlerError>> + Send + 'a>>;

/// Wrapper for function-based handlers.
///
/// ```rust,ignore
/// let handler = FnHandler::new("audit", |payload: &Payload, meta| {
///     Box::pin(async move {
///         tracing::info!(event = %meta.event, "received");
///         Ok(())
///     })
/// });
/// ```
pub struct FnHandler<F> {
    id: String,
    handler: F,
}

impl<F> FnHandler<F> {
    /// Creates a new function handler.
    pub fn new<P>(id: impl Into<String>, handler: F) -> Self
    where
        P: Send + Sync,
        F: for<'a> Fn(&'a P, &'a WebhookMeta) -> HandlerFuture<'a> + Send + Sync,
    {
        Self {
            id: id.into(),
            handler,
        }
    }
}

#[async_trait]
impl<P, F> WebhookHandler<P> for FnHandler<F>
where
    P: Send + Sync,
    F: for<'a> Fn(&'a P, &'a WebhookMeta) -> HandlerFuture<'a> + Send + Sync,
{
    fn id(&self) -> &str {
        &self.id
    }

    async fn handle(&self, payload: &P, meta: &WebhookMeta) -> Result<(), HandlerError> {
        (self.handler)(payload, meta).await
    }
}

/// How a single handler invocation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerStatus {
    /// The handler returned `Ok`.
    Succeeded,
    /// The handler returned an error.
    Failed(String),
    /// The handler panicked.
    Panicked(String),
    /// The handler exceeded the configured timeout.
    TimedOut,
}

/// Result of one handler invocation during a dispatch.
#[derive(Debug, Clone)]
pub struct HandlerOutcome {
    /// Handler identifier.
    pub handler_id: String,
    /// The subscription through which the handler was reached.
    pub subscription: Subscription,
    /// How the invocation ended.
    pub status: HandlerStatus,
    /// Duration in milliseconds.
    pub duration_ms: u64,
}

impl HandlerOutcome {
    /// Whether the handler succeeded.
    pub fn is_success(&self) -> bool {
        self.status == HandlerStatus::Succeeded
    }

    /// Error description for unsuccessful outcomes.
    pub fn error(&self) -> Option<String> {
        match &self.status {
            HandlerStatus::Succeeded => None,
            HandlerStatus::Failed(message) => Some(message.clone()),
            HandlerStatus::Panicked(message) => Some(format!("panicked: {}", message)),
            HandlerStatus::TimedOut => Some("timed out".to_string()),
        }
    }
}
