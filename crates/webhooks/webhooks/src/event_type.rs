//! The event types the commerce platform delivers.

use ghala_events::EventName;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::WebhookError;

/// One of the webhook events sent by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WebhookEventType {
    #[serde(rename = "order.created")]
    OrderCreated,
    #[serde(rename = "order.updated")]
    OrderUpdated,
    #[serde(rename = "order.cancelled")]
    OrderCancelled,
    #[serde(rename = "payment.successful")]
    PaymentSuccessful,
    #[serde(rename = "payment.failed")]
    PaymentFailed,
}

impl WebhookEventType {
    /// Every event type, in endpoint order.
    pub const ALL: [WebhookEventType; 5] = [
        Self::OrderCreated,
        Self::OrderUpdated,
        Self::OrderCancelled,
        Self::PaymentSuccessful,
        Self::PaymentFailed,
    ];

    /// URL path segment of the endpoint (e.g. `order-created`).
    pub fn slug(&self) -> &'static str {
        match self {
            Self::OrderCreated => "order-created",
            Self::OrderUpdated => "order-updated",
            Self::OrderCancelled => "order-cancelled",
            Self::PaymentSuccessful => "payment-successful",
            Self::PaymentFailed => "payment-failed",
        }
    }

    /// Dot-namespaced event name (e.g. `order.created`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OrderCreated => "order.created",
            Self::OrderUpdated => "order.updated",
            Self::OrderCancelled => "order.cancelled",
            Self::PaymentSuccessful => "payment.successful",
            Self::PaymentFailed => "payment.failed",
        }
    }

    /// The event name dispatched to handlers.
    pub fn event_name(&self) -> EventName {
        EventName::from_static(self.as_str())
    }

    /// Environment variable holding this event's secret.
    pub fn secret_env_key(&self) -> &'static str {
        match self {
            Self::OrderCreated => "CREATE_ORDER_WEBHOOK_SECRET",
            Self::OrderUpdated => "UPDATE_ORDER_WEBHOOK_SECRET",
            Self::OrderCancelled => "CANCEL_ORDER_WEBHOOK_SECRET",
            Self::PaymentSuccessful => "PAYMENT_SUCCESSFUL_WEBHOOK_SECRET",
            Self::PaymentFailed => "PAYMENT_FAILED_WEBHOOK_SECRET",
        }
    }

    /// Looks up an event type by its URL slug.
    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.slug() == slug)
    }

    /// Whether the payload carries order data.
    pub fn is_order(&self) -> bool {
        matches!(self, Self::OrderCreated | Self::OrderUpdated | Self::OrderCancelled)
    }
}

impl std::fmt::Display for WebhookEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WebhookEventType {
    type Err = WebhookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| WebhookError::UnknownEvent(s.to_string()))
    }
}
