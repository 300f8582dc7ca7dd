//! # Ghala Hooks Logger Plugin
//!
//! Subscribes to every event (`"*"`) and writes one log line per delivery
//! with the event name, delivery id and order id.

mod config;

pub use config::LoggerConfig;

use async_trait::async_trait;
use ghala_core::Payload;
use ghala_events_sdk::{HandlerBinding, HandlerError, WebhookExtension, WebhookHandler, WebhookMeta};

/// Name under which the plugin registers.
pub const PLUGIN_NAME: &str = "logger";

/// The logger plugin.
#[derive(Debug, Clone, Default)]
pub struct LoggerPlugin {
    config: LoggerConfig,
}

impl LoggerPlugin {
    /// Creates a new logger plugin with the given configuration.
    pub fn new(config: LoggerConfig) -> Self {
        Self { config }
    }

    /// Gets the plugin configuration.
    pub fn config(&self) -> &LoggerConfig {
        &self.config
    }
}

impl WebhookExtension<Payload> for LoggerPlugin {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn is_active(&self) -> bool {
        self.config.active
    }

    fn bindings(&self) -> Vec<HandlerBinding<Payload>> {
        vec![HandlerBinding::all(LogEvent {
            include_payload: self.config.include_payload,
        })]
    }
}

/// Logs a received event.
#[derive(Debug, Clone, Copy)]
pub struct LogEvent {
    include_payload: bool,
}

impl LogEvent {
    fn kind(payload: &Payload) -> &'static str {
        match payload {
            Payload::Order(_) => "order",
            Payload::Payment(_) => "payment",
        }
    }
}

#[async_trait]
impl WebhookHandler<Payload> for LogEvent {
    fn id(&self) -> &str {
        "logger.log_event"
    }

    async fn handle(&self, payload: &Payload, meta: &WebhookMeta) -> Result<(), HandlerError> {
        tracing::info!(
            event = %meta.event,
            delivery_id = %meta.delivery_id,
            order_id = %payload.order_id(),
            kind = Self::kind(payload),
            "Webhook event received"
        );

        if self.include_payload {
            let body = serde_json::to_string(payload).map_err(|e| HandlerError::Internal(e.to_string()))?;
            tracing::debug!(event = %meta.event, payload = %body, "Webhook payload");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ghala_core::events::{EventName, Subscription};
    use ghala_core::{Customer, OrderData, OrderId};

    fn order() -> Payload {
        Payload::Order(OrderData {
            customer: Customer {
                name: "Amina".into(),
                phone: None,
                phone_number: None,
                email: None,
            },
            order_id: OrderId::new("123"),
            total: 10.0,
            discount_total: 0.0,
            promo_discount_amount: 0.0,
            products: Vec::new(),
        })
    }

    #[test]
    fn test_subscribes_to_all_events() {
        let plugin = LoggerPlugin::default();
        let handlers = plugin.active_handlers();

        assert_eq!(handlers.len(), 1);
        assert_eq!(handlers[0].0, Subscription::All);
        assert_eq!(handlers[0].1.id(), "logger.log_event");
    }

    #[test]
    fn test_inactive_config() {
        let plugin = LoggerPlugin::new(LoggerConfig {
            active: false,
            ..Default::default()
        });
        assert!(!plugin.is_active());
    }

    #[tokio::test]
    async fn test_handler_succeeds() {
        let handler = LogEvent { include_payload: true };
        let meta = WebhookMeta::new(EventName::from_static("order.created"), 1_700_000_000);
        assert!(handler.handle(&order(), &meta).await.is_ok());
    }
}
