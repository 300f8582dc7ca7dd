//! Extension registration tests.

use async_trait::async_trait;
use ghala_events_sdk::{
    EventName, EventRouter, ExtensionBuilder, ExtensionRegistry, HandlerBinding, HandlerError,
    Subscription, WebhookExtension, WebhookHandler, WebhookMeta,
};
use std::sync::Arc;
use tokio::sync::Mutex;

type Log = Arc<Mutex<Vec<String>>>;

struct Named {
    id: String,
    log: Log,
}

fn named(id: &str, log: &Log) -> Named {
    Named {
        id: id.to_string(),
        log: log.clone(),
    }
}

#[async_trait]
impl WebhookHandler<u32> for Named {
    fn id(&self) -> &str {
        &self.id
    }

    async fn handle(&self, _payload: &u32, _meta: &WebhookMeta) -> Result<(), HandlerError> {
        self.log.lock().await.push(self.id.clone());
        Ok(())
    }
}

struct Inventory {
    log: Log,
    active: bool,
}

impl WebhookExtension<u32> for Inventory {
    fn name(&self) -> &str {
        "inventory"
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn bindings(&self) -> Vec<HandlerBinding<u32>> {
        vec![
            HandlerBinding::on("order.created", named("reserve", &self.log)).unwrap(),
            HandlerBinding::on("order.cancelled", named("release", &self.log)).unwrap(),
        ]
    }
}

fn ids(handlers: &[(Subscription, ghala_events_sdk::HandlerRef<u32>)]) -> Vec<String> {
    handlers.iter().map(|(_, h)| h.id().to_string()).collect()
}

#[test]
fn lists_handlers_in_extension_then_declaration_order() {
    let log: Log = Arc::default();
    let registry = ExtensionRegistry::new()
        .with(Inventory {
            log: log.clone(),
            active: true,
        })
        .with(ExtensionBuilder::new("audit").on_all(named("audit", &log)).build());

    let handlers = registry.list_active_handlers();

    assert_eq!(ids(&handlers), vec!["reserve", "release", "audit"]);
    assert_eq!(handlers[2].0, Subscription::All);
}

#[test]
fn inactive_extensions_are_skipped() {
    let log: Log = Arc::default();
    let registry = ExtensionRegistry::new()
        .with(Inventory {
            log: log.clone(),
            active: false,
        })
        .with(
            ExtensionBuilder::new("audit")
                .active(false)
                .on_all(named("audit", &log))
                .build(),
        );

    assert!(registry.list_active_handlers().is_empty());
    assert!(registry.active_names().is_empty());
    assert_eq!(registry.names(), vec!["inventory", "audit"]);
}

#[test]
fn inactive_bindings_are_skipped() {
    let log: Log = Arc::default();
    let registry = ExtensionRegistry::new().with(
        ExtensionBuilder::new("mixed")
            .on("payment.failed", named("alert", &log))
            .unwrap()
            .binding(HandlerBinding::all(named("disabled", &log)).active(false))
            .build(),
    );

    assert_eq!(ids(&registry.list_active_handlers()), vec!["alert"]);
}

#[test]
fn configuration_can_disable_extensions_by_name() {
    let log: Log = Arc::default();
    let registry = ExtensionRegistry::new()
        .with_disabled(["inventory"])
        .with(Inventory {
            log: log.clone(),
            active: true,
        })
        .with(ExtensionBuilder::new("audit").on_all(named("audit", &log)).build());

    assert_eq!(registry.active_names(), vec!["audit"]);
    assert_eq!(ids(&registry.list_active_handlers()), vec!["audit"]);
}

#[tokio::test]
async fn built_router_dispatches_to_registered_handlers() {
    let log: Log = Arc::default();
    let registry = ExtensionRegistry::new()
        .with(ExtensionBuilder::new("audit").on_all(named("audit", &log)).build())
        .with(Inventory {
            log: log.clone(),
            active: true,
        });

    let router = registry.build_router(EventRouter::builder());
    let event = EventName::new("order.created").unwrap();
    let result = router
        .dispatch(&event, 1, WebhookMeta::new(event.clone(), 0))
        .await;

    // Exact-match handlers first even though "audit" was registered earlier.
    assert_eq!(*log.lock().await, vec!["reserve", "audit"]);
    assert!(result.is_success());
}
