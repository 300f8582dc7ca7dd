//! Event router: subscription registry and isolated dispatch.

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::Instant;
use uuid::Uuid;

use crate::error::{EventResult, HandlerError};
use crate::event::{EventName, Subscription, WebhookMeta};
use crate::handler::{HandlerOutcome, HandlerRef, HandlerStatus, WebhookHandler};

/// How handlers of one dispatch are scheduled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    /// One handler at a time, exact-match handlers before wildcard handlers.
    #[default]
    Sequential,
    /// All handlers start together. Only for handlers that share no state.
    Concurrent,
}

/// Builder for an [`EventRouter`].
pub struct RouterBuilder<P: Send + Sync + 'static> {
    subscribers: HashMap<EventName, Vec<HandlerRef<P>>>,
    wildcard_subscribers: Vec<HandlerRef<P>>,
    mode: DispatchMode,
    handler_timeout: Option<Duration>,
}

impl<P: Send + Sync + 'static> RouterBuilder<P> {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self {
            subscribers: HashMap::new(),
            wildcard_subscribers: Vec::new(),
            mode: DispatchMode::default(),
            handler_timeout: None,
        }
    }

    /// Subscribes a shared handler.
    pub fn subscribe(&mut self, subscription: Subscription, handler: HandlerRef<P>) -> &mut Self {
        match subscription {
            Subscription::Exact(name) => {
                self.subscribers.entry(name).or_default().push(handler);
            }
            Subscription::All => self.wildcard_subscribers.push(handler),
        }
        self
    }

    /// Subscribes to a specific event name, or to all events with `"*"`.
    pub fn on(mut self, pattern: &str, handler: impl WebhookHandler<P> + 'static) -> EventResult<Self> {
        let subscription = Subscription::parse(pattern)?;
        self.subscribe(subscription, Arc::new(handler));
        Ok(self)
    }

    /// Subscribes to all events.
    pub fn on_all(mut self, handler: impl WebhookHandler<P> + 'static) -> Self {
        self.subscribe(Subscription::All, Arc::new(handler));
        self
    }

    /// Sets the dispatch mode.
    pub fn mode(mut self, mode: DispatchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Bounds each handler invocation; exceeding it counts as a failure.
    ///
    /// The limit is measured from the moment the handler is spawned. A
    /// handler that times out is not aborted: its task keeps running
    /// detached. In [`DispatchMode::Sequential`] the next handler starts
    /// right away, so it may overlap with the one that timed out.
    pub fn handler_timeout(mut self, timeout: Duration) -> Self {
        self.handler_timeout = Some(timeout);
        self
    }

    /// Freezes the registry.
    pub fn build(self) -> EventRouter<P> {
        EventRouter {
            subscribers: self.subscribers,
            wildcard_subscribers: self.wildcard_subscribers,
            mode: self.mode,
            handler_timeout: self.handler_timeout,
        }
    }
}

impl<P: Send + Sync + 'static> Default for RouterBuilder<P> {
    fn default() -> Self {
        Self::new()
    }
}

/// Aggregated result of one dispatch.
#[derive(Debug, Clone)]
pub struct DispatchResult {
    /// The dispatched event.
    pub event: EventName,
    /// Delivery the dispatch belongs to.
    pub delivery_id: Uuid,
    /// One outcome per invoked handler, in invocation order.
    pub outcomes: Vec<HandlerOutcome>,
}

impl DispatchResult {
    /// Number of handlers invoked.
    pub fn invoked(&self) -> usize {
        self.outcomes.len()
    }

    /// True when every handler succeeded (or none was registered).
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(HandlerOutcome::is_success)
    }

    /// Outcomes of handlers that did not succeed.
    pub fn failures(&self) -> impl Iterator<Item = &HandlerOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }
}

/// Routes decoded webhook payloads to subscribed handlers.
///
/// The registry is immutable once built and can be shared across requests
/// without locking.
pub struct EventRouter<P: Send + Sync + 'static> {
    /// Exact-match subscribers by event name.
    subscribers: HashMap<EventName, Vec<HandlerRef<P>>>,
    /// Wildcard subscribers (receive all events).
    wildcard_subscribers: Vec<HandlerRef<P>>,
    mode: DispatchMode,
    handler_timeout: Option<Duration>,
}

impl<P: Send + Sync + 'static> EventRouter<P> {
    /// Starts building a router.
    pub fn builder() -> RouterBuilder<P> {
        RouterBuilder::new()
    }

    /// Returns the configured dispatch mode.
    pub fn mode(&self) -> DispatchMode {
        self.mode
    }

    /// Handlers matching an event, in invocation order.
    pub fn handlers_for(&self, event: &EventName) -> Vec<(Subscription, HandlerRef<P>)> {
        let exact = self
            .subscribers
            .get(event)
            .into_iter()
            .flatten()
            .map(|h| (Subscription::Exact(event.clone()), Arc::clone(h)));
        let wildcard = self
            .wildcard_subscribers
            .iter()
            .map(|h| (Subscription::All, Arc::clone(h)));

        exact.chain(wildcard).collect()
    }

    /// Number of handlers registered for a subscription.
    pub fn subscriber_count(&self, subscription: &Subscription) -> usize {
        match subscription {
            Subscription::Exact(name) => self.subscribers.get(name).map_or(0, Vec::len),
            Subscription::All => self.wildcard_subscribers.len(),
        }
    }

    /// Total number of registered handlers.
    pub fn len(&self) -> usize {
        self.subscribers.values().map(Vec::len).sum::<usize>() + self.wildcard_subscribers.len()
    }

    /// Checks if no handler is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dispatches a payload to every matching handler.
    ///
    /// Exact-match handlers run first, then wildcard handlers, each group in
    /// registration order. A failing, panicking or timed-out handler is
    /// recorded and never stops the remaining handlers.
    pub async fn dispatch(&self, event: &EventName, payload: P, mut meta: WebhookMeta) -> DispatchResult {
        meta.event = event.clone();
        self.dispatch_shared(Arc::new(payload), Arc::new(meta)).await
    }

    /// Dispatches an already shared payload; the event is taken from `meta`.
    pub async fn dispatch_shared(&self, payload: Arc<P>, meta: Arc<WebhookMeta>) -> DispatchResult {
        let handlers = self.handlers_for(&meta.event);

        let outcomes = match self.mode {
            DispatchMode::Sequential => {
                let mut outcomes = Vec::with_capacity(handlers.len());
                for (subscription, handler) in handlers {
                    let running = spawn_handler(handler, subscription, &payload, &meta);
                    outcomes.push(self.settle(running).await);
                }
                outcomes
            }
            DispatchMode::Concurrent => {
                let running: Vec<_> = handlers
                    .into_iter()
                    .map(|(subscription, handler)| spawn_handler(handler, subscription, &payload, &meta))
                    .collect();

                let mut outcomes = Vec::with_capacity(running.len());
                for task in running {
                    outcomes.push(self.settle(task).await);
                }
                outcomes
            }
        };

        let result = DispatchResult {
            event: meta.event.clone(),
            delivery_id: meta.delivery_id,
            outcomes,
        };

        for failure in result.failures() {
            tracing::warn!(
                event = %result.event,
                delivery_id = %result.delivery_id,
                handler = %failure.handler_id,
                subscription = %failure.subscription,
                error = %failure.error().unwrap_or_default(),
                "Webhook handler failed"
            );
        }
        tracing::debug!(
            event = %result.event,
            delivery_id = %result.delivery_id,
            invoked = result.invoked(),
            failed = result.failures().count(),
            "Dispatch complete"
        );

        result
    }

    async fn settle(&self, running: RunningHandler) -> HandlerOutcome {
        let RunningHandler {
            handler_id,
            subscription,
            started,
            task,
        } = running;

        let joined = match self.handler_timeout {
            // On timeout the task is detached and left to finish on its own.
            Some(limit) => match tokio::time::timeout_at(started + limit, task).await {
                Ok(joined) => Some(joined),
                Err(_) => None,
            },
            None => Some(task.await),
        };

        let status = match joined {
            None => HandlerStatus::TimedOut,
            Some(Ok(Ok(()))) => HandlerStatus::Succeeded,
            Some(Ok(Err(e))) => HandlerStatus::Failed(e.to_string()),
            Some(Err(e)) => join_error_status(e),
        };

        HandlerOutcome {
            handler_id,
            subscription,
            status,
            duration_ms: started.elapsed().as_millis() as u64,
        }
    }
}

struct RunningHandler {
    handler_id: String,
    subscription: Subscription,
    started: Instant,
    task: JoinHandle<Result<(), HandlerError>>,
}

// Each invocation gets its own task so a panic cannot unwind into the dispatcher.
fn spawn_handler<P: Send + Sync + 'static>(
    handler: HandlerRef<P>,
    subscription: Subscription,
    payload: &Arc<P>,
    meta: &Arc<WebhookMeta>,
) -> RunningHandler {
    let handler_id = handler.id().to_string();
    let payload = Arc::clone(payload);
    let meta = Arc::clone(meta);

    RunningHandler {
        handler_id,
        subscription,
        started: Instant::now(),
        task: tokio::spawn(async move { handler.handle(&payload, &meta).await }),
    }
}

fn join_error_status(err: JoinError) -> HandlerStatus {
    if err.is_panic() {
        HandlerStatus::Panicked(panic_message(err.into_panic()))
    } else {
        HandlerStatus::Failed(err.to_string())
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    struct TestHandler {
        id: String,
        received: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl WebhookHandler<String> for TestHandler {
        fn id(&self) -> &str {
            &self.id
        }

        async fn handle(&self, payload: &String, meta: &WebhookMeta) -> Result<(), HandlerError> {
            let mut received = self.received.lock().await;
            received.push(format!("{}:{}:{}", self.id, meta.event, payload));
            Ok(())
        }
    }

    fn name(s: &str) -> EventName {
        EventName::new(s).unwrap()
    }

    fn meta(s: &str) -> WebhookMeta {
        WebhookMeta::new(name(s), 0)
    }

    #[tokio::test]
    async fn test_exact_dispatch() {
        let received = Arc::new(Mutex::new(Vec::new()));
        let router = EventRouter::builder()
            .on(
                "order.created",
                TestHandler {
                    id: "a".to_string(),
                    received: received.clone(),
                },
            )
            .unwrap()
            .build();

        let result = router
            .dispatch(&name("order.created"), "p".to_string(), meta("order.created"))
            .await;

        assert!(result.is_success());
        assert_eq!(result.invoked(), 1);
        assert_eq!(*received.lock().await, vec!["a:order.created:p"]);
    }

    #[tokio::test]
    async fn test_wildcard_receives_every_event() {
        let received = Arc::new(Mutex::new(Vec::new()));
        let router = EventRouter::builder()
            .on_all(TestHandler {
                id: "w".to_string(),
                received: received.clone(),
            })
            .build();

        router
            .dispatch(&name("order.created"), "1".to_string(), meta("order.created"))
            .await;
        router
            .dispatch(&name("payment.failed"), "2".to_string(), meta("payment.failed"))
            .await;

        assert_eq!(received.lock().await.len(), 2);
    }

    #[tokio::test]
    async fn test_no_subscribers_is_noop_success() {
        let router: EventRouter<String> = EventRouter::builder().build();

        let result = router
            .dispatch(&name("order.updated"), "p".to_string(), meta("order.updated"))
            .await;

        assert!(router.is_empty());
        assert!(result.is_success());
        assert_eq!(result.invoked(), 0);
    }

    #[tokio::test]
    async fn test_dispatch_uses_given_event_name() {
        let received = Arc::new(Mutex::new(Vec::new()));
        let router = EventRouter::builder()
            .on_all(TestHandler {
                id: "w".to_string(),
                received: received.clone(),
            })
            .build();

        let result = router
            .dispatch(&name("order.cancelled"), "p".to_string(), meta("order.created"))
            .await;

        assert_eq!(result.event, name("order.cancelled"));
        assert_eq!(*received.lock().await, vec!["w:order.cancelled:p"]);
    }

    #[test]
    fn test_subscriber_count() {
        let received = Arc::new(Mutex::new(Vec::new()));
        let router = EventRouter::builder()
            .on(
                "order.created",
                TestHandler {
                    id: "a".to_string(),
                    received: received.clone(),
                },
            )
            .unwrap()
            .on_all(TestHandler {
                id: "b".to_string(),
                received,
            })
            .build();

        assert_eq!(router.subscriber_count(&Subscription::parse("order.created").unwrap()), 1);
        assert_eq!(router.subscriber_count(&Subscription::All), 1);
        assert_eq!(router.subscriber_count(&Subscription::parse("order.updated").unwrap()), 0);
        assert_eq!(router.len(), 2);
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let received = Arc::new(Mutex::new(Vec::new()));
        let result = EventRouter::builder().on(
            "",
            TestHandler {
                id: "a".to_string(),
                received,
            },
        );
        assert!(result.is_err());
    }
}
