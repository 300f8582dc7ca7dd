//! Binding and extension builders.

use std::sync::Arc;

use ghala_events::{EventResult, HandlerRef, Subscription, WebhookHandler};

use crate::traits::WebhookExtension;

/// One handler bound to an event name or to the wildcard.
pub struct HandlerBinding<P: Send + Sync + 'static> {
    /// What the handler subscribes to.
    pub subscription: Subscription,
    /// The handler itself.
    pub handler: HandlerRef<P>,
    /// Whether this binding is registered.
    pub active: bool,
}

impl<P: Send + Sync + 'static> HandlerBinding<P> {
    /// Binds a handler to a pattern (`"*"` for all events).
    pub fn on(pattern: &str, handler: impl WebhookHandler<P> + 'static) -> EventResult<Self> {
        Ok(Self::shared(Subscription::parse(pattern)?, Arc::new(handler)))
    }

    /// Binds a handler to every event.
    pub fn all(handler: impl WebhookHandler<P> + 'static) -> Self {
        Self::shared(Subscription::All, Arc::new(handler))
    }

    /// Binds an already shared handler.
    pub fn shared(subscription: Subscription, handler: HandlerRef<P>) -> Self {
        Self {
            subscription,
            handler,
            active: true,
        }
    }

    /// Sets the activation flag.
    pub fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }
}

impl<P: Send + Sync + 'static> Clone for HandlerBinding<P> {
    fn clone(&self) -> Self {
        Self {
            subscription: self.subscription.clone(),
            handler: Arc::clone(&self.handler),
            active: self.active,
        }
    }
}

/// An extension declared from a list of bindings.
///
/// ```rust,ignore
/// let ext = ExtensionBuilder::new("notifications")
///     .on("order.created", EmailCustomer)?
///     .on_all(AuditTrail)
///     .build();
/// ```
pub struct ExtensionBuilder<P: Send + Sync + 'static> {
    name: String,
    active: bool,
    bindings: Vec<HandlerBinding<P>>,
}

impl<P: Send + Sync + 'static> ExtensionBuilder<P> {
    /// Creates a new, active extension builder.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            active: true,
            bindings: Vec::new(),
        }
    }

    /// Sets the extension's activation flag.
    pub fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Adds a handler for a pattern.
    pub fn on(mut self, pattern: &str, handler: impl WebhookHandler<P> + 'static) -> EventResult<Self> {
        self.bindings.push(HandlerBinding::on(pattern, handler)?);
        Ok(self)
    }

    /// Adds a handler for every event.
    pub fn on_all(mut self, handler: impl WebhookHandler<P> + 'static) -> Self {
        self.bindings.push(HandlerBinding::all(handler));
        self
    }

    /// Adds a prepared binding.
    pub fn binding(mut self, binding: HandlerBinding<P>) -> Self {
        self.bindings.push(binding);
        self
    }

    /// Builds the extension.
    pub fn build(self) -> DeclaredExtension<P> {
        DeclaredExtension {
            name: self.name,
            active: self.active,
            bindings: self.bindings,
        }
    }
}

/// Extension produced by [`ExtensionBuilder`].
pub struct DeclaredExtension<P: Send + Sync + 'static> {
    name: String,
    active: bool,
    bindings: Vec<HandlerBinding<P>>,
}

impl<P: Send + Sync + 'static> WebhookExtension<P> for DeclaredExtension<P> {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn bindings(&self) -> Vec<HandlerBinding<P>> {
        self.bindings.clone()
    }
}
