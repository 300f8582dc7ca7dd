//! Registry collecting handlers from all loaded extensions.

use std::collections::HashSet;

use ghala_events::{EventRouter, HandlerRef, RouterBuilder, Subscription};

use crate::traits::WebhookExtension;

/// Holds the extensions loaded at startup.
pub struct ExtensionRegistry<P: Send + Sync + 'static> {
    extensions: Vec<Box<dyn WebhookExtension<P>>>,
    disabled: HashSet<String>,
}

impl<P: Send + Sync + 'static> ExtensionRegistry<P> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            extensions: Vec::new(),
            disabled: HashSet::new(),
        }
    }

    /// Deactivates extensions by name, regardless of their own flag.
    pub fn with_disabled<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.disabled.extend(names.into_iter().map(Into::into));
        self
    }

    /// Registers an extension.
    pub fn register(&mut self, extension: impl WebhookExtension<P> + 'static) -> &mut Self {
        self.extensions.push(Box::new(extension));
        self
    }

    /// Registers an extension, builder style.
    pub fn with(mut self, extension: impl WebhookExtension<P> + 'static) -> Self {
        self.register(extension);
        self
    }

    /// Names of all registered extensions.
    pub fn names(&self) -> Vec<&str> {
        self.extensions.iter().map(|e| e.name()).collect()
    }

    /// Names of the extensions whose handlers will be registered.
    pub fn active_names(&self) -> Vec<&str> {
        self.extensions
            .iter()
            .filter(|e| self.is_enabled(e.as_ref()))
            .map(|e| e.name())
            .collect()
    }

    /// Every active `(subscription, handler)` pair, in extension then declaration order.
    pub fn list_active_handlers(&self) -> Vec<(Subscription, HandlerRef<P>)> {
        let mut handlers = Vec::new();

        for extension in &self.extensions {
            if !self.is_enabled(extension.as_ref()) {
                tracing::debug!(extension = extension.name(), "Skipping inactive extension");
                continue;
            }
            handlers.extend(extension.active_handlers());
        }

        handlers
    }

    /// Adds every active handler to a router builder.
    pub fn register_into(&self, builder: &mut RouterBuilder<P>) {
        for (subscription, handler) in self.list_active_handlers() {
            tracing::debug!(
                handler = handler.id(),
                subscription = %subscription,
                "Registering webhook handler"
            );
            builder.subscribe(subscription, handler);
        }
    }

    /// Builds a router from the active handlers.
    pub fn build_router(&self, mut builder: RouterBuilder<P>) -> EventRouter<P> {
        self.register_into(&mut builder);
        builder.build()
    }

    /// Returns the number of registered extensions.
    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    /// Checks if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    fn is_enabled(&self, extension: &dyn WebhookExtension<P>) -> bool {
        extension.is_active() && !self.disabled.contains(extension.name())
    }
}

impl<P: Send + Sync + 'static> Default for ExtensionRegistry<P> {
    fn default() -> Self {
        Self::new()
    }
}
