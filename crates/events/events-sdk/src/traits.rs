//! Traits for webhook extensions.

use ghala_events::{HandlerRef, Subscription};

use crate::builder::HandlerBinding;

/// A module that contributes webhook handlers.
///
/// Implement this trait to declare which events your extension listens to.
/// The core only consumes the resulting bindings; how extensions are
/// discovered is up to the application.
pub trait WebhookExtension<P: Send + Sync + 'static>: Send + Sync {
    /// Returns the extension identifier.
    fn name(&self) -> &str;

    /// Whether the extension's handlers should be registered.
    fn is_active(&self) -> bool {
        true
    }

    /// Returns the handler bindings declared by this extension.
    ///
    /// Bindings can be:
    /// - Exact match: "order.created"
    /// - All events: "*"
    fn bindings(&self) -> Vec<HandlerBinding<P>>;

    /// Active bindings as `(subscription, handler)` pairs, in declaration order.
    fn active_handlers(&self) -> Vec<(Subscription, HandlerRef<P>)> {
        self.bindings()
            .into_iter()
            .filter(|binding| binding.active)
            .map(|binding| (binding.subscription, binding.handler))
            .collect()
    }
}
