//! # Ghala Events SDK
//!
//! SDK for writing webhook extensions.
//!
//! This crate provides traits and utilities for extensions to:
//! - Declare the events they subscribe to (or `"*"` for all)
//! - Mark themselves, or single bindings, active or inactive
//! - Contribute their handlers to the event router at startup
//!
//! ## Example
//!
//! ```rust,ignore
//! use ghala_events_sdk::{ExtensionBuilder, ExtensionRegistry};
//!
//! let registry = ExtensionRegistry::new()
//!     .with(ExtensionBuilder::new("fulfilment").on("order.created", ShipOrder)?.build())
//!     .with(LoggerPlugin::default());
//!
//! let router = registry.build_router(EventRouter::builder());
//! ```

mod builder;
mod registry;
mod traits;

pub use builder::{DeclaredExtension, ExtensionBuilder, HandlerBinding};
pub use registry::ExtensionRegistry;
pub use traits::WebhookExtension;

// Re-export core event types for convenience
pub use ghala_events::{
    EventName, EventRouter, FnHandler, HandlerError, HandlerFuture, HandlerRef, RouterBuilder,
    Subscription, WebhookHandler, WebhookMeta,
};
