//! # Ghala Events
//!
//! Event routing for Ghala Hooks providing:
//! - Dot-namespaced event names and wildcard subscriptions
//! - An immutable subscription registry built once at startup
//! - Isolated handler execution with per-handler outcomes
//!
//! ## Example
//!
//! ```rust,ignore
//! use ghala_events::{EventName, EventRouter, WebhookMeta};
//!
//! let router = EventRouter::builder()
//!     .on("order.created", NotifyWarehouse)?
//!     .on_all(AuditLog)
//!     .build();
//!
//! let event = EventName::new("order.created")?;
//! let result = router.dispatch(&event, payload, WebhookMeta::new(event.clone(), ts)).await;
//! assert!(result.is_success());
//! ```

mod error;
mod event;
mod handler;
mod router;

pub use error::{EventError, EventResult, HandlerError};
pub use event::{EventName, Subscription, WebhookMeta};
pub use handler::{FnHandler, HandlerFuture, HandlerOutcome, HandlerRef, HandlerStatus, WebhookHandler};
pub use router::{DispatchMode, DispatchResult, EventRouter, RouterBuilder};
