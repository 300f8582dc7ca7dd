//! # Ghala Hooks Core
//!
//! This crate provides the typed payloads, the error taxonomy and the webhook
//! pipeline that ties authentication, decoding and dispatch together.

pub mod context;
pub mod error;
pub mod types;

// Re-export commonly used items at the crate root
pub use context::{WebhookAck, WebhookContext, WebhookReceipt};
pub use error::{GhalaError, GhalaResult};
pub use types::{Customer, Envelope, OrderData, OrderId, Payload, PaymentData, Product};

// Re-export the crates the pipeline is built from
pub use ghala_events as events;
pub use ghala_webhooks as webhooks;
