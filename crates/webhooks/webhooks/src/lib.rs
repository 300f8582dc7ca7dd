//! # Ghala Webhooks
//!
//! Inbound webhook verification for Ghala Hooks:
//! - Per-event secrets loaded from the environment
//! - HMAC-SHA256 signature verification in constant time
//! - Timestamp-based replay protection
//! - A request authenticator that runs every check in order
//!
//! ## Example
//!
//! ```rust,ignore
//! use ghala_webhooks::{AuthenticatorConfig, RequestAuthenticator, SecretStore, WebhookEventType};
//!
//! let secrets = SecretStore::from_env();
//! secrets.ensure_complete()?;
//!
//! let authenticator = RequestAuthenticator::new(secrets, AuthenticatorConfig::ghala())?;
//! let decision = authenticator.authenticate(WebhookEventType::OrderCreated, &body, &headers);
//! ```

mod authenticator;
mod error;
mod event_type;
mod replay;
mod secrets;
mod signature;

pub use authenticator::{
    AuthDecision, AuthenticatedRequest, AuthenticatorConfig, DEFAULT_SIGNATURE_HEADER,
    DEFAULT_TIMESTAMP_HEADER, RequestAuthenticator,
};
pub use error::{AuthFailure, WebhookError, WebhookResult};
pub use event_type::WebhookEventType;
pub use replay::{DEFAULT_TOLERANCE, ReplayGuard, is_fresh, parse_timestamp};
pub use secrets::{SecretStore, WebhookSecret};
pub use signature::{SignatureEncoding, SignatureScheme, SignedContent, WebhookSigner, verify};
