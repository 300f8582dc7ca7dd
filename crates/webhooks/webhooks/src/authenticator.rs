//! Request authenticator for incoming webhooks.

use http::HeaderMap;
use std::time::Duration;

use crate::error::{AuthFailure, WebhookResult};
use crate::event_type::WebhookEventType;
use crate::replay::{DEFAULT_TOLERANCE, ReplayGuard, parse_timestamp};
use crate::secrets::SecretStore;
use crate::signature::{SignatureScheme, WebhookSigner};

/// Default signature header.
pub const DEFAULT_SIGNATURE_HEADER: &str = "x-signature";
/// Default timestamp header.
pub const DEFAULT_TIMESTAMP_HEADER: &str = "x-timestamp";

/// Header names and signing scheme of the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatorConfig {
    /// Header carrying the signature.
    pub signature_header: String,
    /// Headers that may carry the timestamp; the first one present is used.
    pub timestamp_headers: Vec<String>,
    /// Signing scheme.
    pub scheme: SignatureScheme,
    /// Replay tolerance window.
    pub tolerance: Duration,
}

impl Default for AuthenticatorConfig {
    fn default() -> Self {
        Self {
            signature_header: DEFAULT_SIGNATURE_HEADER.to_string(),
            timestamp_headers: vec![DEFAULT_TIMESTAMP_HEADER.to_string()],
            scheme: SignatureScheme::default(),
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl AuthenticatorConfig {
    /// Headers and scheme used by Ghala.
    pub fn ghala() -> Self {
        Self {
            signature_header: "x-ghala-signature".to_string(),
            timestamp_headers: vec!["x-ghala-timestamp".to_string(), "webhook-timestamp".to_string()],
            scheme: SignatureScheme::ghala(),
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    /// Sets the tolerance window.
    pub fn tolerance(mut self, tolerance: Duration) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sets the signing scheme.
    pub fn scheme(mut self, scheme: SignatureScheme) -> Self {
        self.scheme = scheme;
        self
    }
}

/// Accept/reject decision for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthDecision {
    /// Whether the request passed every stage.
    pub accepted: bool,
    /// Why it was rejected, if it was.
    pub reason: Option<AuthFailure>,
}

impl AuthDecision {
    /// An accepted decision.
    pub fn accept() -> Self {
        Self {
            accepted: true,
            reason: None,
        }
    }

    /// A rejected decision.
    pub fn reject(reason: AuthFailure) -> Self {
        Self {
            accepted: false,
            reason: Some(reason),
        }
    }
}

impl<T> From<Result<T, AuthFailure>> for AuthDecision {
    fn from(result: Result<T, AuthFailure>) -> Self {
        match result {
            Ok(_) => Self::accept(),
            Err(reason) => Self::reject(reason),
        }
    }
}

/// A request that passed authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedRequest {
    /// The event type the request was authenticated for.
    pub event_type: WebhookEventType,
    /// The request's timestamp, in epoch seconds.
    pub timestamp: i64,
}

/// Authenticates inbound webhook requests.
///
/// Stages run in a fixed order and stop at the first failure: secret
/// lookup, signature header, signature check, timestamp header, replay window.
#[derive(Debug, Clone)]
pub struct RequestAuthenticator {
    secrets: SecretStore,
    config: AuthenticatorConfig,
    guard: ReplayGuard,
}

impl RequestAuthenticator {
    /// Creates an authenticator; fails if the tolerance is not positive.
    pub fn new(secrets: SecretStore, config: AuthenticatorConfig) -> WebhookResult<Self> {
        let guard = ReplayGuard::new(config.tolerance)?;
        Ok(Self {
            secrets,
            config,
            guard,
        })
    }

    /// Returns the secret store.
    pub fn secrets(&self) -> &SecretStore {
        &self.secrets
    }

    /// Returns the configuration.
    pub fn config(&self) -> &AuthenticatorConfig {
        &self.config
    }

    /// Authenticates a request against the current server time.
    pub fn authenticate(&self, event_type: WebhookEventType, body: &[u8], headers: &HeaderMap) -> AuthDecision {
        self.verify(event_type, body, headers).into()
    }

    /// Authenticates a request against an explicit server time.
    pub fn authenticate_at(
        &self,
        event_type: WebhookEventType,
        body: &[u8],
        headers: &HeaderMap,
        now: i64,
    ) -> AuthDecision {
        self.verify_at(event_type, body, headers, now).into()
    }

    /// Authenticates a request and returns its parsed timestamp.
    pub fn verify(
        &self,
        event_type: WebhookEventType,
        body: &[u8],
        headers: &HeaderMap,
    ) -> Result<AuthenticatedRequest, AuthFailure> {
        self.verify_at(event_type, body, headers, chrono::Utc::now().timestamp())
    }

    /// Authenticates a request against an explicit server time.
    pub fn verify_at(
        &self,
        event_type: WebhookEventType,
        body: &[u8],
        headers: &HeaderMap,
        now: i64,
    ) -> Result<AuthenticatedRequest, AuthFailure> {
        let secret = self
            .secrets
            .get(event_type)
            .ok_or(AuthFailure::UnknownEventType)?;

        let signature = match headers.get(self.config.signature_header.as_str()) {
            None => return Err(AuthFailure::MissingSignature),
            Some(value) if value.is_empty() => return Err(AuthFailure::MissingSignature),
            Some(value) => value.to_str().map_err(|_| AuthFailure::InvalidSignature)?,
        };

        let raw_timestamp = self.raw_timestamp(headers);

        let signer = WebhookSigner::with_scheme(secret.clone(), self.config.scheme);
        if !signer.verify(signature, raw_timestamp, body) {
            return Err(AuthFailure::InvalidSignature);
        }

        let timestamp = raw_timestamp
            .and_then(parse_timestamp)
            .ok_or(AuthFailure::MissingOrMalformedTimestamp)?;

        if !self.guard.check(timestamp, now) {
            return Err(AuthFailure::StaleOrFutureTimestamp);
        }

        Ok(AuthenticatedRequest {
            event_type,
            timestamp,
        })
    }

    fn raw_timestamp<'h>(&self, headers: &'h HeaderMap) -> Option<&'h str> {
        self.config
            .timestamp_headers
            .iter()
            .find_map(|name| headers.get(name.as_str()))
            .and_then(|value| value.to_str().ok())
    }
}
