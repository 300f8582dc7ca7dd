//! Per-event webhook secrets.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{WebhookError, WebhookResult};
use crate::event_type::WebhookEventType;

/// Shared secret for one event type.
///
/// Never empty. The bytes are never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct WebhookSecret(Arc<[u8]>);

impl WebhookSecret {
    /// Creates a secret, rejecting empty input.
    pub fn new(secret: impl AsRef<[u8]>) -> WebhookResult<Self> {
        let bytes = secret.as_ref();
        if bytes.is_empty() {
            return Err(WebhookError::EmptySecret);
        }
        Ok(Self(Arc::from(bytes)))
    }

    /// Returns the raw key bytes.
    pub fn expose(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for WebhookSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("WebhookSecret(<redacted>)")
    }
}

/// Immutable mapping from event type to secret.
#[derive(Clone, Default)]
pub struct SecretStore {
    secrets: HashMap<WebhookEventType, WebhookSecret>,
}

impl SecretStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a secret, builder style.
    pub fn with(mut self, event_type: WebhookEventType, secret: WebhookSecret) -> Self {
        self.secrets.insert(event_type, secret);
        self
    }

    /// Reads every secret from the process environment.
    pub fn from_env() -> Self {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Reads every secret through `lookup`, keyed by [`WebhookEventType::secret_env_key`].
    ///
    /// Absent or empty values leave the event type unconfigured.
    pub fn from_env_with<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut store = Self::new();

        for event_type in WebhookEventType::ALL {
            let key = event_type.secret_env_key();
            match lookup(key).map(WebhookSecret::new) {
                Some(Ok(secret)) => {
                    store.secrets.insert(event_type, secret);
                }
                Some(Err(_)) => tracing::warn!(key, "Ignoring empty webhook secret"),
                None => {}
            }
        }

        store
    }

    /// Returns the secret for an event type.
    pub fn get(&self, event_type: WebhookEventType) -> Option<&WebhookSecret> {
        self.secrets.get(&event_type)
    }

    /// Checks whether an event type has a secret.
    pub fn contains(&self, event_type: WebhookEventType) -> bool {
        self.secrets.contains_key(&event_type)
    }

    /// Event types with a secret, in endpoint order.
    pub fn configured(&self) -> Vec<WebhookEventType> {
        WebhookEventType::ALL
            .into_iter()
            .filter(|t| self.contains(*t))
            .collect()
    }

    /// Event types without a secret, in endpoint order.
    pub fn missing(&self) -> Vec<WebhookEventType> {
        WebhookEventType::ALL
            .into_iter()
            .filter(|t| !self.contains(*t))
            .collect()
    }

    /// Fails with every missing environment key unless all event types are configured.
    pub fn ensure_complete(&self) -> WebhookResult<()> {
        let missing = self.missing();
        if missing.is_empty() {
            return Ok(());
        }

        Err(WebhookError::MissingSecrets {
            keys: missing.iter().map(|t| t.secret_env_key()).collect(),
        })
    }
}

impl std::fmt::Debug for SecretStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretStore")
            .field("configured", &self.configured())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_secret_rejected() {
        assert_eq!(WebhookSecret::new(""), Err(WebhookError::EmptySecret));
        assert!(WebhookSecret::new("s3cr3t").is_ok());
    }

    #[test]
    fn test_secret_debug_redacted() {
        let secret = WebhookSecret::new("super-secret-value").unwrap();
        let store = SecretStore::new().with(WebhookEventType::OrderCreated, secret.clone());

        assert!(!format!("{:?}", secret).contains("super-secret-value"));
        assert!(!format!("{:?}", store).contains("super-secret-value"));
    }

    #[test]
    fn test_from_env_with() {
        let store = SecretStore::from_env_with(|key| match key {
            "CREATE_ORDER_WEBHOOK_SECRET" => Some("a".to_string()),
            "PAYMENT_FAILED_WEBHOOK_SECRET" => Some(String::new()),
            _ => None,
        });

        assert_eq!(store.configured(), vec![WebhookEventType::OrderCreated]);
        assert_eq!(store.get(WebhookEventType::OrderCreated).unwrap().expose(), b"a");
        assert!(!store.contains(WebhookEventType::PaymentFailed));
    }

    #[test]
    fn test_ensure_complete_names_missing_keys() {
        let store = SecretStore::from_env_with(|key| {
            (key != "UPDATE_ORDER_WEBHOOK_SECRET").then(|| format!("{key}-value"))
        });

        assert_eq!(
            store.ensure_complete(),
            Err(WebhookError::MissingSecrets {
                keys: vec!["UPDATE_ORDER_WEBHOOK_SECRET"]
            })
        );

        let complete = store.with(
            WebhookEventType::OrderUpdated,
            WebhookSecret::new("x").unwrap(),
        );
        assert!(complete.ensure_complete().is_ok());
    }
}
