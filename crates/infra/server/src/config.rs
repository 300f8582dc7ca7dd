//! Server configuration.
//!
//! Settings come from an optional TOML file, then environment overrides.
//! Webhook secrets are never read from the file; see [`SecretStore::from_env`].

use ghala_core::Payload;
use ghala_core::events::{DispatchMode, RouterBuilder};
use ghala_core::webhooks::{
    AuthenticatorConfig, SecretStore, SignatureEncoding, SignatureScheme, SignedContent,
    WebhookError,
};
use ghala_plugin_logger::LoggerConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_ENV: &str = "GHALA_CONFIG";
/// File read when [`CONFIG_PATH_ENV`] is unset, if it exists.
pub const DEFAULT_CONFIG_PATH: &str = "ghala.toml";

/// Full application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub webhooks: WebhookSettings,
    pub plugins: PluginsConfig,
}

/// Server-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Path prefix of the webhook endpoints.
    pub base_path: String,
    /// Log level, used when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            base_path: "/webhook".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl ServerConfig {
    /// `host:port` to bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// How inbound webhooks are verified and dispatched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookSettings {
    /// Replay tolerance in seconds.
    pub tolerance_secs: u64,
    /// Header carrying the signature.
    pub signature_header: String,
    /// Headers that may carry the timestamp, in lookup order.
    pub timestamp_headers: Vec<String>,
    /// How the signature is encoded.
    pub encoding: SignatureEncoding,
    /// Which bytes the signature covers.
    pub signed_content: SignedContent,
    /// Refuse to start unless every event type has a secret.
    pub require_all_secrets: bool,
    /// How handlers of one event are run.
    pub dispatch_mode: DispatchMode,
    /// Per-handler time limit in milliseconds.
    pub handler_timeout_ms: Option<u64>,
}

impl Default for WebhookSettings {
    fn default() -> Self {
        Self::from_authenticator(AuthenticatorConfig::default())
    }
}

impl WebhookSettings {
    /// Settings matching the Ghala platform's signing scheme.
    pub fn ghala() -> Self {
        Self::from_authenticator(AuthenticatorConfig::ghala())
    }

    fn from_authenticator(config: AuthenticatorConfig) -> Self {
        Self {
            tolerance_secs: config.tolerance.as_secs(),
            signature_header: config.signature_header,
            timestamp_headers: config.timestamp_headers,
            encoding: config.scheme.encoding,
            signed_content: config.scheme.content,
            require_all_secrets: true,
            dispatch_mode: DispatchMode::default(),
            handler_timeout_ms: None,
        }
    }

    /// Authenticator configuration for these settings.
    pub fn authenticator_config(&self) -> AuthenticatorConfig {
        AuthenticatorConfig {
            signature_header: self.signature_header.clone(),
            timestamp_headers: self.timestamp_headers.clone(),
            scheme: SignatureScheme {
                content: self.signed_content,
                encoding: self.encoding,
            },
            tolerance: Duration::from_secs(self.tolerance_secs),
        }
    }

    /// An empty router builder with the configured dispatch options.
    pub fn router_builder(&self) -> RouterBuilder<Payload> {
        let builder = RouterBuilder::new().mode(self.dispatch_mode);
        match self.handler_timeout_ms {
            Some(ms) => builder.handler_timeout(Duration::from_millis(ms)),
            None => builder,
        }
    }
}

/// Plugin configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginsConfig {
    /// Extensions to leave out, by name.
    pub disabled: Vec<String>,
    /// Logger plugin configuration.
    pub logger: LoggerConfig,
}

/// Loads configuration from a TOML file.
pub fn load_config(path: impl AsRef<Path>) -> Result<AppConfig, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
}

impl AppConfig {
    /// Loads configuration from the process environment and config file.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Loads configuration, reading environment variables through `lookup`.
    ///
    /// An explicit `GHALA_CONFIG` must exist; the default file is optional.
    pub fn load_with<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup(CONFIG_PATH_ENV) {
            Some(path) => load_config(path)?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => load_config(DEFAULT_CONFIG_PATH)?,
            None => Self::default(),
        };

        config.apply_overrides(lookup)?;
        Ok(config)
    }

    /// Applies `GHALA_*` environment overrides.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("GHALA_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("GHALA_PORT") {
            self.server.port = parse_var("GHALA_PORT", &port)?;
        }
        if let Some(level) = lookup("GHALA_LOG_LEVEL") {
            self.server.log_level = level;
        }
        if let Some(secs) = lookup("GHALA_REPLAY_TOLERANCE_SECS") {
            self.webhooks.tolerance_secs = parse_var("GHALA_REPLAY_TOLERANCE_SECS", &secs)?;
        }
        Ok(())
    }

    /// Checks the configuration against the loaded secrets.
    pub fn validate(&self, secrets: &SecretStore) -> Result<(), ConfigError> {
        if self.webhooks.tolerance_secs == 0 {
            return Err(WebhookError::InvalidTolerance.into());
        }

        let base = &self.server.base_path;
        if !base.starts_with('/') || (base.len() > 1 && base.ends_with('/')) {
            return Err(ConfigError::invalid(
                "server.base_path",
                "must start with '/' and not end with '/'",
            ));
        }

        if http::HeaderName::from_bytes(self.webhooks.signature_header.as_bytes()).is_err() {
            return Err(ConfigError::invalid("webhooks.signature_header", "not a valid header name"));
        }
        if self.webhooks.timestamp_headers.is_empty() {
            return Err(ConfigError::invalid("webhooks.timestamp_headers", "must not be empty"));
        }
        for name in &self.webhooks.timestamp_headers {
            if http::HeaderName::from_bytes(name.as_bytes()).is_err() {
                return Err(ConfigError::invalid("webhooks.timestamp_headers", "not a valid header name"));
            }
        }

        if self.webhooks.handler_timeout_ms == Some(0) {
            return Err(ConfigError::invalid("webhooks.handler_timeout_ms", "must be positive"));
        }

        if self.webhooks.require_all_secrets {
            secrets.ensure_complete()?;
        }

        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::invalid(key, e.to_string()))
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {message}")]
    IoError { path: String, message: String },
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },
    #[error(transparent)]
    Webhook(#[from] WebhookError),
}

impl ConfigError {
    fn invalid(key: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key,
            message: message.into(),
        }
    }
}
