//! # Ghala Hooks Server
//!
//! HTTP service receiving Ghala webhooks. Each event type gets its own
//! endpoint; requests are authenticated, decoded and dispatched to the
//! handlers contributed by the loaded extensions.

pub mod config;
mod error;
mod routes;

pub use config::{AppConfig, ConfigError, PluginsConfig, ServerConfig, WebhookSettings, load_config};
pub use error::{ApiError, ServerError};
pub use routes::{AppState, webhook_path, webhook_routes};

use ghala_core::webhooks::{RequestAuthenticator, SecretStore, WebhookEventType};
use ghala_core::{Payload, WebhookContext};
use ghala_events_sdk::ExtensionRegistry;
use ghala_plugin_logger::LoggerPlugin;
use tracing_subscriber::EnvFilter;

/// Initializes logging. `RUST_LOG` wins over `default_level`.
pub fn init_tracing(default_level: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

/// The built-in extensions, minus those disabled in `config`.
pub fn default_extensions(config: &AppConfig) -> ExtensionRegistry<Payload> {
    ExtensionRegistry::new()
        .with_disabled(config.plugins.disabled.iter().cloned())
        .with(LoggerPlugin::new(config.plugins.logger.clone()))
}

/// Validates the configuration and assembles the webhook pipeline.
pub fn build_context(
    config: &AppConfig,
    secrets: SecretStore,
    extensions: &ExtensionRegistry<Payload>,
) -> Result<WebhookContext, ServerError> {
    config.validate(&secrets)?;

    for event_type in secrets.missing() {
        tracing::warn!(
            event = %event_type,
            key = event_type.secret_env_key(),
            "No secret configured; requests for this event will be rejected"
        );
    }

    let authenticator = RequestAuthenticator::new(secrets, config.webhooks.authenticator_config())?;
    let router = extensions.build_router(config.webhooks.router_builder());

    Ok(WebhookContext::new(authenticator, router))
}

/// Builds the pipeline and serves it until Ctrl+C.
pub async fn run(
    config: AppConfig,
    secrets: SecretStore,
    extensions: ExtensionRegistry<Payload>,
) -> Result<(), ServerError> {
    let context = build_context(&config, secrets, &extensions)?;

    tracing::info!(
        extensions = ?extensions.active_names(),
        handlers = context.router().len(),
        mode = ?config.webhooks.dispatch_mode,
        "Loaded webhook extensions"
    );
    for event_type in WebhookEventType::ALL {
        tracing::info!(
            event = %event_type,
            route = %webhook_path(&config.server.base_path, event_type),
            "Registered webhook route"
        );
    }

    let app = webhook_routes(context, &config.server.base_path);
    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Starting Ghala Hooks server on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
