//! Ghala Hooks server binary.

use ghala_core::webhooks::SecretStore;
use ghala_server::{AppConfig, default_extensions, init_tracing, run};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Secrets may come from a .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load()?;

    // Initialize tracing
    init_tracing(&config.server.log_level);

    let secrets = SecretStore::from_env();
    let extensions = default_extensions(&config);

    run(config, secrets, extensions).await?;

    Ok(())
}
