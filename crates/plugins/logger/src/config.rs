//! Logger plugin configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the logger plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Whether the plugin registers its handler.
    pub active: bool,
    /// Also log the full decoded payload (at debug level).
    pub include_payload: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            active: true,
            include_payload: false,
        }
    }
}
