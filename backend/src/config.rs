//! Configuration management for the Fireworks Order Management Platform
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with FOM_ prefix
//!
//! All credentials (database URL, messaging token) come from here; none
//! are embedded in source.

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Document artifact storage
    pub documents: DocumentConfig,

    /// WhatsApp Cloud API configuration
    pub whatsapp: WhatsAppConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DocumentConfig {
    /// Directory invoices/receipts/quotations are written under
    pub dir: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WhatsAppConfig {
    /// Whether outbound messaging is enabled at all
    pub enabled: bool,

    /// Graph API base URL
    pub api_base: String,

    /// Messaging access token
    pub access_token: String,

    /// Sender phone number id
    pub phone_number_id: String,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("FOM_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 5000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("documents.dir", "./pdf_data")?
            .set_default("whatsapp.enabled", false)?
            .set_default("whatsapp.api_base", "https://graph.facebook.com/v17.0")?
            .set_default("whatsapp.access_token", "")?
            .set_default("whatsapp.phone_number_id", "")?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (FOM_ prefix)
            .add_source(
                Environment::with_prefix("FOM")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
