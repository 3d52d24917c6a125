//! CardioCare core library
//!
//! Role-based cardiac patient records: accounts authenticate with signed
//! tokens, doctors manage patient records scored by an external
//! heart-failure risk model, nurses follow their assigned patients and
//! admins manage accounts.

pub mod api;
pub mod auth;
pub mod db;
pub mod error;
pub mod models;
pub mod prediction;
pub mod services;
pub mod telemetry;

pub use api::AppState;
pub use error::ApiError;

/// Application configuration
pub mod config {
    use serde::Deserialize;

    #[derive(Debug, Clone, Deserialize)]
    pub struct Config {
        pub server: ServerConfig,
        pub database: DatabaseConfig,
        pub auth: AuthConfig,
        pub prediction: PredictionConfig,
        pub log: LogConfig,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ServerConfig {
        pub host: String,
        pub port: u16,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct DatabaseConfig {
        pub url: String,
        pub max_connections: u32,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct AuthConfig {
        pub jwt_secret: String,
        pub token_ttl_hours: i64,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct PredictionConfig {
        pub url: String,
        pub timeout_secs: u64,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct LogConfig {
        pub filter: String,
        pub json: bool,
    }

    /// Load configuration from file
    pub fn load_config() -> Result<Config, ::config::ConfigError> {
        let env = std::env::var("CARDIOCARE_ENV").unwrap_or_else(|_| "development".into());

        let config: Config = ::config::Config::builder()
            // Start with default settings
            .add_source(::config::File::with_name("config/default"))
            // Override with environment-specific settings
            .add_source(::config::File::with_name(&format!("config/{}", env)).required(false))
            // Override with environment variables, e.g. CARDIOCARE__AUTH__JWT_SECRET
            .add_source(::config::Environment::with_prefix("CARDIOCARE").separator("__"))
            .build()?
            .try_deserialize()?;

        if config.auth.jwt_secret.trim().is_empty() {
            return Err(::config::ConfigError::Message(
                "auth.jwt_secret must be set".into(),
            ));
        }
        if config.auth.token_ttl_hours <= 0 {
            return Err(::config::ConfigError::Message(
                "auth.token_ttl_hours must be positive".into(),
            ));
        }

        Ok(config)
    }

}
