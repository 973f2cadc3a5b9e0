//! Application configuration loaded from environment variables.
//!
//! Secrets are read once at startup and held in memory for the process
//! lifetime; nothing here is mutated after load.

use std::env;
use std::time::Duration;

/// Identity subsystem configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Google OAuth client ID (public); also the expected audience of
    /// provider-issued identity assertions.
    pub google_client_id: String,
    /// Access token lifetime in minutes.
    pub access_token_ttl_mins: i64,
    /// Timeout applied to every federated provider call.
    pub provider_timeout: Duration,

    // --- Secrets ---
    /// Google OAuth client secret
    pub google_client_secret: String,
    /// Master secret the token signing key and intent-state MAC key are
    /// derived from (raw bytes).
    pub token_secret: Vec<u8>,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            google_client_id: "test-client-id.apps.googleusercontent.com".to_string(),
            access_token_ttl_mins: 60,
            provider_timeout: Duration::from_secs(5),
            google_client_secret: "test_client_secret".to_string(),
            token_secret: b"test_token_secret_32_bytes_min!!".to_vec(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            google_client_id: env::var("GOOGLE_CLIENT_ID")
                .map_err(|_| ConfigError::Missing("GOOGLE_CLIENT_ID"))?,
            access_token_ttl_mins: env::var("ACCESS_TOKEN_TTL_MINS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .map_err(|_| ConfigError::Invalid("ACCESS_TOKEN_TTL_MINS"))?,
            provider_timeout: Duration::from_secs(
                env::var("PROVIDER_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .map_err(|_| ConfigError::Invalid("PROVIDER_TIMEOUT_SECS"))?,
            ),
            google_client_secret: env::var("GOOGLE_CLIENT_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("GOOGLE_CLIENT_SECRET"))?,
            token_secret: env::var("TOKEN_SECRET")
                .map_err(|_| ConfigError::Missing("TOKEN_SECRET"))?
                .into_bytes(),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
