//! Application configuration loaded from environment variables.
//!
//! Everything is read once at startup; token secrets stay in memory for the
//! lifetime of the process.

use std::env;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// Frontend URL for CORS
    pub frontend_url: String,
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,

    /// Signing key for short-lived access tokens
    pub access_token_secret: Vec<u8>,
    /// Signing key for refresh tokens (distinct from the access key so the
    /// two can be rotated independently)
    pub refresh_token_secret: Vec<u8>,
    /// Access token lifetime in seconds
    pub access_token_ttl_secs: i64,
    /// Refresh token lifetime in seconds
    pub refresh_token_ttl_secs: i64,

    /// Base URL of the external media store (binary asset uploads)
    pub media_store_url: String,
}

const DEFAULT_ACCESS_TTL_SECS: i64 = 24 * 60 * 60; // 1 day
const DEFAULT_REFRESH_TTL_SECS: i64 = 10 * 24 * 60 * 60; // 10 days

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),

            access_token_secret: env::var("ACCESS_TOKEN_SECRET")
                .map_err(|_| ConfigError::Missing("ACCESS_TOKEN_SECRET"))?
                .into_bytes(),
            refresh_token_secret: env::var("REFRESH_TOKEN_SECRET")
                .map_err(|_| ConfigError::Missing("REFRESH_TOKEN_SECRET"))?
                .into_bytes(),
            access_token_ttl_secs: env::var("ACCESS_TOKEN_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_ACCESS_TTL_SECS),
            refresh_token_ttl_secs: env::var("REFRESH_TOKEN_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_REFRESH_TTL_SECS),

            media_store_url: env::var("MEDIA_STORE_URL")
                .map_err(|_| ConfigError::Missing("MEDIA_STORE_URL"))?,
        })
    }

    /// Fixed config for tests. Distinct signing keys so cross-key tests
    /// are meaningful.
    pub fn test_default() -> Self {
        Self {
            port: 8080,
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            access_token_secret: b"test_access_key_32_bytes_minimum".to_vec(),
            refresh_token_secret: b"test_refresh_key_32_bytes_minimu".to_vec(),
            access_token_ttl_secs: DEFAULT_ACCESS_TTL_SECS,
            refresh_token_ttl_secs: DEFAULT_REFRESH_TTL_SECS,
            media_store_url: "http://localhost:9000".to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
