//! Application configuration loaded from environment variables.
//!
//! CRM credentials are injected at process start (environment variables or
//! secret bindings that surface as environment variables) and read once into
//! an immutable `Config`.

use std::env;
use std::fmt;
use std::time::Duration;

/// Application configuration, loaded once at startup.
#[derive(Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Server port
    pub port: u16,
    /// Kiosk page origin allowed by CORS
    pub frontend_url: String,
    /// School name echoed in API metadata
    pub school_name: String,
    /// Base URL of the CRM OAuth server
    pub crm_accounts_url: String,
    /// Base URL of the CRM REST API (including version)
    pub crm_api_url: String,
    /// Boolean deal field set on check-in
    pub crm_checkin_field: String,
    /// CRM deal record updated on check-in
    pub crm_deal_id: String,
    /// Timeout for each outbound CRM call
    pub crm_timeout: Duration,
    /// Attempts for the token exchange (1 = no retry)
    pub token_retry_attempts: u32,
    /// Initial backoff between token exchange attempts
    pub token_retry_base_delay: Duration,
    /// Delay before the scanner shows a "no code found yet" hint
    pub scan_hint_after: Duration,

    // --- Secrets ---
    /// CRM OAuth client ID
    pub crm_client_id: String,
    /// CRM OAuth client secret
    pub crm_client_secret: String,
    /// Long-lived CRM refresh token
    pub crm_refresh_token: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("frontend_url", &self.frontend_url)
            .field("school_name", &self.school_name)
            .field("crm_accounts_url", &self.crm_accounts_url)
            .field("crm_api_url", &self.crm_api_url)
            .field("crm_checkin_field", &self.crm_checkin_field)
            .field("crm_deal_id", &self.crm_deal_id)
            .field("crm_timeout", &self.crm_timeout)
            .field("token_retry_attempts", &self.token_retry_attempts)
            .field("token_retry_base_delay", &self.token_retry_base_delay)
            .field("scan_hint_after", &self.scan_hint_after)
            .field("crm_client_id", &"<redacted>")
            .field("crm_client_secret", &"<redacted>")
            .field("crm_refresh_token", &"<redacted>")
            .finish()
    }
}

impl Config {
    /// Deterministic config for tests only.
    pub fn test_default() -> Self {
        Self {
            port: 8080,
            frontend_url: "http://localhost:3000".to_string(),
            school_name: "Euro School".to_string(),
            crm_accounts_url: "http://crm.test/accounts".to_string(),
            crm_api_url: "http://crm.test/crm/v8".to_string(),
            crm_checkin_field: "checked_in".to_string(),
            crm_deal_id: "3250887001176218862".to_string(),
            crm_timeout: Duration::from_secs(1),
            token_retry_attempts: 3,
            token_retry_base_delay: Duration::ZERO,
            scan_hint_after: Duration::from_secs(15),
            crm_client_id: "test_client_id".to_string(),
            crm_client_secret: "test_client_secret".to_string(),
            crm_refresh_token: "test_refresh_token".to_string(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is honoured for local
    /// development.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            port: parse_or("PORT", 8080),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            school_name: env::var("SCHOOL_NAME").unwrap_or_else(|_| "Euro School".to_string()),
            crm_accounts_url: env::var("CRM_ACCOUNTS_URL")
                .unwrap_or_else(|_| "https://accounts.zoho.com".to_string())
                .trim_end_matches('/')
                .to_string(),
            crm_api_url: env::var("CRM_API_URL")
                .unwrap_or_else(|_| "https://www.zohoapis.com/crm/v8".to_string())
                .trim_end_matches('/')
                .to_string(),
            crm_checkin_field: env::var("CRM_CHECKIN_FIELD")
                .unwrap_or_else(|_| "checked_in".to_string()),
            crm_deal_id: required("CRM_DEAL_ID")?,
            crm_timeout: Duration::from_millis(parse_or("CRM_TIMEOUT_MS", 10_000)),
            token_retry_attempts: parse_or("CRM_TOKEN_RETRY_ATTEMPTS", 3u32).max(1),
            token_retry_base_delay: Duration::from_millis(parse_or("CRM_TOKEN_RETRY_BASE_MS", 250)),
            scan_hint_after: Duration::from_secs(parse_or("SCAN_HINT_SECS", 15)),

            crm_client_id: required("CRM_CLIENT_ID")?,
            crm_client_secret: required("CRM_CLIENT_SECRET")?,
            crm_refresh_token: required("CRM_REFRESH_TOKEN")?,
        })
    }

    /// Whether all three OAuth credentials are present.
    pub fn has_valid_credentials(&self) -> bool {
        !self.crm_client_id.is_empty()
            && !self.crm_client_secret.is_empty()
            && !self.crm_refresh_token.is_empty()
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .map(|v| v.trim().to_string())
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn parse_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
