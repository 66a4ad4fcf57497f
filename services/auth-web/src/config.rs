//! Configuration for the auth web service.

use gatehouse_auth_core::{AuthConfig, SameSite};
use std::time::Duration;

/// Auth web configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub http_port: u16,

    /// Database URL; the in-memory store is used when absent
    pub database_url: Option<String>,

    /// Session layer configuration
    pub auth: AuthConfig,

    /// Whole-request timeout for non-health routes
    pub request_timeout: Duration,

    /// Serve `/metrics`
    pub metrics_enabled: bool,

    /// Fallback log filter when `RUST_LOG` is unset
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        // Server
        let http_port = parse_or(&var, "HTTP_PORT", 8080u16)?;
        let request_timeout_secs: u64 = parse_or(&var, "REQUEST_TIMEOUT_SECS", 30)?;
        let metrics_enabled = parse_or(&var, "METRICS_ENABLED", true)?;
        let log_level = var("LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        // Store
        let database_url = var("DATABASE_URL");
        let store_timeout_ms: u64 = parse_or(&var, "STORE_TIMEOUT_MS", 2000)?;

        // Session secret (minimum 32 bytes)
        let session_secret = var("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;

        // Session and cookies
        let session_ttl_hours: u64 = parse_or(&var, "SESSION_TTL_HOURS", 5)?;
        let redirect_ttl_secs: u64 = parse_or(&var, "REDIRECT_TTL_SECS", 3600)?;
        let cookie_secure = parse_or(&var, "COOKIE_SECURE", false)?;
        let cookie_http_only = parse_or(&var, "COOKIE_HTTP_ONLY", true)?;
        let cookie_same_site = match var("COOKIE_SAME_SITE") {
            None => Some(SameSite::Lax),
            Some(v) if v.eq_ignore_ascii_case("off") => None,
            Some(v) => Some(
                v.parse::<SameSite>()
                    .map_err(|_| ConfigError::Invalid("COOKIE_SAME_SITE"))?,
            ),
        };

        let mut auth = AuthConfig::try_new(session_secret)
            .map_err(|e| ConfigError::AuthConfig(e.to_string()))?
            .with_session_ttl(Duration::from_secs(session_ttl_hours.saturating_mul(3600)))
            .with_redirect_ttl(Duration::from_secs(redirect_ttl_secs))
            .with_cookie_secure(cookie_secure)
            .with_cookie_http_only(cookie_http_only)
            .with_cookie_same_site(cookie_same_site)
            .with_store_timeout(Duration::from_millis(store_timeout_ms));
        if let Some(domain) = var("COOKIE_DOMAIN") {
            auth = auth.with_cookie_domain(domain);
        }
        auth.validate()
            .map_err(|e| ConfigError::AuthConfig(e.to_string()))?;

        Ok(Self {
            http_port,
            database_url,
            auth,
            request_timeout: Duration::from_secs(request_timeout_secs),
            metrics_enabled,
            log_level,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match var(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Auth config error: {0}")]
    AuthConfig(String),
}
