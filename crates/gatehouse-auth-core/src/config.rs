//! Configuration types for the session layer

use chrono::TimeDelta;
use std::time::Duration;

use crate::cookie::{CookieOptions, SameSite};
use crate::crypto::HmacKey;
use crate::AuthError;

/// Session layer configuration
#[derive(Clone)]
pub struct AuthConfig {
    /// HMAC secret for token signing
    pub session_secret: String,
    /// How long an issued session token stays valid
    pub session_ttl: Duration,
    /// Domain attribute for every cookie this layer writes
    pub cookie_domain: Option<String>,
    /// Mark cookies `Secure`
    pub cookie_secure: bool,
    /// Mark cookies `HttpOnly`
    pub cookie_http_only: bool,
    /// `SameSite` policy for cookies
    pub cookie_same_site: Option<SameSite>,
    /// Lifetime of the remembered redirect destination
    pub redirect_ttl: Duration,
    /// Upper bound on a single user store call
    pub store_timeout: Duration,
}

impl AuthConfig {
    /// Create a new auth config with defaults for everything but the secret
    pub fn new(session_secret: impl Into<String>) -> Self {
        Self {
            session_secret: session_secret.into(),
            session_ttl: Duration::from_secs(5 * 60 * 60), // 5 hours
            cookie_domain: None,
            cookie_secure: false,
            cookie_http_only: true,
            cookie_same_site: Some(SameSite::Lax),
            redirect_ttl: Duration::from_secs(60 * 60), // 1 hour
            store_timeout: Duration::from_secs(2),
        }
    }

    /// Create a config, rejecting secrets shorter than 32 bytes
    pub fn try_new(session_secret: impl Into<String>) -> Result<Self, AuthError> {
        let config = Self::new(session_secret);
        config.validate()?;
        Ok(config)
    }

    /// Check invariants that must hold before serving
    pub fn validate(&self) -> Result<(), AuthError> {
        HmacKey::new(self.session_secret.as_bytes())
            .map_err(|e| AuthError::Configuration(e.to_string()))?;
        if self.session_ttl.is_zero() {
            return Err(AuthError::Configuration(
                "session TTL must be positive".to_string(),
            ));
        }
        if self.redirect_ttl.is_zero() {
            return Err(AuthError::Configuration(
                "redirect TTL must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Set session TTL
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Set cookie domain
    pub fn with_cookie_domain(mut self, domain: impl Into<String>) -> Self {
        self.cookie_domain = Some(domain.into());
        self
    }

    /// Set `Secure` flag
    pub fn with_cookie_secure(mut self, secure: bool) -> Self {
        self.cookie_secure = secure;
        self
    }

    /// Set `HttpOnly` flag
    pub fn with_cookie_http_only(mut self, http_only: bool) -> Self {
        self.cookie_http_only = http_only;
        self
    }

    /// Set `SameSite` policy (`None` omits the attribute)
    pub fn with_cookie_same_site(mut self, same_site: Option<SameSite>) -> Self {
        self.cookie_same_site = same_site;
        self
    }

    /// Set redirect continuation TTL
    pub fn with_redirect_ttl(mut self, ttl: Duration) -> Self {
        self.redirect_ttl = ttl;
        self
    }

    /// Set user store timeout
    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    /// Cookie attributes shared by the session and redirect cookies
    pub fn cookie_options(&self) -> CookieOptions {
        CookieOptions {
            path: "/".to_string(),
            domain: self.cookie_domain.clone(),
            secure: self.cookie_secure,
            http_only: self.cookie_http_only,
            same_site: self.cookie_same_site,
        }
    }

    pub(crate) fn session_ttl_delta(&self) -> Result<TimeDelta, AuthError> {
        to_delta(self.session_ttl, "session TTL")
    }

    pub(crate) fn redirect_ttl_delta(&self) -> Result<TimeDelta, AuthError> {
        to_delta(self.redirect_ttl, "redirect TTL")
    }
}

fn to_delta(duration: Duration, what: &str) -> Result<TimeDelta, AuthError> {
    TimeDelta::from_std(duration)
        .map_err(|_| AuthError::Configuration(format!("{what} out of range")))
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("session_ttl", &self.session_ttl)
            .field("cookie_domain", &self.cookie_domain)
            .field("cookie_secure", &self.cookie_secure)
            .field("cookie_http_only", &self.cookie_http_only)
            .field("cookie_same_site", &self.cookie_same_site)
            .field("redirect_ttl", &self.redirect_ttl)
            .field("store_timeout", &self.store_timeout)
            .finish_non_exhaustive()
    }
}
