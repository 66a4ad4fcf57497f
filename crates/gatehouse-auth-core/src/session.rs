//! Session cookie lifecycle
//!
//! Maps token issue onto a `token` cookie and clears it on logout. The cookie
//! itself is not signed; its integrity comes from the token it carries.

use chrono::{DateTime, TimeDelta, Utc};
use std::sync::Arc;

use crate::clock::Clock;
use crate::cookie::{CookieJar, CookieOptions, ResponseCookies, SetCookie};
use crate::token::{IdentityPayload, Token, TokenCodec};
use crate::AuthError;

/// Name of the session cookie
pub const SESSION_COOKIE_NAME: &str = "token";

/// Writes, reads and clears the session cookie
#[derive(Clone)]
pub struct SessionCookieManager {
    codec: TokenCodec,
    options: CookieOptions,
}

impl SessionCookieManager {
    /// Create a new session cookie manager
    ///
    /// # Arguments
    /// * `codec` - Token codec; its clock also stamps cookie expiry
    /// * `options` - Path, domain and flags used for both attach and clear
    pub fn new(codec: TokenCodec, options: CookieOptions) -> Self {
        Self { codec, options }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub fn options(&self) -> &CookieOptions {
        &self.options
    }

    fn clock(&self) -> &Arc<dyn Clock> {
        self.codec.clock()
    }

    /// Issue a token valid for `ttl` and set it as the session cookie.
    ///
    /// Returns the expiry written into both the token and the cookie. Calling
    /// twice on the same response replaces the first cookie.
    pub fn attach(
        &self,
        response: &mut ResponseCookies,
        payload: &IdentityPayload,
        ttl: TimeDelta,
    ) -> Result<DateTime<Utc>, AuthError> {
        let expires_at = self
            .clock()
            .now()
            .checked_add_signed(ttl)
            .ok_or_else(|| AuthError::Configuration("session TTL out of range".to_string()))?;
        // Token expiry has one-second resolution; keep the cookie in step with it
        let expires_at = DateTime::from_timestamp(expires_at.timestamp(), 0).unwrap_or(expires_at);

        let token = self.codec.issue(payload, expires_at)?;
        response.set(SetCookie::new(
            SESSION_COOKIE_NAME,
            token.into_string(),
            expires_at,
            self.options.clone(),
        ));

        tracing::debug!(user_id = %payload.id, %expires_at, "Session cookie attached");
        Ok(expires_at)
    }

    /// Read the session token from the request, if any.
    ///
    /// A missing or empty cookie is the normal anonymous state, not an error.
    pub fn extract_token(&self, jar: &CookieJar) -> Option<Token> {
        jar.get(SESSION_COOKIE_NAME)
            .filter(|value| !value.is_empty())
            .map(Token::from)
    }

    /// Tell the client to delete the session cookie
    pub fn clear(&self, response: &mut ResponseCookies) {
        response.set(SetCookie::expired(SESSION_COOKIE_NAME, self.options.clone()));
    }
}

impl std::fmt::Debug for SessionCookieManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCookieManager")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
