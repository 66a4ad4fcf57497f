//! Request authentication gate
//!
//! Answers "is this request authenticated" and "who is the current user".
//! Both answers fail closed: a missing cookie, any token failure, a deleted
//! user or a slow store all read as anonymous.

use gatehouse_db::{DbError, UserStore};
use gatehouse_types::User;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::cookie::CookieJar;
use crate::session::SessionCookieManager;
use crate::token::IdentityPayload;
use crate::AuthError;

/// Identity-resolving facade used by request handlers
pub struct AuthGate<U: UserStore + ?Sized> {
    cookies: SessionCookieManager,
    users: Arc<U>,
    store_timeout: Duration,
}

impl<U: UserStore + ?Sized> Clone for AuthGate<U> {
    fn clone(&self) -> Self {
        Self {
            cookies: self.cookies.clone(),
            users: Arc::clone(&self.users),
            store_timeout: self.store_timeout,
        }
    }
}

impl<U: UserStore + ?Sized> AuthGate<U> {
    pub fn new(cookies: SessionCookieManager, users: Arc<U>, store_timeout: Duration) -> Self {
        Self {
            cookies,
            users,
            store_timeout,
        }
    }

    /// Verify the session cookie and return its payload.
    ///
    /// Keeps the failure kind for logging; handlers should prefer
    /// [`is_authenticated`](Self::is_authenticated) and
    /// [`current_user`](Self::current_user).
    pub fn identify(&self, jar: &CookieJar) -> Result<IdentityPayload, AuthError> {
        let token = self
            .cookies
            .extract_token(jar)
            .ok_or(AuthError::MissingSession)?;
        Ok(self.cookies.codec().verify(token.as_str())?)
    }

    /// True iff a session cookie is present and its token verifies
    pub fn is_authenticated(&self, jar: &CookieJar) -> bool {
        self.identify(jar).is_ok()
    }

    /// Verify the token and re-load the authoritative user by its ID.
    ///
    /// Display fields embedded in the token are never returned from here.
    pub async fn load_user(&self, jar: &CookieJar) -> Result<User, AuthError> {
        let identity = self.identify(jar)?;
        let row = with_timeout(self.store_timeout, self.users.find_by_id(identity.id.0))
            .await?
            .ok_or(AuthError::UserNotFound)?;
        Ok(row.into())
    }

    /// The current user, or `None` on any failure along the way
    pub async fn current_user(&self, jar: &CookieJar) -> Option<User> {
        match self.load_user(jar).await {
            Ok(user) => Some(user),
            Err(AuthError::MissingSession) => None,
            Err(e) => {
                if matches!(e, AuthError::StoreUnavailable(_)) {
                    tracing::warn!(error = %e, "User lookup failed, treating request as anonymous");
                } else {
                    tracing::debug!(error = %e, "Current user not resolved");
                }
                None
            }
        }
    }
}

impl<U: UserStore + ?Sized> std::fmt::Debug for AuthGate<U> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthGate")
            .field("store_timeout", &self.store_timeout)
            .finish_non_exhaustive()
    }
}

/// Bound a user store call so an auth decision never hangs on the store
pub(crate) async fn with_timeout<T>(
    timeout: Duration,
    call: impl Future<Output = Result<T, DbError>>,
) -> Result<T, AuthError> {
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result.map_err(AuthError::from),
        Err(_) => {
            tracing::warn!(timeout_ms = timeout.as_millis() as u64, "User store call timed out");
            Err(AuthError::StoreUnavailable("timed out".to_string()))
        }
    }
}
