//! Auth service - composes credential checks, session cookies and the user store
//! into the login, registration and logout flows

use chrono::{DateTime, TimeDelta, Utc};
use gatehouse_db::{NewUser, UserRow, UserStore};
use gatehouse_types::User;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    clock::{Clock, SystemClock},
    config::AuthConfig,
    cookie::ResponseCookies,
    gate::{with_timeout, AuthGate},
    password::CredentialVerifier,
    redirect::RedirectContinuation,
    secret::StaticSecret,
    session::SessionCookieManager,
    token::{IdentityPayload, TokenCodec},
    AuthError,
};

/// Registration input, already validated by the caller
#[derive(Clone)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for NewAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewAccount")
            .field("name", &self.name)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Authentication service
///
/// Provides a unified interface for:
/// - Login against stored credentials
/// - Registration of new accounts
/// - Logout
/// - Current-user resolution through [`AuthGate`]
pub struct AuthService<U: UserStore + ?Sized> {
    config: AuthConfig,
    verifier: CredentialVerifier,
    cookies: SessionCookieManager,
    redirects: RedirectContinuation,
    gate: AuthGate<U>,
    users: Arc<U>,
    session_ttl: TimeDelta,
    dummy_hash: Arc<str>,
}

impl<U: UserStore + ?Sized> AuthService<U> {
    /// Create a new auth service on the wall clock with default hashing cost
    pub fn new(config: AuthConfig, users: Arc<U>) -> Result<Self, AuthError> {
        Self::with_clock(config, users, Arc::new(SystemClock))
    }

    /// Create a new auth service with an explicit clock
    pub fn with_clock(
        config: AuthConfig,
        users: Arc<U>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AuthError> {
        Self::from_parts(config, users, clock, CredentialVerifier::new())
    }

    /// Create a new auth service from all of its collaborators
    ///
    /// # Errors
    /// Returns [`AuthError::Configuration`] if the config does not validate.
    pub fn from_parts(
        config: AuthConfig,
        users: Arc<U>,
        clock: Arc<dyn Clock>,
        verifier: CredentialVerifier,
    ) -> Result<Self, AuthError> {
        config.validate()?;
        let session_ttl = config.session_ttl_delta()?;
        let redirect_ttl = config.redirect_ttl_delta()?;
        let options = config.cookie_options();

        let secret = StaticSecret::new(config.session_secret.as_bytes());
        let codec = TokenCodec::from_provider(&secret, Arc::clone(&clock))?;
        let cookies = SessionCookieManager::new(codec, options.clone());
        let redirects = RedirectContinuation::new(options, redirect_ttl, clock);
        let gate = AuthGate::new(cookies.clone(), Arc::clone(&users), config.store_timeout);

        // Unknown emails are checked against this so both login failures cost the same
        let dummy_hash: Arc<str> = Arc::from(verifier.hash("gatehouse-unknown-account")?);

        Ok(Self {
            config,
            verifier,
            cookies,
            redirects,
            gate,
            users,
            session_ttl,
            dummy_hash,
        })
    }

    pub fn gate(&self) -> &AuthGate<U> {
        &self.gate
    }

    pub fn cookies(&self) -> &SessionCookieManager {
        &self.cookies
    }

    pub fn redirects(&self) -> &RedirectContinuation {
        &self.redirects
    }

    pub fn verifier(&self) -> &CredentialVerifier {
        &self.verifier
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    fn store_timeout(&self) -> Duration {
        self.config.store_timeout
    }

    // =========================================================================
    // Login / Logout
    // =========================================================================

    /// Check credentials and, on success, attach a fresh session cookie.
    ///
    /// An unknown email and a wrong password both yield
    /// [`AuthError::InvalidCredentials`] after the same amount of hashing work.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        response: &mut ResponseCookies,
    ) -> Result<User, AuthError> {
        let result = self.login_inner(email, password, response).await;
        let outcome = match &result {
            Ok(user) => {
                tracing::info!(user_id = %user.id, "User logged in");
                "success"
            }
            Err(AuthError::InvalidCredentials) => {
                tracing::debug!("Login rejected");
                "invalid_credentials"
            }
            Err(e) => {
                tracing::warn!(error = %e, "Login failed");
                "error"
            }
        };
        metrics::counter!("auth_logins_total", "outcome" => outcome).increment(1);
        result
    }

    async fn login_inner(
        &self,
        email: &str,
        password: &str,
        response: &mut ResponseCookies,
    ) -> Result<User, AuthError> {
        let row = with_timeout(self.store_timeout(), self.users.find_by_email(email)).await?;
        let stored_hash: Arc<str> = match &row {
            Some(row) => Arc::from(row.password_hash.as_str()),
            None => Arc::clone(&self.dummy_hash),
        };

        let matched = self.check_password(password, stored_hash).await?;
        let row = match row {
            Some(row) if matched => row,
            _ => return Err(AuthError::InvalidCredentials),
        };

        let user = User::from(row);
        self.start_session(&user, response)?;
        Ok(user)
    }

    /// Clear the session cookie
    pub fn logout(&self, response: &mut ResponseCookies) {
        self.cookies.clear(response);
        metrics::counter!("auth_logouts_total").increment(1);
        tracing::info!("User logged out");
    }

    /// Attach a session cookie for `user`, returning its expiry
    pub fn start_session(
        &self,
        user: &User,
        response: &mut ResponseCookies,
    ) -> Result<DateTime<Utc>, AuthError> {
        let payload = IdentityPayload::new(user.id)
            .with_name(user.name.clone())
            .with_email(user.email.clone());
        self.cookies.attach(response, &payload, self.session_ttl)
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Whether an email is already registered
    pub async fn email_taken(&self, email: &str) -> Result<bool, AuthError> {
        with_timeout(self.store_timeout(), self.users.exists_by_email(email)).await
    }

    /// Hash the password, insert the user and sign them in.
    ///
    /// A concurrent registration of the same email surfaces as
    /// [`AuthError::EmailTaken`].
    pub async fn register(
        &self,
        account: NewAccount,
        response: &mut ResponseCookies,
    ) -> Result<User, AuthError> {
        let result = self.register_inner(account, response).await;
        let outcome = match &result {
            Ok(user) => {
                tracing::info!(user_id = %user.id, "User registered");
                "success"
            }
            Err(AuthError::EmailTaken) => "email_taken",
            Err(e) => {
                tracing::warn!(error = %e, "Registration failed");
                "error"
            }
        };
        metrics::counter!("auth_registrations_total", "outcome" => outcome).increment(1);
        result
    }

    async fn register_inner(
        &self,
        account: NewAccount,
        response: &mut ResponseCookies,
    ) -> Result<User, AuthError> {
        let password_hash = self.hash_password(account.password).await?;
        let new_user = NewUser::new(account.name, account.email, password_hash);
        let row: UserRow = with_timeout(self.store_timeout(), self.users.insert(new_user)).await?;

        let user = User::from(row);
        self.start_session(&user, response)?;
        Ok(user)
    }

    // =========================================================================
    // Hashing off the async runtime
    // =========================================================================

    async fn check_password(&self, password: &str, hash: Arc<str>) -> Result<bool, AuthError> {
        let verifier = self.verifier.clone();
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || verifier.verify(&password, &hash))
            .await
            .map_err(|e| AuthError::Internal(format!("password check task failed: {e}")))
    }

    async fn hash_password(&self, password: String) -> Result<String, AuthError> {
        let verifier = self.verifier.clone();
        let hashed = tokio::task::spawn_blocking(move || verifier.hash(&password))
            .await
            .map_err(|e| AuthError::Internal(format!("password hash task failed: {e}")))??;
        Ok(hashed)
    }
}

impl<U: UserStore + ?Sized> std::fmt::Debug for AuthService<U> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
