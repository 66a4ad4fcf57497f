//! Gatehouse Auth Core - Stateless signed-session logic
//!
//! Authenticates credentials, mints HMAC-signed session tokens, carries them in
//! a `token` cookie and resolves the current user on every request without a
//! server-side session store.
//!
//! The surface request handlers need:
//! - [`CredentialVerifier`]: password hashing and comparison
//! - [`SessionCookieManager`]: attach and clear the session cookie
//! - [`RedirectContinuation`]: remember where the user was going across a login detour
//! - [`AuthGate`]: "is this request authenticated" and "who is the current user"
//! - [`AuthService`]: login, registration and logout flows composed from the above

pub mod clock;
pub mod config;
pub mod cookie;
pub mod crypto;
pub mod error;
pub mod gate;
pub mod password;
pub mod redirect;
pub mod secret;
pub mod service;
pub mod session;
pub mod token;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::AuthConfig;
pub use cookie::{CookieJar, CookieOptions, ResponseCookies, SameSite, SetCookie};
pub use crypto::{constant_time_eq, HmacKey, HmacKeyError};
pub use error::{AuthError, HashingError, TokenError};
pub use gate::AuthGate;
pub use password::CredentialVerifier;
pub use redirect::{Redirect, RedirectContinuation, REDIRECT_COOKIE_NAME, REDIRECT_QUERY_PARAM};
pub use secret::{SecretProvider, StaticSecret};
pub use service::{AuthService, NewAccount};
pub use session::{SessionCookieManager, SESSION_COOKIE_NAME};
pub use token::{IdentityPayload, Token, TokenCodec};
