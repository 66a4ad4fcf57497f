//! Redirect continuation across the login detour
//!
//! A destination arrives as the `redirect_to` query parameter on the first
//! unauthenticated visit and is parked in a short-lived `redirectTo` cookie so
//! it survives the credential round trip. The next authentication decision
//! consumes it exactly once.
//!
//! The destination is advisory. Only local absolute paths are honoured; anything
//! else counts as missing and the caller's default is used.

use chrono::TimeDelta;
use std::sync::Arc;

use crate::clock::Clock;
use crate::cookie::{CookieJar, CookieOptions, ResponseCookies, SetCookie};

/// Query parameter carrying a fresh destination
pub const REDIRECT_QUERY_PARAM: &str = "redirect_to";

/// Side cookie remembering the destination
pub const REDIRECT_COOKIE_NAME: &str = "redirectTo";

/// Longest destination accepted
const MAX_DESTINATION_LEN: usize = 2048;

/// Sign-in and sign-out routes; never a destination after authenticating
const SESSION_ROUTES: &str = "/sessions";

/// Where to send the client next
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    location: String,
}

impl Redirect {
    pub fn to(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
        }
    }

    pub fn location(&self) -> &str {
        &self.location
    }
}

/// Remembers and replays the originally requested destination
#[derive(Clone)]
pub struct RedirectContinuation {
    options: CookieOptions,
    ttl: TimeDelta,
    clock: Arc<dyn Clock>,
}

impl RedirectContinuation {
    pub fn new(options: CookieOptions, ttl: TimeDelta, clock: Arc<dyn Clock>) -> Self {
        Self {
            options,
            ttl,
            clock,
        }
    }

    /// Park a `redirect_to` destination in the side cookie.
    ///
    /// Returns whether anything was captured. Unsafe destinations are dropped.
    pub fn capture(&self, redirect_to: Option<&str>, response: &mut ResponseCookies) -> bool {
        let Some(destination) = redirect_to.and_then(safe_destination) else {
            if redirect_to.is_some() {
                tracing::debug!("Ignoring unsafe redirect destination");
            }
            return false;
        };

        let expires = self.clock.now() + self.ttl;
        response.set(SetCookie::new(
            REDIRECT_COOKIE_NAME,
            destination,
            expires,
            self.options.clone(),
        ));
        true
    }

    /// Effective destination: the query parameter first, then the side cookie.
    ///
    /// `None` means "use the default destination".
    pub fn resolve(&self, redirect_to: Option<&str>, jar: &CookieJar) -> Option<String> {
        redirect_to
            .and_then(safe_destination)
            .or_else(|| jar.get(REDIRECT_COOKIE_NAME).and_then(safe_destination))
            .map(str::to_string)
    }

    /// Clear the side cookie and decide where to send the client.
    ///
    /// Call once per authentication decision; the cleared cookie cannot be
    /// replayed on later requests.
    pub fn consume_and_redirect(
        &self,
        redirect_to: Option<&str>,
        jar: &CookieJar,
        response: &mut ResponseCookies,
        default: &str,
    ) -> Redirect {
        response.set(SetCookie::expired(REDIRECT_COOKIE_NAME, self.options.clone()));
        let location = self
            .resolve(redirect_to, jar)
            .unwrap_or_else(|| default.to_string());
        Redirect::to(location)
    }
}

impl std::fmt::Debug for RedirectContinuation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedirectContinuation")
            .field("options", &self.options)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

/// Accept only same-site absolute paths that are also valid cookie values
/// and do not lead back into the session routes
fn safe_destination(candidate: &str) -> Option<&str> {
    let ok = candidate.len() <= MAX_DESTINATION_LEN
        && candidate.starts_with('/')
        && !candidate.starts_with("//")
        && candidate
            .chars()
            .all(|c| c.is_ascii_graphic() && !matches!(c, '\\' | '"' | ',' | ';'))
        && !is_session_route(candidate);
    ok.then_some(candidate)
}

fn is_session_route(candidate: &str) -> bool {
    let path = candidate
        .split(['?', '#'])
        .next()
        .unwrap_or(candidate)
        .to_ascii_lowercase();
    path.strip_prefix(SESSION_ROUTES)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}
