//! HTTP handlers

mod health;
mod pages;
mod sessions;
mod users;

pub use health::{health, ready};
pub use pages::{account, index};
pub use sessions::{create_session, destroy_session, new_session};
pub use users::{create_user, new_user};

use axum::response::{IntoResponse, Redirect, Response};
use gatehouse_auth_core::{CookieJar, ResponseCookies};
use serde::Deserialize;

use crate::extractors::WithCookies;
use crate::state::AppState;

/// Where to land when no continuation is pending
const DEFAULT_DESTINATION: &str = "/";

/// `?redirect_to=` on guest pages
#[derive(Debug, Default, Deserialize)]
pub struct RedirectQuery {
    pub redirect_to: Option<String>,
}

/// Finish an authentication decision: clear the continuation cookie and
/// redirect to it, or to the default destination
fn continue_after_auth(
    state: &AppState,
    query: &RedirectQuery,
    jar: &CookieJar,
    mut cookies: ResponseCookies,
) -> Response {
    let redirect = state.auth.redirects().consume_and_redirect(
        query.redirect_to.as_deref(),
        jar,
        &mut cookies,
        DEFAULT_DESTINATION,
    );
    WithCookies(cookies, Redirect::to(redirect.location())).into_response()
}
