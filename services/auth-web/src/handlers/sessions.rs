//! Session handlers (sign in, sign out)

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use gatehouse_auth_core::{AuthError, ResponseCookies};

use super::{continue_after_auth, RedirectQuery, DEFAULT_DESTINATION};
use crate::error::ApiResult;
use crate::extractors::{RequestCookies, WithCookies};
use crate::forms::LoginForm;
use crate::state::AppState;
use crate::views;

const INVALID_LOGIN: &str = "Invalid email or password";

/// GET /sessions/new
///
/// Remembers `redirect_to` for after the credential round trip. Signed-in
/// users go straight to their destination.
pub async fn new_session(
    State(state): State<AppState>,
    Query(query): Query<RedirectQuery>,
    RequestCookies(jar): RequestCookies,
) -> Response {
    if state.auth.gate().is_authenticated(&jar) {
        return continue_after_auth(&state, &query, &jar, ResponseCookies::new());
    }

    let mut cookies = ResponseCookies::new();
    state
        .auth
        .redirects()
        .capture(query.redirect_to.as_deref(), &mut cookies);
    WithCookies(cookies, Html(views::login(None, ""))).into_response()
}

/// POST /sessions
///
/// Unknown email and wrong password get the same 401 page.
pub async fn create_session(
    State(state): State<AppState>,
    Query(query): Query<RedirectQuery>,
    RequestCookies(jar): RequestCookies,
    Form(form): Form<LoginForm>,
) -> ApiResult<Response> {
    if state.auth.gate().is_authenticated(&jar) {
        return Ok(continue_after_auth(&state, &query, &jar, ResponseCookies::new()));
    }

    let email = form.email.trim();
    let mut cookies = ResponseCookies::new();
    match state.auth.login(email, &form.password, &mut cookies).await {
        Ok(_) => Ok(continue_after_auth(&state, &query, &jar, cookies)),
        Err(AuthError::InvalidCredentials) => Ok((
            StatusCode::UNAUTHORIZED,
            Html(views::login(Some(INVALID_LOGIN), email)),
        )
            .into_response()),
        Err(e) => Err(e.into()),
    }
}

/// GET|POST /sessions/destroy
pub async fn destroy_session(
    State(state): State<AppState>,
    RequestCookies(jar): RequestCookies,
) -> Response {
    if !state.auth.gate().is_authenticated(&jar) {
        return Redirect::to(DEFAULT_DESTINATION).into_response();
    }

    let mut cookies = ResponseCookies::new();
    state.auth.logout(&mut cookies);
    WithCookies(cookies, Redirect::to(DEFAULT_DESTINATION)).into_response()
}
