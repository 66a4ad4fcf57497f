//! Axum extractors for the session cookie boundary

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum::http::{header, HeaderValue, Uri};
use axum::response::{IntoResponse, Redirect, Response};
use gatehouse_auth_core::{CookieJar, ResponseCookies, REDIRECT_QUERY_PARAM};
use gatehouse_types::User;
use std::convert::Infallible;

use crate::state::AppState;

/// Cookies sent with the request
#[derive(Debug, Clone, Default)]
pub struct RequestCookies(pub CookieJar);

impl<S> FromRequestParts<S> for RequestCookies
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(cookie_jar(parts)))
    }
}

/// Merge every `Cookie` header on the request into one jar
fn cookie_jar(parts: &Parts) -> CookieJar {
    let mut jar = CookieJar::new();
    for value in parts.headers.get_all(header::COOKIE) {
        match value.to_str() {
            Ok(raw) => jar.extend_from_header(raw),
            Err(_) => tracing::debug!("Ignoring non-ASCII Cookie header"),
        }
    }
    jar
}

/// Signed-in user, re-loaded from the store.
///
/// Anonymous requests are sent to the login page with the current path as
/// the `redirect_to` destination.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let jar = cookie_jar(parts);

        match app_state.auth.gate().current_user(&jar).await {
            Some(user) => Ok(Self(user)),
            None => Err(login_redirect(&parts.uri)),
        }
    }
}

/// Current user when signed in; never rejects
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

impl<S> FromRequestParts<S> for MaybeUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let jar = cookie_jar(parts);
        Ok(Self(app_state.auth.gate().current_user(&jar).await))
    }
}

fn login_redirect(uri: &Uri) -> Redirect {
    let destination = uri.path_and_query().map_or("/", |pq| pq.as_str());
    Redirect::to(&format!(
        "/sessions/new?{REDIRECT_QUERY_PARAM}={}",
        urlencoding::encode(destination)
    ))
}

/// Response wrapper that appends one `Set-Cookie` header per directive
pub struct WithCookies<T>(pub ResponseCookies, pub T);

impl<T: IntoResponse> IntoResponse for WithCookies<T> {
    fn into_response(self) -> Response {
        let WithCookies(cookies, inner) = self;
        let mut response = inner.into_response();
        for value in cookies.header_values() {
            match HeaderValue::from_str(&value) {
                Ok(value) => {
                    response.headers_mut().append(header::SET_COOKIE, value);
                }
                Err(e) => tracing::error!(error = %e, "Dropping unencodable Set-Cookie header"),
            }
        }
        response
    }
}
