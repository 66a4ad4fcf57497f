//! Registration handlers

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Form;
use gatehouse_auth_core::{AuthError, ResponseCookies};

use super::{continue_after_auth, RedirectQuery};
use crate::error::ApiResult;
use crate::extractors::{RequestCookies, WithCookies};
use crate::forms::{FormErrors, RegistrationForm, ALREADY_TAKEN};
use crate::state::AppState;
use crate::views;

/// GET /users/new
pub async fn new_user(
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
    WithCookies(cookies, Html(views::register("", "", &FormErrors::default()))).into_response()
}

/// POST /users
///
/// Validates, creates the account and signs it in. Validation failures
/// re-render the form with per-field messages.
pub async fn create_user(
    State(state): State<AppState>,
    Query(query): Query<RedirectQuery>,
    RequestCookies(jar): RequestCookies,
    Form(form): Form<RegistrationForm>,
) -> ApiResult<Response> {
    if state.auth.gate().is_authenticated(&jar) {
        return Ok(continue_after_auth(&state, &query, &jar, ResponseCookies::new()));
    }

    let form = form.normalized();
    let mut errors = form.validate();
    if !errors.contains("email") && state.auth.email_taken(&form.email).await? {
        errors.insert("email", ALREADY_TAKEN);
    }
    if !errors.is_empty() {
        tracing::info!(fields = ?errors.fields().collect::<Vec<_>>(), "Registration rejected");
        return Ok(invalid(&form, &errors));
    }

    let mut cookies = ResponseCookies::new();
    match state.auth.register(form.clone().into_account(), &mut cookies).await {
        Ok(_) => Ok(continue_after_auth(&state, &query, &jar, cookies)),
        // Lost a race with a concurrent registration of the same email
        Err(AuthError::EmailTaken) => {
            errors.insert("email", ALREADY_TAKEN);
            Ok(invalid(&form, &errors))
        }
        Err(e) => Err(e.into()),
    }
}

fn invalid(form: &RegistrationForm, errors: &FormErrors) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Html(views::register(&form.name, &form.email, errors)),
    )
        .into_response()
}
