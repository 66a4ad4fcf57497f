//! Error types for the auth web service.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use gatehouse_auth_core::AuthError;

use crate::views;

/// API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            // A store outage on a form submission is the server's problem, not the user's
            Self::Auth(AuthError::StoreUnavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Auth(e) => StatusCode::from_u16(e.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Auth(e) => e.error_code(),
        }
    }

    /// Message safe to show the client
    fn public_message(&self) -> &'static str {
        match self.status_code() {
            StatusCode::UNAUTHORIZED => "You need to sign in to continue.",
            StatusCode::CONFLICT => "That email is already registered.",
            StatusCode::SERVICE_UNAVAILABLE => "The service is temporarily unavailable.",
            _ => "Something went wrong.",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        // Log server-side failures; client errors stay at debug
        if status.is_server_error() {
            tracing::error!(error = %self, code, "Request failed");
        } else {
            tracing::debug!(error = %self, code, "Request rejected");
        }

        (status, Html(views::error_page(status, self.public_message()))).into_response()
    }
}

/// Result type for handlers
pub type ApiResult<T> = Result<T, ApiError>;
