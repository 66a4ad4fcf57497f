//! Auth errors
//!
//! Failure kinds stay distinguishable here so they can be logged and counted.
//! [`AuthGate`](crate::AuthGate)'s public answers collapse all of them to
//! "not authenticated".

use thiserror::Error;

/// Why a session token was rejected
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    /// Not three dot-separated parts, or a part failed to decode
    #[error("malformed token")]
    Malformed,

    /// Recomputed signature does not match the transmitted one
    #[error("invalid token signature")]
    InvalidSignature,

    /// Current time is at or past the embedded expiry
    #[error("token expired")]
    Expired,
}

impl TokenError {
    /// Stable label for logs and metrics
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Malformed => "malformed",
            Self::InvalidSignature => "invalid_signature",
            Self::Expired => "expired",
        }
    }
}

/// Password hashing failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HashingError {
    /// Input exceeds the accepted password length
    #[error("password too long: {actual} bytes, maximum is {maximum}")]
    InputTooLong { actual: usize, maximum: usize },

    /// Could not gather randomness for the salt
    #[error("salt generation failed: {0}")]
    Entropy(String),

    /// The hashing primitive rejected its input or parameters
    #[error("hashing primitive failed: {0}")]
    Primitive(String),
}

/// Authentication errors
#[derive(Error, Debug)]
pub enum AuthError {
    /// Wrong password, unknown account or corrupt stored hash
    #[error("invalid credentials")]
    InvalidCredentials,

    /// No session cookie on the request
    #[error("no session")]
    MissingSession,

    /// Session token rejected
    #[error(transparent)]
    Token(#[from] TokenError),

    /// Password hashing failed
    #[error(transparent)]
    Hashing(#[from] HashingError),

    /// User store failed or timed out
    #[error("user store unavailable: {0}")]
    StoreUnavailable(String),

    /// Email already registered
    #[error("email already taken")]
    EmailTaken,

    /// User referenced by a valid token no longer exists
    #[error("user not found")]
    UserNotFound,

    /// Configuration error
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidCredentials
            | Self::MissingSession
            | Self::Token(_)
            | Self::UserNotFound
            | Self::StoreUnavailable(_) => 401,
            Self::EmailTaken => 409,
            Self::Hashing(_) | Self::Configuration(_) | Self::Internal(_) => 500,
        }
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::MissingSession | Self::Token(_) | Self::UserNotFound => "UNAUTHENTICATED",
            Self::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            Self::EmailTaken => "EMAIL_TAKEN",
            Self::Hashing(_) => "HASHING_ERROR",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether this error means "treat the request as anonymous"
    pub fn is_unauthenticated(&self) -> bool {
        matches!(
            self,
            Self::MissingSession | Self::Token(_) | Self::UserNotFound | Self::StoreUnavailable(_)
        )
    }
}

impl From<gatehouse_db::DbError> for AuthError {
    fn from(err: gatehouse_db::DbError) -> Self {
        match err {
            gatehouse_db::DbError::Conflict(_) => Self::EmailTaken,
            other => {
                tracing::error!("User store error: {}", other);
                Self::StoreUnavailable(other.to_string())
            }
        }
    }
}
