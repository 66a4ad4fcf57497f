//! Database errors

use thiserror::Error;

/// Database errors
#[derive(Error, Debug)]
pub enum DbError {
    /// SQLx error
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Unique or other integrity constraint rejected the write
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// Store could not be reached or did not answer in time
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl DbError {
    /// Map a SQLx error, turning unique violations into [`DbError::Conflict`]
    pub fn from_sqlx(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                let constraint = db_err.constraint().unwrap_or("unique").to_string();
                return Self::Conflict(constraint);
            }
        }
        Self::Sqlx(err)
    }
}

/// Result alias for store operations
pub type DbResult<T> = Result<T, DbError>;
