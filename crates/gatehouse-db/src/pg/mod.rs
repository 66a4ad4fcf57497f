//! PostgreSQL user store implementation

mod user;

pub use user::PgUserStore;

use crate::error::{DbError, DbResult};
use crate::DbPool;

/// Create the `users` table if it does not exist yet
pub async fn ensure_schema(pool: &DbPool) -> DbResult<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id            UUID PRIMARY KEY,
            name          VARCHAR(100) NOT NULL,
            email         TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            created_at    TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at    TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(DbError::from_sqlx)?;

    tracing::debug!("users schema ensured");
    Ok(())
}
