//! Database row models
//!
//! These types map directly to database rows using SQLx's FromRow derive.

use chrono::{DateTime, Utc};
use gatehouse_types::{User, UserId};
use sqlx::FromRow;
use uuid::Uuid;

/// User row from the database (the credential record)
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRow {
    /// Get the typed user ID
    pub fn user_id(&self) -> UserId {
        UserId(self.id)
    }
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: UserId(row.id),
            name: row.name,
            email: row.email,
            created_at: row.created_at,
        }
    }
}
