//! Repository traits
//!
//! The user store is the only collaborator the session layer performs I/O
//! against. Everything else about persistence stays behind this trait.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::UserRow;

/// User store trait
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Find a user by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<UserRow>>;

    /// Find a user by email (the unique handle)
    async fn find_by_email(&self, email: &str) -> DbResult<Option<UserRow>>;

    /// Insert a new user.
    ///
    /// Fails with [`DbError::Conflict`](crate::DbError::Conflict) when the
    /// email is already registered.
    async fn insert(&self, user: NewUser) -> DbResult<UserRow>;

    /// Check whether an email is already registered
    async fn exists_by_email(&self, email: &str) -> DbResult<bool>;

    /// Cheap connectivity probe for readiness checks
    async fn ping(&self) -> DbResult<()> {
        Ok(())
    }
}

/// Insert user input
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

impl NewUser {
    /// Build an insert with a fresh random ID
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            password_hash: password_hash.into(),
        }
    }
}

#[async_trait]
impl<T: UserStore + ?Sized> UserStore for Arc<T> {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<UserRow>> {
        (**self).find_by_id(id).await
    }

    async fn find_by_email(&self, email: &str) -> DbResult<Option<UserRow>> {
        (**self).find_by_email(email).await
    }

    async fn insert(&self, user: NewUser) -> DbResult<UserRow> {
        (**self).insert(user).await
    }

    async fn exists_by_email(&self, email: &str) -> DbResult<bool> {
        (**self).exists_by_email(email).await
    }

    async fn ping(&self) -> DbResult<()> {
        (**self).ping().await
    }
}
