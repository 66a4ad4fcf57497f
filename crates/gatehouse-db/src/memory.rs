//! In-memory user store
//!
//! Used by the web service when no database is configured, and by tests
//! across the workspace.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::models::UserRow;
use crate::repo::{NewUser, UserStore};

/// In-memory user store keyed by ID with a unique email index
#[derive(Default, Clone)]
pub struct InMemoryUserStore {
    users: Arc<DashMap<Uuid, UserRow>>,
    by_email: Arc<DashMap<String, Uuid>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove a user and its email index entry
    pub fn delete(&self, id: Uuid) -> Option<UserRow> {
        let (_, user) = self.users.remove(&id)?;
        self.by_email.remove(&user.email);
        Some(user)
    }

    /// Number of stored users
    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<UserRow>> {
        Ok(self.users.get(&id).map(|r| r.value().clone()))
    }

    async fn find_by_email(&self, email: &str) -> DbResult<Option<UserRow>> {
        Ok(self
            .by_email
            .get(email)
            .and_then(|id| self.users.get(id.value()).map(|r| r.value().clone())))
    }

    async fn insert(&self, user: NewUser) -> DbResult<UserRow> {
        // Reserve the email first so two concurrent inserts cannot both win
        match self.by_email.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(DbError::Conflict("users_email_key".to_string())),
            Entry::Vacant(slot) => {
                let now = Utc::now();
                let row = UserRow {
                    id: user.id,
                    name: user.name,
                    email: user.email,
                    password_hash: user.password_hash,
                    created_at: now,
                    updated_at: now,
                };
                slot.insert(row.id);
                self.users.insert(row.id, row.clone());
                Ok(row)
            }
        }
    }

    async fn exists_by_email(&self, email: &str) -> DbResult<bool> {
        Ok(self.by_email.contains_key(email))
    }
}
