//! Common test utilities for gatehouse-auth-core integration tests

use argon2::Params;
use async_trait::async_trait;
use gatehouse_auth_core::{AuthConfig, AuthService, CredentialVerifier, ManualClock};
use gatehouse_db::{DbError, DbResult, InMemoryUserStore, NewUser, UserRow, UserStore};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

#[allow(dead_code)]
pub const TEST_SECRET: &str = "integration-test-secret-0123456789abcdef";

/// Argon2id with minimal cost so debug-mode tests stay fast
#[allow(dead_code)]
pub fn cheap_verifier() -> CredentialVerifier {
    CredentialVerifier::with_params(Params::new(1024, 1, 1, None).unwrap())
}

/// Build a service over `users` driven by `clock`
#[allow(dead_code)]
pub fn service_with<U: UserStore + ?Sized>(
    users: Arc<U>,
    clock: &ManualClock,
    config: AuthConfig,
) -> AuthService<U> {
    AuthService::from_parts(config, users, Arc::new(clock.clone()), cheap_verifier()).unwrap()
}

/// Service over a fresh in-memory store
#[allow(dead_code)]
pub fn memory_service(clock: &ManualClock) -> (AuthService<InMemoryUserStore>, Arc<InMemoryUserStore>) {
    let store = Arc::new(InMemoryUserStore::new());
    let service = service_with(Arc::clone(&store), clock, AuthConfig::new(TEST_SECRET));
    (service, store)
}

/// User store whose every call fails
#[derive(Default, Clone)]
pub struct FailingUserStore;

#[async_trait]
impl UserStore for FailingUserStore {
    async fn find_by_id(&self, _: Uuid) -> DbResult<Option<UserRow>> {
        Err(DbError::Unavailable("connection refused".into()))
    }

    async fn find_by_email(&self, _: &str) -> DbResult<Option<UserRow>> {
        Err(DbError::Unavailable("connection refused".into()))
    }

    async fn insert(&self, _: NewUser) -> DbResult<UserRow> {
        Err(DbError::Unavailable("connection refused".into()))
    }

    async fn exists_by_email(&self, _: &str) -> DbResult<bool> {
        Err(DbError::Unavailable("connection refused".into()))
    }

    async fn ping(&self) -> DbResult<()> {
        Err(DbError::Unavailable("connection refused".into()))
    }
}

/// In-memory store that stalls every lookup by `delay`
#[derive(Clone)]
pub struct SlowUserStore {
    pub inner: Arc<InMemoryUserStore>,
    pub delay: Duration,
}

#[allow(dead_code)]
impl SlowUserStore {
    pub fn new(inner: Arc<InMemoryUserStore>, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

#[async_trait]
impl UserStore for SlowUserStore {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<UserRow>> {
        tokio::time::sleep(self.delay).await;
        self.inner.find_by_id(id).await
    }

    async fn find_by_email(&self, email: &str) -> DbResult<Option<UserRow>> {
        tokio::time::sleep(self.delay).await;
        self.inner.find_by_email(email).await
    }

    async fn insert(&self, user: NewUser) -> DbResult<UserRow> {
        self.inner.insert(user).await
    }

    async fn exists_by_email(&self, email: &str) -> DbResult<bool> {
        self.inner.exists_by_email(email).await
    }
}
