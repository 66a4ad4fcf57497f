//! Signing secret source
//!
//! The secret is read once when the token codec is constructed and is
//! immutable for the life of the process. Rotation is not supported.

use std::sync::Arc;

/// Provides the shared signing secret
pub trait SecretProvider: Send + Sync {
    fn current_secret(&self) -> &[u8];
}

/// A secret fixed at startup, typically loaded from configuration
#[derive(Clone)]
pub struct StaticSecret(Arc<[u8]>);

impl StaticSecret {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self(Arc::from(secret.as_ref()))
    }
}

impl SecretProvider for StaticSecret {
    fn current_secret(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for StaticSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticSecret")
            .field("length", &self.0.len())
            .finish_non_exhaustive()
    }
}
