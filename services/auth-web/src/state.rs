//! Application state

use std::sync::Arc;

use gatehouse_auth_core::AuthService;
use gatehouse_db::UserStore;

use crate::config::Config;

/// Auth service over whichever user store the process was started with
pub type AuthServiceImpl = AuthService<dyn UserStore>;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Login, registration, logout and current-user resolution
    pub auth: Arc<AuthServiceImpl>,
    /// User store (shared with `auth`, used directly by readiness checks)
    pub users: Arc<dyn UserStore>,
    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Create new application state
    pub fn new(auth: AuthServiceImpl, users: Arc<dyn UserStore>, config: Config) -> Self {
        Self {
            auth: Arc::new(auth),
            users,
            config: Arc::new(config),
        }
    }

    /// Get request timeout from config
    pub fn request_timeout(&self) -> std::time::Duration {
        self.config.request_timeout
    }
}
