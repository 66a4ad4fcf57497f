//! Gatehouse DB - User store abstractions
//!
//! The session layer never owns user persistence; it talks to a [`UserStore`]
//! through four narrow operations. Two implementations live here:
//! - [`pg::PgUserStore`] backed by PostgreSQL through SQLx
//! - [`memory::InMemoryUserStore`] for local development and tests
//!
//! # Example
//!
//! ```rust,ignore
//! use gatehouse_db::{create_pool, pg::PgUserStore, UserStore};
//!
//! let pool = create_pool("postgres://localhost/gatehouse").await?;
//! gatehouse_db::pg::ensure_schema(&pool).await?;
//! let users = PgUserStore::new(pool);
//!
//! let user = users.find_by_email("user@example.com").await?;
//! ```

pub mod error;
pub mod memory;
pub mod models;
pub mod pg;
pub mod pool;
pub mod repo;

pub use error::{DbError, DbResult};
pub use memory::InMemoryUserStore;
pub use models::*;
pub use pool::{create_pool, DbPool};
pub use repo::*;
