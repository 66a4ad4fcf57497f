//! Gatehouse Types - Shared domain types
//!
//! This crate contains domain types used across gatehouse crates:
//! - User identity (`UserId`)
//! - The authoritative user record handed to request handlers (`User`)

pub mod user;

pub use user::*;
