//! # Taskdesk Shared Library
//!
//! Shared types and business logic for the Taskdesk project/task tracker:
//! database models, the connection pool and migrations, and the
//! authentication/authorization core consumed by the API server.
//!
//! ## Module Organization
//!
//! - `models`: database models and their CRUD operations
//! - `auth`: password hashing, tokens, the lockout policy, and the
//!   authorization policy
//! - `db`: connection pool and migration runner

pub mod auth;
pub mod db;
pub mod models;

/// Current version of the Taskdesk shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
