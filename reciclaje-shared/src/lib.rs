//! # Reciclaje Shared Library
//!
//! Types, queries and domain logic of the recycling marketplace, used by the
//! API server.
//!
//! ## Module Organization
//!
//! - `models`: tables and their queries
//! - `auth`: passwords, tokens, sessions and the protected-path guard
//! - `db`: connection pool and embedded migrations
//! - `messaging`: contact flow and message exchange
//! - `profile`: role-specific dashboard and profile view models
//! - `mail`: transactional e-mail delivery

pub mod auth;
pub mod db;
pub mod mail;
pub mod messaging;
pub mod models;
pub mod profile;

/// Current version of the shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
