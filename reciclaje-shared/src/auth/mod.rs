//! Authentication primitives
//!
//! - [`password`]: Argon2id hashing and the password rules shown on forms
//! - [`jwt`]: session and refresh tokens
//! - [`session`]: resolving the caller from the session cookie or bearer header
//! - [`guard`]: which paths need a session and where visitors without one go

pub mod guard;
pub mod jwt;
pub mod password;
pub mod session;
