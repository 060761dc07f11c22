//! Middleware for the API server
//!
//! - `security`: response security headers
//! - `session`: session resolution, the protected-path guard and the
//!   [`session::AuthUser`] extractor

pub mod security;
pub mod session;
