//! # Reciclaje API Server Library
//!
//! HTTP layer of the recycling marketplace: session guard, page endpoints,
//! form posts and the `/v1` JSON API.
//!
//! ## Modules
//!
//! - `app`: application state and router builder
//! - `config`: environment configuration
//! - `error`: error type and its JSON / redirect renditions
//! - `middleware`: security headers, session resolution and route guard
//! - `routes`: request handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
