//! Database models and their queries
//!
//! One module per table. Functions take a `&PgPool` (or any `PgExecutor`
//! when they run inside a caller's transaction) and return `sqlx::Error`.
//!
//! - `role`: account roles and the role-name dispatch table
//! - `user`: accounts (`usuarios`)
//! - `location`: saved addresses (`ubicaciones`)
//! - `material`: material catalog (`materiales`)
//! - `listing`: material listings (`publicaciones`)
//! - `rating`: listing ratings (`valoraciones`)
//! - `conversation`: two-party conversations (`conversaciones`)
//! - `message`: conversation messages (`mensajes`)
//! - `notification`: in-app notifications (`notificaciones`)
//! - `history`: activity log (`historial`)

pub mod conversation;
pub mod history;
pub mod listing;
pub mod location;
pub mod material;
pub mod message;
pub mod notification;
pub mod rating;
pub mod role;
pub mod user;
