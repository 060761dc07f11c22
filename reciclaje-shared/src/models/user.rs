//! User accounts (`usuarios`)
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE usuarios (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     email VARCHAR(255) NOT NULL,             -- unique on LOWER(email)
//!     name VARCHAR(255) NOT NULL,
//!     role_id INTEGER NOT NULL REFERENCES roles(id),
//!     password_hash VARCHAR(255) NOT NULL,
//!     phone VARCHAR(32),
//!     avatar_url VARCHAR(512),
//!     bio TEXT,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     last_login_at TIMESTAMPTZ
//! );
//! ```
//!
//! # Example
//!
//! ```no_run
//! use reciclaje_shared::models::user::{CreateUser, User};
//! use sqlx::PgPool;
//!
//! # async fn example(pool: PgPool, role_id: i32) -> Result<(), sqlx::Error> {
//! let user = User::create(&pool, CreateUser {
//!     email: "ana@example.com".to_string(),
//!     name: "Ana".to_string(),
//!     role_id,
//!     password_hash: "$argon2id$...".to_string(),
//! })
//! .await?;
//!
//! let found = User::find_with_role(&pool, user.id).await?;
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::role::RoleKind;

const USER_COLUMNS: &str = "id, email, name, role_id, password_hash, phone, avatar_url, bio, \
                            created_at, updated_at, last_login_at";

/// Row of `usuarios`
///
/// Not serialisable on purpose: it carries the password hash. Use
/// [`PublicUser`] in responses.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,

    /// Stored lower-case
    pub email: String,

    pub name: String,
    pub role_id: i32,

    /// Argon2id PHC string
    pub password_hash: String,

    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

/// User joined with its role name
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PublicUser {
    pub id: Uuid,

    /// Blanked on public profiles
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub email: String,

    pub name: String,
    pub role_name: String,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl PublicUser {
    /// Role kind, when the joined role name is recognised
    pub fn role_kind(&self) -> Option<RoleKind> {
        RoleKind::from_role_name(&self.role_name)
    }
}

/// Input for creating a user
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: String,
    pub name: String,
    pub role_id: i32,

    /// Argon2id hash, never the plaintext
    pub password_hash: String,
}

/// Editable profile fields; `None` leaves a field untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProfile {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
}

impl UpdateProfile {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.phone.is_none() && self.avatar_url.is_none() && self.bio.is_none()
    }
}

impl User {
    /// Inserts a user; the email is lower-cased
    ///
    /// A duplicate email fails with the `usuarios_email_key` unique violation.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO usuarios (email, name, role_id, password_hash)
             VALUES (LOWER($1), $2, $3, $4)
             RETURNING {}",
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&query)
            .bind(data.email.trim())
            .bind(data.name.trim())
            .bind(data.role_id)
            .bind(data.password_hash)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM usuarios WHERE id = $1", USER_COLUMNS);

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Case-insensitive lookup
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM usuarios WHERE LOWER(email) = LOWER($1)", USER_COLUMNS);

        sqlx::query_as::<_, User>(&query)
            .bind(email.trim())
            .fetch_optional(pool)
            .await
    }

    /// Whether a user row exists
    pub async fn exists(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM usuarios WHERE id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await
    }

    /// Loads the public view of a user with the joined role name
    pub async fn find_with_role(pool: &PgPool, id: Uuid) -> Result<Option<PublicUser>, sqlx::Error> {
        sqlx::query_as::<_, PublicUser>(
            r#"
            SELECT u.id, u.email, u.name, r.name AS role_name, u.phone, u.avatar_url, u.bio, u.created_at
            FROM usuarios u
            JOIN roles r ON r.id = u.role_id
            WHERE u.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Applies profile edits and returns the refreshed public view
    pub async fn update_profile(
        pool: &PgPool,
        id: Uuid,
        data: UpdateProfile,
    ) -> Result<Option<PublicUser>, sqlx::Error> {
        let updated = sqlx::query(
            r#"
            UPDATE usuarios
            SET name = COALESCE($2, name),
                phone = COALESCE($3, phone),
                avatar_url = COALESCE($4, avatar_url),
                bio = COALESCE($5, bio),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(data.name)
        .bind(data.phone)
        .bind(data.avatar_url)
        .bind(data.bio)
        .execute(pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Ok(None);
        }

        Self::find_with_role(pool, id).await
    }

    /// Replaces the password hash; false when the user does not exist
    pub async fn update_password(pool: &PgPool, id: Uuid, password_hash: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE usuarios SET password_hash = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn update_last_login(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE usuarios SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Removes a user and, through cascades, everything they own
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM usuarios WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
