//! Role catalog and role-name dispatch
//!
//! The `roles` table is a plain lookup keyed by name. Rows are matched to a
//! [`RoleKind`] by normalising the stored name, so `persona_natural`,
//! `Persona Natural` and `persona-natural` all resolve to the same kind.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE roles (
//!     id SERIAL PRIMARY KEY,
//!     name VARCHAR(64) NOT NULL UNIQUE,
//!     description VARCHAR(255)
//! );
//! ```

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Actor type a user registers as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleKind {
    /// Ordinary individual
    PersonaNatural,

    /// Individual or informal recycler
    Reciclador,

    /// Company
    Empresa,

    /// Platform administrator
    Admin,
}

impl RoleKind {
    /// Canonical name stored in `roles.name`
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleKind::PersonaNatural => "persona_natural",
            RoleKind::Reciclador => "reciclador",
            RoleKind::Empresa => "empresa",
            RoleKind::Admin => "admin",
        }
    }

    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            RoleKind::PersonaNatural => "Persona natural",
            RoleKind::Reciclador => "Reciclador",
            RoleKind::Empresa => "Empresa",
            RoleKind::Admin => "Administrador",
        }
    }

    /// Roles a visitor may pick when registering
    pub fn is_public(&self) -> bool {
        !matches!(self, RoleKind::Admin)
    }

    /// Resolves a stored role name to a kind
    ///
    /// Matching is case-insensitive and treats `_` and `-` as spaces. Company
    /// and recycler names are matched by substring because the catalog has
    /// carried several spellings ("Empresa recicladora", "company", ...).
    /// Company is checked first so "empresa recicladora" stays a company.
    ///
    /// # Example
    ///
    /// ```
    /// use reciclaje_shared::models::role::RoleKind;
    ///
    /// assert_eq!(RoleKind::from_role_name("Persona_Natural"), Some(RoleKind::PersonaNatural));
    /// assert_eq!(RoleKind::from_role_name("Empresa recicladora"), Some(RoleKind::Empresa));
    /// assert_eq!(RoleKind::from_role_name("visitante"), None);
    /// ```
    pub fn from_role_name(name: &str) -> Option<Self> {
        let normalized: String = name
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == '_' || c == '-' { ' ' } else { c })
            .collect();
        let normalized = normalized.split_whitespace().collect::<Vec<_>>().join(" ");

        if normalized.contains("empresa") || normalized.contains("company") {
            Some(RoleKind::Empresa)
        } else if normalized.contains("reciclador") || normalized.contains("recycler") {
            Some(RoleKind::Reciclador)
        } else if normalized == "persona natural" || normalized == "persona" || normalized == "natural" {
            Some(RoleKind::PersonaNatural)
        } else if normalized.starts_with("admin") {
            Some(RoleKind::Admin)
        } else {
            None
        }
    }
}

/// Row of the `roles` table
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Role {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
}

impl Role {
    /// Kind of this role, if the name is recognised
    pub fn kind(&self) -> Option<RoleKind> {
        RoleKind::from_role_name(&self.name)
    }

    /// Lists every role, ordered by id
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Role>("SELECT id, name, description FROM roles ORDER BY id")
            .fetch_all(pool)
            .await
    }

    /// Finds the row backing a role kind
    pub async fn find_by_kind(pool: &PgPool, kind: RoleKind) -> Result<Option<Self>, sqlx::Error> {
        let roles = Self::list(pool).await?;
        Ok(roles.into_iter().find(|r| r.kind() == Some(kind)))
    }
}
