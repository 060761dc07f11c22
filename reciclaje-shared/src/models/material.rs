//! Material type catalog (`materiales`)

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Material {
    pub id: i32,
    pub name: String,

    /// Broad family: papel, plastico, vidrio, metal, ...
    pub category: String,

    /// Unit suggested on the listing form
    pub default_unit: String,

    pub description: Option<String>,
}

impl Material {
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Material>(
            "SELECT id, name, category, default_unit, description FROM materiales ORDER BY category, name",
        )
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Material>(
            "SELECT id, name, category, default_unit, description FROM materiales WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }
}
