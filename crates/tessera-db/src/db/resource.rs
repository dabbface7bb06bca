use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use tessera_core::models::Resource;
use tessera_core::AppError;
use uuid::Uuid;

use super::store::ResourceStore;

/// PostgreSQL document store. Each resource is one JSONB document.
#[derive(Clone)]
pub struct ResourceRepository {
    pool: PgPool,
}

impl ResourceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResourceStore for ResourceRepository {
    #[tracing::instrument(skip(self))]
    async fn load(&self, id: Uuid) -> Result<Option<Resource>, AppError> {
        let row = sqlx::query("SELECT document FROM resources WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let Json(resource): Json<Resource> = row.try_get("document")?;
                Ok(Some(resource))
            }
            None => Ok(None),
        }
    }

    #[tracing::instrument(skip(self, resource), fields(resource_id = %resource.id))]
    async fn persist(&self, resource: &Resource) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE resources
            SET document = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(resource.id)
        .bind(Json(resource))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Resource {} not found",
                resource.id
            )));
        }

        Ok(())
    }

    async fn insert(&self, resource: &Resource) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO resources (id, document, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (id) DO UPDATE SET document = EXCLUDED.document, updated_at = NOW()
            "#,
        )
        .bind(resource.id)
        .bind(Json(resource))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
