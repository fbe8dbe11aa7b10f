// src/db/organization_repo.rs

use sqlx::{PgPool, Postgres, Executor};
use uuid::Uuid;

use crate::{common::error::AppError, models::auth::Organization};

#[derive(Clone)]
pub struct OrganizationRepository {
    pool: PgPool,
}

impl OrganizationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Cria uma nova organização (tenant).
    pub async fn create_organization<'e, E>(
        &self,
        executor: E, // Aceita um executor (pool ou transação)
        name: &str,
    ) -> Result<Organization, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let organization = sqlx::query_as::<_, Organization>(
            "INSERT INTO organizations (name) VALUES ($1) RETURNING *",
        )
            .bind(name)
            .fetch_one(executor)
            .await?;

        Ok(organization)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Organization>, AppError> {
        let organization = sqlx::query_as::<_, Organization>("SELECT * FROM organizations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(organization)
    }
}
