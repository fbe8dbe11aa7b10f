// src/db/product_repo.rs

use sqlx::{PgPool, Postgres, Executor};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::products::{Product, ProductPayload},
};

#[derive(Clone)]
pub struct ProductRepository {
    pool: PgPool,
}

impl ProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lista o catálogo; `available` filtra pela disponibilidade quando informado.
    pub async fn list(&self, organization_id: Uuid, available: Option<bool>) -> Result<Vec<Product>, AppError> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT * FROM products
            WHERE organization_id = $1
              AND ($2::BOOLEAN IS NULL OR is_available = $2)
            ORDER BY name ASC
            "#,
        )
            .bind(organization_id)
            .bind(available)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    pub async fn find_by_id<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE organization_id = $1 AND id = $2",
        )
            .bind(organization_id)
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(product)
    }

    pub async fn create(&self, organization_id: Uuid, input: &ProductPayload) -> Result<Product, AppError> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (
                organization_id, name, unit, cases_per_pallet, cost_per_case,
                weight_per_case, farm, location, is_bipoc, is_gap_certified, is_available
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
            .bind(organization_id)
            .bind(&input.name)
            .bind(&input.unit)
            .bind(input.cases_per_pallet)
            .bind(input.cost_per_case)
            .bind(input.weight_per_case)
            .bind(&input.farm)
            .bind(&input.location)
            .bind(input.is_bipoc)
            .bind(input.is_gap_certified)
            .bind(input.is_available)
            .fetch_one(&self.pool)
            .await?;

        Ok(product)
    }

    pub async fn update(
        &self,
        organization_id: Uuid,
        id: Uuid,
        input: &ProductPayload,
    ) -> Result<Option<Product>, AppError> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products SET
                name = $3,
                unit = $4,
                cases_per_pallet = $5,
                cost_per_case = $6,
                weight_per_case = $7,
                farm = $8,
                location = $9,
                is_bipoc = $10,
                is_gap_certified = $11,
                is_available = $12,
                updated_at = NOW()
            WHERE organization_id = $1 AND id = $2
            RETURNING *
            "#,
        )
            .bind(organization_id)
            .bind(id)
            .bind(&input.name)
            .bind(&input.unit)
            .bind(input.cases_per_pallet)
            .bind(input.cost_per_case)
            .bind(input.weight_per_case)
            .bind(&input.farm)
            .bind(&input.location)
            .bind(input.is_bipoc)
            .bind(input.is_gap_certified)
            .bind(input.is_available)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    // Linhas de orçamento já gravadas guardam cópia dos valores; o vínculo vira NULL.
    pub async fn delete(&self, organization_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM products WHERE organization_id = $1 AND id = $2")
            .bind(organization_id)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
