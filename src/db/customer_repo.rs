// src/db/customer_repo.rs

use sqlx::{PgPool, Postgres, Executor};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::customers::{Customer, CustomerPayload},
};

#[derive(Clone)]
pub struct CustomerRepository {
    pool: PgPool,
}

impl CustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, organization_id: Uuid) -> Result<Vec<Customer>, AppError> {
        let customers = sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers WHERE organization_id = $1 ORDER BY name ASC",
        )
            .bind(organization_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(customers)
    }

    pub async fn find_by_id<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers WHERE organization_id = $1 AND id = $2",
        )
            .bind(organization_id)
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(customer)
    }

    pub async fn create(&self, organization_id: Uuid, input: &CustomerPayload) -> Result<Customer, AppError> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (
                organization_id, name, customer_type, contact_name,
                email, phone, address, region, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
            .bind(organization_id)
            .bind(&input.name)
            .bind(&input.customer_type)
            .bind(&input.contact_name)
            .bind(&input.email)
            .bind(&input.phone)
            .bind(&input.address)
            .bind(&input.region)
            .bind(&input.notes)
            .fetch_one(&self.pool)
            .await?;

        Ok(customer)
    }

    pub async fn update(
        &self,
        organization_id: Uuid,
        id: Uuid,
        input: &CustomerPayload,
    ) -> Result<Option<Customer>, AppError> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers SET
                name = $3,
                customer_type = $4,
                contact_name = $5,
                email = $6,
                phone = $7,
                address = $8,
                region = $9,
                notes = $10,
                updated_at = NOW()
            WHERE organization_id = $1 AND id = $2
            RETURNING *
            "#,
        )
            .bind(organization_id)
            .bind(id)
            .bind(&input.name)
            .bind(&input.customer_type)
            .bind(&input.contact_name)
            .bind(&input.email)
            .bind(&input.phone)
            .bind(&input.address)
            .bind(&input.region)
            .bind(&input.notes)
            .fetch_optional(&self.pool)
            .await?;

        Ok(customer)
    }

    /// Retorna `false` se nada foi apagado. Orçamentos do cliente ficam com `customer_id` nulo.
    pub async fn delete(&self, organization_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM customers WHERE organization_id = $1 AND id = $2")
            .bind(organization_id)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
