// src/db/quote_repo.rs

use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Executor};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::quotes::{NewQuoteLine, Quote, QuoteHeaderRow, QuoteLineItem, QuoteStatus},
};

const FIND_HEADER_SQL: &str = r#"
    SELECT q.*, c.name AS customer_name, c.customer_type AS customer_type
    FROM quotes q
    LEFT JOIN customers c ON c.id = q.customer_id AND c.organization_id = q.organization_id
    WHERE q.organization_id = $1 AND q.id = $2
"#;

// O lado opcional do LEFT JOIN não pode ser travado; só a linha de `quotes`.
const LOCK_HEADER_SQL: &str = r#"
    SELECT q.*, c.name AS customer_name, c.customer_type AS customer_type
    FROM quotes q
    LEFT JOIN customers c ON c.id = q.customer_id AND c.organization_id = q.organization_id
    WHERE q.organization_id = $1 AND q.id = $2
    FOR UPDATE OF q
"#;

#[derive(Clone)]
pub struct QuoteRepository {
    pool: PgPool,
}

impl QuoteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  CABEÇALHO
    // =========================================================================

    pub async fn list(&self, organization_id: Uuid, status: Option<QuoteStatus>) -> Result<Vec<Quote>, AppError> {
        let quotes = sqlx::query_as::<_, Quote>(
            r#"
            SELECT * FROM quotes
            WHERE organization_id = $1
              AND ($2::quote_status IS NULL OR status = $2)
            ORDER BY created_at DESC
            "#,
        )
            .bind(organization_id)
            .bind(status)
            .fetch_all(&self.pool)
            .await?;

        Ok(quotes)
    }

    /// Cabeçalho + nome/tipo do cliente (se ainda existir).
    pub async fn find_header<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
        quote_id: Uuid,
    ) -> Result<Option<QuoteHeaderRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, QuoteHeaderRow>(FIND_HEADER_SQL)
            .bind(organization_id)
            .bind(quote_id)
            .fetch_optional(executor)
            .await?;

        Ok(row)
    }

    /// Igual a `find_header`, mas trava a linha do orçamento até o fim da
    /// transação. Serializa edições de linhas e trocas de status do mesmo orçamento.
    pub async fn lock_header<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
        quote_id: Uuid,
    ) -> Result<Option<QuoteHeaderRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, QuoteHeaderRow>(LOCK_HEADER_SQL)
            .bind(organization_id)
            .bind(quote_id)
            .fetch_optional(executor)
            .await?;

        Ok(row)
    }

    pub async fn create_quote<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
        customer_id: Option<Uuid>,
        created_by: Uuid,
        distance: Decimal,
        region: Option<&str>,
        notes: Option<&str>,
    ) -> Result<Quote, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let quote = sqlx::query_as::<_, Quote>(
            r#"
            INSERT INTO quotes (organization_id, customer_id, created_by, distance, region, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
            .bind(organization_id)
            .bind(customer_id)
            .bind(created_by)
            .bind(distance)
            .bind(region)
            .bind(notes)
            .fetch_one(executor)
            .await?;

        Ok(quote)
    }

    pub async fn update_header<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
        quote_id: Uuid,
        customer_id: Option<Uuid>,
        distance: Decimal,
        region: Option<&str>,
        notes: Option<&str>,
    ) -> Result<Quote, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let quote = sqlx::query_as::<_, Quote>(
            r#"
            UPDATE quotes SET
                customer_id = $3,
                distance = $4,
                region = $5,
                notes = $6,
                updated_at = NOW()
            WHERE organization_id = $1 AND id = $2
            RETURNING *
            "#,
        )
            .bind(organization_id)
            .bind(quote_id)
            .bind(customer_id)
            .bind(distance)
            .bind(region)
            .bind(notes)
            .fetch_one(executor)
            .await?;

        Ok(quote)
    }

    pub async fn update_status<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
        quote_id: Uuid,
        status: QuoteStatus,
    ) -> Result<Quote, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let quote = sqlx::query_as::<_, Quote>(
            r#"
            UPDATE quotes SET status = $3, updated_at = NOW()
            WHERE organization_id = $1 AND id = $2
            RETURNING *
            "#,
        )
            .bind(organization_id)
            .bind(quote_id)
            .bind(status)
            .fetch_one(executor)
            .await?;

        Ok(quote)
    }

    pub async fn delete(&self, organization_id: Uuid, quote_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM quotes WHERE organization_id = $1 AND id = $2")
            .bind(organization_id)
            .bind(quote_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Soma as linhas e grava o total em cache no cabeçalho.
    pub async fn recalculate_total<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
        quote_id: Uuid,
    ) -> Result<Decimal, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let total: Decimal = sqlx::query_scalar(
            r#"
            UPDATE quotes SET
                total_amount = (
                    SELECT COALESCE(SUM(line_total), 0)
                    FROM quote_line_items
                    WHERE organization_id = $1 AND quote_id = $2
                ),
                updated_at = NOW()
            WHERE organization_id = $1 AND id = $2
            RETURNING total_amount
            "#,
        )
            .bind(organization_id)
            .bind(quote_id)
            .fetch_one(executor)
            .await?;

        Ok(total)
    }

    // =========================================================================
    //  LINHAS
    // =========================================================================

    pub async fn list_items<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
        quote_id: Uuid,
    ) -> Result<Vec<QuoteLineItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, QuoteLineItem>(
            r#"
            SELECT * FROM quote_line_items
            WHERE organization_id = $1 AND quote_id = $2
            ORDER BY position ASC
            "#,
        )
            .bind(organization_id)
            .bind(quote_id)
            .fetch_all(executor)
            .await?;

        Ok(items)
    }

    pub async fn next_position<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
        quote_id: Uuid,
    ) -> Result<i32, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let position: i32 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(MAX(position) + 1, 0)
            FROM quote_line_items
            WHERE organization_id = $1 AND quote_id = $2
            "#,
        )
            .bind(organization_id)
            .bind(quote_id)
            .fetch_one(executor)
            .await?;

        Ok(position)
    }

    pub async fn add_item<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
        quote_id: Uuid,
        position: i32,
        line: &NewQuoteLine,
    ) -> Result<QuoteLineItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, QuoteLineItem>(
            r#"
            INSERT INTO quote_line_items (
                organization_id, quote_id, product_id, product_name, is_bipoc, position,
                cases, margin_percent, unit_cost, unit_price, freight_cost, line_total
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
            .bind(organization_id)
            .bind(quote_id)
            .bind(line.product_id)
            .bind(&line.product_name)
            .bind(line.is_bipoc)
            .bind(position)
            .bind(line.cases)
            .bind(line.margin_percent)
            .bind(line.unit_cost)
            .bind(line.unit_price)
            .bind(line.freight_cost)
            .bind(line.line_total)
            .fetch_one(executor)
            .await?;

        Ok(item)
    }

    /// Regrava a foto de preço de uma linha existente.
    pub async fn update_item_pricing<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
        item_id: Uuid,
        line: &NewQuoteLine,
    ) -> Result<QuoteLineItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, QuoteLineItem>(
            r#"
            UPDATE quote_line_items SET
                product_name = $3,
                is_bipoc = $4,
                cases = $5,
                margin_percent = $6,
                unit_cost = $7,
                unit_price = $8,
                freight_cost = $9,
                line_total = $10
            WHERE organization_id = $1 AND id = $2
            RETURNING *
            "#,
        )
            .bind(organization_id)
            .bind(item_id)
            .bind(&line.product_name)
            .bind(line.is_bipoc)
            .bind(line.cases)
            .bind(line.margin_percent)
            .bind(line.unit_cost)
            .bind(line.unit_price)
            .bind(line.freight_cost)
            .bind(line.line_total)
            .fetch_one(executor)
            .await?;

        Ok(item)
    }

    pub async fn delete_item<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
        quote_id: Uuid,
        item_id: Uuid,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "DELETE FROM quote_line_items WHERE organization_id = $1 AND quote_id = $2 AND id = $3",
        )
            .bind(organization_id)
            .bind(quote_id)
            .bind(item_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
