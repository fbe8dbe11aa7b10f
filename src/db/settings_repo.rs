// src/db/settings_repo.rs

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{types::Json, FromRow, PgPool};
use uuid::Uuid;

use crate::{common::error::AppError, models::settings::PricingSettings};

// Documento cru, como está no JSONB; a validação fica no serviço.
#[derive(Debug, FromRow)]
pub struct StoredPricingSettings {
    pub settings: Json<Value>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct SettingsRepository {
    pool: PgPool,
}

impl SettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_pricing_settings(
        &self,
        organization_id: Uuid,
    ) -> Result<Option<StoredPricingSettings>, AppError> {
        let stored = sqlx::query_as::<_, StoredPricingSettings>(
            "SELECT settings, updated_at FROM pricing_settings WHERE organization_id = $1",
        )
            .bind(organization_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(stored)
    }

    pub async fn upsert_pricing_settings(
        &self,
        organization_id: Uuid,
        settings: &PricingSettings,
    ) -> Result<DateTime<Utc>, AppError> {
        // UPSERT (Insert or Update)
        let updated_at: DateTime<Utc> = sqlx::query_scalar(
            r#"
            INSERT INTO pricing_settings (organization_id, settings)
            VALUES ($1, $2)
            ON CONFLICT (organization_id)
            DO UPDATE SET
                settings = EXCLUDED.settings,
                updated_at = NOW()
            RETURNING updated_at
            "#,
        )
            .bind(organization_id)
            .bind(Json(settings))
            .fetch_one(&self.pool)
            .await?;

        Ok(updated_at)
    }
}
