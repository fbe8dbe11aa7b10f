// src/services/settings_service.rs

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::SettingsRepository,
    models::settings::{PricingSettings, PricingSettingsResponse},
    pricing::PricingError,
};

#[derive(Clone)]
pub struct SettingsService {
    repo: SettingsRepository,
    fallback: PricingSettings,
}

impl SettingsService {
    pub fn new(repo: SettingsRepository, fallback: PricingSettings) -> Self {
        Self { repo, fallback }
    }

    /// Configuração da organização. Sem documento salvo, usa o padrão embutido.
    pub async fn pricing_settings(&self, organization_id: Uuid) -> Result<PricingSettingsResponse, AppError> {
        match self.stored_pricing_settings(organization_id).await {
            Err(AppError::Pricing(PricingError::ConfigurationMissing)) => {
                tracing::debug!("Organização {} sem configuração de preços; usando o padrão", organization_id);
                Ok(PricingSettingsResponse {
                    settings: self.fallback.clone(),
                    is_default: true,
                    updated_at: None,
                })
            }
            other => other,
        }
    }

    async fn stored_pricing_settings(&self, organization_id: Uuid) -> Result<PricingSettingsResponse, AppError> {
        let stored = self.repo
            .get_pricing_settings(organization_id)
            .await?
            .ok_or(PricingError::ConfigurationMissing)?;

        let settings: PricingSettings = serde_json::from_value(stored.settings.0)
            .map_err(|e| PricingError::InvalidInput(format!("stored settings document is malformed: {}", e)))?;
        settings.ensure_valid()?;

        Ok(PricingSettingsResponse {
            settings,
            is_default: false,
            updated_at: Some(stored.updated_at),
        })
    }

    pub async fn replace_pricing_settings(
        &self,
        organization_id: Uuid,
        settings: PricingSettings,
    ) -> Result<PricingSettingsResponse, AppError> {
        settings.ensure_valid()?;

        let updated_at = self.repo.upsert_pricing_settings(organization_id, &settings).await?;
        tracing::info!("💲 Configuração de preços atualizada para a organização {}", organization_id);

        Ok(PricingSettingsResponse {
            settings,
            is_default: false,
            updated_at: Some(updated_at),
        })
    }
}
