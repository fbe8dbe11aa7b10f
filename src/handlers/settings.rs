// src/handlers/settings.rs

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{PermSettingsWrite, RequirePermission},
        tenancy::TenantContext,
    },
    models::settings::{PricingSettings, PricingSettingsResponse},
};

// GET /api/settings/pricing
#[utoipa::path(
    get,
    path = "/api/settings/pricing",
    tag = "Settings",
    responses(
        (status = 200, description = "Configuração de preços (ou o padrão)", body = PricingSettingsResponse)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_pricing_settings(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
) -> Result<impl IntoResponse, ApiError> {
    let settings = app_state.settings_service
        .pricing_settings(tenant.0)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(settings)))
}

// PUT /api/settings/pricing
#[utoipa::path(
    put,
    path = "/api/settings/pricing",
    tag = "Settings",
    request_body = PricingSettings,
    responses(
        (status = 200, description = "Configuração substituída", body = PricingSettingsResponse),
        (status = 400, description = "Faixas ou taxas inválidas"),
        (status = 403, description = "Apenas administradores")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_pricing_settings(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermSettingsWrite>,
    Json(payload): Json<PricingSettings>,
) -> Result<impl IntoResponse, ApiError> {
    let updated = app_state.settings_service
        .replace_pricing_settings(tenant.0, payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(updated)))
}
