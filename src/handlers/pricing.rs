// src/handlers/pricing.rs

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{i18n::Locale, tenancy::TenantContext},
    models::quotes::PricingPreviewPayload,
    pricing::LinePrice,
};

// POST /api/pricing/preview
#[utoipa::path(
    post,
    path = "/api/pricing/preview",
    tag = "Pricing",
    request_body = PricingPreviewPayload,
    responses(
        (status = 200, description = "Linha calculada (nada é gravado)", body = LinePrice),
        (status = 400, description = "Entrada inválida para o cálculo"),
        (status = 404, description = "Produto ou cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn preview_line(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Json(payload): Json<PricingPreviewPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let price = app_state.quote_service
        .preview(tenant.0, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(price)))
}
