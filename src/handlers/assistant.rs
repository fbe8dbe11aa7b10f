// src/handlers/assistant.rs

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{i18n::Locale, tenancy::TenantContext},
    models::assistant::{ChatPayload, ChatResponse},
};

// POST /api/assistant/chat
#[utoipa::path(
    post,
    path = "/api/assistant/chat",
    tag = "Assistant",
    request_body = ChatPayload,
    responses(
        (status = 200, description = "Resposta do assistente", body = ChatResponse),
        (status = 502, description = "Falha na API do modelo"),
        (status = 503, description = "Assistente não configurado")
    ),
    security(("api_jwt" = []))
)]
pub async fn chat(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Json(payload): Json<ChatPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let response = app_state.assistant_service
        .chat(tenant.0, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(response)))
}
