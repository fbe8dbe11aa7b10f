// src/handlers/quotes.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale, tenancy::TenantContext},
    models::quotes::{
        CreateQuotePayload, Quote, QuoteDetail, QuoteItemPayload, QuoteListQuery, UpdateQuotePayload,
        UpdateQuoteStatusPayload,
    },
};

// =============================================================================
//  ÁREA 1: ORÇAMENTOS
// =============================================================================

// GET /api/quotes?status=draft
#[utoipa::path(
    get,
    path = "/api/quotes",
    tag = "Quotes",
    params(("status" = Option<String>, Query, description = "draft | sent | accepted | rejected | expired")),
    responses(
        (status = 200, description = "Orçamentos da organização", body = Vec<Quote>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_quotes(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Query(query): Query<QuoteListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let quotes = app_state.quote_service
        .list(tenant.0, query.status)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(quotes)))
}

// POST /api/quotes
#[utoipa::path(
    post,
    path = "/api/quotes",
    tag = "Quotes",
    request_body = CreateQuotePayload,
    responses(
        (status = 201, description = "Orçamento criado com as linhas calculadas", body = QuoteDetail),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Cliente ou produto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_quote(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Json(payload): Json<CreateQuotePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let detail = app_state.quote_service
        .create_quote(tenant.0, user.0.id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(detail)))
}

// GET /api/quotes/{id}
#[utoipa::path(
    get,
    path = "/api/quotes/{id}",
    tag = "Quotes",
    params(("id" = Uuid, Path, description = "ID do orçamento")),
    responses(
        (status = 200, description = "Orçamento com linhas e resumo", body = QuoteDetail),
        (status = 404, description = "Orçamento não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_quote(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(quote_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = app_state.quote_service
        .get_detail(tenant.0, quote_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(detail)))
}

// PUT /api/quotes/{id}
#[utoipa::path(
    put,
    path = "/api/quotes/{id}",
    tag = "Quotes",
    params(("id" = Uuid, Path, description = "ID do orçamento")),
    request_body = UpdateQuotePayload,
    responses(
        (status = 200, description = "Cabeçalho atualizado e linhas recalculadas", body = QuoteDetail),
        (status = 409, description = "Orçamento fora do rascunho")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_quote(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(quote_id): Path<Uuid>,
    Json(payload): Json<UpdateQuotePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let detail = app_state.quote_service
        .update_header(tenant.0, quote_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(detail)))
}

// DELETE /api/quotes/{id}
#[utoipa::path(
    delete,
    path = "/api/quotes/{id}",
    tag = "Quotes",
    params(("id" = Uuid, Path, description = "ID do orçamento")),
    responses(
        (status = 204, description = "Orçamento removido"),
        (status = 404, description = "Orçamento não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_quote(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(quote_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state.quote_service
        .delete(tenant.0, quote_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  ÁREA 2: LINHAS
// =============================================================================

// POST /api/quotes/{id}/items
#[utoipa::path(
    post,
    path = "/api/quotes/{id}/items",
    tag = "Quotes",
    params(("id" = Uuid, Path, description = "ID do orçamento")),
    request_body = QuoteItemPayload,
    responses(
        (status = 201, description = "Linha adicionada", body = QuoteDetail),
        (status = 400, description = "Entrada inválida para o cálculo"),
        (status = 409, description = "Orçamento fora do rascunho")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_item(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(quote_id): Path<Uuid>,
    Json(payload): Json<QuoteItemPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = app_state.quote_service
        .add_item(tenant.0, quote_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(detail)))
}

// DELETE /api/quotes/{id}/items/{item_id}
#[utoipa::path(
    delete,
    path = "/api/quotes/{id}/items/{item_id}",
    tag = "Quotes",
    params(
        ("id" = Uuid, Path, description = "ID do orçamento"),
        ("item_id" = Uuid, Path, description = "ID da linha")
    ),
    responses(
        (status = 200, description = "Linha removida", body = QuoteDetail),
        (status = 409, description = "Orçamento fora do rascunho")
    ),
    security(("api_jwt" = []))
)]
pub async fn remove_item(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path((quote_id, item_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = app_state.quote_service
        .remove_item(tenant.0, quote_id, item_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(detail)))
}

// POST /api/quotes/{id}/reprice
#[utoipa::path(
    post,
    path = "/api/quotes/{id}/reprice",
    tag = "Quotes",
    params(("id" = Uuid, Path, description = "ID do orçamento")),
    responses(
        (status = 200, description = "Linhas recalculadas com dados atuais", body = QuoteDetail),
        (status = 409, description = "Orçamento fora do rascunho")
    ),
    security(("api_jwt" = []))
)]
pub async fn reprice_quote(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(quote_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = app_state.quote_service
        .reprice(tenant.0, quote_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(detail)))
}

// =============================================================================
//  ÁREA 3: STATUS
// =============================================================================

// PATCH /api/quotes/{id}/status
#[utoipa::path(
    patch,
    path = "/api/quotes/{id}/status",
    tag = "Quotes",
    params(("id" = Uuid, Path, description = "ID do orçamento")),
    request_body = UpdateQuoteStatusPayload,
    responses(
        (status = 200, description = "Status alterado", body = Quote),
        (status = 409, description = "Transição não permitida")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_status(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(quote_id): Path<Uuid>,
    Json(payload): Json<UpdateQuoteStatusPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let quote = app_state.quote_service
        .transition_status(tenant.0, quote_id, payload.status)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(quote)))
}
