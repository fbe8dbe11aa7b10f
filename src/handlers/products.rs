// src/handlers/products.rs

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
    middleware::{
        i18n::Locale,
        rbac::{PermProductsWrite, RequirePermission},
        tenancy::TenantContext,
    },
    models::products::{Product, ProductListQuery, ProductPayload},
};

fn not_found() -> AppError {
    AppError::ResourceNotFound("Product".into())
}

// GET /api/products?available=true
#[utoipa::path(
    get,
    path = "/api/products",
    tag = "Products",
    params(("available" = Option<bool>, Query, description = "Filtra pela disponibilidade")),
    responses(
        (status = 200, description = "Catálogo da organização", body = Vec<Product>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_products(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Query(query): Query<ProductListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let products = app_state.product_repo
        .list(tenant.0, query.available)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(products)))
}

// GET /api/products/{id}
#[utoipa::path(
    get,
    path = "/api/products/{id}",
    tag = "Products",
    params(("id" = Uuid, Path, description = "ID do produto")),
    responses(
        (status = 200, description = "Produto", body = Product),
        (status = 404, description = "Produto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_product(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(product_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let product = app_state.product_repo
        .find_by_id(&app_state.db_pool, tenant.0, product_id)
        .await
        .and_then(|found| found.ok_or_else(not_found))
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(product)))
}

// POST /api/products
#[utoipa::path(
    post,
    path = "/api/products",
    tag = "Products",
    request_body = ProductPayload,
    responses(
        (status = 201, description = "Produto criado", body = Product),
        (status = 400, description = "Dados inválidos"),
        (status = 403, description = "Apenas administradores")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_product(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermProductsWrite>,
    Json(payload): Json<ProductPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let product = app_state.product_repo
        .create(tenant.0, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(product)))
}

// PUT /api/products/{id}
// Linhas de orçamento já gravadas não mudam; use /reprice para atualizá-las.
#[utoipa::path(
    put,
    path = "/api/products/{id}",
    tag = "Products",
    params(("id" = Uuid, Path, description = "ID do produto")),
    request_body = ProductPayload,
    responses(
        (status = 200, description = "Produto atualizado", body = Product),
        (status = 404, description = "Produto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_product(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermProductsWrite>,
    Path(product_id): Path<Uuid>,
    Json(payload): Json<ProductPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let product = app_state.product_repo
        .update(tenant.0, product_id, &payload)
        .await
        .and_then(|updated| updated.ok_or_else(not_found))
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(product)))
}

// DELETE /api/products/{id}
#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    tag = "Products",
    params(("id" = Uuid, Path, description = "ID do produto")),
    responses(
        (status = 204, description = "Produto removido"),
        (status = 404, description = "Produto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_product(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermProductsWrite>,
    Path(product_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = app_state.product_repo
        .delete(tenant.0, product_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    if !deleted {
        return Err(not_found().to_api_error(&locale, &app_state.i18n_store));
    }

    Ok(StatusCode::NO_CONTENT)
}
