// src/handlers/customers.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{i18n::Locale, tenancy::TenantContext},
    models::customers::{Customer, CustomerPayload},
};

fn not_found() -> AppError {
    AppError::ResourceNotFound("Customer".into())
}

// GET /api/customers
#[utoipa::path(
    get,
    path = "/api/customers",
    tag = "Customers",
    responses(
        (status = 200, description = "Clientes da organização", body = Vec<Customer>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_customers(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
) -> Result<impl IntoResponse, ApiError> {
    let customers = app_state.customer_repo
        .list(tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(customers)))
}

// GET /api/customers/{id}
#[utoipa::path(
    get,
    path = "/api/customers/{id}",
    tag = "Customers",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Cliente", body = Customer),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(customer_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let customer = app_state.customer_repo
        .find_by_id(&app_state.db_pool, tenant.0, customer_id)
        .await
        .and_then(|found| found.ok_or_else(not_found))
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(customer)))
}

// POST /api/customers
#[utoipa::path(
    post,
    path = "/api/customers",
    tag = "Customers",
    request_body = CustomerPayload,
    responses(
        (status = 201, description = "Cliente criado", body = Customer),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Json(payload): Json<CustomerPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let customer = app_state.customer_repo
        .create(tenant.0, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(customer)))
}

// PUT /api/customers/{id}
#[utoipa::path(
    put,
    path = "/api/customers/{id}",
    tag = "Customers",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    request_body = CustomerPayload,
    responses(
        (status = 200, description = "Cliente atualizado", body = Customer),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(customer_id): Path<Uuid>,
    Json(payload): Json<CustomerPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let customer = app_state.customer_repo
        .update(tenant.0, customer_id, &payload)
        .await
        .and_then(|updated| updated.ok_or_else(not_found))
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(customer)))
}

// DELETE /api/customers/{id}
// Orçamentos do cliente ficam sem cliente (ON DELETE SET NULL).
#[utoipa::path(
    delete,
    path = "/api/customers/{id}",
    tag = "Customers",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 204, description = "Cliente removido"),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(customer_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = app_state.customer_repo
        .delete(tenant.0, customer_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    if !deleted {
        return Err(not_found().to_api_error(&locale, &app_state.i18n_store));
    }

    Ok(StatusCode::NO_CONTENT)
}
