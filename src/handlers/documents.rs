// src/handlers/documents.rs

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{i18n::Locale, tenancy::TenantContext},
};

// GET /api/quotes/{id}/pdf
#[utoipa::path(
    get,
    path = "/api/quotes/{id}/pdf",
    tag = "Quotes",
    params(("id" = Uuid, Path, description = "ID do orçamento")),
    responses(
        (status = 200, description = "PDF do orçamento", content_type = "application/pdf"),
        (status = 404, description = "Orçamento não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn quote_pdf(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(quote_id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let pdf_bytes = app_state.document_service
        .generate_quote_pdf(tenant.0, quote_id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    // Configura os Headers para o navegador baixar ou mostrar o PDF
    let disposition = format!("attachment; filename=\"quote_{}.pdf\"", quote_id);
    let headers = [
        (header::CONTENT_TYPE, "application/pdf"),
        (header::CONTENT_DISPOSITION, disposition.as_str()),
    ];

    Ok((headers, pdf_bytes).into_response())
}
