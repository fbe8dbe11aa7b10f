// src/middleware/tenancy.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use uuid::Uuid;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
};

// Organização do usuário autenticado. Todo acesso a dados filtra por ela.
#[derive(Debug, Clone, Copy)]
pub struct TenantContext(pub Uuid);

impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // Inserido pelo auth_guard junto com o usuário
        if let Some(tenant) = parts.extensions.get::<TenantContext>() {
            return Ok(*tenant);
        }

        let app_state = AppState::from_ref(state);
        let locale = Locale::from_headers(&parts.headers);
        Err(AppError::InvalidToken.to_api_error(&locale, &app_state.i18n_store))
    }
}
