// src/middleware/auth.rs

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{i18n::Locale, tenancy::TenantContext},
    models::auth::User,
};

/// Valida o Bearer token, carrega o usuário e o injeta (junto com a
/// organização) nas extensions da requisição.
pub async fn auth_guard(
    State(app_state): State<AppState>,
    locale: Locale,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let Some(Authorization(bearer)) = request.headers().typed_get::<Authorization<Bearer>>() else {
        return Err(to_api(AppError::InvalidToken));
    };

    let user = app_state.auth_service
        .validate_token(bearer.token())
        .await
        // Usuário apagado depois de emitir o token: trata como token inválido
        .map_err(|e| match e {
            AppError::UserNotFound => to_api(AppError::InvalidToken),
            other => to_api(other),
        })?;

    request.extensions_mut().insert(TenantContext(user.organization_id));
    request.extensions_mut().insert(AuthenticatedUser(user));

    Ok(next.run(request).await)
}

// Extrator para obter o usuário autenticado diretamente nos handlers
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthenticatedUser>() {
            return Ok(user.clone());
        }

        // Rota montada sem o auth_guard
        let app_state = AppState::from_ref(state);
        let locale = Locale::from_headers(&parts.headers);
        Err(AppError::InvalidToken.to_api_error(&locale, &app_state.i18n_store))
    }
}
