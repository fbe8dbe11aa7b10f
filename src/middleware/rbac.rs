// src/middleware/rbac.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use std::marker::PhantomData;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::auth::UserRole,
};

/// 1. O Trait que define o que é uma Permissão
pub trait PermissionDef: Send + Sync + 'static {
    fn slug() -> &'static str;
}

/// 2. O Extractor (Guardião)
pub struct RequirePermission<T>(pub PhantomData<T>);

// Permissões que um membro comum NÃO tem. Admin tem todas.
const ADMIN_ONLY: &[&str] = &["users:write", "settings:write", "products:write"];

pub fn role_has_permission(role: UserRole, slug: &str) -> bool {
    match role {
        UserRole::Admin => true,
        UserRole::Member => !ADMIN_ONLY.contains(&slug),
    }
}

impl<T, S> FromRequestParts<S> for RequirePermission<T>
where
    T: PermissionDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthenticatedUser::from_request_parts(parts, state).await?;

        let required_perm = T::slug();
        if !role_has_permission(user.0.role, required_perm) {
            tracing::debug!("Usuário {} sem a permissão '{}'", user.0.id, required_perm);

            let app_state = AppState::from_ref(state);
            let locale = Locale::from_headers(&parts.headers);
            return Err(AppError::Forbidden(required_perm.to_string()).to_api_error(&locale, &app_state.i18n_store));
        }

        Ok(RequirePermission(PhantomData))
    }
}

// ---
// DEFINIÇÃO DAS PERMISSÕES (TIPOS)
// ---

pub struct PermUsersWrite;
impl PermissionDef for PermUsersWrite {
    fn slug() -> &'static str { "users:write" }
}

pub struct PermSettingsWrite;
impl PermissionDef for PermSettingsWrite {
    fn slug() -> &'static str { "settings:write" }
}

pub struct PermProductsWrite;
impl PermissionDef for PermProductsWrite {
    fn slug() -> &'static str { "products:write" }
}
