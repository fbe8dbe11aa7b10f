use std::collections::HashMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::{
    common::i18n::I18nStore,
    middleware::i18n::Locale,
    models::quotes::QuoteStatus,
    pricing::PricingError,
};

// Erros de domínio/infra. Viram `ApiError` (traduzido) na borda HTTP.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Recurso não encontrado: {0}")]
    ResourceNotFound(String),

    #[error("Violação de unicidade: {0}")]
    UniqueConstraintViolation(String),

    #[error("Permissão ausente: {0}")]
    Forbidden(String),

    #[error("Transição de status inválida: {from:?} -> {to:?}")]
    InvalidStatusTransition { from: QuoteStatus, to: QuoteStatus },

    #[error("Orçamento bloqueado no status {0:?}")]
    QuoteLocked(QuoteStatus),

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error("Assistente de IA não configurado")]
    AssistantUnavailable,

    #[error("Falha na API do assistente: {0}")]
    AssistantError(String),

    #[error("Fonte não encontrada: {0}")]
    FontNotFound(String),

    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::AssistantError(e.to_string())
    }
}

/// Corpo de erro enviado ao cliente.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::EmailAlreadyExists | AppError::UniqueConstraintViolation(_) => StatusCode::CONFLICT,
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::UserNotFound | AppError::ResourceNotFound(_) => StatusCode::NOT_FOUND,
            AppError::DatabaseError(sqlx::Error::RowNotFound) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::InvalidStatusTransition { .. } | AppError::QuoteLocked(_) => StatusCode::CONFLICT,
            AppError::Pricing(PricingError::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            AppError::AssistantUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            AppError::AssistantError(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Converte para a resposta HTTP no idioma do cliente.
    pub fn to_api_error(&self, locale: &Locale, store: &I18nStore) -> ApiError {
        let lang = locale.0.as_str();
        let status = self.status();

        let error = match self {
            // Retorna todos os detalhes da validação, campo a campo.
            AppError::ValidationError(errors) => {
                let mut details = HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| match &e.message {
                            Some(key) => store.translate(lang, key),
                            None => store.translate(lang, &e.code),
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                return ApiError {
                    status,
                    error: store.translate(lang, "validation_failed"),
                    details: Some(json!(details)),
                };
            }
            AppError::EmailAlreadyExists => store.translate(lang, "email_already_exists"),
            AppError::InvalidCredentials => store.translate(lang, "invalid_credentials"),
            AppError::InvalidToken => store.translate(lang, "invalid_token"),
            AppError::UserNotFound => store.translate(lang, "user_not_found"),
            AppError::ResourceNotFound(what) => store.translate_with(lang, "resource_not_found", &[what.as_str()]),
            AppError::DatabaseError(sqlx::Error::RowNotFound) => {
                store.translate_with(lang, "resource_not_found", &["Record"])
            }
            AppError::UniqueConstraintViolation(what) => store.translate_with(lang, "unique_violation", &[what.as_str()]),
            AppError::Forbidden(permission) => store.translate_with(lang, "forbidden", &[permission.as_str()]),
            AppError::InvalidStatusTransition { from, to } => {
                store.translate_with(lang, "invalid_status_transition", &[from.as_str(), to.as_str()])
            }
            AppError::QuoteLocked(current) => store.translate_with(lang, "quote_locked", &[current.as_str()]),
            AppError::Pricing(PricingError::InvalidInput(reason)) => {
                store.translate_with(lang, "pricing_invalid_input", &[reason.as_str()])
            }
            AppError::Pricing(PricingError::ConfigurationMissing) => {
                tracing::error!("Configuração de preços ausente e sem padrão embutido");
                store.translate(lang, "pricing_configuration_missing")
            }
            AppError::AssistantUnavailable => store.translate(lang, "assistant_unavailable"),
            AppError::AssistantError(reason) => {
                tracing::warn!("Falha na API do assistente: {}", reason);
                store.translate(lang, "assistant_error")
            }
            AppError::FontNotFound(path) => {
                tracing::error!("Fonte do PDF não encontrada: {}", path);
                store.translate(lang, "pdf_font_missing")
            }

            // Todos os outros erros viram 500; o detalhe fica só no log.
            e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                store.translate(lang, "internal_error")
            }
        };

        ApiError { status, error, details: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Signup {
        #[validate(email(message = "invalid_email"))]
        email: String,
    }

    fn store() -> I18nStore {
        I18nStore::load().unwrap()
    }

    #[test]
    fn validation_errors_are_translated_per_field() {
        let errors = Signup { email: "not-an-email".into() }.validate().unwrap_err();
        let api = AppError::ValidationError(errors).to_api_error(&Locale("pt".into()), &store());

        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert_eq!(api.error, "Um ou mais campos são inválidos.");
        assert_eq!(api.details.unwrap()["email"][0], "O e-mail fornecido é inválido.");
    }

    #[test]
    fn status_transition_error_names_both_states() {
        let err = AppError::InvalidStatusTransition { from: QuoteStatus::Accepted, to: QuoteStatus::Draft };
        let api = err.to_api_error(&Locale::default(), &store());
        assert_eq!(api.status, StatusCode::CONFLICT);
        assert_eq!(api.error, "A quote cannot move from 'accepted' to 'draft'.");
    }

    #[test]
    fn pricing_input_errors_are_bad_requests() {
        let err = AppError::from(PricingError::InvalidInput("cases must be greater than zero".into()));
        let api = err.to_api_error(&Locale::default(), &store());
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert!(api.error.ends_with("cases must be greater than zero"));
    }

    #[test]
    fn internal_errors_hide_details() {
        let err = AppError::InternalServerError(anyhow::anyhow!("connection string leaked"));
        let api = err.to_api_error(&Locale::default(), &store());
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.error, "An unexpected error occurred.");
    }

    #[test]
    fn missing_row_is_not_found() {
        let api = AppError::DatabaseError(sqlx::Error::RowNotFound).to_api_error(&Locale::default(), &store());
        assert_eq!(api.status, StatusCode::NOT_FOUND);
    }
}
