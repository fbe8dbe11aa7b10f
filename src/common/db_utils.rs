use crate::common::error::AppError;

// ---
// Helper: traduz violação de chave única para um erro amigável
// ---
/// `what` identifica o valor duplicado na mensagem (ex.: "e-mail").
pub(crate) fn map_unique_violation(e: sqlx::Error, what: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return match db_err.constraint() {
                // O nome padrão que o Postgres cria para "UNIQUE" na coluna email
                Some("users_email_key") => AppError::EmailAlreadyExists,
                _ => AppError::UniqueConstraintViolation(what.to_string()),
            };
        }
    }
    e.into()
}
