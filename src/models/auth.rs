// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;
use utoipa::ToSchema;

// --- ENUMS ---

// Mapeia o CREATE TYPE user_role do banco
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Member,
}

// --- Organização (o "tenant") ---

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: Uuid,
    #[schema(example = "Piedmont Produce Co-op")]
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Representa um usuário vindo do banco de dados
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub organization_id: Uuid,
    #[schema(example = "ana@piedmontproduce.com")]
    pub email: String,
    #[schema(example = "Ana Souza")]
    pub full_name: String,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    #[schema(ignore)]
    pub password_hash: String,

    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Dados para registro de uma nova organização com seu primeiro usuário
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Piedmont Produce Co-op")]
    pub organization_name: String,

    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Ana Souza")]
    pub full_name: String,

    #[validate(email(message = "invalid_email"))]
    #[schema(example = "ana@piedmontproduce.com")]
    pub email: String,

    #[validate(length(min = 8, message = "password_too_short"))]
    pub password: String,
}

// Dados para login
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginUserPayload {
    #[validate(email(message = "invalid_email"))]
    pub email: String,
    #[validate(length(min = 1, message = "required"))]
    pub password: String,
}

// Cadastro de um colega na mesma organização (apenas admin)
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserPayload {
    #[validate(length(min = 1, message = "required"))]
    pub full_name: String,

    #[validate(email(message = "invalid_email"))]
    pub email: String,

    #[validate(length(min = 8, message = "password_too_short"))]
    pub password: String,

    #[serde(default = "default_role")]
    pub role: UserRole,
}

fn default_role() -> UserRole {
    UserRole::Member
}

// Resposta de autenticação com o token
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,  // Subject (ID do usuário)
    pub org: Uuid,  // Organização do usuário
    pub exp: usize, // Expiration time (quando o token expira)
    pub iat: usize, // Issued At (quando o token foi criado)
}
