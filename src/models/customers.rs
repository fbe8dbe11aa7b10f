// src/models/customers.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;
use utoipa::ToSchema;

// --- CLIENTE ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,
    #[schema(ignore)]
    pub organization_id: Uuid,

    #[schema(example = "Magnolia Kitchen")]
    pub name: String,

    // Chave usada para buscar a margem padrão nas configurações de preço
    #[schema(example = "restaurant")]
    pub customer_type: String,

    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,

    // Região nomeada (ver `regions` nas configurações) para sugerir a distância
    #[schema(example = "Metro")]
    pub region: Option<String>,
    pub notes: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Magnolia Kitchen")]
    pub name: String,

    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "restaurant")]
    pub customer_type: String,

    pub contact_name: Option<String>,

    #[validate(email(message = "invalid_email"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub region: Option<String>,
    pub notes: Option<String>,
}
