// src/models/products.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;
use utoipa::ToSchema;

// --- Produto (catálogo da organização) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    #[schema(ignore)]
    pub organization_id: Uuid,

    #[schema(example = "Collard Greens")]
    pub name: String,
    #[schema(example = "24 bunches")]
    pub unit: String,

    #[schema(example = 49)]
    pub cases_per_pallet: i32,
    // Custo do fornecedor
    #[schema(example = 26.95)]
    pub cost_per_case: Decimal,
    #[schema(example = 22.5)]
    pub weight_per_case: Option<Decimal>,

    // Procedência
    #[schema(example = "Sweet Water Farm")]
    pub farm: Option<String>,
    #[schema(example = "Durham, NC")]
    pub location: Option<String>,
    pub is_bipoc: bool,
    pub is_gap_certified: bool,

    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Usado tanto no POST quanto no PUT (substituição completa)
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductPayload {
    #[validate(length(min = 1, message = "required"))]
    pub name: String,

    #[validate(length(min = 1, message = "required"))]
    pub unit: String,

    #[validate(range(min = 1, message = "must_be_positive"))]
    pub cases_per_pallet: i32,

    pub cost_per_case: Decimal,
    pub weight_per_case: Option<Decimal>,

    pub farm: Option<String>,
    pub location: Option<String>,

    #[serde(default)]
    pub is_bipoc: bool,
    #[serde(default)]
    pub is_gap_certified: bool,
    #[serde(default = "default_available")]
    pub is_available: bool,
}

fn default_available() -> bool {
    true
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListQuery {
    pub available: Option<bool>,
}
