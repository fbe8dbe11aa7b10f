// src/models/quotes.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use utoipa::ToSchema;
use validator::Validate;

use crate::pricing::QuoteSummary;

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "quote_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum QuoteStatus {
    Draft,
    Sent,
    Accepted,
    Rejected,
    Expired,
}

impl QuoteStatus {
    /// Transições permitidas. O fluxo só anda para frente:
    /// rascunho → enviado → aceito; recusado e expirado são finais.
    pub fn can_transition_to(self, next: QuoteStatus) -> bool {
        use QuoteStatus::*;
        matches!(
            (self, next),
            (Draft, Sent) | (Draft, Rejected) | (Draft, Expired)
                | (Sent, Accepted) | (Sent, Rejected) | (Sent, Expired)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, QuoteStatus::Accepted | QuoteStatus::Rejected | QuoteStatus::Expired)
    }

    // Só rascunhos aceitam mudança de linhas
    pub fn is_editable(self) -> bool {
        self == QuoteStatus::Draft
    }

    pub fn as_str(self) -> &'static str {
        match self {
            QuoteStatus::Draft => "draft",
            QuoteStatus::Sent => "sent",
            QuoteStatus::Accepted => "accepted",
            QuoteStatus::Rejected => "rejected",
            QuoteStatus::Expired => "expired",
        }
    }
}

// --- Orçamento ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub id: Uuid,
    #[schema(ignore)]
    pub organization_id: Uuid,
    pub customer_id: Option<Uuid>,
    pub created_by: Option<Uuid>,
    pub status: QuoteStatus,
    #[schema(example = 40)]
    pub distance: Decimal,
    #[schema(example = "Metro")]
    pub region: Option<String>,
    pub notes: Option<String>,
    #[schema(example = 3673.74)]
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Linha com os valores "congelados" no momento do cálculo.
// Alterações posteriores no produto não mexem aqui.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuoteLineItem {
    pub id: Uuid,
    #[schema(ignore)]
    pub organization_id: Uuid,
    pub quote_id: Uuid,
    pub product_id: Option<Uuid>,
    pub product_name: String,
    pub is_bipoc: bool,
    pub position: i32,
    #[schema(example = 100)]
    pub cases: i32,
    #[schema(example = 20)]
    pub margin_percent: Decimal,
    #[schema(example = 26.95)]
    pub unit_cost: Decimal,
    #[schema(example = 32.34)]
    pub unit_price: Decimal,
    #[schema(example = 439.74)]
    pub freight_cost: Decimal,
    #[schema(example = 3673.74)]
    pub line_total: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Linha a ser gravada (valores já arredondados).
#[derive(Debug, Clone)]
pub struct NewQuoteLine {
    pub product_id: Uuid,
    pub product_name: String,
    pub is_bipoc: bool,
    pub cases: i32,
    pub margin_percent: Decimal,
    pub unit_cost: Decimal,
    pub unit_price: Decimal,
    pub freight_cost: Decimal,
    pub line_total: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuoteDetail {
    #[serde(flatten)]
    pub header: Quote,
    pub customer_name: Option<String>,
    pub customer_type: Option<String>,
    pub items: Vec<QuoteLineItem>,
    pub summary: QuoteSummary,
}

// Cabeçalho com o nome do cliente (LEFT JOIN)
#[derive(Debug, Clone, FromRow)]
pub struct QuoteHeaderRow {
    #[sqlx(flatten)]
    pub quote: Quote,
    pub customer_name: Option<String>,
    pub customer_type: Option<String>,
}

// --- Payloads ---

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuoteItemPayload {
    pub product_id: Uuid,
    // Decimal para podermos recusar "2.5" com uma mensagem clara
    #[schema(example = 100)]
    pub cases: Decimal,
    // Sem valor, vale a margem do tipo de cliente
    #[schema(example = 20)]
    pub margin_percent: Option<Decimal>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuotePayload {
    pub customer_id: Option<Uuid>,
    // Sem distância, usa a milhagem da região (do payload ou do cliente)
    #[schema(example = 40)]
    pub distance: Option<Decimal>,
    #[schema(example = "Metro")]
    pub region: Option<String>,
    #[validate(length(max = 2000, message = "invalid_length"))]
    pub notes: Option<String>,
    #[serde(default)]
    #[validate(length(max = 200, message = "invalid_length"))]
    pub items: Vec<QuoteItemPayload>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuotePayload {
    pub customer_id: Option<Uuid>,
    pub distance: Option<Decimal>,
    pub region: Option<String>,
    #[validate(length(max = 2000, message = "invalid_length"))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuoteStatusPayload {
    pub status: QuoteStatus,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteListQuery {
    pub status: Option<QuoteStatus>,
}

/// Cálculo avulso de uma linha, sem gravar nada.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PricingPreviewPayload {
    pub product_id: Uuid,
    #[schema(example = 100)]
    pub cases: Decimal,
    // O tipo do cliente cadastrado tem prioridade sobre `customerType`
    pub customer_id: Option<Uuid>,
    #[schema(example = "grocery")]
    pub customer_type: Option<String>,
    pub distance: Option<Decimal>,
    pub region: Option<String>,
    pub margin_percent: Option<Decimal>,
}
