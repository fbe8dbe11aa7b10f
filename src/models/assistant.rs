// src/models/assistant.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatPayload {
    #[validate(length(min = 1, max = 4000, message = "invalid_length"))]
    #[schema(example = "Is the freight on this quote competitive for a 40 mile delivery?")]
    pub message: String,

    // Orçamento cujo conteúdo vai como contexto para a IA
    pub quote_id: Option<Uuid>,

    // Conversa anterior, na ordem
    #[serde(default)]
    #[validate(length(max = 20, message = "invalid_length"))]
    pub history: Vec<ChatTurn>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub reply: String,
    pub model: String,
}
