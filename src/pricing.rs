// src/pricing.rs

//! Cálculo de preços de orçamento: funções puras sobre o documento de
//! configuração da organização. Nada aqui acessa banco ou rede.

pub mod calculator;
pub mod summary;

pub use calculator::{max_distance, price_line, round_money, LinePrice};
pub use summary::{summarize, QuoteSummary};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PricingError {
    #[error("Entrada inválida: {0}")]
    InvalidInput(String),

    // A organização não salvou configuração; quem chama usa o documento padrão.
    #[error("Configuração de preços ausente")]
    ConfigurationMissing,
}
