// src/pricing/summary.rs

use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::models::quotes::QuoteLineItem;

/// Estatísticas descritivas de um orçamento (usadas no contexto da IA e na
/// resposta de detalhe). Não alteram o estado salvo.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuoteSummary {
    pub total_cases: i64,
    pub total_value: Decimal,
    /// Fração (0 a 1) das linhas com produto de origem BIPOC.
    pub bipoc_fraction: Decimal,
}

impl QuoteSummary {
    pub fn bipoc_percent(&self) -> Decimal {
        (self.bipoc_fraction * Decimal::ONE_HUNDRED).round_dp(1)
    }
}

pub fn summarize(lines: &[QuoteLineItem]) -> QuoteSummary {
    let total_cases = lines.iter().map(|line| i64::from(line.cases)).sum();
    let total_value = lines.iter().map(|line| line.line_total).sum();

    let bipoc_fraction = if lines.is_empty() {
        Decimal::ZERO
    } else {
        let bipoc_lines = lines.iter().filter(|line| line.is_bipoc).count();
        Decimal::from(bipoc_lines) / Decimal::from(lines.len())
    };

    QuoteSummary { total_cases, total_value, bipoc_fraction }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn line(cases: i32, total: &str, is_bipoc: bool) -> QuoteLineItem {
        QuoteLineItem {
            id: Uuid::new_v4(),
            organization_id: Uuid::nil(),
            quote_id: Uuid::nil(),
            product_id: Some(Uuid::new_v4()),
            product_name: "Sweet Potatoes".into(),
            is_bipoc,
            position: 0,
            cases,
            margin_percent: Decimal::from(20),
            unit_cost: Decimal::from(10),
            unit_price: Decimal::from(12),
            freight_cost: Decimal::from(75),
            line_total: total.parse().unwrap(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn empty_quote_summarizes_to_zero() {
        let summary = summarize(&[]);
        assert_eq!(summary.total_cases, 0);
        assert_eq!(summary.total_value, Decimal::ZERO);
        assert_eq!(summary.bipoc_fraction, Decimal::ZERO);
    }

    #[test]
    fn sums_cases_and_totals() {
        let lines = vec![line(100, "3672.84", true), line(12, "219.00", false), line(3, "111.50", false)];
        let summary = summarize(&lines);
        assert_eq!(summary.total_cases, 115);
        assert_eq!(summary.total_value, "4003.34".parse::<Decimal>().unwrap());
    }

    #[test]
    fn bipoc_fraction_counts_lines() {
        let lines = vec![line(1, "10", true), line(1, "10", false), line(1, "10", true), line(1, "10", false)];
        let summary = summarize(&lines);
        assert_eq!(summary.bipoc_fraction, "0.5".parse::<Decimal>().unwrap());
        assert_eq!(summary.bipoc_percent(), Decimal::from(50));
    }

    #[test]
    fn bipoc_fraction_stays_within_unit_interval() {
        for bipoc_count in 0..=5 {
            let lines: Vec<_> = (0..5).map(|i| line(2, "20", i < bipoc_count)).collect();
            let fraction = summarize(&lines).bipoc_fraction;
            assert!(fraction >= Decimal::ZERO && fraction <= Decimal::ONE);
        }
    }
}
