// src/models/settings.rs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::pricing::{max_distance, PricingError};

// Documento de configuração de preços embutido no binário.
// Usado quando a organização ainda não salvou o seu.
const DEFAULT_PRICING_DOCUMENT: &str = include_str!("../../seed/default_pricing.json");

/// Chave de margem usada quando o tipo de cliente não tem margem própria.
pub const DEFAULT_MARGIN_KEY: &str = "default";

// --- Faixas de volume ---

/// Faixa de quantidade de caixas (limites inclusivos) com desconto no frete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VolumeTier {
    #[schema(example = 51)]
    pub min_cases: i64,

    // `null` = sem limite superior
    #[schema(example = 150)]
    pub max_cases: Option<i64>,

    #[schema(example = 8)]
    pub discount_percent: Decimal,
}

impl VolumeTier {
    pub fn contains(&self, cases: i64) -> bool {
        cases >= self.min_cases && self.max_cases.is_none_or(|max| cases <= max)
    }
}

// --- Documento de preços ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PricingSettings {
    /// Moeda por palete.
    #[schema(example = 125)]
    pub base_freight_rate: Decimal,

    /// Moeda por milha por palete.
    #[schema(example = 0.85)]
    pub per_mile_rate: Decimal,

    /// Percentual (0-100) cobrado a mais quando a linha não fecha um palete.
    #[schema(example = 15)]
    pub pallet_break_surcharge: Decimal,

    /// Piso do frete por linha.
    #[schema(example = 75)]
    pub min_freight: Decimal,

    /// Margem (0-100) por tipo de cliente.
    pub margins: BTreeMap<String, Decimal>,

    pub volume_tiers: Vec<VolumeTier>,

    /// Distância fixa (milhas) por região nomeada.
    #[serde(default)]
    pub regions: BTreeMap<String, Decimal>,
}

impl PricingSettings {
    /// Documento padrão embutido, já validado.
    pub fn bundled_default() -> Result<Self, PricingError> {
        Self::from_json(DEFAULT_PRICING_DOCUMENT)
    }

    pub fn from_json(raw: &str) -> Result<Self, PricingError> {
        let settings: PricingSettings = serde_json::from_str(raw)
            .map_err(|e| PricingError::InvalidInput(format!("malformed settings document: {}", e)))?;
        settings.ensure_valid()?;
        Ok(settings)
    }

    /// Garante as invariantes do documento: valores não negativos,
    /// percentuais entre 0 e 100 e faixas cobrindo [0, ∞) sem lacunas.
    pub fn ensure_valid(&self) -> Result<(), PricingError> {
        let rates = [
            ("baseFreightRate", self.base_freight_rate),
            ("perMileRate", self.per_mile_rate),
            ("minFreight", self.min_freight),
        ];
        for (field, value) in rates {
            if value < Decimal::ZERO {
                return Err(PricingError::InvalidInput(format!("{} must not be negative", field)));
            }
        }

        ensure_percent("palletBreakSurcharge", self.pallet_break_surcharge)?;

        for (customer_type, margin) in &self.margins {
            ensure_percent(&format!("margins.{}", customer_type), *margin)?;
        }

        for (region, miles) in &self.regions {
            if *miles < Decimal::ZERO {
                return Err(PricingError::InvalidInput(format!("regions.{} must not be negative", region)));
            }
            if *miles > max_distance() {
                return Err(PricingError::InvalidInput(format!("regions.{} exceeds {}", region, max_distance())));
            }
        }

        self.ensure_tiers_cover_all_volumes()
    }

    fn ensure_tiers_cover_all_volumes(&self) -> Result<(), PricingError> {
        let Some(first) = self.volume_tiers.first() else {
            return Err(PricingError::InvalidInput("volumeTiers must not be empty".into()));
        };
        if first.min_cases != 0 {
            return Err(PricingError::InvalidInput("volumeTiers must start at 0 cases".into()));
        }

        let mut expected_min = 0;
        for (index, tier) in self.volume_tiers.iter().enumerate() {
            ensure_percent(&format!("volumeTiers[{}].discountPercent", index), tier.discount_percent)?;

            if tier.min_cases != expected_min {
                return Err(PricingError::InvalidInput(format!(
                    "volumeTiers[{}] starts at {} but {} was expected (gap or overlap)",
                    index, tier.min_cases, expected_min
                )));
            }

            match tier.max_cases {
                Some(max) if max < tier.min_cases => {
                    return Err(PricingError::InvalidInput(format!(
                        "volumeTiers[{}] has maxCases {} below minCases {}",
                        index, max, tier.min_cases
                    )));
                }
                Some(max) => {
                    expected_min = max.checked_add(1).ok_or_else(|| {
                        PricingError::InvalidInput(format!(
                            "volumeTiers[{}] has a maxCases too large to be followed by another tier",
                            index
                        ))
                    })?;
                }
                None if index + 1 != self.volume_tiers.len() => {
                    return Err(PricingError::InvalidInput(format!(
                        "volumeTiers[{}] is unbounded but is not the last tier",
                        index
                    )));
                }
                None => return Ok(()),
            }
        }

        Err(PricingError::InvalidInput("the last volume tier must have no maxCases".into()))
    }

    /// Primeira faixa que contém `cases`, na ordem declarada.
    pub fn tier_for(&self, cases: i64) -> Option<&VolumeTier> {
        self.volume_tiers.iter().find(|tier| tier.contains(cases))
    }

    /// Margem padrão do tipo de cliente, com fallback para a chave `default`.
    pub fn margin_for(&self, customer_type: &str) -> Option<Decimal> {
        self.margins
            .get(customer_type)
            .or_else(|| self.margins.get(DEFAULT_MARGIN_KEY))
            .copied()
    }

    pub fn region_distance(&self, region: &str) -> Option<Decimal> {
        self.regions.get(region).copied()
    }
}

fn ensure_percent(field: &str, value: Decimal) -> Result<(), PricingError> {
    if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
        return Err(PricingError::InvalidInput(format!("{} must be between 0 and 100", field)));
    }
    Ok(())
}

// --- Resposta da API ---

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PricingSettingsResponse {
    pub settings: PricingSettings,
    /// `true` quando a organização ainda não salvou um documento próprio.
    pub is_default: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    fn tier(min: i64, max: Option<i64>, discount: &str) -> VolumeTier {
        VolumeTier { min_cases: min, max_cases: max, discount_percent: d(discount) }
    }

    #[test]
    fn bundled_default_is_valid() {
        let settings = PricingSettings::bundled_default().unwrap();
        assert_eq!(settings.base_freight_rate, d("125"));
        assert_eq!(settings.per_mile_rate, d("0.85"));
        assert_eq!(settings.tier_for(100).unwrap().discount_percent, d("8"));
        assert_eq!(settings.region_distance("Metro"), Some(d("40")));
    }

    #[test]
    fn rejects_gap_between_tiers() {
        let mut settings = PricingSettings::bundled_default().unwrap();
        settings.volume_tiers = vec![tier(0, Some(50), "0"), tier(52, None, "5")];
        assert!(matches!(settings.ensure_valid(), Err(PricingError::InvalidInput(_))));
    }

    #[test]
    fn rejects_overlapping_tiers() {
        let mut settings = PricingSettings::bundled_default().unwrap();
        settings.volume_tiers = vec![tier(0, Some(50), "0"), tier(40, None, "5")];
        assert!(settings.ensure_valid().is_err());
    }

    #[test]
    fn rejects_inverted_range() {
        let mut settings = PricingSettings::bundled_default().unwrap();
        settings.volume_tiers = vec![tier(0, Some(10), "0"), tier(11, Some(5), "5"), tier(6, None, "7")];
        assert!(settings.ensure_valid().is_err());
    }

    #[test]
    fn rejects_bounded_last_tier() {
        let mut settings = PricingSettings::bundled_default().unwrap();
        settings.volume_tiers = vec![tier(0, Some(50), "0"), tier(51, Some(100), "5")];
        assert!(settings.ensure_valid().is_err());
    }

    #[test]
    fn rejects_max_cases_at_integer_limit() {
        let mut settings = PricingSettings::bundled_default().unwrap();
        settings.volume_tiers = vec![tier(0, Some(i64::MAX), "0"), tier(0, None, "5")];
        assert!(matches!(settings.ensure_valid(), Err(PricingError::InvalidInput(msg)) if msg.contains("too large")));
    }

    #[test]
    fn rejects_tiers_not_starting_at_zero() {
        let mut settings = PricingSettings::bundled_default().unwrap();
        settings.volume_tiers = vec![tier(1, None, "0")];
        assert!(settings.ensure_valid().is_err());
    }

    #[test]
    fn rejects_negative_rate() {
        let mut settings = PricingSettings::bundled_default().unwrap();
        settings.per_mile_rate = d("-0.10");
        assert!(settings.ensure_valid().is_err());
    }

    #[test]
    fn rejects_margin_above_hundred() {
        let mut settings = PricingSettings::bundled_default().unwrap();
        settings.margins.insert("restaurant".into(), d("120"));
        assert!(settings.ensure_valid().is_err());
    }

    #[test]
    fn malformed_document_is_invalid_input() {
        let err = PricingSettings::from_json(r#"{"baseFreightRate": "abc"}"#).unwrap_err();
        assert!(matches!(err, PricingError::InvalidInput(_)));
    }

    #[test]
    fn first_matching_tier_wins() {
        let mut settings = PricingSettings::bundled_default().unwrap();
        settings.volume_tiers = vec![tier(0, Some(50), "0"), tier(51, None, "10")];
        assert_eq!(settings.tier_for(50).unwrap().discount_percent, d("0"));
        assert_eq!(settings.tier_for(51).unwrap().discount_percent, d("10"));
        assert_eq!(settings.tier_for(10_000).unwrap().discount_percent, d("10"));
    }

    #[test]
    fn margin_falls_back_to_default_key() {
        let settings = PricingSettings::bundled_default().unwrap();
        assert_eq!(settings.margin_for("restaurant"), Some(d("25")));
        assert_eq!(settings.margin_for("food-bank"), Some(d("20")));
    }
}
