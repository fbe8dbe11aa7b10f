// src/pricing/calculator.rs

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    models::{products::Product, settings::PricingSettings},
    pricing::PricingError,
};

/// Resultado do preço de uma linha. Os valores monetários mantêm precisão
/// total; o arredondamento acontece só em `rounded()`, antes de persistir.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LinePrice {
    pub cases: i32,
    pub pallets: i64,
    pub margin_percent: Decimal,
    pub discount_percent: Decimal,
    pub pallet_break: bool,
    /// Custo do fornecedor por caixa.
    pub unit_cost: Decimal,
    /// Preço de venda por caixa (custo + margem).
    pub unit_price: Decimal,
    pub freight_cost: Decimal,
    pub line_total: Decimal,
}

impl LinePrice {
    /// Arredonda os valores monetários para duas casas.
    pub fn rounded(&self) -> Self {
        Self {
            unit_cost: round_money(self.unit_cost),
            unit_price: round_money(self.unit_price),
            freight_cost: round_money(self.freight_cost),
            line_total: round_money(self.line_total),
            ..self.clone()
        }
    }
}

pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Maior distância que cabe na coluna `quotes.distance` (NUMERIC(10,2)).
pub fn max_distance() -> Decimal {
    Decimal::new(9_999_999_999, 2)
}

/// Calcula o preço de uma linha de orçamento.
///
/// Frete por palete = `baseFreightRate + perMileRate * distance`, cobrado por
/// `ceil(cases / casesPerPallet)` paletes. Quando `cases` não é múltiplo de
/// `casesPerPallet`, o palete incompleto paga `palletBreakSurcharge` sobre a
/// sua fração. O desconto da primeira faixa de volume que contém `cases`
/// incide só no frete, e o frete nunca fica abaixo de `minFreight`.
///
/// `margin_override` substitui a margem padrão do tipo de cliente.
/// Valores que estourariam a aritmética decimal viram `InvalidInput`.
pub fn price_line(
    product: &Product,
    cases: Decimal,
    customer_type: &str,
    distance: Decimal,
    margin_override: Option<Decimal>,
    settings: &PricingSettings,
) -> Result<LinePrice, PricingError> {
    let cases = whole_cases(cases)?;

    if distance < Decimal::ZERO {
        return Err(PricingError::InvalidInput("distance must not be negative".into()));
    }
    if distance > max_distance() {
        return Err(PricingError::InvalidInput(format!("distance must not exceed {}", max_distance())));
    }
    if product.cases_per_pallet <= 0 {
        return Err(PricingError::InvalidInput(format!(
            "product '{}' has no valid casesPerPallet",
            product.name
        )));
    }
    if product.cost_per_case < Decimal::ZERO {
        return Err(PricingError::InvalidInput(format!(
            "product '{}' has a negative costPerCase",
            product.name
        )));
    }

    let margin_percent = match margin_override {
        Some(margin) if margin < Decimal::ZERO || margin > Decimal::ONE_HUNDRED => {
            return Err(PricingError::InvalidInput("marginPercent must be between 0 and 100".into()));
        }
        Some(margin) => margin,
        None => settings.margin_for(customer_type).ok_or_else(|| {
            PricingError::InvalidInput(format!("no margin configured for customer type '{}'", customer_type))
        })?,
    };

    // --- Frete ---
    let cases_per_pallet = i64::from(product.cases_per_pallet);
    let pallets = (cases + cases_per_pallet - 1) / cases_per_pallet;
    let per_pallet = settings
        .per_mile_rate
        .checked_mul(distance)
        .and_then(|miles| miles.checked_add(settings.base_freight_rate))
        .ok_or_else(|| out_of_range("freight per pallet"))?;

    let mut freight = per_pallet
        .checked_mul(Decimal::from(pallets))
        .ok_or_else(|| out_of_range("freight"))?;

    let remainder = cases % cases_per_pallet;
    let pallet_break = remainder != 0;
    if pallet_break {
        let share = Decimal::from(remainder) / Decimal::from(cases_per_pallet);
        let surcharge = per_pallet
            .checked_mul(share)
            .and_then(|partial| partial.checked_mul(percent(settings.pallet_break_surcharge)))
            .ok_or_else(|| out_of_range("pallet break surcharge"))?;
        freight = freight.checked_add(surcharge).ok_or_else(|| out_of_range("freight"))?;
    }

    let discount_percent = settings
        .tier_for(cases)
        .map(|tier| tier.discount_percent)
        .unwrap_or(Decimal::ZERO);
    freight = freight
        .checked_mul(Decimal::ONE - percent(discount_percent))
        .ok_or_else(|| out_of_range("freight"))?;

    let freight_cost = freight.max(settings.min_freight);

    // --- Custo + margem ---
    let unit_price = product
        .cost_per_case
        .checked_mul(Decimal::ONE + percent(margin_percent))
        .ok_or_else(|| out_of_range("unit price"))?;
    let line_total = unit_price
        .checked_mul(Decimal::from(cases))
        .and_then(|goods| goods.checked_add(freight_cost))
        .ok_or_else(|| out_of_range("line total"))?;

    Ok(LinePrice {
        // `whole_cases` já limitou o valor a i32
        cases: cases as i32,
        pallets,
        margin_percent,
        discount_percent,
        pallet_break,
        unit_cost: product.cost_per_case,
        unit_price,
        freight_cost,
        line_total,
    })
}

fn out_of_range(what: &str) -> PricingError {
    PricingError::InvalidInput(format!("{} is out of range", what))
}

fn whole_cases(cases: Decimal) -> Result<i64, PricingError> {
    if cases <= Decimal::ZERO {
        return Err(PricingError::InvalidInput("cases must be greater than zero".into()));
    }
    if !cases.fract().is_zero() {
        return Err(PricingError::InvalidInput("cases must be a whole number".into()));
    }
    cases
        .to_i32()
        .map(i64::from)
        .ok_or_else(|| PricingError::InvalidInput("cases is too large".into()))
}

fn percent(value: Decimal) -> Decimal {
    value / Decimal::ONE_HUNDRED
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::settings::VolumeTier;
    use chrono::Utc;
    use std::collections::BTreeMap;
    use uuid::Uuid;

    fn d(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    fn product(cost: &str, cases_per_pallet: i32) -> Product {
        Product {
            id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            name: "Collard Greens".into(),
            unit: "24 bunches".into(),
            cases_per_pallet,
            cost_per_case: d(cost),
            weight_per_case: Some(d("22")),
            farm: Some("Sweet Water Farm".into()),
            location: Some("Durham, NC".into()),
            is_bipoc: true,
            is_gap_certified: false,
            is_available: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn settings() -> PricingSettings {
        PricingSettings {
            base_freight_rate: d("125"),
            per_mile_rate: d("0.85"),
            pallet_break_surcharge: d("15"),
            min_freight: d("75"),
            margins: BTreeMap::from([("restaurant".to_string(), d("20"))]),
            volume_tiers: vec![
                VolumeTier { min_cases: 0, max_cases: Some(50), discount_percent: d("0") },
                VolumeTier { min_cases: 51, max_cases: Some(150), discount_percent: d("8") },
                VolumeTier { min_cases: 151, max_cases: None, discount_percent: d("12") },
            ],
            regions: BTreeMap::new(),
        }
    }

    #[test]
    fn hundred_cases_forty_miles() {
        let price = price_line(&product("26.95", 49), d("100"), "restaurant", d("40"), None, &settings()).unwrap();

        assert_eq!(price.pallets, 3);
        assert!(price.pallet_break);
        assert_eq!(price.discount_percent, d("8"));
        assert_eq!(price.margin_percent, d("20"));
        assert_eq!(price.unit_price, d("32.34"));

        // 3 x (125 + 0.85 x 40) = 477, mais 15% sobre 2/49 de 159, menos 8%
        let rounded = price.rounded();
        assert_eq!(rounded.freight_cost, d("439.74"));
        assert_eq!(rounded.line_total, d("3673.74"));
    }

    #[test]
    fn full_pallets_carry_no_surcharge() {
        let price = price_line(&product("26.95", 49), d("98"), "restaurant", d("40"), None, &settings()).unwrap();

        assert_eq!(price.pallets, 2);
        assert!(!price.pallet_break);
        // 2 x 159 = 318, menos 8%
        assert_eq!(price.freight_cost, d("292.56"));
    }

    #[test]
    fn remainder_after_full_pallets_pays_surcharge_on_its_share() {
        let mut s = settings();
        s.min_freight = Decimal::ZERO;
        for tier in s.volume_tiers.iter_mut() {
            tier.discount_percent = Decimal::ZERO;
        }
        // 90 caixas de 40: 2 paletes cheios e 10 caixas no terceiro
        let price = price_line(&product("10", 40), d("90"), "restaurant", Decimal::ZERO, None, &s).unwrap();

        assert_eq!(price.pallets, 3);
        assert!(price.pallet_break);
        assert_eq!(price.freight_cost, d("125") * d("3") + d("125") * d("0.25") * d("0.15"));
    }

    #[test]
    fn distance_beyond_storable_range_is_invalid() {
        let p = product("26.95", 1);
        let err = price_line(&p, d("2000000000"), "restaurant", d("100000000000000000000"), None, &settings())
            .unwrap_err();
        assert!(matches!(err, PricingError::InvalidInput(_)));

        assert!(price_line(&p, d("10"), "restaurant", max_distance(), None, &settings()).is_ok());
    }

    #[test]
    fn overflowing_amounts_are_invalid_instead_of_panicking() {
        let mut s = settings();
        s.base_freight_rate = Decimal::MAX;
        let err = price_line(&product("26.95", 49), d("10"), "restaurant", d("40"), None, &s).unwrap_err();
        assert!(matches!(err, PricingError::InvalidInput(msg) if msg.contains("out of range")));

        let mut expensive = product("1", 1);
        expensive.cost_per_case = Decimal::MAX / d("2");
        let err = price_line(&expensive, d("2000000000"), "restaurant", Decimal::ZERO, None, &settings())
            .unwrap_err();
        assert!(matches!(err, PricingError::InvalidInput(msg) if msg.contains("out of range")));
    }

    #[test]
    fn zero_cases_is_invalid() {
        let err = price_line(&product("26.95", 49), Decimal::ZERO, "restaurant", d("40"), None, &settings()).unwrap_err();
        assert!(matches!(err, PricingError::InvalidInput(_)));
    }

    #[test]
    fn negative_and_fractional_cases_are_invalid() {
        let p = product("26.95", 49);
        assert!(price_line(&p, d("-3"), "restaurant", d("40"), None, &settings()).is_err());
        assert!(price_line(&p, d("2.5"), "restaurant", d("40"), None, &settings()).is_err());
    }

    #[test]
    fn whole_decimal_cases_are_accepted() {
        let p = product("26.95", 49);
        let price = price_line(&p, d("100.00"), "restaurant", d("40"), None, &settings()).unwrap();
        assert_eq!(price.cases, 100);
    }

    #[test]
    fn negative_distance_is_invalid() {
        let err = price_line(&product("10", 40), d("10"), "restaurant", d("-1"), None, &settings()).unwrap_err();
        assert!(matches!(err, PricingError::InvalidInput(_)));
    }

    #[test]
    fn margin_override_out_of_range_is_invalid() {
        let p = product("10", 40);
        assert!(price_line(&p, d("10"), "restaurant", d("5"), Some(d("101")), &settings()).is_err());
        assert!(price_line(&p, d("10"), "restaurant", d("5"), Some(d("-1")), &settings()).is_err());
    }

    #[test]
    fn unknown_customer_type_without_default_margin_is_invalid() {
        let err = price_line(&product("10", 40), d("10"), "school", d("5"), None, &settings()).unwrap_err();
        assert!(matches!(err, PricingError::InvalidInput(_)));
    }

    #[test]
    fn margin_override_replaces_customer_default() {
        let price = price_line(&product("10", 40), d("10"), "restaurant", d("5"), Some(d("35")), &settings()).unwrap();
        assert_eq!(price.margin_percent, d("35"));
        assert_eq!(price.unit_price, d("13.5"));
    }

    #[test]
    fn sub_pallet_line_pays_surcharge_on_its_share() {
        let mut s = settings();
        s.min_freight = Decimal::ZERO;
        // 20 de 40 caixas: meio palete, 15% sobre a metade do frete do palete
        let price = price_line(&product("10", 40), d("20"), "restaurant", Decimal::ZERO, None, &s).unwrap();
        assert!(price.pallet_break);
        assert_eq!(price.pallets, 1);
        assert_eq!(price.freight_cost, d("125") + d("125") * d("0.5") * d("0.15"));
    }

    #[test]
    fn freight_floors_at_minimum() {
        let mut s = settings();
        s.base_freight_rate = d("10");
        s.per_mile_rate = Decimal::ZERO;
        let price = price_line(&product("10", 40), d("40"), "restaurant", d("3"), None, &s).unwrap();
        assert_eq!(price.freight_cost, d("75"));
        assert_eq!(price.line_total, d("12") * d("40") + d("75"));
    }

    #[test]
    fn freight_never_below_minimum_across_volumes() {
        let s = settings();
        let p = product("18.40", 56);
        for cases in 1..=400 {
            for miles in ["0", "12.5", "80", "310"] {
                let price = price_line(&p, Decimal::from(cases), "restaurant", d(miles), None, &s).unwrap();
                assert!(price.freight_cost >= s.min_freight, "cases={} miles={}", cases, miles);
            }
        }
    }

    #[test]
    fn cost_plus_margin_is_non_decreasing_in_cases() {
        let s = settings();
        let p = product("26.95", 49);
        let mut previous = Decimal::ZERO;
        for cases in 1..=300 {
            let price = price_line(&p, Decimal::from(cases), "restaurant", d("40"), None, &s).unwrap();
            let goods = price.unit_price * Decimal::from(price.cases);
            assert!(goods >= previous);
            previous = goods;
        }
    }

    #[test]
    fn per_case_freight_does_not_increase_with_deeper_discount() {
        let p = product("26.95", 49);
        let mut per_case = Vec::new();
        for discount in ["0", "5", "8", "12", "30"] {
            let mut s = settings();
            for tier in s.volume_tiers.iter_mut() {
                tier.discount_percent = d(discount);
            }
            let price = price_line(&p, d("196"), "restaurant", d("40"), None, &s).unwrap();
            per_case.push(price.freight_cost / Decimal::from(price.cases));
        }
        assert!(per_case.windows(2).all(|pair| pair[1] <= pair[0]));
    }

    #[test]
    fn discount_applies_to_freight_only() {
        let p = product("26.95", 49);
        let mut no_discount = settings();
        for tier in no_discount.volume_tiers.iter_mut() {
            tier.discount_percent = Decimal::ZERO;
        }
        let full = price_line(&p, d("100"), "restaurant", d("40"), None, &no_discount).unwrap();
        let discounted = price_line(&p, d("100"), "restaurant", d("40"), None, &settings()).unwrap();
        assert_eq!(full.unit_price, discounted.unit_price);
        assert!(discounted.freight_cost < full.freight_cost);
    }

    #[test]
    fn identical_inputs_give_identical_output() {
        let p = product("26.95", 49);
        let s = settings();
        let first = price_line(&p, d("77"), "restaurant", d("63.5"), None, &s).unwrap();
        let second = price_line(&p, d("77"), "restaurant", d("63.5"), None, &s).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn rounding_happens_only_on_request() {
        let mut s = settings();
        s.min_freight = Decimal::ZERO;
        let price = price_line(&product("10", 49), d("2"), "restaurant", d("7"), None, &s).unwrap();
        assert!(price.freight_cost.scale() > 2);
        let rounded = price.rounded();
        assert_eq!(rounded.freight_cost, round_money(price.freight_cost));
        assert!(rounded.freight_cost.scale() <= 2);
    }

    #[test]
    fn round_money_uses_midpoint_away_from_zero() {
        assert_eq!(round_money(d("2.345")), d("2.35"));
        assert_eq!(round_money(d("2.344")), d("2.34"));
    }
}
