//! Recommendation factory.
//!
//! Turns loosely-typed upstream product rows into a strict [`PricingContext`]
//! and hands it to a [`PricingEngine`]. Upstream feeds use Russian column
//! names and mix numbers with numeric strings, so [`ProductRecord`] accepts
//! both spellings and both encodings.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::domain::competitor::CompetitorObservation;
use crate::domain::context::{DemandLevel, PricingContext};
use crate::domain::market::MarketPosition;
use crate::domain::recommendation::PricingRecommendation;
use crate::errors::DomainError;
use crate::pricing::{PricingEngine, ProductTierTable};

const UNKNOWN: &str = "Unknown";

/// Raw product row as delivered by the data-fetching layer.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    #[serde(default, alias = "id", alias = "наименование", deserialize_with = "loose_string")]
    pub product_id: Option<String>,
    #[serde(default, alias = "вид_продукции", deserialize_with = "loose_string")]
    pub product_type: Option<String>,
    #[serde(default, alias = "марка_стали", deserialize_with = "loose_string")]
    pub steel_grade: Option<String>,
    #[serde(default, alias = "диаметр", deserialize_with = "loose_string")]
    pub diameter: Option<String>,
    #[serde(default, alias = "регион", deserialize_with = "loose_string")]
    pub region: Option<String>,
    #[serde(default, alias = "наличие", deserialize_with = "loose_string")]
    pub availability: Option<String>,
    #[serde(default, alias = "цена", deserialize_with = "loose_number")]
    pub price: Option<f64>,
    #[serde(default, alias = "себестоимость", deserialize_with = "loose_number")]
    pub cost: Option<f64>,
    #[serde(default, alias = "остаток", deserialize_with = "loose_number")]
    pub current_inventory: Option<f64>,
}

impl ProductRecord {
    /// The upstream product id, when the row carries a non-blank one.
    pub fn explicit_id(&self) -> Option<&str> {
        self.product_id.as_deref().map(str::trim).filter(|id| !id.is_empty())
    }

    /// Label for logs and bulk reports. Falls back to the product type, so it
    /// is not unique and must never address a price update.
    pub fn display_id(&self) -> String {
        self.explicit_id()
            .map(str::to_string)
            .or_else(|| self.product_type.clone())
            .unwrap_or_else(|| UNKNOWN.to_string())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FactorySettings {
    /// Tons assumed on hand when the record carries no inventory.
    pub default_inventory: f64,
    /// Cost base as a share of the listed price when no cost is supplied.
    pub cost_ratio: f64,
    pub scarcity_keywords: Vec<String>,
    pub in_stock_keywords: Vec<String>,
}

impl Default for FactorySettings {
    fn default() -> Self {
        Self {
            default_inventory: 50.0,
            cost_ratio: 0.75,
            scarcity_keywords: vec![
                "мало".to_string(),
                "под заказ".to_string(),
                "low stock".to_string(),
                "backorder".to_string(),
            ],
            in_stock_keywords: vec!["в наличии".to_string(), "in stock".to_string()],
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct RecommendationFactory {
    settings: FactorySettings,
    tiers: ProductTierTable,
}

impl RecommendationFactory {
    pub fn new(settings: FactorySettings, tiers: ProductTierTable) -> Self {
        Self { settings, tiers }
    }

    pub fn build_context(
        &self,
        record: &ProductRecord,
        as_of_month: u32,
    ) -> Result<PricingContext, DomainError> {
        let seasonality = seasonality_for_month(as_of_month)?;
        let product_type = text_or_unknown(record.product_type.as_deref());

        Ok(PricingContext {
            margin_target: self.tiers.margin_target_for(&product_type),
            product_type,
            steel_grade: text_or_unknown(record.steel_grade.as_deref()),
            diameter: text_or_unknown(record.diameter.as_deref()),
            region: text_or_unknown(record.region.as_deref()),
            current_inventory: record
                .current_inventory
                .filter(|tons| tons.is_finite() && *tons >= 0.0)
                .unwrap_or(self.settings.default_inventory),
            demand_level: self.assess_demand(record.availability.as_deref().unwrap_or_default()),
            seasonality,
            cost_base: self.estimate_cost_base(record),
        })
    }

    pub fn recommend<E: PricingEngine + ?Sized>(
        &self,
        engine: &E,
        record: &ProductRecord,
        competitors: &[CompetitorObservation],
        market_position: &MarketPosition,
        as_of_month: u32,
    ) -> Result<PricingRecommendation, DomainError> {
        let context = self.build_context(record, as_of_month)?;
        engine.generate_recommendation(competitors, market_position, &context)
    }

    pub fn assess_demand(&self, availability: &str) -> DemandLevel {
        let normalized = availability.to_lowercase();
        let contains_any = |keywords: &[String]| {
            keywords.iter().any(|keyword| {
                let keyword = keyword.trim().to_lowercase();
                !keyword.is_empty() && normalized.contains(&keyword)
            })
        };

        if contains_any(&self.settings.scarcity_keywords) {
            DemandLevel::High
        } else if contains_any(&self.settings.in_stock_keywords) {
            DemandLevel::Medium
        } else {
            DemandLevel::Low
        }
    }

    pub fn estimate_cost_base(&self, record: &ProductRecord) -> f64 {
        match record.cost {
            Some(cost) if cost > 0.0 => cost,
            _ => record.price.unwrap_or(0.0) * self.settings.cost_ratio,
        }
    }
}

/// Seasonal demand shift for steel pipe: spring and autumn peaks, summer
/// lull, winter trough.
pub fn seasonality_for_month(month: u32) -> Result<f64, DomainError> {
    match month {
        3..=5 => Ok(0.3),
        9..=11 => Ok(0.2),
        6..=8 => Ok(-0.1),
        12 | 1 | 2 => Ok(-0.2),
        other => Err(DomainError::InvalidMonth(other)),
    }
}

fn text_or_unknown(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => UNKNOWN.to_string(),
    }
}

fn loose_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    })
}

fn loose_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().replace(' ', "").replace(',', ".").parse::<f64>().ok(),
        _ => None,
    }
    .filter(|value| value.is_finite()))
}

#[cfg(test)]
mod tests {
    use super::{seasonality_for_month, FactorySettings, ProductRecord, RecommendationFactory};
    use crate::domain::competitor::{CompetitorObservation, QualityTier};
    use crate::domain::context::DemandLevel;
    use crate::domain::market::{MarketPosition, MarketRole};
    use crate::errors::DomainError;
    use crate::pricing::{DeterministicPricingEngine, ProductTier, ProductTierTable};

    fn record(json: &str) -> ProductRecord {
        serde_json::from_str(json).expect("product record should deserialize")
    }

    #[test]
    fn upstream_russian_columns_are_accepted() {
        let record = record(
            r#"{
                "наименование": "Труба 159х6",
                "вид_продукции": "Труба б/ш",
                "марка_стали": "09Г2С",
                "диаметр": 159,
                "регион": "Екатеринбург",
                "наличие": "под заказ",
                "цена": "96 000"
            }"#,
        );

        assert_eq!(record.product_id.as_deref(), Some("Труба 159х6"));
        assert_eq!(record.diameter.as_deref(), Some("159"));
        assert_eq!(record.price, Some(96_000.0));
        assert!(record.cost.is_none());
    }

    #[test]
    fn garbage_numbers_become_absent() {
        let record = record(r#"{"цена": "по запросу", "остаток": null}"#);

        assert!(record.price.is_none());
        assert!(record.current_inventory.is_none());
        assert_eq!(record.display_id(), "Unknown");
    }

    #[test]
    fn blank_product_id_is_not_an_explicit_id() {
        let typed = record(r#"{"id": "  ", "вид_продукции": "Труба б/ш"}"#);
        let identified = record(r#"{"id": " pipe-219 ", "вид_продукции": "Труба б/ш"}"#);

        assert_eq!(typed.explicit_id(), None);
        assert_eq!(typed.display_id(), "Труба б/ш");
        assert_eq!(identified.explicit_id(), Some("pipe-219"));
        assert_eq!(identified.display_id(), "pipe-219");
    }

    #[test]
    fn context_is_derived_from_record_defaults() {
        let factory = RecommendationFactory::default();
        let record = record(
            r#"{"вид_продукции": "Труба б/ш", "наличие": "В наличии", "цена": 80000}"#,
        );

        let context = factory.build_context(&record, 4).expect("April is a valid month");

        assert_eq!(context.product_type, "Труба б/ш");
        assert_eq!(context.steel_grade, "Unknown");
        assert_eq!(context.current_inventory, 50.0);
        assert_eq!(context.demand_level, DemandLevel::Medium);
        assert_eq!(context.seasonality, 0.3);
        assert_eq!(context.cost_base, 60_000.0);
        assert_eq!(context.margin_target, 25.0);
    }

    #[test]
    fn explicit_cost_and_inventory_win_over_defaults() {
        let factory = RecommendationFactory::default();
        let record = record(
            r#"{"product_type": "Труба ВГП", "price": 70000, "cost": 52000, "current_inventory": 1200}"#,
        );

        let context = factory.build_context(&record, 7).expect("July is a valid month");

        assert_eq!(context.cost_base, 52_000.0);
        assert_eq!(context.current_inventory, 1200.0);
        assert_eq!(context.margin_target, 15.0);
        assert_eq!(context.seasonality, -0.1);
    }

    #[test]
    fn demand_follows_availability_keywords() {
        let factory = RecommendationFactory::default();

        assert_eq!(factory.assess_demand("Осталось мало"), DemandLevel::High);
        assert_eq!(factory.assess_demand("под заказ, 14 дней"), DemandLevel::High);
        assert_eq!(factory.assess_demand("в наличии"), DemandLevel::Medium);
        assert_eq!(factory.assess_demand("Backorder only"), DemandLevel::High);
        assert_eq!(factory.assess_demand(""), DemandLevel::Low);
        assert_eq!(factory.assess_demand("снято с производства"), DemandLevel::Low);
    }

    #[test]
    fn custom_keywords_replace_defaults() {
        let factory = RecommendationFactory::new(
            FactorySettings {
                scarcity_keywords: vec!["limited".to_string()],
                in_stock_keywords: vec!["available".to_string()],
                ..FactorySettings::default()
            },
            ProductTierTable::default(),
        );

        assert_eq!(factory.assess_demand("Limited supply"), DemandLevel::High);
        assert_eq!(factory.assess_demand("available"), DemandLevel::Medium);
        assert_eq!(factory.assess_demand("мало"), DemandLevel::Low);
    }

    #[test]
    fn every_month_maps_to_a_season() {
        let expected = [
            (1, -0.2),
            (2, -0.2),
            (3, 0.3),
            (4, 0.3),
            (5, 0.3),
            (6, -0.1),
            (7, -0.1),
            (8, -0.1),
            (9, 0.2),
            (10, 0.2),
            (11, 0.2),
            (12, -0.2),
        ];

        for (month, seasonality) in expected {
            assert_eq!(seasonality_for_month(month), Ok(seasonality), "month {month}");
        }
        assert_eq!(seasonality_for_month(0), Err(DomainError::InvalidMonth(0)));
        assert_eq!(seasonality_for_month(13), Err(DomainError::InvalidMonth(13)));
    }

    #[test]
    fn margin_target_comes_from_configured_tiers() {
        let factory = RecommendationFactory::new(
            FactorySettings::default(),
            ProductTierTable::new(vec![ProductTier::new("oil_country", "OCTG", 0.9, 28.0)]),
        );
        let record = record(r#"{"product_type": "OCTG casing", "price": 100000}"#);

        let context = factory.build_context(&record, 10).expect("October is a valid month");

        assert_eq!(context.margin_target, 28.0);
    }

    #[test]
    fn recommend_runs_engine_on_derived_context() {
        let factory = RecommendationFactory::default();
        let engine = DeterministicPricingEngine::default();
        let record = record(r#"{"вид_продукции": "Труба э/с", "наличие": "мало", "цена": 80000}"#);
        let competitors = vec![CompetitorObservation {
            competitor: "ВТЗ".to_string(),
            price: 79_000.0,
            region: "Москва".to_string(),
            availability: "в наличии".to_string(),
            quality: QualityTier::Standard,
            delivery_days: 7,
        }];
        let position =
            MarketPosition { position: MarketRole::Follower, market_share: 18.0, brand_strength: 0.8 };

        let recommendation = factory
            .recommend(&engine, &record, &competitors, &position, 5)
            .expect("recommendation should be produced");

        // cost base 60_000 at the 20% electric-welded margin
        assert!((recommendation.current_price - 72_000.0).abs() < 1e-9);
        assert!(recommendation.recommended_price >= 63_000.0);
        assert!(recommendation.recommended_price <= 120_000.0);
        assert_eq!(recommendation.reasoning[2], "High demand supports a price increase");
    }

    #[test]
    fn missing_price_surfaces_engine_error() {
        let factory = RecommendationFactory::default();
        let engine = DeterministicPricingEngine::default();
        let position =
            MarketPosition { position: MarketRole::Leader, market_share: 10.0, brand_strength: 0.5 };

        let error = factory
            .recommend(&engine, &ProductRecord::default(), &[], &position, 1)
            .expect_err("zero cost base must be rejected");

        assert_eq!(error, DomainError::NonPositiveCurrentPrice(0.0));
    }

    #[test]
    fn invalid_month_is_rejected_before_pricing() {
        let factory = RecommendationFactory::default();

        let error = factory
            .build_context(&ProductRecord::default(), 13)
            .expect_err("month 13 must be rejected");

        assert_eq!(error, DomainError::InvalidMonth(13));
    }
}
