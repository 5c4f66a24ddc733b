use tracing::debug;

use crate::domain::competitor::CompetitorObservation;
use crate::domain::context::PricingContext;
use crate::domain::market::{MarketPosition, MarketRole};
use crate::domain::recommendation::{
    Classification, ExpectedImpact, ImplementationPriority, PricingRecommendation,
    RecommendationKind, RecommendationStrength,
};
use crate::errors::DomainError;
use crate::pricing::analysis::{analyze_competitors, CompetitorAnalysis};
use crate::pricing::narrative::{assess_risks, generate_reasoning};
use crate::pricing::tiers::ProductTierTable;

/// Hard floor and ceiling for the recommended price, as multiples of cost base.
pub const MIN_MARGIN_MULTIPLIER: f64 = 1.05;
pub const MAX_MARGIN_MULTIPLIER: f64 = 2.00;

pub const MIN_CONFIDENCE: f64 = 0.10;
pub const MAX_CONFIDENCE: f64 = 0.95;

/// Below this percent difference the current price is kept.
const MAINTAIN_BAND_PERCENT: f64 = 2.0;
const STRONG_CHANGE_PERCENT: f64 = 10.0;

/// Weights of the four price anchors in the blended target price.
///
/// The average and median weights are applied to the competitor average and
/// median prices themselves; demand and position act only through the
/// multipliers applied after blending.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendWeights {
    pub cost_based: f64,
    pub competitor_based: f64,
    pub average_price: f64,
    pub median_price: f64,
}

impl Default for BlendWeights {
    fn default() -> Self {
        Self { cost_based: 0.3, competitor_based: 0.4, average_price: 0.2, median_price: 0.1 }
    }
}

pub trait PricingEngine: Send + Sync {
    fn generate_recommendation(
        &self,
        competitors: &[CompetitorObservation],
        market_position: &MarketPosition,
        context: &PricingContext,
    ) -> Result<PricingRecommendation, DomainError>;
}

#[derive(Debug, Clone, Default)]
pub struct DeterministicPricingEngine {
    tiers: ProductTierTable,
    weights: BlendWeights,
}

impl DeterministicPricingEngine {
    pub fn new(tiers: ProductTierTable) -> Self {
        Self { tiers, weights: BlendWeights::default() }
    }

    pub fn with_weights(mut self, weights: BlendWeights) -> Self {
        self.weights = weights;
        self
    }
}

impl PricingEngine for DeterministicPricingEngine {
    fn generate_recommendation(
        &self,
        competitors: &[CompetitorObservation],
        market_position: &MarketPosition,
        context: &PricingContext,
    ) -> Result<PricingRecommendation, DomainError> {
        if !context.cost_base.is_finite() {
            return Err(DomainError::NonFiniteCostBase(context.cost_base));
        }
        let current_price = context.cost_plus_price();
        if !current_price.is_finite() || current_price <= 0.0 {
            return Err(DomainError::NonPositiveCurrentPrice(current_price));
        }

        let analysis = analyze_competitors(competitors, context.cost_base);
        let optimal_price = optimal_price(&analysis, context, market_position, &self.weights);
        let classification = classify(current_price, optimal_price);

        let price_change = optimal_price - current_price;
        let price_change_percent = price_change / current_price * 100.0;
        let elasticity = self.tiers.elasticity_for(&context.product_type);
        let impact =
            expected_impact(price_change_percent, elasticity, market_position.market_share);

        let reasoning = generate_reasoning(&analysis, context, market_position);
        let risks = assess_risks(classification.kind, &impact, context);
        let priority = implementation_priority(&impact);
        let confidence = confidence(&analysis, classification);

        debug!(
            event_name = "pricing.recommendation.generated",
            product_type = %context.product_type,
            region = %context.region,
            competitor_count = analysis.competitor_count,
            current_price,
            recommended_price = optimal_price,
            recommendation = ?classification.kind,
            confidence,
            "pricing recommendation generated"
        );

        Ok(PricingRecommendation {
            current_price,
            recommended_price: optimal_price,
            price_change,
            price_change_percent,
            recommendation: classification.kind,
            confidence,
            reasoning,
            risks,
            expected_impact: impact,
            implementation_priority: priority,
            timeframe: priority.timeframe(),
        })
    }
}

/// Price anchored to the competitor set according to this firm's market role.
pub fn competitor_based_price(analysis: &CompetitorAnalysis, role: MarketRole) -> f64 {
    let leader_price = analysis.market_leader.as_ref().map(|leader| leader.price);

    match role {
        MarketRole::Leader => analysis.average_price * 1.05,
        MarketRole::Challenger => {
            leader_price.map_or(analysis.average_price * 0.95, |price| price * 0.98)
        }
        MarketRole::Follower => leader_price.map_or(analysis.average_price, |price| price * 1.02),
        MarketRole::Niche => analysis.average_price * 1.1,
        MarketRole::Unrecognized => analysis.average_price,
    }
}

/// Weighted target price, clamped into the 5%-100% margin band above cost.
pub fn optimal_price(
    analysis: &CompetitorAnalysis,
    context: &PricingContext,
    market_position: &MarketPosition,
    weights: &BlendWeights,
) -> f64 {
    let cost_based = context.cost_plus_price();
    let competitor_based = competitor_based_price(analysis, market_position.position);

    let demand_multiplier = context.demand_level.price_multiplier();
    let seasonality_multiplier = 1.0 + context.seasonality * 0.1;
    let position_multiplier = market_position.position.price_multiplier();
    let volatility_adjustment = 1.0 + analysis.price_volatility * 0.05;

    let blended = cost_based * weights.cost_based
        + competitor_based * weights.competitor_based
        + analysis.average_price * weights.average_price
        + analysis.median_price * weights.median_price;

    let optimal = blended
        * demand_multiplier
        * seasonality_multiplier
        * position_multiplier
        * volatility_adjustment;

    let floor = context.cost_base * MIN_MARGIN_MULTIPLIER;
    let ceiling = context.cost_base * MAX_MARGIN_MULTIPLIER;
    floor.max(ceiling.min(optimal))
}

pub fn classify(current_price: f64, optimal_price: f64) -> Classification {
    let percent_diff = (optimal_price - current_price).abs() / current_price * 100.0;

    if percent_diff < MAINTAIN_BAND_PERCENT {
        return Classification {
            kind: RecommendationKind::Maintain,
            strength: RecommendationStrength::Weak,
        };
    }

    let strength = if percent_diff > STRONG_CHANGE_PERCENT {
        RecommendationStrength::Strong
    } else {
        RecommendationStrength::Moderate
    };
    let kind = if optimal_price > current_price {
        RecommendationKind::Increase
    } else {
        RecommendationKind::Decrease
    };

    Classification { kind, strength }
}

pub fn expected_impact(
    price_change_percent: f64,
    elasticity: f64,
    market_share: f64,
) -> ExpectedImpact {
    let volume = -price_change_percent * elasticity;
    // includes the second-order price x volume term
    let revenue = price_change_percent + volume + price_change_percent * volume / 100.0;
    let market_share_change = volume / 100.0 * market_share;

    ExpectedImpact {
        volume_change_percent: round_one_decimal(volume),
        revenue_change_percent: round_one_decimal(revenue),
        market_share_change_percent: round_one_decimal(market_share_change),
    }
}

pub fn implementation_priority(impact: &ExpectedImpact) -> ImplementationPriority {
    let revenue_swing = impact.revenue_change_percent.abs();

    if revenue_swing > 10.0 || impact.market_share_change_percent > 5.0 {
        ImplementationPriority::High
    } else if revenue_swing > 5.0 || impact.market_share_change_percent > 2.0 {
        ImplementationPriority::Medium
    } else {
        ImplementationPriority::Low
    }
}

pub fn confidence(analysis: &CompetitorAnalysis, classification: Classification) -> f64 {
    let mut confidence: f64 = 0.5;

    if analysis.competitor_count > 5 {
        confidence += 0.2;
    } else if analysis.competitor_count > 2 {
        confidence += 0.1;
    }

    if analysis.price_volatility < 0.1 {
        confidence += 0.15;
    } else if analysis.price_volatility < 0.2 {
        confidence += 0.1;
    }

    if classification.strength == RecommendationStrength::Strong {
        confidence += 0.1;
    }

    confidence.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
}

/// Rounds half up to one decimal place, so -2.25 becomes -2.2.
fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0 + 0.5).floor() / 10.0
}

#[cfg(test)]
mod tests {
    use super::{
        classify, competitor_based_price, confidence, expected_impact, implementation_priority,
        optimal_price, round_one_decimal, BlendWeights, DeterministicPricingEngine, PricingEngine,
    };
    use crate::domain::competitor::{CompetitorObservation, QualityTier};
    use crate::domain::context::{DemandLevel, PricingContext};
    use crate::domain::market::{MarketPosition, MarketRole};
    use crate::domain::recommendation::{
        Classification, ExpectedImpact, ImplementationPriority, RecommendationKind,
        RecommendationStrength, Timeframe,
    };
    use crate::errors::DomainError;
    use crate::pricing::analysis::{analyze_competitors, CompetitorAnalysis};
    use crate::pricing::narrative::RISK_HIGH_INVENTORY;

    fn competitor(name: &str, price: f64, quality: QualityTier) -> CompetitorObservation {
        CompetitorObservation {
            competitor: name.to_string(),
            price,
            region: "Екатеринбург".to_string(),
            availability: "в наличии".to_string(),
            quality,
            delivery_days: 7,
        }
    }

    fn context(cost_base: f64, margin_target: f64) -> PricingContext {
        PricingContext {
            product_type: "Труба б/ш".to_string(),
            steel_grade: "20".to_string(),
            diameter: "159".to_string(),
            region: "Екатеринбург".to_string(),
            current_inventory: 50.0,
            demand_level: DemandLevel::Medium,
            seasonality: 0.0,
            cost_base,
            margin_target,
        }
    }

    fn position(role: MarketRole) -> MarketPosition {
        MarketPosition { position: role, market_share: 20.0, brand_strength: 0.8 }
    }

    #[test]
    fn leader_scenario_stays_within_margin_band() {
        let engine = DeterministicPricingEngine::default();
        let competitors = vec![
            competitor("ВТЗ", 76_000.0, QualityTier::Standard),
            competitor("ТМК", 78_000.0, QualityTier::Premium),
        ];
        let context = context(60_000.0, 20.0);

        let analysis = analyze_competitors(&competitors, context.cost_base);
        assert_eq!(analysis.average_price, 77_000.0);
        assert!(
            (competitor_based_price(&analysis, MarketRole::Leader) - 80_850.0).abs() < 1e-6
        );

        let recommendation = engine
            .generate_recommendation(&competitors, &position(MarketRole::Leader), &context)
            .expect("leader scenario should produce a recommendation");

        assert!((recommendation.current_price - 72_000.0).abs() < 1e-9);
        assert!(recommendation.recommended_price >= 63_000.0);
        assert!(recommendation.recommended_price <= 120_000.0);
        // 77_040 blended * 1.05 leader premium * (1 + 0.05 * 1000/77000) volatility
        assert!((recommendation.recommended_price - 80_944.5).abs() < 0.1);
        assert_eq!(recommendation.recommendation, RecommendationKind::Increase);
        assert!((recommendation.confidence - 0.75).abs() < 1e-9);
        assert!(
            (recommendation.price_change - (recommendation.recommended_price - 72_000.0)).abs()
                < 1e-9
        );
    }

    #[test]
    fn niche_without_competitors_uses_fallback_anchors() {
        let engine = DeterministicPricingEngine::default();
        let context = context(50_000.0, 25.0);

        let analysis = analyze_competitors(&[], context.cost_base);
        assert_eq!(analysis.average_price, 60_000.0);
        assert_eq!(analysis.median_price, 60_000.0);

        let recommendation = engine
            .generate_recommendation(&[], &position(MarketRole::Niche), &context)
            .expect("empty market should not fail");

        assert!(recommendation.recommended_price >= 52_500.0);
        assert!(recommendation.recommended_price <= 100_000.0);
        assert!(!recommendation
            .reasoning
            .iter()
            .any(|line| line.starts_with("Analysis of") || line.starts_with("Market leader")));
    }

    #[test]
    fn extreme_inputs_are_clamped_to_margin_band() {
        let engine = DeterministicPricingEngine::default();
        let cheap = vec![competitor("Демпинг", 1.0, QualityTier::Standard)];
        let pricey = vec![competitor("Эксклюзив", 10_000_000.0, QualityTier::Premium)];

        let mut low = context(40_000.0, 0.0);
        low.demand_level = DemandLevel::Low;
        low.seasonality = -1.0;
        let mut high = context(40_000.0, 100.0);
        high.demand_level = DemandLevel::High;
        high.seasonality = 1.0;

        let floor = engine
            .generate_recommendation(&cheap, &position(MarketRole::Challenger), &low)
            .expect("cheap market should still price");
        let ceiling = engine
            .generate_recommendation(&pricey, &position(MarketRole::Niche), &high)
            .expect("expensive market should still price");

        assert_eq!(floor.recommended_price, 42_000.0);
        assert_eq!(ceiling.recommended_price, 80_000.0);
        assert!(floor.confidence >= 0.10 && floor.confidence <= 0.95);
        assert!(ceiling.confidence >= 0.10 && ceiling.confidence <= 0.95);
    }

    #[test]
    fn follower_tracks_leader_and_challenger_undercuts_it() {
        let competitors = vec![
            competitor("Бюджет", 50_000.0, QualityTier::Budget),
            competitor("ВТЗ", 70_000.0, QualityTier::Standard),
            competitor("ТМК", 90_000.0, QualityTier::Premium),
        ];
        let analysis = analyze_competitors(&competitors, 55_000.0);

        assert!((competitor_based_price(&analysis, MarketRole::Follower) - 71_400.0).abs() < 1e-6);
        assert!(
            (competitor_based_price(&analysis, MarketRole::Challenger) - 68_600.0).abs() < 1e-6
        );
        assert!((competitor_based_price(&analysis, MarketRole::Niche) - 77_000.0).abs() < 1e-6);
        assert_eq!(competitor_based_price(&analysis, MarketRole::Unrecognized), 70_000.0);
    }

    #[test]
    fn leaderless_market_uses_average_for_follower_and_challenger() {
        let analysis = CompetitorAnalysis::fallback(50_000.0);

        assert_eq!(competitor_based_price(&analysis, MarketRole::Follower), 60_000.0);
        assert!((competitor_based_price(&analysis, MarketRole::Challenger) - 57_000.0).abs() < 1e-6);
    }

    #[test]
    fn optimal_price_applies_multipliers_after_blend() {
        let analysis = CompetitorAnalysis::fallback(50_000.0);
        let mut context = context(50_000.0, 20.0);
        context.demand_level = DemandLevel::High;
        context.seasonality = 0.5;

        let price = optimal_price(
            &analysis,
            &context,
            &position(MarketRole::Follower),
            &BlendWeights::default(),
        );

        // every anchor is 60_000, so the blend is 60_000
        assert!((price - 60_000.0 * 1.05 * 1.05).abs() < 1e-6);
    }

    #[test]
    fn classification_uses_two_and_ten_percent_bands() {
        assert_eq!(
            classify(100.0, 101.9),
            Classification {
                kind: RecommendationKind::Maintain,
                strength: RecommendationStrength::Weak
            }
        );
        assert_eq!(classify(100.0, 98.5).kind, RecommendationKind::Maintain);
        assert_eq!(
            classify(100.0, 105.0),
            Classification {
                kind: RecommendationKind::Increase,
                strength: RecommendationStrength::Moderate
            }
        );
        assert_eq!(
            classify(100.0, 85.0),
            Classification {
                kind: RecommendationKind::Decrease,
                strength: RecommendationStrength::Strong
            }
        );
        assert_eq!(classify(100.0, 110.0).strength, RecommendationStrength::Moderate);
    }

    #[test]
    fn impact_includes_cross_term_and_rounds() {
        let impact = expected_impact(10.0, 1.5, 20.0);

        assert_eq!(impact.volume_change_percent, -15.0);
        assert_eq!(impact.revenue_change_percent, -6.5);
        assert_eq!(impact.market_share_change_percent, -3.0);

        let small = expected_impact(1.234, 1.0, 10.0);
        assert_eq!(small.volume_change_percent, -1.2);
        assert_eq!(small.market_share_change_percent, -0.1);
    }

    #[test]
    fn rounding_is_half_up() {
        assert_eq!(round_one_decimal(2.25), 2.3);
        assert_eq!(round_one_decimal(-2.25), -2.2);
        assert_eq!(round_one_decimal(-0.04), 0.0);
    }

    #[test]
    fn priority_thresholds() {
        let impact = |revenue: f64, share: f64| ExpectedImpact {
            volume_change_percent: 0.0,
            revenue_change_percent: revenue,
            market_share_change_percent: share,
        };

        assert_eq!(implementation_priority(&impact(-10.5, 0.0)), ImplementationPriority::High);
        assert_eq!(implementation_priority(&impact(0.0, 5.5)), ImplementationPriority::High);
        assert_eq!(implementation_priority(&impact(6.0, 0.0)), ImplementationPriority::Medium);
        assert_eq!(implementation_priority(&impact(1.0, 2.5)), ImplementationPriority::Medium);
        assert_eq!(implementation_priority(&impact(5.0, -9.0)), ImplementationPriority::Low);
    }

    #[test]
    fn confidence_accumulates_and_is_clamped() {
        let mut analysis = CompetitorAnalysis::fallback(50_000.0);
        let strong = Classification {
            kind: RecommendationKind::Increase,
            strength: RecommendationStrength::Strong,
        };
        let weak =
            Classification { kind: RecommendationKind::Maintain, strength: RecommendationStrength::Weak };

        assert!((confidence(&analysis, weak) - 0.65).abs() < 1e-9);

        analysis.competitor_count = 6;
        assert!((confidence(&analysis, strong) - 0.95).abs() < 1e-9);

        analysis.competitor_count = 3;
        analysis.price_volatility = 0.15;
        assert!((confidence(&analysis, weak) - 0.7).abs() < 1e-9);

        analysis.competitor_count = 0;
        analysis.price_volatility = 0.5;
        assert!((confidence(&analysis, weak) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn small_gap_is_maintained() {
        let engine = DeterministicPricingEngine::default();
        // follower anchored on a leader priced just under the 72_000 cost-plus baseline
        let competitors = vec![competitor("ВТЗ", 72_000.0 / 1.02, QualityTier::Standard)];
        let mut context = context(60_000.0, 20.0);
        context.product_type = "Труба ВГП".to_string();

        let recommendation = engine
            .generate_recommendation(&competitors, &position(MarketRole::Follower), &context)
            .expect("recommendation should be produced");

        let gap = (recommendation.recommended_price - recommendation.current_price).abs()
            / recommendation.current_price;
        assert!(gap < 0.02);
        assert_eq!(recommendation.recommendation, RecommendationKind::Maintain);
        assert_eq!(recommendation.implementation_priority, ImplementationPriority::Low);
        assert_eq!(recommendation.timeframe, Timeframe::MediumTerm);
    }

    #[test]
    fn high_inventory_is_flagged() {
        let engine = DeterministicPricingEngine::default();
        let mut context = context(60_000.0, 20.0);
        context.current_inventory = 1500.0;

        let recommendation = engine
            .generate_recommendation(&[], &position(MarketRole::Follower), &context)
            .expect("recommendation should be produced");

        assert!(recommendation.risks.iter().any(|risk| risk == RISK_HIGH_INVENTORY));
    }

    #[test]
    fn custom_weights_change_the_blend() {
        let competitors = vec![
            competitor("ВТЗ", 100_000.0, QualityTier::Standard),
            competitor("ТМК", 100_000.0, QualityTier::Premium),
        ];
        let context = context(60_000.0, 20.0);
        let follower = position(MarketRole::Follower);

        let cost_only = DeterministicPricingEngine::default().with_weights(BlendWeights {
            cost_based: 1.0,
            competitor_based: 0.0,
            average_price: 0.0,
            median_price: 0.0,
        });
        let pinned = cost_only
            .generate_recommendation(&competitors, &follower, &context)
            .expect("recommendation should be produced");
        let blended = DeterministicPricingEngine::default()
            .generate_recommendation(&competitors, &follower, &context)
            .expect("recommendation should be produced");

        // identical competitor prices leave volatility at zero, so only the blend moves
        assert!((pinned.recommended_price - 72_000.0).abs() < 1e-6);
        assert_eq!(pinned.recommendation, RecommendationKind::Maintain);
        assert!((blended.recommended_price - 92_400.0).abs() < 1e-6);
        assert_eq!(blended.recommendation, RecommendationKind::Increase);
    }

    #[test]
    fn invalid_cost_inputs_fail_fast() {
        let engine = DeterministicPricingEngine::default();

        let error = engine
            .generate_recommendation(&[], &position(MarketRole::Leader), &context(f64::NAN, 20.0))
            .expect_err("NaN cost base must be rejected");
        assert!(matches!(error, DomainError::NonFiniteCostBase(_)));

        let error = engine
            .generate_recommendation(&[], &position(MarketRole::Leader), &context(0.0, 20.0))
            .expect_err("zero current price must be rejected");
        assert_eq!(error, DomainError::NonPositiveCurrentPrice(0.0));

        let error = engine
            .generate_recommendation(&[], &position(MarketRole::Leader), &context(60_000.0, -100.0))
            .expect_err("margin wiping out the price must be rejected");
        assert!(matches!(error, DomainError::NonPositiveCurrentPrice(_)));
    }
}
