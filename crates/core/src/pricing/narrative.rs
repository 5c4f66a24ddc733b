//! Human-readable reasoning and risk lines.
//!
//! Order matters: consumers render the lists as-is.

use crate::domain::context::{DemandLevel, PricingContext};
use crate::domain::market::{MarketPosition, MarketRole};
use crate::domain::recommendation::{ExpectedImpact, RecommendationKind};
use crate::pricing::analysis::CompetitorAnalysis;

const HIGH_SEASON_THRESHOLD: f64 = 0.3;
const LOW_SEASON_THRESHOLD: f64 = -0.3;
const CUSTOMER_LOSS_VOLUME_DROP: f64 = -15.0;
const MARGIN_RISK_REVENUE_DROP: f64 = -5.0;
const SHARE_LOSS_DROP: f64 = -2.0;
const HIGH_INVENTORY_TONS: f64 = 1000.0;

pub const RISK_CUSTOMER_LOSS: &str =
    "Significant volume decline after the increase may cost key customers";
pub const RISK_MARGIN_PRESSURE: &str = "Price cut may erode margin more than volume recovers";
pub const RISK_SHARE_LOSS: &str = "Risk of losing market share";
pub const RISK_HIGH_INVENTORY: &str = "High inventory calls for a cautious pricing approach";

pub fn generate_reasoning(
    analysis: &CompetitorAnalysis,
    context: &PricingContext,
    market_position: &MarketPosition,
) -> Vec<String> {
    let mut reasoning = Vec::new();

    if analysis.competitor_count > 0 {
        reasoning.push(format!(
            "Analysis of {} competitors shows an average market price of {} RUB/t",
            analysis.competitor_count,
            format_price(analysis.average_price)
        ));
    }

    if let Some(leader) = &analysis.market_leader {
        reasoning.push(format!(
            "Market leader {} offers {} RUB/t",
            leader.competitor,
            format_price(leader.price)
        ));
    }

    match context.demand_level {
        DemandLevel::High => reasoning.push("High demand supports a price increase".to_string()),
        DemandLevel::Low => {
            reasoning.push("Low demand calls for a lower price to stimulate sales".to_string())
        }
        DemandLevel::Medium | DemandLevel::Unrecognized => {}
    }

    if context.seasonality > HIGH_SEASON_THRESHOLD {
        reasoning.push("Seasonal demand growth supports higher prices".to_string());
    } else if context.seasonality < LOW_SEASON_THRESHOLD {
        reasoning.push("Seasonal demand decline calls for a price correction".to_string());
    }

    match market_position.position {
        MarketRole::Leader => {
            reasoning.push("Leadership position allows premium pricing".to_string())
        }
        MarketRole::Challenger => {
            reasoning.push("Challenger position requires aggressive pricing".to_string())
        }
        MarketRole::Follower | MarketRole::Niche | MarketRole::Unrecognized => {}
    }

    reasoning
}

pub fn assess_risks(
    kind: RecommendationKind,
    impact: &ExpectedImpact,
    context: &PricingContext,
) -> Vec<String> {
    let mut risks = Vec::new();

    if kind == RecommendationKind::Increase
        && impact.volume_change_percent < CUSTOMER_LOSS_VOLUME_DROP
    {
        risks.push(RISK_CUSTOMER_LOSS.to_string());
    }

    if kind == RecommendationKind::Decrease
        && impact.revenue_change_percent < MARGIN_RISK_REVENUE_DROP
    {
        risks.push(RISK_MARGIN_PRESSURE.to_string());
    }

    if impact.market_share_change_percent < SHARE_LOSS_DROP {
        risks.push(RISK_SHARE_LOSS.to_string());
    }

    if context.current_inventory > HIGH_INVENTORY_TONS {
        risks.push(RISK_HIGH_INVENTORY.to_string());
    }

    risks
}

/// Whole currency units grouped by thousands, e.g. `77 000`.
fn format_price(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{}", rounded.abs() as u64);
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(digit);
    }

    if rounded < 0.0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}
