//! Competitor analysis stage.
//!
//! Reduces the raw competitor observations to the aggregates the optimal
//! price calculation consumes. Observations without a positive price are
//! ignored here; with nothing valid left the summary falls back to
//! cost-derived anchors so later stages never see an empty market.

use serde::{Deserialize, Serialize};

use crate::domain::competitor::CompetitorObservation;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompetitorAnalysis {
    pub average_price: f64,
    pub median_price: f64,
    pub price_range: PriceRange,
    pub competitor_count: usize,
    /// Cheapest premium or standard competitor.
    pub market_leader: Option<CompetitorObservation>,
    /// Coefficient of variation of valid prices.
    pub price_volatility: f64,
}

impl CompetitorAnalysis {
    /// Summary used when no competitor reported a usable price.
    pub fn fallback(cost_base: f64) -> Self {
        Self {
            average_price: cost_base * 1.2,
            median_price: cost_base * 1.2,
            price_range: PriceRange { min: cost_base, max: cost_base * 1.5 },
            competitor_count: 0,
            market_leader: None,
            price_volatility: 0.0,
        }
    }
}

pub fn analyze_competitors(
    observations: &[CompetitorObservation],
    cost_base: f64,
) -> CompetitorAnalysis {
    let valid: Vec<&CompetitorObservation> =
        observations.iter().filter(|observation| observation.has_valid_price()).collect();

    if valid.is_empty() {
        return CompetitorAnalysis::fallback(cost_base);
    }

    let prices: Vec<f64> = valid.iter().map(|observation| observation.price).collect();
    let average_price = mean(&prices);
    let min = prices.iter().copied().fold(f64::INFINITY, f64::min);
    let max = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let market_leader = valid
        .iter()
        .filter(|observation| observation.quality.can_lead_market())
        .min_by(|left, right| left.price.total_cmp(&right.price))
        .map(|observation| (*observation).clone());

    CompetitorAnalysis {
        average_price,
        median_price: median(&prices),
        price_range: PriceRange { min, max },
        competitor_count: valid.len(),
        market_leader,
        price_volatility: volatility(&prices),
    }
}

/// Standard median; averages the two middle values for an even count.
/// Returns 0.0 for an empty slice.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;

    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Population standard deviation divided by the mean.
pub fn volatility(values: &[f64]) -> f64 {
    let average = mean(values);
    if values.is_empty() || average == 0.0 {
        return 0.0;
    }

    let variance =
        values.iter().map(|value| (value - average).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt() / average
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
