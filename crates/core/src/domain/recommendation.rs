use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    Increase,
    Decrease,
    Maintain,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationStrength {
    Weak,
    Moderate,
    Strong,
}

/// Outcome of comparing the cost-plus baseline with the optimal price.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub kind: RecommendationKind,
    pub strength: RecommendationStrength,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImplementationPriority {
    High,
    Medium,
    Low,
}

impl ImplementationPriority {
    pub fn timeframe(&self) -> Timeframe {
        match self {
            Self::High => Timeframe::Immediate,
            Self::Medium => Timeframe::ShortTerm,
            Self::Low => Timeframe::MediumTerm,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timeframe {
    Immediate,
    ShortTerm,
    MediumTerm,
}

/// Projected effect of the price change, each value rounded to one decimal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpectedImpact {
    pub volume_change_percent: f64,
    pub revenue_change_percent: f64,
    pub market_share_change_percent: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PricingRecommendation {
    pub current_price: f64,
    pub recommended_price: f64,
    pub price_change: f64,
    pub price_change_percent: f64,
    pub recommendation: RecommendationKind,
    pub confidence: f64,
    pub reasoning: Vec<String>,
    pub risks: Vec<String>,
    pub expected_impact: ExpectedImpact,
    pub implementation_priority: ImplementationPriority,
    pub timeframe: Timeframe,
}

impl PricingRecommendation {
    pub fn changes_price(&self) -> bool {
        self.recommendation != RecommendationKind::Maintain
    }
}
