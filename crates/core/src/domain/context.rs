use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DemandLevel {
    High,
    Medium,
    Low,
    #[serde(other)]
    Unrecognized,
}

impl DemandLevel {
    pub fn price_multiplier(&self) -> f64 {
        match self {
            Self::High => 1.05,
            Self::Medium => 1.00,
            Self::Low => 0.95,
            Self::Unrecognized => 1.00,
        }
    }
}

/// Situational parameters of the product being priced.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PricingContext {
    pub product_type: String,
    pub steel_grade: String,
    pub diameter: String,
    pub region: String,
    /// Tons on hand.
    pub current_inventory: f64,
    pub demand_level: DemandLevel,
    /// -1..1, positive values boost demand.
    pub seasonality: f64,
    /// Currency per ton; floor input for every price the engine emits.
    pub cost_base: f64,
    /// Percent, 20.0 means 20%.
    pub margin_target: f64,
}

impl PricingContext {
    /// Cost-plus baseline the recommendation is compared against.
    pub fn cost_plus_price(&self) -> f64 {
        self.cost_base * (1.0 + self.margin_target / 100.0)
    }
}
