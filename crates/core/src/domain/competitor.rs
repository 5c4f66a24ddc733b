use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    Premium,
    Standard,
    Budget,
    #[serde(other)]
    Unrecognized,
}

impl QualityTier {
    /// Only premium and standard suppliers can anchor leader-relative pricing.
    pub fn can_lead_market(&self) -> bool {
        matches!(self, Self::Premium | Self::Standard)
    }
}

impl From<&str> for QualityTier {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "premium" => Self::Premium,
            "standard" => Self::Standard,
            "budget" => Self::Budget,
            _ => Self::Unrecognized,
        }
    }
}

/// One externally observed competitor price point, per ton.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompetitorObservation {
    pub competitor: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub availability: String,
    pub quality: QualityTier,
    #[serde(default)]
    pub delivery_days: u32,
}

impl CompetitorObservation {
    /// Missing, non-finite and non-positive prices never enter an aggregate.
    pub fn has_valid_price(&self) -> bool {
        self.price.is_finite() && self.price > 0.0
    }
}
