use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketRole {
    Leader,
    Follower,
    Challenger,
    Niche,
    #[serde(other)]
    Unrecognized,
}

impl MarketRole {
    pub fn price_multiplier(&self) -> f64 {
        match self {
            Self::Leader => 1.05,
            Self::Challenger => 0.98,
            Self::Follower => 1.00,
            Self::Niche => 1.10,
            Self::Unrecognized => 1.00,
        }
    }
}

impl From<&str> for MarketRole {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "leader" => Self::Leader,
            "follower" => Self::Follower,
            "challenger" => Self::Challenger,
            "niche" => Self::Niche,
            _ => Self::Unrecognized,
        }
    }
}

/// This firm's competitive stance for the product being priced.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketPosition {
    pub position: MarketRole,
    /// Percent of the market, 0-100 expected but not clamped.
    pub market_share: f64,
    #[serde(default)]
    pub brand_strength: f64,
}
