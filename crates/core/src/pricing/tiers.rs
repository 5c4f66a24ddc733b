//! Product-type tiers.
//!
//! Maps free-text product types onto elasticity and margin-target values via
//! case-insensitive substring patterns. The first matching tier wins, so
//! more specific patterns belong earlier in the table.
//!
//! Elasticity may use a narrower pattern than the margin target: fittings
//! such as "Отвод б/ш" take the seamless margin but keep the default
//! elasticity, since only pipe itself is tiered for volume response.

use serde::{Deserialize, Serialize};

pub const DEFAULT_ELASTICITY: f64 = 1.0;
pub const DEFAULT_MARGIN_TARGET: f64 = 20.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductTier {
    /// Stable identifier, e.g. `seamless`.
    pub code: String,
    /// Substring looked up in the product type, compared case-insensitively.
    pub pattern: String,
    pub elasticity: f64,
    /// Percent.
    pub margin_target: f64,
    /// Narrower substring for the elasticity lookup; `pattern` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elasticity_pattern: Option<String>,
}

impl ProductTier {
    pub fn new(
        code: impl Into<String>,
        pattern: impl Into<String>,
        elasticity: f64,
        margin_target: f64,
    ) -> Self {
        Self {
            code: code.into(),
            pattern: pattern.into(),
            elasticity,
            margin_target,
            elasticity_pattern: None,
        }
    }

    pub fn with_elasticity_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.elasticity_pattern = Some(pattern.into());
        self
    }

    fn matches(&self, normalized_product_type: &str) -> bool {
        contains_pattern(normalized_product_type, &self.pattern)
    }

    fn matches_elasticity(&self, normalized_product_type: &str) -> bool {
        let pattern = self.elasticity_pattern.as_deref().unwrap_or(&self.pattern);
        contains_pattern(normalized_product_type, pattern)
    }
}

fn contains_pattern(normalized_product_type: &str, pattern: &str) -> bool {
    let pattern = pattern.trim().to_lowercase();
    !pattern.is_empty() && normalized_product_type.contains(&pattern)
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductTierTable {
    pub tiers: Vec<ProductTier>,
    pub default_elasticity: f64,
    pub default_margin_target: f64,
}

impl Default for ProductTierTable {
    fn default() -> Self {
        Self {
            tiers: vec![
                ProductTier::new("seamless", "б/ш", 0.8, 25.0)
                    .with_elasticity_pattern("труба б/ш"),
                ProductTier::new("electric_welded", "э/с", 1.2, 20.0)
                    .with_elasticity_pattern("труба э/с"),
                ProductTier::new("water_gas", "вгп", 1.5, 15.0)
                    .with_elasticity_pattern("труба вгп"),
            ],
            default_elasticity: DEFAULT_ELASTICITY,
            default_margin_target: DEFAULT_MARGIN_TARGET,
        }
    }
}

impl ProductTierTable {
    pub fn new(tiers: Vec<ProductTier>) -> Self {
        Self { tiers, ..Self::default() }
    }

    pub fn classify(&self, product_type: &str) -> Option<&ProductTier> {
        let normalized = product_type.to_lowercase();
        self.tiers.iter().find(|tier| tier.matches(&normalized))
    }

    pub fn elasticity_for(&self, product_type: &str) -> f64 {
        let normalized = product_type.to_lowercase();
        self.tiers
            .iter()
            .find(|tier| tier.matches_elasticity(&normalized))
            .map_or(self.default_elasticity, |tier| tier.elasticity)
    }

    pub fn margin_target_for(&self, product_type: &str) -> f64 {
        self.classify(product_type).map_or(self.default_margin_target, |tier| tier.margin_target)
    }
}
