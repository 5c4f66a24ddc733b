//! Bulk recommendation over many products.
//!
//! Each product is priced independently; a product that cannot be priced is
//! reported as skipped and never aborts the rest of the batch.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::competitor::CompetitorObservation;
use crate::domain::market::MarketPosition;
use crate::domain::recommendation::{
    ImplementationPriority, PricingRecommendation, RecommendationKind,
};
use crate::factory::{ProductRecord, RecommendationFactory};
use crate::pricing::PricingEngine;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BulkItem {
    pub record: ProductRecord,
    #[serde(default)]
    pub competitors: Vec<CompetitorObservation>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BulkOutcome {
    Recommended { recommendation: Box<PricingRecommendation> },
    Skipped { reason: String },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BulkEntry {
    /// Display label; see [`ProductRecord::display_id`].
    pub product_id: String,
    /// Whether `product_id` came from the record rather than a fallback label.
    #[serde(default)]
    pub identified: bool,
    #[serde(flatten)]
    pub outcome: BulkOutcome,
}

impl BulkEntry {
    pub fn recommendation(&self) -> Option<&PricingRecommendation> {
        match &self.outcome {
            BulkOutcome::Recommended { recommendation } => Some(recommendation),
            BulkOutcome::Skipped { .. } => None,
        }
    }
}

/// Dashboard counters over a set of recommendations.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendationSummary {
    pub total: usize,
    pub increase: usize,
    pub decrease: usize,
    pub maintain: usize,
    pub high_priority: usize,
    pub skipped: usize,
    pub average_confidence: f64,
}

impl RecommendationSummary {
    pub fn from_recommendations<'a, I>(recommendations: I) -> Self
    where
        I: IntoIterator<Item = &'a PricingRecommendation>,
    {
        let mut summary = Self::default();
        let mut confidence_sum: f64 = 0.0;

        for recommendation in recommendations {
            summary.total += 1;
            confidence_sum += recommendation.confidence;
            match recommendation.recommendation {
                RecommendationKind::Increase => summary.increase += 1,
                RecommendationKind::Decrease => summary.decrease += 1,
                RecommendationKind::Maintain => summary.maintain += 1,
            }
            if recommendation.implementation_priority == ImplementationPriority::High {
                summary.high_priority += 1;
            }
        }

        if summary.total > 0 {
            summary.average_confidence = confidence_sum / summary.total as f64;
        }
        summary
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BulkReport {
    pub as_of_month: u32,
    pub entries: Vec<BulkEntry>,
    pub summary: RecommendationSummary,
}

impl BulkReport {
    pub fn recommendations(&self) -> impl Iterator<Item = (&str, &PricingRecommendation)> {
        self.entries.iter().filter_map(|entry| {
            entry.recommendation().map(|recommendation| (entry.product_id.as_str(), recommendation))
        })
    }

    /// Recommendations that change the price, split into those addressable by
    /// product id and the labels of those that are not.
    pub fn price_changes(&self) -> (Vec<(&str, &PricingRecommendation)>, Vec<&str>) {
        let mut addressable = Vec::new();
        let mut unidentified = Vec::new();

        for entry in &self.entries {
            let Some(recommendation) = entry.recommendation() else {
                continue;
            };
            if !recommendation.changes_price() {
                continue;
            }
            if entry.identified {
                addressable.push((entry.product_id.as_str(), recommendation));
            } else {
                unidentified.push(entry.product_id.as_str());
            }
        }

        (addressable, unidentified)
    }
}

pub fn recommend_bulk<E: PricingEngine + ?Sized>(
    factory: &RecommendationFactory,
    engine: &E,
    items: &[BulkItem],
    market_position: &MarketPosition,
    as_of_month: u32,
) -> BulkReport {
    let entries: Vec<BulkEntry> = items
        .iter()
        .map(|item| {
            let product_id = item.record.display_id();
            let outcome = match factory.recommend(
                engine,
                &item.record,
                &item.competitors,
                market_position,
                as_of_month,
            ) {
                Ok(recommendation) => {
                    BulkOutcome::Recommended { recommendation: Box::new(recommendation) }
                }
                Err(error) => {
                    warn!(
                        event_name = "pricing.bulk.item_skipped",
                        product_id = %product_id,
                        error = %error,
                        "product skipped during bulk recommendation"
                    );
                    BulkOutcome::Skipped { reason: error.to_string() }
                }
            };
            BulkEntry { product_id, identified: item.record.explicit_id().is_some(), outcome }
        })
        .collect();

    let mut summary =
        RecommendationSummary::from_recommendations(entries.iter().filter_map(BulkEntry::recommendation));
    summary.skipped = entries.len() - summary.total;

    info!(
        event_name = "pricing.bulk.completed",
        products = entries.len(),
        recommended = summary.total,
        skipped = summary.skipped,
        "bulk recommendation completed"
    );

    BulkReport { as_of_month, entries, summary }
}
