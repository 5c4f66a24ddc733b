//! Boundary for pushing accepted recommendations to the price book.
//!
//! The engine never persists anything; callers that decide to act on a
//! recommendation go through a [`PriceUpdateGateway`] implementation owned by
//! the backend.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::domain::recommendation::PricingRecommendation;
use crate::errors::{ApplicationError, DomainError};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceUpdate {
    pub product_id: String,
    pub new_price: Decimal,
    pub reason: String,
}

impl PriceUpdate {
    pub fn from_recommendation(
        product_id: impl Into<String>,
        recommendation: &PricingRecommendation,
    ) -> Result<Self, DomainError> {
        let new_price = Decimal::from_f64(recommendation.recommended_price)
            .ok_or_else(|| {
                DomainError::InvariantViolation(format!(
                    "recommended price {} is not representable as a decimal",
                    recommendation.recommended_price
                ))
            })?
            .round_dp(2);

        let reason = if recommendation.reasoning.is_empty() {
            format!("{:?} recommendation", recommendation.recommendation).to_lowercase()
        } else {
            recommendation.reasoning.join("; ")
        };

        Ok(Self { product_id: product_id.into(), new_price, reason })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceUpdateReceipt {
    pub receipt_id: Uuid,
    pub product_id: String,
    pub applied_price: Decimal,
    pub applied_at: DateTime<Utc>,
}

#[async_trait]
pub trait PriceUpdateGateway: Send + Sync {
    async fn apply_recommendation(
        &self,
        product_id: &str,
        new_price: Decimal,
        reason: &str,
    ) -> Result<PriceUpdateReceipt, ApplicationError>;

    async fn apply(&self, update: &PriceUpdate) -> Result<PriceUpdateReceipt, ApplicationError> {
        self.apply_recommendation(&update.product_id, update.new_price, &update.reason).await
    }
}

/// Keeps the last applied price per product; used by tests and dry runs.
#[derive(Default)]
pub struct InMemoryPriceUpdateGateway {
    applied: RwLock<HashMap<String, (PriceUpdate, PriceUpdateReceipt)>>,
}

impl InMemoryPriceUpdateGateway {
    pub async fn applied_price(&self, product_id: &str) -> Option<Decimal> {
        let applied = self.applied.read().await;
        applied.get(product_id).map(|(update, _)| update.new_price)
    }

    pub async fn applied_count(&self) -> usize {
        self.applied.read().await.len()
    }
}

#[async_trait]
impl PriceUpdateGateway for InMemoryPriceUpdateGateway {
    async fn apply_recommendation(
        &self,
        product_id: &str,
        new_price: Decimal,
        reason: &str,
    ) -> Result<PriceUpdateReceipt, ApplicationError> {
        if product_id.trim().is_empty() {
            return Err(DomainError::InvariantViolation("product id is required".to_string()).into());
        }
        if new_price <= Decimal::ZERO {
            return Err(DomainError::InvariantViolation(format!(
                "new price must be positive, got {new_price}"
            ))
            .into());
        }

        let receipt = PriceUpdateReceipt {
            receipt_id: Uuid::new_v4(),
            product_id: product_id.to_string(),
            applied_price: new_price,
            applied_at: Utc::now(),
        };
        let update = PriceUpdate {
            product_id: product_id.to_string(),
            new_price,
            reason: reason.to_string(),
        };

        let mut applied = self.applied.write().await;
        applied.insert(product_id.to_string(), (update, receipt.clone()));

        info!(
            event_name = "pricing.gateway.applied",
            product_id = %product_id,
            new_price = %new_price,
            "price update recorded"
        );
        Ok(receipt)
    }
}
