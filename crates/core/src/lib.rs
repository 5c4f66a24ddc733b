pub mod bulk;
pub mod config;
pub mod domain;
pub mod errors;
pub mod factory;
pub mod gateway;
pub mod pricing;

pub use bulk::{recommend_bulk, BulkEntry, BulkItem, BulkOutcome, BulkReport, RecommendationSummary};
pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use domain::competitor::{CompetitorObservation, QualityTier};
pub use domain::context::{DemandLevel, PricingContext};
pub use domain::market::{MarketPosition, MarketRole};
pub use domain::recommendation::{
    ExpectedImpact, ImplementationPriority, PricingRecommendation, RecommendationKind,
    RecommendationStrength, Timeframe,
};
pub use errors::{ApplicationError, DomainError};
pub use factory::{FactorySettings, ProductRecord, RecommendationFactory};
pub use gateway::{InMemoryPriceUpdateGateway, PriceUpdate, PriceUpdateGateway, PriceUpdateReceipt};
pub use pricing::{DeterministicPricingEngine, PricingEngine, ProductTier, ProductTierTable};
