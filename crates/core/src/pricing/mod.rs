//! Pricing recommendation engine.
//!
//! Stages run in a fixed order over immutable inputs: competitor analysis,
//! optimal price, classification, impact projection, reasoning and risks,
//! confidence.

pub mod analysis;
pub mod engine;
pub mod narrative;
pub mod tiers;

pub use analysis::{analyze_competitors, CompetitorAnalysis, PriceRange};
pub use engine::{BlendWeights, DeterministicPricingEngine, PricingEngine};
pub use tiers::{ProductTier, ProductTierTable};
