use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use tubeprice_core::bulk::{recommend_bulk, BulkItem, BulkReport};
use tubeprice_core::config::{AppConfig, LoadOptions};
use tubeprice_core::domain::market::MarketPosition;
use tubeprice_core::errors::ApplicationError;
use tubeprice_core::factory::{seasonality_for_month, RecommendationFactory};
use tubeprice_core::gateway::{
    InMemoryPriceUpdateGateway, PriceUpdate, PriceUpdateGateway, PriceUpdateReceipt,
};
use tubeprice_core::pricing::DeterministicPricingEngine;

use crate::commands::{CommandResult, EXIT_CONFIG, EXIT_GATEWAY, EXIT_INPUT};

const COMMAND: &str = "recommend";

#[derive(Debug, Clone, Default)]
pub struct RecommendArgs {
    pub input: PathBuf,
    /// Calendar month 1..=12; the current UTC month when absent.
    pub month: Option<u32>,
    pub apply: bool,
    pub config_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct RecommendInput {
    market_position: MarketPosition,
    #[serde(default)]
    products: Vec<BulkItem>,
}

#[derive(Debug, Serialize)]
struct RecommendOutput {
    report: BulkReport,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    receipts: Vec<PriceUpdateReceipt>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    not_applied: Vec<NotApplied>,
}

#[derive(Debug, Default)]
struct ApplyOutcome {
    receipts: Vec<PriceUpdateReceipt>,
    not_applied: Vec<NotApplied>,
}

#[derive(Debug, Serialize)]
struct NotApplied {
    product_id: String,
    reason: String,
}

pub fn run(args: RecommendArgs) -> CommandResult {
    let config = match AppConfig::load(LoadOptions {
        require_file: args.config_path.is_some(),
        config_path: args.config_path.clone(),
        ..LoadOptions::default()
    }) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "config_validation",
                format!("configuration issue: {error}"),
                EXIT_CONFIG,
            );
        }
    };

    let as_of_month = args.month.unwrap_or_else(|| Utc::now().month());
    if let Err(error) = seasonality_for_month(as_of_month) {
        return CommandResult::failure(COMMAND, "input_validation", error.to_string(), EXIT_INPUT);
    }

    let input = match read_input(&args.input) {
        Ok(input) => input,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "input_validation",
                format!("{error:#}"),
                EXIT_INPUT,
            );
        }
    };

    let factory = RecommendationFactory::new(config.factory.clone(), config.engine.clone());
    let engine = DeterministicPricingEngine::new(config.engine);
    let report =
        recommend_bulk(&factory, &engine, &input.products, &input.market_position, as_of_month);

    let applied = if args.apply {
        match apply_price_changes(&report) {
            Ok(applied) => applied,
            Err((error_class, message)) => {
                return CommandResult::failure(COMMAND, error_class, message, EXIT_GATEWAY);
            }
        }
    } else {
        ApplyOutcome::default()
    };

    let message = format!(
        "{} recommended, {} skipped, {} applied, {} not applied",
        report.summary.total,
        report.summary.skipped,
        applied.receipts.len(),
        applied.not_applied.len()
    );
    CommandResult::success_with_data(
        COMMAND,
        message,
        &RecommendOutput { report, receipts: applied.receipts, not_applied: applied.not_applied },
    )
}

fn read_input(path: &Path) -> anyhow::Result<RecommendInput> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read input file `{}`", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse input file `{}`", path.display()))
}

/// Records without an upstream id are reported, never applied: their label is
/// a product type shared by unrelated products.
fn apply_price_changes(report: &BulkReport) -> Result<ApplyOutcome, (&'static str, String)> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| {
            ("runtime_init", format!("failed to initialize async runtime: {error}"))
        })?;
    let gateway = InMemoryPriceUpdateGateway::default();
    let (addressable, unidentified) = report.price_changes();

    let receipts = runtime.block_on(async {
        let mut receipts = Vec::with_capacity(addressable.len());
        for (product_id, recommendation) in addressable {
            let update = PriceUpdate::from_recommendation(product_id, recommendation)?;
            let receipt = gateway.apply(&update).await?;
            receipts.push(receipt);
        }
        Ok::<_, ApplicationError>(receipts)
    });
    let receipts = receipts.map_err(|error| (error.error_class(), error.to_string()))?;

    let not_applied = unidentified
        .into_iter()
        .map(|label| NotApplied {
            product_id: label.to_string(),
            reason: "record has no product id".to_string(),
        })
        .collect();

    Ok(ApplyOutcome { receipts, not_applied })
}
