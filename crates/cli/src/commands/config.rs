use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use toml::Value;
use tubeprice_core::config::{resolve_config_path, AppConfig, LoadOptions};

use crate::commands::{CommandResult, EXIT_CONFIG};

pub fn run(config_path: Option<PathBuf>) -> CommandResult {
    let config = match AppConfig::load(LoadOptions {
        require_file: config_path.is_some(),
        config_path: config_path.clone(),
        ..LoadOptions::default()
    }) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "config",
                "config_validation",
                format!("config validation failed: {error}"),
                EXIT_CONFIG,
            );
        }
    };

    let config_file_path = resolve_config_path(config_path.as_deref());
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let sources = SourceLookup { doc: config_file_doc.as_ref(), path: config_file_path.as_deref() };

    let tiers = config
        .engine
        .tiers
        .iter()
        .map(|tier| match tier.elasticity_pattern.as_deref() {
            Some(elasticity_pattern) => format!(
                "{}[{}] elasticity={} ({}) margin_target={}",
                tier.code, tier.pattern, tier.elasticity, elasticity_pattern, tier.margin_target
            ),
            None => format!(
                "{}[{}] elasticity={} margin_target={}",
                tier.code, tier.pattern, tier.elasticity, tier.margin_target
            ),
        })
        .collect::<Vec<_>>()
        .join(", ");

    let entries: [(&str, String, &[&str]); 9] = [
        (
            "engine.default_elasticity",
            config.engine.default_elasticity.to_string(),
            &["TUBEPRICE_ENGINE_DEFAULT_ELASTICITY"],
        ),
        (
            "engine.default_margin_target",
            config.engine.default_margin_target.to_string(),
            &["TUBEPRICE_ENGINE_DEFAULT_MARGIN_TARGET"],
        ),
        ("engine.product_tiers", tiers, &[]),
        (
            "factory.default_inventory",
            config.factory.default_inventory.to_string(),
            &["TUBEPRICE_FACTORY_DEFAULT_INVENTORY"],
        ),
        ("factory.cost_ratio", config.factory.cost_ratio.to_string(), &["TUBEPRICE_FACTORY_COST_RATIO"]),
        ("factory.scarcity_keywords", config.factory.scarcity_keywords.join(", "), &[]),
        ("factory.in_stock_keywords", config.factory.in_stock_keywords.join(", "), &[]),
        (
            "logging.level",
            config.logging.level.clone(),
            &["TUBEPRICE_LOGGING_LEVEL", "TUBEPRICE_LOG_LEVEL"],
        ),
        (
            "logging.format",
            format!("{:?}", config.logging.format).to_lowercase(),
            &["TUBEPRICE_LOGGING_FORMAT", "TUBEPRICE_LOG_FORMAT"],
        ),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key_path, value, env_keys) in entries {
        lines.push(render_line(key_path, &value, sources.field_source(key_path, env_keys)));
    }

    CommandResult { exit_code: 0, output: lines.join("\n") }
}

struct SourceLookup<'a> {
    doc: Option<&'a Value>,
    path: Option<&'a Path>,
}

impl SourceLookup<'_> {
    fn field_source(&self, key_path: &str, env_keys: &[&str]) -> String {
        if let Some(env_key) = env_keys
            .iter()
            .find(|key| env::var(key).is_ok_and(|value| !value.trim().is_empty()))
        {
            return format!("env ({env_key})");
        }

        if let Some(doc) = self.doc {
            if contains_path(doc, key_path) {
                let file_path = self
                    .path
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|| "config file".to_string());
                return format!("file ({file_path})");
            }
        }

        "default".to_string()
    }
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
