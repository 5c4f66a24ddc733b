use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::factory::FactorySettings;
use crate::pricing::{ProductTier, ProductTierTable};

pub const DEFAULT_CONFIG_FILE: &str = "tubeprice.toml";
pub const NESTED_CONFIG_FILE: &str = "config/tubeprice.toml";

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub engine: ProductTierTable,
    pub factory: FactorySettings,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    pub default_inventory: Option<f64>,
    pub cost_ratio: Option<f64>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            engine: ProductTierTable::default(),
            factory: FactorySettings::default(),
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(engine) = patch.engine {
            if let Some(default_elasticity) = engine.default_elasticity {
                self.engine.default_elasticity = default_elasticity;
            }
            if let Some(default_margin_target) = engine.default_margin_target {
                self.engine.default_margin_target = default_margin_target;
            }
            if let Some(product_tiers) = engine.product_tiers {
                self.engine.tiers = product_tiers;
            }
        }

        if let Some(factory) = patch.factory {
            if let Some(default_inventory) = factory.default_inventory {
                self.factory.default_inventory = default_inventory;
            }
            if let Some(cost_ratio) = factory.cost_ratio {
                self.factory.cost_ratio = cost_ratio;
            }
            if let Some(scarcity_keywords) = factory.scarcity_keywords {
                self.factory.scarcity_keywords = scarcity_keywords;
            }
            if let Some(in_stock_keywords) = factory.in_stock_keywords {
                self.factory.in_stock_keywords = in_stock_keywords;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("TUBEPRICE_ENGINE_DEFAULT_ELASTICITY") {
            self.engine.default_elasticity =
                parse_f64("TUBEPRICE_ENGINE_DEFAULT_ELASTICITY", &value)?;
        }
        if let Some(value) = read_env("TUBEPRICE_ENGINE_DEFAULT_MARGIN_TARGET") {
            self.engine.default_margin_target =
                parse_f64("TUBEPRICE_ENGINE_DEFAULT_MARGIN_TARGET", &value)?;
        }

        if let Some(value) = read_env("TUBEPRICE_FACTORY_DEFAULT_INVENTORY") {
            self.factory.default_inventory =
                parse_f64("TUBEPRICE_FACTORY_DEFAULT_INVENTORY", &value)?;
        }
        if let Some(value) = read_env("TUBEPRICE_FACTORY_COST_RATIO") {
            self.factory.cost_ratio = parse_f64("TUBEPRICE_FACTORY_COST_RATIO", &value)?;
        }

        let log_level =
            read_env("TUBEPRICE_LOGGING_LEVEL").or_else(|| read_env("TUBEPRICE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("TUBEPRICE_LOGGING_FORMAT").or_else(|| read_env("TUBEPRICE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
        if let Some(default_inventory) = overrides.default_inventory {
            self.factory.default_inventory = default_inventory;
        }
        if let Some(cost_ratio) = overrides.cost_ratio {
            self.factory.cost_ratio = cost_ratio;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_engine(&self.engine)?;
        validate_factory(&self.factory)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from(NESTED_CONFIG_FILE)]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_engine(engine: &ProductTierTable) -> Result<(), ConfigError> {
    validate_elasticity("engine.default_elasticity", engine.default_elasticity)?;
    validate_margin_target("engine.default_margin_target", engine.default_margin_target)?;

    let mut seen_codes = HashSet::new();
    for tier in &engine.tiers {
        validate_tier(tier)?;
        if !seen_codes.insert(tier.code.trim().to_ascii_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "engine.product_tiers contains duplicate code `{}`",
                tier.code
            )));
        }
    }

    Ok(())
}

fn validate_tier(tier: &ProductTier) -> Result<(), ConfigError> {
    if tier.code.trim().is_empty() {
        return Err(ConfigError::Validation(
            "engine.product_tiers[].code must not be empty".to_string(),
        ));
    }
    if tier.pattern.trim().is_empty() {
        return Err(ConfigError::Validation(format!(
            "engine.product_tiers[{}].pattern must not be empty",
            tier.code
        )));
    }
    if tier.elasticity_pattern.as_deref().is_some_and(|pattern| pattern.trim().is_empty()) {
        return Err(ConfigError::Validation(format!(
            "engine.product_tiers[{}].elasticity_pattern must not be empty when set",
            tier.code
        )));
    }
    validate_elasticity(&format!("engine.product_tiers[{}].elasticity", tier.code), tier.elasticity)?;
    validate_margin_target(
        &format!("engine.product_tiers[{}].margin_target", tier.code),
        tier.margin_target,
    )
}

fn validate_elasticity(key: &str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ConfigError::Validation(format!(
            "{key} must be a positive finite number"
        )));
    }
    Ok(())
}

fn validate_margin_target(key: &str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value <= -100.0 {
        return Err(ConfigError::Validation(format!(
            "{key} must be a finite percentage greater than -100"
        )));
    }
    Ok(())
}

fn validate_factory(factory: &FactorySettings) -> Result<(), ConfigError> {
    if !factory.default_inventory.is_finite() || factory.default_inventory < 0.0 {
        return Err(ConfigError::Validation(
            "factory.default_inventory must be a non-negative number of tons".to_string(),
        ));
    }

    if !factory.cost_ratio.is_finite() || factory.cost_ratio <= 0.0 || factory.cost_ratio > 1.0 {
        return Err(ConfigError::Validation(
            "factory.cost_ratio must be in range (0, 1]".to_string(),
        ));
    }

    if factory.scarcity_keywords.iter().all(|keyword| keyword.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "factory.scarcity_keywords must contain at least one keyword".to_string(),
        ));
    }
    if factory.in_stock_keywords.iter().all(|keyword| keyword.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "factory.in_stock_keywords must contain at least one keyword".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_f64(key: &str, value: &str) -> Result<f64, ConfigError> {
    value.trim().parse::<f64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    engine: Option<EnginePatch>,
    factory: Option<FactoryPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct EnginePatch {
    default_elasticity: Option<f64>,
    default_margin_target: Option<f64>,
    product_tiers: Option<Vec<ProductTier>>,
}

#[derive(Debug, Default, Deserialize)]
struct FactoryPatch {
    default_inventory: Option<f64>,
    cost_ratio: Option<f64>,
    scarcity_keywords: Option<Vec<String>>,
    in_stock_keywords: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
