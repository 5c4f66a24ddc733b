pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tubeprice_core::config::{AppConfig, LoadOptions, LogFormat};

use crate::commands::recommend::RecommendArgs;

#[derive(Debug, Parser)]
#[command(
    name = "tubeprice",
    about = "Steel pipe pricing recommendation CLI",
    long_about = "Generate deterministic price recommendations for steel pipe products and inspect the effective engine configuration.",
    after_help = "Examples:\n  tubeprice recommend --input products.json --month 4\n  tubeprice recommend --input products.json --apply\n  tubeprice config"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to a tubeprice.toml file (must exist when given)")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Price every product in an input file and print the bulk report as JSON")]
    Recommend {
        #[arg(long, help = "JSON file with market_position and products")]
        input: PathBuf,
        #[arg(
            long,
            value_parser = clap::value_parser!(u32).range(1..=12),
            help = "Calendar month used for seasonality (defaults to the current UTC month)"
        )]
        month: Option<u32>,
        #[arg(long, help = "Push price changes through the in-memory price update gateway")]
        apply: bool,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.config.clone());

    let result = match cli.command {
        Command::Recommend { input, month, apply } => commands::recommend::run(RecommendArgs {
            input,
            month,
            apply,
            config_path: cli.config,
        }),
        Command::Config => commands::config::run(cli.config),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

fn init_logging(config_path: Option<PathBuf>) {
    use tracing::Level;

    // Config errors are reported by the command itself; logging falls back to defaults.
    let config = AppConfig::load(LoadOptions { config_path, ..LoadOptions::default() })
        .unwrap_or_default();
    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    match config.logging.format {
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Json => builder.json().init(),
    }
}
