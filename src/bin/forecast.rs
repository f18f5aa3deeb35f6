//! Batch forecasting CLI
//!
//! Reads an array of well histories and a forecast configuration from JSON,
//! runs the decline/GOR pipeline for every well in parallel, and writes the
//! serialized forecasts as JSON to a file or stdout.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use prodcast::{forecast_wells, EngineConfig, ForecastConfig, SerializedForecast, WellHistory};

#[derive(Parser, Debug)]
#[command(
    name = "forecast",
    version,
    about = "Decline-curve forecasting for a batch of wells"
)]
struct Args {
    /// JSON file containing an array of well histories
    #[arg(long)]
    wells: PathBuf,

    /// JSON file containing the forecast configuration
    #[arg(long)]
    config: PathBuf,

    /// Engine tuning file (TOML); defaults to PRODCAST_CONFIG or built-ins
    #[arg(long)]
    engine: Option<PathBuf>,

    /// Output path; stdout when omitted
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Emit sparse (storage-compressed) forecast arrays
    #[arg(long)]
    compress: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let engine = match &args.engine {
        Some(path) => EngineConfig::load_from_file(path)
            .with_context(|| format!("loading engine config from {}", path.display()))?,
        None => EngineConfig::load(),
    };

    let wells: Vec<WellHistory> = serde_json::from_str(
        &fs::read_to_string(&args.wells)
            .with_context(|| format!("reading {}", args.wells.display()))?,
    )
    .context("parsing well histories")?;

    let cfg: ForecastConfig = serde_json::from_str(
        &fs::read_to_string(&args.config)
            .with_context(|| format!("reading {}", args.config.display()))?,
    )
    .context("parsing forecast configuration")?;

    info!(wells = wells.len(), "loaded histories");

    let states = forecast_wells(wells, &cfg, &engine);
    let serialized: Vec<SerializedForecast> = states
        .iter()
        .map(|s| {
            if args.compress {
                SerializedForecast::from_state_compressed(s)
            } else {
                SerializedForecast::from_state(s)
            }
        })
        .collect();

    let json = serde_json::to_string_pretty(&serialized).context("serializing forecasts")?;
    match &args.output {
        Some(path) => fs::write(path, json)
            .with_context(|| format!("writing {}", path.display()))?,
        None => println!("{json}"),
    }

    Ok(())
}
