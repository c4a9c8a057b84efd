//! # vigie-forecast
//!
//! Command-line front end for the case-count forecasting engine.

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vigie_forecast::{
    CaseTable, DataLoader, ForecastConfig, ForecastService, Population, Result,
};

#[derive(Parser)]
#[command(name = "vigie-forecast")]
#[command(about = "Adaptive multi-model case-count forecasting", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Forecast daily case counts
    Forecast {
        /// CSV file with date, region and cases columns
        #[arg(short, long)]
        input: PathBuf,

        /// Region to forecast (national aggregate when omitted)
        #[arg(short, long)]
        region: Option<String>,

        /// Number of days to forecast
        #[arg(long, default_value = "30")]
        horizon: usize,

        /// JSON configuration overriding the defaults
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show which models the available data enables
    Status {
        /// CSV file with date, region and cases columns
        #[arg(short, long)]
        input: PathBuf,

        /// Region to inspect (national aggregate when omitted)
        #[arg(short, long)]
        region: Option<String>,

        /// JSON configuration overriding the defaults
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// List the regions present in the input
    Regions {
        /// CSV file with date, region and cases columns
        #[arg(short, long)]
        input: PathBuf,
    },
}

fn load_service(config: Option<&Path>) -> Result<ForecastService> {
    let config = match config {
        Some(path) => ForecastConfig::from_json_file(path)?,
        None => ForecastConfig::default(),
    };
    ForecastService::new(config)
}

fn write_json<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            fs::write(path, json)?;
            tracing::info!(path = %path.display(), "report written");
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn run_forecast(
    input: &Path,
    region: Option<&str>,
    horizon: usize,
    config: Option<&Path>,
    output: Option<&Path>,
) -> Result<()> {
    let service = load_service(config)?;
    let table = DataLoader::from_csv(input)?;
    let population = Population::from_region(region);
    let series = table.series(&population)?;

    let report = service.forecast_for(&population, &series, horizon)?;
    write_json(&report, output)
}

fn run_status(input: &Path, region: Option<&str>, config: Option<&Path>) -> Result<()> {
    let service = load_service(config)?;
    let table = DataLoader::from_csv(input)?;
    let population = Population::from_region(region);
    let series = table.series(&population)?;

    write_json(&service.status(&population, &series), None)
}

fn run_regions(input: &Path) -> Result<()> {
    let table: CaseTable = DataLoader::from_csv(input)?;
    for region in table.regions() {
        println!("{}", region);
    }
    Ok(())
}

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vigie_forecast=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Forecast {
            input,
            region,
            horizon,
            config,
            output,
        } => run_forecast(
            &input,
            region.as_deref(),
            horizon,
            config.as_deref(),
            output.as_deref(),
        ),
        Commands::Status {
            input,
            region,
            config,
        } => run_status(&input, region.as_deref(), config.as_deref()),
        Commands::Regions { input } => run_regions(&input),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
