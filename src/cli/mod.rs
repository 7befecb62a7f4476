//! Command-line parsing for the power output predictor.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the modeling/math code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{ClampPolicy, ForecastModelSource};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "pwr",
    version,
    about = "Combined-cycle power plant net output: penalized regression, prediction and 30-day forecast"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit all three models, print evaluation, predictions and the monthly forecast.
    Run(RunArgs),
    /// Print single-point predictions only (useful for scripting).
    Predict(RunArgs),
    /// Print the monthly forecast table and chart only.
    Forecast(RunArgs),
}

/// Options shared by every subcommand.
#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    /// Dataset URL (defaults to $POWER_DATA_URL, then the published CSV).
    #[arg(long, value_name = "URL")]
    pub source: Option<String>,

    /// Read the dataset from a local CSV instead of fetching it.
    #[arg(long, value_name = "PATH", conflicts_with = "source")]
    pub csv: Option<PathBuf>,

    /// Average temperature (°C, 0–40).
    #[arg(short = 't', long, default_value_t = 25.0)]
    pub temperature: f64,

    /// Exhaust vacuum (cmHg, 25–80).
    #[arg(short = 'v', long, default_value_t = 55.0)]
    pub vacuum: f64,

    /// Ambient pressure (mbar, 900–1100).
    #[arg(short = 'p', long, default_value_t = 1010.0)]
    pub pressure: f64,

    /// Relative humidity (%, 0–100).
    #[arg(short = 'H', long, default_value_t = 50.0)]
    pub humidity: f64,

    /// Seed for the train/test shuffle.
    #[arg(long, default_value_t = 45)]
    pub seed: u64,

    /// Seed for forecast perturbations (random when omitted).
    #[arg(long)]
    pub forecast_seed: Option<u64>,

    /// Models used for the monthly forecast.
    #[arg(long, value_enum, default_value_t = ForecastModelSource::DefaultModel)]
    pub forecast_models: ForecastModelSource,

    /// Clamp policy applied to synthetic forecast rows.
    #[arg(long, value_enum, default_value_t = ClampPolicy::Unclamped)]
    pub clamp: ClampPolicy,

    /// Run cross-validation on a single thread.
    #[arg(long)]
    pub sequential: bool,

    /// Disable the terminal forecast chart.
    #[arg(long)]
    pub no_plot: bool,

    /// Chart width (columns).
    #[arg(long, default_value_t = 72)]
    pub width: usize,

    /// Chart height (rows).
    #[arg(long, default_value_t = 18)]
    pub height: usize,

    /// Write the full run (models, metrics, predictions, forecast) as JSON.
    #[arg(long, value_name = "PATH")]
    pub json: Option<PathBuf>,

    /// Write the forecast batch as CSV.
    #[arg(long = "export-forecast", value_name = "PATH")]
    pub export_forecast: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predict_accepts_short_slider_flags() {
        let cli = Cli::parse_from(["pwr", "predict", "-t", "30", "-v", "60", "-p", "1000", "-H", "70"]);
        let Command::Predict(args) = cli.command else {
            panic!("expected predict");
        };
        assert_eq!(
            (args.temperature, args.vacuum, args.pressure, args.humidity),
            (30.0, 60.0, 1000.0, 70.0)
        );
    }

    #[test]
    fn forecast_policy_flags_parse() {
        let cli = Cli::parse_from([
            "pwr",
            "forecast",
            "--forecast-models",
            "tuned",
            "--clamp",
            "physical-bounds",
            "--forecast-seed",
            "9",
        ]);
        let Command::Forecast(args) = cli.command else {
            panic!("expected forecast");
        };
        assert_eq!(args.forecast_models, ForecastModelSource::TunedModel);
        assert_eq!(args.clamp, ClampPolicy::PhysicalBounds);
        assert_eq!(args.forecast_seed, Some(9));
    }

    #[test]
    fn source_and_csv_conflict() {
        let res = Cli::try_parse_from(["pwr", "run", "--source", "http://x", "--csv", "a.csv"]);
        assert!(res.is_err());
    }
}
