//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - resolves the dataset source
//! - runs the fit/evaluate/forecast pipeline
//! - prints reports/plots
//! - writes optional exports

use clap::Parser;
use tracing::info;

use crate::cli::{Command, RunArgs};
use crate::data::{DataSource, DatasetCache};
use crate::domain::{FeatureVector, ForecastConfig, PipelineConfig};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `pwr` binary.
pub fn run() -> Result<(), AppError> {
    crate::telemetry::init_tracing();

    // `pwr` and `pwr -t 30` behave like `pwr run ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Run(args) => handle_run(args, OutputMode::Full),
        Command::Predict(args) => handle_run(args, OutputMode::PredictOnly),
        Command::Forecast(args) => handle_run(args, OutputMode::ForecastOnly),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Full,
    PredictOnly,
    ForecastOnly,
}

fn handle_run(args: RunArgs, mode: OutputMode) -> Result<(), AppError> {
    let config = pipeline_config_from_args(&args);
    let source = data_source_from_args(&args);
    info!(source = ?source, ?mode, "starting run");

    let cache = DatasetCache::new(source);
    let out = pipeline::run_pipeline(&config, &cache)?;

    if mode == OutputMode::Full {
        println!("{}", crate::report::format_run_summary(&out));
        println!("{}", crate::report::format_cv_table(&out.families));
    }
    if mode != OutputMode::ForecastOnly {
        println!("{}", crate::report::format_predictions(&out.input, &out.predictions));
    }
    if mode != OutputMode::PredictOnly {
        println!("{}", crate::report::format_forecast(&out.forecast));
        if !args.no_plot {
            println!(
                "{}",
                crate::plot::render_forecast_plot(&out.forecast, args.width, args.height)
            );
        }
    }

    let warnings = crate::report::format_warnings(&out.warnings);
    if !warnings.is_empty() {
        println!("{warnings}");
    }

    // Optional exports.
    if let Some(path) = &args.export_forecast {
        crate::io::write_forecast_csv(path, &out.forecast)?;
    }
    if let Some(path) = &args.json {
        crate::io::write_output_json(path, &out)?;
    }

    Ok(())
}

pub fn pipeline_config_from_args(args: &RunArgs) -> PipelineConfig {
    let defaults = PipelineConfig::default();
    PipelineConfig {
        split_seed: args.seed,
        input: FeatureVector::new(args.temperature, args.vacuum, args.pressure, args.humidity),
        forecast: ForecastConfig {
            seed: args.forecast_seed,
            clamp: args.clamp,
            model_source: args.forecast_models,
            ..defaults.forecast
        },
        parallel_cv: !args.sequential,
        ..defaults
    }
}

/// `--csv` wins, then `--source`, then `$POWER_DATA_URL` / the published CSV.
pub fn data_source_from_args(args: &RunArgs) -> DataSource {
    if let Some(path) = &args.csv {
        return DataSource::File(path.clone());
    }
    if let Some(url) = &args.source {
        return DataSource::Remote(url.clone());
    }
    DataSource::from_env()
}

/// Rewrite argv so `pwr` defaults to `pwr run`.
///
/// Rules:
/// - `pwr`                      -> `pwr run`
/// - `pwr -t 30 ...`            -> `pwr run -t 30 ...`
/// - `pwr --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("run".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "run" | "predict" | "forecast");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "run flags".
    if arg1.starts_with('-') {
        argv.insert(1, "run".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use crate::domain::{ClampPolicy, ForecastModelSource};

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_defaults_to_run() {
        assert_eq!(rewrite_args(argv(&["pwr"])), argv(&["pwr", "run"]));
        assert_eq!(
            rewrite_args(argv(&["pwr", "-t", "30"])),
            argv(&["pwr", "run", "-t", "30"])
        );
        assert_eq!(rewrite_args(argv(&["pwr", "--help"])), argv(&["pwr", "--help"]));
        assert_eq!(
            rewrite_args(argv(&["pwr", "forecast"])),
            argv(&["pwr", "forecast"])
        );
    }

    #[test]
    fn config_from_default_args_matches_pipeline_defaults() {
        let cli = Cli::parse_from(rewrite_args(argv(&["pwr"])));
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(pipeline_config_from_args(&args), PipelineConfig::default());
    }

    #[test]
    fn config_carries_forecast_flags() {
        let cli = Cli::parse_from(argv(&[
            "pwr",
            "forecast",
            "--forecast-models",
            "tuned",
            "--clamp",
            "physical-bounds",
            "--forecast-seed",
            "3",
            "--sequential",
        ]));
        let Command::Forecast(args) = cli.command else {
            panic!("expected forecast");
        };
        let config = pipeline_config_from_args(&args);
        assert_eq!(config.forecast.model_source, ForecastModelSource::TunedModel);
        assert_eq!(config.forecast.clamp, ClampPolicy::PhysicalBounds);
        assert_eq!(config.forecast.seed, Some(3));
        assert!(!config.parallel_cv);
    }

    #[test]
    fn csv_flag_selects_file_source() {
        let cli = Cli::parse_from(argv(&["pwr", "run", "--csv", "plant.csv"]));
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(
            data_source_from_args(&args),
            DataSource::File("plant.csv".into())
        );
    }
}
