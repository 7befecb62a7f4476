//! Shared pipeline logic used by every `pwr` subcommand.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! load -> split -> scale -> grid search per family -> evaluate -> predict -> forecast
//!
//! Subcommands only differ in what they print or export.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::data::{CachedDataset, DatasetCache, split_dataset};
use crate::domain::{
    CvScore, EvaluationResult, FeatureVector, FittedModel, ForecastBatch, ForecastModelSource,
    INPUT_BOUNDS, ModelFamily, Observation, PipelineConfig, Prediction,
};
use crate::error::{PipelineError, PipelineWarning};
use crate::fit::{FitOptions, PENALTY_GRID, SearchOptions, fit_untuned, select_all, validate_mixing_ratio};
use crate::forecast::monthly_forecast;
use crate::math::ScalingParameters;
use crate::models::predict_all;
use crate::report::evaluate;

/// Leading observations echoed in the run summary.
pub const PREVIEW_ROWS: usize = 5;

/// Everything produced for one family.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FamilyReport {
    /// Model refit on the full training set at the selected penalty.
    pub model: FittedModel,
    pub cv_scores: Vec<CvScore>,
    /// Held-out metrics.
    pub evaluation: EvaluationResult,
}

/// All computed outputs of a single run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    pub source: String,
    pub rows: usize,
    pub loaded_at: DateTime<Utc>,
    /// First `PREVIEW_ROWS` observations, in source order.
    pub preview: Vec<Observation>,
    pub train_rows: usize,
    pub test_rows: usize,
    pub scaling: ScalingParameters,
    /// One entry per family, in `ModelFamily::ALL` order.
    pub families: Vec<FamilyReport>,
    pub input: FeatureVector,
    pub predictions: Vec<Prediction>,
    pub forecast: ForecastBatch,
    pub warnings: Vec<PipelineWarning>,
}

impl PipelineOutput {
    pub fn family(&self, family: ModelFamily) -> Option<&FamilyReport> {
        self.families.iter().find(|f| f.model.family == family)
    }
}

/// Execute the full pipeline against the cached dataset (loading it on first use).
pub fn run_pipeline(config: &PipelineConfig, cache: &DatasetCache) -> Result<PipelineOutput, PipelineError> {
    validate_config(config)?;
    let cached = cache.get()?;
    run_with_dataset(config, &cached)
}

/// Execute the pipeline on an already loaded dataset.
pub fn run_with_dataset(config: &PipelineConfig, cached: &CachedDataset) -> Result<PipelineOutput, PipelineError> {
    validate_config(config)?;
    let dataset = cached.dataset.as_ref();
    let mut warnings = Vec::new();

    // 1) Split.
    let split = split_dataset(dataset, config.test_fraction, config.split_seed, config.folds)?;
    info!(
        rows = dataset.len(),
        train = split.train.len(),
        test = split.test.len(),
        seed = config.split_seed,
        "dataset split"
    );

    // 2) Scale on train only.
    let (scaling, scale_warnings) = ScalingParameters::fit(&split.train_features())?;
    warnings.extend(scale_warnings);
    let train_x = scaling.transform(&split.train_features());
    let train_y = split.train_targets();

    // 3) Grid search each family.
    let fit_opts = FitOptions {
        mixing_ratio: config.mixing_ratio,
        solver: config.solver,
    };
    let search = SearchOptions {
        grid: PENALTY_GRID.to_vec(),
        folds: config.folds,
        fit: fit_opts,
        parallel: config.parallel_cv,
    };
    let (selections, fit_warnings) = select_all(&train_x, &train_y, &search)?;
    warnings.extend(fit_warnings);

    // 4) Evaluate on the held-out rows.
    let mut families = Vec::with_capacity(selections.len());
    for selection in selections {
        let (evaluation, warning) = evaluate(&selection.model, &scaling, &split.test)?;
        warnings.extend(warning);
        info!(
            family = selection.model.family.short_name(),
            alpha = selection.model.alpha,
            mse = evaluation.mean_squared_error,
            r2 = evaluation.r_squared,
            "evaluated"
        );
        families.push(FamilyReport {
            model: selection.model,
            cv_scores: selection.cv_scores,
            evaluation,
        });
    }
    let tuned: Vec<FittedModel> = families.iter().map(|f| f.model.clone()).collect();

    // 5) Single-point prediction with the tuned models.
    let predictions = predict_all(&tuned, &scaling, &config.input)?;

    // 6) Monthly forecast with the configured model source.
    let forecast_models = match config.forecast.model_source {
        ForecastModelSource::TunedModel => tuned,
        ForecastModelSource::DefaultModel => {
            let (models, w) = fit_untuned(&train_x, &train_y, config.default_alpha, &fit_opts)?;
            warnings.extend(w);
            models
        }
    };
    let (forecast, forecast_warnings) =
        monthly_forecast(&config.input, &forecast_models, &scaling, &config.forecast)?;
    warnings.extend(forecast_warnings);

    info!(warnings = warnings.len(), "pipeline finished");

    Ok(PipelineOutput {
        source: cached.source.clone(),
        rows: dataset.len(),
        loaded_at: cached.loaded_at,
        preview: dataset.observations.iter().take(PREVIEW_ROWS).copied().collect(),
        train_rows: split.train.len(),
        test_rows: split.test.len(),
        scaling,
        families,
        input: config.input,
        predictions,
        forecast,
        warnings,
    })
}

/// Reject configurations no stage could run with.
pub fn validate_config(config: &PipelineConfig) -> Result<(), PipelineError> {
    validate_mixing_ratio(config.mixing_ratio)?;
    if config.folds < 2 {
        return Err(PipelineError::InvalidInput(format!(
            "cross-validation needs at least 2 folds, got {}",
            config.folds
        )));
    }
    if config.solver.max_iter == 0 || !(config.solver.tol.is_finite() && config.solver.tol > 0.0) {
        return Err(PipelineError::InvalidInput(format!(
            "solver needs max_iter > 0 and a positive tolerance: {:?}",
            config.solver
        )));
    }
    if !(config.default_alpha.is_finite() && config.default_alpha >= 0.0) {
        return Err(PipelineError::InvalidInput(format!(
            "default penalty must be finite and non-negative, got {}",
            config.default_alpha
        )));
    }
    if !config.input.is_finite() {
        return Err(PipelineError::InvalidInput(format!(
            "feature vector must be finite: {:?}",
            config.input
        )));
    }
    let outside = config.input.out_of_bounds(&INPUT_BOUNDS);
    if !outside.is_empty() {
        let detail: Vec<String> = outside
            .iter()
            .map(|f| {
                let b = INPUT_BOUNDS[f.index()];
                format!("{} = {} not in [{}, {}]", f.column_name(), config.input.get(*f), b.min, b.max)
            })
            .collect();
        return Err(PipelineError::InvalidInput(detail.join("; ")));
    }
    Ok(())
}
