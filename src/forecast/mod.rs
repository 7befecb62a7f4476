//! Monthly forecast from synthetic daily readings.
//!
//! Starting from a baseline feature vector we draw `FORECAST_DAYS` days, each
//! feature independently uniform on `baseline ± half_width`, then run every
//! model over the batch.
//!
//! Draws are not physically constrained by default (humidity can leave
//! 0–100%, for instance). `ClampPolicy::PhysicalBounds` clamps every row to
//! `PHYSICAL_BOUNDS` after drawing. Under either policy a row that cannot be
//! predicted (non-finite features or output) is clamped and reported instead
//! of failing the run.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Uniform};
use tracing::{info, warn};

use crate::domain::{
    ClampPolicy, FEATURE_COUNT, FeatureBounds, FeatureVector, FittedModel, ForecastBatch,
    ForecastConfig, ForecastDay, ForecastModelSource, ForecastSeries,
};
use crate::error::{PipelineError, PipelineWarning};
use crate::math::ScalingParameters;
use crate::models::predict_scaled;

/// Number of synthetic days in a forecast batch.
pub const FORECAST_DAYS: usize = 30;

/// Physically plausible ranges used by the clamp policy.
pub const PHYSICAL_BOUNDS: [FeatureBounds; FEATURE_COUNT] = [
    // °C
    FeatureBounds::new(-30.0, 50.0),
    // cmHg
    FeatureBounds::new(0.0, 100.0),
    // mbar
    FeatureBounds::new(800.0, 1200.0),
    // %
    FeatureBounds::new(0.0, 100.0),
];

/// Draw `days` perturbed feature vectors around `baseline`.
pub fn perturb(
    baseline: &FeatureVector,
    half_widths: &FeatureVector,
    days: usize,
    rng: &mut StdRng,
) -> Result<Vec<FeatureVector>, PipelineError> {
    if !baseline.is_finite() {
        return Err(PipelineError::InvalidInput(format!(
            "forecast baseline must be finite: {baseline:?}"
        )));
    }
    let hw = half_widths.to_array();
    if hw.iter().any(|h| !(h.is_finite() && *h >= 0.0)) {
        return Err(PipelineError::InvalidInput(format!(
            "perturbation half-widths must be finite and non-negative: {half_widths:?}"
        )));
    }

    let base = baseline.to_array();
    let dists: Vec<Uniform<f64>> = base
        .iter()
        .zip(hw.iter())
        .map(|(&b, &h)| Uniform::new_inclusive(b - h, b + h))
        .collect();

    let mut out = Vec::with_capacity(days);
    for _ in 0..days {
        let mut row = [0.0; FEATURE_COUNT];
        for (slot, dist) in row.iter_mut().zip(dists.iter()) {
            *slot = dist.sample(rng);
        }
        out.push(FeatureVector::from_array(row));
    }
    Ok(out)
}

/// Apply the clamp policy to one drawn row. Returns the row and whether it changed.
pub fn apply_clamp_policy(row: FeatureVector, policy: ClampPolicy) -> (FeatureVector, bool) {
    match policy {
        ClampPolicy::Unclamped => (row, false),
        ClampPolicy::PhysicalBounds => {
            let clamped = row.clamped(&PHYSICAL_BOUNDS);
            (clamped, clamped != row)
        }
    }
}

/// Generate the synthetic days (1-based indices) for a forecast.
pub fn generate_days(
    baseline: &FeatureVector,
    config: &ForecastConfig,
) -> Result<Vec<ForecastDay>, PipelineError> {
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let rows = perturb(baseline, &config.half_widths, FORECAST_DAYS, &mut rng)?;

    Ok(rows
        .into_iter()
        .enumerate()
        .map(|(i, row)| {
            let (features, clamped) = apply_clamp_policy(row, config.clamp);
            ForecastDay {
                day: i as u32 + 1,
                features,
                clamped,
            }
        })
        .collect())
}

/// Run each model over the days, repairing rows that cannot be predicted.
pub fn predict_days(
    mut days: Vec<ForecastDay>,
    models: &[FittedModel],
    scaling: &ScalingParameters,
    model_source: ForecastModelSource,
    clamp: ClampPolicy,
) -> Result<(ForecastBatch, Vec<PipelineWarning>), PipelineError> {
    let mut series: Vec<ForecastSeries> = models
        .iter()
        .map(|m| ForecastSeries {
            family: m.family,
            alpha: m.alpha,
            predictions: Vec::with_capacity(days.len()),
        })
        .collect();
    let mut warnings = Vec::new();

    for day in days.iter_mut() {
        let mut preds = predict_row(models, scaling, &day.features);
        if preds.is_none() {
            let repaired = day.features.clamped(&PHYSICAL_BOUNDS);
            warn!(day = day.day, "synthetic row not predictable; clamping to physical bounds");
            day.features = repaired;
            day.clamped = true;
            warnings.push(PipelineWarning::ForecastRowClamped { day: day.day });
            preds = predict_row(models, scaling, &repaired);
        }
        let preds = preds.ok_or_else(|| {
            PipelineError::Solver(format!("forecast day {} has no finite prediction", day.day))
        })?;
        for (s, p) in series.iter_mut().zip(preds) {
            s.predictions.push(p);
        }
    }

    Ok((
        ForecastBatch {
            days,
            series,
            model_source,
            clamp,
        },
        warnings,
    ))
}

/// Generate and predict a full monthly forecast batch.
pub fn monthly_forecast(
    baseline: &FeatureVector,
    models: &[FittedModel],
    scaling: &ScalingParameters,
    config: &ForecastConfig,
) -> Result<(ForecastBatch, Vec<PipelineWarning>), PipelineError> {
    let days = generate_days(baseline, config)?;
    let out = predict_days(days, models, scaling, config.model_source, config.clamp)?;
    info!(
        days = out.0.days.len(),
        models = models.len(),
        source = ?config.model_source,
        "monthly forecast generated"
    );
    Ok(out)
}

fn predict_row(
    models: &[FittedModel],
    scaling: &ScalingParameters,
    features: &FeatureVector,
) -> Option<Vec<f64>> {
    if !features.is_finite() {
        return None;
    }
    let scaled = scaling.transform_vector(features);
    let preds: Vec<f64> = models.iter().map(|m| predict_scaled(m, &scaled)).collect();
    preds.iter().all(|p| p.is_finite()).then_some(preds)
}
