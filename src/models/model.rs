//! Linear model evaluation.
//!
//! Two entry points:
//! - `predict_scaled`: apply a fitted model to an already scaled row (fitting/CV/evaluation)
//! - `predict`: scale a raw feature vector, then apply the model (single-point prediction)

use crate::domain::{FEATURE_COUNT, FeatureVector, FittedModel, Prediction};
use crate::error::PipelineError;
use crate::math::ScalingParameters;

/// `intercept + Σ wᵢ·xᵢ` on a scaled row.
pub fn predict_scaled(model: &FittedModel, row: &[f64; FEATURE_COUNT]) -> f64 {
    model.intercept
        + model
            .weights
            .iter()
            .zip(row.iter())
            .map(|(w, x)| w * x)
            .sum::<f64>()
}

/// Predict net output for a raw (unscaled) feature vector.
pub fn predict(
    model: &FittedModel,
    scaling: &ScalingParameters,
    input: &FeatureVector,
) -> Result<f64, PipelineError> {
    if !input.is_finite() {
        return Err(PipelineError::InvalidInput(format!(
            "feature vector must be finite: {input:?}"
        )));
    }
    let y = predict_scaled(model, &scaling.transform_vector(input));
    if !y.is_finite() {
        return Err(PipelineError::InvalidInput(format!(
            "{} produced a non-finite prediction for {input:?}",
            model.family.display_name()
        )));
    }
    Ok(y)
}

/// One prediction per model, in the order given.
pub fn predict_all(
    models: &[FittedModel],
    scaling: &ScalingParameters,
    input: &FeatureVector,
) -> Result<Vec<Prediction>, PipelineError> {
    models
        .iter()
        .map(|m| {
            Ok(Prediction {
                family: m.family,
                net_output: predict(m, scaling, input)?,
            })
        })
        .collect()
}
