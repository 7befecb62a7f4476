//! Held-out evaluation: mean squared error and coefficient of determination.

use tracing::warn;

use crate::domain::{EvaluationResult, FittedModel, Observation};
use crate::error::{PipelineError, PipelineWarning};
use crate::math::ScalingParameters;
use crate::models::predict_scaled;

/// Mean of squared residuals.
pub fn mean_squared_error(actual: &[f64], predicted: &[f64]) -> Result<f64, PipelineError> {
    check_lengths(actual, predicted)?;
    let sse: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p) * (a - p))
        .sum();
    Ok(sse / actual.len() as f64)
}

/// `1 − SS_res / SS_tot`.
///
/// A constant target (`SS_tot = 0`) has no variance to explain. The result is
/// then 1.0 for a perfect fit and 0.0 otherwise, and the second element is
/// `true` so callers can report the substitution.
pub fn r_squared(actual: &[f64], predicted: &[f64]) -> Result<(f64, bool), PipelineError> {
    check_lengths(actual, predicted)?;
    let n = actual.len() as f64;
    let mean = actual.iter().sum::<f64>() / n;
    let ss_tot: f64 = actual.iter().map(|a| (a - mean) * (a - mean)).sum();
    let ss_res: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p) * (a - p))
        .sum();

    if ss_tot == 0.0 {
        let sentinel = if ss_res == 0.0 { 1.0 } else { 0.0 };
        return Ok((sentinel, true));
    }
    Ok((1.0 - ss_res / ss_tot, false))
}

/// Score a fitted model against raw test observations.
///
/// Test features go through the training scaler; it is never refit here.
pub fn evaluate(
    model: &FittedModel,
    scaling: &ScalingParameters,
    test: &[Observation],
) -> Result<(EvaluationResult, Option<PipelineWarning>), PipelineError> {
    let actual: Vec<f64> = test.iter().map(|o| o.net_output).collect();
    let predicted: Vec<f64> = test
        .iter()
        .map(|o| predict_scaled(model, &scaling.transform_vector(&o.features)))
        .collect();

    let mse = mean_squared_error(&actual, &predicted)?;
    let (r2, degenerate) = r_squared(&actual, &predicted)?;

    let warning = if degenerate {
        warn!(
            family = model.family.short_name(),
            "constant test target; R² replaced by sentinel {r2}"
        );
        Some(PipelineWarning::DivisionDegenerate {
            family: model.family,
        })
    } else {
        None
    };

    Ok((
        EvaluationResult {
            mean_squared_error: mse,
            r_squared: r2,
            rmse: mse.sqrt(),
            n: test.len(),
        },
        warning,
    ))
}

fn check_lengths(actual: &[f64], predicted: &[f64]) -> Result<(), PipelineError> {
    if actual.is_empty() {
        return Err(PipelineError::InsufficientData("nothing to evaluate".into()));
    }
    if actual.len() != predicted.len() {
        return Err(PipelineError::InvalidInput(format!(
            "actual ({}) and predicted ({}) differ in length",
            actual.len(),
            predicted.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FeatureVector, ModelFamily};

    #[test]
    fn perfect_predictions_score_zero_and_one() {
        let y = [1.0, 2.0, 3.0];
        assert_eq!(mean_squared_error(&y, &y).unwrap(), 0.0);
        assert_eq!(r_squared(&y, &y).unwrap(), (1.0, false));
    }

    #[test]
    fn known_values() {
        let actual = [1.0, 2.0, 3.0, 4.0];
        let predicted = [1.5, 2.0, 2.5, 4.0];
        let mse = mean_squared_error(&actual, &predicted).unwrap();
        assert!((mse - 0.125).abs() < 1e-12);
        // SS_res = 0.5, SS_tot = 5
        let (r2, _) = r_squared(&actual, &predicted).unwrap();
        assert!((r2 - 0.9).abs() < 1e-12);
    }

    #[test]
    fn r_squared_never_exceeds_one_and_can_go_negative() {
        let actual = [1.0, 2.0, 3.0];
        let bad = [3.0, 2.0, 1.0];
        let (r2, _) = r_squared(&actual, &bad).unwrap();
        assert!(r2 < 0.0);
        assert!(r2 <= 1.0);
        assert!(mean_squared_error(&actual, &bad).unwrap() >= 0.0);
    }

    #[test]
    fn constant_target_uses_sentinel() {
        let actual = [5.0, 5.0, 5.0];
        assert_eq!(r_squared(&actual, &actual).unwrap(), (1.0, true));
        assert_eq!(r_squared(&actual, &[5.0, 6.0, 5.0]).unwrap(), (0.0, true));
    }

    #[test]
    fn evaluate_reports_degenerate_target() {
        let model = FittedModel {
            family: ModelFamily::L1,
            alpha: 0.1,
            weights: [0.0; 4],
            intercept: 7.0,
            iterations: 1,
            converged: true,
        };
        let scaling = ScalingParameters {
            mean: [0.0; 4],
            std: [1.0; 4],
            degenerate: vec![],
        };
        let test: Vec<Observation> = (0..3)
            .map(|i| Observation {
                features: FeatureVector::new(i as f64, 0.0, 0.0, 0.0),
                net_output: 7.0,
            })
            .collect();

        let (res, warning) = evaluate(&model, &scaling, &test).unwrap();
        assert_eq!(res.mean_squared_error, 0.0);
        assert_eq!(res.r_squared, 1.0);
        assert_eq!(res.n, 3);
        assert_eq!(
            warning,
            Some(PipelineWarning::DivisionDegenerate {
                family: ModelFamily::L1
            })
        );
    }

    #[test]
    fn empty_or_mismatched_inputs_are_errors() {
        assert!(mean_squared_error(&[], &[]).is_err());
        assert!(r_squared(&[1.0], &[1.0, 2.0]).is_err());
    }
}
