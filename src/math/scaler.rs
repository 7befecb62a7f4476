//! Feature standardization.
//!
//! Parameters are fit once on the training features and then applied, never
//! refit, to test rows, prediction inputs and forecast batches.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::{FEATURE_COUNT, Feature, FeatureVector};
use crate::error::{PipelineError, PipelineWarning};

/// Variance at or below this (relative to the squared mean) counts as zero.
const ZERO_VARIANCE_EPS: f64 = 1e-12;

/// Per-feature mean and population standard deviation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingParameters {
    pub mean: [f64; FEATURE_COUNT],
    /// Standard deviation used for division (1.0 for degenerate features).
    pub std: [f64; FEATURE_COUNT],
    /// Features whose variance was zero in the training set.
    pub degenerate: Vec<Feature>,
}

impl ScalingParameters {
    /// Fit on training rows.
    ///
    /// Zero-variance features are not an error: their scale is taken as 1 so
    /// the scaled value is `x - mean`. A warning is returned for each.
    pub fn fit(rows: &[[f64; FEATURE_COUNT]]) -> Result<(Self, Vec<PipelineWarning>), PipelineError> {
        if rows.is_empty() {
            return Err(PipelineError::DegenerateFeature(
                "cannot fit scaling on an empty training set".into(),
            ));
        }

        let n = rows.len() as f64;
        let mut mean = [0.0; FEATURE_COUNT];
        for row in rows {
            for (m, x) in mean.iter_mut().zip(row.iter()) {
                *m += x;
            }
        }
        for m in mean.iter_mut() {
            *m /= n;
        }

        let mut var = [0.0; FEATURE_COUNT];
        for row in rows {
            for j in 0..FEATURE_COUNT {
                let d = row[j] - mean[j];
                var[j] += d * d;
            }
        }

        let mut std = [1.0; FEATURE_COUNT];
        let mut degenerate = Vec::new();
        let mut warnings = Vec::new();
        for feature in Feature::ALL {
            let j = feature.index();
            let v = var[j] / n;
            if !(mean[j].is_finite() && v.is_finite()) {
                return Err(PipelineError::DegenerateFeature(format!(
                    "non-finite statistics for '{}'",
                    feature.column_name()
                )));
            }
            if v <= ZERO_VARIANCE_EPS * mean[j].abs().max(1.0).powi(2) {
                warn!(feature = feature.column_name(), "zero variance in training set; using std = 1");
                degenerate.push(feature);
                warnings.push(PipelineWarning::DegenerateFeature { feature });
            } else {
                std[j] = v.sqrt();
            }
        }

        Ok((Self { mean, std, degenerate }, warnings))
    }

    pub fn transform_row(&self, row: &[f64; FEATURE_COUNT]) -> [f64; FEATURE_COUNT] {
        let mut out = [0.0; FEATURE_COUNT];
        for j in 0..FEATURE_COUNT {
            out[j] = (row[j] - self.mean[j]) / self.std[j];
        }
        out
    }

    pub fn transform(&self, rows: &[[f64; FEATURE_COUNT]]) -> Vec<[f64; FEATURE_COUNT]> {
        rows.iter().map(|r| self.transform_row(r)).collect()
    }

    pub fn transform_vector(&self, v: &FeatureVector) -> [f64; FEATURE_COUNT] {
        self.transform_row(&v.to_array())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn scaled_training_rows_have_zero_mean_unit_std() {
        let mut rng = StdRng::seed_from_u64(3);
        let rows: Vec<[f64; 4]> = (0..500)
            .map(|_| {
                [
                    rng.gen_range(0.0..40.0),
                    rng.gen_range(25.0..80.0),
                    rng.gen_range(900.0..1100.0),
                    rng.gen_range(0.0..100.0),
                ]
            })
            .collect();

        let (params, warnings) = ScalingParameters::fit(&rows).unwrap();
        assert!(warnings.is_empty());
        let scaled = params.transform(&rows);
        let n = scaled.len() as f64;
        for j in 0..4 {
            let mean = scaled.iter().map(|r| r[j]).sum::<f64>() / n;
            let var = scaled.iter().map(|r| (r[j] - mean).powi(2)).sum::<f64>() / n;
            assert!(mean.abs() < 1e-9, "feature {j} mean {mean}");
            assert!((var.sqrt() - 1.0).abs() < 1e-9, "feature {j} std {}", var.sqrt());
        }
    }

    #[test]
    fn zero_variance_feature_falls_back_to_unit_scale() {
        let rows = vec![
            [10.0, 50.0, 1013.0, 20.0],
            [20.0, 60.0, 1013.0, 40.0],
            [30.0, 70.0, 1013.0, 60.0],
        ];
        let (params, warnings) = ScalingParameters::fit(&rows).unwrap();
        assert_eq!(params.degenerate, vec![Feature::AmbientPressure]);
        assert_eq!(
            warnings,
            vec![PipelineWarning::DegenerateFeature {
                feature: Feature::AmbientPressure
            }]
        );
        assert_eq!(params.std[2], 1.0);

        for row in &rows {
            let s = params.transform_row(row);
            assert!(s.iter().all(|v| v.is_finite()));
            assert_eq!(s[2], row[2] - params.mean[2]);
        }
        // Unseen value keeps the x - mean form.
        let s = params.transform_row(&[20.0, 60.0, 1015.0, 40.0]);
        assert!((s[2] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn transform_does_not_refit() {
        let rows = vec![[0.0, 0.0, 0.0, 0.0], [2.0, 2.0, 2.0, 2.0]];
        let (params, _) = ScalingParameters::fit(&rows).unwrap();
        let before = params.clone();
        let _ = params.transform(&[[100.0, 100.0, 100.0, 100.0]]);
        assert_eq!(params, before);
        assert_eq!(params.transform_row(&[2.0, 0.0, 1.0, 1.0]), [1.0, -1.0, 0.0, 0.0]);
    }

    #[test]
    fn empty_training_set_is_an_error() {
        assert!(matches!(
            ScalingParameters::fit(&[]),
            Err(PipelineError::DegenerateFeature(_))
        ));
    }
}
