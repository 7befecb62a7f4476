//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting and forecasting
//! - exported to JSON/CSV
//! - handed to a presentation layer (terminal report, dashboard) unchanged

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Number of model inputs. The feature set is fixed.
pub const FEATURE_COUNT: usize = 4;

/// Source column names, in feature order.
pub const FEATURE_COLUMNS: [&str; FEATURE_COUNT] = [
    "Avg temperature",
    "Exhaust vacuum",
    "Ambient pressure",
    "Relative humidity",
];

/// Source column holding the regression target (MW).
pub const TARGET_COLUMN: &str = "Net hourly electrical energy output";

/// One of the four fixed model inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    AvgTemperature,
    ExhaustVacuum,
    AmbientPressure,
    RelativeHumidity,
}

impl Feature {
    pub const ALL: [Feature; FEATURE_COUNT] = [
        Feature::AvgTemperature,
        Feature::ExhaustVacuum,
        Feature::AmbientPressure,
        Feature::RelativeHumidity,
    ];

    /// Position of this feature in a feature row.
    pub fn index(self) -> usize {
        match self {
            Feature::AvgTemperature => 0,
            Feature::ExhaustVacuum => 1,
            Feature::AmbientPressure => 2,
            Feature::RelativeHumidity => 3,
        }
    }

    pub fn column_name(self) -> &'static str {
        FEATURE_COLUMNS[self.index()]
    }

    pub fn unit(self) -> &'static str {
        match self {
            Feature::AvgTemperature => "°C",
            Feature::ExhaustVacuum => "cmHg",
            Feature::AmbientPressure => "mbar",
            Feature::RelativeHumidity => "%",
        }
    }
}

/// Closed interval `[min, max]` for a single feature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureBounds {
    pub min: f64,
    pub max: f64,
}

impl FeatureBounds {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, v: f64) -> bool {
        v >= self.min && v <= self.max
    }

    pub fn clamp(&self, v: f64) -> f64 {
        if v.is_nan() {
            // NaN maps to the midpoint.
            return (self.min + self.max) / 2.0;
        }
        v.clamp(self.min, self.max)
    }
}

/// Accepted range for user-supplied prediction inputs (slider ranges).
pub const INPUT_BOUNDS: [FeatureBounds; FEATURE_COUNT] = [
    FeatureBounds::new(0.0, 40.0),
    FeatureBounds::new(25.0, 80.0),
    FeatureBounds::new(900.0, 1100.0),
    FeatureBounds::new(0.0, 100.0),
];

/// Ordered 4-tuple of plant readings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Average ambient temperature (°C).
    pub avg_temperature: f64,
    /// Exhaust steam vacuum (cmHg).
    pub exhaust_vacuum: f64,
    /// Ambient pressure (mbar).
    pub ambient_pressure: f64,
    /// Relative humidity (%).
    pub relative_humidity: f64,
}

impl FeatureVector {
    pub const fn new(
        avg_temperature: f64,
        exhaust_vacuum: f64,
        ambient_pressure: f64,
        relative_humidity: f64,
    ) -> Self {
        Self {
            avg_temperature,
            exhaust_vacuum,
            ambient_pressure,
            relative_humidity,
        }
    }

    pub fn from_array(v: [f64; FEATURE_COUNT]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }

    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.avg_temperature,
            self.exhaust_vacuum,
            self.ambient_pressure,
            self.relative_humidity,
        ]
    }

    pub fn get(&self, feature: Feature) -> f64 {
        self.to_array()[feature.index()]
    }

    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite())
    }

    /// Features that fall outside `bounds` (in feature order).
    pub fn out_of_bounds(&self, bounds: &[FeatureBounds; FEATURE_COUNT]) -> Vec<Feature> {
        Feature::ALL
            .into_iter()
            .filter(|f| !bounds[f.index()].contains(self.get(*f)))
            .collect()
    }

    pub fn clamped(&self, bounds: &[FeatureBounds; FEATURE_COUNT]) -> Self {
        let mut v = self.to_array();
        for (x, b) in v.iter_mut().zip(bounds.iter()) {
            *x = b.clamp(*x);
        }
        Self::from_array(v)
    }
}

/// A feature vector plus its observed net output (MW).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub features: FeatureVector,
    pub net_output: f64,
}

/// The full ordered record set loaded from the source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub observations: Vec<Observation>,
}

impl Dataset {
    pub fn new(observations: Vec<Observation>) -> Self {
        Self { observations }
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

/// Disjoint train/test partition of a dataset.
#[derive(Debug, Clone)]
pub struct Split {
    pub train: Vec<Observation>,
    pub test: Vec<Observation>,
}

impl Split {
    pub fn train_features(&self) -> Vec<[f64; FEATURE_COUNT]> {
        self.train.iter().map(|o| o.features.to_array()).collect()
    }

    pub fn train_targets(&self) -> Vec<f64> {
        self.train.iter().map(|o| o.net_output).collect()
    }
}

/// Regularized linear regression family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFamily {
    /// L1 penalty (lasso).
    L1,
    /// L2 penalty (ridge).
    L2,
    /// Mixed L1/L2 penalty (elastic net).
    Mixed,
}

impl ModelFamily {
    pub const ALL: [ModelFamily; 3] = [ModelFamily::L1, ModelFamily::L2, ModelFamily::Mixed];

    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            ModelFamily::L1 => "Lasso (L1)",
            ModelFamily::L2 => "Ridge (L2)",
            ModelFamily::Mixed => "Elastic Net",
        }
    }

    /// Short identifier used in CSV headers.
    pub fn short_name(self) -> &'static str {
        match self {
            ModelFamily::L1 => "l1",
            ModelFamily::L2 => "l2",
            ModelFamily::Mixed => "mixed",
        }
    }
}

/// Which estimators the monthly forecast runs through.
///
/// The dashboard forecasts with fresh estimators at the default penalty rather
/// than the grid-search winners. Both behaviours are selectable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum ForecastModelSource {
    /// Use the grid-search-selected models (same as evaluation/prediction).
    #[serde(rename = "tuned")]
    #[value(name = "tuned")]
    TunedModel,
    /// Refit each family at the default penalty and forecast with that.
    #[serde(rename = "default")]
    #[value(name = "default")]
    DefaultModel,
}

/// What to do with synthetic forecast rows after perturbation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ClampPolicy {
    /// Keep perturbed values as drawn (humidity may leave 0–100%, etc.).
    Unclamped,
    /// Clamp each feature to `forecast::PHYSICAL_BOUNDS`.
    PhysicalBounds,
}

/// Iterative solver budget.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverSettings {
    pub max_iter: usize,
    pub tol: f64,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            tol: 1e-4,
        }
    }
}

/// Monthly forecast settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// RNG seed for perturbations. `None` draws from OS entropy.
    pub seed: Option<u64>,
    pub clamp: ClampPolicy,
    pub model_source: ForecastModelSource,
    /// Uniform perturbation half-width per feature.
    pub half_widths: FeatureVector,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            seed: None,
            clamp: ClampPolicy::Unclamped,
            model_source: ForecastModelSource::DefaultModel,
            half_widths: FeatureVector::new(5.0, 10.0, 20.0, 20.0),
        }
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Seed for the train/test shuffle.
    pub split_seed: u64,
    /// Fraction of rows held out for evaluation.
    pub test_fraction: f64,
    /// Number of cross-validation folds.
    pub folds: usize,
    /// L1 share of the mixed penalty (1.0 = pure L1, 0.0 = pure L2).
    pub mixing_ratio: f64,
    /// Penalty used by un-tuned estimators.
    pub default_alpha: f64,
    pub solver: SolverSettings,
    /// Feature vector for the single-point prediction.
    pub input: FeatureVector,
    pub forecast: ForecastConfig,
    /// Fit cross-validation folds on the rayon pool.
    pub parallel_cv: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            split_seed: 45,
            test_fraction: 0.15,
            folds: 5,
            mixing_ratio: crate::fit::MIXING_RATIO,
            default_alpha: crate::fit::DEFAULT_ALPHA,
            solver: SolverSettings::default(),
            input: FeatureVector::new(25.0, 55.0, 1010.0, 50.0),
            forecast: ForecastConfig::default(),
            parallel_cv: true,
        }
    }
}

/// A fitted linear model over the four scaled features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedModel {
    pub family: ModelFamily,
    /// Penalty strength the model was fit with.
    pub alpha: f64,
    pub weights: [f64; FEATURE_COUNT],
    pub intercept: f64,
    /// Solver sweeps used (1 for the closed-form ridge solve).
    pub iterations: usize,
    pub converged: bool,
}

/// Mean cross-validated error for one grid point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CvScore {
    pub alpha: f64,
    pub mean_mse: f64,
    pub fold_mse: Vec<f64>,
}

/// Held-out test metrics for one model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub mean_squared_error: f64,
    pub r_squared: f64,
    pub rmse: f64,
    pub n: usize,
}

/// Single-point prediction for one family.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub family: ModelFamily,
    pub net_output: f64,
}

/// One synthetic day in a monthly forecast.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    /// 1-based day index.
    pub day: u32,
    pub features: FeatureVector,
    /// Whether the row was clamped after perturbation.
    pub clamped: bool,
}

/// Predictions of one family across the forecast days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSeries {
    pub family: ModelFamily,
    /// Penalty of the model that produced the series.
    pub alpha: f64,
    pub predictions: Vec<f64>,
}

impl ForecastSeries {
    /// `(min, max, mean)` of the series, or `None` when empty.
    pub fn summary(&self) -> Option<(f64, f64, f64)> {
        if self.predictions.is_empty() {
            return None;
        }
        let min = self.predictions.iter().copied().fold(f64::INFINITY, f64::min);
        let max = self.predictions.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = self.predictions.iter().sum::<f64>() / self.predictions.len() as f64;
        Some((min, max, mean))
    }
}

/// Synthetic days plus one aligned prediction series per family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastBatch {
    pub days: Vec<ForecastDay>,
    pub series: Vec<ForecastSeries>,
    pub model_source: ForecastModelSource,
    pub clamp: ClampPolicy,
}

impl ForecastBatch {
    pub fn series_for(&self, family: ModelFamily) -> Option<&ForecastSeries> {
        self.series.iter().find(|s| s.family == family)
    }
}
