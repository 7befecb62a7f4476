//! Export a forecast batch to CSV.
//!
//! One row per synthetic day: the drawn features followed by each family's
//! prediction, so the file opens directly in a spreadsheet.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::{ForecastBatch, ModelFamily};
use crate::error::AppError;

/// Write the forecast days and predictions to a CSV file.
///
/// Columns: `day,temperature,vacuum,pressure,humidity,l1,l2,mixed,clamped`.
/// A family missing from the batch leaves its column empty.
pub fn write_forecast_csv(path: &Path, batch: &ForecastBatch) -> Result<(), AppError> {
    let mut file = File::create(path)
        .map_err(|e| AppError::new(4, format!("Failed to create forecast CSV '{}': {e}", path.display())))?;

    let names: Vec<&str> = ModelFamily::ALL.iter().map(|f| f.short_name()).collect();
    writeln!(
        file,
        "day,temperature,vacuum,pressure,humidity,{},clamped",
        names.join(",")
    )
    .map_err(|e| AppError::new(4, format!("Failed to write forecast CSV header: {e}")))?;

    let series: Vec<_> = ModelFamily::ALL.iter().map(|f| batch.series_for(*f)).collect();
    for (i, day) in batch.days.iter().enumerate() {
        let f = &day.features;
        let preds: Vec<String> = series
            .iter()
            .map(|s| {
                s.and_then(|s| s.predictions.get(i))
                    .map(|p| format!("{p:.6}"))
                    .unwrap_or_default()
            })
            .collect();
        writeln!(
            file,
            "{},{:.6},{:.6},{:.6},{:.6},{},{}",
            day.day,
            f.avg_temperature,
            f.exhaust_vacuum,
            f.ambient_pressure,
            f.relative_humidity,
            preds.join(","),
            day.clamped,
        )
        .map_err(|e| AppError::new(4, format!("Failed to write forecast CSV row: {e}")))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ClampPolicy, FeatureVector, ForecastDay, ForecastModelSource, ForecastSeries};

    #[test]
    fn writes_header_and_one_row_per_day() {
        let batch = ForecastBatch {
            days: vec![
                ForecastDay {
                    day: 1,
                    features: FeatureVector::new(25.0, 55.0, 1010.0, 50.0),
                    clamped: false,
                },
                ForecastDay {
                    day: 2,
                    features: FeatureVector::new(26.0, 54.0, 1000.0, 0.0),
                    clamped: true,
                },
            ],
            series: vec![
                ForecastSeries {
                    family: ModelFamily::L1,
                    alpha: 1.0,
                    predictions: vec![470.0, 471.5],
                },
                ForecastSeries {
                    family: ModelFamily::Mixed,
                    alpha: 1.0,
                    predictions: vec![469.0, 470.25],
                },
            ],
            model_source: ForecastModelSource::DefaultModel,
            clamp: ClampPolicy::PhysicalBounds,
        };

        let path = std::env::temp_dir().join(format!("pwr-forecast-{}.csv", std::process::id()));
        write_forecast_csv(&path, &batch).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "day,temperature,vacuum,pressure,humidity,l1,l2,mixed,clamped");
        assert_eq!(
            lines[2],
            "2,26.000000,54.000000,1000.000000,0.000000,471.500000,,470.250000,true"
        );
    }

    #[test]
    fn unwritable_path_is_an_error() {
        let batch = ForecastBatch {
            days: vec![],
            series: vec![],
            model_source: ForecastModelSource::TunedModel,
            clamp: ClampPolicy::Unclamped,
        };
        let path = std::env::temp_dir().join("pwr-no-such-dir").join("x").join("f.csv");
        let err = write_forecast_csv(&path, &batch).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }
}
