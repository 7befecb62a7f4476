//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the math/fitting code stays clean and testable
//! - output changes are localized

use crate::app::pipeline::{FamilyReport, PipelineOutput};
use crate::domain::{
    ClampPolicy, Feature, FeatureVector, ForecastBatch, ForecastModelSource, Observation, Prediction,
};
use crate::error::PipelineWarning;

/// Format the run summary: dataset, split, scaling and per-family evaluation.
pub fn format_run_summary(out: &PipelineOutput) -> String {
    let mut s = String::new();

    s.push_str("=== pwr - Power Plant Net Output ===\n");
    s.push_str(&format!("Source: {}\n", out.source));
    s.push_str(&format!(
        "Loaded: {} | rows={}\n",
        out.loaded_at.format("%Y-%m-%d %H:%M:%S UTC"),
        out.rows
    ));
    s.push_str(&format!("Split: train={} test={}\n", out.train_rows, out.test_rows));

    if !out.preview.is_empty() {
        s.push_str("\nFirst rows:\n");
        s.push_str(&format_dataset_preview(&out.preview));
    }

    s.push_str("\nScaling (train):\n");
    for feature in Feature::ALL {
        let j = feature.index();
        let flag = if out.scaling.degenerate.contains(&feature) {
            " (zero variance)"
        } else {
            ""
        };
        s.push_str(&format!(
            "  {:<18} mean={:>10.4} std={:>9.4}{flag}\n",
            feature.column_name(),
            out.scaling.mean[j],
            out.scaling.std[j]
        ));
    }

    s.push_str("\nModel evaluation (test set):\n");
    s.push_str(&format_evaluation_table(&out.families));
    s.push('\n');

    s
}

/// Observations as a table, source column order, net output last.
pub fn format_dataset_preview(rows: &[Observation]) -> String {
    let mut s = String::new();
    let mut header = format!("{:>4}", "#");
    for feature in Feature::ALL {
        header.push_str(&format!(" {:>18}", feature.column_name()));
    }
    header.push_str(&format!(" {:>10}", "Net"));
    s.push_str(&header);
    s.push('\n');

    for (i, o) in rows.iter().enumerate() {
        let mut line = format!("{i:>4}");
        for feature in Feature::ALL {
            line.push_str(&format!(" {:>18.2}", o.features.get(feature)));
        }
        line.push_str(&format!(" {:>10.2}", o.net_output));
        s.push_str(&line);
        s.push('\n');
    }
    s
}

/// Evaluation table: one row per family.
pub fn format_evaluation_table(families: &[FamilyReport]) -> String {
    let mut s = String::new();
    s.push_str(
        format!(
            "{:<12} {:>9} {:>12} {:>10} {:>8} {:<32}\n",
            "model", "alpha", "mse", "rmse", "r2", "weights"
        )
        .trim_end(),
    );
    s.push('\n');
    s.push_str(format!("{:-<12} {:-<9} {:-<12} {:-<10} {:-<8} {:-<32}\n", "", "", "", "", "", "").trim_end());
    s.push('\n');

    for f in families {
        s.push_str(
            format!(
                "{:<12} {:>9} {:>12.4} {:>10.4} {:>8.4} {}\n",
                f.model.family.display_name(),
                fmt_alpha(f.model.alpha),
                f.evaluation.mean_squared_error,
                f.evaluation.rmse,
                f.evaluation.r_squared,
                fmt_vec(&f.model.weights),
            )
            .trim_end(),
        );
        s.push('\n');
    }
    s
}

/// Mean cross-validated MSE per penalty; `*` marks each family's selection.
pub fn format_cv_table(families: &[FamilyReport]) -> String {
    let mut s = String::new();
    s.push_str("Cross-validation (mean MSE per penalty):\n");

    let mut header = format!("{:>9}", "alpha");
    for f in families {
        header.push_str(&format!(" {:>14}", f.model.family.short_name()));
    }
    s.push_str(header.trim_end());
    s.push('\n');

    let rows = families.first().map(|f| f.cv_scores.len()).unwrap_or(0);
    for i in 0..rows {
        let alpha = families[0].cv_scores[i].alpha;
        let mut line = format!("{:>9}", fmt_alpha(alpha));
        for f in families {
            let cell = match f.cv_scores.get(i) {
                Some(score) => {
                    let mark = if score.alpha == f.model.alpha { "*" } else { " " };
                    format!("{:.4}{mark}", score.mean_mse)
                }
                None => "-".to_string(),
            };
            line.push_str(&format!(" {cell:>14}"));
        }
        s.push_str(line.trim_end());
        s.push('\n');
    }
    s
}

/// Single-point predictions for the given input.
pub fn format_predictions(input: &FeatureVector, predictions: &[Prediction]) -> String {
    let mut s = String::new();
    s.push_str(&format!(
        "Prediction for T={:.2}{} V={:.2}{} AP={:.2}{} RH={:.2}{}:\n",
        input.avg_temperature,
        Feature::AvgTemperature.unit(),
        input.exhaust_vacuum,
        Feature::ExhaustVacuum.unit(),
        input.ambient_pressure,
        Feature::AmbientPressure.unit(),
        input.relative_humidity,
        Feature::RelativeHumidity.unit(),
    ));
    for p in predictions {
        s.push_str(&format!("  {:<12} {:>10.3} MW\n", p.family.display_name(), p.net_output));
    }
    s
}

/// Day-by-day forecast table followed by per-family summaries.
pub fn format_forecast(batch: &ForecastBatch) -> String {
    let mut s = String::new();
    s.push_str(&format!(
        "30-day forecast (models={}, clamp={}):\n",
        model_source_label(batch),
        clamp_label(batch)
    ));

    let mut header = format!("{:>4} {:>8} {:>8} {:>9} {:>8}", "day", "T", "V", "AP", "RH");
    for series in &batch.series {
        header.push_str(&format!(" {:>9}", series.family.short_name()));
    }
    s.push_str(header.trim_end());
    s.push('\n');

    for (i, day) in batch.days.iter().enumerate() {
        let f = &day.features;
        let mut line = format!(
            "{:>4} {:>8.2} {:>8.2} {:>9.2} {:>8.2}",
            day.day, f.avg_temperature, f.exhaust_vacuum, f.ambient_pressure, f.relative_humidity
        );
        for series in &batch.series {
            match series.predictions.get(i) {
                Some(p) => line.push_str(&format!(" {p:>9.2}")),
                None => line.push_str(&format!(" {:>9}", "-")),
            }
        }
        if day.clamped {
            line.push_str(" c");
        }
        s.push_str(line.trim_end());
        s.push('\n');
    }

    s.push('\n');
    for series in &batch.series {
        if let Some((min, max, mean)) = series.summary() {
            s.push_str(&format!(
                "  {:<12} alpha={:<7} min={min:.2} max={max:.2} mean={mean:.2} MW\n",
                series.family.display_name(),
                fmt_alpha(series.alpha),
            ));
        }
    }
    s
}

/// Warning list, or an empty string when there are none.
pub fn format_warnings(warnings: &[PipelineWarning]) -> String {
    if warnings.is_empty() {
        return String::new();
    }
    let mut s = format!("Warnings ({}):\n", warnings.len());
    for w in warnings {
        s.push_str(&format!("  - {w}\n"));
    }
    s
}

fn model_source_label(batch: &ForecastBatch) -> &'static str {
    match batch.model_source {
        ForecastModelSource::TunedModel => "tuned",
        ForecastModelSource::DefaultModel => "default",
    }
}

fn clamp_label(batch: &ForecastBatch) -> &'static str {
    match batch.clamp {
        ClampPolicy::Unclamped => "unclamped",
        ClampPolicy::PhysicalBounds => "physical-bounds",
    }
}

fn fmt_alpha(alpha: f64) -> String {
    format!("{alpha}")
}

fn fmt_vec(v: &[f64]) -> String {
    let parts: Vec<String> = v.iter().map(|x| format!("{x:.4}")).collect();
    format!("[{}]", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CvScore, EvaluationResult, FittedModel, ForecastDay, ForecastSeries, ModelFamily};

    fn report(family: ModelFamily, alpha: f64) -> FamilyReport {
        FamilyReport {
            model: FittedModel {
                family,
                alpha,
                weights: [-14.5, -2.75, 0.5, -2.0],
                intercept: 454.3,
                iterations: 12,
                converged: true,
            },
            cv_scores: vec![
                CvScore {
                    alpha: 0.001,
                    mean_mse: 20.5,
                    fold_mse: vec![],
                },
                CvScore {
                    alpha: 0.01,
                    mean_mse: 20.75,
                    fold_mse: vec![],
                },
            ],
            evaluation: EvaluationResult {
                mean_squared_error: 21.0,
                r_squared: 0.93,
                rmse: 21.0_f64.sqrt(),
                n: 10,
            },
        }
    }

    #[test]
    fn dataset_preview_lists_rows_in_order() {
        let rows = [
            Observation {
                features: FeatureVector::new(14.96, 41.76, 1024.07, 73.17),
                net_output: 463.26,
            },
            Observation {
                features: FeatureVector::new(25.18, 62.96, 1020.04, 59.08),
                net_output: 444.37,
            },
        ];
        let txt = format_dataset_preview(&rows);
        let lines: Vec<&str> = txt.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with("Net"));
        assert_eq!(
            lines[1].split_whitespace().collect::<Vec<_>>(),
            vec!["0", "14.96", "41.76", "1024.07", "73.17", "463.26"]
        );
        assert!(lines[2].trim_start().starts_with("1 "));
        assert!(format_dataset_preview(&[]).lines().count() == 1);
    }

    #[test]
    fn evaluation_table_has_row_per_family() {
        let fams = vec![report(ModelFamily::L1, 0.001), report(ModelFamily::L2, 0.01)];
        let txt = format_evaluation_table(&fams);
        let lines: Vec<&str> = txt.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[2].starts_with("Lasso (L1)"));
        assert!(lines[3].starts_with("Ridge (L2)"));
        assert!(lines[2].contains("21.0000"));
        assert!(lines[2].contains("0.9300"));
    }

    #[test]
    fn cv_table_marks_selected_penalty() {
        let fams = vec![report(ModelFamily::L1, 0.001), report(ModelFamily::Mixed, 0.01)];
        let txt = format_cv_table(&fams);
        let lines: Vec<&str> = txt.lines().collect();
        assert_eq!(lines[1].split_whitespace().collect::<Vec<_>>(), vec!["alpha", "l1", "mixed"]);
        assert_eq!(
            lines[2].split_whitespace().collect::<Vec<_>>(),
            vec!["0.001", "20.5000*", "20.5000"]
        );
        assert_eq!(
            lines[3].split_whitespace().collect::<Vec<_>>(),
            vec!["0.01", "20.7500", "20.7500*"]
        );
    }

    #[test]
    fn forecast_table_lists_days_and_summaries() {
        let batch = ForecastBatch {
            days: (1..=2)
                .map(|day| ForecastDay {
                    day,
                    features: FeatureVector::new(25.0, 55.0, 1010.0, 50.0),
                    clamped: day == 2,
                })
                .collect(),
            series: vec![ForecastSeries {
                family: ModelFamily::L2,
                alpha: 1.0,
                predictions: vec![470.0, 480.0],
            }],
            model_source: ForecastModelSource::DefaultModel,
            clamp: ClampPolicy::Unclamped,
        };
        let txt = format_forecast(&batch);
        assert!(txt.starts_with("30-day forecast (models=default, clamp=unclamped):\n"));
        assert!(txt.contains("   1    25.00    55.00   1010.00    50.00    470.00\n"));
        assert!(txt.contains("480.00 c\n"));
        assert!(txt.contains("min=470.00 max=480.00 mean=475.00 MW"));
    }

    #[test]
    fn warnings_section_is_empty_without_warnings() {
        assert_eq!(format_warnings(&[]), "");
        let txt = format_warnings(&[PipelineWarning::ForecastRowClamped { day: 3 }]);
        assert_eq!(txt, "Warnings (1):\n  - forecast day 3 clamped to physical bounds\n");
    }

    #[test]
    fn predictions_list_units() {
        let txt = format_predictions(
            &FeatureVector::new(25.0, 55.0, 1010.0, 50.0),
            &[Prediction {
                family: ModelFamily::Mixed,
                net_output: 477.5,
            }],
        );
        assert!(txt.contains("T=25.00°C"));
        assert!(txt.contains("Elastic Net"));
        assert!(txt.contains("477.500 MW"));
    }
}
