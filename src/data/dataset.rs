//! CSV parsing, schema validation, and the train/test split.
//!
//! Design goals:
//! - **Strict schema**: all five columns present exactly once, every value a finite number
//! - **Loud failures**: the first bad cell is reported with its line and column
//! - **Deterministic split**: seeded shuffle, exact counts

use std::collections::HashMap;
use std::io::Read;

use csv::StringRecord;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::domain::{
    Dataset, FEATURE_COLUMNS, FEATURE_COUNT, FeatureVector, Observation, Split, TARGET_COLUMN,
};
use crate::error::PipelineError;

/// Parse a dataset CSV from any reader.
///
/// Extra columns are ignored.
pub fn parse_dataset<R: Read>(reader: R) -> Result<Dataset, PipelineError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| PipelineError::DataMalformed(format!("failed to read CSV headers: {e}")))?
        .clone();

    let header_map = build_header_map(&headers)?;
    let feature_idx = resolve_columns(&header_map)?;
    let target_idx = header_map[TARGET_COLUMN];

    let mut observations = Vec::new();
    for (row, record) in reader.records().enumerate() {
        // Line 1 is the header.
        let line = row + 2;
        let record = record
            .map_err(|e| PipelineError::DataMalformed(format!("line {line}: unreadable record: {e}")))?;

        let mut values = [0.0; FEATURE_COUNT];
        for (slot, (&idx, name)) in values
            .iter_mut()
            .zip(feature_idx.iter().zip(FEATURE_COLUMNS.iter()))
        {
            *slot = parse_cell(&record, idx, name, line)?;
        }
        let net_output = parse_cell(&record, target_idx, TARGET_COLUMN, line)?;

        observations.push(Observation {
            features: FeatureVector::from_array(values),
            net_output,
        });
    }

    if observations.is_empty() {
        return Err(PipelineError::DataMalformed("dataset has zero rows".into()));
    }

    Ok(Dataset::new(observations))
}

/// Partition a dataset into train/test with a seeded shuffle.
///
/// The test set gets `ceil(test_fraction * n)` rows and the train set the rest.
pub fn split_dataset(
    dataset: &Dataset,
    test_fraction: f64,
    seed: u64,
    min_train: usize,
) -> Result<Split, PipelineError> {
    if !(test_fraction.is_finite() && test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(PipelineError::InvalidInput(format!(
            "test fraction must be in (0, 1), got {test_fraction}"
        )));
    }

    let n = dataset.len();
    let n_test = (test_fraction * n as f64).ceil() as usize;
    let n_train = n.saturating_sub(n_test);
    if n_test == 0 || n_train < min_train.max(1) {
        return Err(PipelineError::InsufficientData(format!(
            "{n} rows give train={n_train}, test={n_test}; need at least {} training rows",
            min_train.max(1)
        )));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let test = indices[..n_test]
        .iter()
        .map(|&i| dataset.observations[i])
        .collect();
    let train = indices[n_test..]
        .iter()
        .map(|&i| dataset.observations[i])
        .collect();

    Ok(Split { train, test })
}

fn build_header_map(headers: &StringRecord) -> Result<HashMap<String, usize>, PipelineError> {
    let mut map = HashMap::new();
    for (idx, name) in headers.iter().enumerate() {
        let name = name.trim().trim_start_matches('\u{feff}').to_string();
        let is_required = name == TARGET_COLUMN || FEATURE_COLUMNS.contains(&name.as_str());
        if map.insert(name.clone(), idx).is_some() && is_required {
            return Err(PipelineError::DataMalformed(format!(
                "column '{name}' appears more than once"
            )));
        }
    }
    Ok(map)
}

fn resolve_columns(
    header_map: &HashMap<String, usize>,
) -> Result<[usize; FEATURE_COUNT], PipelineError> {
    let missing: Vec<&str> = FEATURE_COLUMNS
        .iter()
        .chain(std::iter::once(&TARGET_COLUMN))
        .filter(|c| !header_map.contains_key(**c))
        .copied()
        .collect();
    if !missing.is_empty() {
        return Err(PipelineError::DataMalformed(format!(
            "missing required column(s): {}",
            missing.join(", ")
        )));
    }

    let mut idx = [0usize; FEATURE_COUNT];
    for (slot, name) in idx.iter_mut().zip(FEATURE_COLUMNS.iter()) {
        *slot = header_map[*name];
    }
    Ok(idx)
}

fn parse_cell(record: &StringRecord, idx: usize, column: &str, line: usize) -> Result<f64, PipelineError> {
    let raw = record.get(idx).ok_or_else(|| {
        PipelineError::DataMalformed(format!("line {line}: missing value for '{column}'"))
    })?;
    let value = raw.trim().parse::<f64>().map_err(|_| {
        PipelineError::DataMalformed(format!("line {line}: '{column}' is not numeric ('{raw}')"))
    })?;
    if !value.is_finite() {
        return Err(PipelineError::DataMalformed(format!(
            "line {line}: '{column}' is not finite ('{raw}')"
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Avg temperature,Exhaust vacuum,Ambient pressure,Relative humidity,Net hourly electrical energy output";

    fn dataset_of(n: usize) -> Dataset {
        Dataset::new(
            (0..n)
                .map(|i| Observation {
                    features: FeatureVector::new(i as f64, 0.0, 0.0, 0.0),
                    net_output: i as f64,
                })
                .collect(),
        )
    }

    #[test]
    fn parses_well_formed_csv() {
        let csv = format!("{HEADER}\n14.96,41.76,1024.07,73.17,463.26\n25.18,62.96,1020.04,59.08,444.37\n");
        let ds = parse_dataset(csv.as_bytes()).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.observations[0].features.avg_temperature, 14.96);
        assert_eq!(ds.observations[1].net_output, 444.37);
    }

    #[test]
    fn ignores_extra_columns_and_reordering() {
        let csv = "id,Net hourly electrical energy output,Relative humidity,Ambient pressure,Exhaust vacuum,Avg temperature\n\
                   7,450.0,60.0,1010.0,50.0,20.0\n";
        let ds = parse_dataset(csv.as_bytes()).unwrap();
        let o = ds.observations[0];
        assert_eq!(o.features, FeatureVector::new(20.0, 50.0, 1010.0, 60.0));
        assert_eq!(o.net_output, 450.0);
    }

    #[test]
    fn missing_column_is_malformed() {
        let csv = "Avg temperature,Exhaust vacuum,Ambient pressure,Net hourly electrical energy output\n1,2,3,4\n";
        let err = parse_dataset(csv.as_bytes()).unwrap_err();
        match err {
            PipelineError::DataMalformed(msg) => assert!(msg.contains("Relative humidity")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn duplicate_required_column_is_malformed() {
        let csv = format!("{HEADER},Avg temperature\n1,2,3,4,5,6\n");
        assert!(matches!(
            parse_dataset(csv.as_bytes()),
            Err(PipelineError::DataMalformed(_))
        ));
    }

    #[test]
    fn non_numeric_value_reports_line() {
        let csv = format!("{HEADER}\n1,2,3,4,5\n1,abc,3,4,5\n");
        match parse_dataset(csv.as_bytes()).unwrap_err() {
            PipelineError::DataMalformed(msg) => {
                assert!(msg.contains("line 3"), "{msg}");
                assert!(msg.contains("Exhaust vacuum"), "{msg}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn zero_rows_is_malformed() {
        let csv = format!("{HEADER}\n");
        assert!(matches!(
            parse_dataset(csv.as_bytes()),
            Err(PipelineError::DataMalformed(_))
        ));
    }

    #[test]
    fn split_counts_are_exact_and_disjoint() {
        let ds = dataset_of(101);
        let split = split_dataset(&ds, 0.15, 45, 5).unwrap();
        // ceil(0.15 * 101) = 16
        assert_eq!(split.test.len(), 16);
        assert_eq!(split.train.len(), 85);

        let mut seen: Vec<i64> = split
            .train
            .iter()
            .chain(split.test.iter())
            .map(|o| o.net_output as i64)
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..101).collect::<Vec<i64>>());
    }

    #[test]
    fn split_is_reproducible_for_a_seed() {
        let ds = dataset_of(50);
        let a = split_dataset(&ds, 0.15, 7, 5).unwrap();
        let b = split_dataset(&ds, 0.15, 7, 5).unwrap();
        let c = split_dataset(&ds, 0.15, 8, 5).unwrap();
        assert_eq!(a.test, b.test);
        assert_ne!(a.test, c.test);
    }

    #[test]
    fn split_rejects_tiny_datasets() {
        let ds = dataset_of(4);
        assert!(matches!(
            split_dataset(&ds, 0.15, 1, 5),
            Err(PipelineError::InsufficientData(_))
        ));
    }
}
