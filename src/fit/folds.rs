//! K-fold partitioning for cross-validation.
//!
//! Folds are contiguous blocks over the training order. The first `n % k`
//! folds get one extra row, so fold sizes differ by at most one.

use std::ops::Range;

use crate::error::PipelineError;

/// Held-out index ranges for each fold.
pub fn kfold_ranges(n: usize, k: usize) -> Result<Vec<Range<usize>>, PipelineError> {
    if k < 2 {
        return Err(PipelineError::InvalidInput(format!(
            "cross-validation needs at least 2 folds, got {k}"
        )));
    }
    if n < k {
        return Err(PipelineError::InsufficientData(format!(
            "{n} training rows cannot be split into {k} folds"
        )));
    }

    let base = n / k;
    let extra = n % k;
    let mut out = Vec::with_capacity(k);
    let mut start = 0;
    for fold in 0..k {
        let size = base + usize::from(fold < extra);
        out.push(start..start + size);
        start += size;
    }
    Ok(out)
}

/// Split `rows` into (training part, held-out part) for one fold.
pub fn split_fold<T: Clone>(rows: &[T], held_out: &Range<usize>) -> (Vec<T>, Vec<T>) {
    let mut train = Vec::with_capacity(rows.len() - held_out.len());
    train.extend_from_slice(&rows[..held_out.start]);
    train.extend_from_slice(&rows[held_out.end..]);
    (train, rows[held_out.clone()].to_vec())
}
