//! Penalty selection by cross-validated grid search.
//!
//! For each family:
//! 1. For every penalty in the grid, fit on k−1 folds and score MSE on the held-out fold
//! 2. Average the fold scores per penalty
//! 3. Pick the penalty with the lowest mean score (ties go to the smaller penalty)
//! 4. Refit on the full training set at that penalty
//!
//! Every (penalty, fold) pair is independent, so they may be evaluated on the
//! rayon pool. Results are collected in grid/fold order, which keeps the
//! selection independent of scheduling.

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::domain::{CvScore, FEATURE_COUNT, FittedModel, ModelFamily};
use crate::error::{PipelineError, PipelineWarning};
use crate::fit::fitter::{FitOptions, fit_family};
use crate::fit::folds::{kfold_ranges, split_fold};
use crate::fit::penalty_grid::validate_grid;
use crate::models::predict_scaled;

/// Grid search settings.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub grid: Vec<f64>,
    pub folds: usize,
    pub fit: FitOptions,
    /// Evaluate (penalty, fold) pairs in parallel.
    pub parallel: bool,
}

/// Output of the grid search for one family.
#[derive(Debug, Clone)]
pub struct FamilySelection {
    /// Model refit on the full training set at the selected penalty.
    pub model: FittedModel,
    /// Mean CV error per grid point, in grid order.
    pub cv_scores: Vec<CvScore>,
}

/// Run the grid search for one family.
pub fn grid_search(
    family: ModelFamily,
    rows: &[[f64; FEATURE_COUNT]],
    y: &[f64],
    opts: &SearchOptions,
) -> Result<(FamilySelection, Vec<PipelineWarning>), PipelineError> {
    validate_grid(&opts.grid)?;
    let folds = kfold_ranges(rows.len(), opts.folds)?;

    let jobs: Vec<(usize, usize)> = (0..opts.grid.len())
        .flat_map(|a| (0..folds.len()).map(move |f| (a, f)))
        .collect();

    let run_job = |&(a, f): &(usize, usize)| -> Result<(f64, bool), PipelineError> {
        let (train_x, test_x) = split_fold(rows, &folds[f]);
        let (train_y, test_y) = split_fold(y, &folds[f]);
        let model = fit_family(family, &train_x, &train_y, opts.grid[a], &opts.fit)?;
        let mse = fold_mse(&model, &test_x, &test_y);
        Ok((mse, model.converged))
    };

    let results: Vec<Result<(f64, bool), PipelineError>> = if opts.parallel {
        jobs.par_iter().map(run_job).collect()
    } else {
        jobs.iter().map(run_job).collect()
    };

    let mut cv_scores: Vec<CvScore> = opts
        .grid
        .iter()
        .map(|&alpha| CvScore {
            alpha,
            mean_mse: 0.0,
            fold_mse: Vec::with_capacity(folds.len()),
        })
        .collect();
    let mut unconverged_folds = 0usize;
    for (&(a, _), result) in jobs.iter().zip(results) {
        let (mse, converged) = result?;
        if !converged {
            unconverged_folds += 1;
        }
        cv_scores[a].fold_mse.push(mse);
    }
    for score in cv_scores.iter_mut() {
        score.mean_mse = score.fold_mse.iter().sum::<f64>() / score.fold_mse.len() as f64;
        debug!(
            family = family.short_name(),
            alpha = score.alpha,
            mean_mse = score.mean_mse,
            "cv score"
        );
    }
    if unconverged_folds > 0 {
        debug!(
            family = family.short_name(),
            unconverged_folds, "some CV fits hit the iteration budget"
        );
    }

    let best_alpha = select_best(&cv_scores).ok_or_else(|| {
        PipelineError::Solver(format!(
            "{}: no finite cross-validation score",
            family.display_name()
        ))
    })?;

    let model = fit_family(family, rows, y, best_alpha, &opts.fit)?;
    info!(
        family = family.short_name(),
        alpha = best_alpha,
        "selected penalty"
    );

    let mut warnings = Vec::new();
    if let Some(w) = convergence_warning(&model) {
        warnings.push(w);
    }

    Ok((FamilySelection { model, cv_scores }, warnings))
}

/// Run the grid search for all three families, in `ModelFamily::ALL` order.
pub fn select_all(
    rows: &[[f64; FEATURE_COUNT]],
    y: &[f64],
    opts: &SearchOptions,
) -> Result<(Vec<FamilySelection>, Vec<PipelineWarning>), PipelineError> {
    let mut selections = Vec::with_capacity(ModelFamily::ALL.len());
    let mut warnings = Vec::new();
    for family in ModelFamily::ALL {
        let (selection, w) = grid_search(family, rows, y, opts)?;
        selections.push(selection);
        warnings.extend(w);
    }
    Ok((selections, warnings))
}

/// Fit every family once at a fixed penalty, without any search.
pub fn fit_untuned(
    rows: &[[f64; FEATURE_COUNT]],
    y: &[f64],
    alpha: f64,
    opts: &FitOptions,
) -> Result<(Vec<FittedModel>, Vec<PipelineWarning>), PipelineError> {
    let mut models = Vec::with_capacity(ModelFamily::ALL.len());
    let mut warnings = Vec::new();
    for family in ModelFamily::ALL {
        let model = fit_family(family, rows, y, alpha, opts)?;
        if let Some(w) = convergence_warning(&model) {
            warnings.push(w);
        }
        models.push(model);
    }
    Ok((models, warnings))
}

/// Lowest finite mean score; the first (smallest) penalty wins ties.
fn select_best(scores: &[CvScore]) -> Option<f64> {
    let mut best: Option<&CvScore> = None;
    for s in scores.iter().filter(|s| s.mean_mse.is_finite()) {
        match best {
            Some(b) if s.mean_mse >= b.mean_mse => {}
            _ => best = Some(s),
        }
    }
    best.map(|s| s.alpha)
}

fn fold_mse(model: &FittedModel, rows: &[[f64; FEATURE_COUNT]], y: &[f64]) -> f64 {
    let sse: f64 = rows
        .iter()
        .zip(y.iter())
        .map(|(r, t)| {
            let e = t - predict_scaled(model, r);
            e * e
        })
        .sum();
    sse / rows.len() as f64
}

fn convergence_warning(model: &FittedModel) -> Option<PipelineWarning> {
    if model.converged {
        return None;
    }
    warn!(
        family = model.family.short_name(),
        alpha = model.alpha,
        iterations = model.iterations,
        "solver did not converge; using last iterate"
    );
    Some(PipelineWarning::NonConvergence {
        family: model.family,
        alpha: model.alpha,
        iterations: model.iterations,
    })
}
