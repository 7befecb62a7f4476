//! Low-level fitting routine for a single family at a single penalty.
//!
//! Given scaled feature rows `x_i`, targets `y_i` and a penalty `α`, we:
//! - center `x` and `y` (the intercept is never penalized)
//! - solve for the weights with the family's solver
//! - recover the intercept as `ȳ − Σ wⱼ x̄ⱼ`
//!
//! Objectives:
//! - L1:    `(1/2n)‖y − Xw‖² + α‖w‖₁`                        (coordinate descent)
//! - L2:    `‖y − Xw‖² + α‖w‖²`                              (closed form)
//! - Mixed: `(1/2n)‖y − Xw‖² + αρ‖w‖₁ + ½α(1−ρ)‖w‖²`         (coordinate descent)

use nalgebra::{DMatrix, DVector};

use crate::domain::{FEATURE_COUNT, FittedModel, ModelFamily, SolverSettings};
use crate::error::PipelineError;
use crate::math::{coordinate_descent, solve_ridge};

/// Fitting options shared by every family.
#[derive(Debug, Clone, Copy)]
pub struct FitOptions {
    /// L1 share of the mixed penalty.
    pub mixing_ratio: f64,
    pub solver: SolverSettings,
}

/// Fit one family at one penalty strength.
pub fn fit_family(
    family: ModelFamily,
    rows: &[[f64; FEATURE_COUNT]],
    y: &[f64],
    alpha: f64,
    opts: &FitOptions,
) -> Result<FittedModel, PipelineError> {
    if rows.is_empty() {
        return Err(PipelineError::InsufficientData("no rows to fit".into()));
    }
    if rows.len() != y.len() {
        return Err(PipelineError::InvalidInput(format!(
            "feature rows ({}) and targets ({}) differ in length",
            rows.len(),
            y.len()
        )));
    }
    if !(alpha.is_finite() && alpha >= 0.0) {
        return Err(PipelineError::InvalidInput(format!("invalid penalty {alpha}")));
    }

    let n = rows.len();
    let (xc, yc, x_mean, y_mean) = center(rows, y);

    let (weights, iterations, converged) = match family {
        ModelFamily::L2 => {
            let w = solve_ridge(&xc, &yc, alpha).ok_or_else(|| {
                PipelineError::Solver(format!("ridge system is singular at alpha={alpha}"))
            })?;
            (w, 1, true)
        }
        ModelFamily::L1 => {
            let out = coordinate_descent(&xc, &yc, alpha * n as f64, 0.0, &opts.solver);
            (out.weights, out.iterations, out.converged)
        }
        ModelFamily::Mixed => {
            let rho = opts.mixing_ratio;
            let l1 = alpha * rho * n as f64;
            let l2 = alpha * (1.0 - rho) * n as f64;
            let out = coordinate_descent(&xc, &yc, l1, l2, &opts.solver);
            (out.weights, out.iterations, out.converged)
        }
    };

    let mut w = [0.0; FEATURE_COUNT];
    for (slot, v) in w.iter_mut().zip(weights.iter()) {
        *slot = *v;
    }
    let intercept = y_mean - w.iter().zip(x_mean.iter()).map(|(a, b)| a * b).sum::<f64>();

    if !(intercept.is_finite() && w.iter().all(|v| v.is_finite())) {
        return Err(PipelineError::Solver(format!(
            "{} produced non-finite coefficients at alpha={alpha}",
            family.display_name()
        )));
    }

    Ok(FittedModel {
        family,
        alpha,
        weights: w,
        intercept,
        iterations,
        converged,
    })
}

fn center(
    rows: &[[f64; FEATURE_COUNT]],
    y: &[f64],
) -> (DMatrix<f64>, DVector<f64>, [f64; FEATURE_COUNT], f64) {
    let n = rows.len();
    let mut x_mean = [0.0; FEATURE_COUNT];
    for row in rows {
        for (m, v) in x_mean.iter_mut().zip(row.iter()) {
            *m += v;
        }
    }
    for m in x_mean.iter_mut() {
        *m /= n as f64;
    }
    let y_mean = y.iter().sum::<f64>() / n as f64;

    let xc = DMatrix::from_fn(n, FEATURE_COUNT, |i, j| rows[i][j] - x_mean[j]);
    let yc = DVector::from_iterator(n, y.iter().map(|v| v - y_mean));
    (xc, yc, x_mean, y_mean)
}
