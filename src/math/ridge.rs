//! Ridge (L2) least squares solver.
//!
//! We solve, on centered data, the penalized normal equations:
//!
//! ```text
//! (XᵀX + αI) w = Xᵀy
//! ```
//!
//! Implementation choices:
//! - The system is tiny (4×4), so forming `XᵀX` directly is fine.
//! - Cholesky is tried first; for `α > 0` the matrix is positive definite.
//! - If Cholesky fails (α = 0 with collinear columns), fall back to SVD with
//!   progressively looser tolerances.

use nalgebra::{DMatrix, DVector};

/// Solve ridge regression for the weights (no intercept; center inputs first).
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_ridge(x: &DMatrix<f64>, y: &DVector<f64>, alpha: f64) -> Option<DVector<f64>> {
    if x.nrows() != y.len() || !(alpha.is_finite() && alpha >= 0.0) {
        return None;
    }

    let xt = x.transpose();
    let mut gram = &xt * x;
    for j in 0..gram.ncols() {
        gram[(j, j)] += alpha;
    }
    let rhs = &xt * y;

    if let Some(chol) = gram.clone().cholesky() {
        let w = chol.solve(&rhs);
        if w.iter().all(|v| v.is_finite()) {
            return Some(w);
        }
    }

    let svd = gram.svd(true, true);
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(w) = svd.solve(&rhs, tol) {
            if w.iter().all(|v| v.is_finite()) {
                return Some(w);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_penalty_recovers_least_squares() {
        // Centered x = [-1, 0, 1], y = 3x.
        let x = DMatrix::from_row_slice(3, 1, &[-1.0, 0.0, 1.0]);
        let y = DVector::from_row_slice(&[-3.0, 0.0, 3.0]);

        let w = solve_ridge(&x, &y, 0.0).unwrap();
        assert!((w[0] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn penalty_shrinks_toward_zero() {
        let x = DMatrix::from_row_slice(3, 1, &[-1.0, 0.0, 1.0]);
        let y = DVector::from_row_slice(&[-3.0, 0.0, 3.0]);

        // w = xᵀy / (xᵀx + α) = 6 / (2 + 2)
        let w = solve_ridge(&x, &y, 2.0).unwrap();
        assert!((w[0] - 1.5).abs() < 1e-12);
    }

    #[test]
    fn collinear_columns_still_fit() {
        let x = DMatrix::from_row_slice(3, 2, &[-1.0, -1.0, 0.0, 0.0, 1.0, 1.0]);
        let y = DVector::from_row_slice(&[-2.0, 0.0, 2.0]);

        let w = solve_ridge(&x, &y, 0.0).unwrap();
        assert!((w[0] + w[1] - 2.0).abs() < 1e-6);
    }
}
