//! Cyclic coordinate descent for the elastic-net objective.
//!
//! On centered data we minimize:
//!
//! ```text
//! ½‖y − Xw‖² + l1_reg·‖w‖₁ + ½·l2_reg·‖w‖²
//! ```
//!
//! Callers fold the sample count into the penalties (`l1_reg = n·α·ρ`,
//! `l2_reg = n·α·(1−ρ)`), which gives the usual `1/2n` data term. Pure L1 is
//! `l2_reg = 0`.
//!
//! Stopping rule: after a sweep whose largest weight update is small relative
//! to the largest weight, the duality gap is checked against `tol·‖y‖²`.
//! Running out of sweeps is reported, not treated as an error.

use nalgebra::{DMatrix, DVector};

use crate::domain::SolverSettings;

/// Result of a coordinate descent run.
#[derive(Debug, Clone)]
pub struct CdOutcome {
    pub weights: DVector<f64>,
    /// Number of full sweeps performed.
    pub iterations: usize,
    pub converged: bool,
}

pub fn coordinate_descent(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    l1_reg: f64,
    l2_reg: f64,
    settings: &SolverSettings,
) -> CdOutcome {
    let p = x.ncols();
    let mut w = DVector::<f64>::zeros(p);
    let mut residual = y.clone();

    let col_sq: Vec<f64> = (0..p).map(|j| x.column(j).norm_squared()).collect();
    let tol = settings.tol * y.norm_squared();

    let mut iterations = 0;
    let mut converged = false;

    for sweep in 1..=settings.max_iter.max(1) {
        iterations = sweep;
        let mut max_dw = 0.0_f64;
        let mut max_w = 0.0_f64;

        for j in 0..p {
            if col_sq[j] == 0.0 {
                continue;
            }
            let w_old = w[j];
            let rho = x.column(j).dot(&residual) + w_old * col_sq[j];
            let w_new = soft_threshold(rho, l1_reg) / (col_sq[j] + l2_reg);

            if w_new != w_old {
                residual.axpy(w_old - w_new, &x.column(j), 1.0);
                w[j] = w_new;
            }

            max_dw = max_dw.max((w_new - w_old).abs());
            max_w = max_w.max(w_new.abs());
        }

        let small_step = max_w == 0.0 || max_dw / max_w < settings.tol;
        if small_step && duality_gap(x, y, &w, &residual, l1_reg, l2_reg) <= tol {
            converged = true;
            break;
        }
    }

    CdOutcome {
        weights: w,
        iterations,
        converged,
    }
}

fn soft_threshold(z: f64, gamma: f64) -> f64 {
    if z > gamma {
        z - gamma
    } else if z < -gamma {
        z + gamma
    } else {
        0.0
    }
}

fn duality_gap(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    w: &DVector<f64>,
    residual: &DVector<f64>,
    l1_reg: f64,
    l2_reg: f64,
) -> f64 {
    let xt_a = x.tr_mul(residual) - w * l2_reg;
    let dual_norm = xt_a.amax();
    let r_norm2 = residual.norm_squared();
    let w_norm2 = w.norm_squared();

    let (scale, mut gap) = if dual_norm > l1_reg {
        let c = l1_reg / dual_norm;
        (c, 0.5 * (r_norm2 + r_norm2 * c * c))
    } else {
        (1.0, r_norm2)
    };

    let l1_norm = w.lp_norm(1);
    gap += l1_reg * l1_norm - scale * residual.dot(y) + 0.5 * l2_reg * (1.0 + scale * scale) * w_norm2;
    gap
}
