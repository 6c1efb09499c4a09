// src/services/ols.rs
//! Penalised least squares used by the forecasting model.

use crate::error::{PipelineError, Result};

/// Solve `(X'X + diag(penalties)) b = X'y` for `b`.
///
/// `design` holds one row per observation; every row must have
/// `penalties.len()` columns.
pub fn ridge_fit(design: &[Vec<f64>], y: &[f64], penalties: &[f64]) -> Result<Vec<f64>> {
    let k = penalties.len();
    if design.len() != y.len() {
        return Err(PipelineError::ModelFit(format!(
            "design has {} rows but target has {} values",
            design.len(),
            y.len()
        )));
    }
    if k == 0 {
        return Err(PipelineError::ModelFit("design has no columns".to_string()));
    }

    let mut xtx = vec![vec![0.0; k]; k];
    let mut xty = vec![0.0; k];

    for (row, &y_obs) in design.iter().zip(y) {
        if row.len() != k {
            return Err(PipelineError::ModelFit(format!(
                "design row has {} columns, expected {}",
                row.len(),
                k
            )));
        }
        for i in 0..k {
            xty[i] += row[i] * y_obs;
            for j in 0..=i {
                xtx[i][j] += row[i] * row[j];
            }
        }
    }

    for i in 0..k {
        for j in 0..i {
            xtx[j][i] = xtx[i][j];
        }
        xtx[i][i] += penalties[i];
    }

    Cholesky::factor(&xtx)?.solve(&xty)
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Lower-triangular factor `L` of a symmetric positive definite matrix,
/// stored row by row with row `i` holding `i + 1` entries.
#[derive(Debug, Clone)]
pub struct Cholesky {
    rows: Vec<Vec<f64>>,
}

impl Cholesky {
    pub fn factor(a: &[Vec<f64>]) -> Result<Self> {
        let mut rows: Vec<Vec<f64>> = Vec::with_capacity(a.len());

        for (i, a_row) in a.iter().enumerate() {
            if a_row.len() != a.len() {
                return Err(PipelineError::ModelFit(format!(
                    "normal matrix row {} has {} entries, expected {}",
                    i,
                    a_row.len(),
                    a.len()
                )));
            }

            let mut row = Vec::with_capacity(i + 1);
            for (j, prev) in rows.iter().enumerate() {
                let value = (a_row[j] - dot(&row[..j], &prev[..j])) / prev[j];
                row.push(value);
            }

            let pivot = a_row[i] - dot(&row, &row);
            if !(pivot.is_finite() && pivot > 0.0) {
                return Err(PipelineError::ModelFit(format!(
                    "normal equations are not positive definite (pivot {} is {})",
                    i, pivot
                )));
            }
            row.push(pivot.sqrt());
            rows.push(row);
        }

        Ok(Cholesky { rows })
    }

    pub fn dim(&self) -> usize {
        self.rows.len()
    }

    /// Solve `L L' x = b`.
    pub fn solve(&self, b: &[f64]) -> Result<Vec<f64>> {
        let n = self.dim();
        if b.len() != n {
            return Err(PipelineError::ModelFit(format!(
                "right-hand side has {} values, factor has dimension {}",
                b.len(),
                n
            )));
        }

        // forward: L z = b
        let mut z: Vec<f64> = Vec::with_capacity(n);
        for (row, &bi) in self.rows.iter().zip(b) {
            let i = z.len();
            z.push((bi - dot(&row[..i], &z)) / row[i]);
        }

        // backward: L' x = z, walking columns of L from the bottom
        let mut x = vec![0.0; n];
        for i in (0..n).rev() {
            let tail: f64 = ((i + 1)..n).map(|k| self.rows[k][i] * x[k]).sum();
            x[i] = (z[i] - tail) / self.rows[i][i];
        }

        Ok(x)
    }
}
