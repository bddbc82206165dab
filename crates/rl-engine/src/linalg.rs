//! Dense linear-algebra kernel for the bandit statistics.
//!
//! The [`LinearAlgebra`] trait is the seam between the model and the
//! numerics. Every primitive except `inverse` has a shared implementation on
//! top of `ndarray`; implementors choose how to invert. Two backends ship:
//!
//! - [`GaussJordan`]: partial-pivot Gauss–Jordan, works for any invertible matrix
//! - [`Cholesky`]: LLᵗ factorisation, only for symmetric positive definite input
//!
//! Both refuse ill-conditioned input instead of returning garbage: a matrix is
//! treated as singular when a pivot falls below `pivot_tolerance` relative to
//! the largest entry, or when the 1-norm condition number of the result
//! exceeds `max_condition_number`.
//!
//! The pivot check runs during elimination, the condition check on the
//! finished inverse. For a diagonal matrix the condition number is the ratio
//! of the largest to the smallest entry, so the pivot check rejects it first
//! once that ratio passes `1 / pivot_tolerance`. The condition check catches
//! matrices whose pivots all look healthy but whose inverse still blows up,
//! such as long triangular chains.

use dealflow_core::config::LinalgConfig;
use dealflow_core::{DealflowError, DealflowResult};
use ndarray::{Array1, Array2};

pub type Matrix = Array2<f64>;
pub type Vector = Array1<f64>;

pub trait LinearAlgebra: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &'static str;

    /// Return `n` such that `m · n = I`.
    fn inverse(&self, m: &Matrix) -> DealflowResult<Matrix>;

    fn identity(&self, d: usize) -> Matrix {
        Array2::eye(d)
    }

    fn zero(&self, d: usize) -> Vector {
        Array1::zeros(d)
    }

    fn mat_vec(&self, m: &Matrix, v: &Vector) -> DealflowResult<Vector> {
        if v.len() != m.ncols() {
            return Err(DealflowError::dimension(m.ncols(), v.len()));
        }
        Ok(m.dot(v))
    }

    fn dot(&self, u: &Vector, v: &Vector) -> DealflowResult<f64> {
        if u.len() != v.len() {
            return Err(DealflowError::dimension(u.len(), v.len()));
        }
        Ok(u.dot(v))
    }

    /// `a + x·xᵗ`. `a` must be square with side `len(x)`.
    fn add_outer_product(&self, a: &Matrix, x: &Vector) -> DealflowResult<Matrix> {
        let d = square_dim(a)?;
        if x.len() != d {
            return Err(DealflowError::dimension(d, x.len()));
        }
        let mut out = a.clone();
        for i in 0..d {
            for j in 0..d {
                out[[i, j]] += x[i] * x[j];
            }
        }
        Ok(out)
    }

    fn add_vectors(&self, a: &Vector, b: &Vector) -> DealflowResult<Vector> {
        if a.len() != b.len() {
            return Err(DealflowError::dimension(a.len(), b.len()));
        }
        Ok(a + b)
    }

    fn scale(&self, v: &Vector, s: f64) -> Vector {
        v.mapv(|e| e * s)
    }
}

/// Partial-pivot Gauss–Jordan elimination on an augmented `[M | I]` system.
#[derive(Debug, Clone)]
pub struct GaussJordan {
    pivot_tolerance: f64,
    max_condition_number: f64,
}

impl GaussJordan {
    pub fn new(config: &LinalgConfig) -> Self {
        Self {
            pivot_tolerance: config.pivot_tolerance,
            max_condition_number: config.max_condition_number,
        }
    }
}

impl Default for GaussJordan {
    fn default() -> Self {
        Self::new(&LinalgConfig::default())
    }
}

impl LinearAlgebra for GaussJordan {
    fn name(&self) -> &'static str {
        "gauss_jordan"
    }

    fn inverse(&self, m: &Matrix) -> DealflowResult<Matrix> {
        let n = square_dim(m)?;
        let tol = self.pivot_tolerance * checked_scale(m)?;

        let mut a = m.clone();
        let mut inv = Array2::<f64>::eye(n);

        for col in 0..n {
            let mut pivot_row = col;
            for row in (col + 1)..n {
                if a[[row, col]].abs() > a[[pivot_row, col]].abs() {
                    pivot_row = row;
                }
            }

            let pivot = a[[pivot_row, col]];
            if pivot.abs() < tol {
                return Err(DealflowError::SingularMatrix(format!(
                    "pivot {pivot:e} in column {col} is below tolerance {tol:e}"
                )));
            }

            if pivot_row != col {
                for k in 0..n {
                    a.swap([col, k], [pivot_row, k]);
                    inv.swap([col, k], [pivot_row, k]);
                }
            }

            for k in 0..n {
                a[[col, k]] /= pivot;
                inv[[col, k]] /= pivot;
            }

            for row in 0..n {
                if row == col {
                    continue;
                }
                let factor = a[[row, col]];
                if factor == 0.0 {
                    continue;
                }
                for k in 0..n {
                    let da = factor * a[[col, k]];
                    let di = factor * inv[[col, k]];
                    a[[row, k]] -= da;
                    inv[[row, k]] -= di;
                }
            }
        }

        guard_condition(m, &inv, self.max_condition_number)?;
        Ok(inv)
    }
}

/// Cholesky-based inversion for symmetric positive definite matrices. The
/// bandit covariance is always SPD, so this is a drop-in alternative to
/// [`GaussJordan`] that also rejects input violating that invariant.
#[derive(Debug, Clone)]
pub struct Cholesky {
    pivot_tolerance: f64,
    max_condition_number: f64,
}

impl Cholesky {
    pub fn new(config: &LinalgConfig) -> Self {
        Self {
            pivot_tolerance: config.pivot_tolerance,
            max_condition_number: config.max_condition_number,
        }
    }
}

impl Default for Cholesky {
    fn default() -> Self {
        Self::new(&LinalgConfig::default())
    }
}

impl LinearAlgebra for Cholesky {
    fn name(&self) -> &'static str {
        "cholesky"
    }

    fn inverse(&self, m: &Matrix) -> DealflowResult<Matrix> {
        let n = square_dim(m)?;
        let scale = checked_scale(m)?;
        let tol = self.pivot_tolerance * scale;

        for i in 0..n {
            for j in (i + 1)..n {
                if (m[[i, j]] - m[[j, i]]).abs() > tol {
                    return Err(DealflowError::SingularMatrix(format!(
                        "matrix is not symmetric at ({i}, {j})"
                    )));
                }
            }
        }

        // m = L·Lᵗ
        let mut l = Array2::<f64>::zeros((n, n));
        for j in 0..n {
            let mut diag = m[[j, j]];
            for k in 0..j {
                diag -= l[[j, k]] * l[[j, k]];
            }
            if diag <= tol {
                return Err(DealflowError::SingularMatrix(format!(
                    "matrix is not positive definite (pivot {diag:e} in column {j})"
                )));
            }
            let ljj = diag.sqrt();
            l[[j, j]] = ljj;
            for i in (j + 1)..n {
                let mut acc = m[[i, j]];
                for k in 0..j {
                    acc -= l[[i, k]] * l[[j, k]];
                }
                l[[i, j]] = acc / ljj;
            }
        }

        // L⁻¹ by forward substitution, then m⁻¹ = L⁻ᵗ·L⁻¹.
        let mut l_inv = Array2::<f64>::zeros((n, n));
        for i in 0..n {
            l_inv[[i, i]] = 1.0 / l[[i, i]];
            for j in 0..i {
                let mut acc = 0.0;
                for k in j..i {
                    acc += l[[i, k]] * l_inv[[k, j]];
                }
                l_inv[[i, j]] = -acc / l[[i, i]];
            }
        }
        let inv = l_inv.t().dot(&l_inv);

        guard_condition(m, &inv, self.max_condition_number)?;
        Ok(inv)
    }
}

/// Side length of a square matrix, or `DimensionMismatch`.
pub fn square_dim(m: &Matrix) -> DealflowResult<usize> {
    let (rows, cols) = m.dim();
    if rows != cols {
        return Err(DealflowError::dimension(rows, cols));
    }
    Ok(rows)
}

/// `true` when `m` equals its transpose within `tol`.
pub fn is_symmetric(m: &Matrix, tol: f64) -> bool {
    let (rows, cols) = m.dim();
    rows == cols
        && (0..rows).all(|i| ((i + 1)..cols).all(|j| (m[[i, j]] - m[[j, i]]).abs() <= tol))
}

/// Largest absolute entry; rejects non-finite and all-zero matrices.
fn checked_scale(m: &Matrix) -> DealflowResult<f64> {
    let mut scale = 0.0f64;
    for &v in m.iter() {
        if !v.is_finite() {
            return Err(DealflowError::SingularMatrix(
                "matrix contains non-finite entries".into(),
            ));
        }
        scale = scale.max(v.abs());
    }
    if scale == 0.0 && !m.is_empty() {
        return Err(DealflowError::SingularMatrix("matrix is all zeros".into()));
    }
    Ok(scale)
}

fn norm_1(m: &Matrix) -> f64 {
    m.columns()
        .into_iter()
        .map(|c| c.iter().map(|v| v.abs()).sum::<f64>())
        .fold(0.0, f64::max)
}

fn guard_condition(m: &Matrix, inv: &Matrix, max_condition: f64) -> DealflowResult<()> {
    if inv.iter().any(|v| !v.is_finite()) {
        return Err(DealflowError::SingularMatrix(
            "inverse contains non-finite entries".into(),
        ));
    }
    let condition = norm_1(m) * norm_1(inv);
    if !condition.is_finite() || condition > max_condition {
        return Err(DealflowError::SingularMatrix(format!(
            "condition number {condition:e} exceeds {max_condition:e}"
        )));
    }
    Ok(())
}
