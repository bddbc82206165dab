//! LinUCB, a single linear upper-confidence-bound model over candidate
//! feature vectors.
//!
//! The model keeps ridge-regression sufficient statistics `A = I + Σ xxᵗ` and
//! `b = Σ r·x`. A candidate `x` scores `θ·x + α·sqrt(xᵗA⁻¹x)` with
//! `θ = A⁻¹b`. The inverse is recomputed on every `score` call; `rank`
//! computes it once for the whole batch.

use crate::linalg::{is_symmetric, GaussJordan, LinearAlgebra, Matrix, Vector};
use chrono::{DateTime, Utc};
use dealflow_core::{DealflowError, DealflowResult};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Sufficient statistics of the model. This is the unit that the integrating
/// system persists between invocations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BanditState {
    #[serde(rename = "A", with = "matrix_rows")]
    pub a: Matrix,
    #[serde(with = "vector_items")]
    pub b: Vector,
    #[serde(default)]
    pub observations: u64,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

impl BanditState {
    /// Fresh state: `A = I`, `b = 0`.
    pub fn new(d: usize) -> Self {
        Self {
            a: Array2::eye(d),
            b: Array1::zeros(d),
            observations: 0,
            last_updated: None,
        }
    }

    pub fn dimension(&self) -> usize {
        self.b.len()
    }

    /// Check shape, finiteness and symmetry of externally supplied state.
    pub fn validate(&self) -> DealflowResult<()> {
        let d = self.b.len();
        let (rows, cols) = self.a.dim();
        if rows != d {
            return Err(DealflowError::dimension(d, rows));
        }
        if cols != d {
            return Err(DealflowError::dimension(d, cols));
        }
        if self.a.iter().chain(self.b.iter()).any(|v| !v.is_finite()) {
            return Err(DealflowError::InvalidInput(
                "bandit state contains non-finite values".into(),
            ));
        }
        let tol = 1e-9 * self.a.iter().fold(1.0f64, |m, v| m.max(v.abs()));
        if !is_symmetric(&self.a, tol) {
            return Err(DealflowError::InvalidInput(
                "bandit covariance matrix is not symmetric".into(),
            ));
        }
        Ok(())
    }
}

/// `A` as a list of rows.
mod matrix_rows {
    use super::Matrix;
    use ndarray::Array2;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(m: &Matrix, s: S) -> Result<S::Ok, S::Error> {
        let rows: Vec<Vec<f64>> = m.rows().into_iter().map(|r| r.to_vec()).collect();
        rows.serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Matrix, D::Error> {
        let rows = Vec::<Vec<f64>>::deserialize(d)?;
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|r| r.len() != n_cols) {
            return Err(D::Error::custom("matrix rows have different lengths"));
        }
        Array2::from_shape_vec((n_rows, n_cols), rows.into_iter().flatten().collect())
            .map_err(D::Error::custom)
    }
}

mod vector_items {
    use super::Vector;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(v: &Vector, s: S) -> Result<S::Ok, S::Error> {
        v.to_vec().serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vector, D::Error> {
        Ok(Vector::from(Vec::<f64>::deserialize(d)?))
    }
}

/// Components of a UCB score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub mean: f64,
    pub uncertainty: f64,
    pub score: f64,
}

pub struct LinUcb<K: LinearAlgebra = GaussJordan> {
    state: BanditState,
    alpha: f64,
    kernel: K,
}

impl LinUcb<GaussJordan> {
    pub fn new(d: usize, alpha: f64) -> DealflowResult<Self> {
        Self::with_kernel(d, alpha, GaussJordan::default())
    }
}

impl<K: LinearAlgebra> LinUcb<K> {
    pub fn with_kernel(d: usize, alpha: f64, kernel: K) -> DealflowResult<Self> {
        check_alpha(alpha)?;
        if d == 0 {
            return Err(DealflowError::InvalidInput(
                "feature dimension must be at least 1".into(),
            ));
        }
        debug!(dimension = d, alpha, kernel = kernel.name(), "LinUCB initialized");
        Ok(Self {
            state: BanditState::new(d),
            alpha,
            kernel,
        })
    }

    /// Resume from persisted state.
    pub fn from_state(state: BanditState, alpha: f64, kernel: K) -> DealflowResult<Self> {
        check_alpha(alpha)?;
        state.validate()?;
        if state.dimension() == 0 {
            return Err(DealflowError::InvalidInput(
                "feature dimension must be at least 1".into(),
            ));
        }
        Ok(Self {
            state,
            alpha,
            kernel,
        })
    }

    pub fn dimension(&self) -> usize {
        self.state.dimension()
    }

    pub fn state(&self) -> &BanditState {
        &self.state
    }

    pub fn into_state(self) -> BanditState {
        self.state
    }

    pub fn score(&self, x: &Vector) -> DealflowResult<f64> {
        self.score_detailed(x).map(|r| r.score)
    }

    pub fn score_detailed(&self, x: &Vector) -> DealflowResult<ScoreResult> {
        self.check_dim(x)?;
        let result = self.posterior()?.score(&self.kernel, x, self.alpha)?;
        metrics::counter!("bandit.scores").increment(1);
        Ok(result)
    }

    /// `A += x·xᵗ`, `b += reward·x`. Rejected with no state change when the
    /// new `A` would not pass the inversion guard.
    pub fn update(&mut self, x: &Vector, reward: f64) -> DealflowResult<()> {
        self.check_dim(x)?;
        if !reward.is_finite() {
            return Err(DealflowError::InvalidInput(format!(
                "reward must be finite, got {reward}"
            )));
        }

        let a = self.kernel.add_outer_product(&self.state.a, x)?;
        let b = self
            .kernel
            .add_vectors(&self.state.b, &self.kernel.scale(x, reward))?;
        // A that no longer inverts would fail every later score; keep the old state.
        self.kernel.inverse(&a).map_err(|e| {
            metrics::counter!("bandit.rejected_updates").increment(1);
            warn!(error = %e, "update rejected, covariance matrix would not be invertible");
            e
        })?;
        self.state.a = a;
        self.state.b = b;
        self.state.observations += 1;
        self.state.last_updated = Some(Utc::now());

        metrics::counter!("bandit.updates").increment(1);
        debug!(
            reward,
            observations = self.state.observations,
            "LinUCB statistics updated"
        );
        Ok(())
    }

    /// Score every candidate and order by descending score. Equal scores keep
    /// their input order. The first failure aborts the whole call.
    pub fn rank<'a>(&self, candidates: &'a [Vector]) -> DealflowResult<Vec<(&'a Vector, f64)>> {
        Ok(self
            .rank_indices(candidates)?
            .into_iter()
            .map(|(i, score)| (&candidates[i], score))
            .collect())
    }

    /// Like [`rank`](Self::rank) but yields input positions instead of references.
    pub fn rank_indices(&self, candidates: &[Vector]) -> DealflowResult<Vec<(usize, f64)>> {
        for x in candidates {
            self.check_dim(x)?;
        }
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let posterior = self.posterior()?;
        let mut scored = candidates
            .iter()
            .enumerate()
            .map(|(i, x)| Ok((i, posterior.score(&self.kernel, x, self.alpha)?.score)))
            .collect::<DealflowResult<Vec<_>>>()?;
        sort_descending(&mut scored);

        metrics::counter!("bandit.scores").increment(candidates.len() as u64);
        debug!(candidates = candidates.len(), "LinUCB ranking complete");
        Ok(scored)
    }

    /// Explicit reinitialisation to `A = I`, `b = 0`.
    pub fn reset(&mut self) {
        self.state = BanditState::new(self.dimension());
    }

    pub(crate) fn posterior(&self) -> DealflowResult<Posterior> {
        let a_inv = self.kernel.inverse(&self.state.a).map_err(|e| {
            if matches!(e, DealflowError::SingularMatrix(_)) {
                metrics::counter!("bandit.singular_matrix").increment(1);
                warn!(error = %e, "bandit covariance matrix is not invertible");
            }
            e
        })?;
        let theta = self.kernel.mat_vec(&a_inv, &self.state.b)?;
        Ok(Posterior { a_inv, theta })
    }

    fn check_dim(&self, x: &Vector) -> DealflowResult<()> {
        if x.len() != self.dimension() {
            return Err(DealflowError::dimension(self.dimension(), x.len()));
        }
        if x.iter().any(|v| !v.is_finite()) {
            return Err(DealflowError::InvalidInput(
                "feature vector contains non-finite values".into(),
            ));
        }
        Ok(())
    }
}

/// `A⁻¹` and `θ` for one consistent view of the statistics.
pub(crate) struct Posterior {
    a_inv: Matrix,
    theta: Vector,
}

impl Posterior {
    pub(crate) fn score<K: LinearAlgebra>(
        &self,
        kernel: &K,
        x: &Vector,
        alpha: f64,
    ) -> DealflowResult<ScoreResult> {
        let mean = kernel.dot(&self.theta, x)?;
        let a_inv_x = kernel.mat_vec(&self.a_inv, x)?;
        // Rounding can push a PSD quadratic form slightly below zero.
        let uncertainty = kernel.dot(&a_inv_x, x)?.max(0.0).sqrt();
        Ok(ScoreResult {
            mean,
            uncertainty,
            score: mean + alpha * uncertainty,
        })
    }
}

/// Stable descending sort on the score component.
pub(crate) fn sort_descending<T>(items: &mut [(T, f64)]) {
    items.sort_by(|a, b| b.1.total_cmp(&a.1));
}

fn check_alpha(alpha: f64) -> DealflowResult<()> {
    if !alpha.is_finite() || alpha < 0.0 {
        return Err(DealflowError::InvalidInput(format!(
            "alpha must be finite and non-negative, got {alpha}"
        )));
    }
    Ok(())
}
