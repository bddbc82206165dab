//! In-process sharing of one LinUCB model across callers.
//!
//! Updates take the write lock; scoring and ranking hold the read lock for
//! the whole computation so they never observe a half-applied update.

use crate::linalg::{GaussJordan, LinearAlgebra, Vector};
use crate::linucb::{BanditState, LinUcb, ScoreResult};
use dealflow_core::DealflowResult;
use parking_lot::RwLock;
use tracing::info;

pub struct SharedBandit<K: LinearAlgebra = GaussJordan> {
    model: RwLock<LinUcb<K>>,
}

impl<K: LinearAlgebra> SharedBandit<K> {
    pub fn new(model: LinUcb<K>) -> Self {
        Self {
            model: RwLock::new(model),
        }
    }

    pub fn score(&self, x: &Vector) -> DealflowResult<f64> {
        self.model.read().score(x)
    }

    pub fn score_detailed(&self, x: &Vector) -> DealflowResult<ScoreResult> {
        self.model.read().score_detailed(x)
    }

    pub fn rank_indices(&self, candidates: &[Vector]) -> DealflowResult<Vec<(usize, f64)>> {
        self.model.read().rank_indices(candidates)
    }

    pub fn update(&self, x: &Vector, reward: f64) -> DealflowResult<()> {
        self.model.write().update(x, reward)
    }

    pub fn reset(&self) {
        self.model.write().reset();
        info!("Shared bandit state reset");
    }

    /// Consistent copy of the current statistics, e.g. for persistence.
    pub fn snapshot(&self) -> BanditState {
        self.model.read().state().clone()
    }

    /// Run `f` against the model under the read lock.
    pub fn with_model<R>(&self, f: impl FnOnce(&LinUcb<K>) -> R) -> R {
        f(&self.model.read())
    }

    pub fn into_inner(self) -> LinUcb<K> {
        self.model.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array1;
    use std::sync::Arc;
    use std::thread;

    const D: usize = 18;

    fn basis(k: usize) -> Vector {
        let mut e = Array1::zeros(D);
        e[k] = 1.0;
        e
    }

    #[test]
    fn test_concurrent_updates_are_all_applied() {
        let shared = Arc::new(SharedBandit::new(LinUcb::new(D, 1.0).unwrap()));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let shared = Arc::clone(&shared);
                thread::spawn(move || {
                    for _ in 0..25 {
                        shared.update(&basis(t % D), 1.0).unwrap();
                        shared.score(&basis((t + 1) % D)).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let state = shared.snapshot();
        assert_eq!(state.observations, 200);
        for t in 0..8 {
            assert!((state.a[[t, t]] - 26.0).abs() < 1e-12);
            assert!((state.b[t] - 25.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_snapshot_is_detached_from_later_updates() {
        let shared = SharedBandit::new(LinUcb::new(D, 1.0).unwrap());
        let before = shared.snapshot();
        shared.update(&basis(0), 1.0).unwrap();
        assert_eq!(before, BanditState::new(D));
        assert_ne!(shared.snapshot(), before);

        shared.reset();
        assert_eq!(shared.with_model(|m| m.state().observations), 0);
        assert_eq!(shared.into_inner().dimension(), D);
    }
}
