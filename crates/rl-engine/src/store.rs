//! Persistence boundary for bandit state.
//!
//! The engine never touches storage itself. The integrating system supplies a
//! [`BanditStateStore`]; state is keyed by the owner of the model (one model
//! per investor).

use crate::linucb::BanditState;
use dashmap::DashMap;
use dealflow_core::{DealflowError, DealflowResult};
use tracing::info;

pub trait BanditStateStore: Send + Sync {
    fn load(&self, key: &str) -> DealflowResult<Option<BanditState>>;
    fn save(&self, key: &str, state: &BanditState) -> DealflowResult<()>;
}

/// Return the stored state for `key`, or fresh `(I, 0)` statistics of
/// dimension `d`. Fresh state is saved immediately so later loads agree.
pub fn load_or_init(
    store: &dyn BanditStateStore,
    key: &str,
    d: usize,
) -> DealflowResult<BanditState> {
    if let Some(state) = store.load(key)? {
        state.validate()?;
        if state.dimension() != d {
            return Err(DealflowError::dimension(d, state.dimension()));
        }
        return Ok(state);
    }

    let state = BanditState::new(d);
    store.save(key, &state)?;
    info!(key, dimension = d, "Initialized bandit state");
    Ok(state)
}

/// Keeps serialized JSON per key, the same representation a database column
/// would hold.
#[derive(Default)]
pub struct InMemoryStateStore {
    states: DashMap<String, String>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn remove(&self, key: &str) -> bool {
        self.states.remove(key).is_some()
    }
}

impl BanditStateStore for InMemoryStateStore {
    fn load(&self, key: &str) -> DealflowResult<Option<BanditState>> {
        match self.states.get(key) {
            Some(json) => Ok(Some(serde_json::from_str(json.value())?)),
            None => Ok(None),
        }
    }

    fn save(&self, key: &str, state: &BanditState) -> DealflowResult<()> {
        let json = serde_json::to_string(state)?;
        self.states.insert(key.to_string(), json);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::GaussJordan;
    use crate::linucb::LinUcb;
    use ndarray::Array1;

    #[test]
    fn test_load_or_init_creates_and_persists_fresh_state() {
        let store = InMemoryStateStore::new();
        assert!(store.is_empty());

        let state = load_or_init(&store, "investor-1", 18).unwrap();
        assert_eq!(state, BanditState::new(18));
        assert_eq!(store.len(), 1);
        assert_eq!(store.load("investor-1").unwrap(), Some(state));
    }

    #[test]
    fn test_updated_state_round_trips() {
        let store = InMemoryStateStore::new();
        let state = load_or_init(&store, "investor-2", 18).unwrap();
        let mut model = LinUcb::from_state(state, 1.0, GaussJordan::default()).unwrap();

        let mut x = Array1::zeros(18);
        x[4] = 1.0;
        x[16] = 0.5;
        model.update(&x, 1.0).unwrap();
        store.save("investor-2", model.state()).unwrap();

        let reloaded = load_or_init(&store, "investor-2", 18).unwrap();
        assert_eq!(&reloaded, model.state());
        assert_eq!(reloaded.observations, 1);
    }

    #[test]
    fn test_load_or_init_rejects_wrong_dimension() {
        let store = InMemoryStateStore::new();
        store.save("investor-3", &BanditState::new(5)).unwrap();
        assert!(matches!(
            load_or_init(&store, "investor-3", 18),
            Err(DealflowError::DimensionMismatch { expected: 18, got: 5 })
        ));
        assert!(store.remove("investor-3"));
        assert!(!store.remove("investor-3"));
    }
}
