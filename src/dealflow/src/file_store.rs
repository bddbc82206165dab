//! One JSON file per investor under a state directory.

use dealflow_core::{DealflowError, DealflowResult};
use dealflow_rl_engine::{BanditState, BanditStateStore};
use std::fs;
use std::path::{Path, PathBuf};

pub struct FileStateStore {
    dir: PathBuf,
}

impl FileStateStore {
    pub fn new(dir: impl Into<PathBuf>) -> DealflowResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> DealflowResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(DealflowError::InvalidInput(format!(
                "investor id {key:?} is not a valid state key"
            )));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl BanditStateStore for FileStateStore {
    fn load(&self, key: &str) -> DealflowResult<Option<BanditState>> {
        let path = self.path_for(key)?;
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&json)?))
    }

    fn save(&self, key: &str, state: &BanditState) -> DealflowResult<()> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(state)?)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

pub fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    serde_json::from_str(&raw).map_err(|e| anyhow::anyhow!("invalid JSON in {}: {e}", path.display()))
}
