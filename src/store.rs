//! Opaque key-value blob persistence. Each key maps to one JSON file in the
//! platform data directory; readers never see a partial or poisoned value,
//! they see the default instead.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

use crate::errors::AppError;

pub struct BlobStore {
    dir: PathBuf,
}

impl BlobStore {
    pub fn open_default() -> Result<Self, AppError> {
        let dir = dirs::data_dir()
            .ok_or_else(|| AppError::Storage("no platform data directory".to_string()))?
            .join("auric");
        Self::open(dir)
    }

    pub fn open(dir: PathBuf) -> Result<Self, AppError> {
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub(crate) fn dir(&self) -> &std::path::Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Write-to-temp-then-rename, so a crash mid-write leaves the previous
    /// blob intact instead of a truncated one.
    pub fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<(), AppError> {
        let bytes = serde_json::to_vec(value)?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Missing or corrupt blobs load as the default; persisted state is never
    /// allowed to block startup.
    pub fn load_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        match fs::read(self.path_for(key)) {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                log::warn!("[Store] discarding corrupt blob '{}': {}", key, e);
                T::default()
            }),
            Err(_) => T::default(),
        }
    }
}
