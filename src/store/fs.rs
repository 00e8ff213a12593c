use std::fs;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{ChainStore, StoreError, check_model, check_statistics};
use crate::model::CallCenterModel;
use crate::stats::Statistics;

/// JSON files on the local file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStore;

impl FsStore {
    pub fn new() -> Self {
        FsStore
    }

    fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
        let raw = fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                StoreError::NotFound(path.to_path_buf())
            } else {
                StoreError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        serde_json::from_str(&raw).map_err(|source| StoreError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
        let io = |source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(io)?;
        }
        let json = serde_json::to_string_pretty(value).map_err(|source| StoreError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(io)
    }

    /// Writes a model document, e.g. one edited with the day helpers.
    pub fn save_model(&self, path: &Path, model: &CallCenterModel) -> Result<(), StoreError> {
        Self::write_json(path, model)
    }
}

impl ChainStore for FsStore {
    fn model_exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn load_model(&self, path: &Path) -> Result<CallCenterModel, StoreError> {
        let model = Self::read_json(path)?;
        debug!(path = %path.display(), "model loaded");
        check_model(path, model)
    }

    fn load_statistics(&self, path: &Path) -> Result<Statistics, StoreError> {
        check_statistics(path, Self::read_json(path)?)
    }

    fn save_statistics(&self, path: &Path, stats: &Statistics) -> Result<(), StoreError> {
        Self::write_json(path, stats)?;
        debug!(path = %path.display(), "statistics saved");
        Ok(())
    }
}
