use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use super::{ChainStore, StoreError, check_model, check_statistics};
use crate::model::CallCenterModel;
use crate::stats::Statistics;

/// In-memory store keyed by path.
#[derive(Debug, Default)]
pub struct MemoryStore {
    models: Mutex<HashMap<PathBuf, CallCenterModel>>,
    statistics: Mutex<HashMap<PathBuf, Statistics>>,
    read_only: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_model(&self, path: impl Into<PathBuf>, model: CallCenterModel) {
        if let Ok(mut m) = self.models.lock() {
            m.insert(path.into(), model);
        }
    }

    pub fn insert_statistics(&self, path: impl Into<PathBuf>, stats: Statistics) {
        if let Ok(mut m) = self.statistics.lock() {
            m.insert(path.into(), stats);
        }
    }

    /// Statistics stored under `path`, whether inserted or saved by a chain.
    pub fn saved_statistics(&self, path: &Path) -> Option<Statistics> {
        self.statistics.lock().ok()?.get(path).cloned()
    }

    /// While set, every save fails.
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    fn poisoned(path: &Path) -> StoreError {
        StoreError::Invalid {
            path: path.to_path_buf(),
            message: "store lock poisoned".to_string(),
        }
    }
}

impl ChainStore for MemoryStore {
    fn model_exists(&self, path: &Path) -> bool {
        self.models
            .lock()
            .map(|m| m.contains_key(path))
            .unwrap_or(false)
    }

    fn load_model(&self, path: &Path) -> Result<CallCenterModel, StoreError> {
        let model = self
            .models
            .lock()
            .map_err(|_| Self::poisoned(path))?
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(path.to_path_buf()))?;
        check_model(path, model)
    }

    fn load_statistics(&self, path: &Path) -> Result<Statistics, StoreError> {
        let stats = self
            .statistics
            .lock()
            .map_err(|_| Self::poisoned(path))?
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(path.to_path_buf()))?;
        check_statistics(path, stats)
    }

    fn save_statistics(&self, path: &Path, stats: &Statistics) -> Result<(), StoreError> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only store"),
            });
        }
        self.statistics
            .lock()
            .map_err(|_| Self::poisoned(path))?
            .insert(path.to_path_buf(), stats.clone());
        Ok(())
    }
}
