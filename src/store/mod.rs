//! Where models and statistics live.
//!
//! The chain never touches the file system directly; it goes through a
//! `ChainStore`. `FsStore` reads and writes JSON files, `MemoryStore` keeps
//! everything in memory for tests and embedding hosts.

mod fs;
mod memory;

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::model::CallCenterModel;
use crate::stats::Statistics;

pub use fs::FsStore;
pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{}: {message}", .path.display())]
    Invalid { path: PathBuf, message: String },

    #[error("{} not found", .0.display())]
    NotFound(PathBuf),
}

pub trait ChainStore {
    fn model_exists(&self, path: &Path) -> bool;
    fn load_model(&self, path: &Path) -> Result<CallCenterModel, StoreError>;
    fn load_statistics(&self, path: &Path) -> Result<Statistics, StoreError>;
    fn save_statistics(&self, path: &Path, stats: &Statistics) -> Result<(), StoreError>;
}

/// Shared post-load checks of both stores.
fn check_model(path: &Path, model: CallCenterModel) -> Result<CallCenterModel, StoreError> {
    if model.is_newer_than_supported() {
        return Err(StoreError::Invalid {
            path: path.to_path_buf(),
            message: format!(
                "model version {} is newer than the supported version {}",
                model.version,
                crate::model::MODEL_VERSION
            ),
        });
    }
    Ok(model)
}

fn check_statistics(path: &Path, mut stats: Statistics) -> Result<Statistics, StoreError> {
    stats.normalize().map_err(|message| StoreError::Invalid {
        path: path.to_path_buf(),
        message,
    })?;
    Ok(stats)
}
