//! Errors reported by the chain orchestrator.

use std::path::PathBuf;

use thiserror::Error;

/// Everything that can stop (or, for `SaveFailed`, disturb) a chain run.
///
/// `day` is always the 1-based index of the day the problem belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("invalid chain configuration: {0}")]
    Config(String),

    #[error("day {day}: no model configured")]
    NoModelForDay { day: usize },

    #[error("day {day}: model file {} does not exist", .path.display())]
    ModelFileMissing { day: usize, path: PathBuf },

    #[error("day {day}: could not load model: {message}")]
    ModelLoad { day: usize, message: String },

    #[error(
        "day {day}: previous statistics cover {previous} sub-days but the model simulates {current}"
    )]
    DayMismatch {
        day: usize,
        previous: usize,
        current: usize,
    },

    #[error("day {day}: engine rejected the model: {message}")]
    EngineRejected { day: usize, message: String },

    #[error("day {day}: simulation canceled")]
    Canceled { day: usize },

    #[error("day {day}: could not save statistics to {}: {message}", .path.display())]
    SaveFailed {
        day: usize,
        path: PathBuf,
        message: String,
    },
}

impl ChainError {
    pub fn day(&self) -> Option<usize> {
        match self {
            ChainError::Config(_) => None,
            ChainError::NoModelForDay { day }
            | ChainError::ModelFileMissing { day, .. }
            | ChainError::ModelLoad { day, .. }
            | ChainError::DayMismatch { day, .. }
            | ChainError::EngineRejected { day, .. }
            | ChainError::Canceled { day }
            | ChainError::SaveFailed { day, .. } => Some(*day),
        }
    }

    /// Cooperative stops are not failures of the chain configuration.
    pub fn is_canceled(&self) -> bool {
        matches!(self, ChainError::Canceled { .. })
    }

    /// Only `SaveFailed` lets the chain continue.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ChainError::SaveFailed { .. })
    }
}
