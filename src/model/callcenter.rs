//! The model document for one simulated day.

use serde::{Deserialize, Serialize};

use super::caller::CallerType;

/// Newest model format this crate can read.
pub const MODEL_VERSION: u32 = 1;

fn default_version() -> u32 {
    MODEL_VERSION
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallCenterModel {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub name: Option<String>,
    /// Number of independent repetitions of the day.
    pub sub_days: u32,
    /// Size of the shared agent pool.
    pub agents: u32,
    pub callers: Vec<CallerType>,
}

impl CallCenterModel {
    pub fn new(sub_days: u32, agents: u32, callers: Vec<CallerType>) -> Self {
        Self {
            version: MODEL_VERSION,
            name: None,
            sub_days,
            agents,
            callers,
        }
    }

    pub fn sub_day_count(&self) -> usize {
        self.sub_days as usize
    }

    pub fn is_newer_than_supported(&self) -> bool {
        self.version > MODEL_VERSION
    }

    /// Exact, case-sensitive lookup.
    pub fn caller(&self, name: &str) -> Option<&CallerType> {
        self.callers.iter().find(|c| c.name == name)
    }

    /// Every type whose name matches case-insensitively, in model order.
    pub fn callers_mut_ignore_case<'a>(
        &'a mut self,
        name: &str,
    ) -> impl Iterator<Item = &'a mut CallerType> + 'a {
        let lower = name.to_lowercase();
        self.callers
            .iter_mut()
            .filter(move |c| c.name.to_lowercase() == lower)
    }
}
