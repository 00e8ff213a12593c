//! On-disk shape of a chain document.
//!
//! These types mirror the JSON file one to one; `ChainSpec::from_document`
//! turns them into validated domain values.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainDocument {
    /// Folder that bare file names are resolved against.
    #[serde(default)]
    pub base_folder: Option<String>,
    /// Statistics that seed day 1.
    #[serde(default)]
    pub day0_statistics: Option<String>,
    #[serde(default)]
    pub initial_extra_arrivals: Vec<ExtraArrivalRecord>,
    pub days: Vec<DayRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayRecord {
    /// Missing or empty: reuse the previous day's model.
    #[serde(default)]
    pub model: Option<String>,
    /// Missing or empty: do not save this day's statistics.
    #[serde(default)]
    pub statistics: Option<String>,
    #[serde(default)]
    pub carryover: Option<CarryoverTable>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CarryoverTable {
    /// One retry probability for every customer type, no type changes.
    Global { probability: f64 },
    PerType {
        #[serde(default)]
        rules: Vec<CarryoverRecord>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarryoverRecord {
    pub customer_type: String,
    pub probability: f64,
    #[serde(default)]
    pub type_changes: Vec<TypeChangeRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeChangeRecord {
    pub customer_type: String,
    pub rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtraArrivalRecord {
    pub customer_type: String,
    pub count: u64,
}
